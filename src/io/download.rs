//! Fetching source audio from YouTube URLs through `yt-dlp`.

use std::{
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::{
        mpsc::{self, Sender},
        OnceLock,
    },
    thread::{self, JoinHandle},
};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, SplitterError};

const PLAYLIST_PREFIX: &str = "https://www.youtube.com/playlist?list=";

/// A file produced (or found) by a [`Downloader`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Downloaded {
    pub title: String,
    pub path: PathBuf,
    /// The MP3 was already in the destination; nothing was fetched.
    pub already_existed: bool,
}

pub trait Downloader {
    /// Fetch `url` as MP3 into `dest_dir`. Playlists yield one entry per
    /// item. `on_progress` gets overall fractions in `0.0..=1.0`, ending at
    /// `1.0`.
    fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        bitrate: u32,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<Vec<Downloaded>>;
}

impl<D: Downloader + ?Sized> Downloader for &D {
    fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        bitrate: u32,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<Vec<Downloaded>> {
        (**self).download(url, dest_dir, bitrate, on_progress)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UrlKind {
    Playlist(String),
    /// A watch URL carrying a `&list=` parameter; only the video is kept.
    VideoInPlaylist(String),
    Video(String),
}

impl UrlKind {
    pub fn url(&self) -> &str {
        match self {
            UrlKind::Playlist(u) | UrlKind::VideoInPlaylist(u) | UrlKind::Video(u) => u,
        }
    }
}

fn list_param() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&list=.*").expect("static regex"))
}

fn watch_in_list() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"watch\?v=.*&list=").expect("static regex"))
}

pub fn classify_url(url: &str) -> Result<UrlKind> {
    let url = url.trim();
    if url.is_empty() {
        return Err(SplitterError::download(url, "please enter a valid url"));
    }
    if url.starts_with(PLAYLIST_PREFIX) {
        Ok(UrlKind::Playlist(url.to_string()))
    } else if watch_in_list().is_match(url) {
        Ok(UrlKind::VideoInPlaylist(
            list_param().replace(url, "").into_owned(),
        ))
    } else {
        Ok(UrlKind::Video(url.to_string()))
    }
}

fn ansi_escape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b[^m]*m").expect("static regex"))
}

fn download_percent() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[download\]\s+([0-9]+(?:\.[0-9]+)?)%").expect("static regex"))
}

pub fn strip_ansi(s: &str) -> String {
    ansi_escape().replace_all(s, "").into_owned()
}

/// `"[download]  42.5% of ..."` -> `0.425`. Other lines yield `None`.
pub fn parse_percent_line(line: &str) -> Option<f64> {
    let clean = strip_ansi(line);
    let caps = download_percent().captures(clean.trim_start())?;
    caps[1].parse::<f64>().ok().map(|p| p / 100.0)
}

/// Progress across a multi-item download. `current` is 1-based.
pub fn overall_progress(item_fraction: f64, current: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    let done = item_fraction * 100.0 + 100.0 * current.saturating_sub(1) as f64;
    (done / (total as f64 * 100.0)).min(1.0)
}

#[derive(Debug, Deserialize)]
struct InfoJson {
    title: Option<String>,
    webpage_url: Option<String>,
    #[serde(default)]
    entries: Vec<EntryJson>,
}

#[derive(Debug, Deserialize)]
struct EntryJson {
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Item {
    title: String,
    url: String,
}

#[derive(Clone, Copy)]
enum Stream {
    Out,
    Err,
}

/// Read `r` line by line on its own thread, tagging each line with `kind`.
fn forward<R: Read + Send + 'static>(
    r: R,
    kind: Stream,
    tx: Sender<(Stream, String)>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(r).lines().map_while(std::result::Result::ok) {
            if tx.send((kind, line)).is_err() {
                break;
            }
        }
    })
}

/// `printed` re-rooted under `dest_dir` by file name, so a path the tool
/// reports can never point outside the destination.
fn within(dest_dir: &Path, printed: &str) -> Option<PathBuf> {
    Path::new(printed.trim())
        .file_name()
        .map(|name| dest_dir.join(name))
}

/// Last non-empty stdout line that is not a `[component]` status line.
fn printed_path(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('['))
        .last()
}

/// Drives the `yt-dlp` command-line tool.
#[derive(Clone, Debug)]
pub struct YtDlp {
    program: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn launch_error(&self, url: &str, e: std::io::Error) -> SplitterError {
        SplitterError::download_tool(
            url,
            format!("failed to launch {}: {e}", self.program.display()),
        )
    }

    fn template(dest_dir: &Path) -> PathBuf {
        dest_dir.join("%(title)s.%(ext)s")
    }

    fn info_json(&self, url: &str, flat: bool) -> Result<InfoJson> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-J").arg("--no-warnings");
        if flat {
            cmd.arg("--flat-playlist");
        }
        cmd.arg(url);
        debug!(?cmd, "resolving titles");

        let out = cmd.output().map_err(|e| self.launch_error(url, e))?;
        if !out.status.success() {
            return Err(SplitterError::download(
                url,
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }
        serde_json::from_slice(&out.stdout).map_err(|e| {
            SplitterError::download_tool(url, format!("unreadable metadata: {e}"))
        })
    }

    fn items(&self, kind: &UrlKind) -> Result<Vec<Item>> {
        match kind {
            UrlKind::Playlist(url) => {
                let info = self.info_json(url, true)?;
                info.entries
                    .into_iter()
                    .map(|e| {
                        let title = e.title.ok_or_else(|| {
                            SplitterError::download(url.as_str(), "playlist entry without title")
                        })?;
                        let item_url = e.webpage_url.or(e.url).ok_or_else(|| {
                            SplitterError::download(url.as_str(), "playlist entry without url")
                        })?;
                        Ok(Item {
                            title,
                            url: item_url,
                        })
                    })
                    .collect()
            }
            UrlKind::VideoInPlaylist(url) | UrlKind::Video(url) => {
                let info = self.info_json(url, false)?;
                let title = info
                    .title
                    .ok_or_else(|| SplitterError::download(url.as_str(), "video without title"))?;
                Ok(vec![Item {
                    title,
                    url: info.webpage_url.unwrap_or_else(|| url.clone()),
                }])
            }
        }
    }

    /// Where the extracted MP3 for `item` ends up. The tool sanitizes
    /// titles into file names, so the name is asked for, not derived.
    fn output_path(&self, item: &Item, dest_dir: &Path) -> Result<PathBuf> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-warnings")
            .arg("--print")
            .arg("filename")
            .arg("-o")
            .arg(Self::template(dest_dir))
            .arg(&item.url);
        debug!(?cmd, "resolving file name");

        let out = cmd.output().map_err(|e| self.launch_error(&item.url, e))?;
        if !out.status.success() {
            return Err(SplitterError::download(
                item.url.as_str(),
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }
        let stdout = String::from_utf8_lossy(&out.stdout);
        printed_path(&stdout)
            .and_then(|p| within(dest_dir, p))
            .map(|p| p.with_extension("mp3"))
            .ok_or_else(|| {
                SplitterError::download_tool(item.url.as_str(), "no output file name reported")
            })
    }

    /// Download and extract one item, returning the path the tool reports
    /// after post-processing, if any.
    fn fetch_one(
        &self,
        item: &Item,
        dest_dir: &Path,
        bitrate: u32,
        current: usize,
        total: usize,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<Option<PathBuf>> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-f")
            .arg("bestaudio/best")
            .arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg(format!("{bitrate}K"))
            .arg("--embed-metadata")
            .arg("--newline")
            .arg("--progress")
            .arg("--print")
            .arg("after_move:filepath")
            .arg("-o")
            .arg(Self::template(dest_dir))
            .arg(&item.url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(?cmd, "downloading");

        let mut child = cmd.spawn().map_err(|e| self.launch_error(&item.url, e))?;

        // Progress may arrive on either stream; both are drained concurrently
        // or the child can stall on a full pipe.
        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            readers.push(forward(out, Stream::Out, tx.clone()));
        }
        if let Some(err) = child.stderr.take() {
            readers.push(forward(err, Stream::Err, tx.clone()));
        }
        drop(tx);

        let mut printed = None;
        let mut stderr_text = String::new();
        for (kind, line) in rx {
            if let Some(fraction) = parse_percent_line(&line) {
                on_progress(overall_progress(fraction, current, total));
                continue;
            }
            match kind {
                Stream::Out => {
                    if let Some(path) = printed_path(&line) {
                        printed = within(dest_dir, path);
                    }
                }
                Stream::Err => {
                    stderr_text.push_str(&line);
                    stderr_text.push('\n');
                }
            }
        }
        for r in readers {
            let _ = r.join();
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(SplitterError::download_tool(
                item.url.as_str(),
                format!("{} ({status})", stderr_text.trim()),
            ));
        }
        Ok(printed)
    }
}

impl Downloader for YtDlp {
    fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        bitrate: u32,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<Vec<Downloaded>> {
        let kind = classify_url(url)?;
        let items = self.items(&kind)?;
        std::fs::create_dir_all(dest_dir)?;

        let total = items.len();
        let mut results = Vec::with_capacity(total);
        for (i, item) in items.into_iter().enumerate() {
            let expected = self.output_path(&item, dest_dir)?;
            let already_existed = expected.is_file();
            let path = if already_existed {
                info!("{} : already downloaded", item.title);
                expected
            } else {
                let path = self
                    .fetch_one(&item, dest_dir, bitrate, i + 1, total, on_progress)?
                    .unwrap_or(expected);
                if !path.is_file() {
                    return Err(SplitterError::download_tool(
                        item.url.as_str(),
                        format!("finished but {} is missing", path.display()),
                    ));
                }
                info!("{} : downloaded", item.title);
                path
            };
            results.push(Downloaded {
                title: item.title,
                path,
                already_existed,
            });
        }

        on_progress(1.0);
        Ok(results)
    }
}
