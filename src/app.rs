use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    config::AppConfig,
    core::{
        archive::Archiver,
        engine::{SeparationEngine, SpleeterCli},
        separator::Separator,
    },
    error::Result,
    io::download::{Downloaded, Downloader, YtDlp},
    session::Session,
    types::{ProcessingMode, SeparationSettings, SourceAudio},
};

/// Result of splitting one file.
#[derive(Clone, Debug)]
pub struct SingleOutcome {
    pub stems: Vec<PathBuf>,
    pub already_existed: bool,
    pub zip: Option<PathBuf>,
}

/// Request handlers over explicit state: configuration, the user's session,
/// the separation cache and the downloader.
pub struct App<E, D> {
    config: AppConfig,
    session: Session,
    separator: Separator<E>,
    downloader: D,
}

impl App<SpleeterCli, YtDlp> {
    /// Wire up the command-line tools named in `config`.
    pub fn from_config(config: AppConfig) -> Self {
        let engine = SpleeterCli::new(&config.spleeter_program);
        let downloader = YtDlp::new(&config.ytdlp_program);
        Self::new(config, engine, downloader)
    }
}

impl<E: SeparationEngine, D: Downloader> App<E, D> {
    pub fn new(config: AppConfig, engine: E, downloader: D) -> Self {
        let separator =
            Separator::new(engine, &config.output_dir).with_cache_check(config.cache_check);
        let session = Session::new(&config.upload_dir);
        Self {
            config,
            session,
            separator,
            downloader,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn separator(&self) -> &Separator<E> {
        &self.separator
    }

    pub fn upload(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.session.save_upload(name, bytes)
    }

    /// Download `url` into the upload directory and register every
    /// resulting file. `bitrate` falls back to the configured default.
    pub fn fetch(
        &mut self,
        url: &str,
        bitrate: Option<u32>,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<Vec<Downloaded>> {
        let bitrate = bitrate.unwrap_or(self.config.default_bitrate);
        let downloads =
            self.downloader
                .download(url, self.session.upload_dir(), bitrate, on_progress)?;
        for d in &downloads {
            if !self.session.add_audio_file(d.path.clone()) {
                info!("{} : already in the list", d.title);
            }
        }
        Ok(downloads)
    }

    /// Separate one file, optionally bundling the stems into a zip. The
    /// stems become the session's output files.
    pub fn split_single(
        &mut self,
        path: &Path,
        settings: &SeparationSettings,
        zip: bool,
    ) -> Result<SingleOutcome> {
        let source = SourceAudio::new(path)?;
        self.session.set_mode(ProcessingMode::Single);
        self.session.add_audio_file(path);
        self.session.select_audio(path)?;

        let resolved = self.separator.resolve(settings, &source)?;
        let stems = resolved.list()?;
        let zip = if zip {
            Some(Archiver::new(&self.separator).bundle_one(settings, &source)?)
        } else {
            None
        };

        self.session.set_output_files(stems.clone());
        Ok(SingleOutcome {
            stems,
            already_existed: resolved.already_existed,
            zip,
        })
    }

    /// Separate every file and bundle all results into one archive.
    pub fn split_many(
        &mut self,
        paths: &[PathBuf],
        settings: &SeparationSettings,
        on_progress: impl FnMut(f64),
    ) -> Result<PathBuf> {
        self.session.set_mode(ProcessingMode::Multiple);
        for p in paths {
            self.session.add_audio_file(p.clone());
        }
        let zip = Archiver::new(&self.separator).bundle_many(settings, paths, on_progress)?;
        self.session.set_output_files(vec![zip.clone()]);
        Ok(zip)
    }
}
