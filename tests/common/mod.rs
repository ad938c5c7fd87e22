#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    fs,
    path::{Path, PathBuf},
};

use spleeter_stems::{
    Downloaded, Downloader, EngineRequest, Result, SeparationEngine, SplitterError,
};

/// Writes a few bytes per expected stem and counts invocations.
#[derive(Default)]
pub struct FakeEngine {
    calls: Cell<usize>,
    /// When set, only these instruments are written.
    only: Option<Vec<&'static str>>,
    /// Fail for sources with this stem.
    fail_on: Option<&'static str>,
    pub seen: RefCell<Vec<PathBuf>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writing_only(instruments: &[&'static str]) -> Self {
        Self {
            only: Some(instruments.to_vec()),
            ..Self::default()
        }
    }

    pub fn failing_on(stem: &'static str) -> Self {
        Self {
            fail_on: Some(stem),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl SeparationEngine for FakeEngine {
    fn separate(&self, request: &EngineRequest<'_>) -> Result<Vec<PathBuf>> {
        self.calls.set(self.calls.get() + 1);
        self.seen.borrow_mut().push(request.input().to_path_buf());

        if self.fail_on == Some(request.source.stem()) {
            return Err(SplitterError::engine(request.input(), "decode error"));
        }

        let mut written = Vec::new();
        let instruments = request.settings.mode.instruments();
        for (instrument, path) in instruments.iter().zip(request.expected_outputs()) {
            if let Some(only) = &self.only {
                if !only.contains(instrument) {
                    continue;
                }
            }
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(&path, format!("{instrument} stem"))?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Pretends every URL is a single video titled after its last path segment.
#[derive(Default)]
pub struct FakeDownloader {
    calls: Cell<usize>,
}

impl FakeDownloader {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Downloader for FakeDownloader {
    fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        _bitrate: u32,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<Vec<Downloaded>> {
        self.calls.set(self.calls.get() + 1);
        let title = url.rsplit('/').next().unwrap_or("untitled").to_string();
        fs::create_dir_all(dest_dir)?;
        let path = dest_dir.join(format!("{title}.mp3"));
        let already_existed = path.exists();
        if !already_existed {
            on_progress(0.5);
            fs::write(&path, b"mp3 bytes")?;
        }
        on_progress(1.0);
        Ok(vec![Downloaded {
            title,
            path,
            already_existed,
        }])
    }
}

/// An input file; the fake engine never reads it.
pub fn touch_source(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"not really audio").unwrap();
    path
}

/// 16-bit PCM sine, like the fixtures other audio tests build.
pub fn write_sine_wav(path: &Path, seconds: f32, sample_rate: u32, channels: u16) {
    use std::f32::consts::PI;

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    let frames = (seconds * sample_rate as f32) as usize;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let s = ((2.0 * PI * 440.0 * t).sin() * 0.3 * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(s).expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
}

pub fn zip_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).expect("open zip");
    let archive = zip::ZipArchive::new(file).expect("read zip");
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}
