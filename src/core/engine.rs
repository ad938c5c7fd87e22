use std::{
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{debug, info};

use crate::{
    audio::probe_audio,
    error::{Result, SplitterError},
    paths,
    types::{SeparationSettings, SourceAudio},
};

/// One separation job as the engine sees it.
#[derive(Clone, Copy, Debug)]
pub struct EngineRequest<'a> {
    pub source: &'a SourceAudio,
    pub settings: &'a SeparationSettings,
    /// Root the filename template is resolved against.
    pub destination: &'a Path,
}

impl<'a> EngineRequest<'a> {
    pub fn new(
        source: &'a SourceAudio,
        settings: &'a SeparationSettings,
        destination: &'a Path,
    ) -> Self {
        Self {
            source,
            settings,
            destination,
        }
    }

    pub fn input(&self) -> &Path {
        self.source.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        paths::result_dir(self.destination, self.source.stem(), self.settings)
    }

    /// One path per instrument of the selected mode, in engine order.
    pub fn expected_outputs(&self) -> Vec<PathBuf> {
        self.settings
            .mode
            .instruments()
            .iter()
            .map(|instrument| {
                paths::stem_file(self.destination, self.source.stem(), self.settings, instrument)
            })
            .collect()
    }
}

/// A source separation backend. Implementations block until every stem is
/// written or fail as a whole; callers never see partial success.
pub trait SeparationEngine {
    /// Returns the files written.
    fn separate(&self, request: &EngineRequest<'_>) -> Result<Vec<PathBuf>>;
}

impl<E: SeparationEngine + ?Sized> SeparationEngine for &E {
    fn separate(&self, request: &EngineRequest<'_>) -> Result<Vec<PathBuf>> {
        (**self).separate(request)
    }
}

impl<E: SeparationEngine + ?Sized> SeparationEngine for Box<E> {
    fn separate(&self, request: &EngineRequest<'_>) -> Result<Vec<PathBuf>> {
        (**self).separate(request)
    }
}

/// Drives the `spleeter` command-line tool.
#[derive(Clone, Debug)]
pub struct SpleeterCli {
    program: PathBuf,
}

impl Default for SpleeterCli {
    fn default() -> Self {
        Self::new("spleeter")
    }
}

impl SpleeterCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Seconds to pass as `--duration`. The tool truncates at its own
    /// default when the flag is left out, so "whole file" means probing.
    fn duration_arg(&self, request: &EngineRequest<'_>) -> Result<String> {
        match request.settings.max_duration {
            Some(secs) => Ok(secs.to_string()),
            None => {
                let info = probe_audio(request.input())?;
                Ok(format!("{}", info.duration_secs().ceil() as u64))
            }
        }
    }

    pub fn command(&self, request: &EngineRequest<'_>) -> Result<Command> {
        let settings = request.settings;
        let mut cmd = Command::new(&self.program);
        cmd.arg("separate")
            .arg("-p")
            .arg(settings.params_descriptor())
            .arg("-o")
            .arg(request.destination)
            .arg("-c")
            .arg(settings.codec.as_str())
            .arg("-b")
            .arg(settings.bitrate_arg())
            .arg("-f")
            .arg(settings.filename_format())
            .arg("-d")
            .arg(self.duration_arg(request)?);
        if settings.use_mwf {
            cmd.arg("--mwf");
        }
        cmd.arg(request.input());
        Ok(cmd)
    }
}

impl SeparationEngine for SpleeterCli {
    fn separate(&self, request: &EngineRequest<'_>) -> Result<Vec<PathBuf>> {
        let mut cmd = self.command(request)?;
        debug!(?cmd, "running separation engine");
        info!(
            input = %request.input().display(),
            params = %request.settings.params_descriptor(),
            "separating"
        );

        let output = cmd.output().map_err(|e| {
            SplitterError::engine(
                request.input(),
                format!("failed to launch {}: {e}", self.program.display()),
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SplitterError::engine(
                request.input(),
                format!("{} ({})", tail(&stderr, 20), output.status),
            ));
        }

        Ok(request
            .expected_outputs()
            .into_iter()
            .filter(|p| p.exists())
            .collect())
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Codec, StemMode};
    use std::ffi::OsStr;

    #[test]
    fn spleeter_command_line() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.mp3");
        std::fs::write(&input, b"x").unwrap();
        let source = SourceAudio::new(&input).unwrap();
        let settings = SeparationSettings::new(StemMode::FiveStems, Codec::Wav, 320)
            .with_16khz(true)
            .with_mwf(true)
            .with_max_duration(90);
        let out = dir.path().join("out");
        let req = EngineRequest::new(&source, &settings, &out);

        let cmd = SpleeterCli::new("/opt/spleeter").command(&req).unwrap();
        let args: Vec<&OsStr> = cmd.get_args().collect();
        let expect: Vec<&OsStr> = [
            OsStr::new("separate"),
            OsStr::new("-p"),
            OsStr::new("spleeter:5stems-16kHz"),
            OsStr::new("-o"),
            out.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("wav"),
            OsStr::new("-b"),
            OsStr::new("320k"),
            OsStr::new("-f"),
            OsStr::new("{filename}/5stems-16kHz/{filename}_{instrument}.{codec}"),
            OsStr::new("-d"),
            OsStr::new("90"),
            OsStr::new("--mwf"),
            input.as_os_str(),
        ]
        .to_vec();
        assert_eq!(args, expect);
        assert_eq!(cmd.get_program(), OsStr::new("/opt/spleeter"));
    }

    #[test]
    fn missing_binary_is_an_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.mp3");
        std::fs::write(&input, b"x").unwrap();
        let source = SourceAudio::new(&input).unwrap();
        let settings = SeparationSettings::default();
        let req = EngineRequest::new(&source, &settings, dir.path());

        let err = SpleeterCli::new(dir.path().join("no-such-spleeter"))
            .separate(&req)
            .unwrap_err();
        assert!(matches!(err, SplitterError::Engine { .. }), "{err}");
        assert!(!err.is_user_error());
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\n\nb\nc\n", 2), "b\nc");
        assert_eq!(tail("", 3), "");
    }
}
