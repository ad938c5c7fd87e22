use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{Result, SplitterError},
    types::ProcessingMode,
};

/// Upload formats accepted from users.
pub const UPLOAD_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

/// Per-user working state: which audio files are available, which one is
/// selected, and what the last separation produced.
#[derive(Clone, Debug, Default)]
pub struct Session {
    upload_dir: PathBuf,
    audio_files: Vec<PathBuf>,
    output_files: Vec<PathBuf>,
    selected_audio: Option<PathBuf>,
    mode: ProcessingMode,
}

impl Session {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            ..Self::default()
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Store uploaded bytes under the upload directory and register the
    /// file. Only the final component of `name` is used. An existing file
    /// with the same name is overwritten.
    pub fn save_upload(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file_name = Path::new(name)
            .file_name()
            .ok_or_else(|| SplitterError::invalid_input(name, "upload has no file name"))?;

        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !UPLOAD_EXTENSIONS.contains(&ext.as_str()) {
            return Err(SplitterError::invalid_input(
                name,
                format!("unsupported upload type; expected one of {UPLOAD_EXTENSIONS:?}"),
            ));
        }

        fs::create_dir_all(&self.upload_dir)?;
        let path = self.upload_dir.join(file_name);
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "saved upload");

        self.add_audio_file(path.clone());
        Ok(path)
    }

    /// Returns false when the file was already registered.
    pub fn add_audio_file(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.audio_files.contains(&path) {
            return false;
        }
        self.audio_files.push(path);
        true
    }

    pub fn audio_files(&self) -> &[PathBuf] {
        &self.audio_files
    }

    /// Selecting a file that is not registered is an input error.
    pub fn select_audio(&mut self, path: &Path) -> Result<()> {
        if !self.audio_files.iter().any(|p| p == path) {
            return Err(SplitterError::invalid_input(path, "not in the session's audio list"));
        }
        self.selected_audio = Some(path.to_path_buf());
        Ok(())
    }

    pub fn selected_audio(&self) -> Option<&Path> {
        self.selected_audio.as_deref()
    }

    pub fn set_output_files(&mut self, files: Vec<PathBuf>) {
        self.output_files = files;
    }

    pub fn output_files(&self) -> &[PathBuf] {
        &self.output_files
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ProcessingMode) {
        self.mode = mode;
    }
}
