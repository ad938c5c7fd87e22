use std::{
    fs::{self, ReadDir},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    core::engine::{EngineRequest, SeparationEngine},
    error::{Result, SplitterError},
    paths,
    types::{Codec, SeparationSettings, SourceAudio},
};

/// What counts as "already separated".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheCheck {
    /// Only `{stem}_vocals.{codec}` must exist. A run that died after
    /// writing vocals is indistinguishable from a finished one.
    #[default]
    VocalsWitness,
    /// Every instrument file of the mode must exist.
    AllStems,
}

impl FromStr for CacheCheck {
    type Err = SplitterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vocals" | "witness" | "vocals-witness" => Ok(CacheCheck::VocalsWitness),
            "all" | "all-stems" => Ok(CacheCheck::AllStems),
            other => Err(SplitterError::Config(format!(
                "unknown cache check `{other}` (expected `vocals` or `all`)"
            ))),
        }
    }
}

/// Runs the separation engine at most once per (source, settings) pair,
/// keeping results under `output_root`.
pub struct Separator<E> {
    engine: E,
    output_root: PathBuf,
    cache_check: CacheCheck,
}

impl<E: SeparationEngine> Separator<E> {
    pub fn new(engine: E, output_root: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            output_root: output_root.into(),
            cache_check: CacheCheck::default(),
        }
    }

    pub fn with_cache_check(mut self, cache_check: CacheCheck) -> Self {
        self.cache_check = cache_check;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn cache_check(&self) -> CacheCheck {
        self.cache_check
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn output_dir(&self, settings: &SeparationSettings, source: &SourceAudio) -> PathBuf {
        paths::result_dir(&self.output_root, source.stem(), settings)
    }

    pub fn expected_outputs(
        &self,
        settings: &SeparationSettings,
        source: &SourceAudio,
    ) -> Vec<PathBuf> {
        EngineRequest::new(source, settings, &self.output_root).expected_outputs()
    }

    /// Files the active cache check requires that are not on disk.
    pub fn missing_outputs(
        &self,
        settings: &SeparationSettings,
        source: &SourceAudio,
    ) -> Vec<PathBuf> {
        let required = match self.cache_check {
            CacheCheck::VocalsWitness => vec![paths::vocals_witness(
                &self.output_root,
                source.stem(),
                settings,
            )],
            CacheCheck::AllStems => self.expected_outputs(settings, source),
        };
        required.into_iter().filter(|p| !p.exists()).collect()
    }

    /// Make sure the stems for `source` under `settings` exist, running the
    /// engine only on a cache miss.
    pub fn resolve(&self, settings: &SeparationSettings, source: &SourceAudio) -> Result<Resolved> {
        settings.validate()?;

        let output_dir = self.output_dir(settings, source);
        debug!(dir = %output_dir.display(), "resolving separation");

        let already_existed = self.missing_outputs(settings, source).is_empty();
        if already_existed {
            info!("{} [{}] : already split", source.stem(), settings.tag());
        } else {
            fs::create_dir_all(&output_dir)?;

            let request = EngineRequest::new(source, settings, &self.output_root);
            let written = self.engine.separate(&request)?;
            debug!(count = written.len(), "engine finished");

            let missing = self.missing_outputs(settings, source);
            if !missing.is_empty() {
                warn!(?missing, "engine returned without the expected stems");
                let names = missing
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(SplitterError::integrity(
                    &output_dir,
                    format!("engine finished but expected file(s) are missing: {names}"),
                ));
            }
            info!("{} [{}] : split", source.stem(), settings.tag());
        }

        Ok(Resolved {
            files: OutputFiles::new(output_dir, settings.codec),
            already_existed,
        })
    }
}

/// Outcome of [`Separator::resolve`].
#[derive(Debug)]
pub struct Resolved {
    pub files: OutputFiles,
    pub already_existed: bool,
}

impl Resolved {
    pub fn output_dir(&self) -> &Path {
        self.files.dir()
    }

    /// Sorted listing of the codec's files in the output directory.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        list_codec_files(self.files.dir(), self.files.codec())
    }
}

/// Lazy, single-pass listing of `*.{codec}` in a result directory. The
/// directory is read on the first call to `next`, not when the value is
/// created. Listing order is whatever the filesystem returns.
#[derive(Debug)]
pub struct OutputFiles {
    dir: PathBuf,
    codec: Codec,
    entries: Option<ReadDir>,
    done: bool,
}

impl OutputFiles {
    fn new(dir: PathBuf, codec: Codec) -> Self {
        Self {
            dir,
            codec,
            entries: None,
            done: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }
}

impl Iterator for OutputFiles {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.entries.is_none() {
            match fs::read_dir(&self.dir) {
                Ok(rd) => self.entries = Some(rd),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        let entries = self.entries.as_mut()?;
        for entry in entries.by_ref() {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if has_codec_ext(&path, self.codec) && path.is_file() {
                        return Some(Ok(path));
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
        self.done = true;
        None
    }
}

fn has_codec_ext(path: &Path, codec: Codec) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(codec.as_str())
}

pub(crate) fn list_codec_files(dir: &Path, codec: Codec) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if has_codec_ext(&path, codec) && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
