//! On-disk layout of the separation cache.
//!
//! ```text
//! root/{stem}/{tag}/{stem}_{instrument}.{codec}
//! root/{stem}/{stem}_{tag}.zip
//! root/{n}files-{tag}_{key}.zip
//! ```

use std::path::{Path, PathBuf};

use crate::types::SeparationSettings;

pub fn result_dir(root: &Path, stem: &str, settings: &SeparationSettings) -> PathBuf {
    root.join(stem).join(settings.tag())
}

pub fn stem_file(
    root: &Path,
    stem: &str,
    settings: &SeparationSettings,
    instrument: &str,
) -> PathBuf {
    result_dir(root, stem, settings).join(format!("{stem}_{instrument}.{}", settings.codec))
}

/// The file whose presence the default cache check treats as proof that a
/// separation finished.
pub fn vocals_witness(root: &Path, stem: &str, settings: &SeparationSettings) -> PathBuf {
    stem_file(root, stem, settings, "vocals")
}

pub fn single_zip(root: &Path, stem: &str, settings: &SeparationSettings) -> PathBuf {
    root.join(stem).join(format!("{stem}_{}.zip", settings.tag()))
}

pub fn batch_zip(root: &Path, count: usize, settings: &SeparationSettings, key: &str) -> PathBuf {
    root.join(format!("{count}files-{}_{key}.zip", settings.tag()))
}
