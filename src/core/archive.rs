use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{
    core::{
        engine::SeparationEngine,
        separator::{list_codec_files, Separator},
    },
    error::{Result, SplitterError},
    io::{crypto::batch_key, progress::BatchProgress},
    paths,
    types::{SeparationSettings, SourceAudio},
};

/// Bundles separation results into zip archives. An existing archive at the
/// derived path is returned as-is; its contents are never re-checked.
pub struct Archiver<'s, E> {
    separator: &'s Separator<E>,
}

impl<'s, E: SeparationEngine> Archiver<'s, E> {
    pub fn new(separator: &'s Separator<E>) -> Self {
        Self { separator }
    }

    /// `root/{stem}/{stem}_{tag}.zip` holding the files of one result
    /// directory, by bare name.
    pub fn bundle_one(
        &self,
        settings: &SeparationSettings,
        source: &SourceAudio,
    ) -> Result<PathBuf> {
        let zip_path = paths::single_zip(self.separator.output_root(), source.stem(), settings);
        if zip_path.exists() {
            info!("{} [{}] : already zipped", source.stem(), settings.tag());
            return Ok(zip_path);
        }

        let resolved = self.separator.resolve(settings, source)?;
        let dir = populated_dir(resolved.output_dir(), settings)?;

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                entries.push((path, name));
            }
        }
        entries.sort();

        write_zip(&zip_path, &entries)?;
        info!(zip = %zip_path.display(), files = entries.len(), "archive written");
        Ok(zip_path)
    }

    /// `root/{n}files-{tag}_{key}.zip` holding every source's result
    /// directory as `{stem}/{tag}/{file}`.
    ///
    /// `on_progress` receives `0.0` first, then `i / (n + 1)` after each
    /// source is resolved and `1.0` once the archive is written. When the
    /// archive already exists only the leading `0.0` is reported. Any
    /// failure aborts before anything is written.
    pub fn bundle_many<P, F>(
        &self,
        settings: &SeparationSettings,
        sources: &[P],
        on_progress: F,
    ) -> Result<PathBuf>
    where
        P: AsRef<Path>,
        F: FnMut(f64),
    {
        let mut progress = BatchProgress::start(sources.len(), on_progress);

        let key = batch_key(sources);
        let zip_path =
            paths::batch_zip(self.separator.output_root(), sources.len(), settings, &key);
        if zip_path.exists() {
            info!("{} : already zipped", zip_path.display());
            return Ok(zip_path);
        }

        let mut dirs: Vec<PathBuf> = Vec::with_capacity(sources.len());
        for path in sources {
            let source = SourceAudio::new(path.as_ref())?;
            let resolved = self.separator.resolve(settings, &source)?;
            let dir = populated_dir(resolved.output_dir(), settings)?;
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
            progress.advance();
        }

        let mut entries = Vec::new();
        for dir in &dirs {
            let base = dir.parent().and_then(Path::parent).unwrap_or(dir);
            for entry in WalkDir::new(dir).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = entry.path().strip_prefix(base).map_err(|e| {
                    SplitterError::integrity(entry.path(), format!("outside result tree: {e}"))
                })?;
                entries.push((entry.path().to_path_buf(), entry_name(rel)));
            }
        }

        write_zip(&zip_path, &entries)?;
        info!(
            zip = %zip_path.display(),
            sources = sources.len(),
            files = entries.len(),
            "batch archive written"
        );
        progress.finish();
        Ok(zip_path)
    }
}

/// A resolved directory must hold at least one file of the codec. An empty
/// one means the engine or the cache lied about finishing.
fn populated_dir(dir: &Path, settings: &SeparationSettings) -> Result<PathBuf> {
    if list_codec_files(dir, settings.codec)?.is_empty() {
        return Err(SplitterError::integrity(
            dir,
            format!("no .{} files in a resolved result directory", settings.codec),
        ));
    }
    Ok(dir.to_path_buf())
}

/// Zip entry names always use `/`.
fn entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Deflate `entries` (source path, name in archive) into `zip_path`. The
/// archive is assembled in a temporary file next to the target and moved
/// into place only when complete, so a crash never leaves a truncated
/// archive at the cached path.
fn write_zip(zip_path: &Path, entries: &[(PathBuf, String)]) -> Result<()> {
    let parent = zip_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".stems-")
        .suffix(".zip.part")
        .tempfile_in(parent)?;

    {
        let mut zip = ZipWriter::new(tmp.as_file_mut());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (path, name) in entries {
            debug!(entry = %name, "adding to archive");
            zip.start_file(name.as_str(), options)
                .map_err(|e| SplitterError::archive(zip_path, e))?;
            let mut f = File::open(path)?;
            io::copy(&mut f, &mut zip)?;
        }

        zip.finish().map_err(|e| SplitterError::archive(zip_path, e))?;
    }

    tmp.persist(zip_path).map_err(|e| e.error)?;
    Ok(())
}
