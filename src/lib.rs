//! # spleeter-stems
//!
//! Settings-keyed cache around an audio source separation engine. Results
//! land in a deterministic directory per (file, settings) pair, are reused
//! on later calls, and can be bundled into zip archives singly or in
//! batches with progress reporting.

pub mod app;
pub mod audio;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod paths;
pub mod session;
pub mod types;

pub use crate::{
    app::{App, SingleOutcome},
    audio::{probe_audio, AudioInfo},
    config::AppConfig,
    core::{
        archive::Archiver,
        engine::{EngineRequest, SeparationEngine, SpleeterCli},
        separator::{CacheCheck, OutputFiles, Resolved, Separator},
    },
    error::{Result, SplitterError},
    io::download::{classify_url, Downloaded, Downloader, UrlKind, YtDlp},
    session::Session,
    types::{Codec, ProcessingMode, SeparationSettings, SourceAudio, StemMode},
};
