//! Runtime configuration.
//!
//! Defaults can be overridden through environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `SPLEETER_STEMS_UPLOAD_DIR` | `upload_dir` |
//! | `SPLEETER_STEMS_OUTPUT_DIR` | `output_dir` |
//! | `SPLEETER_STEMS_SPLEETER_BIN` | `spleeter_program` |
//! | `SPLEETER_STEMS_YTDLP_BIN` | `ytdlp_program` |
//! | `SPLEETER_STEMS_CACHE_CHECK` | `cache_check` (`vocals` or `all`) |
//! | `SPLEETER_STEMS_BITRATE` | `default_bitrate` (kbps) |

use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    core::separator::CacheCheck,
    error::{Result, SplitterError},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where uploads and downloads are saved.
    pub upload_dir: PathBuf,
    /// Root of the separation cache and archives.
    pub output_dir: PathBuf,
    pub spleeter_program: PathBuf,
    pub ytdlp_program: PathBuf,
    pub cache_check: CacheCheck,
    pub default_bitrate: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./upload_files"),
            output_dir: PathBuf::from("./output"),
            spleeter_program: PathBuf::from("spleeter"),
            ytdlp_program: PathBuf::from("yt-dlp"),
            cache_check: CacheCheck::VocalsWitness,
            default_bitrate: 192,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from defaults plus whatever `lookup` returns for each variable.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get("SPLEETER_STEMS_UPLOAD_DIR") {
            cfg.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SPLEETER_STEMS_OUTPUT_DIR") {
            cfg.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SPLEETER_STEMS_SPLEETER_BIN") {
            cfg.spleeter_program = PathBuf::from(v);
        }
        if let Some(v) = get("SPLEETER_STEMS_YTDLP_BIN") {
            cfg.ytdlp_program = PathBuf::from(v);
        }
        if let Some(v) = get("SPLEETER_STEMS_CACHE_CHECK") {
            cfg.cache_check = v.parse()?;
        }
        if let Some(v) = get("SPLEETER_STEMS_BITRATE") {
            cfg.default_bitrate = match v.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(SplitterError::Config(format!(
                        "SPLEETER_STEMS_BITRATE must be a positive integer, got `{v}`"
                    )))
                }
            };
        }

        Ok(cfg)
    }
}
