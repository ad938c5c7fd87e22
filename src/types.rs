use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitterError};

/// How many stems to separate into, and which.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StemMode {
    #[serde(rename = "2stems")]
    TwoStems,
    #[serde(rename = "4stems")]
    FourStems,
    #[serde(rename = "5stems")]
    FiveStems,
}

impl StemMode {
    pub const ALL: [StemMode; 3] = [StemMode::TwoStems, StemMode::FourStems, StemMode::FiveStems];

    pub fn name(self) -> &'static str {
        match self {
            StemMode::TwoStems => "2stems",
            StemMode::FourStems => "4stems",
            StemMode::FiveStems => "5stems",
        }
    }

    /// Instrument labels in the order the engine emits them.
    pub fn instruments(self) -> &'static [&'static str] {
        match self {
            StemMode::TwoStems => &["vocals", "accompaniment"],
            StemMode::FourStems => &["vocals", "drums", "bass", "other"],
            StemMode::FiveStems => &["vocals", "drums", "bass", "piano", "other"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StemMode::TwoStems => "2stems: vocals and accompaniment",
            StemMode::FourStems => "4stems: vocals, drums, bass and other",
            StemMode::FiveStems => "5stems: vocals, drums, bass, piano and other",
        }
    }
}

impl fmt::Display for StemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StemMode {
    type Err = SplitterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2" | "2stems" => Ok(StemMode::TwoStems),
            "4" | "4stems" => Ok(StemMode::FourStems),
            "5" | "5stems" => Ok(StemMode::FiveStems),
            other => Err(SplitterError::InvalidSettings(format!(
                "unknown stem mode `{other}` (expected 2stems, 4stems or 5stems)"
            ))),
        }
    }
}

/// Output container/codec understood by the separation engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Wav,
    #[default]
    Mp3,
    Ogg,
    M4a,
    Wma,
    Flac,
}

impl Codec {
    pub const ALL: [Codec; 6] = [
        Codec::Wav,
        Codec::Mp3,
        Codec::Ogg,
        Codec::M4a,
        Codec::Wma,
        Codec::Flac,
    ];

    /// Engine identifier; also the file extension of every stem.
    pub fn as_str(self) -> &'static str {
        match self {
            Codec::Wav => "wav",
            Codec::Mp3 => "mp3",
            Codec::Ogg => "ogg",
            Codec::M4a => "m4a",
            Codec::Wma => "wma",
            Codec::Flac => "flac",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Codec {
    type Err = SplitterError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_start_matches('.').to_ascii_lowercase();
        Codec::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| SplitterError::InvalidSettings(format!("unknown codec `{s}`")))
    }
}

/// Everything that changes the separated output. Serialized through
/// [`SeparationSettings::tag`], this is the cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeparationSettings {
    pub mode: StemMode,
    pub codec: Codec,
    /// kbps
    pub bitrate: u32,
    /// Multi-channel Wiener filtering.
    pub use_mwf: bool,
    /// 16 kHz model variant instead of the 11 kHz one.
    pub use_16khz: bool,
    /// Seconds of audio to process; `None` means the whole file.
    pub max_duration: Option<u32>,
}

impl Default for SeparationSettings {
    fn default() -> Self {
        Self {
            mode: StemMode::FourStems,
            codec: Codec::Mp3,
            bitrate: 192,
            use_mwf: false,
            use_16khz: false,
            max_duration: Some(600),
        }
    }
}

impl SeparationSettings {
    pub fn new(mode: StemMode, codec: Codec, bitrate: u32) -> Self {
        Self {
            mode,
            codec,
            bitrate,
            ..Self::default()
        }
    }

    pub fn with_mwf(mut self, use_mwf: bool) -> Self {
        self.use_mwf = use_mwf;
        self
    }

    pub fn with_16khz(mut self, use_16khz: bool) -> Self {
        self.use_16khz = use_16khz;
        self
    }

    /// Zero means "whole file". The length is then read from the source,
    /// which must be WAV, MP3, FLAC, Ogg or MP4/M4A.
    pub fn with_max_duration(mut self, seconds: u32) -> Self {
        self.max_duration = (seconds > 0).then_some(seconds);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bitrate == 0 {
            return Err(SplitterError::InvalidSettings(
                "bitrate must be a positive number of kbps".into(),
            ));
        }
        if self.max_duration == Some(0) {
            return Err(SplitterError::InvalidSettings(
                "max duration of 0 seconds; use None for the whole file".into(),
            ));
        }
        Ok(())
    }

    /// Directory name and archive-name component for these settings, e.g.
    /// `4stems-16kHz-noMWF`. Existing caches on disk depend on this exact
    /// spelling.
    pub fn tag(&self) -> String {
        format!(
            "{}{}{}",
            self.mode.name(),
            if self.use_16khz { "-16kHz" } else { "-11kHz" },
            if self.use_mwf { "" } else { "-noMWF" }
        )
    }

    /// Pretrained model selector, e.g. `spleeter:4stems-16kHz`.
    pub fn params_descriptor(&self) -> String {
        format!(
            "spleeter:{}{}",
            self.mode.name(),
            if self.use_16khz { "-16kHz" } else { "" }
        )
    }

    pub fn bitrate_arg(&self) -> String {
        format!("{}k", self.bitrate)
    }

    /// Output naming template handed to the engine. `{filename}`,
    /// `{instrument}` and `{codec}` are expanded by the engine itself.
    pub fn filename_format(&self) -> String {
        format!(
            "{{filename}}/{}/{{filename}}_{{instrument}}.{{codec}}",
            self.tag()
        )
    }
}

/// An existing audio file on disk, identified by its file stem.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceAudio {
    path: PathBuf,
    stem: String,
}

impl SourceAudio {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(SplitterError::invalid_input(&path, "not an existing file"));
        }
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SplitterError::invalid_input(&path, "file name has no UTF-8 stem"))?
            .to_string();
        Ok(Self { path, stem })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extension-less base name, used in every derived output path.
    pub fn stem(&self) -> &str {
        &self.stem
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    #[default]
    Single,
    Multiple,
}

impl ProcessingMode {
    pub fn description(self) -> &'static str {
        match self {
            ProcessingMode::Single => "Split a single audio file",
            ProcessingMode::Multiple => "Split multiple audio files at once",
        }
    }
}
