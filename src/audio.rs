use std::{fs::File, io, path::Path};

use anyhow::{anyhow, Context};
use symphonia::core::{
    errors::Error as SymphoniaError, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};
use symphonia::default::get_probe;
use tracing::debug;

use crate::error::{Result, SplitterError};

/// Stream properties read from the container, without decoding samples.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: u64,
}

impl AudioInfo {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Probe an audio file's default track. When the container does not
/// declare a frame count (common for VBR MP3), packet durations are summed
/// up to the end of the stream. An empty stream is rejected.
///
/// Readable containers: WAV, MP3, FLAC, Ogg and MP4/M4A.
pub fn probe_audio<P: AsRef<Path>>(path: P) -> Result<AudioInfo> {
    let path: &Path = path.as_ref();

    let file = File::open(path)
        .map_err(|e| SplitterError::invalid_input(path, format!("cannot open: {e}")))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SplitterError::invalid_input(path, format!("unrecognized audio: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .with_context(|| format!("No default track in {:?}", path))?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| anyhow!("Unknown sample rate in {:?}", path))?;
    let channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);

    let frames = match params.n_frames {
        Some(n) => n,
        None => {
            let mut total = 0u64;
            loop {
                match format.next_packet() {
                    Ok(packet) => {
                        if packet.track_id() == track_id {
                            total += packet.dur;
                        }
                    }
                    Err(SymphoniaError::IoError(e))
                        if e.kind() == io::ErrorKind::UnexpectedEof =>
                    {
                        break
                    }
                    Err(e) => {
                        return Err(SplitterError::invalid_input(
                            path,
                            format!("read error after {total} frames: {e}"),
                        ))
                    }
                }
            }
            total
        }
    };
    if frames == 0 {
        return Err(SplitterError::invalid_input(path, "no audio frames"));
    }

    let info = AudioInfo {
        sample_rate,
        channels,
        frames,
    };
    debug!(
        path = %path.display(),
        sample_rate,
        channels,
        seconds = info.duration_secs(),
        "probed audio"
    );
    Ok(info)
}
