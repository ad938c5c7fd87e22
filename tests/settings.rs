use std::collections::HashSet;

use spleeter_stems::{Codec, SeparationSettings, SourceAudio, SplitterError, StemMode};
use tempfile::tempdir;

#[test]
fn tag_encodes_mode_rate_and_filter() {
    let base = SeparationSettings::new(StemMode::FourStems, Codec::Mp3, 192);
    assert_eq!(base.tag(), "4stems-11kHz-noMWF");
    assert_eq!(base.clone().with_16khz(true).tag(), "4stems-16kHz-noMWF");
    assert_eq!(base.clone().with_mwf(true).tag(), "4stems-11kHz");
    assert_eq!(
        SeparationSettings::new(StemMode::TwoStems, Codec::Wav, 128)
            .with_16khz(true)
            .with_mwf(true)
            .tag(),
        "2stems-16kHz"
    );
}

#[test]
fn tags_are_unique_and_stable_across_combinations() {
    let mut seen = HashSet::new();
    for mode in StemMode::ALL {
        for high in [false, true] {
            for mwf in [false, true] {
                let s = SeparationSettings::new(mode, Codec::Mp3, 192)
                    .with_16khz(high)
                    .with_mwf(mwf);
                let tag = s.tag();
                assert_eq!(tag, s.tag(), "tag must not change between calls");
                assert!(seen.insert(tag.clone()), "duplicate tag {tag}");
            }
        }
    }
    assert_eq!(seen.len(), 12);
}

#[test]
fn codec_and_bitrate_do_not_change_the_tag() {
    let a = SeparationSettings::new(StemMode::FiveStems, Codec::Mp3, 192);
    let b = SeparationSettings::new(StemMode::FiveStems, Codec::Flac, 320);
    assert_eq!(a.tag(), b.tag());
}

#[test]
fn engine_facing_strings() {
    let s = SeparationSettings::new(StemMode::FiveStems, Codec::Ogg, 256).with_16khz(true);
    assert_eq!(s.params_descriptor(), "spleeter:5stems-16kHz");
    assert_eq!(s.bitrate_arg(), "256k");
    assert_eq!(
        s.filename_format(),
        "{filename}/5stems-16kHz-noMWF/{filename}_{instrument}.{codec}"
    );

    let low = SeparationSettings::new(StemMode::TwoStems, Codec::Ogg, 256);
    assert_eq!(low.params_descriptor(), "spleeter:2stems");
}

#[test]
fn stem_modes_carry_their_instruments() {
    assert_eq!(StemMode::TwoStems.instruments(), ["vocals", "accompaniment"]);
    assert_eq!(StemMode::FourStems.instruments(), ["vocals", "drums", "bass", "other"]);
    assert_eq!(
        StemMode::FiveStems.instruments(),
        ["vocals", "drums", "bass", "piano", "other"]
    );
    for mode in StemMode::ALL {
        assert_eq!(mode.instruments()[0], "vocals");
        assert!(mode.label().starts_with(mode.name()));
    }
}

#[test]
fn parses_modes_and_codecs() {
    assert_eq!("4stems".parse::<StemMode>().unwrap(), StemMode::FourStems);
    assert_eq!("2".parse::<StemMode>().unwrap(), StemMode::TwoStems);
    assert_eq!("5STEMS".parse::<StemMode>().unwrap(), StemMode::FiveStems);
    assert_eq!("FLAC".parse::<Codec>().unwrap(), Codec::Flac);
    assert_eq!(".m4a".parse::<Codec>().unwrap(), Codec::M4a);

    let err = "3stems".parse::<StemMode>().unwrap_err();
    assert!(matches!(err, SplitterError::InvalidSettings(_)));
    assert!(err.is_user_error());
    assert!("aiff".parse::<Codec>().is_err());
}

#[test]
fn zero_duration_means_whole_file() {
    let s = SeparationSettings::default().with_max_duration(0);
    assert_eq!(s.max_duration, None);
    let s = s.with_max_duration(30);
    assert_eq!(s.max_duration, Some(30));
    assert_eq!(SeparationSettings::default().max_duration, Some(600));
}

#[test]
fn validate_rejects_zero_bitrate() {
    let s = SeparationSettings::new(StemMode::FourStems, Codec::Mp3, 0);
    assert!(matches!(s.validate(), Err(SplitterError::InvalidSettings(_))));
    assert!(SeparationSettings::default().validate().is_ok());
}

#[test]
fn settings_serialize_with_engine_names() {
    let json = serde_json::to_value(SeparationSettings::default()).unwrap();
    assert_eq!(json["mode"], "4stems");
    assert_eq!(json["codec"], "mp3");
}

#[test]
fn source_audio_requires_an_existing_file() {
    let dir = tempdir().unwrap();

    let err = SourceAudio::new(dir.path().join("missing.mp3")).unwrap_err();
    assert!(matches!(err, SplitterError::InvalidInput { .. }));

    let err = SourceAudio::new(dir.path()).unwrap_err();
    assert!(err.is_user_error());

    let path = dir.path().join("My Song.final.mp3");
    std::fs::write(&path, b"x").unwrap();
    let src = SourceAudio::new(&path).unwrap();
    assert_eq!(src.stem(), "My Song.final");
    assert_eq!(src.path(), path.as_path());
}
