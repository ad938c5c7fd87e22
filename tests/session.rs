use spleeter_stems::{ProcessingMode, Session, SplitterError};
use tempfile::tempdir;

#[test]
fn uploads_are_saved_and_registered() {
    let dir = tempdir().unwrap();
    let uploads = dir.path().join("upload_files");
    let mut session = Session::new(&uploads);

    let path = session.save_upload("song.MP3", b"bytes").unwrap();
    assert_eq!(path, uploads.join("song.MP3"));
    assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
    assert_eq!(session.audio_files(), [path.clone()]);

    let again = session.save_upload("song.MP3", b"newer").unwrap();
    assert_eq!(again, path);
    assert_eq!(session.audio_files().len(), 1, "re-upload is not listed twice");
    assert_eq!(std::fs::read(&path).unwrap(), b"newer");
}

#[test]
fn upload_names_cannot_escape_the_directory() {
    let dir = tempdir().unwrap();
    let uploads = dir.path().join("up");
    let mut session = Session::new(&uploads);

    let path = session.save_upload("../../etc/evil.wav", b"x").unwrap();
    assert_eq!(path, uploads.join("evil.wav"));
}

#[test]
fn unsupported_uploads_are_rejected() {
    let dir = tempdir().unwrap();
    let mut session = Session::new(dir.path());

    for name in ["notes.txt", "noext", ".."] {
        let err = session.save_upload(name, b"x").unwrap_err();
        assert!(matches!(err, SplitterError::InvalidInput { .. }), "{name}: {err}");
    }
    assert!(session.audio_files().is_empty());
}

#[test]
fn selection_must_come_from_the_list() {
    let dir = tempdir().unwrap();
    let mut session = Session::new(dir.path());
    let a = dir.path().join("a.mp3");

    assert!(session.select_audio(&a).is_err());
    assert!(session.add_audio_file(&a));
    assert!(!session.add_audio_file(a.clone()));
    session.select_audio(&a).unwrap();
    assert_eq!(session.selected_audio(), Some(a.as_path()));
}

#[test]
fn mode_and_outputs_are_tracked() {
    let mut session = Session::new("uploads");
    assert_eq!(session.mode(), ProcessingMode::Single);
    assert!(session.output_files().is_empty());

    session.set_mode(ProcessingMode::Multiple);
    session.set_output_files(vec!["out/batch.zip".into()]);
    assert_eq!(session.mode(), ProcessingMode::Multiple);
    assert_eq!(session.output_files().len(), 1);
    assert_ne!(
        ProcessingMode::Single.description(),
        ProcessingMode::Multiple.description()
    );
}
