#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use spleeter_stems::{Downloader, SplitterError, YtDlp};
use tempfile::tempdir;

/// Stand-in for `yt-dlp` that behaves like the real tool for a single
/// video titled `AC/DC live`: it reports and writes the sanitized name
/// `AC⧸DC live.mp3` and counts real downloads in `count_file`.
const SCRIPT: &str = r#"#!/bin/sh
out=""; mode=download; prev=""
for a in "$@"; do
  case "$a" in
    -J) mode=info ;;
    filename) mode=name ;;
  esac
  if [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
done
dir=$(dirname "$out")
case "$mode" in
  info)
    echo '{"title":"AC/DC live","webpage_url":"https://example.com/watch?v=acdc"}'
    ;;
  name)
    echo "$dir/AC⧸DC live.webm"
    ;;
  *)
    if [ "FAIL_DOWNLOAD" = "yes" ]; then
      echo "ERROR: unable to download video data: HTTP Error 403" >&2
      exit 1
    fi
    echo "[download]  50.0% of 1.00MiB"
    printf 'mp3' > "$dir/AC⧸DC live.mp3"
    echo "[ExtractAudio] Destination: $dir/AC⧸DC live.mp3"
    echo "$dir/AC⧸DC live.mp3"
    echo x >> "COUNT_FILE"
    ;;
esac
"#;

fn fake_ytdlp(dir: &Path, fail_download: bool) -> (PathBuf, PathBuf) {
    let count = dir.join("downloads.count");
    let body = SCRIPT
        .replace("COUNT_FILE", &count.display().to_string())
        .replace("FAIL_DOWNLOAD", if fail_download { "yes" } else { "no" });
    let bin = dir.join("yt-dlp");
    fs::write(&bin, body).unwrap();
    fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
    (bin, count)
}

fn downloads(count: &Path) -> usize {
    fs::read_to_string(count)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

#[test]
fn returns_the_sanitized_path_and_skips_it_next_time() {
    let tmp = tempdir().unwrap();
    let (bin, count) = fake_ytdlp(tmp.path(), false);
    let dest = tmp.path().join("up");
    let ytdlp = YtDlp::new(bin);

    let mut seen = Vec::new();
    let first = ytdlp
        .download("https://example.com/watch?v=acdc", &dest, 192, &mut |f| seen.push(f))
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].title, "AC/DC live");
    assert_eq!(first[0].path, dest.join("AC⧸DC live.mp3"));
    assert!(first[0].path.is_file());
    assert!(!first[0].already_existed);
    assert_eq!(seen, vec![0.5, 1.0]);
    assert_eq!(downloads(&count), 1);

    let second = ytdlp
        .download("https://example.com/watch?v=acdc", &dest, 192, &mut |_| {})
        .unwrap();
    assert!(second[0].already_existed);
    assert_eq!(second[0].path, first[0].path);
    assert_eq!(downloads(&count), 1, "existing file must not be fetched again");
}

#[test]
fn failed_download_run_is_a_system_failure() {
    let tmp = tempdir().unwrap();
    let (bin, _) = fake_ytdlp(tmp.path(), true);

    let err = YtDlp::new(bin)
        .download("https://example.com/watch?v=acdc", &tmp.path().join("up"), 192, &mut |_| {})
        .unwrap_err();
    match &err {
        SplitterError::DownloadTool { reason, .. } => assert!(reason.contains("403"), "{reason}"),
        other => panic!("expected a download tool error, got {other}"),
    }
    assert!(!err.is_user_error());
}
