use medialist::{PlaylistCore, PlaylistFileError, PlaylistFormat};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn library(dir: &std::path::Path, names: &[&str]) -> (PlaylistCore, Vec<PathBuf>) {
    let paths: Vec<PathBuf> = names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            fs::write(&path, b"x").expect("write media");
            path
        })
        .collect();
    let mut core = PlaylistCore::new();
    assert_eq!(core.add_all(&paths), paths.len());
    (core, paths)
}

#[test]
fn m3u_export_then_import_keeps_paths() {
    let dir = tempdir().expect("tempdir");
    let (mut source, paths) = library(dir.path(), &["Band - First.mp3", "second.mp4", "third.ogg"]);
    source.toggle_favorite(0);
    let list = dir.path().join("out.m3u");

    assert_eq!(source.export_to(&list, PlaylistFormat::M3u).expect("export"), 3);
    let text = fs::read_to_string(&list).expect("read export");
    assert!(text.starts_with("#EXTM3U\n#EXTINF:0,Band - First\n"));
    assert!(text.contains("#EXTINF:0,Unknown - second\n"));

    let mut imported = PlaylistCore::new();
    let report = imported.import_from(&list).expect("import");
    assert_eq!(report.found, 3);
    assert_eq!(report.added, 3);
    let round_trip: Vec<PathBuf> = imported.entries().iter().map(|e| e.file_path.clone()).collect();
    assert_eq!(round_trip, paths);
    assert!(!imported.entry_at(0).expect("first").is_favorite);
}

#[test]
fn pls_export_then_import_keeps_paths() {
    let dir = tempdir().expect("tempdir");
    let (source, paths) = library(dir.path(), &["a.wav", "b.flac"]);
    let list = dir.path().join("out.pls");

    assert_eq!(source.export_to(&list, PlaylistFormat::Pls).expect("export"), 2);
    let text = fs::read_to_string(&list).expect("read export");
    assert!(text.starts_with("[playlist]\nFile1="));
    assert!(text.ends_with("NumberOfEntries=2\nVersion=2\n"));

    let mut imported = PlaylistCore::new();
    let report = imported.import_from(&list).expect("import");
    assert_eq!(report.found, 2);
    let round_trip: Vec<PathBuf> = imported.entries().iter().map(|e| e.file_path.clone()).collect();
    assert_eq!(round_trip, paths);
}

#[test]
fn import_resolves_relative_entries_and_skips_invalid_ones() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir(dir.path().join("songs")).expect("mkdir");
    fs::write(dir.path().join("songs").join("a.mp3"), b"x").expect("write a");
    fs::write(dir.path().join("cover.jpg"), b"x").expect("write jpg");
    let list = dir.path().join("mix.m3u8");
    fs::write(&list, "#EXTM3U\nsongs/a.mp3\ncover.jpg\ngone.mp3\n").expect("write list");

    let mut core = PlaylistCore::new();
    let report = core.import_from(&list).expect("import");
    assert_eq!(report.found, 1);
    assert_eq!(core.entry_at(0).expect("a").file_path, dir.path().join("songs").join("a.mp3"));

    let again = core.import_from(&list).expect("second import");
    assert_eq!(again.found, 1);
    assert_eq!(again.added, 0);
    assert_eq!(core.len(), 1);
}

#[test]
fn import_failures_are_reported_not_raised() {
    let dir = tempdir().expect("tempdir");
    let mut core = PlaylistCore::new();

    let err = core.import_from(dir.path().join("absent.m3u")).expect_err("missing");
    assert!(matches!(err, PlaylistFileError::Read { .. }));

    let empty = dir.path().join("empty.pls");
    fs::write(&empty, "[playlist]\nNumberOfEntries=0\nVersion=2\n").expect("write");
    let err = core.import_from(&empty).expect_err("nothing valid");
    assert!(matches!(err, PlaylistFileError::NoMediaFound(_)));
    assert!(err.to_string().contains("no valid media files"));

    let other = dir.path().join("list.xspf");
    fs::write(&other, "<playlist/>").expect("write");
    let err = core.import_from(&other).expect_err("unknown format");
    assert!(matches!(err, PlaylistFileError::UnsupportedFormat(_)));
    assert!(core.is_empty());
}

#[test]
fn export_to_an_unwritable_target_fails_cleanly() {
    let dir = tempdir().expect("tempdir");
    let (core, _) = library(dir.path(), &["a.mp3"]);
    let err = core
        .export_to(dir.path().join("missing").join("out.m3u"), PlaylistFormat::M3u)
        .expect_err("unwritable");
    assert!(err.to_string().starts_with("cannot create"));
}

#[test]
fn export_while_filtered_writes_the_full_list() {
    let dir = tempdir().expect("tempdir");
    let (mut core, _) = library(dir.path(), &["keep.mp3", "drop.mp3"]);
    core.search("keep.mp3");
    assert_eq!(core.len(), 1);

    let list = dir.path().join("all.pls");
    assert_eq!(core.export_to(&list, PlaylistFormat::Pls).expect("export"), 2);
}
