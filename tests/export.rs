use std::fs;
use std::path::Path;

use pipboy::export::*;
use pipboy::sprite::frm::{DIRECTIONS, FRAME_AREA_OFFSET};
use pipboy::sprite::palette::Palette;

/// Big-endian FRM with one 2x2 frame shared by every direction.
fn tiny_frm() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(4u32.to_be_bytes());
    out.extend(10u16.to_be_bytes());
    out.extend(0u16.to_be_bytes());
    out.extend(1u16.to_be_bytes());
    out.extend([0u8; 12 + 12 + 24]);
    out.extend(16u32.to_be_bytes());
    assert_eq!(out.len(), FRAME_AREA_OFFSET);

    out.extend(2u16.to_be_bytes());
    out.extend(2u16.to_be_bytes());
    out.extend(4u32.to_be_bytes());
    out.extend(1i16.to_be_bytes());
    out.extend((-1i16).to_be_bytes());
    out.extend([0, 1, 2, 3]);
    out
}

fn write(dir: &Path, name: &str, bytes: &[u8]) {
    if let Some(parent) = dir.join(name).parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(dir.join(name), bytes).unwrap();
}

#[test]
fn export_file_writes_pngs_and_metadata() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "hero.frm", &tiny_frm());

    let metadata =
        export_file(&input.path().join("hero.frm"), &Palette::fallout().unwrap(), output.path()).unwrap();

    assert_eq!(metadata.directions.len(), DIRECTIONS);
    for d in 0..DIRECTIONS {
        let png = output.path().join(format!("hero_dir{d}_frame0.png"));
        let image = image::open(&png).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0[3], 255);
    }

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("hero.json")).unwrap()).unwrap();
    assert_eq!(json["header"]["fps"], 10);
    assert_eq!(json["header"]["framesPerDirection"], 1);
    assert_eq!(json["directions"][0][0]["xOff"], 1);
    assert_eq!(json["directions"][0][0]["yOff"], -1);
    assert_eq!(json["directions"][5][0]["file"], "hero_dir5_frame0.png");
}

#[test]
fn export_file_reports_corrupt_input() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "broken.frm", &[0u8; 20]);

    let err = export_file(&input.path().join("broken.frm"), &Palette::fallout().unwrap(), output.path())
        .unwrap_err();
    assert!(err.to_string().contains("broken.frm"), "{err}");
}

#[test]
fn export_file_reports_missing_file() {
    let output = tempfile::tempdir().unwrap();
    let result = export_file(Path::new("does/not/exist.frm"), &Palette::fallout().unwrap(), output.path());
    assert!(matches!(result, Err(pipboy::Error::Io { .. })));
}

#[test]
fn find_frm_files_recurses_and_filters() {
    let input = tempfile::tempdir().unwrap();
    write(input.path(), "b.frm", &[]);
    write(input.path(), "nested/a.FR2", &[]);
    write(input.path(), "nested/readme.txt", &[]);

    let files = find_frm_files(input.path());
    let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"b.frm"));
    assert!(names.contains(&"a.FR2"));
}

#[test]
fn export_folder_continues_past_bad_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "good.frm", &tiny_frm());
    write(input.path(), "bad.frm", &[1, 2, 3]);
    write(input.path(), "critters/other.fr0", &tiny_frm());

    let report = export_folder(input.path(), &Palette::fallout().unwrap(), output.path());

    assert_eq!(report.exported.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("bad.frm"));
    assert!(output.path().join("good_dir0_frame0.png").exists());
    assert!(output.path().join("other.json").exists());
    assert!(!output.path().join("bad.json").exists());
}

#[test]
fn export_folder_skips_duplicate_names() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(input.path(), "a/hero.frm", &tiny_frm());
    write(input.path(), "b/hero.frm", &tiny_frm());

    let report = export_folder(input.path(), &Palette::fallout().unwrap(), output.path());
    assert_eq!(report.exported.len(), 1);
    assert!(report.exported[0].starts_with(input.path().join("a")));
    assert!(report.failed.is_empty());
}
