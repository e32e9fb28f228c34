use pipboy::sprite::compositor::*;
use pipboy::sprite::frm::{DIRECTIONS, Frame, FrmHeader, SpriteContainer};
use pipboy::sprite::palette::*;

fn rgbw() -> Palette {
    Palette::from_colors(&[[0.0, 0.0, 0.0], [255.0, 0.0, 0.0], [0.0, 255.0, 0.0], [0.0, 0.0, 255.0]])
        .unwrap()
}

fn container(pixels: Vec<u8>) -> SpriteContainer {
    let frame = Frame { width: 2, height: 2, offset_x: 3, offset_y: -4, pixels };
    SpriteContainer {
        header: FrmHeader {
            version: 4,
            fps: 10,
            action_frame: 0,
            frames_per_direction: 1,
            shift_x: [0; DIRECTIONS],
            shift_y: [0; DIRECTIONS],
            direction_offsets: [0; DIRECTIONS],
        },
        directions: std::array::from_fn(|_| vec![frame.clone()]),
    }
}

// ── Palette shapes ────────────────────────────────────────────────────────────

#[test]
fn flat_and_tuple_palettes_agree() {
    let flat = Palette::from_flat(vec![0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255]).unwrap();
    assert_eq!(flat, rgbw());
    assert_eq!(flat.len(), 4);
}

#[test]
fn flat_palette_must_be_whole_triples() {
    assert!(matches!(Palette::from_flat(vec![1, 2, 3, 4]), Err(PaletteError::InvalidPalette(_))));
}

#[test]
fn rgba_tuples_drop_alpha() {
    let palette = Palette::from_colors(&[vec![10.0, 20.0, 30.0, 0.5]]).unwrap();
    assert_eq!(palette.as_bytes(), &[10, 20, 30]);
}

#[test]
fn short_tuples_are_rejected() {
    assert!(Palette::from_colors(&[vec![1.0, 2.0]]).is_err());
}

#[test]
fn json_accepts_both_shapes() {
    let flat: PaletteInput = serde_json::from_str("[1, 2, 3, 4, 5, 6]").unwrap();
    let tuples: PaletteInput = serde_json::from_str("[[1, 2, 3], [4, 5, 6, 255]]").unwrap();
    assert_eq!(normalize_palette(&flat), normalize_palette(&tuples));
    assert_eq!(Palette::try_from(flat).unwrap().rgb(1), Some([4, 5, 6]));
}

// ── Palette files ─────────────────────────────────────────────────────────────

#[test]
fn gimp_palette_skips_header_and_comments() {
    let text = "GIMP Palette\nName: Test\nColumns: 4\n#\n  0   0   0\tIndex 0\n255 128 0 Orange\n\n# trailing comment\n";
    let palette = parse_gimp_palette(text).unwrap();
    assert_eq!(palette.len(), 2);
    assert_eq!(palette.rgb(1), Some([255, 128, 0]));
}

#[test]
fn gimp_palette_without_colours_is_invalid() {
    assert!(parse_gimp_palette("GIMP Palette\nName: Empty\n").is_err());
}

#[test]
fn padded_binary_palette_is_truncated() {
    let mut bytes: Vec<u8> = (0..768).map(|i| (i % 256) as u8).collect();
    bytes.extend([0xAA; 4]);
    let palette = parse_binary_palette(&bytes).unwrap();
    assert_eq!(palette.len(), 256);
    assert_eq!(palette.rgb(255), Some([253, 254, 255]));
}

#[test]
fn file_format_follows_extension() {
    let gpl = parse_palette_file(b"GIMP Palette\n1 2 3\n", Some("dos.GPL")).unwrap();
    let json = parse_palette_file(b"[[1, 2, 3]]", Some("pal.json")).unwrap();
    let binary = parse_palette_file(&[1, 2, 3], Some("color.pal")).unwrap();
    let unnamed = parse_palette_file(&[1, 2, 3], None).unwrap();
    assert_eq!(gpl, json);
    assert_eq!(json, binary);
    assert_eq!(binary, unnamed);
}

#[test]
fn bad_json_palette_is_invalid() {
    let err = parse_palette_file(b"{\"not\": \"a palette\"}", Some("p.json")).unwrap_err();
    assert!(matches!(err, PaletteError::InvalidPalette(_)));
}

#[test]
fn builtin_palette_has_256_colours() {
    let palette = Palette::fallout().unwrap();
    assert_eq!(palette.len(), 256);
    assert_eq!(palette.as_bytes().len(), 768);
}

// ── Compositing ───────────────────────────────────────────────────────────────

#[test]
fn apply_palette_resolves_known_pixels() {
    let rgba = apply_palette(&container(vec![0, 1, 2, 3]), &rgbw()).unwrap();
    let frame = &rgba[0][0];
    assert_eq!(
        frame.pixels,
        vec![0, 0, 0, 0, 255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255]
    );
    assert_eq!((frame.width, frame.height), (2, 2));
    assert_eq!((frame.offset_x, frame.offset_y), (3, -4));
}

#[test]
fn apply_palette_covers_every_direction() {
    let rgba = apply_palette(&container(vec![1, 1, 1, 1]), &rgbw()).unwrap();
    assert_eq!(rgba.len(), DIRECTIONS);
    for frames in &rgba {
        assert_eq!(frames.len(), 1);
        assert!(frames[0].texels().iter().all(|&t| t == [255, 0, 0, 255]));
    }
}

#[test]
fn index_zero_is_transparent_with_any_palette() {
    let white = Palette::from_flat(vec![255; 12]).unwrap();
    let rgba = apply_palette(&container(vec![0, 0, 0, 0]), &white).unwrap();
    assert!(rgba[0][0].pixels.iter().all(|&b| b == 0));
}

#[test]
fn index_past_palette_fails() {
    let err = apply_palette(&container(vec![0, 1, 2, 9]), &rgbw()).unwrap_err();
    assert_eq!(err, PaletteError::IndexOutOfRange { index: 9, colors: 4 });
}

#[test]
fn gimp_fields_use_their_leading_integer() {
    let text = "GIMP Palette\n12abc 255.5 7\t# odd export\n-4 300 +9\n";
    let palette = parse_gimp_palette(text).unwrap();
    assert_eq!(palette.len(), 2);
    assert_eq!(palette.rgb(0), Some([12, 255, 7]));
    assert_eq!(palette.rgb(1), Some([0, 255, 9]));
}
