use std::io::{Cursor, Write as _};

use proptest::prelude::*;

use super::*;

#[test]
fn swap_moves_red_and_blue_only() {
    assert_eq!(swap_red_blue(0x11_22_33_44), 0x11_44_33_22);
    assert_eq!(swap_red_blue(0xff_00_00_00), 0xff_00_00_00);
    assert_eq!(swap_red_blue(0x00_ff_00_00), 0x00_00_00_ff);
    assert_eq!(swap_red_blue(0x00_00_00_ff), 0x00_ff_00_00);
    assert_eq!(swap_red_blue(0x00_00_ff_00), 0x00_00_ff_00);
}

#[test]
fn row_conversion_is_native_endian() {
    let mut row = Vec::new();
    row.extend_from_slice(&0x80_10_20_30u32.to_ne_bytes());
    row.extend_from_slice(&0x01_02_03_04u32.to_ne_bytes());
    convert_row_in_place(&mut row);
    assert_eq!(&row[..4], &0x80_30_20_10u32.to_ne_bytes());
    assert_eq!(&row[4..], &0x01_04_03_02u32.to_ne_bytes());
}

fn source(width: u32, rows: u32) -> Vec<u8> {
    (0..width * rows)
        .flat_map(|i| (0xA0_00_00_00 | i).to_ne_bytes())
        .collect()
}

#[test]
fn rows_land_on_stride_and_padding_is_untouched() {
    let frame = RawFrame {
        width: 3,
        rows: 2,
        stride: 16,
    };
    let mut dst = vec![0xEEu8; 32];
    load_raw_frame(Cursor::new(source(3, 2)), &mut dst, frame).unwrap();

    for y in 0..2usize {
        for x in 0..3usize {
            let off = y * 16 + x * 4;
            let px = u32::from_ne_bytes(dst[off..off + 4].try_into().unwrap());
            let i = (y * 3 + x) as u32;
            assert_eq!(px, swap_red_blue(0xA0_00_00_00 | i));
        }
        assert!(dst[y * 16 + 12..y * 16 + 16].iter().all(|&b| b == 0xEE));
    }
}

#[test]
fn short_stream_names_the_failing_row() {
    let frame = RawFrame {
        width: 4,
        rows: 3,
        stride: 16,
    };
    let mut data = source(4, 3);
    data.truncate(16 * 2 + 5);
    let mut dst = vec![0u8; 48];
    let err = load_raw_frame(Cursor::new(data), &mut dst, frame).unwrap_err();
    assert!(matches!(err, BlitError::Io { .. }));
    assert!(err.to_string().contains("row 2"), "{err}");
}

#[test]
fn row_wider_than_stride_is_rejected() {
    let frame = RawFrame {
        width: 5,
        rows: 1,
        stride: 16,
    };
    let mut dst = vec![0u8; 64];
    let err = load_raw_frame(Cursor::new(source(5, 1)), &mut dst, frame).unwrap_err();
    assert!(matches!(err, BlitError::Validation(_)));
}

#[test]
fn undersized_destination_is_rejected() {
    let frame = RawFrame {
        width: 4,
        rows: 2,
        stride: 16,
    };
    let mut dst = vec![0u8; 31];
    let err = load_raw_frame(Cursor::new(source(4, 2)), &mut dst, frame).unwrap_err();
    assert!(matches!(err, BlitError::Validation(_)));
}

#[test]
fn raw_image_file_sizes() {
    let dir = tempfile::tempdir().unwrap();

    let exact = dir.path().join("exact.raw");
    std::fs::write(&exact, source(2, 2)).unwrap();
    let mut buf = Vec::new();
    open_raw_image(&exact, 2, 2)
        .unwrap()
        .read_to_end(&mut buf)
        .unwrap();
    assert_eq!(buf.len(), 16);

    let long = dir.path().join("long.raw");
    let mut f = File::create(&long).unwrap();
    f.write_all(&source(2, 3)).unwrap();
    drop(f);
    let mut buf = Vec::new();
    open_raw_image(&long, 2, 2)
        .unwrap()
        .read_to_end(&mut buf)
        .unwrap();
    assert_eq!(buf.len(), 16);

    let short = dir.path().join("short.raw");
    std::fs::write(&short, &source(2, 2)[..15]).unwrap();
    assert!(matches!(
        open_raw_image(&short, 2, 2).unwrap_err(),
        BlitError::Validation(_)
    ));

    assert!(matches!(
        open_raw_image(&dir.path().join("missing.raw"), 2, 2).unwrap_err(),
        BlitError::Io { .. }
    ));
}

proptest! {
    #[test]
    fn swap_is_an_involution(px in any::<u32>()) {
        prop_assert_eq!(swap_red_blue(swap_red_blue(px)), px);
    }

    #[test]
    fn swap_keeps_alpha_and_green(px in any::<u32>()) {
        prop_assert_eq!(swap_red_blue(px) & 0xff00_ff00, px & 0xff00_ff00);
    }
}
