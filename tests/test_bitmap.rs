//! Tests for the binary image pipeline: thresholding, recentering,
//! denoising, segmentation and feature vectors.

use std::collections::HashSet;

use approx::assert_relative_eq;
use glyph_trainer::bitmap::{Axis, BinaryImage, Rect, DEFAULT_GRID, DEFAULT_THRESHOLD};
use glyph_trainer::error::OcrError;
use image::{DynamicImage, Rgb, RgbImage};

fn ascii(rows: &[&str]) -> BinaryImage {
    BinaryImage::from_ascii(rows).unwrap()
}

fn pixel_set(glyphs: &[Vec<(u32, u32)>]) -> HashSet<(u32, u32)> {
    glyphs.iter().flatten().copied().collect()
}

// ============================================================================
// Binarization
// ============================================================================

mod binarize_tests {
    use super::*;

    #[test]
    fn test_luminance_threshold() {
        let mut rgb = RgbImage::from_pixel(3, 1, Rgb([255, 255, 255]));
        rgb.put_pixel(0, 0, Rgb([255, 0, 0])); // luma 76
        rgb.put_pixel(1, 0, Rgb([0, 255, 0])); // luma 149
        let img = BinaryImage::from_dynamic(&DynamicImage::ImageRgb8(rgb), DEFAULT_THRESHOLD).unwrap();
        assert!(img.is_black(0, 0));
        assert!(!img.is_black(1, 0));
        assert!(!img.is_black(2, 0));
    }

    #[test]
    fn test_zero_area_is_invalid() {
        assert!(matches!(BinaryImage::blank(0, 4), Err(OcrError::InvalidImage(_))));
        assert!(matches!(BinaryImage::from_ascii(&[]), Err(OcrError::InvalidImage(_))));
        let empty = DynamicImage::ImageRgb8(RgbImage::new(5, 0));
        assert!(matches!(BinaryImage::from_dynamic(&empty, 128), Err(OcrError::InvalidImage(_))));
    }

    #[test]
    fn test_garbage_bytes_are_an_invalid_image() {
        assert!(matches!(
            BinaryImage::from_bytes(b"definitely not a png", DEFAULT_THRESHOLD),
            Err(OcrError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_unreadable_files_are_an_invalid_image() {
        let dir = tempfile::TempDir::new().unwrap();
        let garbage = dir.path().join("scan.png");
        std::fs::write(&garbage, b"definitely not a png").unwrap();
        assert!(matches!(BinaryImage::open(&garbage, DEFAULT_THRESHOLD), Err(OcrError::InvalidImage(_))));

        let missing = dir.path().join("missing.png");
        match BinaryImage::open(&missing, DEFAULT_THRESHOLD) {
            Err(OcrError::InvalidImage(message)) => assert!(message.contains("missing.png"), "{message}"),
            other => panic!("expected InvalidImage, got {other:?}"),
        }
    }

    #[test]
    fn test_png_round_trip_keeps_pixels() {
        let img = ascii(&["#..#", ".##.", "#..#"]);
        let back = BinaryImage::from_bytes(&img.to_png().unwrap(), DEFAULT_THRESHOLD).unwrap();
        assert_eq!(back, img);
    }
}

// ============================================================================
// Recenter
// ============================================================================

mod recenter_tests {
    use super::*;

    #[test]
    fn test_bounding_box_has_one_pixel_margin() {
        let img = ascii(&[
            "........",
            "........",
            "...##...",
            "...#....",
            "........",
        ]);
        assert_eq!(img.bounding_box(), Rect { x: 2, y: 1, width: 4, height: 4 });
    }

    #[test]
    fn test_margin_is_clamped_at_edges() {
        let img = ascii(&["#...", "...."]);
        assert_eq!(img.bounding_box(), Rect { x: 0, y: 0, width: 2, height: 2 });
    }

    #[test]
    fn test_blank_image_keeps_full_bounds() {
        let mut img = BinaryImage::blank(6, 3).unwrap();
        assert_eq!(img.bounding_box(), Rect { x: 0, y: 0, width: 6, height: 3 });
        img.recenter();
        assert_eq!(img.dimensions(), (6, 3));
    }

    #[test]
    fn test_recenter_is_idempotent() {
        for rows in [
            &["..........", "....##....", "....#.....", "...###....", ".........."][..],
            &["#.........", "..........", ".........#"][..],
            &["...", ".#.", "..."][..],
        ] {
            let mut once = ascii(rows);
            once.recenter();
            let mut twice = once.clone();
            twice.recenter();
            assert_eq!(twice, once);
            assert_eq!(twice.bounding_box(), Rect { x: 0, y: 0, width: once.width(), height: once.height() });
        }
    }
}

// ============================================================================
// Denoise
// ============================================================================

mod denoise_tests {
    use super::*;

    fn noisy() -> BinaryImage {
        ascii(&[
            "#.##...#####..#",
            "...#.#.#...#...",
            "####.#.#####.##",
            "...#...........",
            ".#.###.#.#.####",
        ])
    }

    #[test]
    fn test_denoise_never_adds_black() {
        for threshold in 0..6 {
            for axis in [Axis::Rows, Axis::Columns] {
                let before = noisy();
                let mut after = before.clone();
                after.denoise_axis(axis, threshold);
                assert!(after.black_count() <= before.black_count());
                let kept: HashSet<_> = after.black_pixels().into_iter().collect();
                let original: HashSet<_> = before.black_pixels().into_iter().collect();
                assert!(kept.is_subset(&original));
            }
        }
    }

    #[test]
    fn test_isolated_short_runs_are_removed() {
        let mut img = ascii(&["##....###.#####", "..............."]);
        img.denoise_axis(Axis::Rows, 3);
        assert_eq!(img.black_count(), 5);
        assert!((10..15).all(|x| img.is_black(x, 0)));
    }

    #[test]
    fn test_threshold_zero_is_a_no_op() {
        let mut img = noisy();
        img.denoise(0);
        assert_eq!(img, noisy());
    }

    #[test]
    fn test_both_axes_remove_ruling_line_but_keep_stroke() {
        let mut img = ascii(&[
            "....##...",
            "....##...",
            "#########",
            "....##...",
            "....##...",
        ]);
        img.denoise(1);
        // the one-pixel-thick ruling line goes except where it crosses the
        // two-pixel-wide stroke
        assert!((0..5).all(|y| img.is_black(4, y) && img.is_black(5, y)));
        assert!(!img.is_black(0, 2) && !img.is_black(8, 2));
        assert_eq!(img.black_count(), 10);
    }
}

// ============================================================================
// Segmentation
// ============================================================================

mod segmentation_tests {
    use super::*;

    fn two_squares() -> BinaryImage {
        ascii(&[
            "..........",
            ".###..###.",
            ".###..###.",
            ".###..###.",
            "..........",
        ])
    }

    #[test]
    fn test_split_by_columns_two_squares() {
        let glyphs = two_squares().split_by_columns_min(3);
        assert_eq!(glyphs.len(), 2);
        for glyph in &glyphs {
            let xs: Vec<u32> = glyph.iter().map(|p| p.0).collect();
            let width = xs.iter().max().unwrap() - xs.iter().min().unwrap() + 1;
            assert_eq!(width, 3);
            assert_eq!(glyph.len(), 9);
        }
        assert!(glyphs[0][0].0 < glyphs[1][0].0);
    }

    #[test]
    fn test_default_minimum_drops_narrow_glyphs() {
        assert!(two_squares().split_by_columns().is_empty());
    }

    #[test]
    fn test_split_by_rows_maps_back_to_source_coordinates() {
        let img = ascii(&[
            ".####.",
            ".#..#.",
            "......",
            "......",
            "##....",
            "......",
        ]);
        let glyphs = img.split_by_rows_min(1);
        assert_eq!(glyphs.len(), 2);
        assert_eq!(
            glyphs[0].iter().copied().collect::<HashSet<_>>(),
            [(1, 0), (2, 0), (3, 0), (4, 0), (1, 1), (4, 1)].into_iter().collect()
        );
        assert_eq!(glyphs[1].iter().copied().collect::<HashSet<_>>(), [(0, 4), (1, 4)].into_iter().collect());
    }

    #[test]
    fn test_connected_components_partition_black_pixels() {
        let img = ascii(&[
            "##...#",
            "#...#.",
            "....#.",
            ".##...",
            "..#..#",
        ]);
        let glyphs = img.split_connected();
        // diagonal neighbours are separate components
        assert_eq!(glyphs.len(), 5);
        let total: usize = glyphs.iter().map(Vec::len).sum();
        assert_eq!(total, img.black_count());
        assert_eq!(pixel_set(&glyphs), img.black_pixels().into_iter().collect());
    }

    #[test]
    fn test_connected_handles_overlapping_columns() {
        let img = ascii(&[
            "#####.",
            "......",
            ".#####",
        ]);
        assert_eq!(img.split_by_columns_min(1).len(), 1);
        assert_eq!(img.split_connected().len(), 2);
    }

    #[test]
    fn test_glyph_image_round_trip() {
        let img = two_squares();
        let glyph = &img.split_by_columns_min(3)[1];
        let cut = BinaryImage::from_glyph(glyph).unwrap();
        assert_eq!(cut.dimensions(), (3, 3));
        assert_eq!(cut.black_count(), 9);
    }
}

// ============================================================================
// Feature vectors
// ============================================================================

mod feature_tests {
    use super::*;

    #[test]
    fn test_single_cell_vector_is_one() {
        let img = ascii(&["#.", ".."]);
        assert_eq!(img.feature_vector((1, 1)).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_cells_are_numbered_row_by_row() {
        let img = ascii(&[
            "..##",
            "....",
        ]);
        let v = img.feature_vector((2, 2)).unwrap();
        assert_eq!(v.len(), 4);
        assert_relative_eq!(v[1], 1.0);
        assert_relative_eq!(v[0] + v[2] + v[3], 0.0);
    }

    #[test]
    fn test_vector_is_unit_length() {
        let img = ascii(&["#.#..#", "##...#", "....##", "#.....", "###..#"]);
        let v = img.feature_vector(DEFAULT_GRID).unwrap();
        assert_eq!(v.len(), 15);
        let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
        assert!(v.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn test_uneven_cells_absorb_remainder() {
        // width 5 over 2 columns: cells are 3 wide, the second covers x = 3..5
        let img = ascii(&["....#"]);
        let v = img.feature_vector((2, 1)).unwrap();
        assert_eq!(v, vec![0.0, 1.0]);
    }

    #[test]
    fn test_blank_image_is_degenerate() {
        let img = BinaryImage::blank(4, 4).unwrap();
        assert!(matches!(img.feature_vector(DEFAULT_GRID), Err(OcrError::DegenerateVector)));
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let img = ascii(&["#"]);
        assert!(matches!(img.feature_vector((0, 2)), Err(OcrError::InvalidConfig(_))));
    }
}
