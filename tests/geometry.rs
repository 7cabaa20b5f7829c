mod tests {
    use myrtio_pixel_output::geometry::source_pixel;
    use myrtio_pixel_output::{ColorOrder, ConfigOutcome, PixelGeometry};

    fn strip(pixel_count: u16) -> PixelGeometry {
        PixelGeometry {
            pixel_count,
            ..PixelGeometry::default()
        }
    }

    #[test]
    fn test_buffer_bytes() {
        assert_eq!(strip(10).buffer_bytes(), 30);
        let rgbw = PixelGeometry {
            color_order: ColorOrder::Grbw,
            ..strip(10)
        };
        assert_eq!(rgbw.buffer_bytes(), 40);
    }

    #[test]
    fn test_identity_mapping() {
        for led in 0..16 {
            assert_eq!(source_pixel(led, 1, 0), led);
        }
    }

    #[test]
    fn test_grouping() {
        let mapped: Vec<usize> = (0..6).map(|led| source_pixel(led, 2, 0)).collect();
        assert_eq!(mapped, [0, 0, 1, 1, 2, 2]);

        // One group spanning the whole string lights every LED from pixel 0.
        assert!((0..8).all(|led| source_pixel(led, 8, 0) == 0));
    }

    #[test]
    fn test_zigzag() {
        let mapped: Vec<usize> = (0..12).map(|led| source_pixel(led, 1, 4)).collect();
        assert_eq!(mapped, [0, 1, 2, 3, 7, 6, 5, 4, 8, 9, 10, 11]);
    }

    #[test]
    fn test_zero_group_treated_as_one() {
        assert_eq!(source_pixel(5, 0, 0), 5);
    }

    #[test]
    fn test_validated_accepts_sane_geometry() {
        let (fixed, outcome) = strip(10).validated(30, u16::MAX);
        assert_eq!(outcome, ConfigOutcome::Accepted);
        assert_eq!(fixed, strip(10));
    }

    #[test]
    fn test_validated_clamps() {
        let geometry = PixelGeometry {
            pixel_count: 50,
            group_size: 0,
            zig_size: 80,
            gamma: f32::NAN,
            brightness: 150,
            ..PixelGeometry::default()
        };
        let (fixed, outcome) = geometry.validated(60, u16::MAX);
        assert_eq!(outcome, ConfigOutcome::Corrected);
        assert_eq!(fixed.pixel_count, 20);
        assert_eq!(fixed.group_size, 1);
        assert_eq!(fixed.zig_size, 20);
        assert!((fixed.gamma - 2.2).abs() < f32::EPSILON);
        assert_eq!(fixed.brightness, 100);
    }

    #[test]
    fn test_validated_group_bounded_by_count() {
        let geometry = PixelGeometry {
            group_size: 10,
            ..strip(3)
        };
        let (fixed, outcome) = geometry.validated(9, u16::MAX);
        assert_eq!(outcome, ConfigOutcome::Corrected);
        assert_eq!(fixed.group_size, 3);
    }

    #[test]
    fn test_validated_protocol_limit() {
        let (fixed, outcome) = strip(100).validated(3000, 63);
        assert_eq!(outcome, ConfigOutcome::Corrected);
        assert_eq!(fixed.pixel_count, 63);
    }

    #[test]
    fn test_wire_offsets() {
        assert_eq!(ColorOrder::Rgb.wire_offsets(), [0, 1, 2, 3]);
        assert_eq!(ColorOrder::Grb.wire_offsets(), [1, 0, 2, 3]);
        assert_eq!(ColorOrder::Bgr.wire_offsets(), [2, 1, 0, 3]);
        assert_eq!(ColorOrder::Wrgb.wire_offsets(), [3, 0, 1, 2]);
        assert_eq!(ColorOrder::Wrgb.bytes_per_pixel(), 4);
    }
}
