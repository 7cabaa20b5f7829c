mod common;

mod tests {
    use super::common::collect_frame;
    use myrtio_pixel_output::gece::{self, GecePacket};
    use myrtio_pixel_output::protocol::{gece as gece_protocol, spi, tm1814, ucs, ws2811};
    use myrtio_pixel_output::{ColorOrder, ConfigOutcome, FrameSource, FrameState, PixelEncoding, PixelGeometry};
    use smart_leds::RGB8;

    fn linear(pixel_count: u16) -> PixelGeometry {
        PixelGeometry {
            pixel_count,
            gamma: 1.0,
            brightness: 100,
            ..PixelGeometry::default()
        }
    }

    const DATA: [u8; 9] = [10, 20, 30, 40, 50, 60, 70, 80, 90];

    #[test]
    fn test_ws2811_frame() {
        let mut renderer = ws2811::renderer();
        assert_eq!(renderer.configure(&linear(3), 9), ConfigOutcome::Accepted);
        assert_eq!(renderer.num_buffer_bytes_needed(), 9);

        let values = collect_frame(&mut renderer, &DATA);
        assert_eq!(values, [10, 20, 30, 40, 50, 60, 70, 80, 90]);
        assert_eq!(renderer.state(), FrameState::Done);
        assert!(!renderer.more_data_to_send());
        assert_eq!(renderer.next_intensity(&DATA), None);
    }

    #[test]
    fn test_color_order() {
        let mut renderer = ws2811::renderer();
        let geometry = PixelGeometry {
            color_order: ColorOrder::Grb,
            ..linear(3)
        };
        renderer.configure(&geometry, 9);
        assert_eq!(collect_frame(&mut renderer, &DATA), [20, 10, 30, 50, 40, 60, 80, 70, 90]);
    }

    #[test]
    fn test_gamma_applied() {
        let mut renderer = ws2811::renderer();
        let geometry = PixelGeometry {
            brightness: 50,
            ..linear(1)
        };
        renderer.configure(&geometry, 3);
        assert_eq!(collect_frame(&mut renderer, &[255, 0, 100]), [128, 0, 50]);
    }

    #[test]
    fn test_null_pixels() {
        let mut renderer = ws2811::renderer();
        let geometry = PixelGeometry {
            prepend_null_count: 1,
            append_null_count: 2,
            ..linear(1)
        };
        renderer.configure(&geometry, 3);
        assert_eq!(renderer.frame_intensity_count(), 12);
        assert_eq!(
            collect_frame(&mut renderer, &[1, 2, 3]),
            [0, 0, 0, 1, 2, 3, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_grouped_zigzag_frame() {
        let mut renderer = ws2811::renderer();
        let geometry = PixelGeometry {
            group_size: 2,
            ..linear(4)
        };
        renderer.configure(&geometry, 12);
        let data = [1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4];
        assert_eq!(
            collect_frame(&mut renderer, &data),
            [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2]
        );
    }

    #[test]
    fn test_apa102_blocks() {
        let mut renderer = spi::apa102_renderer();
        renderer.configure(&linear(2), 6);
        assert_eq!(
            collect_frame(&mut renderer, &[1, 2, 3, 4, 5, 6]),
            [0, 0, 0, 0, 0xFF, 1, 2, 3, 0xFF, 4, 5, 6, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_tm1814_preamble() {
        let mut renderer = tm1814::renderer(40);
        renderer.configure(&linear(1), 3);
        let values = collect_frame(&mut renderer, &[7, 8, 9]);
        assert_eq!(values, [40, 40, 40, 40, 215, 215, 215, 215, 7, 8, 9]);
        assert_eq!(tm1814::preamble(63), [63, 63, 63, 63, 192, 192, 192, 192]);
    }

    #[test]
    fn test_ucs8903_widens_to_sixteen_bits() {
        let mut renderer = ucs::ucs8903_renderer();
        renderer.configure(&linear(1), 3);
        assert_eq!(renderer.intensity_width(), 16);
        assert_eq!(collect_frame(&mut renderer, &[0x12, 0xFF, 0]), [0x1212, 0xFFFF, 0]);
    }

    #[test]
    fn test_gece_packets() {
        let mut renderer = gece_protocol::renderer(0xCC);
        renderer.configure(&linear(2), 6);
        assert_eq!(renderer.intensity_width(), 26);

        let data = [0xF0, 0x80, 0x10, 0x00, 0xFF, 0x0F];
        let values = collect_frame(&mut renderer, &data);
        assert_eq!(
            values,
            [
                gece::pack(0, 0xCC, RGB8::new(0xF0, 0x80, 0x10)),
                gece::pack(1, 0xCC, RGB8::new(0x00, 0xFF, 0x0F)),
            ]
        );
        assert_eq!(GecePacket::unpack(values[1]).address, 1);
    }

    #[test]
    fn test_gece_limits() {
        let mut renderer = gece_protocol::default_renderer();
        let geometry = PixelGeometry {
            prepend_null_count: 2,
            ..linear(100)
        };
        assert_eq!(renderer.configure(&geometry, 1000), ConfigOutcome::Corrected);
        assert_eq!(renderer.geometry().pixel_count, 63);
        assert_eq!(renderer.geometry().prepend_null_count, 0);
    }

    #[test]
    fn test_gece_reads_rgb_pixels() {
        let mut renderer = gece_protocol::default_renderer();
        let geometry = PixelGeometry {
            color_order: ColorOrder::Rgbw,
            ..linear(2)
        };
        assert_eq!(renderer.configure(&geometry, 100), ConfigOutcome::Corrected);
        assert_eq!(renderer.geometry().color_order, ColorOrder::Rgb);
        assert_eq!(renderer.num_buffer_bytes_needed(), 6);

        let data = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80];
        let values = collect_frame(&mut renderer, &data);
        let second = GecePacket::unpack(values[1]);
        assert_eq!((second.address, second.red, second.green, second.blue), (1, 4, 5, 6));
    }

    #[test]
    fn test_gece_ignores_three_byte_order() {
        let mut renderer = gece_protocol::default_renderer();
        let geometry = PixelGeometry {
            color_order: ColorOrder::Grb,
            ..linear(1)
        };
        assert_eq!(renderer.configure(&geometry, 100), ConfigOutcome::Corrected);
        assert_eq!(renderer.geometry().color_order, ColorOrder::Rgb);

        let values = collect_frame(&mut renderer, &[0x10, 0x20, 0x30]);
        assert_eq!(values, [gece::pack(0, 0xCC, RGB8::new(0x10, 0x20, 0x30))]);
    }

    #[test]
    fn test_gece_brightness_staged_until_next_frame() {
        let mut renderer = gece_protocol::renderer(0xCC);
        renderer.configure(&linear(2), 6);
        let data = [0xF0; 6];

        renderer.start_new_frame();
        let first = renderer.next_intensity(&data).map(GecePacket::unpack);
        assert_eq!(first.map(|packet| packet.brightness), Some(0xCC));

        renderer.set_gece_brightness(0x40);
        assert_eq!(renderer.encoding(), PixelEncoding::Gece { brightness: 0x40 });
        let second = renderer.next_intensity(&data).map(GecePacket::unpack);
        assert_eq!(second.map(|packet| packet.brightness), Some(0xCC));
        assert!(!renderer.more_data_to_send());

        let values = collect_frame(&mut renderer, &data);
        assert!(values.iter().all(|&bits| GecePacket::unpack(bits).brightness == 0x40));
        assert_eq!(renderer.active_encoding(), PixelEncoding::Gece { brightness: 0x40 });
    }

    #[test]
    fn test_gece_brightness_applies_when_idle() {
        let mut renderer = gece_protocol::renderer(0xCC);
        renderer.set_gece_brightness(0x10);
        assert_eq!(renderer.active_encoding(), PixelEncoding::Gece { brightness: 0x10 });

        let mut bytes = ws2811::renderer();
        bytes.set_gece_brightness(0x10);
        assert_eq!(bytes.encoding(), PixelEncoding::Bytes);
    }

    #[test]
    fn test_zero_pixels_is_done() {
        let mut renderer = ws2811::renderer();
        renderer.start_new_frame();
        assert_eq!(renderer.state(), FrameState::Done);
        assert!(!renderer.more_data_to_send());
        assert_eq!(renderer.next_intensity(&[]), None);
    }

    #[test]
    fn test_configure_staged_until_next_frame() {
        let mut renderer = ws2811::renderer();
        renderer.configure(&linear(3), 9);
        renderer.start_new_frame();
        assert_eq!(renderer.next_intensity(&DATA), Some(10));

        assert_eq!(renderer.configure(&linear(1), 9), ConfigOutcome::Accepted);
        assert_eq!(renderer.geometry().pixel_count, 1);

        let mut rest = Vec::new();
        while let Some(value) = renderer.next_intensity(&DATA) {
            rest.push(value);
        }
        assert_eq!(rest, [20, 30, 40, 50, 60, 70, 80, 90]);

        assert_eq!(collect_frame(&mut renderer, &DATA), [10, 20, 30]);
    }

    #[test]
    fn test_start_ignored_mid_frame() {
        let mut renderer = ws2811::renderer();
        renderer.configure(&linear(1), 3);
        renderer.start_new_frame();
        assert_eq!(renderer.next_intensity(&DATA), Some(10));
        renderer.start_new_frame();
        assert_eq!(renderer.next_intensity(&DATA), Some(20));
    }

    #[test]
    fn test_abort_frame() {
        let mut renderer = ws2811::renderer();
        renderer.configure(&linear(3), 9);
        renderer.start_new_frame();
        renderer.next_intensity(&DATA);
        renderer.abort_frame();
        assert_eq!(renderer.state(), FrameState::Done);
        assert_eq!(collect_frame(&mut renderer, &DATA).len(), 9);
    }

    #[test]
    fn test_channel_data_window() {
        let mut renderer = ws2811::renderer();
        renderer.configure(&linear(2), 6);
        let mut buffer = [0u8; 10];
        assert_eq!(renderer.write_channel_data(&mut buffer, 4, &[1, 2, 3]), 2);
        assert_eq!(buffer, [0, 0, 0, 0, 1, 2, 0, 0, 0, 0]);
        assert_eq!(renderer.write_channel_data(&mut buffer, 7, &[9]), 0);

        let mut out = [0u8; 4];
        assert_eq!(renderer.read_channel_data(&buffer, 3, &mut out), 3);
        assert_eq!(out, [0, 1, 2, 0]);
    }

    #[test]
    fn test_short_buffer_reads_zero() {
        let mut renderer = ws2811::renderer();
        renderer.configure(&linear(2), 6);
        assert_eq!(collect_frame(&mut renderer, &[5, 6, 7]), [5, 6, 7, 0, 0, 0]);
    }
}
