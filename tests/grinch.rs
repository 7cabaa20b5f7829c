mod common;

mod tests {
    use super::common::{FakeSpi, collect_frame};
    use myrtio_pixel_output::grinch::{GrinchState, pack_channels, validated_controllers};
    use myrtio_pixel_output::protocol::grinch;
    use myrtio_pixel_output::{ConfigOutcome, FrameSource, SpiTransport};

    #[test]
    fn test_pack_channels() {
        let mut data = [0u8; 8];
        assert_eq!(pack_channels(&data, 0), 0xFF);

        data[0] = 255;
        data[7] = 128;
        assert_eq!(pack_channels(&data, 0), 0b0111_1110);

        data[3] = 127;
        assert_eq!(pack_channels(&data, 0), 0b0111_1110);
    }

    #[test]
    fn test_controller_count_clamped() {
        assert_eq!(validated_controllers(2, 512), (2, ConfigOutcome::Accepted));
        assert_eq!(validated_controllers(0, 512), (1, ConfigOutcome::Corrected));
        assert_eq!(validated_controllers(9, 512), (4, ConfigOutcome::Corrected));
        assert_eq!(validated_controllers(3, 130), (2, ConfigOutcome::Corrected));
    }

    #[test]
    fn test_buffer_bytes() {
        let mut renderer = grinch::renderer();
        assert_eq!(renderer.num_buffer_bytes_needed(), 64);
        renderer.configure(3, 1024);
        assert_eq!(renderer.num_buffer_bytes_needed(), 192);
        assert_eq!(renderer.frame_intensity_count(), 24);
    }

    #[test]
    fn test_last_register_first() {
        let mut renderer = grinch::renderer();
        renderer.configure(1, 64);
        let mut data = [0u8; 64];
        data[0] = 200;
        data[63] = 200;

        let values = collect_frame(&mut renderer, &data);
        assert_eq!(values.len(), 8);
        assert_eq!(values[0], 0b1111_1110);
        assert!(values[1..7].iter().all(|value| *value == 0xFF));
        assert_eq!(values[7], 0b0111_1111);
        assert_eq!(renderer.state(), GrinchState::Done);
    }

    #[test]
    fn test_count_change_waits_for_frame() {
        let mut renderer = grinch::renderer();
        renderer.configure(1, 256);
        let data = [0u8; 256];

        renderer.start_new_frame();
        renderer.next_intensity(&data);
        renderer.configure(2, 256);
        assert_eq!(renderer.controllers(), 2);

        let mut sent = 1;
        while renderer.next_intensity(&data).is_some() {
            sent += 1;
        }
        assert_eq!(sent, 8);
        assert_eq!(collect_frame(&mut renderer, &data).len(), 16);
    }

    #[test]
    fn test_frame_on_the_bus() {
        let mut transport = SpiTransport::new(FakeSpi::default());
        let mut renderer = grinch::renderer();
        renderer.configure(1, 64);
        let mut data = [0u8; 64];
        data[8] = 255;

        transport.start_new_frame(&mut renderer, &data);

        assert_eq!(transport.bus().written, [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F, 0xFF]);
        assert_eq!(transport.counters().frames_sent, 1);
    }
}
