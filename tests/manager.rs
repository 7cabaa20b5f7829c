mod common;

mod tests {
    use super::common::{FakeBoard, FakeRmt, FakeSpi, FakeUart};
    use embassy_time::Instant;
    use myrtio_pixel_output::{
        ConfigOutcome, InitError, IsrOutcome, OutputManager, OutputType, PixelGeometry, PortConfig, RmtInterrupts,
        SerialSettings, Transport,
    };

    type Manager = OutputManager<FakeBoard, 1536, 3>;

    fn manager() -> Manager {
        OutputManager::new([
            Transport::uart(FakeUart::new()),
            Transport::rmt(FakeRmt::new()),
            Transport::spi(FakeSpi::default()),
        ])
    }

    fn pixels(output_type: OutputType, pixel_count: u16) -> PortConfig {
        PortConfig::new(output_type).with_pixel(PixelGeometry {
            pixel_count,
            gamma: 1.0,
            ..PixelGeometry::default()
        })
    }

    fn dmx(num_channels: u16) -> PortConfig {
        PortConfig::new(OutputType::Dmx).with_serial(SerialSettings {
            num_channels,
            baudrate: 250_000,
            ..SerialSettings::default()
        })
    }

    fn uart_hal(manager: &mut Manager, index: usize) -> &mut FakeUart {
        match manager.port_mut(index).unwrap().transport_mut() {
            Transport::Uart(uart) => uart.hal_mut(),
            _ => panic!("port {index} is not a UART port"),
        }
    }

    const TX_END: RmtInterrupts = RmtInterrupts {
        threshold: false,
        tx_end: true,
    };

    #[test]
    fn test_ports_start_disabled() {
        let mut manager = manager();
        assert_eq!(manager.port_count(), 3);
        assert_eq!(manager.buffer_size(), 1536);
        assert_eq!(manager.get_config(0).unwrap().output_type, OutputType::Disabled);
        assert_eq!(manager.status(0).unwrap().buffer_len, 0);
        assert_eq!(manager.poll(Instant::from_micros(0)), 0);
        assert!(manager.get_config(3).is_none());
    }

    #[test]
    fn test_set_config_brings_up_uart() {
        let mut manager = manager();
        let config = pixels(OutputType::Ws2811, 10);
        assert_eq!(manager.set_config(0, &config), Ok(ConfigOutcome::Accepted));
        assert_eq!(manager.get_config(0), Some(config));

        let settings = uart_hal(&mut manager, 0).settings.unwrap();
        assert_eq!(settings.baudrate, 3_200_000);
        assert!(settings.invert_tx);

        assert_eq!(manager.set_config(0, &pixels(OutputType::Tm1814, 10)), Ok(ConfigOutcome::Accepted));
        assert_eq!(uart_hal(&mut manager, 0).settings.unwrap().baudrate, 8_800_000);
    }

    #[test]
    fn test_get_config_round_trip_is_stable() {
        let mut manager = manager();
        let mut config = pixels(OutputType::Tm1814, 5000);
        config.current_limit = 200;
        assert_eq!(manager.set_config(0, &config), Ok(ConfigOutcome::Corrected));

        let applied = manager.get_config(0).unwrap();
        assert_eq!(applied.pixel.pixel_count, 512);
        assert_eq!(applied.current_limit, 63);

        assert_eq!(manager.set_config(0, &applied), Ok(ConfigOutcome::Accepted));
        assert_eq!(manager.get_config(0), Some(applied));
    }

    #[test]
    fn test_buffer_layout() {
        let mut manager = manager();
        manager.set_config(0, &pixels(OutputType::Ws2811, 10)).unwrap();
        manager.set_config(1, &dmx(16)).unwrap();

        let status = manager.status(1).unwrap();
        assert_eq!((status.buffer_start, status.buffer_len), (30, 16));

        assert_eq!(manager.write_port_channel_data(1, 0, &[1, 2, 3]), 3);
        assert_eq!(&manager.buffer()[30..33], [1, 2, 3]);
        assert_eq!(manager.write_port_channel_data(1, 15, &[9, 9]), 1);

        let mut out = [0u8; 3];
        assert_eq!(manager.read_port_channel_data(1, 0, &mut out), 3);
        assert_eq!(out, [1, 2, 3]);

        assert_eq!(manager.write_channel_data(1534, &[7, 7, 7]), 2);
        assert_eq!(manager.write_channel_data(2000, &[7]), 0);

        // Growing port 0 moves port 1 along.
        manager.set_config(0, &pixels(OutputType::Ws2811, 20)).unwrap();
        assert_eq!(manager.status(1).unwrap().buffer_start, 60);
    }

    #[test]
    fn test_growing_port_shrinks_later_port() {
        let mut manager: OutputManager<FakeBoard, 300, 3> = OutputManager::new([
            Transport::uart(FakeUart::new()),
            Transport::rmt(FakeRmt::new()),
            Transport::spi(FakeSpi::default()),
        ]);
        manager.set_config(1, &pixels(OutputType::Ws2811, 50)).unwrap();
        assert_eq!(manager.status(1).unwrap().buffer_len, 150);

        manager.set_config(0, &pixels(OutputType::Ws2811, 90)).unwrap();
        let status = manager.status(1).unwrap();
        assert_eq!((status.buffer_start, status.buffer_len), (270, 30));
        assert_eq!(manager.get_config(1).unwrap().pixel.pixel_count, 10);
        assert_eq!(manager.get_config(0).unwrap().pixel.pixel_count, 90);
    }

    #[test]
    fn test_disable_port_frees_buffer() {
        let mut manager = manager();
        manager.set_config(0, &pixels(OutputType::Ws2811, 10)).unwrap();
        manager.set_config(1, &dmx(16)).unwrap();

        assert_eq!(manager.set_config(0, &PortConfig::default()), Ok(ConfigOutcome::Accepted));
        assert_eq!(manager.status(0).unwrap().buffer_len, 0);
        assert_eq!(manager.status(1).unwrap().buffer_start, 0);
    }

    #[test]
    fn test_poll_paces_frames() {
        let mut manager = manager();
        manager.set_config(0, &pixels(OutputType::Ws2811, 10)).unwrap();
        // 30 values of 1.25 us bits plus the 350 us reset.
        assert_eq!(manager.status(0).unwrap().frame_min_duration_us, 650);

        assert_eq!(manager.poll(Instant::from_micros(0)), 1);
        assert_eq!(uart_hal(&mut manager, 0).wire.len(), 120);
        assert_eq!(manager.poll(Instant::from_micros(100)), 0);

        uart_hal(&mut manager, 0).drain();
        assert_eq!(manager.poll(Instant::from_micros(650)), 1);
        assert_eq!(manager.status(0).unwrap().frames, 2);
    }

    #[test]
    fn test_uart_interrupt_routed() {
        let mut manager = manager();
        manager.set_config(0, &pixels(OutputType::Ws2811, 100)).unwrap();
        assert_eq!(manager.poll(Instant::from_micros(0)), 1);
        assert!(manager.status(0).unwrap().busy);

        let mut outcome = IsrOutcome::InProgress;
        for _ in 0..100 {
            uart_hal(&mut manager, 0).drain();
            outcome = manager.on_uart_interrupt(0);
            if outcome == IsrOutcome::FrameComplete {
                break;
            }
        }
        assert_eq!(outcome, IsrOutcome::FrameComplete);
        assert_eq!(uart_hal(&mut manager, 0).wire.len(), 1200);
        assert!(!manager.status(0).unwrap().busy);

        assert_eq!(manager.on_uart_interrupt(1), IsrOutcome::NotForUs);
        assert_eq!(manager.on_uart_interrupt(7), IsrOutcome::NotForUs);
    }

    #[test]
    fn test_rmt_continuous_restart() {
        let mut manager = manager();
        manager.set_config(1, &dmx(16)).unwrap();
        manager.set_continuous(1, true);

        assert_eq!(manager.poll(Instant::from_micros(0)), 1);
        assert_eq!(manager.on_rmt_interrupt(1, TX_END), IsrOutcome::FrameComplete);

        let status = manager.status(1).unwrap();
        assert_eq!(status.frames, 2);
        assert!(status.busy);

        manager.set_continuous(1, false);
        assert_eq!(manager.on_rmt_interrupt(1, TX_END), IsrOutcome::FrameComplete);
        assert!(!manager.status(1).unwrap().busy);
        assert_eq!(manager.on_rmt_interrupt(0, TX_END), IsrOutcome::NotForUs);
    }

    #[test]
    fn test_pause_outputs() {
        let mut manager = manager();
        manager.set_config(0, &pixels(OutputType::Ws2811, 10)).unwrap();

        manager.pause_outputs(true);
        assert!(manager.is_paused());
        assert_eq!(manager.poll(Instant::from_micros(0)), 0);
        assert!(manager.status(0).unwrap().paused);

        manager.pause_outputs(false);
        assert_eq!(manager.poll(Instant::from_micros(0)), 1);
    }

    #[test]
    fn test_init_failure_disables_port() {
        let mut rmt = FakeRmt::new();
        rmt.fail_configure = true;
        let mut manager: Manager = OutputManager::new([
            Transport::uart(FakeUart::new()),
            Transport::rmt(rmt),
            Transport::spi(FakeSpi::default()),
        ]);

        assert_eq!(manager.set_config(1, &pixels(OutputType::Ws2811, 10)), Err(InitError::Rmt));
        assert_eq!(manager.get_config(1).unwrap().output_type, OutputType::Disabled);
        assert_eq!(manager.status(1).unwrap().buffer_len, 0);
        assert_eq!(manager.poll(Instant::from_micros(0)), 0);
    }

    #[test]
    fn test_unsupported_combinations() {
        let mut manager = manager();
        assert_eq!(
            manager.set_config(0, &pixels(OutputType::Apa102, 2)),
            Err(InitError::Unsupported)
        );
        assert_eq!(
            manager.set_config(2, &pixels(OutputType::Ws2811, 2)),
            Err(InitError::Unsupported)
        );
        assert_eq!(manager.get_config(2).unwrap().output_type, OutputType::Disabled);
        assert_eq!(
            manager.set_config(5, &pixels(OutputType::Ws2811, 2)),
            Err(InitError::NoSuchPort(5))
        );
    }

    #[test]
    fn test_spi_port_writes_on_poll() {
        let mut manager = manager();
        manager.set_config(2, &pixels(OutputType::Apa102, 2)).unwrap();
        manager.write_port_channel_data(2, 0, &[1, 2, 3, 4, 5, 6]);

        assert_eq!(manager.poll(Instant::from_micros(0)), 1);
        let Transport::Spi(spi) = manager.port(2).unwrap().transport() else {
            panic!("port 2 is not an SPI port");
        };
        assert_eq!(
            spi.bus().written,
            [0, 0, 0, 0, 0xFF, 1, 2, 3, 0xFF, 4, 5, 6, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_tls3001_needs_rmt() {
        let mut manager = manager();
        assert_eq!(
            manager.set_config(0, &pixels(OutputType::Tls3001, 4)),
            Err(InitError::Unsupported)
        );
        assert_eq!(manager.set_config(1, &pixels(OutputType::Tls3001, 4)), Ok(ConfigOutcome::Accepted));
        assert_eq!(manager.status(1).unwrap().buffer_len, 12);
    }

    #[test]
    fn test_grinch_port_writes_on_poll() {
        let mut manager = manager();
        let mut config = PortConfig::new(OutputType::Grinch);
        config.grinch_count = 9;
        assert_eq!(manager.set_config(2, &config), Ok(ConfigOutcome::Corrected));
        assert_eq!(manager.get_config(2).unwrap().grinch_count, 4);

        config.grinch_count = 1;
        assert_eq!(manager.set_config(2, &config), Ok(ConfigOutcome::Accepted));
        assert_eq!(manager.status(2).unwrap().buffer_len, 64);
        manager.write_port_channel_data(2, 0, &[255]);

        assert_eq!(manager.poll(Instant::from_micros(0)), 1);
        let Transport::Spi(spi) = manager.port(2).unwrap().transport() else {
            panic!("port 2 is not an SPI port");
        };
        assert_eq!(spi.bus().written, [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_status_json() {
        let mut manager = manager();
        manager.set_config(0, &pixels(OutputType::Ws2811, 10)).unwrap();

        let json = serde_json::to_value(manager.status(0).unwrap()).unwrap();
        assert_eq!(json["type"], "ws2811");
        assert_eq!(json["counters"]["transport"], "uart");
        assert_eq!(json["frames"], 0);
        assert_eq!(json["buffer_len"], 30);
    }
}
