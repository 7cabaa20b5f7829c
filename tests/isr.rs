mod common;

mod tests {
    use core::cell::RefCell;

    use super::common::{FakeBoard, FakeRmt, FakeUart};
    use critical_section::Mutex;
    use embassy_time::Instant;
    use myrtio_pixel_output::isr::SlotOutOfRange;
    use myrtio_pixel_output::{
        FrameDoneQueue, IsrOutcome, OutputManager, OutputType, PixelGeometry, PortConfig, PortTable, Transport,
    };

    type Manager = OutputManager<FakeBoard, 512, 2>;

    static MANAGER: Mutex<RefCell<Option<Manager>>> = Mutex::new(RefCell::new(None));
    static UART_PORTS: PortTable<usize, 3> = PortTable::new();
    static FRAME_DONE: FrameDoneQueue<2> = FrameDoneQueue::new();

    /// What a UART interrupt vector does on the target.
    fn uart_isr(channel: usize) -> IsrOutcome {
        let Some(port) = UART_PORTS.get(channel) else {
            return IsrOutcome::NotForUs;
        };
        critical_section::with(|cs| {
            let mut manager = MANAGER.borrow_ref_mut(cs);
            let Some(manager) = manager.as_mut() else {
                return IsrOutcome::NotForUs;
            };
            let outcome = manager.on_uart_interrupt(port);
            if outcome == IsrOutcome::FrameComplete {
                FRAME_DONE.notify(port);
            }
            outcome
        })
    }

    fn drain_uart(port: usize) {
        critical_section::with(|cs| {
            let mut manager = MANAGER.borrow_ref_mut(cs);
            let transport = manager
                .as_mut()
                .and_then(|manager| manager.port_mut(port))
                .map(|port| port.transport_mut());
            if let Some(Transport::Uart(uart)) = transport {
                uart.hal_mut().drain();
            }
        });
    }

    #[test]
    fn test_port_table() {
        let table: PortTable<u8, 2> = PortTable::new();
        assert_eq!(table.capacity(), 2);
        assert_eq!(table.get(0), None);
        assert_eq!(table.install(0, 7), Ok(None));
        assert_eq!(table.install(0, 8), Ok(Some(7)));
        assert_eq!(table.install(2, 9), Err(SlotOutOfRange(9)));

        let bumped = table.with(0, |value| {
            *value += 1;
            *value
        });
        assert_eq!(bumped, Some(9));
        assert_eq!(table.with(1, |value| *value), None);
        assert_eq!(table.remove(0), Some(9));
        assert_eq!(table.get(0), None);
    }

    #[test]
    fn test_frame_done_queue() {
        let queue: FrameDoneQueue<3> = FrameDoneQueue::new();
        assert!(queue.is_empty());
        assert!(queue.notify(2));
        assert!(queue.notify(0));
        assert!(queue.notify(2));
        assert!(queue.notify(1));
        assert!(!queue.notify(4));

        assert_eq!(queue.take(), Some(2));
        assert_eq!(queue.take(), Some(0));
        assert_eq!(queue.take(), Some(1));
        assert_eq!(queue.take(), None);
    }

    #[test]
    fn test_interrupt_dispatch_through_statics() {
        let mut manager: Manager = OutputManager::new([Transport::uart(FakeUart::new()), Transport::rmt(FakeRmt::new())]);
        let config = PortConfig::new(OutputType::Ws2811).with_pixel(PixelGeometry {
            pixel_count: 50,
            ..PixelGeometry::default()
        });
        manager.set_config(0, &config).unwrap();
        critical_section::with(|cs| MANAGER.borrow_ref_mut(cs).replace(manager));

        // UART2 drives port 0.
        UART_PORTS.install(2, 0).unwrap();

        critical_section::with(|cs| {
            let mut manager = MANAGER.borrow_ref_mut(cs);
            assert_eq!(manager.as_mut().unwrap().poll(Instant::from_micros(0)), 1);
        });
        assert_eq!(uart_isr(1), IsrOutcome::NotForUs);

        let mut outcome = IsrOutcome::InProgress;
        for _ in 0..100 {
            drain_uart(0);
            outcome = uart_isr(2);
            if outcome == IsrOutcome::FrameComplete {
                break;
            }
        }
        assert_eq!(outcome, IsrOutcome::FrameComplete);
        assert_eq!(FRAME_DONE.take(), Some(0));
        assert!(FRAME_DONE.is_empty());
    }
}
