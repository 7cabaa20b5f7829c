#![allow(dead_code)]

use embedded_hal::spi::{ErrorKind, ErrorType, SpiBus};
use myrtio_pixel_output::{
    Board, FrameSource, IsrOutcome, RmtHal, RmtInterrupts, RmtItem, RmtTransport, UartHal,
    UartSettings, UartTransport,
};

/// UART that records every byte and break.
#[derive(Debug, Default)]
pub struct FakeUart {
    pub settings: Option<UartSettings>,
    pub fail_configure: bool,
    pub wire: Vec<u8>,
    /// Bytes still queued in the FIFO.
    pub queued: usize,
    pub capacity: usize,
    pub tx_enabled: bool,
    pub raised: bool,
    /// `(break_us, mab_us, wire position)` for every break sent.
    pub breaks: Vec<(u32, u32, usize)>,
}

impl FakeUart {
    pub fn new() -> Self {
        Self {
            capacity: 128,
            ..Self::default()
        }
    }

    /// Empty the FIFO and raise the TX-empty interrupt if it is enabled.
    pub fn drain(&mut self) {
        self.queued = 0;
        self.raised = self.tx_enabled;
    }
}

impl UartHal for FakeUart {
    type Error = &'static str;

    fn configure(&mut self, settings: &UartSettings) -> Result<(), Self::Error> {
        if self.fail_configure {
            return Err("driver install failed");
        }
        self.settings = Some(*settings);
        Ok(())
    }

    fn fifo_capacity(&self) -> usize {
        self.capacity
    }

    fn fifo_len(&self) -> usize {
        self.queued
    }

    fn write_fifo(&mut self, byte: u8) {
        assert!(self.queued < self.capacity, "FIFO overflow");
        self.queued += 1;
        self.wire.push(byte);
    }

    fn set_tx_interrupt(&mut self, enabled: bool) {
        self.tx_enabled = enabled;
        if !enabled {
            self.raised = false;
        }
    }

    fn tx_interrupt_pending(&self) -> bool {
        self.raised
    }

    fn clear_interrupts(&mut self) {
        self.raised = false;
    }

    fn send_break(&mut self, break_us: u32, mab_us: u32) {
        self.breaks.push((break_us, mab_us, self.wire.len()));
    }
}

/// Drive interrupts until the frame completes. Returns the interrupts taken.
pub fn run_uart_frame<S: FrameSource>(
    transport: &mut UartTransport<FakeUart>,
    source: &mut S,
    data: &[u8],
) -> usize {
    for calls in 1..10_000 {
        transport.hal_mut().drain();
        if transport.on_interrupt(source, data) == IsrOutcome::FrameComplete {
            return calls;
        }
        if !transport.is_busy() {
            return calls;
        }
    }
    panic!("UART frame never completed");
}

/// RMT channel with 64 items of memory.
#[derive(Debug)]
pub struct FakeRmt {
    pub memory: Vec<RmtItem>,
    pub configured: Option<(u8, bool)>,
    pub fail_configure: bool,
    pub threshold: usize,
    pub interrupts_enabled: bool,
    pub tx_started: usize,
}

impl FakeRmt {
    pub fn new() -> Self {
        Self {
            memory: vec![RmtItem::END; 64],
            configured: None,
            fail_configure: false,
            threshold: 0,
            interrupts_enabled: false,
            tx_started: 0,
        }
    }
}

impl Default for FakeRmt {
    fn default() -> Self {
        Self::new()
    }
}

impl RmtHal for FakeRmt {
    type Error = &'static str;

    fn configure(&mut self, clock_divider: u8, idle_high: bool) -> Result<(), Self::Error> {
        if self.fail_configure {
            return Err("channel busy");
        }
        self.configured = Some((clock_divider, idle_high));
        Ok(())
    }

    fn memory_len(&self) -> usize {
        self.memory.len()
    }

    fn write_memory(&mut self, offset: usize, item: RmtItem) {
        self.memory[offset] = item;
    }

    fn set_threshold(&mut self, items: usize) {
        self.threshold = items;
    }

    fn set_interrupts(&mut self, enabled: bool) {
        self.interrupts_enabled = enabled;
    }

    fn clear_interrupts(&mut self, _flags: RmtInterrupts) {}

    fn start_tx(&mut self) {
        self.tx_started += 1;
    }
}

/// Play channel memory the way the hardware does: wrap around, raise the
/// threshold interrupt at every half boundary and stop at an end item.
///
/// `between_halves` runs before each threshold interrupt, to model a task
/// that may or may not keep up.
pub fn play_rmt_frame<S: FrameSource, const RING: usize>(
    transport: &mut RmtTransport<FakeRmt, RING>,
    source: &mut S,
    data: &[u8],
    mut between_halves: impl FnMut(&mut RmtTransport<FakeRmt, RING>, &mut S),
) -> Vec<RmtItem> {
    let len = transport.hal().memory.len();
    let half = len / 2;
    let mut wire = Vec::new();
    let mut position = 0;
    for _ in 0..1_000_000 {
        let item = transport.hal().memory[position];
        if item.is_end() {
            let flags = RmtInterrupts {
                threshold: false,
                tx_end: true,
            };
            assert_eq!(transport.on_interrupt(flags, source, data), IsrOutcome::FrameComplete);
            return wire;
        }
        wire.push(item);
        position = (position + 1) % len;
        if position % half == 0 {
            between_halves(transport, source);
            let flags = RmtInterrupts {
                threshold: true,
                tx_end: false,
            };
            transport.on_interrupt(flags, source, data);
        }
    }
    panic!("RMT frame never terminated");
}

/// SPI bus that records every write.
#[derive(Debug, Default)]
pub struct FakeSpi {
    pub written: Vec<u8>,
    pub chunks: Vec<usize>,
    pub flushes: usize,
    pub fail: bool,
}

impl ErrorType for FakeSpi {
    type Error = ErrorKind;
}

impl SpiBus<u8> for FakeSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::Other);
        }
        self.written.extend_from_slice(words);
        self.chunks.push(words.len());
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        read.fill(0);
        self.write(write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let copy = words.to_vec();
        self.write(&copy)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

pub struct FakeBoard;

impl Board for FakeBoard {
    type Uart = FakeUart;
    type Rmt = FakeRmt;
    type Spi = FakeSpi;
}

/// Source replaying fixed values.
pub struct ListSource {
    pub values: Vec<u32>,
    pub width: u8,
    pub position: usize,
    pub active: bool,
    pub aborted: usize,
}

impl ListSource {
    pub fn new(values: &[u32], width: u8) -> Self {
        Self {
            values: values.to_vec(),
            width,
            position: 0,
            active: false,
            aborted: 0,
        }
    }
}

impl FrameSource for ListSource {
    fn start_new_frame(&mut self) {
        if self.active {
            return;
        }
        self.position = 0;
        self.active = !self.values.is_empty();
    }

    fn more_data_to_send(&self) -> bool {
        self.active
    }

    fn next_intensity(&mut self, _data: &[u8]) -> Option<u32> {
        if !self.active {
            return None;
        }
        let value = self.values[self.position];
        self.position += 1;
        if self.position >= self.values.len() {
            self.active = false;
        }
        Some(value)
    }

    fn abort_frame(&mut self) {
        self.active = false;
        self.aborted += 1;
    }

    fn intensity_width(&self) -> u8 {
        self.width
    }
}

/// Render a whole frame straight from a source.
pub fn collect_frame<S: FrameSource>(source: &mut S, data: &[u8]) -> Vec<u32> {
    source.start_new_frame();
    let mut values = Vec::new();
    while source.more_data_to_send() {
        match source.next_intensity(data) {
            Some(value) => values.push(value),
            None => break,
        }
    }
    values
}
