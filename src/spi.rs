//! Clocked SPI output for WS2801 and APA102.
//!
//! No interrupt: the whole frame is written from the caller's context in
//! fixed size chunks.

use embedded_hal::spi::SpiBus;
use serde::Serialize;

use crate::source::FrameSource;

/// Bytes handed to the bus per `write` call.
pub const SPI_CHUNK_SIZE: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SpiCounters {
    pub frames_sent: u32,
    pub bus_errors: u32,
    pub bytes_sent: u32,
}

pub struct SpiTransport<S: SpiBus<u8>> {
    bus: S,
    counters: SpiCounters,
    paused: bool,
}

impl<S: SpiBus<u8>> SpiTransport<S> {
    pub const fn new(bus: S) -> Self {
        Self {
            bus,
            counters: SpiCounters {
                frames_sent: 0,
                bus_errors: 0,
                bytes_sent: 0,
            },
            paused: false,
        }
    }

    /// Diagnostic counters since construction.
    pub const fn counters(&self) -> &SpiCounters {
        &self.counters
    }

    /// Underlying bus.
    pub const fn bus(&self) -> &S {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut S {
        &mut self.bus
    }

    /// Skip frames until resumed.
    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether frames are being skipped.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Give the bus back.
    pub fn release(self) -> S {
        self.bus
    }

    /// Render and write one complete frame.
    pub fn start_new_frame<F: FrameSource>(&mut self, source: &mut F, data: &[u8]) {
        if self.paused {
            return;
        }
        source.start_new_frame();

        let mut chunk = [0u8; SPI_CHUNK_SIZE];
        let mut len = 0;
        while source.more_data_to_send() {
            let Some(value) = source.next_intensity(data) else {
                break;
            };
            let [byte, ..] = value.to_le_bytes();
            chunk[len] = byte;
            len += 1;
            if len == SPI_CHUNK_SIZE {
                self.write(&chunk);
                len = 0;
            }
        }
        if len > 0 {
            self.write(&chunk[..len]);
        }

        if let Err(err) = self.bus.flush() {
            self.counters.bus_errors = self.counters.bus_errors.wrapping_add(1);
            log::warn!("SPI flush failed: {:?}", err);
        }
        self.counters.frames_sent = self.counters.frames_sent.wrapping_add(1);
    }

    fn write(&mut self, bytes: &[u8]) {
        match self.bus.write(bytes) {
            Ok(()) => {
                #[allow(clippy::cast_possible_truncation)]
                let count = bytes.len() as u32;
                self.counters.bytes_sent = self.counters.bytes_sent.wrapping_add(count);
            }
            Err(err) => {
                self.counters.bus_errors = self.counters.bus_errors.wrapping_add(1);
                log::warn!("SPI write failed: {:?}", err);
            }
        }
    }
}
