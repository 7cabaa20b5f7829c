//! UART used as a bit serializer.
//!
//! Each wire symbol is replaced by one UART character whose start bit, data
//! bits and stop bits together draw the pulse the chip expects. The TX FIFO is
//! refilled from the TX-empty interrupt.

use serde::Serialize;

use crate::error::InitError;
use crate::hal::{UartDataSize, UartHal, UartSettings};
use crate::serial::SERIAL_DEFAULT_BAUDRATE;
use crate::source::FrameSource;
use crate::transport::IsrOutcome;

/// Default TX-empty watermark.
pub const UART_DEFAULT_FIFO_TRIGGER_LEVEL: u8 = 16;

/// How intensity values map onto UART characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Translation {
    /// Values are sent as plain bytes.
    #[default]
    None,
    /// Every data bit becomes one character, `table[bit]`.
    OneToOne,
    /// Every pair of data bits becomes one character, `table[pair]`.
    TwoToOne,
}

/// Break and mark-after-break sent ahead of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakTiming {
    pub break_us: u32,
    pub mab_us: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartTransportConfig {
    pub baudrate: u32,
    pub data_size: UartDataSize,
    pub invert_tx: bool,
    pub translation: Translation,
    /// Symbol to character table, MSB symbol first on the wire.
    pub table: [u8; 4],
    /// Characters written per symbol, to stretch pulses at a fixed baud rate.
    pub chars_per_symbol: u8,
    pub break_timing: Option<BreakTiming>,
    /// Issue the break before every value instead of once per frame.
    pub break_per_intensity: bool,
    pub fifo_trigger_level: u8,
}

impl UartTransportConfig {
    /// Plain byte stream, no translation.
    pub const fn passthrough(baudrate: u32, data_size: UartDataSize) -> Self {
        Self {
            baudrate,
            data_size,
            invert_tx: false,
            translation: Translation::None,
            table: [0; 4],
            chars_per_symbol: 1,
            break_timing: None,
            break_per_intensity: false,
            fifo_trigger_level: UART_DEFAULT_FIFO_TRIGGER_LEVEL,
        }
    }

    /// Bit serializer using `table` for each symbol.
    pub const fn translated(baudrate: u32, data_size: UartDataSize, translation: Translation, table: [u8; 4]) -> Self {
        Self {
            translation,
            table,
            ..Self::passthrough(baudrate, data_size)
        }
    }

    #[must_use]
    pub const fn inverted(mut self) -> Self {
        self.invert_tx = true;
        self
    }

    #[must_use]
    pub const fn with_break(mut self, break_us: u32, mab_us: u32) -> Self {
        self.break_timing = Some(BreakTiming { break_us, mab_us });
        self
    }

    /// Framing where every value is its own packet with a leading break.
    #[must_use]
    pub const fn with_break_per_intensity(mut self, break_us: u32, mab_us: u32) -> Self {
        self.break_timing = Some(BreakTiming { break_us, mab_us });
        self.break_per_intensity = true;
        self
    }

    #[must_use]
    pub const fn with_chars_per_symbol(mut self, count: u8) -> Self {
        self.chars_per_symbol = if count == 0 { 1 } else { count };
        self
    }

    /// FIFO characters one intensity value of `width` bits occupies.
    pub const fn chars_per_intensity(&self, width: u8) -> usize {
        let symbols = match self.translation {
            Translation::None => 1,
            Translation::OneToOne => width as usize,
            Translation::TwoToOne => (width as usize).div_ceil(2),
        };
        symbols * self.chars_per_symbol as usize
    }

    const fn settings(&self) -> UartSettings {
        UartSettings {
            baudrate: self.baudrate,
            data_size: self.data_size,
            invert_tx: self.invert_tx,
            fifo_trigger_level: self.fifo_trigger_level,
        }
    }
}

impl Default for UartTransportConfig {
    fn default() -> Self {
        Self::passthrough(SERIAL_DEFAULT_BAUDRATE, UartDataSize::Data8N1)
    }
}

/// Debug counters, never used for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UartCounters {
    pub frames_started: u32,
    pub frames_ended: u32,
    pub incomplete_frames: u32,
    pub isr_calls: u32,
    pub isr_not_for_us: u32,
    pub intensity_values_sent: u32,
    pub intensity_values_last_frame: u32,
}

/// UART bit-serializer transport for one port.
pub struct UartTransport<U: UartHal> {
    hal: U,
    config: UartTransportConfig,
    counters: UartCounters,
    values_this_frame: u32,
    initialized: bool,
    frame_active: bool,
    paused: bool,
}

impl<U: UartHal> UartTransport<U> {
    pub fn new(hal: U, config: UartTransportConfig) -> Self {
        Self {
            hal,
            config,
            counters: UartCounters::default(),
            values_this_frame: 0,
            initialized: false,
            frame_active: false,
            paused: false,
        }
    }

    /// Configure the peripheral. On failure the transport stays disabled.
    pub fn begin(&mut self, config: UartTransportConfig) -> Result<(), InitError> {
        self.hal.set_tx_interrupt(false);
        self.config = config;
        self.frame_active = false;
        self.initialized = false;

        self.hal.configure(&config.settings()).map_err(|err| {
            log::error!("UART configure failed: {:?}", err);
            InitError::Uart
        })?;

        self.initialized = true;
        log::debug!(
            "UART ready: {} baud, {:?}, {:?}",
            config.baudrate,
            config.data_size,
            config.translation
        );
        Ok(())
    }

    /// Settings the UART was last brought up with.
    pub const fn config(&self) -> &UartTransportConfig {
        &self.config
    }

    /// Diagnostic counters since construction.
    pub const fn counters(&self) -> &UartCounters {
        &self.counters
    }

    /// A frame is still being fed to the FIFO.
    pub const fn is_busy(&self) -> bool {
        self.frame_active
    }

    /// `begin` succeeded and `end` has not been called since.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Underlying peripheral.
    pub const fn hal(&self) -> &U {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut U {
        &mut self.hal
    }

    /// Kick off a frame: optional break, source restart, FIFO prefill.
    pub fn start_new_frame<S: FrameSource>(&mut self, source: &mut S, data: &[u8]) {
        if !self.initialized || self.paused {
            return;
        }
        if self.frame_active {
            self.counters.incomplete_frames = self.counters.incomplete_frames.wrapping_add(1);
            return;
        }

        if let (Some(timing), false) = (self.config.break_timing, self.config.break_per_intensity) {
            self.hal.send_break(timing.break_us, timing.mab_us);
        }

        source.start_new_frame();
        self.counters.frames_started = self.counters.frames_started.wrapping_add(1);
        self.values_this_frame = 0;
        self.frame_active = true;

        if self.fill(source, data) {
            self.hal.set_tx_interrupt(true);
        } else {
            self.finish_frame();
        }
    }

    /// TX-empty interrupt handler.
    pub fn on_interrupt<S: FrameSource>(&mut self, source: &mut S, data: &[u8]) -> IsrOutcome {
        if !self.hal.tx_interrupt_pending() {
            self.counters.isr_not_for_us = self.counters.isr_not_for_us.wrapping_add(1);
            return IsrOutcome::NotForUs;
        }
        self.counters.isr_calls = self.counters.isr_calls.wrapping_add(1);

        let outcome = if self.paused || !self.frame_active {
            self.hal.set_tx_interrupt(false);
            IsrOutcome::InProgress
        } else if self.fill(source, data) {
            IsrOutcome::InProgress
        } else {
            self.hal.set_tx_interrupt(false);
            self.finish_frame();
            IsrOutcome::FrameComplete
        };

        self.hal.clear_interrupts();
        outcome
    }

    /// Stop or resume feeding the FIFO. The frame position is kept.
    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
        if paused {
            self.hal.set_tx_interrupt(false);
        } else if self.frame_active {
            self.hal.set_tx_interrupt(true);
        }
    }

    /// Whether [`Self::pause`] is holding output back.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop output and mark the transport unconfigured.
    pub fn end(&mut self) {
        self.hal.set_tx_interrupt(false);
        self.frame_active = false;
        self.initialized = false;
    }

    /// Give the peripheral back.
    pub fn release(mut self) -> U {
        self.hal.set_tx_interrupt(false);
        self.hal
    }

    /// Move as many whole intensity values into the FIFO as fit.
    ///
    /// Returns whether the source still has data.
    fn fill<S: FrameSource>(&mut self, source: &mut S, data: &[u8]) -> bool {
        let width = source.intensity_width();
        let needed = self.config.chars_per_intensity(width);
        let mut free = self.hal.fifo_capacity().saturating_sub(self.hal.fifo_len());

        while free >= needed && source.more_data_to_send() {
            let Some(value) = source.next_intensity(data) else {
                break;
            };
            if let (Some(timing), true) = (self.config.break_timing, self.config.break_per_intensity) {
                self.hal.send_break(timing.break_us, timing.mab_us);
            }
            self.emit(value, width);
            free -= needed;
            self.values_this_frame = self.values_this_frame.wrapping_add(1);
            self.counters.intensity_values_sent = self.counters.intensity_values_sent.wrapping_add(1);
            if self.config.break_per_intensity {
                // The next break has to wait for this packet to drain.
                break;
            }
        }
        source.more_data_to_send()
    }

    fn emit(&mut self, value: u32, width: u8) {
        match self.config.translation {
            Translation::None => {
                let [byte, ..] = value.to_le_bytes();
                self.write_symbol(byte);
            }
            Translation::OneToOne => {
                for bit in (0..u32::from(width)).rev() {
                    let symbol = (value >> bit) & 0b1;
                    self.write_symbol(self.config.table[symbol as usize]);
                }
            }
            Translation::TwoToOne => {
                let mut shift = u32::from(width).div_ceil(2) * 2;
                while shift > 0 {
                    shift -= 2;
                    let symbol = (value >> shift) & 0b11;
                    self.write_symbol(self.config.table[symbol as usize]);
                }
            }
        }
    }

    fn write_symbol(&mut self, byte: u8) {
        for _ in 0..self.config.chars_per_symbol.max(1) {
            self.hal.write_fifo(byte);
        }
    }

    fn finish_frame(&mut self) {
        self.frame_active = false;
        self.counters.frames_ended = self.counters.frames_ended.wrapping_add(1);
        self.counters.intensity_values_last_frame = self.values_this_frame;
    }
}
