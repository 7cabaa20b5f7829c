//! ESP32 RMT transport.
//!
//! Intensity values are expanded into waveform items in a software ring, and
//! the ring is copied into the channel memory half by half from the threshold
//! interrupt. While one half is on the wire the other is refilled.

use heapless::Deque;
use serde::Serialize;

use crate::error::InitError;
use crate::hal::{RmtHal, RmtInterrupts, RmtItem, RmtSymbol};
use crate::source::FrameSource;
use crate::timing::{BitDirection, RMT_DEFAULT_CLOCK_DIVIDER, TimingProfile, serial_line};
use crate::transport::IsrOutcome;

/// Default software ring capacity in items.
pub const RMT_DEFAULT_RING_ITEMS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RmtTransportConfig {
    pub clock_divider: u8,
    pub idle_high: bool,
    /// Waveform for each [`RmtSymbol`].
    pub table: [RmtItem; RmtSymbol::COUNT],
    /// Gap items sent before the frame.
    pub idle_bits: u8,
    /// Start items sent before the first value.
    pub start_bits: u8,
    /// Stop items sent after the last value.
    pub stop_bits: u8,
    pub direction: BitDirection,
    /// Data bits carried by one item, 1 or 2.
    pub bits_per_symbol: u8,
    /// Start item in front of every value.
    pub start_per_intensity: bool,
    /// Stop items after every value.
    pub stop_per_intensity: u8,
    /// Single end-of-frame item after the last value.
    pub end_of_frame: bool,
    /// Expand values inside the interrupt handler. When false a lower
    /// priority task keeps the ring filled through [`RmtTransport::encode`].
    pub encode_in_isr: bool,
}

impl RmtTransportConfig {
    /// Pixel style framing for `profile`.
    pub fn from_profile(profile: &TimingProfile) -> Self {
        Self {
            clock_divider: RMT_DEFAULT_CLOCK_DIVIDER,
            idle_high: profile.idle_high,
            table: profile.rmt_table(RMT_DEFAULT_CLOCK_DIVIDER),
            idle_bits: profile.idle_bits,
            start_bits: profile.start_bits,
            stop_bits: profile.stop_bits,
            direction: profile.direction,
            bits_per_symbol: 1,
            start_per_intensity: false,
            stop_per_intensity: 0,
            end_of_frame: false,
            encode_in_isr: true,
        }
    }

    /// Asynchronous serial line, one start bit and `stop_bits` per byte.
    pub fn serial(baudrate: u32, stop_bits: u8) -> Self {
        let profile = serial_line(baudrate, stop_bits);
        Self {
            idle_bits: 0,
            start_bits: 0,
            stop_bits: 0,
            start_per_intensity: true,
            stop_per_intensity: stop_bits,
            ..Self::from_profile(&profile)
        }
    }

    /// Close every frame with one [`RmtSymbol::EndOfFrame`] item.
    #[must_use]
    pub const fn with_end_of_frame(mut self) -> Self {
        self.end_of_frame = true;
        self
    }

    /// Leave value expansion to [`RmtTransport::encode`].
    #[must_use]
    pub const fn with_task_encoding(mut self) -> Self {
        self.encode_in_isr = false;
        self
    }

    /// Waveform for `symbol`.
    pub const fn item(&self, symbol: RmtSymbol) -> RmtItem {
        self.table[symbol as usize]
    }

    /// Ring items one value of `width` bits expands to.
    pub const fn items_per_intensity(&self, width: u8) -> usize {
        let bits = if self.bits_per_symbol == 2 { 2 } else { 1 };
        (width as usize).div_ceil(bits) + self.start_per_intensity as usize + self.stop_per_intensity as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RmtCounters {
    pub frames_started: u32,
    pub frames_ended: u32,
    pub incomplete_frames: u32,
    pub isr_calls: u32,
    pub isr_not_for_us: u32,
    /// Hardware drained the ring before the frame was encoded.
    pub ring_overruns: u32,
    pub intensity_values_sent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EncodeStage {
    #[default]
    Idle,
    Lead,
    Data,
    Trail,
    Terminated,
}

/// Half of the channel memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryHalf {
    Lower,
    Upper,
}

impl MemoryHalf {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Lower => Self::Upper,
            Self::Upper => Self::Lower,
        }
    }
}

/// RMT transport for one port.
pub struct RmtTransport<R: RmtHal, const RING: usize = RMT_DEFAULT_RING_ITEMS> {
    hal: R,
    config: RmtTransportConfig,
    ring: Deque<RmtItem, RING>,
    stage: EncodeStage,
    /// Half being transmitted, the other one is refilled next.
    on_air: MemoryHalf,
    /// An end item has been written to channel memory.
    end_written: bool,
    counters: RmtCounters,
    initialized: bool,
    frame_active: bool,
    paused: bool,
}

impl<R: RmtHal, const RING: usize> RmtTransport<R, RING> {
    pub fn new(hal: R, config: RmtTransportConfig) -> Self {
        Self {
            hal,
            config,
            ring: Deque::new(),
            stage: EncodeStage::Idle,
            on_air: MemoryHalf::Lower,
            end_written: false,
            counters: RmtCounters::default(),
            initialized: false,
            frame_active: false,
            paused: false,
        }
    }

    /// Configure the channel clock and interrupt threshold.
    pub fn begin(&mut self, config: RmtTransportConfig) -> Result<(), InitError> {
        self.hal.set_interrupts(false);
        self.config = config;
        self.frame_active = false;
        self.initialized = false;

        self.hal
            .configure(config.clock_divider, config.idle_high)
            .map_err(|err| {
                log::error!("RMT configure failed: {:?}", err);
                InitError::Rmt
            })?;
        self.hal.set_threshold(self.half_len());

        self.initialized = true;
        log::debug!("RMT ready: divider {}, ring {} items", config.clock_divider, RING);
        Ok(())
    }

    /// Framing the channel was last brought up with.
    pub const fn config(&self) -> &RmtTransportConfig {
        &self.config
    }

    /// Diagnostic counters since construction.
    pub const fn counters(&self) -> &RmtCounters {
        &self.counters
    }

    /// A frame is on the wire and its end item has not played yet.
    pub const fn is_busy(&self) -> bool {
        self.frame_active
    }

    /// `begin` succeeded and `end` has not been called since.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Underlying channel.
    pub const fn hal(&self) -> &R {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut R {
        &mut self.hal
    }

    /// Items waiting in the software ring.
    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }

    /// Hold back new frames. A frame already on the wire runs to its end item.
    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether new frames are being held back.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop output and mark the transport unconfigured.
    pub fn end(&mut self) {
        self.hal.set_interrupts(false);
        self.ring.clear();
        self.stage = EncodeStage::Idle;
        self.frame_active = false;
        self.initialized = false;
    }

    /// Mask the channel interrupts and give the channel back.
    pub fn release(mut self) -> R {
        self.hal.set_interrupts(false);
        self.hal
    }

    /// Encode the start of a frame, preload channel memory and start output.
    pub fn start_new_frame<S: FrameSource>(&mut self, source: &mut S, data: &[u8]) {
        if !self.initialized || self.paused {
            return;
        }
        if self.frame_active {
            self.counters.incomplete_frames = self.counters.incomplete_frames.wrapping_add(1);
            return;
        }

        self.ring.clear();
        self.end_written = false;
        self.stage = EncodeStage::Lead;
        source.start_new_frame();
        self.frame_active = true;
        self.counters.frames_started = self.counters.frames_started.wrapping_add(1);

        self.encode(source, data);
        self.load_half(MemoryHalf::Lower, source, data, true);
        self.load_half(MemoryHalf::Upper, source, data, true);
        self.on_air = MemoryHalf::Lower;

        self.hal.set_interrupts(true);
        self.hal.start_tx();
    }

    /// Expand values from `source` into the ring until it is full or the
    /// frame is terminated. Safe to call from a lower priority task.
    pub fn encode<S: FrameSource>(&mut self, source: &mut S, data: &[u8]) {
        loop {
            let free = RING - self.ring.len();
            match self.stage {
                EncodeStage::Idle | EncodeStage::Terminated => return,
                EncodeStage::Lead => {
                    let needed = usize::from(self.config.idle_bits) + usize::from(self.config.start_bits);
                    if free < needed.min(RING) {
                        return;
                    }
                    self.push_repeated(RmtSymbol::InterFrameGap, self.config.idle_bits);
                    self.push_repeated(RmtSymbol::StartBit, self.config.start_bits);
                    self.stage = EncodeStage::Data;
                }
                EncodeStage::Data => {
                    let width = source.intensity_width();
                    if free < self.config.items_per_intensity(width).min(RING) {
                        return;
                    }
                    match source.next_intensity(data) {
                        Some(value) => self.push_intensity(value, width),
                        None => self.stage = EncodeStage::Trail,
                    }
                    if !source.more_data_to_send() {
                        self.stage = EncodeStage::Trail;
                    }
                }
                EncodeStage::Trail => {
                    let needed = usize::from(self.config.end_of_frame) + usize::from(self.config.stop_bits) + 1;
                    if free < needed.min(RING) {
                        return;
                    }
                    if self.config.end_of_frame {
                        self.push(self.config.item(RmtSymbol::EndOfFrame));
                    }
                    self.push_repeated(RmtSymbol::StopBit, self.config.stop_bits);
                    self.push(RmtItem::END);
                    self.stage = EncodeStage::Terminated;
                }
            }
        }
    }

    /// Channel interrupt handler.
    pub fn on_interrupt<S: FrameSource>(&mut self, flags: RmtInterrupts, source: &mut S, data: &[u8]) -> IsrOutcome {
        if !flags.threshold && !flags.tx_end {
            self.counters.isr_not_for_us = self.counters.isr_not_for_us.wrapping_add(1);
            return IsrOutcome::NotForUs;
        }
        self.counters.isr_calls = self.counters.isr_calls.wrapping_add(1);

        let mut outcome = IsrOutcome::InProgress;
        if flags.threshold && self.frame_active && !self.end_written {
            // The half that just finished transmitting is free again.
            let drained = self.on_air;
            self.on_air = drained.other();
            self.load_half(drained, source, data, self.config.encode_in_isr);
        }
        if flags.tx_end && self.frame_active {
            self.hal.set_interrupts(false);
            // The hardware stopped, whatever the source has left is dropped.
            if source.more_data_to_send() {
                source.abort_frame();
            }
            self.stage = EncodeStage::Idle;
            self.ring.clear();
            self.frame_active = false;
            self.counters.frames_ended = self.counters.frames_ended.wrapping_add(1);
            outcome = IsrOutcome::FrameComplete;
        }

        self.hal.clear_interrupts(flags);
        outcome
    }

    fn half_len(&self) -> usize {
        self.hal.memory_len() / 2
    }

    /// Copy the next half buffer of items from the ring into channel memory,
    /// expanding more values on demand when `encode` is set.
    fn load_half<S: FrameSource>(&mut self, half: MemoryHalf, source: &mut S, data: &[u8], encode: bool) {
        if self.end_written {
            return;
        }
        let half_len = self.half_len();
        let base = match half {
            MemoryHalf::Lower => 0,
            MemoryHalf::Upper => half_len,
        };

        for offset in base..base + half_len {
            if self.ring.is_empty() && encode {
                self.encode(source, data);
            }
            let item = match self.ring.pop_front() {
                Some(item) => item,
                None => {
                    // Ring starved mid frame: cut the frame short, the next
                    // one starts clean.
                    self.counters.ring_overruns = self.counters.ring_overruns.wrapping_add(1);
                    self.stage = EncodeStage::Terminated;
                    source.abort_frame();
                    RmtItem::END
                }
            };
            self.hal.write_memory(offset, item);
            if item.is_end() {
                self.end_written = true;
                return;
            }
        }
    }

    fn push_intensity(&mut self, value: u32, width: u8) {
        if self.config.start_per_intensity {
            self.push(self.config.item(RmtSymbol::StartBit));
        }

        let bits = if self.config.bits_per_symbol == 2 { 2 } else { 1 };
        let mask = (1u32 << bits) - 1;
        let symbols = u32::from(width).div_ceil(bits);
        for index in 0..symbols {
            let shift = match self.config.direction {
                BitDirection::MsbFirst => (symbols - 1 - index) * bits,
                BitDirection::LsbFirst => index * bits,
            };
            let symbol = RmtSymbol::data((value >> shift) & mask);
            self.push(self.config.item(symbol));
        }

        self.push_repeated(RmtSymbol::StopBit, self.config.stop_per_intensity);
        self.counters.intensity_values_sent = self.counters.intensity_values_sent.wrapping_add(1);
    }

    fn push_repeated(&mut self, symbol: RmtSymbol, count: u8) {
        let item = self.config.item(symbol);
        for _ in 0..count {
            self.push(item);
        }
    }

    fn push(&mut self, item: RmtItem) {
        if self.ring.push_back(item).is_err() {
            self.counters.ring_overruns = self.counters.ring_overruns.wrapping_add(1);
        }
    }
}
