//! Slot based serial framing: DMX512, Renard and generic serial.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::error::ConfigOutcome;
use crate::source::{FrameSource, read_window, write_window};

pub const SERIAL_MIN_BAUDRATE: u32 = 38_400;
pub const SERIAL_MAX_BAUDRATE: u32 = 460_800;
pub const SERIAL_DEFAULT_BAUDRATE: u32 = 57_600;
pub const SERIAL_MAX_CHANNELS: u16 = 1024;
pub const SERIAL_DEFAULT_CHANNELS: u16 = 64;
/// Longest generic serial header or footer.
pub const SERIAL_MAX_BLOCK: usize = 10;

pub const DMX_BAUDRATE: u32 = 250_000;
pub const DMX_SLOTS: u16 = 512;
pub const DMX_START_CODE: u8 = 0x00;
pub const DMX_BREAK_US: u32 = 92;
pub const DMX_MAB_US: u32 = 12;

pub const RENARD_FRAME_START: u8 = 0x7E;
pub const RENARD_DATA_START: u8 = 0x80;
pub const RENARD_ESCAPE: u8 = 0x7F;
const RENARD_ESCAPE_OFFSET: u8 = 0x4E;

/// Shortest interval between serial frames.
pub const SERIAL_MIN_FRAME_US: u32 = 25_000;
/// Line bits per byte used for frame timing (start, 8 data, 2 stop).
const BITS_PER_SLOT: u64 = 11;

/// Renard byte stuffing. Values `0x7D..=0x7F` collide with the sync bytes
/// and go out as `0x7F, value - 0x4E`.
pub const fn renard_escape(value: u8) -> (u8, Option<u8>) {
    match value {
        0x7D..=0x7F => (RENARD_ESCAPE, Some(value - RENARD_ESCAPE_OFFSET)),
        _ => (value, None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialProtocol {
    Dmx,
    Renard,
    Generic,
}

impl SerialProtocol {
    pub const fn max_channels(self) -> u16 {
        match self {
            Self::Dmx => DMX_SLOTS,
            Self::Renard | Self::Generic => SERIAL_MAX_CHANNELS,
        }
    }
}

/// User facing serial port settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    #[serde(rename = "num_chan")]
    pub num_channels: u16,
    pub baudrate: u32,
    #[serde(rename = "gen_ser_hdr")]
    pub header: String<SERIAL_MAX_BLOCK>,
    #[serde(rename = "gen_ser_ftr")]
    pub footer: String<SERIAL_MAX_BLOCK>,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            num_channels: SERIAL_DEFAULT_CHANNELS,
            baudrate: SERIAL_DEFAULT_BAUDRATE,
            header: String::new(),
            footer: String::new(),
        }
    }
}

impl SerialSettings {
    /// Clamp the settings for `protocol` and the channels the port owns.
    #[must_use]
    pub fn validated(&self, protocol: SerialProtocol, available_channels: usize) -> (Self, ConfigOutcome) {
        let mut fixed = self.clone();

        let by_buffer = u16::try_from(available_channels).unwrap_or(u16::MAX);
        let max_channels = protocol.max_channels().min(by_buffer);
        fixed.num_channels = fixed.num_channels.clamp(1.min(max_channels), max_channels);

        fixed.baudrate = match protocol {
            SerialProtocol::Dmx => DMX_BAUDRATE,
            SerialProtocol::Renard | SerialProtocol::Generic => {
                fixed.baudrate.clamp(SERIAL_MIN_BAUDRATE, SERIAL_MAX_BAUDRATE)
            }
        };

        let outcome = ConfigOutcome::from_corrected(fixed != *self);
        if outcome.is_corrected() {
            log::warn!(
                "serial settings corrected: channels {} -> {}, baud {} -> {}",
                self.num_channels,
                fixed.num_channels,
                self.baudrate,
                fixed.baudrate
            );
        }
        (fixed, outcome)
    }
}

/// Stage of the serial frame being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerialState {
    #[default]
    Idle,
    RenardFrameStart,
    RenardDataStart,
    RenardSendData,
    /// Second half of an escaped Renard value.
    RenardSendEscaped(u8),
    DmxStartCode,
    DmxSendData,
    GenericHeader,
    GenericData,
    GenericFooter,
    Done,
}

impl SerialState {
    pub const fn in_progress(self) -> bool {
        !matches!(self, Self::Idle | Self::Done)
    }
}

/// Per-port serial framing state machine.
#[derive(Debug, Clone)]
pub struct SerialRenderer {
    protocol: SerialProtocol,
    settings: SerialSettings,
    header: Vec<u8, SERIAL_MAX_BLOCK>,
    footer: Vec<u8, SERIAL_MAX_BLOCK>,
    staged: Option<SerialSettings>,
    state: SerialState,
    index: usize,
}

impl SerialRenderer {
    pub fn new(protocol: SerialProtocol) -> Self {
        let mut settings = SerialSettings::default();
        if protocol == SerialProtocol::Dmx {
            settings.baudrate = DMX_BAUDRATE;
        }
        let mut renderer = Self {
            protocol,
            settings: SerialSettings::default(),
            header: Vec::new(),
            footer: Vec::new(),
            staged: None,
            state: SerialState::Idle,
            index: 0,
        };
        renderer.apply(settings);
        renderer
    }

    pub const fn protocol(&self) -> SerialProtocol {
        self.protocol
    }

    /// Validate and apply settings, staged while a frame is in flight.
    pub fn configure(&mut self, settings: &SerialSettings, available_channels: usize) -> ConfigOutcome {
        let (fixed, outcome) = settings.validated(self.protocol, available_channels);
        if self.state.in_progress() {
            self.staged = Some(fixed);
        } else {
            self.apply(fixed);
        }
        outcome
    }

    /// Most recently accepted settings.
    pub fn settings(&self) -> &SerialSettings {
        self.staged.as_ref().unwrap_or(&self.settings)
    }

    pub const fn state(&self) -> SerialState {
        self.state
    }

    pub fn num_buffer_bytes_needed(&self) -> usize {
        usize::from(self.settings().num_channels)
    }

    pub fn write_channel_data(&self, buffer: &mut [u8], start: usize, data: &[u8]) -> usize {
        write_window(buffer, self.num_buffer_bytes_needed(), start, data)
    }

    pub fn read_channel_data(&self, buffer: &[u8], start: usize, out: &mut [u8]) -> usize {
        read_window(buffer, self.num_buffer_bytes_needed(), start, out)
    }

    /// Break plus mark-after-break, zero for protocols without one.
    pub const fn break_us(&self) -> u32 {
        match self.protocol {
            SerialProtocol::Dmx => DMX_BREAK_US + DMX_MAB_US,
            SerialProtocol::Renard | SerialProtocol::Generic => 0,
        }
    }

    /// Minimum frame interval at the configured baud rate.
    pub fn frame_min_duration_us(&self) -> u32 {
        let settings = self.settings();
        let slots = match self.protocol {
            SerialProtocol::Dmx => u64::from(DMX_SLOTS) + 1,
            SerialProtocol::Renard => u64::from(settings.num_channels) + 2,
            SerialProtocol::Generic => {
                u64::from(settings.num_channels) + settings.header.len() as u64 + settings.footer.len() as u64
            }
        };
        let baudrate = u64::from(settings.baudrate.max(1));
        let line_us = (BITS_PER_SLOT * slots * 1_000_000).div_ceil(baudrate) + u64::from(self.break_us());
        u32::try_from(line_us).unwrap_or(u32::MAX).max(SERIAL_MIN_FRAME_US)
    }

    fn apply(&mut self, settings: SerialSettings) {
        self.header = Vec::from_slice(settings.header.as_bytes()).unwrap_or_default();
        self.footer = Vec::from_slice(settings.footer.as_bytes()).unwrap_or_default();
        self.settings = settings;
    }

    fn channel(&self, data: &[u8], index: usize) -> u8 {
        if index < usize::from(self.settings.num_channels) {
            data.get(index).copied().unwrap_or(0)
        } else {
            0
        }
    }

    fn generic_after_data(&self) -> SerialState {
        if self.footer.is_empty() {
            SerialState::Done
        } else {
            SerialState::GenericFooter
        }
    }

    fn generic_after_header(&self) -> SerialState {
        if self.settings.num_channels > 0 {
            SerialState::GenericData
        } else {
            self.generic_after_data()
        }
    }
}

impl FrameSource for SerialRenderer {
    fn start_new_frame(&mut self) {
        if self.state.in_progress() {
            return;
        }
        if let Some(settings) = self.staged.take() {
            self.apply(settings);
        }
        self.index = 0;
        self.state = match self.protocol {
            SerialProtocol::Dmx => SerialState::DmxStartCode,
            SerialProtocol::Renard => SerialState::RenardFrameStart,
            SerialProtocol::Generic if !self.header.is_empty() => SerialState::GenericHeader,
            SerialProtocol::Generic => self.generic_after_header(),
        };
    }

    fn more_data_to_send(&self) -> bool {
        self.state.in_progress()
    }

    fn abort_frame(&mut self) {
        if self.state.in_progress() {
            self.state = SerialState::Done;
        }
    }

    fn next_intensity(&mut self, data: &[u8]) -> Option<u32> {
        let value = match self.state {
            SerialState::Idle | SerialState::Done => return None,
            SerialState::RenardFrameStart => {
                self.state = SerialState::RenardDataStart;
                RENARD_FRAME_START
            }
            SerialState::RenardDataStart => {
                self.state = if self.settings.num_channels > 0 {
                    SerialState::RenardSendData
                } else {
                    SerialState::Done
                };
                RENARD_DATA_START
            }
            SerialState::RenardSendData => {
                let (first, escaped) = renard_escape(self.channel(data, self.index));
                self.index += 1;
                let last = self.index >= usize::from(self.settings.num_channels);
                self.state = match (escaped, last) {
                    (Some(second), _) => SerialState::RenardSendEscaped(second),
                    (None, true) => SerialState::Done,
                    (None, false) => SerialState::RenardSendData,
                };
                first
            }
            SerialState::RenardSendEscaped(second) => {
                self.state = if self.index >= usize::from(self.settings.num_channels) {
                    SerialState::Done
                } else {
                    SerialState::RenardSendData
                };
                second
            }
            SerialState::DmxStartCode => {
                self.state = SerialState::DmxSendData;
                DMX_START_CODE
            }
            SerialState::DmxSendData => {
                let value = self.channel(data, self.index);
                self.index += 1;
                if self.index >= usize::from(DMX_SLOTS) {
                    self.state = SerialState::Done;
                }
                value
            }
            SerialState::GenericHeader => {
                let value = self.header.get(self.index).copied().unwrap_or(0);
                self.index += 1;
                if self.index >= self.header.len() {
                    self.index = 0;
                    self.state = self.generic_after_header();
                }
                value
            }
            SerialState::GenericData => {
                let value = self.channel(data, self.index);
                self.index += 1;
                if self.index >= usize::from(self.settings.num_channels) {
                    self.index = 0;
                    self.state = self.generic_after_data();
                }
                value
            }
            SerialState::GenericFooter => {
                let value = self.footer.get(self.index).copied().unwrap_or(0);
                self.index += 1;
                if self.index >= self.footer.len() {
                    self.state = SerialState::Done;
                }
                value
            }
        };
        Some(u32::from(value))
    }
}
