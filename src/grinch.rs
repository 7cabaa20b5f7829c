//! Grinch relay controllers.
//!
//! A Grinch is a chain of shift registers behind an SPI bus, 64 on/off
//! channels per controller. Outputs are active low and the register furthest
//! down the chain is shifted out first.

use crate::error::ConfigOutcome;
use crate::source::{FrameSource, read_window, write_window};

pub const GRINCH_CHANNELS_PER_CONTROLLER: usize = 64;
pub const GRINCH_MAX_CONTROLLERS: u8 = 4;
pub const GRINCH_DEFAULT_CONTROLLERS: u8 = 1;

/// Channel values at or above this switch the output on.
pub const GRINCH_ON_THRESHOLD: u8 = 128;

const CHANNELS_PER_BYTE: usize = 8;

/// Clamp the controller count to what the port supports and its buffer holds.
pub fn validated_controllers(count: u8, available_channels: usize) -> (u8, ConfigOutcome) {
    let by_buffer = u8::try_from(available_channels / GRINCH_CHANNELS_PER_CONTROLLER).unwrap_or(u8::MAX);
    let fixed = count.clamp(1, GRINCH_MAX_CONTROLLERS).min(by_buffer);
    if fixed != count {
        log::warn!("grinch controller count {} clamped to {}", count, fixed);
    }
    (fixed, ConfigOutcome::from_corrected(fixed != count))
}

/// Register byte for eight channels, first channel in the high bit.
/// A set bit turns the output off.
pub fn pack_channels(data: &[u8], first: usize) -> u8 {
    (first..first + CHANNELS_PER_BYTE).fold(0, |acc, index| {
        let value = data.get(index).copied().unwrap_or(0);
        (acc << 1) | u8::from(value < GRINCH_ON_THRESHOLD)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrinchState {
    #[default]
    Idle,
    Sending,
    Done,
}

impl GrinchState {
    pub const fn in_progress(self) -> bool {
        matches!(self, Self::Sending)
    }
}

/// Per-port Grinch framing.
#[derive(Debug, Clone)]
pub struct GrinchRenderer {
    controllers: u8,
    staged: Option<u8>,
    state: GrinchState,
    /// Register bytes still to shift out, counting down.
    remaining: usize,
}

impl Default for GrinchRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl GrinchRenderer {
    pub const fn new() -> Self {
        Self {
            controllers: GRINCH_DEFAULT_CONTROLLERS,
            staged: None,
            state: GrinchState::Idle,
            remaining: 0,
        }
    }

    /// Set the controller count, staged while a frame is in flight.
    pub fn configure(&mut self, controllers: u8, available_channels: usize) -> ConfigOutcome {
        let (fixed, outcome) = validated_controllers(controllers, available_channels);
        if self.state.in_progress() {
            self.staged = Some(fixed);
        } else {
            self.controllers = fixed;
        }
        outcome
    }

    /// Most recently accepted controller count.
    pub fn controllers(&self) -> u8 {
        self.staged.unwrap_or(self.controllers)
    }

    pub const fn state(&self) -> GrinchState {
        self.state
    }

    pub fn num_buffer_bytes_needed(&self) -> usize {
        usize::from(self.controllers()) * GRINCH_CHANNELS_PER_CONTROLLER
    }

    /// Register bytes per frame.
    pub fn frame_intensity_count(&self) -> u32 {
        u32::from(self.controllers()) * 8
    }

    pub fn write_channel_data(&self, buffer: &mut [u8], start: usize, data: &[u8]) -> usize {
        write_window(buffer, self.num_buffer_bytes_needed(), start, data)
    }

    pub fn read_channel_data(&self, buffer: &[u8], start: usize, out: &mut [u8]) -> usize {
        read_window(buffer, self.num_buffer_bytes_needed(), start, out)
    }
}

impl FrameSource for GrinchRenderer {
    fn start_new_frame(&mut self) {
        if self.state.in_progress() {
            return;
        }
        if let Some(controllers) = self.staged.take() {
            self.controllers = controllers;
        }
        self.remaining = usize::from(self.controllers) * GRINCH_CHANNELS_PER_CONTROLLER / CHANNELS_PER_BYTE;
        self.state = if self.remaining == 0 {
            GrinchState::Done
        } else {
            GrinchState::Sending
        };
    }

    fn more_data_to_send(&self) -> bool {
        self.state.in_progress()
    }

    fn next_intensity(&mut self, data: &[u8]) -> Option<u32> {
        if !self.state.in_progress() {
            return None;
        }
        self.remaining -= 1;
        let value = pack_channels(data, self.remaining * CHANNELS_PER_BYTE);
        if self.remaining == 0 {
            self.state = GrinchState::Done;
        }
        Some(u32::from(value))
    }

    fn abort_frame(&mut self) {
        if self.state.in_progress() {
            self.state = GrinchState::Done;
        }
    }
}
