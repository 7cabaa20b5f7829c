//! Protocol drivers.
//!
//! Each submodule is pure configuration: which renderer a protocol uses and
//! how its values are shaped by the UART, RMT or SPI transport. This module
//! binds them to an [`OutputType`].

pub mod dmx;
pub mod gece;
pub mod grinch;
pub mod serial;
pub mod spi;
pub mod tls3001;
pub mod tm1814;
pub mod ucs;
pub mod ws2811;

use crate::config::{OutputType, PortConfig};
use crate::error::ConfigOutcome;
use crate::gece::{GECE_PACKET_TIME_US, GECE_PIXEL_LIMIT};
use crate::rmt::RmtTransportConfig;
use crate::source::SourceSlot;
use crate::timing::{GS8208, TLS3001, TM1814, Target, TimingProfile, UCS1903, UCS8903};
use crate::uart::UartTransportConfig;

/// How long one frame occupies the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTiming {
    /// Bit timing from a profile times the values sent, plus its reset gap.
    Pixel(TimingProfile),
    /// Fixed packet time per bulb.
    Gece,
    /// Computed by the serial renderer from its baud rate.
    Serial,
    /// Clocked output: eight bits per value at `bit_rate`, then `idle_us`.
    Clocked { bit_rate: u32, idle_us: u32 },
}

impl FrameTiming {
    pub fn frame_min_duration_us(&self, source: &SourceSlot) -> u32 {
        match (self, source) {
            (Self::Pixel(profile), SourceSlot::Pixel(pixel)) => {
                profile.frame_min_duration_us(pixel.frame_intensity_count())
            }
            (Self::Gece, SourceSlot::Pixel(pixel)) => {
                GECE_PACKET_TIME_US * u32::from(pixel.geometry().pixel_count.min(GECE_PIXEL_LIMIT))
            }
            (Self::Clocked { bit_rate, idle_us }, SourceSlot::Pixel(_) | SourceSlot::Grinch(_)) => {
                let bits = u64::from(source.frame_intensity_count()) * 8;
                let wire_us = (bits * 1_000_000).div_ceil(u64::from((*bit_rate).max(1)));
                u32::try_from(wire_us).unwrap_or(u32::MAX).saturating_add(*idle_us)
            }
            (_, SourceSlot::Serial(serial)) => serial.frame_min_duration_us(),
            (Self::Serial, SourceSlot::Pixel(_)) | (Self::Pixel(_) | Self::Gece | Self::Serial, SourceSlot::Grinch(_)) => 0,
        }
    }
}

/// Transport settings a protocol can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Links {
    pub uart: Option<UartTransportConfig>,
    pub rmt: Option<RmtTransportConfig>,
    pub spi: bool,
}

/// Fresh, unconfigured renderer for `config.output_type`.
pub fn renderer(config: &PortConfig) -> Option<SourceSlot> {
    let source = match config.output_type {
        OutputType::Disabled => return None,
        OutputType::Ws2811 | OutputType::Ucs1903 | OutputType::Gs8208 => SourceSlot::Pixel(ws2811::renderer()),
        OutputType::Tm1814 => SourceSlot::Pixel(tm1814::renderer(config.current_limit)),
        OutputType::Ucs8903 => SourceSlot::Pixel(ucs::ucs8903_renderer()),
        OutputType::Gece => SourceSlot::Pixel(gece::renderer(config.gece_brightness)),
        OutputType::Tls3001 => SourceSlot::Pixel(tls3001::renderer()),
        OutputType::Dmx => SourceSlot::Serial(dmx::renderer()),
        OutputType::Renard => SourceSlot::Serial(serial::renard_renderer()),
        OutputType::Serial => SourceSlot::Serial(serial::generic_renderer()),
        OutputType::Ws2801 => SourceSlot::Pixel(spi::ws2801_renderer()),
        OutputType::Apa102 => SourceSlot::Pixel(spi::apa102_renderer()),
        OutputType::Grinch => SourceSlot::Grinch(grinch::renderer()),
    };
    Some(source)
}

/// Apply the user settings of `config` to `source`.
///
/// Returns the outcome and the config as actually applied.
pub fn configure(source: &mut SourceSlot, config: &PortConfig, available_channels: usize) -> (PortConfig, ConfigOutcome) {
    let mut applied = config.clone();
    let outcome = match source {
        SourceSlot::Pixel(pixel) => {
            let outcome = match config.output_type {
                OutputType::Tm1814 => {
                    let (limit, limit_outcome) = tm1814::validated_limit(config.current_limit);
                    applied.current_limit = limit;
                    pixel
                        .configure_with_blocks(&config.pixel, tm1814::blocks(limit), available_channels)
                        .merge(limit_outcome)
                }
                _ => pixel.configure(&config.pixel, available_channels),
            };
            if config.output_type == OutputType::Gece {
                pixel.set_gece_brightness(config.gece_brightness);
            }
            applied.pixel = *pixel.geometry();
            outcome
        }
        SourceSlot::Serial(serial) => {
            let outcome = serial.configure(&config.serial, available_channels);
            applied.serial = serial.settings().clone();
            outcome
        }
        SourceSlot::Grinch(grinch) => {
            let outcome = grinch.configure(config.grinch_count, available_channels);
            applied.grinch_count = grinch.controllers();
            outcome
        }
    };
    (applied, outcome)
}

/// Transports `output_type` can use, given its configured renderer.
pub fn links(output_type: OutputType, target: Target, source: &SourceSlot) -> Links {
    let serial_settings = match source {
        SourceSlot::Serial(serial) => Some(serial.settings()),
        SourceSlot::Pixel(_) | SourceSlot::Grinch(_) => None,
    };
    let (uart, rmt) = match output_type {
        OutputType::Disabled | OutputType::Ws2801 | OutputType::Apa102 | OutputType::Grinch => (None, None),
        OutputType::Tls3001 => (None, Some(tls3001::rmt_config())),
        OutputType::Ws2811 => (Some(ws2811::uart_config()), Some(ws2811::rmt_config(target))),
        OutputType::Ucs1903 => (Some(ucs::ucs1903_uart_config()), Some(ucs::ucs1903_rmt_config())),
        OutputType::Gs8208 => (Some(ucs::gs8208_uart_config()), Some(ucs::gs8208_rmt_config())),
        OutputType::Ucs8903 => (Some(ucs::ucs8903_uart_config()), Some(ucs::ucs8903_rmt_config())),
        OutputType::Tm1814 => (Some(tm1814::uart_config()), Some(tm1814::rmt_config())),
        OutputType::Gece => (Some(gece::uart_config()), Some(gece::rmt_config())),
        OutputType::Dmx => (Some(dmx::uart_config()), Some(dmx::rmt_config())),
        OutputType::Renard | OutputType::Serial => match serial_settings {
            Some(settings) => (Some(serial::uart_config(settings)), Some(serial::rmt_config(settings))),
            None => (None, None),
        },
    };
    Links {
        uart,
        rmt,
        spi: output_type.is_spi(),
    }
}

pub const fn frame_timing(output_type: OutputType, target: Target) -> FrameTiming {
    match output_type {
        OutputType::Ws2811 | OutputType::Disabled => FrameTiming::Pixel(ws2811::profile(target)),
        OutputType::Ucs1903 => FrameTiming::Pixel(UCS1903),
        OutputType::Gs8208 => FrameTiming::Pixel(GS8208),
        OutputType::Ucs8903 => FrameTiming::Pixel(UCS8903),
        OutputType::Tm1814 => FrameTiming::Pixel(TM1814),
        OutputType::Gece => FrameTiming::Gece,
        OutputType::Tls3001 => FrameTiming::Pixel(TLS3001),
        OutputType::Dmx | OutputType::Renard | OutputType::Serial => FrameTiming::Serial,
        OutputType::Ws2801 | OutputType::Apa102 | OutputType::Grinch => FrameTiming::Clocked {
            bit_rate: spi::SPI_PIXEL_BIT_RATE,
            idle_us: spi::SPI_PIXEL_IDLE_US,
        },
    }
}
