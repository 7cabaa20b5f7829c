//! Per-port configuration exchanged with the configuration collaborator.

use serde::{Deserialize, Serialize};

use crate::gece::GECE_DEFAULT_BRIGHTNESS;
use crate::geometry::PixelGeometry;
use crate::grinch::GRINCH_DEFAULT_CONTROLLERS;
use crate::protocol::tm1814::TM1814_DEFAULT_CURRENT_LIMIT;
use crate::serial::SerialSettings;

/// Protocol spoken on an output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Disabled,
    Ws2811,
    Tm1814,
    Ucs1903,
    Gs8208,
    Ucs8903,
    Gece,
    Tls3001,
    Dmx,
    Renard,
    Serial,
    Ws2801,
    Apa102,
    Grinch,
}

impl OutputType {
    /// Types rendered by the pixel framing state machine.
    pub const fn is_pixel(self) -> bool {
        matches!(
            self,
            Self::Ws2811
                | Self::Tm1814
                | Self::Ucs1903
                | Self::Gs8208
                | Self::Ucs8903
                | Self::Gece
                | Self::Tls3001
                | Self::Ws2801
                | Self::Apa102
        )
    }

    /// Slot based serial types.
    pub const fn is_serial(self) -> bool {
        matches!(self, Self::Dmx | Self::Renard | Self::Serial)
    }

    /// Clocked types that need an SPI bus.
    pub const fn is_spi(self) -> bool {
        matches!(self, Self::Ws2801 | Self::Apa102 | Self::Grinch)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ws2811 => "ws2811",
            Self::Tm1814 => "tm1814",
            Self::Ucs1903 => "ucs1903",
            Self::Gs8208 => "gs8208",
            Self::Ucs8903 => "ucs8903",
            Self::Gece => "gece",
            Self::Tls3001 => "tls3001",
            Self::Dmx => "dmx",
            Self::Renard => "renard",
            Self::Serial => "serial",
            Self::Ws2801 => "ws2801",
            Self::Apa102 => "apa102",
            Self::Grinch => "grinch",
        }
    }
}

/// Everything that can be set on one output port.
///
/// Fields that do not apply to the selected type are kept as-is so a round
/// trip through [`crate::OutputManager::get_config`] never loses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    #[serde(rename = "type")]
    pub output_type: OutputType,
    pub pixel: PixelGeometry,
    pub serial: SerialSettings,
    /// TM1814 constant current setting.
    #[serde(rename = "currentlimit")]
    pub current_limit: u8,
    /// GECE bulb brightness.
    #[serde(rename = "gece_brightness")]
    pub gece_brightness: u8,
    /// Grinch controllers chained on the port.
    #[serde(rename = "grinch_count")]
    pub grinch_count: u8,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            output_type: OutputType::Disabled,
            pixel: PixelGeometry::default(),
            serial: SerialSettings::default(),
            current_limit: TM1814_DEFAULT_CURRENT_LIMIT,
            gece_brightness: GECE_DEFAULT_BRIGHTNESS,
            grinch_count: GRINCH_DEFAULT_CONTROLLERS,
        }
    }
}

impl PortConfig {
    pub fn new(output_type: OutputType) -> Self {
        Self {
            output_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pixel(mut self, pixel: PixelGeometry) -> Self {
        self.pixel = pixel;
        self
    }

    #[must_use]
    pub fn with_serial(mut self, serial: SerialSettings) -> Self {
        self.serial = serial;
        self
    }
}
