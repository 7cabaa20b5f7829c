//! Pixel geometry: count, grouping, zigzag wiring and color order.

use serde::{Deserialize, Serialize};

use crate::error::ConfigOutcome;
use crate::gamma::DEFAULT_GAMMA;

/// Largest brightness percentage.
pub const MAX_BRIGHTNESS: u8 = 100;

/// Byte order of one pixel on the wire.
///
/// The channel buffer always holds pixels as R, G, B (, W).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    #[default]
    Rgb,
    Grb,
    Brg,
    Rbg,
    Gbr,
    Bgr,
    Wrgb,
    Rgbw,
    Grbw,
    Brgw,
    Rbgw,
    Gbrw,
    Bgrw,
}

impl ColorOrder {
    /// Buffer offset read for each wire position.
    pub const fn wire_offsets(self) -> [u8; 4] {
        match self {
            Self::Rgb | Self::Rgbw => [0, 1, 2, 3],
            Self::Grb | Self::Grbw => [1, 0, 2, 3],
            Self::Brg | Self::Brgw => [2, 0, 1, 3],
            Self::Rbg | Self::Rbgw => [0, 2, 1, 3],
            Self::Gbr | Self::Gbrw => [1, 2, 0, 3],
            Self::Bgr | Self::Bgrw => [2, 1, 0, 3],
            Self::Wrgb => [3, 0, 1, 2],
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb | Self::Grb | Self::Brg | Self::Rbg | Self::Gbr | Self::Bgr => 3,
            _ => 4,
        }
    }
}

/// Layout of one pixel string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelGeometry {
    pub pixel_count: u16,
    pub group_size: u16,
    /// Serpentine run length, 0 disables zigzag.
    pub zig_size: u16,
    pub color_order: ColorOrder,
    pub gamma: f32,
    /// Percent, 0..=100.
    pub brightness: u8,
    #[serde(rename = "prependnullcount")]
    pub prepend_null_count: u16,
    #[serde(rename = "appendnullcount")]
    pub append_null_count: u16,
}

impl Default for PixelGeometry {
    fn default() -> Self {
        Self {
            pixel_count: 100,
            group_size: 1,
            zig_size: 0,
            color_order: ColorOrder::Rgb,
            gamma: DEFAULT_GAMMA,
            brightness: MAX_BRIGHTNESS,
            prepend_null_count: 0,
            append_null_count: 0,
        }
    }
}

impl PixelGeometry {
    pub const fn bytes_per_pixel(&self) -> usize {
        self.color_order.bytes_per_pixel()
    }

    /// Channel bytes this geometry reads from the buffer.
    pub const fn buffer_bytes(&self) -> usize {
        self.pixel_count as usize * self.bytes_per_pixel()
    }

    /// Brightness as a `0.0..=1.0` factor.
    pub fn brightness_factor(&self) -> f32 {
        f32::from(self.brightness.min(MAX_BRIGHTNESS)) / f32::from(MAX_BRIGHTNESS)
    }

    /// Source pixel index for output LED `led`.
    pub const fn source_pixel(&self, led: usize) -> usize {
        source_pixel(led, self.group_size as usize, self.zig_size as usize)
    }

    /// Clamp every field to a usable value.
    ///
    /// `available_channels` bounds the pixel count, `pixel_limit` is a hard
    /// protocol ceiling.
    #[must_use]
    pub fn validated(&self, available_channels: usize, pixel_limit: u16) -> (Self, ConfigOutcome) {
        let mut fixed = *self;

        let by_channels = available_channels / fixed.bytes_per_pixel();
        let limit = usize::from(pixel_limit).min(by_channels);
        if usize::from(fixed.pixel_count) > limit {
            fixed.pixel_count = u16::try_from(limit).unwrap_or(pixel_limit);
        }

        let count = fixed.pixel_count.max(1);
        fixed.group_size = fixed.group_size.clamp(1, count);
        fixed.zig_size = fixed.zig_size.min(fixed.pixel_count);

        if !(fixed.gamma.is_finite() && fixed.gamma > 0.0) {
            fixed.gamma = DEFAULT_GAMMA;
        }
        fixed.brightness = fixed.brightness.min(MAX_BRIGHTNESS);

        let outcome = ConfigOutcome::from_corrected(fixed != *self);
        if outcome.is_corrected() {
            log::warn!(
                "pixel geometry corrected: count {} -> {}, group {} -> {}, zig {} -> {}",
                self.pixel_count,
                fixed.pixel_count,
                self.group_size,
                fixed.group_size,
                self.zig_size,
                fixed.zig_size
            );
        }
        (fixed, outcome)
    }
}

/// Map output LED `led` to the source pixel it displays.
///
/// Grouping repeats each source pixel `group` times. With zigzag enabled
/// every odd run of `zig` LEDs is wired in reverse.
pub const fn source_pixel(led: usize, group: usize, zig: usize) -> usize {
    let group = if group == 0 { 1 } else { group };
    let modifier = led / group;
    if zig == 0 {
        return modifier;
    }
    let block = led / zig;
    if block % 2 == 1 {
        (block * zig + zig - (led % zig) - 1) / group
    } else {
        modifier
    }
}
