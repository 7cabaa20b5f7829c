use libm::{powf, roundf};

/// Gamma used when the configured value is unusable.
pub const DEFAULT_GAMMA: f32 = 2.2;

/// 256 entry intensity lookup table with brightness folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaTable {
    lut: [u8; 256],
}

impl GammaTable {
    /// Table that passes values through unchanged.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn identity() -> Self {
        let mut lut = [0u8; 256];
        let mut i = 0;
        while i < 256 {
            lut[i] = i as u8;
            i += 1;
        }
        Self { lut }
    }

    /// Build `LUT[i] = round(255 * (i * brightness / 255) ^ (1 / gamma))`.
    ///
    /// `brightness` is a factor in `0.0..=1.0`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn new(gamma: f32, brightness: f32) -> Self {
        let gamma = if gamma.is_finite() && gamma > 0.0 { gamma } else { DEFAULT_GAMMA };
        let brightness = brightness.clamp(0.0, 1.0);
        let exponent = 1.0 / gamma;

        let mut lut = [0u8; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            let normalized = i as f32 * brightness / 255.0;
            let value = roundf(255.0 * powf(normalized, exponent));
            *slot = value.clamp(0.0, 255.0) as u8;
        }
        Self { lut }
    }

    #[inline]
    pub const fn apply(&self, value: u8) -> u8 {
        self.lut[value as usize]
    }

    pub const fn as_array(&self) -> &[u8; 256] {
        &self.lut
    }
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::identity()
    }
}
