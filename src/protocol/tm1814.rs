//! TM1814 constant current pixels.
//!
//! Every frame opens with an eight byte command: the current limit four
//! times, then its complement four times.

use crate::error::ConfigOutcome;
use crate::hal::UartDataSize;
use crate::pixel::{FrameBlocks, PixelEncoding, PixelRenderer};
use crate::rmt::RmtTransportConfig;
use crate::timing::TM1814;
use crate::uart::{Translation, UartTransportConfig};

pub const TM1814_DATA_RATE: u32 = 800_000;

/// Largest current limit code.
pub const TM1814_MAX_CURRENT_LIMIT: u8 = 63;
pub const TM1814_DEFAULT_CURRENT_LIMIT: u8 = 63;

/// 8N2 characters, one per bit. Start bit plus two data bits low then high
/// for a zero, seven bits low for a one.
pub const TM1814_UART_TABLE: [u8; 4] = [0b1111_1100, 0b1100_0000, 0, 0];

/// Eleven line bits per pixel bit.
pub const TM1814_UART_BAUDRATE: u32 = TM1814_DATA_RATE * 11;

/// Clamp the current limit to its six bit range.
pub fn validated_limit(limit: u8) -> (u8, ConfigOutcome) {
    let fixed = limit.min(TM1814_MAX_CURRENT_LIMIT);
    if fixed != limit {
        log::warn!("TM1814 current limit {} clamped to {}", limit, fixed);
    }
    (fixed, ConfigOutcome::from_corrected(fixed != limit))
}

/// Command preamble for `limit`.
pub const fn preamble(limit: u8) -> [u8; 8] {
    let inverse = !limit;
    [limit, limit, limit, limit, inverse, inverse, inverse, inverse]
}

pub fn blocks(limit: u8) -> FrameBlocks {
    FrameBlocks::from_slices(&preamble(limit), &[], &[])
}

pub const fn uart_config() -> UartTransportConfig {
    UartTransportConfig::translated(
        TM1814_UART_BAUDRATE,
        UartDataSize::Data8N2,
        Translation::OneToOne,
        TM1814_UART_TABLE,
    )
}

pub fn rmt_config() -> RmtTransportConfig {
    RmtTransportConfig::from_profile(&TM1814)
}

pub fn renderer(limit: u8) -> PixelRenderer {
    PixelRenderer::new(PixelEncoding::Bytes, 8).with_blocks(blocks(limit.min(TM1814_MAX_CURRENT_LIMIT)))
}
