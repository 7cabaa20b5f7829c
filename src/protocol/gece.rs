//! GECE holiday strings.

use crate::gece::{GECE_BIT_TIME_US, GECE_DEFAULT_BRIGHTNESS};
use crate::hal::UartDataSize;
use crate::pixel::{PixelEncoding, PixelRenderer};
use crate::rmt::RmtTransportConfig;
use crate::timing::GECE;
use crate::uart::{Translation, UartTransportConfig};

/// One 7N1 character (start, seven data, stop) per GECE bit.
pub const GECE_UART_BAUDRATE: u32 = 9 * 1_000_000 / GECE_BIT_TIME_US;

/// Zero: two bit times low then high. One: seven bit times low.
pub const GECE_UART_TABLE: [u8; 4] = [0b0111_1110, 0b0100_0000, 0, 0];

/// Stop gap before each packet.
pub const GECE_STOP_US: u32 = 45;
/// Start pulse before each packet.
pub const GECE_START_US: u32 = 8;

pub const fn uart_config() -> UartTransportConfig {
    UartTransportConfig::translated(
        GECE_UART_BAUDRATE,
        UartDataSize::Data7N1,
        Translation::OneToOne,
        GECE_UART_TABLE,
    )
    .with_break_per_intensity(GECE_STOP_US, GECE_START_US)
}

/// Start and stop items wrap every packet rather than the whole frame.
pub fn rmt_config() -> RmtTransportConfig {
    RmtTransportConfig {
        start_bits: 0,
        stop_bits: 0,
        start_per_intensity: true,
        stop_per_intensity: GECE.stop_bits,
        ..RmtTransportConfig::from_profile(&GECE)
    }
}

pub fn renderer(brightness: u8) -> PixelRenderer {
    PixelRenderer::new(PixelEncoding::Gece { brightness }, GECE.data_width)
}

pub fn default_renderer() -> PixelRenderer {
    renderer(GECE_DEFAULT_BRIGHTNESS)
}
