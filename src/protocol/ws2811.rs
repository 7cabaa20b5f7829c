//! WS2811 / WS2812 one wire pixels.

use crate::hal::UartDataSize;
use crate::pixel::{PixelEncoding, PixelRenderer};
use crate::rmt::RmtTransportConfig;
use crate::timing::{Target, TimingProfile, ws2811};
use crate::uart::{Translation, UartTransportConfig};

pub const WS2811_DATA_RATE: u32 = 800_000;

/// Inverted 6N1 characters, two data bits each. The start bit and the
/// inverted data draw four line bits per pixel bit.
pub const WS2811_UART_TABLE: [u8; 4] = [0b0011_0111, 0b0000_0111, 0b0011_0100, 0b0000_0100];

/// Four UART bits per pixel bit.
pub const WS2811_UART_BAUDRATE: u32 = WS2811_DATA_RATE * 4;

pub const fn profile(target: Target) -> TimingProfile {
    ws2811(target)
}

/// 2:1 serializer shared by every 800 kHz NRZ chip.
pub const fn uart_config() -> UartTransportConfig {
    UartTransportConfig::translated(
        WS2811_UART_BAUDRATE,
        UartDataSize::Data6N1,
        Translation::TwoToOne,
        WS2811_UART_TABLE,
    )
    .inverted()
}

pub fn rmt_config(target: Target) -> RmtTransportConfig {
    RmtTransportConfig::from_profile(&profile(target))
}

pub fn renderer() -> PixelRenderer {
    PixelRenderer::new(PixelEncoding::Bytes, 8)
}
