//! UCS1903, GS8208 and UCS8903.
//!
//! UCS1903 and GS8208 are WS2811 compatible on the wire apart from their
//! timing and reset gap. UCS8903 sends 16 bit intensities.

use crate::hal::UartDataSize;
use crate::pixel::{PixelEncoding, PixelRenderer};
use crate::protocol::tm1814::TM1814_UART_TABLE;
use crate::protocol::ws2811;
use crate::rmt::RmtTransportConfig;
use crate::timing::{GS8208, UCS1903, UCS8903};
use crate::uart::{Translation, UartTransportConfig};

pub const UCS8903_DATA_RATE: u32 = 800_000;

/// Inverted 8N1, one character per bit: ten line bits per pixel bit.
pub const UCS8903_UART_BAUDRATE: u32 = UCS8903_DATA_RATE * 10;

pub const fn ucs1903_uart_config() -> UartTransportConfig {
    ws2811::uart_config()
}

pub const fn gs8208_uart_config() -> UartTransportConfig {
    ws2811::uart_config()
}

pub const fn ucs8903_uart_config() -> UartTransportConfig {
    UartTransportConfig::translated(
        UCS8903_UART_BAUDRATE,
        UartDataSize::Data8N1,
        Translation::OneToOne,
        TM1814_UART_TABLE,
    )
    .inverted()
}

pub fn ucs1903_rmt_config() -> RmtTransportConfig {
    RmtTransportConfig::from_profile(&UCS1903)
}

pub fn gs8208_rmt_config() -> RmtTransportConfig {
    RmtTransportConfig::from_profile(&GS8208)
}

pub fn ucs8903_rmt_config() -> RmtTransportConfig {
    RmtTransportConfig::from_profile(&UCS8903)
}

pub fn ucs8903_renderer() -> PixelRenderer {
    PixelRenderer::new(PixelEncoding::Bytes, UCS8903.data_width)
}
