//! Renard and generic serial.

use crate::hal::UartDataSize;
use crate::rmt::RmtTransportConfig;
use crate::serial::{SerialProtocol, SerialRenderer, SerialSettings};
use crate::uart::UartTransportConfig;

/// Stop bits used by every plain serial output.
pub const SERIAL_STOP_BITS: u8 = 2;

pub const fn uart_config(settings: &SerialSettings) -> UartTransportConfig {
    UartTransportConfig::passthrough(settings.baudrate, UartDataSize::Data8N2)
}

pub fn rmt_config(settings: &SerialSettings) -> RmtTransportConfig {
    RmtTransportConfig::serial(settings.baudrate, SERIAL_STOP_BITS)
}

pub fn renard_renderer() -> SerialRenderer {
    SerialRenderer::new(SerialProtocol::Renard)
}

pub fn generic_renderer() -> SerialRenderer {
    SerialRenderer::new(SerialProtocol::Generic)
}
