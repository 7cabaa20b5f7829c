//! DMX512.

use crate::hal::{RmtItem, RmtSymbol, UartDataSize};
use crate::rmt::RmtTransportConfig;
use crate::serial::{DMX_BAUDRATE, DMX_BREAK_US, DMX_MAB_US, SerialProtocol, SerialRenderer};
use crate::timing::{RMT_DEFAULT_CLOCK_DIVIDER, rmt_tick_ns};
use crate::uart::UartTransportConfig;

/// 250 kbaud 8N2 with break and mark-after-break ahead of every frame.
pub const fn uart_config() -> UartTransportConfig {
    UartTransportConfig::passthrough(DMX_BAUDRATE, UartDataSize::Data8N2).with_break(DMX_BREAK_US, DMX_MAB_US)
}

/// Serial line where the single lead item is the break (low) followed by
/// the mark-after-break (high).
pub fn rmt_config() -> RmtTransportConfig {
    let mut config = RmtTransportConfig::serial(DMX_BAUDRATE, 2);
    let tick_ns = rmt_tick_ns(RMT_DEFAULT_CLOCK_DIVIDER);
    #[allow(clippy::cast_possible_truncation)]
    let ticks = |us: u32| (us * 1000).div_ceil(tick_ns) as u16;
    config.table[RmtSymbol::InterFrameGap as usize] =
        RmtItem::new(ticks(DMX_BREAK_US), false, ticks(DMX_MAB_US), true);
    config.idle_bits = 1;
    config
}

pub fn renderer() -> SerialRenderer {
    SerialRenderer::new(SerialProtocol::Dmx)
}
