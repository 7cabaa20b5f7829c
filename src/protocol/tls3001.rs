//! TLS3001 Manchester coded pixels. RMT only.

use crate::hal::{RmtItem, RmtSymbol};
use crate::pixel::{PixelEncoding, PixelRenderer};
use crate::rmt::RmtTransportConfig;
use crate::timing::{RMT_DEFAULT_CLOCK_DIVIDER, TLS3001, rmt_tick_ns};

/// A one is high then low, a zero low then high. Start bits are ones and the
/// gap item is a tenth of a half cell.
pub fn rmt_config() -> RmtTransportConfig {
    let mut config = RmtTransportConfig::from_profile(&TLS3001);
    let tick_ns = rmt_tick_ns(RMT_DEFAULT_CLOCK_DIVIDER);
    #[allow(clippy::cast_possible_truncation)]
    let half = TLS3001.bit0_high_ns.div_ceil(tick_ns) as u16;
    let one = RmtItem::new(half, true, half, false);
    let zero = RmtItem::new(half, false, half, true);

    config.table[RmtSymbol::Zero as usize] = zero;
    config.table[RmtSymbol::One as usize] = one;
    config.table[RmtSymbol::Two as usize] = zero;
    config.table[RmtSymbol::Three as usize] = one;
    config.table[RmtSymbol::StartBit as usize] = one;
    config.table[RmtSymbol::InterFrameGap as usize] = RmtItem::new(half / 10, false, half / 10, false);
    config
}

pub fn renderer() -> PixelRenderer {
    PixelRenderer::new(PixelEncoding::Tls3001, TLS3001.data_width)
}
