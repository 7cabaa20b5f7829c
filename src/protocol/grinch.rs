//! Grinch relay controllers on the SPI bus.

use crate::grinch::GrinchRenderer;

/// One controller until configured.
pub const fn renderer() -> GrinchRenderer {
    GrinchRenderer::new()
}
