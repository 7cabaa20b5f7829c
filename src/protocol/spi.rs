//! WS2801 and APA102 clocked pixels.

use crate::pixel::{FrameBlocks, PixelEncoding, PixelRenderer};

/// Bus clock both chips are driven at.
pub const SPI_PIXEL_BIT_RATE: u32 = 1_000_000;

/// Latch time after the last byte.
pub const SPI_PIXEL_IDLE_US: u32 = 500;

pub const APA102_FRAME_START: [u8; 4] = [0x00; 4];
pub const APA102_FRAME_END: [u8; 4] = [0xFF; 4];
/// Global brightness byte at full, in front of every LED.
pub const APA102_PIXEL_START: u8 = 0xFF;

pub fn ws2801_renderer() -> PixelRenderer {
    PixelRenderer::new(PixelEncoding::Bytes, 8)
}

pub fn apa102_blocks() -> FrameBlocks {
    FrameBlocks::from_slices(&APA102_FRAME_START, &APA102_FRAME_END, &[APA102_PIXEL_START])
}

pub fn apa102_renderer() -> PixelRenderer {
    PixelRenderer::new(PixelEncoding::Bytes, 8).with_blocks(apa102_blocks())
}
