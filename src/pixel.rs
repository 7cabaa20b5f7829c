//! Pixel framing state machine.
//!
//! One [`PixelRenderer`] per port walks the frame stage by stage and hands
//! out one intensity value per call. Transports call it from their interrupt
//! handlers, so a step never allocates and never blocks.

use heapless::Vec;
use smart_leds::RGB8;

use crate::error::ConfigOutcome;
use crate::gamma::GammaTable;
use crate::gece::{self, GECE_DEFAULT_BRIGHTNESS, GECE_PACKET_BITS, GECE_PIXEL_LIMIT};
use crate::geometry::{ColorOrder, PixelGeometry};
use crate::source::{FrameSource, read_window, write_window};
use crate::tls3001::{self, Tls3001Frame, Tls3001Sequence};

/// Longest preamble, postamble or per-pixel prefix.
pub const MAX_FRAME_BLOCK: usize = 10;

pub type FrameBlock = Vec<u8, MAX_FRAME_BLOCK>;

/// Stage of the frame currently being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    #[default]
    Idle,
    /// Frame type header of a TLS3001 frame.
    FrameHeader,
    FramePrepend,
    PixelPrependNulls,
    PixelSendIntensity,
    PixelAppendNulls,
    FrameAppend,
    Done,
}

impl FrameState {
    pub const fn in_progress(self) -> bool {
        !matches!(self, Self::Idle | Self::Done)
    }
}

/// How a pixel turns into wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelEncoding {
    /// One value per color byte.
    #[default]
    Bytes,
    /// One 26 bit GECE packet per bulb.
    Gece { brightness: u8 },
    /// 12 bit intensities behind a TLS3001 frame type header.
    Tls3001,
}

impl PixelEncoding {
    pub const fn gece() -> Self {
        Self::Gece {
            brightness: GECE_DEFAULT_BRIGHTNESS,
        }
    }
}

/// Fixed byte blocks wrapped around the pixel data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameBlocks {
    /// Sent once before the first pixel.
    pub frame_prepend: FrameBlock,
    /// Sent once after the last pixel.
    pub frame_append: FrameBlock,
    /// Sent in front of every pixel, null pixels included.
    pub pixel_prepend: FrameBlock,
}

impl FrameBlocks {
    /// Build blocks from slices, truncating each to [`MAX_FRAME_BLOCK`].
    pub fn from_slices(frame_prepend: &[u8], frame_append: &[u8], pixel_prepend: &[u8]) -> Self {
        Self {
            frame_prepend: truncated(frame_prepend),
            frame_append: truncated(frame_append),
            pixel_prepend: truncated(pixel_prepend),
        }
    }
}

fn truncated(bytes: &[u8]) -> FrameBlock {
    let len = bytes.len().min(MAX_FRAME_BLOCK);
    Vec::from_slice(&bytes[..len]).unwrap_or_default()
}

/// Configuration waiting for the current frame to finish.
#[derive(Debug, Clone)]
struct Staged {
    geometry: PixelGeometry,
    gamma: GammaTable,
    blocks: FrameBlocks,
    encoding: PixelEncoding,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    sent_pixels: usize,
    /// Position inside the current pixel (prefix bytes then colors).
    unit: usize,
    /// Position inside a frame prepend/append block.
    block: usize,
    nulls: usize,
}

/// Per-port pixel framing state machine.
#[derive(Debug, Clone)]
pub struct PixelRenderer {
    geometry: PixelGeometry,
    gamma: GammaTable,
    blocks: FrameBlocks,
    encoding: PixelEncoding,
    data_width: u8,
    state: FrameState,
    cursor: Cursor,
    staged: Option<Staged>,
    sequence: Tls3001Sequence,
    frame_kind: Tls3001Frame,
}

impl PixelRenderer {
    /// Create an idle renderer with no pixels configured.
    pub fn new(encoding: PixelEncoding, data_width: u8) -> Self {
        let geometry = PixelGeometry {
            pixel_count: 0,
            ..PixelGeometry::default()
        };
        Self {
            gamma: GammaTable::new(geometry.gamma, geometry.brightness_factor()),
            geometry,
            blocks: FrameBlocks::default(),
            encoding,
            data_width,
            state: FrameState::Idle,
            cursor: Cursor::default(),
            staged: None,
            sequence: Tls3001Sequence::new(),
            frame_kind: Tls3001Frame::default(),
        }
    }

    #[must_use]
    pub fn with_blocks(mut self, blocks: FrameBlocks) -> Self {
        self.blocks = blocks;
        self
    }

    /// Largest pixel count this encoding can address.
    pub const fn pixel_limit(&self) -> u16 {
        match self.encoding {
            PixelEncoding::Bytes | PixelEncoding::Tls3001 => u16::MAX,
            PixelEncoding::Gece { .. } => GECE_PIXEL_LIMIT,
        }
    }

    /// Validate and apply a geometry.
    ///
    /// While a frame is in flight the result is staged and takes effect at
    /// the next [`FrameSource::start_new_frame`].
    pub fn configure(&mut self, geometry: &PixelGeometry, available_channels: usize) -> ConfigOutcome {
        let blocks = self.pending_blocks().clone();
        self.configure_with_blocks(geometry, blocks, available_channels)
    }

    /// Like [`PixelRenderer::configure`] but also replaces the frame blocks.
    pub fn configure_with_blocks(
        &mut self,
        geometry: &PixelGeometry,
        blocks: FrameBlocks,
        available_channels: usize,
    ) -> ConfigOutcome {
        let gece = matches!(self.encoding, PixelEncoding::Gece { .. });
        let mut requested = *geometry;
        let mut forced = false;
        // GECE packs R, G and B itself and has no room for nulls.
        if gece
            && (requested.color_order != ColorOrder::Rgb
                || requested.prepend_null_count != 0
                || requested.append_null_count != 0)
        {
            log::warn!("GECE ignores color order and null pixels");
            requested.color_order = ColorOrder::Rgb;
            requested.prepend_null_count = 0;
            requested.append_null_count = 0;
            forced = true;
        }

        let (fixed, outcome) = requested.validated(available_channels, self.pixel_limit());
        let outcome = outcome.merge(ConfigOutcome::from_corrected(forced));

        let staged = Staged {
            gamma: GammaTable::new(fixed.gamma, fixed.brightness_factor()),
            geometry: fixed,
            blocks,
            encoding: self.encoding(),
        };
        if self.state.in_progress() {
            self.staged = Some(staged);
        } else {
            self.apply(staged);
        }
        outcome
    }

    /// Most recently accepted geometry, staged or applied.
    pub fn geometry(&self) -> &PixelGeometry {
        self.staged.as_ref().map_or(&self.geometry, |staged| &staged.geometry)
    }

    /// Most recently accepted frame blocks, staged or applied.
    pub fn blocks(&self) -> &FrameBlocks {
        self.pending_blocks()
    }

    /// Most recently accepted encoding, staged or applied.
    pub fn encoding(&self) -> PixelEncoding {
        self.staged.as_ref().map_or(self.encoding, |staged| staged.encoding)
    }

    /// Encoding used by the frame on the wire.
    pub const fn active_encoding(&self) -> PixelEncoding {
        self.encoding
    }

    /// Set the bulb brightness of a GECE renderer. Staged like geometry.
    pub fn set_gece_brightness(&mut self, brightness: u8) {
        if !matches!(self.encoding, PixelEncoding::Gece { .. }) {
            return;
        }
        let encoding = PixelEncoding::Gece { brightness };
        if !self.state.in_progress() {
            self.encoding = encoding;
            if let Some(staged) = self.staged.as_mut() {
                staged.encoding = encoding;
            }
            return;
        }
        let mut staged = self.staged.take().unwrap_or_else(|| self.current());
        staged.encoding = encoding;
        self.staged = Some(staged);
    }

    pub const fn state(&self) -> FrameState {
        self.state
    }

    /// Kind of the current TLS3001 frame.
    pub const fn frame_kind(&self) -> Tls3001Frame {
        self.frame_kind
    }

    /// Gamma table of the frame on the wire.
    pub const fn gamma(&self) -> &GammaTable {
        &self.gamma
    }

    /// Channel bytes this port consumes.
    pub fn num_buffer_bytes_needed(&self) -> usize {
        self.geometry().buffer_bytes()
    }

    /// Copy `data` into this port's slice of `buffer` starting at `start`.
    ///
    /// Returns the number of bytes copied.
    pub fn write_channel_data(&self, buffer: &mut [u8], start: usize, data: &[u8]) -> usize {
        write_window(buffer, self.num_buffer_bytes_needed(), start, data)
    }

    /// Copy this port's slice of `buffer`, from `start`, into `out`.
    pub fn read_channel_data(&self, buffer: &[u8], start: usize, out: &mut [u8]) -> usize {
        read_window(buffer, self.num_buffer_bytes_needed(), start, out)
    }

    /// Values sent per frame, used for frame timing.
    pub fn frame_intensity_count(&self) -> u32 {
        let geometry = self.geometry();
        let blocks = self.pending_blocks();
        let total = match self.encoding {
            PixelEncoding::Gece { .. } => usize::from(geometry.pixel_count),
            PixelEncoding::Bytes | PixelEncoding::Tls3001 => {
                let header = usize::from(self.encoding == PixelEncoding::Tls3001);
                let per_pixel = blocks.pixel_prepend.len() + geometry.bytes_per_pixel();
                let pixels = usize::from(geometry.pixel_count)
                    + usize::from(geometry.prepend_null_count)
                    + usize::from(geometry.append_null_count);
                header + blocks.frame_prepend.len() + pixels * per_pixel + blocks.frame_append.len()
            }
        };
        u32::try_from(total).unwrap_or(u32::MAX)
    }

    fn pending_blocks(&self) -> &FrameBlocks {
        self.staged.as_ref().map_or(&self.blocks, |staged| &staged.blocks)
    }

    fn current(&self) -> Staged {
        Staged {
            geometry: self.geometry,
            gamma: self.gamma.clone(),
            blocks: self.blocks.clone(),
            encoding: self.encoding,
        }
    }

    fn apply(&mut self, staged: Staged) {
        self.geometry = staged.geometry;
        self.gamma = staged.gamma;
        self.blocks = staged.blocks;
        self.encoding = staged.encoding;
    }

    fn first_stage(&self) -> FrameState {
        if self.blocks.frame_prepend.is_empty() {
            self.first_pixel_stage()
        } else {
            FrameState::FramePrepend
        }
    }

    fn first_pixel_stage(&self) -> FrameState {
        if self.geometry.prepend_null_count > 0 {
            FrameState::PixelPrependNulls
        } else {
            FrameState::PixelSendIntensity
        }
    }

    fn after_pixels(&self) -> FrameState {
        if self.geometry.append_null_count > 0 {
            FrameState::PixelAppendNulls
        } else {
            self.after_append_nulls()
        }
    }

    fn after_append_nulls(&self) -> FrameState {
        if self.blocks.frame_append.is_empty() {
            FrameState::Done
        } else {
            FrameState::FrameAppend
        }
    }

    const fn widen(&self, value: u8) -> u32 {
        match self.encoding {
            PixelEncoding::Tls3001 => tls3001::intensity(value),
            _ if self.data_width == 16 => value as u32 * 0x0101,
            _ => value as u32,
        }
    }

    /// Next unit of the current pixel, and whether the pixel is complete.
    fn pixel_unit(&mut self, data: &[u8], lit: bool) -> (u32, bool) {
        let prefix_len = self.blocks.pixel_prepend.len();
        let bytes_per_pixel = self.geometry.bytes_per_pixel();
        let unit = self.cursor.unit;

        let value = if let Some(&byte) = self.blocks.pixel_prepend.get(unit) {
            u32::from(byte)
        } else if lit {
            let slot = unit - prefix_len;
            let source = self.geometry.source_pixel(self.cursor.sent_pixels);
            let offset = self.geometry.color_order.wire_offsets()[slot];
            let raw = data
                .get(source * bytes_per_pixel + usize::from(offset))
                .copied()
                .unwrap_or(0);
            self.widen(self.gamma.apply(raw))
        } else {
            0
        };

        self.cursor.unit += 1;
        let complete = self.cursor.unit >= prefix_len + bytes_per_pixel;
        if complete {
            self.cursor.unit = 0;
        }
        (value, complete)
    }

    fn gece_packet(&self, data: &[u8], brightness: u8) -> u32 {
        let led = self.cursor.sent_pixels;
        let base = self.geometry.source_pixel(led) * self.geometry.bytes_per_pixel();
        let channel = |index: usize| self.gamma.apply(data.get(base + index).copied().unwrap_or(0));
        let color = RGB8::new(channel(0), channel(1), channel(2));
        #[allow(clippy::cast_possible_truncation)]
        let address = led as u8;
        gece::pack(address, brightness, color)
    }
}

impl FrameSource for PixelRenderer {
    fn start_new_frame(&mut self) {
        if self.state.in_progress() {
            return;
        }
        if let Some(staged) = self.staged.take() {
            self.apply(staged);
        }

        self.cursor = Cursor::default();
        self.state = if self.geometry.pixel_count == 0 {
            FrameState::Done
        } else if self.encoding == PixelEncoding::Tls3001 {
            self.frame_kind = self.sequence.advance();
            FrameState::FrameHeader
        } else {
            self.first_stage()
        };
    }

    fn more_data_to_send(&self) -> bool {
        self.state.in_progress()
    }

    fn next_intensity(&mut self, data: &[u8]) -> Option<u32> {
        match self.state {
            FrameState::Idle | FrameState::Done => None,
            FrameState::FrameHeader => {
                let (value, _) = self.frame_kind.header();
                self.state = if self.frame_kind.carries_pixels() {
                    self.first_stage()
                } else {
                    FrameState::Done
                };
                Some(value)
            }
            FrameState::FramePrepend => {
                let value = self.blocks.frame_prepend.get(self.cursor.block).copied().unwrap_or(0);
                self.cursor.block += 1;
                if self.cursor.block >= self.blocks.frame_prepend.len() {
                    self.cursor.block = 0;
                    self.state = self.first_pixel_stage();
                }
                Some(u32::from(value))
            }
            FrameState::PixelPrependNulls => {
                let (value, complete) = self.pixel_unit(data, false);
                if complete {
                    self.cursor.nulls += 1;
                    if self.cursor.nulls >= usize::from(self.geometry.prepend_null_count) {
                        self.cursor.nulls = 0;
                        self.state = FrameState::PixelSendIntensity;
                    }
                }
                Some(value)
            }
            FrameState::PixelSendIntensity => {
                let (value, complete) = match self.encoding {
                    PixelEncoding::Gece { brightness } => (self.gece_packet(data, brightness), true),
                    PixelEncoding::Bytes | PixelEncoding::Tls3001 => self.pixel_unit(data, true),
                };
                if complete {
                    self.cursor.sent_pixels += 1;
                    if self.cursor.sent_pixels >= usize::from(self.geometry.pixel_count) {
                        self.state = self.after_pixels();
                    }
                }
                Some(value)
            }
            FrameState::PixelAppendNulls => {
                let (value, complete) = self.pixel_unit(data, false);
                if complete {
                    self.cursor.nulls += 1;
                    if self.cursor.nulls >= usize::from(self.geometry.append_null_count) {
                        self.cursor.nulls = 0;
                        self.state = self.after_append_nulls();
                    }
                }
                Some(value)
            }
            FrameState::FrameAppend => {
                let value = self.blocks.frame_append.get(self.cursor.block).copied().unwrap_or(0);
                self.cursor.block += 1;
                if self.cursor.block >= self.blocks.frame_append.len() {
                    self.cursor.block = 0;
                    self.state = FrameState::Done;
                }
                Some(u32::from(value))
            }
        }
    }

    fn abort_frame(&mut self) {
        if self.state.in_progress() {
            self.state = FrameState::Done;
        }
    }

    fn intensity_width(&self) -> u8 {
        match self.encoding {
            PixelEncoding::Gece { .. } => GECE_PACKET_BITS,
            PixelEncoding::Tls3001 if self.state == FrameState::FrameHeader => self.frame_kind.header().1,
            PixelEncoding::Tls3001 | PixelEncoding::Bytes => self.data_width,
        }
    }
}
