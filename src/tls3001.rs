//! TLS3001 frame sequencing.
//!
//! TLS3001 strings are Manchester coded at 500 kbit/s. Every frame opens with
//! fifteen one bits and a four bit frame type. A data frame then carries 13
//! bits per color: a zero followed by a 12 bit intensity. The chips drift out
//! of sync, so a sync frame goes out ahead of every run of data frames.

/// Line bit rate.
pub const TLS3001_DATA_RATE: u32 = 500_000;

pub const TLS3001_BIT_TIME_NS: u32 = 1_000_000_000 / TLS3001_DATA_RATE;

/// One bits in front of every frame type.
pub const TLS3001_START_BITS: u8 = 15;

pub const TLS3001_FRAME_TYPE_BITS: u8 = 4;

/// Zero bit plus 12 bit intensity.
pub const TLS3001_INTENSITY_BITS: u8 = 13;

/// Zero bits that follow the sync frame type.
pub const TLS3001_SYNC_ZERO_BITS: u8 = 15;

/// Idle between frames.
pub const TLS3001_IDLE_US: u32 = 50;

/// Data frames sent before the next sync.
pub const TLS3001_MAX_CONSECUTIVE_DATA_FRAMES: u8 = 50;

/// Kind of frame on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tls3001Frame {
    #[default]
    Reset,
    Sync,
    Data,
}

impl Tls3001Frame {
    pub const fn frame_type(self) -> u32 {
        match self {
            Self::Reset => 0b0100,
            Self::Sync => 0b0001,
            Self::Data => 0b0010,
        }
    }

    /// Value sent right after the start bits, and its width in bits.
    pub const fn header(self) -> (u32, u8) {
        match self {
            Self::Sync => (
                self.frame_type() << TLS3001_SYNC_ZERO_BITS,
                TLS3001_FRAME_TYPE_BITS + TLS3001_SYNC_ZERO_BITS,
            ),
            Self::Reset | Self::Data => (self.frame_type(), TLS3001_FRAME_TYPE_BITS),
        }
    }

    pub const fn carries_pixels(self) -> bool {
        matches!(self, Self::Data)
    }
}

/// Picks the kind of each frame: one reset, then a sync ahead of every run
/// of data frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tls3001Sequence {
    next: Tls3001Frame,
    data_frames: u8,
}

impl Tls3001Sequence {
    pub const fn new() -> Self {
        Self {
            next: Tls3001Frame::Reset,
            data_frames: 0,
        }
    }

    /// Kind of the next frame, without advancing.
    pub const fn peek(&self) -> Tls3001Frame {
        self.next
    }

    /// Kind of the frame being started.
    pub fn advance(&mut self) -> Tls3001Frame {
        let kind = self.next;
        self.next = match kind {
            Tls3001Frame::Reset => Tls3001Frame::Sync,
            Tls3001Frame::Sync => {
                self.data_frames = 0;
                Tls3001Frame::Data
            }
            Tls3001Frame::Data => {
                self.data_frames = self.data_frames.saturating_add(1);
                if self.data_frames >= TLS3001_MAX_CONSECUTIVE_DATA_FRAMES {
                    Tls3001Frame::Sync
                } else {
                    Tls3001Frame::Data
                }
            }
        };
        kind
    }
}

/// Scale a byte to 12 bits. The 13th (leading) bit stays zero.
pub const fn intensity(value: u8) -> u32 {
    ((value as u32) << 4) | ((value as u32) >> 4)
}
