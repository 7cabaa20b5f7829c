#![no_std]

pub mod config;
pub mod error;
pub mod frame_scheduler;
pub mod gamma;
pub mod gece;
pub mod geometry;
pub mod grinch;
pub mod hal;
pub mod isr;
#[cfg(feature = "esp32-log")]
pub mod logger;
pub mod manager;
pub mod pixel;
pub mod protocol;
pub mod rmt;
pub mod serial;
pub mod source;
pub mod spi;
pub mod status;
pub mod timing;
pub mod tls3001;
pub mod transport;
pub mod uart;

pub use config::{OutputType, PortConfig};
pub use error::{ConfigOutcome, InitError};
pub use frame_scheduler::RefreshTimer;
pub use gamma::GammaTable;
pub use geometry::{ColorOrder, PixelGeometry};
pub use grinch::GrinchRenderer;
pub use hal::{Board, RmtHal, RmtInterrupts, RmtItem, RmtSymbol, UartDataSize, UartHal, UartSettings};
pub use isr::{FrameDoneQueue, PortTable};
pub use manager::{OutputManager, OutputPort};
pub use pixel::{FrameBlocks, FrameState, PixelEncoding, PixelRenderer};
pub use rmt::{RmtTransport, RmtTransportConfig};
pub use serial::{SerialProtocol, SerialRenderer, SerialSettings};
pub use source::{FrameSource, SourceSlot};
pub use spi::SpiTransport;
pub use status::PortStatus;
pub use timing::{Target, TimingProfile};
pub use tls3001::{Tls3001Frame, Tls3001Sequence};
pub use transport::{IsrOutcome, Transport, TransportCounters};
pub use uart::{Translation, UartTransport, UartTransportConfig};

pub use embassy_time::{Duration, Instant};
