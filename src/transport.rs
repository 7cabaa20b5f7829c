//! Transport dispatch.
//!
//! A port drives exactly one peripheral. The enum keeps the concrete
//! transport type so every interrupt path stays monomorphic.

use serde::Serialize;

use crate::error::InitError;
use crate::hal::{Board, RmtInterrupts};
use crate::protocol::Links;
use crate::rmt::{RmtCounters, RmtTransport, RmtTransportConfig};
use crate::source::FrameSource;
use crate::spi::{SpiCounters, SpiTransport};
use crate::timing::WS2811_ESP32;
use crate::uart::{UartCounters, UartTransport, UartTransportConfig};

/// Result of servicing a transport interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsrOutcome {
    /// The interrupt belongs to another peripheral.
    NotForUs,
    /// Frame still being sent.
    InProgress,
    /// Last value of the frame has been handed to the hardware.
    FrameComplete,
}

/// Debug counters of whichever transport a port uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum TransportCounters {
    Uart(UartCounters),
    Rmt(RmtCounters),
    Spi(SpiCounters),
}

/// Peripheral bound to one output port.
pub enum Transport<B: Board> {
    Uart(UartTransport<B::Uart>),
    Rmt(RmtTransport<B::Rmt>),
    Spi(SpiTransport<B::Spi>),
}

impl<B: Board> Transport<B> {
    /// Unconfigured UART port.
    pub fn uart(hal: B::Uart) -> Self {
        Self::Uart(UartTransport::new(hal, UartTransportConfig::default()))
    }

    /// Unconfigured RMT port.
    pub fn rmt(hal: B::Rmt) -> Self {
        Self::Rmt(RmtTransport::new(hal, RmtTransportConfig::from_profile(&WS2811_ESP32)))
    }

    pub fn spi(bus: B::Spi) -> Self {
        Self::Spi(SpiTransport::new(bus))
    }

    /// Bring the peripheral up with the settings `links` has for it.
    pub fn begin(&mut self, links: &Links) -> Result<(), InitError> {
        match (self, links) {
            (Self::Uart(uart), Links { uart: Some(config), .. }) => uart.begin(*config),
            (Self::Rmt(rmt), Links { rmt: Some(config), .. }) => rmt.begin(*config),
            (Self::Spi(_), Links { spi: true, .. }) => Ok(()),
            _ => Err(InitError::Unsupported),
        }
    }

    /// Whether the peripheral already runs with the settings `links` has for it.
    pub fn matches(&self, links: &Links) -> bool {
        match self {
            Self::Uart(uart) => uart.is_initialized() && links.uart == Some(*uart.config()),
            Self::Rmt(rmt) => rmt.is_initialized() && links.rmt == Some(*rmt.config()),
            Self::Spi(_) => links.spi,
        }
    }

    pub fn end(&mut self) {
        match self {
            Self::Uart(uart) => uart.end(),
            Self::Rmt(rmt) => rmt.end(),
            // Nothing runs between frames on the bus.
            Self::Spi(_) => {}
        }
    }

    pub fn start_new_frame<S: FrameSource>(&mut self, source: &mut S, data: &[u8]) {
        match self {
            Self::Uart(uart) => uart.start_new_frame(source, data),
            Self::Rmt(rmt) => rmt.start_new_frame(source, data),
            Self::Spi(spi) => spi.start_new_frame(source, data),
        }
    }

    pub fn on_uart_interrupt<S: FrameSource>(&mut self, source: &mut S, data: &[u8]) -> IsrOutcome {
        match self {
            Self::Uart(uart) => uart.on_interrupt(source, data),
            Self::Rmt(_) | Self::Spi(_) => IsrOutcome::NotForUs,
        }
    }

    pub fn on_rmt_interrupt<S: FrameSource>(
        &mut self,
        flags: RmtInterrupts,
        source: &mut S,
        data: &[u8],
    ) -> IsrOutcome {
        match self {
            Self::Rmt(rmt) => rmt.on_interrupt(flags, source, data),
            Self::Uart(_) | Self::Spi(_) => IsrOutcome::NotForUs,
        }
    }

    /// Keep the RMT ring topped up from task context.
    pub fn encode<S: FrameSource>(&mut self, source: &mut S, data: &[u8]) {
        if let Self::Rmt(rmt) = self {
            rmt.encode(source, data);
        }
    }

    pub fn is_busy(&self) -> bool {
        match self {
            Self::Uart(uart) => uart.is_busy(),
            Self::Rmt(rmt) => rmt.is_busy(),
            Self::Spi(_) => false,
        }
    }

    pub fn pause(&mut self, paused: bool) {
        match self {
            Self::Uart(uart) => uart.pause(paused),
            Self::Rmt(rmt) => rmt.pause(paused),
            Self::Spi(spi) => spi.pause(paused),
        }
    }

    pub fn counters(&self) -> TransportCounters {
        match self {
            Self::Uart(uart) => TransportCounters::Uart(*uart.counters()),
            Self::Rmt(rmt) => TransportCounters::Rmt(*rmt.counters()),
            Self::Spi(spi) => TransportCounters::Spi(*spi.counters()),
        }
    }

    /// Frames handed to the peripheral so far.
    pub fn frames_started(&self) -> u32 {
        match self {
            Self::Uart(uart) => uart.counters().frames_started,
            Self::Rmt(rmt) => rmt.counters().frames_started,
            Self::Spi(spi) => spi.counters().frames_sent,
        }
    }
}
