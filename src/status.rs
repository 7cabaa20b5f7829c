use serde::Serialize;

use crate::config::OutputType;
use crate::transport::TransportCounters;

/// Diagnostic snapshot of one output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortStatus {
    pub port: usize,
    #[serde(rename = "type")]
    pub output_type: OutputType,
    /// Frames started since the transport was created.
    pub frames: u32,
    pub frame_min_duration_us: u32,
    /// First channel of the port's slice of the buffer.
    pub buffer_start: usize,
    pub buffer_len: usize,
    pub busy: bool,
    pub paused: bool,
    pub counters: TransportCounters,
}
