//! Output manager.
//!
//! Owns the channel buffer and every output port. The main loop configures
//! ports and calls [`OutputManager::poll`]; interrupt handlers forward to
//! [`OutputManager::on_uart_interrupt`] and [`OutputManager::on_rmt_interrupt`].
//! In firmware the manager sits in a `critical_section::Mutex` so both paths
//! see it exclusively.

use embassy_time::{Duration, Instant};

use crate::config::{OutputType, PortConfig};
use crate::error::{ConfigOutcome, InitError};
use crate::frame_scheduler::RefreshTimer;
use crate::hal::{Board, RmtInterrupts};
use crate::protocol::{self, FrameTiming};
use crate::source::{FrameSource, SourceSlot};
use crate::status::PortStatus;
use crate::transport::{IsrOutcome, Transport};

/// One output port: its renderer, its peripheral and its pacing.
pub struct OutputPort<B: Board> {
    config: PortConfig,
    source: Option<SourceSlot>,
    transport: Transport<B>,
    timer: RefreshTimer,
    timing: FrameTiming,
    buffer_start: usize,
    buffer_len: usize,
    continuous: bool,
}

impl<B: Board> OutputPort<B> {
    fn new(transport: Transport<B>) -> Self {
        Self {
            config: PortConfig::default(),
            source: None,
            transport,
            timer: RefreshTimer::from_micros(0),
            timing: protocol::frame_timing(OutputType::Disabled, B::TARGET),
            buffer_start: 0,
            buffer_len: 0,
            continuous: false,
        }
    }

    pub const fn output_type(&self) -> OutputType {
        self.config.output_type
    }

    pub const fn transport(&self) -> &Transport<B> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport<B> {
        &mut self.transport
    }

    pub const fn source(&self) -> Option<&SourceSlot> {
        self.source.as_ref()
    }

    fn disable(&mut self) {
        self.transport.end();
        self.source = None;
        self.config.output_type = OutputType::Disabled;
        self.timer.reset();
    }

    fn refresh_frame_duration(&mut self) {
        let us = self
            .source
            .as_ref()
            .map_or(0, |source| self.timing.frame_min_duration_us(source));
        self.timer.set_frame_min_duration(Duration::from_micros(u64::from(us)));
    }

    /// Re-apply the current config with only `available` channels, so the
    /// renderer and [`OutputManager::get_config`] report what fits.
    fn shrink_to(&mut self, available: usize) -> usize {
        let Some(source) = self.source.as_mut() else {
            return 0;
        };
        let (applied, _) = protocol::configure(source, &self.config, available);
        self.config = applied;
        self.refresh_frame_duration();
        self.source.as_ref().map_or(0, SourceSlot::num_buffer_bytes_needed)
    }

    fn frame_min_duration_us(&self) -> u32 {
        u32::try_from(self.timer.frame_min_duration().as_micros()).unwrap_or(u32::MAX)
    }
}

/// Owner of the channel buffer and the output ports.
pub struct OutputManager<B: Board, const BUF: usize, const PORTS: usize> {
    buffer: [u8; BUF],
    ports: [OutputPort<B>; PORTS],
    paused: bool,
}

impl<B: Board, const BUF: usize, const PORTS: usize> OutputManager<B, BUF, PORTS> {
    /// Create a manager with every port disabled.
    pub fn new(transports: [Transport<B>; PORTS]) -> Self {
        Self {
            buffer: [0; BUF],
            ports: transports.map(OutputPort::new),
            paused: false,
        }
    }

    pub const fn port_count(&self) -> usize {
        PORTS
    }

    pub fn port(&self, index: usize) -> Option<&OutputPort<B>> {
        self.ports.get(index)
    }

    pub fn port_mut(&mut self, index: usize) -> Option<&mut OutputPort<B>> {
        self.ports.get_mut(index)
    }

    /// Whole channel buffer, for the input layer to fill.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub const fn buffer_size(&self) -> usize {
        BUF
    }

    /// Copy `data` into the buffer at `start`. Returns the bytes copied.
    pub fn write_channel_data(&mut self, start: usize, data: &[u8]) -> usize {
        let Some(window) = self.buffer.get_mut(start..) else {
            return 0;
        };
        let count = window.len().min(data.len());
        window[..count].copy_from_slice(&data[..count]);
        count
    }

    pub fn read_channel_data(&self, start: usize, out: &mut [u8]) -> usize {
        let Some(window) = self.buffer.get(start..) else {
            return 0;
        };
        let count = window.len().min(out.len());
        out[..count].copy_from_slice(&window[..count]);
        count
    }

    /// Copy `data` into one port's slice, `start` relative to that slice.
    pub fn write_port_channel_data(&mut self, index: usize, start: usize, data: &[u8]) -> usize {
        let Some(port) = self.ports.get(index) else {
            return 0;
        };
        let Some(source) = port.source.as_ref() else {
            return 0;
        };
        let slice = port_slice_mut(&mut self.buffer, port.buffer_start, port.buffer_len);
        source.write_channel_data(slice, start, data)
    }

    pub fn read_port_channel_data(&self, index: usize, start: usize, out: &mut [u8]) -> usize {
        let Some(port) = self.ports.get(index) else {
            return 0;
        };
        let Some(source) = port.source.as_ref() else {
            return 0;
        };
        let slice = port_slice(&self.buffer, port.buffer_start, port.buffer_len);
        source.read_channel_data(slice, start, out)
    }

    /// Configure one port.
    ///
    /// Out of range settings are corrected and reported. If the peripheral
    /// cannot be brought up the port is disabled and the error returned.
    /// Geometry changes on a running port take effect at the next frame.
    pub fn set_config(&mut self, index: usize, config: &PortConfig) -> Result<ConfigOutcome, InitError> {
        if index >= PORTS {
            return Err(InitError::NoSuchPort(index));
        }
        let available = BUF.saturating_sub(self.port_start(index));
        let port = &mut self.ports[index];

        if config.output_type == OutputType::Disabled {
            port.disable();
            port.config = PortConfig {
                output_type: OutputType::Disabled,
                ..config.clone()
            };
            self.layout();
            log::info!("port {} disabled", index);
            return Ok(ConfigOutcome::Accepted);
        }

        let same_type = port.config.output_type == config.output_type;
        let mut source = match port.source.take() {
            Some(existing) if same_type => existing,
            _ => match protocol::renderer(config) {
                Some(source) => source,
                None => {
                    port.disable();
                    self.layout();
                    return Err(InitError::Unsupported);
                }
            },
        };

        let (applied, outcome) = protocol::configure(&mut source, config, available);
        let links = protocol::links(config.output_type, B::TARGET, &source);
        if !same_type || !port.transport.matches(&links) {
            source.abort_frame();
            if let Err(err) = port.transport.begin(&links) {
                log::error!("port {} cannot run {}: {}", index, config.output_type.name(), err);
                port.disable();
                self.layout();
                return Err(err);
            }
        }

        port.source = Some(source);
        port.config = applied;
        port.timing = protocol::frame_timing(config.output_type, B::TARGET);
        port.refresh_frame_duration();
        if !same_type {
            port.timer.reset();
        }
        self.layout();

        log::info!(
            "port {} configured as {} ({:?})",
            index,
            config.output_type.name(),
            outcome
        );
        Ok(outcome)
    }

    /// Configuration as applied, including corrections.
    pub fn get_config(&self, index: usize) -> Option<PortConfig> {
        self.ports.get(index).map(|port| port.config.clone())
    }

    /// Restart frames from the interrupt handler as soon as one completes.
    /// Only RMT ports support this: their frames carry their own reset gap.
    pub fn set_continuous(&mut self, index: usize, continuous: bool) {
        if let Some(port) = self.ports.get_mut(index) {
            port.continuous = continuous;
        }
    }

    /// Start a new frame on every port that may refresh.
    ///
    /// Returns the number of frames started.
    pub fn poll(&mut self, now: Instant) -> usize {
        if self.paused {
            return 0;
        }
        let Self { buffer, ports, .. } = self;
        let mut started = 0;
        for port in ports.iter_mut() {
            let Some(source) = port.source.as_mut() else {
                continue;
            };
            if port.transport.is_busy() || !port.timer.can_refresh(now) {
                continue;
            }
            let data = port_slice(buffer, port.buffer_start, port.buffer_len);
            port.timer.mark_frame_start(now);
            port.transport.start_new_frame(source, data);
            started += 1;
            // Staged geometry has just been applied.
            port.refresh_frame_duration();
        }
        started
    }

    /// Top up RMT rings from task context.
    pub fn encode_pending(&mut self) {
        let Self { buffer, ports, .. } = self;
        for port in ports.iter_mut() {
            if let Some(source) = port.source.as_mut() {
                let data = port_slice(buffer, port.buffer_start, port.buffer_len);
                port.transport.encode(source, data);
            }
        }
    }

    /// UART interrupt for port `index`.
    pub fn on_uart_interrupt(&mut self, index: usize) -> IsrOutcome {
        let Self { buffer, ports, .. } = self;
        let Some(port) = ports.get_mut(index) else {
            return IsrOutcome::NotForUs;
        };
        let Some(source) = port.source.as_mut() else {
            return IsrOutcome::NotForUs;
        };
        let data = port_slice(buffer, port.buffer_start, port.buffer_len);
        port.transport.on_uart_interrupt(source, data)
    }

    /// RMT interrupt for port `index`.
    pub fn on_rmt_interrupt(&mut self, index: usize, flags: RmtInterrupts) -> IsrOutcome {
        let paused = self.paused;
        let Self { buffer, ports, .. } = self;
        let Some(port) = ports.get_mut(index) else {
            return IsrOutcome::NotForUs;
        };
        let Some(source) = port.source.as_mut() else {
            return IsrOutcome::NotForUs;
        };
        let data = port_slice(buffer, port.buffer_start, port.buffer_len);
        let outcome = port.transport.on_rmt_interrupt(flags, source, data);
        if outcome == IsrOutcome::FrameComplete && port.continuous && !paused {
            port.transport.start_new_frame(source, data);
        }
        outcome
    }

    /// Mute or resume every port. Takes effect at each port's next interrupt.
    pub fn pause_outputs(&mut self, paused: bool) {
        if self.paused != paused {
            log::info!("outputs {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
        for port in &mut self.ports {
            port.transport.pause(paused);
        }
    }

    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn status(&self, index: usize) -> Option<PortStatus> {
        let port = self.ports.get(index)?;
        Some(PortStatus {
            port: index,
            output_type: port.config.output_type,
            frames: port.transport.frames_started(),
            frame_min_duration_us: port.frame_min_duration_us(),
            buffer_start: port.buffer_start,
            buffer_len: port.buffer_len,
            busy: port.transport.is_busy(),
            paused: self.paused,
            counters: port.transport.counters(),
        })
    }

    fn port_start(&self, index: usize) -> usize {
        self.ports[..index].iter().map(|port| port.buffer_len).sum()
    }

    /// Lay the port slices out back to back in port order. A port that no
    /// longer fits is reconfigured down to the channels left.
    fn layout(&mut self) {
        let mut start = 0;
        for (index, port) in self.ports.iter_mut().enumerate() {
            let mut needed = port.source.as_ref().map_or(0, SourceSlot::num_buffer_bytes_needed);
            let available = BUF.saturating_sub(start);
            if needed > available {
                log::warn!("port {} needs {} channels, {} left", index, needed, available);
                needed = port.shrink_to(available);
            }
            port.buffer_start = start.min(BUF);
            port.buffer_len = needed.min(available);
            start += port.buffer_len;
        }
    }
}

fn port_slice(buffer: &[u8], start: usize, len: usize) -> &[u8] {
    buffer.get(start..start + len).unwrap_or(&[])
}

fn port_slice_mut(buffer: &mut [u8], start: usize, len: usize) -> &mut [u8] {
    buffer.get_mut(start..start + len).unwrap_or(&mut [])
}
