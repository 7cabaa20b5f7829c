//! Protocol timing profiles.
//!
//! Pure per-chipset data: bit shapes in nanoseconds, reset/idle gaps and
//! frame framing counts. Transports turn a profile into UART translation
//! tables or RMT waveform items.

use crate::hal::{RmtItem, RmtSymbol};
use crate::tls3001::{TLS3001_BIT_TIME_NS, TLS3001_IDLE_US, TLS3001_INTENSITY_BITS, TLS3001_START_BITS};

/// RMT source clock (APB).
pub const RMT_CLOCK_HZ: u32 = 80_000_000;

/// Default RMT clock divider, giving a 25 ns tick.
pub const RMT_DEFAULT_CLOCK_DIVIDER: u8 = 2;

/// Longest duration a single RMT item half can hold.
pub const RMT_MAX_ITEM_TICKS: u16 = 0x7FFF;

/// Order in which the bits of one intensity value go on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDirection {
    #[default]
    MsbFirst,
    LsbFirst,
}

/// Chip family the firmware runs on.
///
/// WS2811 timings are calibrated per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Esp32,
    Esp8266,
}

/// Timing description of one pixel/serial protocol.
///
/// `bit*_high_ns` / `bit*_low_ns` are literal line levels. `lead_high` tells
/// which of the two comes first inside a bit cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingProfile {
    pub bit0_high_ns: u32,
    pub bit0_low_ns: u32,
    pub bit1_high_ns: u32,
    pub bit1_low_ns: u32,
    /// Level of the first half of every bit cell.
    pub lead_high: bool,
    /// Line level between frames.
    pub idle_high: bool,
    /// Reset / inter-frame gap.
    pub idle_us: u32,
    pub idle_bits: u8,
    pub start_bits: u8,
    pub start_bit_ns: u32,
    pub stop_bits: u8,
    pub stop_bit_ns: u32,
    /// Bits per intensity value on the wire (8, 13, 16 or 26).
    pub data_width: u8,
    pub direction: BitDirection,
}

impl TimingProfile {
    /// Shape shared by every NRZ "one wire" pixel chip.
    pub const fn nrz(bit0_high_ns: u32, bit0_low_ns: u32, bit1_high_ns: u32, bit1_low_ns: u32, idle_us: u32) -> Self {
        Self {
            bit0_high_ns,
            bit0_low_ns,
            bit1_high_ns,
            bit1_low_ns,
            lead_high: true,
            idle_high: false,
            idle_us,
            idle_bits: 1,
            start_bits: 0,
            start_bit_ns: 0,
            stop_bits: 0,
            stop_bit_ns: 0,
            data_width: 8,
            direction: BitDirection::MsbFirst,
        }
    }

    #[must_use]
    pub const fn with_data_width(mut self, width: u8) -> Self {
        self.data_width = width;
        self
    }

    /// Duration of one data bit cell.
    pub const fn bit_time_ns(&self) -> u32 {
        self.bit0_high_ns + self.bit0_low_ns
    }

    /// Minimum time one frame occupies the wire, in microseconds.
    ///
    /// `intensities` counts every value sent (pixels, padding and preamble).
    pub const fn frame_min_duration_us(&self, intensities: u32) -> u32 {
        let total_bits = intensities as u64 * self.data_width as u64;
        let data_us = (total_bits * self.bit_time_ns() as u64).div_ceil(1000);
        let start_us = (self.start_bits as u64 * self.start_bit_ns as u64).div_ceil(1000);
        #[allow(clippy::cast_possible_truncation)]
        let total = (data_us + start_us + self.idle_us as u64) as u32;
        total
    }

    /// Build the RMT symbol table for this profile.
    pub fn rmt_table(&self, clock_divider: u8) -> [RmtItem; RmtSymbol::COUNT] {
        let tick_ns = rmt_tick_ns(clock_divider);
        let lead = self.lead_high;
        let idle = self.idle_high;

        let split = |ns: u32, level: bool| {
            let half = ns_to_ticks(ns / 2, tick_ns).max(1);
            RmtItem::new(half, level, half, level)
        };
        // A zero-length half would terminate the RMT item list, so single
        // level cells (serial lines) are split evenly instead.
        let bit = |high_ns: u32, low_ns: u32| {
            if high_ns == 0 || low_ns == 0 {
                return split(high_ns + low_ns, high_ns != 0);
            }
            let (first_ns, second_ns) = if lead { (high_ns, low_ns) } else { (low_ns, high_ns) };
            RmtItem::new(ns_to_ticks(first_ns, tick_ns), lead, ns_to_ticks(second_ns, tick_ns), !lead)
        };
        let zero = bit(self.bit0_high_ns, self.bit0_low_ns);
        let one = bit(self.bit1_high_ns, self.bit1_low_ns);

        let gap_ticks = u64::from(self.idle_us) * 1000 / u64::from(tick_ns);
        let per_half = gap_ticks / (2 * u64::from(self.idle_bits.max(1)));
        #[allow(clippy::cast_possible_truncation)]
        let gap_half = per_half.clamp(1, u64::from(RMT_MAX_ITEM_TICKS)) as u16;
        let gap = RmtItem::new(gap_half, idle, gap_half, idle);

        let start = if self.start_bit_ns == 0 {
            RmtItem::new(2, !idle, 2, !idle)
        } else {
            split(self.start_bit_ns, !idle)
        };
        let stop = if self.stop_bit_ns == 0 {
            RmtItem::new(2, idle, 2, idle)
        } else {
            split(self.stop_bit_ns, idle)
        };
        let end_of_frame = RmtItem::new(2, idle, 2, idle);

        // Two/Three are only meaningful for two-bit-per-item encodings; the
        // single-bit profiles mirror Zero/One into them.
        [zero, one, zero, one, gap, start, stop, end_of_frame]
    }
}

/// Tick length for the given divider of the 80 MHz RMT clock.
pub const fn rmt_tick_ns(clock_divider: u8) -> u32 {
    let divider = if clock_divider == 0 { 1 } else { clock_divider as u32 };
    1_000_000_000 / (RMT_CLOCK_HZ / divider)
}

#[allow(clippy::cast_possible_truncation)]
fn ns_to_ticks(ns: u32, tick_ns: u32) -> u16 {
    let ticks = ns.div_ceil(tick_ns.max(1));
    ticks.min(u32::from(RMT_MAX_ITEM_TICKS)) as u16
}

/// WS2811 timings tuned against real ESP32 output. These deliberately differ
/// from the datasheet.
pub const WS2811_ESP32: TimingProfile = TimingProfile::nrz(300, 950, 950, 300, 350);

/// WS2811 timings for the ESP8266 UART path.
pub const WS2811_ESP8266: TimingProfile = TimingProfile::nrz(312, 938, 975, 275, 350);

pub const UCS1903: TimingProfile = TimingProfile::nrz(250, 1000, 1000, 250, 25);

pub const GS8208: TimingProfile = TimingProfile::nrz(250, 750, 750, 250, 300);

pub const UCS8903: TimingProfile = TimingProfile::nrz(400, 800, 800, 400, 30).with_data_width(16);

/// TM1814 idles high and starts every bit low.
pub const TM1814: TimingProfile = TimingProfile {
    bit0_high_ns: 875,
    bit0_low_ns: 375,
    bit1_high_ns: 450,
    bit1_low_ns: 800,
    lead_high: false,
    idle_high: true,
    idle_us: 500,
    idle_bits: 1,
    start_bits: 0,
    start_bit_ns: 0,
    stop_bits: 0,
    stop_bit_ns: 0,
    data_width: 8,
    direction: BitDirection::MsbFirst,
};

/// GECE: 26 bit packets, ~31 us per bit, 8 us start pulse, >= 45 us stop.
pub const GECE: TimingProfile = TimingProfile {
    bit0_high_ns: 25_000,
    bit0_low_ns: 6_000,
    bit1_high_ns: 6_000,
    bit1_low_ns: 25_000,
    lead_high: false,
    idle_high: false,
    idle_us: 90,
    idle_bits: 1,
    start_bits: 1,
    start_bit_ns: 8_000,
    stop_bits: 1,
    stop_bit_ns: 45_000,
    data_width: 26,
    direction: BitDirection::MsbFirst,
};

/// TLS3001: Manchester cells, one half per level, 15 start bits per frame.
pub const TLS3001: TimingProfile = TimingProfile {
    bit0_high_ns: TLS3001_BIT_TIME_NS / 2,
    bit0_low_ns: TLS3001_BIT_TIME_NS / 2,
    bit1_high_ns: TLS3001_BIT_TIME_NS / 2,
    bit1_low_ns: TLS3001_BIT_TIME_NS / 2,
    lead_high: true,
    idle_high: false,
    idle_us: TLS3001_IDLE_US,
    idle_bits: 0,
    start_bits: TLS3001_START_BITS,
    start_bit_ns: TLS3001_BIT_TIME_NS,
    stop_bits: 0,
    stop_bit_ns: 0,
    data_width: TLS3001_INTENSITY_BITS,
    direction: BitDirection::MsbFirst,
};

/// WS2811 profile for the given target.
pub const fn ws2811(target: Target) -> TimingProfile {
    match target {
        Target::Esp32 => WS2811_ESP32,
        Target::Esp8266 => WS2811_ESP8266,
    }
}

/// Asynchronous serial line described as an RMT profile: start bit low,
/// `data_bits` LSB first, `stop_bits` high.
pub const fn serial_line(baudrate: u32, stop_bits: u8) -> TimingProfile {
    let bit_ns = 1_000_000_000 / if baudrate == 0 { 1 } else { baudrate };
    TimingProfile {
        bit0_high_ns: 0,
        bit0_low_ns: bit_ns,
        bit1_high_ns: bit_ns,
        bit1_low_ns: 0,
        lead_high: true,
        idle_high: true,
        idle_us: 0,
        idle_bits: 0,
        start_bits: 1,
        start_bit_ns: bit_ns,
        stop_bits,
        stop_bit_ns: bit_ns,
        data_width: 8,
        direction: BitDirection::LsbFirst,
    }
}
