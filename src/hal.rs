//! Hardware abstraction for the output peripherals.
//!
//! Transports only talk to these traits, so all encoding and framing logic
//! runs unchanged on the host against a fake implementation.

use embedded_hal::spi::SpiBus;

use crate::timing::Target;

/// UART frame format. The data bits are what the bit serializer shapes, the
/// start and stop bits become part of the waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UartDataSize {
    Data5N1,
    Data5N2,
    Data6N1,
    Data6N2,
    Data7N1,
    Data7N2,
    #[default]
    Data8N1,
    Data8N2,
}

impl UartDataSize {
    pub const fn data_bits(self) -> u8 {
        match self {
            Self::Data5N1 | Self::Data5N2 => 5,
            Self::Data6N1 | Self::Data6N2 => 6,
            Self::Data7N1 | Self::Data7N2 => 7,
            Self::Data8N1 | Self::Data8N2 => 8,
        }
    }

    pub const fn stop_bits(self) -> u8 {
        match self {
            Self::Data5N1 | Self::Data6N1 | Self::Data7N1 | Self::Data8N1 => 1,
            Self::Data5N2 | Self::Data6N2 | Self::Data7N2 | Self::Data8N2 => 2,
        }
    }

    /// Line bits per UART character, start bit included.
    pub const fn frame_bits(self) -> u8 {
        1 + self.data_bits() + self.stop_bits()
    }
}

/// Line settings handed to [`UartHal::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartSettings {
    pub baudrate: u32,
    pub data_size: UartDataSize,
    pub invert_tx: bool,
    /// TX-empty interrupt fires when the FIFO drains below this many bytes.
    pub fifo_trigger_level: u8,
}

/// A UART used as a transmit-only serializer.
pub trait UartHal {
    type Error: core::fmt::Debug;

    /// Apply line settings and install the interrupt route.
    fn configure(&mut self, settings: &UartSettings) -> Result<(), Self::Error>;

    /// Hardware TX FIFO depth in bytes.
    fn fifo_capacity(&self) -> usize {
        128
    }

    /// Bytes currently queued in the TX FIFO.
    fn fifo_len(&self) -> usize;

    /// Queue one byte. Only called while the FIFO has room.
    fn write_fifo(&mut self, byte: u8);

    /// Enable or mask the TX-empty interrupt.
    fn set_tx_interrupt(&mut self, enabled: bool);

    /// Whether the TX-empty interrupt is raised for this UART.
    fn tx_interrupt_pending(&self) -> bool;

    /// Acknowledge every pending UART interrupt.
    fn clear_interrupts(&mut self);

    /// Wait for the FIFO to drain, drive the line to break for `break_us`,
    /// then mark for `mab_us`.
    fn send_break(&mut self, break_us: u32, mab_us: u32);
}

/// One RMT memory word: two (duration, level) halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RmtItem {
    pub duration0: u16,
    pub level0: bool,
    pub duration1: u16,
    pub level1: bool,
}

impl RmtItem {
    /// All-zero item, stops the transmitter.
    pub const END: Self = Self::new(0, false, 0, false);

    pub const fn new(duration0: u16, level0: bool, duration1: u16, level1: bool) -> Self {
        Self {
            duration0: duration0 & 0x7FFF,
            level0,
            duration1: duration1 & 0x7FFF,
            level1,
        }
    }

    /// Packed hardware representation.
    pub const fn to_bits(self) -> u32 {
        (self.duration0 as u32)
            | ((self.level0 as u32) << 15)
            | ((self.duration1 as u32) << 16)
            | ((self.level1 as u32) << 31)
    }

    pub const fn is_end(self) -> bool {
        self.duration0 == 0 || self.duration1 == 0
    }
}

/// Index into an RMT symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RmtSymbol {
    Zero = 0,
    One = 1,
    Two = 2,
    Three = 3,
    InterFrameGap = 4,
    StartBit = 5,
    StopBit = 6,
    EndOfFrame = 7,
}

impl RmtSymbol {
    pub const COUNT: usize = 8;

    /// Data symbol for the low bits of `value`.
    pub const fn data(value: u32) -> Self {
        match value & 0b11 {
            0 => Self::Zero,
            1 => Self::One,
            2 => Self::Two,
            _ => Self::Three,
        }
    }
}

/// Interrupt causes reported to the RMT handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RmtInterrupts {
    /// Transmitter crossed the memory threshold.
    pub threshold: bool,
    /// Transmitter reached an end item.
    pub tx_end: bool,
}

/// One ESP32 RMT channel in transmit mode.
pub trait RmtHal {
    type Error: core::fmt::Debug;

    /// Set clock divider and idle level, install the channel interrupt.
    fn configure(&mut self, clock_divider: u8, idle_high: bool) -> Result<(), Self::Error>;

    /// Channel memory size in items.
    fn memory_len(&self) -> usize {
        64
    }

    /// Store `item` at `offset` in channel memory.
    fn write_memory(&mut self, offset: usize, item: RmtItem);

    /// Raise the threshold interrupt after every `items` items sent.
    fn set_threshold(&mut self, items: usize);

    /// Enable or mask both threshold and end interrupts.
    fn set_interrupts(&mut self, enabled: bool);

    fn clear_interrupts(&mut self, flags: RmtInterrupts);

    /// Start transmitting from the beginning of channel memory.
    fn start_tx(&mut self);
}

/// Peripheral types a board wires to output ports.
pub trait Board {
    /// Chip family, selects target specific timing calibration.
    const TARGET: Target = Target::Esp32;

    type Uart: UartHal;
    type Rmt: RmtHal;
    type Spi: SpiBus<u8>;
}
