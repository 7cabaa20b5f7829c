//! GECE packet layout.
//!
//! A GECE string takes one 26 bit packet per bulb, `0b00AAAAAA_IIIIIIII_BBBB_GGGG_RRRR`:
//! 6 bit bulb address, 8 bit brightness, then the high nibble of blue, green
//! and red.

use smart_leds::RGB8;

/// Addressable bulbs on one string.
pub const GECE_PIXEL_LIMIT: u16 = 63;

pub const GECE_DEFAULT_BRIGHTNESS: u8 = 0xCC;

pub const GECE_PACKET_BITS: u8 = 26;

/// Wire time of one bit.
pub const GECE_BIT_TIME_US: u32 = 31;

/// Packet plus the mandatory gap before the next one.
pub const GECE_PACKET_TIME_US: u32 = GECE_PACKET_BITS as u32 * GECE_BIT_TIME_US + 90;

const ADDRESS_SHIFT: u32 = 20;
const ADDRESS_MASK: u32 = 0x03F0_0000;
const BRIGHTNESS_SHIFT: u32 = 12;
const BRIGHTNESS_MASK: u32 = 0x000F_F000;
const BLUE_SHIFT: u32 = 8;
const BLUE_MASK: u32 = 0x0000_0F00;
const GREEN_SHIFT: u32 = 4;
const GREEN_MASK: u32 = 0x0000_00F0;
const RED_MASK: u32 = 0x0000_000F;

/// Decoded GECE packet. Colors are 4 bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GecePacket {
    pub address: u8,
    pub brightness: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl GecePacket {
    #[allow(clippy::cast_possible_truncation)]
    pub const fn unpack(bits: u32) -> Self {
        Self {
            address: ((bits & ADDRESS_MASK) >> ADDRESS_SHIFT) as u8,
            brightness: ((bits & BRIGHTNESS_MASK) >> BRIGHTNESS_SHIFT) as u8,
            blue: ((bits & BLUE_MASK) >> BLUE_SHIFT) as u8,
            green: ((bits & GREEN_MASK) >> GREEN_SHIFT) as u8,
            red: (bits & RED_MASK) as u8,
        }
    }
}

/// Pack one bulb update. Each color keeps its high nibble.
pub const fn pack(address: u8, brightness: u8, color: RGB8) -> u32 {
    (((address as u32) << ADDRESS_SHIFT) & ADDRESS_MASK)
        | (((brightness as u32) << BRIGHTNESS_SHIFT) & BRIGHTNESS_MASK)
        | ((((color.b >> 4) as u32) << BLUE_SHIFT) & BLUE_MASK)
        | ((((color.g >> 4) as u32) << GREEN_SHIFT) & GREEN_MASK)
        | (((color.r >> 4) as u32) & RED_MASK)
}
