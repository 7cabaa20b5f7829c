/// Producer of intensity values for one frame.
///
/// Transports pull from a source one value at a time, usually from interrupt
/// context. The channel data is lent on every call; a source never owns it.
pub trait FrameSource {
    /// Begin a new frame. Ignored while the current frame is still sending.
    fn start_new_frame(&mut self);

    /// Whether the current frame has values left.
    fn more_data_to_send(&self) -> bool;

    /// Produce the next value of the frame, `None` once the frame is done.
    fn next_intensity(&mut self, data: &[u8]) -> Option<u32>;

    /// Drop the rest of the current frame, used after a transport underrun.
    fn abort_frame(&mut self);

    /// Bits carried by each value returned from [`FrameSource::next_intensity`].
    fn intensity_width(&self) -> u8 {
        8
    }
}

/// Copy `data` into `buffer[start..len]`, returning the bytes copied.
pub(crate) fn write_window(buffer: &mut [u8], len: usize, start: usize, data: &[u8]) -> usize {
    let end = len.min(buffer.len());
    let Some(window) = buffer.get_mut(start..end) else {
        return 0;
    };
    let count = window.len().min(data.len());
    window[..count].copy_from_slice(&data[..count]);
    count
}

/// Copy `buffer[start..len]` into `out`, returning the bytes copied.
pub(crate) fn read_window(buffer: &[u8], len: usize, start: usize, out: &mut [u8]) -> usize {
    let end = len.min(buffer.len());
    let Some(window) = buffer.get(start..end) else {
        return 0;
    };
    let count = window.len().min(out.len());
    out[..count].copy_from_slice(&window[..count]);
    count
}

/// Renderer bound to a port, dispatched without dynamic calls.
#[derive(Debug, Clone)]
pub enum SourceSlot {
    Pixel(crate::pixel::PixelRenderer),
    Serial(crate::serial::SerialRenderer),
    Grinch(crate::grinch::GrinchRenderer),
}

impl SourceSlot {
    /// Channel bytes this port consumes.
    pub fn num_buffer_bytes_needed(&self) -> usize {
        match self {
            Self::Pixel(pixel) => pixel.num_buffer_bytes_needed(),
            Self::Serial(serial) => serial.num_buffer_bytes_needed(),
            Self::Grinch(grinch) => grinch.num_buffer_bytes_needed(),
        }
    }

    /// Values one frame sends, zero for slot based serial output.
    pub fn frame_intensity_count(&self) -> u32 {
        match self {
            Self::Pixel(pixel) => pixel.frame_intensity_count(),
            Self::Serial(_) => 0,
            Self::Grinch(grinch) => grinch.frame_intensity_count(),
        }
    }

    /// Copy `data` into this port's slice of `buffer` starting at `start`.
    pub fn write_channel_data(&self, buffer: &mut [u8], start: usize, data: &[u8]) -> usize {
        match self {
            Self::Pixel(pixel) => pixel.write_channel_data(buffer, start, data),
            Self::Serial(serial) => serial.write_channel_data(buffer, start, data),
            Self::Grinch(grinch) => grinch.write_channel_data(buffer, start, data),
        }
    }

    pub fn read_channel_data(&self, buffer: &[u8], start: usize, out: &mut [u8]) -> usize {
        match self {
            Self::Pixel(pixel) => pixel.read_channel_data(buffer, start, out),
            Self::Serial(serial) => serial.read_channel_data(buffer, start, out),
            Self::Grinch(grinch) => grinch.read_channel_data(buffer, start, out),
        }
    }

    pub fn in_progress(&self) -> bool {
        match self {
            Self::Pixel(pixel) => pixel.state().in_progress(),
            Self::Serial(serial) => serial.state().in_progress(),
            Self::Grinch(grinch) => grinch.state().in_progress(),
        }
    }
}

impl FrameSource for SourceSlot {
    fn start_new_frame(&mut self) {
        match self {
            Self::Pixel(pixel) => pixel.start_new_frame(),
            Self::Serial(serial) => serial.start_new_frame(),
            Self::Grinch(grinch) => grinch.start_new_frame(),
        }
    }

    fn more_data_to_send(&self) -> bool {
        match self {
            Self::Pixel(pixel) => pixel.more_data_to_send(),
            Self::Serial(serial) => serial.more_data_to_send(),
            Self::Grinch(grinch) => grinch.more_data_to_send(),
        }
    }

    fn next_intensity(&mut self, data: &[u8]) -> Option<u32> {
        match self {
            Self::Pixel(pixel) => pixel.next_intensity(data),
            Self::Serial(serial) => serial.next_intensity(data),
            Self::Grinch(grinch) => grinch.next_intensity(data),
        }
    }

    fn abort_frame(&mut self) {
        match self {
            Self::Pixel(pixel) => pixel.abort_frame(),
            Self::Serial(serial) => serial.abort_frame(),
            Self::Grinch(grinch) => grinch.abort_frame(),
        }
    }

    fn intensity_width(&self) -> u8 {
        match self {
            Self::Pixel(pixel) => pixel.intensity_width(),
            Self::Serial(serial) => serial.intensity_width(),
            Self::Grinch(grinch) => grinch.intensity_width(),
        }
    }
}
