//! Interrupt routing primitives for `no_std` targets.
//!
//! Interrupt handlers cannot carry a context pointer, so each peripheral
//! family gets a static table indexed by hardware channel. Both types here
//! are built on `critical-section` and are safe to share between the main
//! loop and interrupt handlers.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

/// Returned when a channel index is outside the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOutOfRange<T>(pub T);

/// Static table mapping a hardware channel to whatever its handler needs.
///
/// ```ignore
/// static UART_PORTS: PortTable<usize, 3> = PortTable::new();
///
/// UART_PORTS.install(1, 0).ok();
///
/// // In the UART1 interrupt:
/// if let Some(port) = UART_PORTS.get(1) {
///     critical_section::with(|cs| {
///         if let Some(manager) = MANAGER.borrow_ref_mut(cs).as_mut() {
///             manager.on_uart_interrupt(port);
///         }
///     });
/// }
/// ```
pub struct PortTable<T, const N: usize> {
    slots: Mutex<RefCell<[Option<T>; N]>>,
}

impl<T, const N: usize> PortTable<T, N> {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new([const { None }; N])),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bind `value` to `channel`, returning the previous binding.
    pub fn install(&self, channel: usize, value: T) -> Result<Option<T>, SlotOutOfRange<T>> {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            match slots.get_mut(channel) {
                Some(slot) => Ok(slot.replace(value)),
                None => Err(SlotOutOfRange(value)),
            }
        })
    }

    pub fn remove(&self, channel: usize) -> Option<T> {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            slots.get_mut(channel).and_then(Option::take)
        })
    }

    /// Run `f` on the value bound to `channel`, if any.
    pub fn with<R>(&self, channel: usize, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            slots.get_mut(channel).and_then(Option::as_mut).map(f)
        })
    }
}

impl<T: Copy, const N: usize> PortTable<T, N> {
    pub fn get(&self, channel: usize) -> Option<T> {
        critical_section::with(|cs| self.slots.borrow_ref(cs).get(channel).copied().flatten())
    }
}

impl<T, const N: usize> Default for PortTable<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ports whose frame completed in interrupt context, drained by the main loop.
///
/// A port is queued at most once, so the queue never needs to be deeper than
/// the number of ports.
pub struct FrameDoneQueue<const N: usize> {
    inner: Mutex<RefCell<Deque<usize, N>>>,
}

impl<const N: usize> FrameDoneQueue<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Record that `port` finished a frame. Returns `false` if it could not
    /// be queued.
    pub fn notify(&self, port: usize) -> bool {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow_ref_mut(cs);
            if queue.iter().any(|&queued| queued == port) {
                return true;
            }
            queue.push_back(port).is_ok()
        })
    }

    pub fn take(&self) -> Option<usize> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_empty())
    }
}

impl<const N: usize> Default for FrameDoneQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
