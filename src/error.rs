use thiserror::Error;

/// Result of applying a configuration.
///
/// Out of range values never fail a configuration, they are clamped to a safe
/// value and reported as [`ConfigOutcome::Corrected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutcome {
    #[default]
    Accepted,
    Corrected,
}

impl ConfigOutcome {
    pub const fn is_corrected(self) -> bool {
        matches!(self, Self::Corrected)
    }

    /// Combine two outcomes, any correction wins.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        if self.is_corrected() || other.is_corrected() {
            Self::Corrected
        } else {
            Self::Accepted
        }
    }

    pub(crate) const fn from_corrected(corrected: bool) -> Self {
        if corrected { Self::Corrected } else { Self::Accepted }
    }
}

/// Failure to bring up a port's peripheral. The port is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("UART driver install failed")]
    Uart,
    #[error("RMT channel install failed")]
    Rmt,
    #[error("SPI bus write failed")]
    Spi,
    #[error("output type is not supported on this port")]
    Unsupported,
    #[error("port {0} does not exist")]
    NoSuchPort(usize),
}
