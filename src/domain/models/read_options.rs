use std::time::Duration;

use crate::domain::errors::ValidationError;

/// Retry policy for a streaming read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    tries: u32,
    try_freq: Duration,
}

impl ReadOptions {
    pub const DEFAULT_TRIES: u32 = 3;
    pub const DEFAULT_TRY_FREQ: Duration = Duration::from_millis(1000);

    /// `tries` counts total backend attempts and must be at least 1.
    pub fn new(tries: u32, try_freq: Duration) -> Result<Self, ValidationError> {
        if tries == 0 {
            return Err(ValidationError::ZeroTries);
        }
        Ok(Self { tries, try_freq })
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Delay between a failed attempt and the next one
    pub fn try_freq(&self) -> Duration {
        self.try_freq
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            tries: Self::DEFAULT_TRIES,
            try_freq: Self::DEFAULT_TRY_FREQ,
        }
    }
}
