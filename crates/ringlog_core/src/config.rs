//! Ring configuration.

use crate::error::{CoreError, CoreResult};
use crate::framing::Framing;
use crate::header::HEADER_SIZE;

/// Configuration for opening a ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingConfig {
    /// Total storage budget in bytes, header included.
    pub max_size: u64,

    /// Whether to sync storage after every protocol step (pre-commit,
    /// element write, commit, deletions). Safer but slower.
    pub sync_on_commit: bool,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            max_size: 1024 * 1024, // 1 MiB
            sync_on_commit: false,
        }
    }
}

impl RingConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total storage budget.
    #[must_use]
    pub const fn max_size(mut self, size: u64) -> Self {
        self.max_size = size;
        self
    }

    /// Sets whether to sync storage after every protocol step.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Checks that the budget can hold at least an empty record framed with `F`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the budget is too small or too
    /// large for the header's signed 64-bit offsets.
    pub fn validate<F: Framing>(&self) -> CoreResult<()> {
        if self.max_size > i64::MAX as u64 {
            return Err(CoreError::invalid_config(format!(
                "max_size {} does not fit the header's signed offsets",
                self.max_size
            )));
        }
        let minimum = HEADER_SIZE + F::overhead(0);
        if self.max_size < minimum {
            return Err(CoreError::invalid_config(format!(
                "max_size {} is below the minimum of {minimum} bytes for a {} ring",
                self.max_size,
                F::NAME
            )));
        }
        Ok(())
    }
}
