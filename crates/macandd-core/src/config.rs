//! Protocol configuration.
//!
//! Non-secret, deployment-specific settings. Every field has a default, so an
//! empty JSON object is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PinError;

/// Highest user-memory slot number on the device.
pub const MAX_NVM_SLOT: u16 = 511;

/// Upper bound on the settle delay, in milliseconds.
pub const MAX_SETTLE_DELAY_MS: u64 = 10_000;

/// Settings for a [`crate::MacAndDestroy`] instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MacAndDestroyConfig {
    /// User-memory slot reserved for the authentication record.
    #[serde(default = "default_nvm_slot")]
    pub nvm_slot: u16,

    /// Pause before and after each persistent write, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for MacAndDestroyConfig {
    fn default() -> Self {
        Self {
            nvm_slot: default_nvm_slot(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

const fn default_nvm_slot() -> u16 {
    MAX_NVM_SLOT
}
const fn default_settle_delay_ms() -> u64 {
    50
}

impl MacAndDestroyConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Config`] on malformed JSON or out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, PinError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PinError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), PinError> {
        if self.nvm_slot > MAX_NVM_SLOT {
            return Err(PinError::Config(format!(
                "nvmSlot {} out of range (0..={MAX_NVM_SLOT})",
                self.nvm_slot
            )));
        }
        if self.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(PinError::Config(format!(
                "settleDelayMs {} exceeds {MAX_SETTLE_DELAY_MS}",
                self.settle_delay_ms
            )));
        }
        Ok(())
    }

    /// The settle delay as a [`Duration`].
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
