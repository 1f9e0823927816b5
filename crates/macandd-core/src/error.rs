//! Error types for `macandd-core`.

use thiserror::Error;

/// Failure reported by a device collaborator (slot store, oracle, RNG).
///
/// Collaborators only describe what went wrong; the protocol decides which
/// [`PinError`] variant the failure maps to, based on the step it was in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DeviceError(pub String);

impl DeviceError {
    /// Build a device error from anything printable.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Errors produced by the PIN set/check protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinError {
    /// PIN length outside `PIN_LEN_MIN..=PIN_LEN_MAX`.
    #[error("invalid PIN length: {len} bytes (expected 4..=8)")]
    InvalidPinLength {
        /// Length of the rejected PIN.
        len: usize,
    },

    /// Additional data longer than `ADD_LEN_MAX`.
    #[error("invalid additional data length: {len} bytes (maximum 128)")]
    InvalidAdditionalDataLength {
        /// Length of the rejected additional data.
        len: usize,
    },

    /// No authenticated secure session with the device.
    #[error("no secure session with the device")]
    NoSession,

    /// Random source failed while drawing the enrollment secret.
    #[error("random source failure: {0}")]
    Random(String),

    /// Persistent slot store failed (erase, write or read).
    #[error("storage failure: {0}")]
    Storage(String),

    /// Destructive-transform oracle call failed.
    #[error("oracle failure on slot {slot}: {reason}")]
    Oracle {
        /// Oracle slot the failing call targeted.
        slot: u8,
        /// Collaborator-supplied description.
        reason: String,
    },

    /// The record slot is empty: no PIN has been set.
    #[error("no PIN enrolled")]
    NotEnrolled,

    /// The persisted record is malformed (length or counter out of range).
    #[error("corrupt authentication record: {0}")]
    CorruptRecord(String),

    /// Decrypted secret failed tag validation: wrong PIN or additional data.
    #[error("PIN rejected: {attempts_remaining} attempts remaining")]
    TagMismatch {
        /// Attempts left after this one was consumed.
        attempts_remaining: u8,
    },

    /// No attempts remain; the secret is unrecoverable.
    #[error("PIN locked: no attempts remaining")]
    Locked,

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PinError {
    /// Returns `true` for errors raised before any side effect, which the
    /// caller can fix and retry without losing anything.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidPinLength { .. } | Self::InvalidAdditionalDataLength { .. } | Self::NoSession
        )
    }

    /// Returns `true` when the failed call may have spent an attempt or left
    /// oracle slots out of step with the persisted record.
    ///
    /// Collaborator failures are never rolled back, so the caller has to
    /// assume the worst and re-read the attempt counter.
    #[must_use]
    pub const fn may_have_consumed_attempt(&self) -> bool {
        matches!(
            self,
            Self::TagMismatch { .. } | Self::Storage(_) | Self::Oracle { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_errors_are_retryable() {
        assert!(PinError::InvalidPinLength { len: 3 }.is_retryable());
        assert!(PinError::InvalidAdditionalDataLength { len: 129 }.is_retryable());
        assert!(PinError::NoSession.is_retryable());
        assert!(!PinError::Locked.is_retryable());
        assert!(!PinError::TagMismatch { attempts_remaining: 3 }.is_retryable());
    }

    #[test]
    fn collaborator_and_validation_failures_may_consume() {
        assert!(PinError::TagMismatch { attempts_remaining: 0 }.may_have_consumed_attempt());
        assert!(PinError::Storage("write".into()).may_have_consumed_attempt());
        assert!(PinError::Oracle { slot: 2, reason: "bus".into() }.may_have_consumed_attempt());
        assert!(!PinError::Locked.may_have_consumed_attempt());
        assert!(!PinError::NoSession.may_have_consumed_attempt());
        assert!(!PinError::Random("empty pool".into()).may_have_consumed_attempt());
    }

    #[test]
    fn display_never_mentions_secret_material() {
        let msg = PinError::TagMismatch { attempts_remaining: 7 }.to_string();
        assert_eq!(msg, "PIN rejected: 7 attempts remaining");
    }

    #[test]
    fn device_error_displays_reason() {
        assert_eq!(DeviceError::new("spi timeout").to_string(), "spi timeout");
    }
}
