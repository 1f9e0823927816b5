//! Device collaborators consumed by the protocol.
//!
//! The protocol never talks to hardware directly. Everything it needs from
//! the device is one of four capabilities, injected as a single value
//! implementing [`Device`]:
//!
//! - [`SecureSession`]: is an authenticated session up?
//! - [`EntropySource`]: the device RNG, used once per enrollment
//! - [`SlotStore`]: one persistent slot holding the record
//! - [`DestructiveOracle`]: the Mac-and-Destroy slots
//!
//! Implementations are expected to be driven by one caller at a time.
//! Mutual exclusion is the integrator's job (typically one session per device).

use std::time::Duration;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::DeviceError;
use crate::kdf::KEY_LEN;

/// Secure-session precondition.
pub trait SecureSession {
    /// Returns `true` when an authenticated session with the device is open.
    fn is_session_active(&self) -> bool;
}

/// Source of cryptographically secure random bytes.
pub trait EntropySource {
    /// Fill `buf` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the source cannot deliver.
    fn fill_random(&mut self, buf: &mut [u8]) -> Result<(), DeviceError>;
}

/// Persistent storage addressed by slot number.
///
/// `erase` and `write` are separate, non-atomic operations. After a power
/// loss between the two, [`SlotStore::read`] returns `Ok(None)`.
pub trait SlotStore {
    /// Erase the slot. Erasing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the erase did not complete.
    fn erase(&mut self, slot: u16) -> Result<(), DeviceError>;

    /// Write `data` into an erased slot.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the write did not complete.
    fn write(&mut self, slot: u16, data: &[u8]) -> Result<(), DeviceError>;

    /// Read the slot contents, `None` if the slot is erased.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the read failed.
    fn read(&mut self, slot: u16) -> Result<Option<Vec<u8>>, DeviceError>;

    /// Pause between storage operations to let the transport settle.
    fn settle(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// The hardware destructive-transform oracle.
///
/// Each call irreversibly replaces the slot's internal state with one that
/// depends only on `input`, and returns a value depending on both the previous
/// state and `input`. Calling it with `u` arms a slot; a later call with `v`
/// returns `w(u, v)` and leaves the slot armed with `v` instead.
pub trait DestructiveOracle {
    /// Run one Mac-and-Destroy call on `slot`.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the call failed. The slot state is then
    /// unknown.
    fn mac_and_destroy(
        &mut self,
        slot: u8,
        input: &[u8; KEY_LEN],
    ) -> Result<[u8; KEY_LEN], DeviceError>;
}

/// Everything the protocol needs from a device.
pub trait Device: SecureSession + EntropySource + SlotStore + DestructiveOracle {}

impl<T> Device for T where T: SecureSession + EntropySource + SlotStore + DestructiveOracle {}

/// [`EntropySource`] backed by the operating system CSPRNG.
///
/// For hosts where the secure element's own RNG is not exposed; combine with
/// the other capabilities in the integrator's device type.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_random(&mut self, buf: &mut [u8]) -> Result<(), DeviceError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| DeviceError::new(format!("CSPRNG fill failed: {e}")))
    }
}
