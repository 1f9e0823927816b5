//! PIN set (enrollment) and PIN check (verification).
//!
//! # Attempt accounting
//!
//! The record's counter is the number of attempts left. Check decrements it
//! and persists the decremented record *before* touching the oracle, so
//! cutting power mid-check can never hand an attempt back. The slot probed is
//! the one at the decremented counter value: the first check after a reset
//! probes round `ROUNDS-1`, the next failed one `ROUNDS-2`, and so on down to
//! round 0. Each failed probe destroys its slot; a successful check re-arms
//! every slot from the probed one up to `ROUNDS-1` and restores the counter.
//!
//! # Secret handling
//!
//! The caller's output buffer is zeroed on entry and written only on full
//! success. Every intermediate (`s`, `u`, `v`, `w`, `k`, `PIN || add`) lives in
//! a zeroize-on-drop buffer, so all exit paths wipe them.

use crate::cipher::{RoundCipher, XorCipher};
use crate::config::MacAndDestroyConfig;
use crate::device::Device;
use crate::error::{DeviceError, PinError};
use crate::kdf::{self, HmacSha256, KdfInput, KeyedPrf, KEY_LEN};
use crate::memory::SecretBytes;
use crate::record::{AuthRecord, DEFAULT_ROUNDS};
use crate::rounds;

/// Mac-and-Destroy PIN protocol bound to one device and one record slot.
///
/// `ROUNDS` is the attempt budget and the number of oracle slots used
/// (slots `0..ROUNDS`). It is fixed at compile time and must be `1..=12`.
pub struct MacAndDestroy<D, P = HmacSha256, C = XorCipher, const ROUNDS: usize = DEFAULT_ROUNDS> {
    device: D,
    config: MacAndDestroyConfig,
    prf: P,
    cipher: C,
}

impl<D: Device> MacAndDestroy<D> {
    /// Create a protocol instance with HMAC-SHA256, XOR rounds and 12 attempts.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Config`] if `config` fails validation.
    pub fn new(device: D, config: MacAndDestroyConfig) -> Result<Self, PinError> {
        Self::with_primitives(device, config, HmacSha256, XorCipher)
    }
}

impl<D, P, C, const ROUNDS: usize> MacAndDestroy<D, P, C, ROUNDS>
where
    D: Device,
    P: KeyedPrf,
    C: RoundCipher,
{
    /// Create a protocol instance with explicit primitives.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Config`] if `config` fails validation.
    pub fn with_primitives(
        device: D,
        config: MacAndDestroyConfig,
        prf: P,
        cipher: C,
    ) -> Result<Self, PinError> {
        config.validate()?;
        Ok(Self {
            device,
            config,
            prf,
            cipher,
        })
    }

    /// Enroll `pin` and return the released secret.
    ///
    /// # Errors
    ///
    /// See [`Self::set_into`].
    pub fn set(&mut self, pin: &[u8], add: &[u8]) -> Result<SecretBytes<KEY_LEN>, PinError> {
        let mut secret = SecretBytes::zeroed();
        self.set_into(pin, add, secret.expose_mut())?;
        Ok(secret)
    }

    /// Enroll `pin` with a fresh random secret, writing the released secret
    /// into `secret`.
    ///
    /// Erases and rewrites the record slot and runs three oracle calls on
    /// each of the `ROUNDS` slots.
    ///
    /// # Errors
    ///
    /// - [`PinError::InvalidPinLength`] / [`PinError::InvalidAdditionalDataLength`]
    ///   and [`PinError::NoSession`] before any side effect.
    /// - [`PinError::Random`], [`PinError::Storage`], [`PinError::Oracle`] if a
    ///   collaborator fails. The record may then be erased and some oracle
    ///   slots re-keyed; run Set again.
    pub fn set_into(
        &mut self,
        pin: &[u8],
        add: &[u8],
        secret: &mut [u8; KEY_LEN],
    ) -> Result<(), PinError> {
        secret.fill(0);
        let input = KdfInput::new(pin, add)?;
        self.require_session()?;

        let mut s = SecretBytes::<KEY_LEN>::zeroed();
        self.device.fill_random(s.expose_mut()).map_err(|e| {
            tracing::warn!(error = %e, "random source failed during PIN set");
            PinError::Random(e.to_string())
        })?;

        let mut record = AuthRecord::<ROUNDS>::new();
        record.tag = kdf::derive_tag(&self.prf, s.expose());
        let u = kdf::derive_arm(&self.prf, s.expose());
        let v = kdf::derive_probe(&self.prf, &input);

        self.erase_record()?;

        for round in 0..AuthRecord::<ROUNDS>::FULL_ATTEMPTS {
            let w = rounds::enroll_round(&mut self.device, round, &u, &v)?;
            let k = kdf::derive_round_key(&self.prf, &w, &input);
            record.ciphertexts[usize::from(round)] = self.cipher.seal(&k, s.expose());
        }

        record.attempts_remaining = AuthRecord::<ROUNDS>::FULL_ATTEMPTS;
        self.settle();
        self.write_record(&record)?;
        self.settle();

        kdf::derive_release_into(&self.prf, s.expose(), secret);
        tracing::info!(nvm_slot = self.config.nvm_slot, rounds = ROUNDS, "PIN set");
        Ok(())
    }

    /// Verify `pin` and return the released secret.
    ///
    /// # Errors
    ///
    /// See [`Self::check_into`].
    pub fn check(&mut self, pin: &[u8], add: &[u8]) -> Result<SecretBytes<KEY_LEN>, PinError> {
        let mut secret = SecretBytes::zeroed();
        self.check_into(pin, add, secret.expose_mut())?;
        Ok(secret)
    }

    /// Spend one attempt verifying `pin`, writing the released secret into
    /// `secret` on success.
    ///
    /// # Errors
    ///
    /// - [`PinError::InvalidPinLength`] / [`PinError::InvalidAdditionalDataLength`]
    ///   and [`PinError::NoSession`] before any side effect.
    /// - [`PinError::NotEnrolled`] / [`PinError::CorruptRecord`] if the record
    ///   cannot be trusted; nothing is modified.
    /// - [`PinError::Locked`] if no attempts remain; nothing is modified.
    /// - [`PinError::TagMismatch`] for a wrong PIN or additional data. The
    ///   attempt stays spent.
    /// - [`PinError::Storage`] / [`PinError::Oracle`] if a collaborator fails.
    ///   Nothing is rolled back: the attempt may be spent and oracle slots may
    ///   be out of step with the record.
    pub fn check_into(
        &mut self,
        pin: &[u8],
        add: &[u8],
        secret: &mut [u8; KEY_LEN],
    ) -> Result<(), PinError> {
        secret.fill(0);
        let input = KdfInput::new(pin, add)?;
        self.require_session()?;

        let mut record = self.read_record()?;
        let Some(round) = record.attempts_remaining.checked_sub(1) else {
            tracing::warn!(nvm_slot = self.config.nvm_slot, "PIN check refused: locked");
            return Err(PinError::Locked);
        };

        // Spend the attempt durably before the oracle sees the candidate.
        record.attempts_remaining = round;
        self.persist(&record)?;

        let v = kdf::derive_probe(&self.prf, &input);
        let w = rounds::probe(&mut self.device, round, &v)?;
        let k = kdf::derive_round_key(&self.prf, &w, &input);
        let block = record.ciphertext(round).ok_or_else(|| {
            PinError::CorruptRecord(format!("no ciphertext for round {round}"))
        })?;
        let candidate = self.cipher.open(&k, block);
        let candidate_tag = kdf::derive_candidate_tag(&self.prf, candidate.expose());

        if !candidate_tag.ct_eq(&record.tag) {
            tracing::warn!(attempts_remaining = round, "PIN check failed");
            return Err(PinError::TagMismatch {
                attempts_remaining: round,
            });
        }

        let u = kdf::derive_arm(&self.prf, candidate.expose());
        let last = AuthRecord::<ROUNDS>::FULL_ATTEMPTS.saturating_sub(1);
        rounds::rearm(&mut self.device, round..=last, &u)?;

        record.attempts_remaining = AuthRecord::<ROUNDS>::FULL_ATTEMPTS;
        self.persist(&record)?;

        kdf::derive_release_into(&self.prf, candidate.expose(), secret);
        tracing::info!(round, "PIN check succeeded, attempt budget restored");
        Ok(())
    }

    /// Attempts left before lockout, read from the persisted record.
    ///
    /// Read-only: no oracle call and no write.
    ///
    /// # Errors
    ///
    /// [`PinError::NoSession`], [`PinError::Storage`], [`PinError::NotEnrolled`]
    /// or [`PinError::CorruptRecord`].
    pub fn attempts_remaining(&mut self) -> Result<u8, PinError> {
        self.require_session()?;
        Ok(self.read_record()?.attempts_remaining)
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &MacAndDestroyConfig {
        &self.config
    }

    /// Borrow the underlying device.
    #[must_use]
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Mutably borrow the underlying device.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Release the underlying device.
    pub fn into_device(self) -> D {
        self.device
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_session(&self) -> Result<(), PinError> {
        if self.device.is_session_active() {
            Ok(())
        } else {
            Err(PinError::NoSession)
        }
    }

    fn settle(&mut self) {
        self.device.settle(self.config.settle_delay());
    }

    fn read_record(&mut self) -> Result<AuthRecord<ROUNDS>, PinError> {
        let slot = self.config.nvm_slot;
        let bytes = self
            .device
            .read(slot)
            .map_err(storage_error("read", slot))?
            .ok_or(PinError::NotEnrolled)?;
        let record = AuthRecord::<ROUNDS>::decode(&bytes)?;
        record.validate()?;
        Ok(record)
    }

    fn erase_record(&mut self) -> Result<(), PinError> {
        let slot = self.config.nvm_slot;
        self.device.erase(slot).map_err(storage_error("erase", slot))
    }

    fn write_record(&mut self, record: &AuthRecord<ROUNDS>) -> Result<(), PinError> {
        let slot = self.config.nvm_slot;
        self.device
            .write(slot, &record.encode())
            .map_err(storage_error("write", slot))
    }

    /// Erase, then write, with a settle delay after each step.
    fn persist(&mut self, record: &AuthRecord<ROUNDS>) -> Result<(), PinError> {
        self.erase_record()?;
        self.settle();
        self.write_record(record)?;
        self.settle();
        Ok(())
    }
}

fn storage_error(op: &'static str, slot: u16) -> impl FnOnce(DeviceError) -> PinError {
    move |e| {
        tracing::warn!(op, nvm_slot = slot, error = %e, "record storage failed");
        PinError::Storage(format!("{op} slot {slot}: {e}"))
    }
}
