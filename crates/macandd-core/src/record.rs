//! Persisted authentication record and its packed byte layout.
//!
//! # Layout
//!
//! ```text
//! offset 0                  attempts_remaining (u8)
//! offset 1                  ciphertext[0]        (32 bytes)
//! ...                       ciphertext[ROUNDS-1] (32 bytes)
//! offset 1 + 32*ROUNDS      tag                  (32 bytes)
//! ```
//!
//! No padding, no version byte, no endianness: one counter byte followed by
//! raw byte arrays. Decoding checks the length only; the counter range is
//! checked separately by [`AuthRecord::validate`] before the record is trusted.

use crate::error::PinError;
use crate::kdf::KEY_LEN;

/// Upper bound on the number of rounds a record can hold.
pub const MAX_ROUNDS: usize = 12;

/// Round count used when none is given.
pub const DEFAULT_ROUNDS: usize = 12;

/// The single persisted entity of the protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthRecord<const ROUNDS: usize = DEFAULT_ROUNDS> {
    /// Attempts left before lockout, `0..=ROUNDS`.
    pub attempts_remaining: u8,
    /// `seal(k_i, s)` for every round, in round order.
    pub ciphertexts: [[u8; KEY_LEN]; ROUNDS],
    /// `KDF(s, "0")`.
    pub tag: [u8; KEY_LEN],
}

impl<const ROUNDS: usize> AuthRecord<ROUNDS> {
    /// Compile-time bound check, forced by every constructor and codec call.
    const ROUNDS_IN_RANGE: () = assert!(
        ROUNDS >= 1 && ROUNDS <= MAX_ROUNDS,
        "ROUNDS must be between 1 and MAX_ROUNDS"
    );

    /// Size of the encoded record in bytes.
    pub const ENCODED_LEN: usize = 1 + KEY_LEN * ROUNDS + KEY_LEN;

    /// `ROUNDS` as the counter type. Lossless: `ROUNDS <= MAX_ROUNDS`.
    #[allow(clippy::cast_possible_truncation)]
    pub const FULL_ATTEMPTS: u8 = ROUNDS as u8;

    /// A record with a full attempt budget and zeroed blocks.
    #[must_use]
    pub const fn new() -> Self {
        let () = Self::ROUNDS_IN_RANGE;
        Self {
            attempts_remaining: Self::FULL_ATTEMPTS,
            ciphertexts: [[0u8; KEY_LEN]; ROUNDS],
            tag: [0u8; KEY_LEN],
        }
    }

    /// Serialize into the packed layout.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let () = Self::ROUNDS_IN_RANGE;
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.push(self.attempts_remaining);
        for block in &self.ciphertexts {
            out.extend_from_slice(block);
        }
        out.extend_from_slice(&self.tag);
        out
    }

    /// Parse the packed layout.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::CorruptRecord`] if `bytes` is not exactly
    /// [`Self::ENCODED_LEN`] long.
    pub fn decode(bytes: &[u8]) -> Result<Self, PinError> {
        let () = Self::ROUNDS_IN_RANGE;
        if bytes.len() != Self::ENCODED_LEN {
            return Err(PinError::CorruptRecord(format!(
                "record is {} bytes (expected {})",
                bytes.len(),
                Self::ENCODED_LEN
            )));
        }

        let (counter, rest) = bytes.split_at(1);
        let (blocks, tag) = rest.split_at(KEY_LEN * ROUNDS);

        let mut record = Self::new();
        record.attempts_remaining = counter[0];
        for (dst, src) in record.ciphertexts.iter_mut().zip(blocks.chunks_exact(KEY_LEN)) {
            dst.copy_from_slice(src);
        }
        record.tag.copy_from_slice(tag);
        Ok(record)
    }

    /// Check the semantic invariants a decoded record must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::CorruptRecord`] if the counter exceeds `ROUNDS`.
    pub fn validate(&self) -> Result<(), PinError> {
        if self.attempts_remaining > Self::FULL_ATTEMPTS {
            return Err(PinError::CorruptRecord(format!(
                "attempt counter {} exceeds {ROUNDS} rounds",
                self.attempts_remaining
            )));
        }
        Ok(())
    }

    /// Ciphertext block for `round`, if in range.
    #[must_use]
    pub fn ciphertext(&self, round: u8) -> Option<&[u8; KEY_LEN]> {
        self.ciphertexts.get(usize::from(round))
    }
}

impl<const ROUNDS: usize> Default for AuthRecord<ROUNDS> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
