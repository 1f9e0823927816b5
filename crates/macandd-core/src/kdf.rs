//! Key derivation chain for the Mac-and-Destroy protocol.
//!
//! Every derived value is one call of a keyed PRF (HMAC-SHA256 by default):
//!
//! ```text
//! tag     = KDF(s, "0")            stored, validates a decrypted candidate
//! u       = KDF(s, "1")            arms an oracle slot
//! v       = KDF(0^32, PIN || add)  probes an oracle slot
//! k_i     = KDF(w_i, PIN || add)   per-round encryption key
//! release = KDF(s, "2")            handed to the caller, never `s` itself
//! ```
//!
//! `v` is keyed with the all-zero key on purpose: Check has to reproduce it
//! from the PIN alone, before the secret is known. The one-byte labels keep
//! the tag, arm and release roles from ever colliding.

use ring::hmac;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::PinError;
use crate::memory::SecretBytes;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of every key, secret, tag and oracle value in bytes.
pub const KEY_LEN: usize = 32;

/// Minimum PIN length in bytes.
pub const PIN_LEN_MIN: usize = 4;

/// Maximum PIN length in bytes.
pub const PIN_LEN_MAX: usize = 8;

/// Maximum additional data length in bytes.
pub const ADD_LEN_MAX: usize = 128;

/// Capacity of the `PIN || add` buffer.
const INPUT_CAPACITY: usize = PIN_LEN_MAX + ADD_LEN_MAX;

const LABEL_TAG: &[u8] = b"0";
const LABEL_ARM: &[u8] = b"1";
const LABEL_RELEASE: &[u8] = b"2";

/// Key used for the probe derivation.
const ZERO_KEY: [u8; KEY_LEN] = [0u8; KEY_LEN];

// ---------------------------------------------------------------------------
// Keyed PRF
// ---------------------------------------------------------------------------

/// Keyed pseudorandom function producing 32-byte outputs.
pub trait KeyedPrf {
    /// Compute `PRF(key, message)` into `out`.
    fn prf(&self, key: &[u8; KEY_LEN], message: &[u8], out: &mut [u8; KEY_LEN]);
}

/// HMAC-SHA256 via `ring::hmac`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HmacSha256;

impl KeyedPrf for HmacSha256 {
    fn prf(&self, key: &[u8; KEY_LEN], message: &[u8], out: &mut [u8; KEY_LEN]) {
        let key = hmac::Key::new(hmac::HMAC_SHA256, key);
        let tag = hmac::sign(&key, message);
        out.copy_from_slice(tag.as_ref());
    }
}

// ---------------------------------------------------------------------------
// PIN || additional data
// ---------------------------------------------------------------------------

/// The concatenation `PIN || add`, validated and wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KdfInput {
    buf: [u8; INPUT_CAPACITY],
    len: usize,
}

impl KdfInput {
    /// Validate lengths and concatenate.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::InvalidPinLength`] for a PIN outside 4..=8 bytes and
    /// [`PinError::InvalidAdditionalDataLength`] for more than 128 bytes of
    /// additional data.
    pub fn new(pin: &[u8], add: &[u8]) -> Result<Self, PinError> {
        if !(PIN_LEN_MIN..=PIN_LEN_MAX).contains(&pin.len()) {
            return Err(PinError::InvalidPinLength { len: pin.len() });
        }
        if add.len() > ADD_LEN_MAX {
            return Err(PinError::InvalidAdditionalDataLength { len: add.len() });
        }

        let mut input = Self {
            buf: [0u8; INPUT_CAPACITY],
            len: 0,
        };
        let (pin_part, rest) = input.buf.split_at_mut(pin.len());
        pin_part.copy_from_slice(pin);
        rest[..add.len()].copy_from_slice(add);
        input.len = pin.len().saturating_add(add.len());
        Ok(input)
    }

    /// The concatenated bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl std::fmt::Debug for KdfInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KdfInput(***)")
    }
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// `tag = KDF(s, "0")`.
#[must_use]
pub fn derive_tag<P: KeyedPrf + ?Sized>(prf: &P, secret: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
    let mut tag = [0u8; KEY_LEN];
    prf.prf(secret, LABEL_TAG, &mut tag);
    tag
}

/// Candidate tag for a decrypted secret, kept in secure memory until compared.
#[must_use]
pub fn derive_candidate_tag<P: KeyedPrf + ?Sized>(
    prf: &P,
    secret: &[u8; KEY_LEN],
) -> SecretBytes<KEY_LEN> {
    let mut tag = SecretBytes::zeroed();
    prf.prf(secret, LABEL_TAG, tag.expose_mut());
    tag
}

/// `u = KDF(s, "1")`.
#[must_use]
pub fn derive_arm<P: KeyedPrf + ?Sized>(prf: &P, secret: &[u8; KEY_LEN]) -> SecretBytes<KEY_LEN> {
    let mut u = SecretBytes::zeroed();
    prf.prf(secret, LABEL_ARM, u.expose_mut());
    u
}

/// `v = KDF(0^32, PIN || add)`.
#[must_use]
pub fn derive_probe<P: KeyedPrf + ?Sized>(prf: &P, input: &KdfInput) -> SecretBytes<KEY_LEN> {
    let mut v = SecretBytes::zeroed();
    prf.prf(&ZERO_KEY, input.as_bytes(), v.expose_mut());
    v
}

/// `k_i = KDF(w_i, PIN || add)`.
#[must_use]
pub fn derive_round_key<P: KeyedPrf + ?Sized>(
    prf: &P,
    w: &SecretBytes<KEY_LEN>,
    input: &KdfInput,
) -> SecretBytes<KEY_LEN> {
    let mut k = SecretBytes::zeroed();
    prf.prf(w.expose(), input.as_bytes(), k.expose_mut());
    k
}

/// `release = KDF(s, "2")`, written straight into the caller's buffer.
pub fn derive_release_into<P: KeyedPrf + ?Sized>(
    prf: &P,
    secret: &[u8; KEY_LEN],
    out: &mut [u8; KEY_LEN],
) {
    prf.prf(secret, LABEL_RELEASE, out);
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
