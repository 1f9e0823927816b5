//! `macandd-core`: Mac-and-Destroy PIN protection.
//!
//! A 4–8 byte PIN unlocks a 256-bit secret, and the number of guesses is
//! bounded by hardware: every guess consumes one irreversible call of the
//! device's destructive-transform oracle, so even an attacker holding the
//! persisted record and unlimited compute gets at most `ROUNDS` tries.
//!
//! This crate is the audit target: zero I/O of its own, zero async, zero
//! simulation code. The device (session, RNG, persistent slot, oracle) is
//! injected through the traits in [`device`].

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod cipher;
pub mod kdf;

pub mod record;

pub mod config;
pub mod device;

pub mod rounds;

pub mod protocol;

pub use cipher::{RoundCipher, XorCipher};
pub use config::MacAndDestroyConfig;
pub use device::{
    DestructiveOracle, Device, EntropySource, OsEntropy, SecureSession, SlotStore,
};
pub use error::{DeviceError, PinError};
pub use kdf::{HmacSha256, KdfInput, KeyedPrf, ADD_LEN_MAX, KEY_LEN, PIN_LEN_MAX, PIN_LEN_MIN};
pub use memory::{constant_time_eq, SecretBytes};
pub use protocol::MacAndDestroy;
pub use record::{AuthRecord, DEFAULT_ROUNDS, MAX_ROUNDS};
