//! Software model of the destructive-transform oracle.
//!
//! Each slot holds a 32-byte state. A call with input `x`:
//!
//! ```text
//! output    = HMAC(K_out,  slot || state || x)
//! new state = HMAC(K_next, slot || x)
//! ```
//!
//! The output depends on the previous input and the current one; the new
//! state depends on the current input only. The slot number is mixed into
//! both, so equal inputs on different slots give unrelated outputs. Knowing
//! one input/output pair says nothing about the output for a different
//! input, and a previous state only comes back by replaying its input.

use macandd_core::{DeviceError, KEY_LEN};
use ring::hmac;

/// Number of oracle slots on the simulated device.
pub const ORACLE_SLOTS: usize = 128;

/// One recorded oracle call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OracleCall {
    /// Input supplied by the caller.
    pub input: [u8; KEY_LEN],
    /// Output returned to the caller.
    pub output: [u8; KEY_LEN],
}

/// Deterministic oracle with per-slot call history.
pub struct SimOracle {
    out_key: hmac::Key,
    next_key: hmac::Key,
    states: Vec<[u8; KEY_LEN]>,
    history: Vec<Vec<OracleCall>>,
}

impl SimOracle {
    /// Build an oracle from two device keys. Initial slot states are derived
    /// from `next_key` so that a fresh slot is not armed with any input.
    #[must_use]
    pub fn new(out_key: &[u8; KEY_LEN], next_key: &[u8; KEY_LEN]) -> Self {
        let next_key = hmac::Key::new(hmac::HMAC_SHA256, next_key);
        let states = (0..ORACLE_SLOTS)
            .map(|slot| {
                let mut msg = b"factory-state".to_vec();
                msg.extend_from_slice(&slot.to_le_bytes());
                tag32(&next_key, &msg)
            })
            .collect();
        Self {
            out_key: hmac::Key::new(hmac::HMAC_SHA256, out_key),
            next_key,
            states,
            history: vec![Vec::new(); ORACLE_SLOTS],
        }
    }

    /// Run one call on `slot`.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] for a slot number outside the device range.
    pub fn transform(
        &mut self,
        slot: u8,
        input: &[u8; KEY_LEN],
    ) -> Result<[u8; KEY_LEN], DeviceError> {
        let index = usize::from(slot);
        let state = self
            .states
            .get_mut(index)
            .ok_or_else(|| DeviceError::new(format!("oracle slot {slot} out of range")))?;

        let mut msg = Vec::with_capacity(1 + 2 * KEY_LEN);
        msg.push(slot);
        msg.extend_from_slice(state.as_slice());
        msg.extend_from_slice(input);
        let output = tag32(&self.out_key, &msg);
        *state = tag32(&self.next_key, &[&[slot][..], input.as_slice()].concat());

        if let Some(log) = self.history.get_mut(index) {
            log.push(OracleCall {
                input: *input,
                output,
            });
        }
        Ok(output)
    }

    /// Calls made on `slot`, oldest first.
    #[must_use]
    pub fn history(&self, slot: u8) -> &[OracleCall] {
        self.history
            .get(usize::from(slot))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Total calls across all slots.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.history.iter().map(Vec::len).sum()
    }
}

fn tag32(key: &hmac::Key, msg: &[u8]) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(hmac::sign(key, msg).as_ref());
    out
}
