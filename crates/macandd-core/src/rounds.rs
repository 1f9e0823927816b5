//! Round oracle driver: sequences Mac-and-Destroy calls per round.
//!
//! Enrollment runs three calls on each round's slot:
//!
//! ```text
//! D(i, u) -> discarded   arm the slot with u
//! D(i, v) -> w_i         the only retained output, w_i = f(u, v)
//! D(i, u) -> discarded   re-arm so a later probe with v reproduces w_i
//! ```
//!
//! Verification probes a single slot with `v'`; a successful verification
//! re-arms the spent slots with one `D(i, u)` call each. Any failed call
//! aborts the run: the slot is left in whatever state the device reached.

use std::ops::RangeInclusive;

use zeroize::Zeroize;

use crate::device::DestructiveOracle;
use crate::error::PinError;
use crate::kdf::KEY_LEN;
use crate::memory::SecretBytes;

fn call<O: DestructiveOracle + ?Sized>(
    oracle: &mut O,
    slot: u8,
    input: &SecretBytes<KEY_LEN>,
) -> Result<SecretBytes<KEY_LEN>, PinError> {
    let mut out = oracle.mac_and_destroy(slot, input.expose()).map_err(|e| {
        tracing::warn!(slot, error = %e, "mac-and-destroy call failed");
        PinError::Oracle {
            slot,
            reason: e.to_string(),
        }
    })?;
    let buf = SecretBytes::new(out);
    out.zeroize();
    Ok(buf)
}

/// Arm `slot` with `u`, discarding the output.
///
/// # Errors
///
/// Returns [`PinError::Oracle`] if the device call fails.
pub fn arm<O: DestructiveOracle + ?Sized>(
    oracle: &mut O,
    slot: u8,
    u: &SecretBytes<KEY_LEN>,
) -> Result<(), PinError> {
    tracing::trace!(slot, "arm");
    call(oracle, slot, u).map(drop)
}

/// Probe `slot` with `v`, returning the oracle output.
///
/// # Errors
///
/// Returns [`PinError::Oracle`] if the device call fails.
pub fn probe<O: DestructiveOracle + ?Sized>(
    oracle: &mut O,
    slot: u8,
    v: &SecretBytes<KEY_LEN>,
) -> Result<SecretBytes<KEY_LEN>, PinError> {
    tracing::trace!(slot, "probe");
    call(oracle, slot, v)
}

/// Run the arm / probe / re-arm sequence on `slot` and return `w`.
///
/// # Errors
///
/// Returns [`PinError::Oracle`] on the first failing call; later calls of the
/// sequence are not issued.
pub fn enroll_round<O: DestructiveOracle + ?Sized>(
    oracle: &mut O,
    slot: u8,
    u: &SecretBytes<KEY_LEN>,
    v: &SecretBytes<KEY_LEN>,
) -> Result<SecretBytes<KEY_LEN>, PinError> {
    arm(oracle, slot, u)?;
    let w = probe(oracle, slot, v)?;
    arm(oracle, slot, u)?;
    Ok(w)
}

/// Re-arm every slot in `slots` with `u`, in ascending order.
///
/// # Errors
///
/// Returns [`PinError::Oracle`] on the first failing call. Slots before it
/// stay re-armed; slots after it are untouched.
pub fn rearm<O: DestructiveOracle + ?Sized>(
    oracle: &mut O,
    slots: RangeInclusive<u8>,
    u: &SecretBytes<KEY_LEN>,
) -> Result<(), PinError> {
    for slot in slots {
        arm(oracle, slot, u)?;
    }
    Ok(())
}
