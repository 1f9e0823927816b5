//! In-memory device implementing every protocol collaborator.

use std::collections::HashMap;
use std::time::Duration;

use macandd_core::{
    DestructiveOracle, DeviceError, EntropySource, SecureSession, SlotStore, KEY_LEN,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::fault::{FaultMode, FaultPlan, Op};
use crate::oracle::{OracleCall, SimOracle};

/// Highest user-memory slot number.
pub const MAX_USER_SLOT: u16 = 511;

/// Capacity of one user-memory slot in bytes.
pub const USER_SLOT_CAPACITY: usize = 444;

/// Per-operation call counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpCounts {
    /// Erase calls, including failed ones.
    pub erases: usize,
    /// Write calls, including failed ones.
    pub writes: usize,
    /// Read calls, including failed ones.
    pub reads: usize,
    /// Oracle calls, including failed ones.
    pub oracle_calls: usize,
    /// Random draws, including failed ones.
    pub random_draws: usize,
}

/// Simulated secure element.
///
/// Deterministic for a given seed: the RNG and the oracle keys are both
/// derived from it. The session starts open. Settle delays are recorded,
/// never slept.
pub struct SimDevice {
    session_active: bool,
    rng: StdRng,
    slots: HashMap<u16, Vec<u8>>,
    oracle: SimOracle,
    faults: FaultPlan,
    counts: OpCounts,
    settle_log: Vec<Duration>,
}

impl SimDevice {
    /// Create a device with an open session.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out_key = [0u8; KEY_LEN];
        let mut next_key = [0u8; KEY_LEN];
        rng.fill_bytes(&mut out_key);
        rng.fill_bytes(&mut next_key);
        Self {
            session_active: true,
            rng,
            slots: HashMap::new(),
            oracle: SimOracle::new(&out_key, &next_key),
            faults: FaultPlan::default(),
            counts: OpCounts::default(),
            settle_log: Vec::new(),
        }
    }

    // -- session ------------------------------------------------------------

    /// Establish the secure session.
    pub fn open_session(&mut self) {
        self.session_active = true;
    }

    /// Tear the secure session down.
    pub fn close_session(&mut self) {
        self.session_active = false;
    }

    // -- faults -------------------------------------------------------------

    /// Fail the call of `op` that comes after `skip` successful ones.
    pub fn fail_after(&mut self, op: Op, skip: usize) {
        self.faults.arm(op, skip, FaultMode::Fail);
    }

    /// Cut power right after the write that comes after `skip` successful
    /// ones. That write persists; the call reports an error and the session
    /// closes.
    pub fn power_loss_after_write(&mut self, skip: usize) {
        self.faults.arm(Op::Write, skip, FaultMode::PowerLossAfter);
    }

    /// Disarm every pending fault.
    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    // -- inspection and attacker access -------------------------------------

    /// Raw contents of a user-memory slot, `None` if erased.
    #[must_use]
    pub fn slot_contents(&self, slot: u16) -> Option<&[u8]> {
        self.slots.get(&slot).map(Vec::as_slice)
    }

    /// Replace a slot's contents directly, bypassing erase/write rules.
    /// Models an attacker with raw access to persistent memory.
    pub fn overwrite_slot(&mut self, slot: u16, contents: Option<Vec<u8>>) {
        match contents {
            Some(bytes) => {
                self.slots.insert(slot, bytes);
            }
            None => {
                self.slots.remove(&slot);
            }
        }
    }

    /// Calls made on one oracle slot, oldest first.
    #[must_use]
    pub fn oracle_history(&self, slot: u8) -> &[OracleCall] {
        self.oracle.history(slot)
    }

    /// Call counters since creation.
    #[must_use]
    pub const fn counts(&self) -> OpCounts {
        self.counts
    }

    /// Every settle delay requested so far.
    #[must_use]
    pub fn settle_log(&self) -> &[Duration] {
        &self.settle_log
    }

    fn check_fault(&mut self, op: Op) -> Option<FaultMode> {
        let mode = self.faults.on_call(op);
        if let Some(mode) = mode {
            tracing::debug!(?op, ?mode, "injected fault fired");
        }
        mode
    }

    fn check_slot(slot: u16) -> Result<(), DeviceError> {
        if slot > MAX_USER_SLOT {
            return Err(DeviceError::new(format!(
                "user slot {slot} out of range (0..={MAX_USER_SLOT})"
            )));
        }
        Ok(())
    }
}

impl Default for SimDevice {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SecureSession for SimDevice {
    fn is_session_active(&self) -> bool {
        self.session_active
    }
}

impl EntropySource for SimDevice {
    fn fill_random(&mut self, buf: &mut [u8]) -> Result<(), DeviceError> {
        self.counts.random_draws = self.counts.random_draws.saturating_add(1);
        if self.check_fault(Op::Random).is_some() {
            return Err(DeviceError::new("RNG: entropy source unavailable"));
        }
        self.rng.fill_bytes(buf);
        Ok(())
    }
}

impl SlotStore for SimDevice {
    fn erase(&mut self, slot: u16) -> Result<(), DeviceError> {
        self.counts.erases = self.counts.erases.saturating_add(1);
        Self::check_slot(slot)?;
        match self.check_fault(Op::Erase) {
            Some(FaultMode::Fail) => return Err(DeviceError::new("erase: flash busy")),
            Some(FaultMode::PowerLossAfter) => {
                self.slots.remove(&slot);
                self.session_active = false;
                return Err(DeviceError::new("erase: power lost"));
            }
            None => {}
        }
        self.slots.remove(&slot);
        Ok(())
    }

    fn write(&mut self, slot: u16, data: &[u8]) -> Result<(), DeviceError> {
        self.counts.writes = self.counts.writes.saturating_add(1);
        Self::check_slot(slot)?;
        if data.is_empty() || data.len() > USER_SLOT_CAPACITY {
            return Err(DeviceError::new(format!(
                "write: {} bytes does not fit slot (1..={USER_SLOT_CAPACITY})",
                data.len()
            )));
        }
        if self.slots.contains_key(&slot) {
            return Err(DeviceError::new(format!("write: slot {slot} not erased")));
        }
        match self.check_fault(Op::Write) {
            Some(FaultMode::Fail) => Err(DeviceError::new("write: flash busy")),
            Some(FaultMode::PowerLossAfter) => {
                self.slots.insert(slot, data.to_vec());
                self.session_active = false;
                Err(DeviceError::new("write: power lost"))
            }
            None => {
                self.slots.insert(slot, data.to_vec());
                Ok(())
            }
        }
    }

    fn read(&mut self, slot: u16) -> Result<Option<Vec<u8>>, DeviceError> {
        self.counts.reads = self.counts.reads.saturating_add(1);
        Self::check_slot(slot)?;
        if self.check_fault(Op::Read).is_some() {
            return Err(DeviceError::new("read: transport error"));
        }
        Ok(self.slots.get(&slot).cloned())
    }

    fn settle(&mut self, delay: Duration) {
        self.settle_log.push(delay);
    }
}

impl DestructiveOracle for SimDevice {
    fn mac_and_destroy(
        &mut self,
        slot: u8,
        input: &[u8; KEY_LEN],
    ) -> Result<[u8; KEY_LEN], DeviceError> {
        self.counts.oracle_calls = self.counts.oracle_calls.saturating_add(1);
        match self.check_fault(Op::Oracle) {
            Some(FaultMode::Fail) => Err(DeviceError::new("mac-and-destroy: no response")),
            Some(FaultMode::PowerLossAfter) => {
                self.oracle.transform(slot, input)?;
                self.session_active = false;
                Err(DeviceError::new("mac-and-destroy: power lost"))
            }
            None => self.oracle.transform(slot, input),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn starts_with_open_session_and_empty_slots() {
        let dev = SimDevice::new(1);
        assert!(dev.is_session_active());
        assert_eq!(dev.slot_contents(511), None);
    }

    #[test]
    fn session_toggles() {
        let mut dev = SimDevice::new(1);
        dev.close_session();
        assert!(!dev.is_session_active());
        dev.open_session();
        assert!(dev.is_session_active());
    }

    #[test]
    fn write_requires_erased_slot() {
        let mut dev = SimDevice::new(1);
        dev.write(10, b"abc").unwrap();
        assert!(dev.write(10, b"def").is_err());
        dev.erase(10).unwrap();
        dev.write(10, b"def").unwrap();
        assert_eq!(dev.read(10).unwrap().as_deref(), Some(&b"def"[..]));
    }

    #[test]
    fn write_enforces_capacity() {
        let mut dev = SimDevice::new(1);
        assert!(dev.write(0, &[0u8; USER_SLOT_CAPACITY + 1]).is_err());
        assert!(dev.write(0, &[]).is_err());
        dev.write(0, &[0u8; USER_SLOT_CAPACITY]).unwrap();
    }

    #[test]
    fn rejects_out_of_range_user_slot() {
        let mut dev = SimDevice::new(1);
        assert!(dev.erase(512).is_err());
        assert!(dev.write(512, b"x").is_err());
        assert!(dev.read(512).is_err());
    }

    #[test]
    fn erased_slot_reads_none() {
        let mut dev = SimDevice::new(1);
        dev.write(3, b"data").unwrap();
        dev.erase(3).unwrap();
        assert_eq!(dev.read(3).unwrap(), None);
        // Erasing an already-empty slot is fine.
        dev.erase(3).unwrap();
    }

    #[test]
    fn same_seed_same_randomness() {
        let mut a = SimDevice::new(42);
        let mut b = SimDevice::new(42);
        let (mut x, mut y) = ([0u8; 32], [0u8; 32]);
        a.fill_random(&mut x).unwrap();
        b.fill_random(&mut y).unwrap();
        assert_eq!(x, y);
    }

    #[test]
    fn injected_write_fault_leaves_slot_empty() {
        let mut dev = SimDevice::new(1);
        dev.fail_after(Op::Write, 0);
        assert!(dev.write(5, b"data").is_err());
        assert_eq!(dev.slot_contents(5), None);
        assert!(dev.is_session_active());
    }

    #[test]
    fn power_loss_after_write_persists_and_closes_session() {
        let mut dev = SimDevice::new(1);
        dev.power_loss_after_write(1);
        dev.write(5, b"first").unwrap();
        assert!(dev.write(6, b"second").is_err());
        assert_eq!(dev.slot_contents(6), Some(&b"second"[..]));
        assert!(!dev.is_session_active());
    }

    #[test]
    fn oracle_fault_skips_transform() {
        let mut dev = SimDevice::new(1);
        dev.fail_after(Op::Oracle, 0);
        assert!(dev.mac_and_destroy(0, &[1; KEY_LEN]).is_err());
        assert!(dev.oracle_history(0).is_empty());
        assert_eq!(dev.counts().oracle_calls, 1);
    }

    #[test]
    fn random_fault_reports_error() {
        let mut dev = SimDevice::new(1);
        dev.fail_after(Op::Random, 0);
        assert!(dev.fill_random(&mut [0u8; 32]).is_err());
        assert!(dev.fill_random(&mut [0u8; 32]).is_ok());
    }

    #[test]
    fn settle_is_recorded_not_slept() {
        let mut dev = SimDevice::new(1);
        dev.settle(Duration::from_secs(3600));
        assert_eq!(dev.settle_log(), &[Duration::from_secs(3600)]);
    }

    #[test]
    fn overwrite_slot_bypasses_rules() {
        let mut dev = SimDevice::new(1);
        dev.overwrite_slot(9, Some(vec![1, 2, 3]));
        dev.overwrite_slot(9, Some(vec![4]));
        assert_eq!(dev.slot_contents(9), Some(&[4u8][..]));
        dev.overwrite_slot(9, None);
        assert_eq!(dev.slot_contents(9), None);
    }
}
