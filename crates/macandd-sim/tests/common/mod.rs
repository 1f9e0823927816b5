//! Shared fixtures for protocol-level tests.

#![allow(dead_code)]

use macandd_core::{HmacSha256, MacAndDestroy, MacAndDestroyConfig, XorCipher};
use macandd_sim::SimDevice;

/// Enrolled PIN used across scenarios.
pub const PIN: &[u8] = b"1234";

/// A PIN that never matches [`PIN`].
pub const WRONG_PIN: &[u8] = b"0000";

/// Protocol with the default 12 rounds.
pub type Protocol = MacAndDestroy<SimDevice>;

/// Protocol with a 3-attempt budget.
pub type SmallProtocol = MacAndDestroy<SimDevice, HmacSha256, XorCipher, 3>;

/// Fresh protocol over a seeded simulated device, default configuration.
pub fn protocol(seed: u64) -> Protocol {
    MacAndDestroy::new(SimDevice::new(seed), MacAndDestroyConfig::default())
        .expect("default config is valid")
}

/// Protocol already enrolled with [`PIN`] and empty additional data.
/// Returns the released secret alongside.
pub fn enrolled(seed: u64) -> (Protocol, [u8; 32]) {
    let mut p = protocol(seed);
    let secret = p.set(PIN, b"").expect("set should succeed");
    (p, *secret.expose())
}

/// Raw record bytes in the default slot.
pub fn record_bytes(p: &Protocol) -> Vec<u8> {
    p.device()
        .slot_contents(MacAndDestroyConfig::default().nvm_slot)
        .expect("record present")
        .to_vec()
}
