//! `macandd-sim`: a software secure element for exercising `macandd-core`.
//!
//! [`SimDevice`] implements every collaborator trait the protocol needs:
//! a session flag, a seeded RNG, a user-memory slot store with flash erase
//! semantics, and a destructive-transform oracle with per-slot call history.
//! Faults can be armed per operation to model transport errors and power
//! loss at chosen points.
//!
//! Nothing here is secure. It exists for tests and demonstrations.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod device;
pub mod fault;
pub mod oracle;

pub use device::{OpCounts, SimDevice, MAX_USER_SLOT, USER_SLOT_CAPACITY};
pub use fault::{FaultMode, FaultPlan, Op};
pub use oracle::{OracleCall, SimOracle, ORACLE_SLOTS};
