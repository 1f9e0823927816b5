#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Security validation test suite for macandd-core.
//!
//! These integration tests verify security-critical properties:
//! - Memory zeroization on drop for secrets and KDF input
//! - Masked `Debug`/`Display` output for secret-bearing types
//! - Constant-time comparison semantics

mod security;
