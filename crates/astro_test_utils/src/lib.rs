//! # Astro Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Stat block and battle fixtures
//! - Balance sweeps over seeded battles
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod balance;
pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
