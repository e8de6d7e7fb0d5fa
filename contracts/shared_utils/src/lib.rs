#![no_std]

//! Shared utility library for the ProofMint Soroban contracts
//!
//! This library provides the helpers used across the receipt and escrow
//! contracts:
//! - Access control (admin lookup, role flags)
//! - Pausable (global emergency stop)
//! - Math utilities (checked arithmetic, percentages, basis points)
//! - Time utilities (timestamps, monthly periods)
//! - Validation utilities
//! - Storage helpers (TTL management)
//!
//! Helpers never panic on bad input. They return `Option`/`bool` or take the
//! caller's error value so each contract reports failures with its own
//! `#[contracterror]` codes.

pub mod access_control;
pub mod math;
pub mod pausable;
pub mod storage;
pub mod time;
pub mod validation;

#[cfg(test)]
mod tests;

pub use access_control::AccessControl;
pub use math::SafeMath;
pub use pausable::Pausable;
pub use storage::Storage;
pub use time::TimeUtils;
pub use validation::Validation;
pub use math::{BPS_DENOMINATOR, PERCENT_DENOMINATOR};
pub use time::{MONTHLY_DURATION, SECONDS_PER_DAY};
