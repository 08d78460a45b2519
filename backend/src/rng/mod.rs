//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, reproducible draws.
//! Every random decision in the simulation (job template roll, customer pick,
//! demand spike trigger) MUST go through this module.

mod xorshift;

pub use xorshift::RngManager;
