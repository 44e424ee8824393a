//! # Domain Models
//!
//! Pure data shared between the binaries and the infrastructure crates.
//! Keep it lean: `serde` only, no I/O.

pub mod config;
