//! Validation utilities
//!
//! Reads delivered files back and checks their loudness

mod verify;

pub use verify::{verify_output, verify_outputs, Verification};
