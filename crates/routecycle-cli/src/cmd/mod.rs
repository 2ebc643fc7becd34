//! Command implementations for the `routecycle` binary.
pub mod solve;
pub mod worker;
