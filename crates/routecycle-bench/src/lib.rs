//! Synthetic dataset generation and benchmark utilities for routecycle.
//!
//! This crate provides deterministic generation of large pipe-delimited
//! routing-claim datasets for benchmarking and for exercising the general
//! DFS branch of the cycle detector: every `(claim_id, status_code)` group
//! carries a base ring plus chord edges, so its longest simple cycle is the
//! full ring and the chords create many shorter overlapping cycles.

pub mod generator;

pub use generator::{ChordMode, GeneratorConfig, write_dataset, write_dataset_to_path};
