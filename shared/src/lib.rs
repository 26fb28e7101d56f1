//! Shared grading engine for the Gem Certificate Digitization Platform
//!
//! This crate contains the deterministic scoring core shared between the
//! backend worker and the browser (via WASM): configuration tables, shape
//! classification, field merging, attribute normalization, and the
//! composite-score evaluator. It performs no I/O and holds no mutable state,
//! so one loaded [`tables::EngineTables`] value can be shared by reference
//! across any number of concurrent evaluations.

pub mod classify;
pub mod evaluate;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod tables;

pub use classify::*;
pub use evaluate::*;
pub use merge::*;
pub use models::*;
pub use tables::*;
