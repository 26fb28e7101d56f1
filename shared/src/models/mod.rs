//! Data models for certificate digitization and scoring

pub mod certificate;
pub mod score;

pub use certificate::*;
pub use score::*;
