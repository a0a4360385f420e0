//! Rarefaction: subsampling samples to a fixed depth.
//!
//! - **sample**: draw observations from one sample without replacement
//! - **curve**: richness at increasing depths

pub mod curve;
pub mod sample;

pub use curve::{rarefaction_curve, RarefactionPoint};
