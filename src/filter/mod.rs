//! Filtering primitives for count matrices.
//!
//! - **empty**: drop categories with no observations (runs on construction)
//! - **depth**: drop samples below a minimum read depth

pub mod depth;
pub mod empty;

pub use depth::DepthFilterResult;
