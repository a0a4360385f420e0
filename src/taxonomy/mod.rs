//! Taxonomic aggregation of variant-level counts.

pub mod aggregate;

pub use aggregate::aggregate_taxonomy;
