//! Normalization of count matrices.
//!
//! - **TSS**: Total sum scaling / relative abundance

pub mod tss;
