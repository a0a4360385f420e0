//! Labeled count matrices for ecological survey data.
//!
//! Counts of amplicon sequence variants (ASVs) across samples are held in a
//! [`CountMatrix`](data::CountMatrix). From it the library computes pairwise
//! sample dissimilarities, rolls variants up to coarser taxonomic ranks, and
//! subsamples observations for rarefaction.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (LabeledMatrix, CountMatrix, DissimilarityMatrix, SurveyMetadata)
//! - **distance**: Chi-squared and Bray-Curtis dissimilarities
//! - **filter**: Empty-category and read-depth filtering
//! - **normalize**: Relative abundance (TSS)
//! - **taxonomy**: Aggregation of variants by taxonomic rank
//! - **rarefy**: Subsampling without replacement and rarefaction curves
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```no_run
//! use ecomatrix::prelude::*;
//!
//! let counts = CountMatrix::from_tsv("asv_counts.tsv").unwrap();
//! let metadata = SurveyMetadata::from_tsv("asv_metadata.tsv").unwrap();
//!
//! let output = Pipeline::new()
//!     .filter_read_depth(5000)
//!     .filter_empty_columns()
//!     .aggregate_taxonomy("phylum")
//!     .bray_curtis()
//!     .run(&counts.with_metadata(metadata))
//!     .unwrap();
//!
//! output.distances[0].to_tsv("bray_curtis.tsv").unwrap();
//! ```

pub mod data;
pub mod distance;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod rarefy;
pub mod taxonomy;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{
        CountMatrix, DissimilarityMatrix, LabeledMatrix, LabeledTable, Marginals, MatrixKind,
        Metric, SurveyMetadata, Variable, VariableType, DEFAULT_LEVEL,
    };
    pub use crate::distance::{bray_curtis, chi_squared};
    pub use crate::error::{Result, SurveyError};
    pub use crate::filter::DepthFilterResult;
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineOutput, PipelineStep};
    pub use crate::rarefy::{rarefaction_curve, RarefactionPoint};
    pub use crate::taxonomy::aggregate_taxonomy;
}
