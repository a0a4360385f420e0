//! Data structures for survey count analysis.

mod count_matrix;
mod dissimilarity;
mod labeled;
mod metadata;

pub use count_matrix::{CountMatrix, Marginals, MatrixKind, DEFAULT_LEVEL};
pub use dissimilarity::{DissimilarityMatrix, DissimilarityTable, Metric};
pub use labeled::{LabeledMatrix, LabeledTable};
pub use metadata::{
    MetadataRecord, SurveyMetadata, Variable, VariableType, DEFAULT_SAMPLE_KEY,
    DEFAULT_VARIANT_KEY,
};
