//! Roll-up of variant counts into taxonomic categories.

use crate::data::{CountMatrix, LabeledMatrix, MatrixKind};
use crate::error::{Result, SurveyError};
use nalgebra::DMatrix;
use std::collections::BTreeMap;

/// Sum the counts of all variants sharing a rank value at `level`.
///
/// The matrix is turned variant-by-sample, each variant is joined to its
/// rank through the metadata, rows are summed per rank and the result is
/// turned back to samples-by-rank. Rank columns come out in sorted order.
///
/// # Errors
/// - `MissingMetadata` if no metadata is attached
/// - `MissingColumn` if `level` is not a metadata field
/// - `RankAssignment` if a variant has no rank value or more than one
pub fn aggregate_taxonomy(counts: &CountMatrix, level: &str) -> Result<CountMatrix> {
    let metadata = counts.require_metadata("taxonomic aggregation")?;
    let lookup = metadata.rank_lookup(level)?;

    let mut by_variant = counts.matrix().clone();
    by_variant.transpose();

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (v, variant) in by_variant.row_labels().iter().enumerate() {
        let rank = lookup
            .get(variant)
            .ok_or_else(|| SurveyError::RankAssignment {
                variant: variant.clone(),
                reason: format!("no {} assignment in metadata", level),
            })?;
        groups.entry(rank.as_str()).or_default().push(v);
    }

    let n_samples = by_variant.shape().1;
    let mut summed = DMatrix::zeros(groups.len(), n_samples);
    for (g, members) in groups.values().enumerate() {
        for &v in members {
            for s in 0..n_samples {
                summed[(g, s)] += by_variant.get(v, s);
            }
        }
    }

    let ranks: Vec<String> = groups.keys().map(|r| r.to_string()).collect();
    let mut grouped = LabeledMatrix::new(summed, ranks, by_variant.col_labels().to_vec())?;
    grouped.transpose();

    tracing::debug!(
        level,
        variants = counts.n_categories(),
        ranks = grouped.shape().1,
        "aggregated variants by taxonomy"
    );

    Ok(CountMatrix::from_parts(
        grouped,
        MatrixKind::Taxonomy {
            level: level.to_string(),
        },
        Some(metadata.clone()),
        counts.is_normalized(),
    ))
}

impl CountMatrix {
    /// Taxonomy matrix at `level` (see [`aggregate_taxonomy`]).
    pub fn taxonomy_matrix(&self, level: &str) -> Result<CountMatrix> {
        aggregate_taxonomy(self, level)
    }
}
