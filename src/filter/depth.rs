//! Read-depth filtering for samples.

use crate::data::CountMatrix;
use serde::{Deserialize, Serialize};

/// Summary of a read-depth filtering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthFilterResult {
    /// Depth threshold applied.
    pub min_depth: u64,
    /// Number of samples before filtering.
    pub n_before: usize,
    /// Number of samples after filtering.
    pub n_after: usize,
    /// Number of samples removed.
    pub n_removed: usize,
    /// IDs of removed samples.
    pub removed_samples: Vec<String>,
}

impl std::fmt::Display for DepthFilterResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Read Depth Filter Result")?;
        writeln!(f, "  Minimum depth:   {}", self.min_depth)?;
        writeln!(f, "  Samples before:  {}", self.n_before)?;
        writeln!(f, "  Samples after:   {}", self.n_after)?;
        writeln!(f, "  Samples removed: {}", self.n_removed)?;
        if !self.removed_samples.is_empty() {
            writeln!(f, "  Removed: {:?}", self.removed_samples)?;
        }
        Ok(())
    }
}

impl CountMatrix {
    /// Keep only samples whose total count is at least `min_depth`.
    ///
    /// Metadata records for dropped samples are removed as well. Columns
    /// left empty by the removal are kept; call
    /// [`CountMatrix::filter_empty_columns`] before chi-squared if needed.
    /// Never fails, and may leave the matrix without samples.
    pub fn filter_read_depth(&mut self, min_depth: u64) -> DepthFilterResult {
        let threshold = min_depth as f64;
        let depths = self.depths();
        let n_before = depths.len();

        let (keep, removed): (Vec<usize>, Vec<usize>) =
            (0..n_before).partition(|&i| depths[i] >= threshold);
        let removed_samples: Vec<String> = removed
            .iter()
            .map(|&i| self.sample_ids()[i].clone())
            .collect();

        tracing::info!(
            discarded = removed_samples.len(),
            retained = keep.len(),
            min_depth,
            "discarding samples with read depth below threshold"
        );

        if !removed_samples.is_empty() {
            self.matrix_mut().retain_rows(&keep);
            let retained = self.sample_ids().to_vec();
            if let Some(metadata) = self.metadata_mut() {
                metadata.retain_samples(&retained);
            }
        }

        DepthFilterResult {
            min_depth,
            n_before,
            n_after: keep.len(),
            n_removed: removed_samples.len(),
            removed_samples,
        }
    }
}
