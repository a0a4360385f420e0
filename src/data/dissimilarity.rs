//! Square sample-by-sample dissimilarity matrices.

use super::labeled::{LabeledMatrix, LabeledTable};
use crate::error::{Result, SurveyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Dissimilarity metric used to build a [`DissimilarityMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Chi-squared distance on the relative frequency table.
    ChiSquared,
    /// Bray-Curtis dissimilarity on raw counts.
    BrayCurtis,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::ChiSquared => "chi-squared",
            Metric::BrayCurtis => "bray-curtis",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pairwise dissimilarities between the samples of a count matrix.
///
/// Rows and columns share the source matrix's sample labels, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct DissimilarityMatrix {
    matrix: LabeledMatrix,
    metric: Option<Metric>,
}

/// Serializable form of a [`DissimilarityMatrix`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DissimilarityTable {
    pub metric: Option<Metric>,
    #[serde(flatten)]
    pub table: LabeledTable,
}

impl DissimilarityMatrix {
    /// Wrap a labeled matrix. It must be square with identical row and
    /// column labels.
    pub fn new(matrix: LabeledMatrix, metric: Option<Metric>) -> Result<Self> {
        let (nrows, ncols) = matrix.shape();
        if nrows != ncols {
            return Err(SurveyError::DimensionMismatch {
                expected: nrows,
                actual: ncols,
            });
        }
        if matrix.row_labels() != matrix.col_labels() {
            return Err(SurveyError::InvalidParameter(
                "dissimilarity matrix rows and columns must share labels".to_string(),
            ));
        }
        Ok(Self { matrix, metric })
    }

    #[inline]
    pub fn metric(&self) -> Option<Metric> {
        self.metric
    }

    /// Dissimilarity between samples `a` and `b` (by position).
    #[inline]
    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.matrix.get(a, b)
    }

    /// Sample labels shared by both axes.
    #[inline]
    pub fn labels(&self) -> &[String] {
        self.matrix.row_labels()
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    #[inline]
    pub fn matrix(&self) -> &LabeledMatrix {
        &self.matrix
    }

    pub fn into_matrix(self) -> LabeledMatrix {
        self.matrix
    }

    pub fn to_table(&self) -> DissimilarityTable {
        DissimilarityTable {
            metric: self.metric,
            table: self.matrix.to_table(),
        }
    }

    /// Write as a TSV file with the metric name in the corner cell.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let corner = self.metric.map(|m| m.name()).unwrap_or("sample");
        self.matrix.to_tsv(path, corner)
    }

    /// Largest |D[i,j] - D[j,i]| over all pairs.
    pub fn max_asymmetry(&self) -> f64 {
        let n = self.len();
        let mut worst = 0.0f64;
        for i in 0..n {
            for j in (i + 1)..n {
                worst = worst.max((self.get(i, j) - self.get(j, i)).abs());
            }
        }
        worst
    }
}
