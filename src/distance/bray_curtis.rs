//! Bray-Curtis dissimilarity between samples.

use super::pairwise;
use crate::data::{CountMatrix, DissimilarityMatrix, LabeledMatrix, Metric};
use crate::error::{Result, SurveyError};

/// Compute the Bray-Curtis dissimilarity matrix between the rows of `matrix`.
///
/// `D[i,r] = 1 - 2 * sum_c min(M[i,c], M[r,c]) / (s[i] + s[r])` where `s`
/// holds the row totals. Values lie in [0, 1] for non-negative input.
///
/// # Errors
/// `ZeroTotal` if two samples both have zero total counts.
pub fn bray_curtis(matrix: &LabeledMatrix) -> Result<DissimilarityMatrix> {
    let rows = matrix.rows();
    let totals: Vec<f64> = rows.iter().map(|row| row.iter().sum()).collect();
    let labels = matrix.row_labels();

    let distances = pairwise(rows.len(), |i, r| {
        let pair_total = totals[i] + totals[r];
        if pair_total <= 0.0 {
            return Err(SurveyError::ZeroTotal(format!(
                "samples '{}' and '{}' both have zero total counts",
                labels[i], labels[r]
            )));
        }
        let shared: f64 = rows[i]
            .iter()
            .zip(&rows[r])
            .map(|(&x, &y)| x.min(y))
            .sum();
        Ok(1.0 - 2.0 * shared / pair_total)
    })?;

    let labels = labels.to_vec();
    DissimilarityMatrix::new(
        LabeledMatrix::new(distances, labels.clone(), labels)?,
        Some(Metric::BrayCurtis),
    )
}

impl CountMatrix {
    /// Bray-Curtis dissimilarities between samples.
    pub fn bray_curtis_distance(&self) -> Result<DissimilarityMatrix> {
        bray_curtis(self.matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_two_sample_scenario() {
        let values = DMatrix::from_row_slice(2, 3, &[2.0, 0.0, 2.0, 0.0, 4.0, 0.0]);
        let counts = CountMatrix::new(values, vec!["S1".into(), "S2".into()], ids("A", 3)).unwrap();

        let dm = counts.bray_curtis_distance().unwrap();

        assert_eq!(dm.metric(), Some(Metric::BrayCurtis));
        assert_eq!(dm.labels(), &["S1", "S2"]);
        assert_eq!(dm.get(0, 0), 0.0);
        assert_eq!(dm.get(1, 1), 0.0);
        assert_relative_eq!(dm.get(0, 1), 1.0, epsilon = 1e-12);
        assert_eq!(dm.get(0, 1), dm.get(1, 0));
    }

    #[test]
    fn test_identical_samples_are_zero() {
        let values = DMatrix::from_row_slice(2, 3, &[10.0, 20.0, 30.0, 10.0, 20.0, 30.0]);
        let matrix = LabeledMatrix::new(values, ids("S", 2), ids("A", 3)).unwrap();
        let dm = bray_curtis(&matrix).unwrap();
        assert_relative_eq!(dm.get(0, 1), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_overlap() {
        // shared = min(6,2) + min(4,8) = 6, totals 10 + 10
        let values = DMatrix::from_row_slice(3, 2, &[6.0, 4.0, 2.0, 8.0, 5.0, 5.0]);
        let matrix = LabeledMatrix::new(values, ids("S", 3), ids("A", 2)).unwrap();
        let dm = bray_curtis(&matrix).unwrap();
        assert_relative_eq!(dm.get(0, 1), 1.0 - 12.0 / 20.0, epsilon = 1e-12);
        assert_relative_eq!(dm.get(2, 0), 1.0 - 18.0 / 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_empty_samples_is_error() {
        let values = DMatrix::from_row_slice(3, 1, &[0.0, 0.0, 4.0]);
        let matrix = LabeledMatrix::new(values, ids("S", 3), ids("A", 1)).unwrap();
        assert!(matches!(bray_curtis(&matrix), Err(SurveyError::ZeroTotal(_))));
    }

    #[test]
    fn test_single_empty_sample_is_fine() {
        let values = DMatrix::from_row_slice(2, 1, &[0.0, 4.0]);
        let matrix = LabeledMatrix::new(values, ids("S", 2), ids("A", 1)).unwrap();
        let dm = bray_curtis(&matrix).unwrap();
        assert_relative_eq!(dm.get(0, 1), 1.0, epsilon = 1e-12);
    }
}
