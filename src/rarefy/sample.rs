//! Random subsampling of a single sample without replacement.

use crate::data::CountMatrix;
use crate::error::{Result, SurveyError};
use rand::seq::index;
use rand::Rng;

impl CountMatrix {
    /// Draw `n` observations from sample `i` without replacement and return
    /// the drawn counts per category, aligned with [`CountMatrix::category_ids`].
    ///
    /// # Errors
    /// - `AlreadyNormalized` if the matrix holds relative abundances
    /// - `IndexOutOfBounds` if `i` is not a sample position
    /// - `SampleTooLarge` if `n` exceeds the sample's total count
    pub fn sample<R: Rng + ?Sized>(&self, i: usize, n: usize, rng: &mut R) -> Result<Vec<u64>> {
        if self.is_normalized() {
            return Err(SurveyError::AlreadyNormalized("sampling".to_string()));
        }
        let row = self.counts_row(i)?;
        draw(&row, n, rng)
    }

    /// Draw `n` observations from sample `i` without replacement and return
    /// only the number of distinct categories seen.
    ///
    /// Fails under the same conditions as [`CountMatrix::sample`].
    pub fn sample_richness<R: Rng + ?Sized>(
        &self,
        i: usize,
        n: usize,
        rng: &mut R,
    ) -> Result<usize> {
        let drawn = self.sample(i, n, rng)?;
        Ok(drawn.iter().filter(|&&c| c > 0).count())
    }
}

/// Subsample `n` observations from a count vector.
///
/// Every observation is a position in `0..total`; a uniform draw of `n`
/// distinct positions is mapped back to categories through the cumulative
/// counts, so the expanded multiset is never built.
pub(crate) fn draw<R: Rng + ?Sized>(row: &[u64], n: usize, rng: &mut R) -> Result<Vec<u64>> {
    let available: u64 = row.iter().sum();
    if n as u64 > available {
        return Err(SurveyError::SampleTooLarge {
            requested: n as u64,
            available,
        });
    }

    let cumulative: Vec<u64> = row
        .iter()
        .scan(0u64, |acc, &c| {
            *acc += c;
            Some(*acc)
        })
        .collect();

    let mut drawn = vec![0u64; row.len()];
    for position in index::sample(rng, available as usize, n).iter() {
        let category = cumulative.partition_point(|&end| end <= position as u64);
        drawn[category] += 1;
    }
    Ok(drawn)
}
