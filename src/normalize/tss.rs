//! Total Sum Scaling (TSS) normalization for compositional data.
//!
//! TSS converts counts to relative abundances by dividing each count by the
//! total counts in that sample. Once applied, a matrix no longer holds whole
//! counts and rejects rarefaction.

use crate::data::CountMatrix;
use crate::error::{Result, SurveyError};

impl CountMatrix {
    /// Convert counts to per-sample relative abundances in place.
    ///
    /// Each row is divided by its total so that it sums to one. Calling this
    /// on an already normalized matrix does nothing.
    ///
    /// # Errors
    /// `ZeroTotal` if any sample has zero total counts. The matrix is left
    /// untouched in that case.
    pub fn normalize(&mut self) -> Result<()> {
        if self.is_normalized() {
            return Ok(());
        }

        let depths = self.depths();
        if let Some(i) = depths.iter().position(|&d| d <= 0.0) {
            return Err(SurveyError::ZeroTotal(format!(
                "sample '{}' has zero total counts, cannot normalize",
                self.sample_ids()[i]
            )));
        }

        self.matrix_mut().scale_rows_to_unit();
        self.set_normalized();
        Ok(())
    }
}
