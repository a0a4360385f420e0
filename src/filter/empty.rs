//! Removal of categories with no observations.

use crate::data::CountMatrix;

impl CountMatrix {
    /// Drop every column whose total is not strictly positive.
    ///
    /// Runs on every construction. Subsetting survey data often leaves
    /// categories with no support, and chi-squared needs strictly positive
    /// column marginals. Returns the number of columns removed.
    pub fn filter_empty_columns(&mut self) -> usize {
        let keep: Vec<usize> = self
            .category_totals()
            .iter()
            .enumerate()
            .filter(|(_, &total)| total > 0.0)
            .map(|(i, _)| i)
            .collect();

        let removed = self.n_categories() - keep.len();
        if removed > 0 {
            self.matrix_mut().retain_cols(&keep);
        }
        removed
    }
}
