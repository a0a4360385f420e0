//! Dense matrix with named row and column axes.

use crate::error::{Result, SurveyError};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A 2-D numeric matrix whose rows and columns carry identifiers.
///
/// Label order is significant: row `i` of any matrix derived from this one
/// corresponds to `row_labels[i]` here.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    values: DMatrix<f64>,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
}

/// Plain table view of a [`LabeledMatrix`], row-major, for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledTable {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl LabeledMatrix {
    /// Create a labeled matrix, checking that the labels match the shape
    /// and are unique along each axis.
    pub fn new(
        values: DMatrix<f64>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = values.shape();
        if nrows != row_labels.len() {
            return Err(SurveyError::DimensionMismatch {
                expected: nrows,
                actual: row_labels.len(),
            });
        }
        if ncols != col_labels.len() {
            return Err(SurveyError::DimensionMismatch {
                expected: ncols,
                actual: col_labels.len(),
            });
        }
        check_unique(&row_labels)?;
        check_unique(&col_labels)?;
        Ok(Self {
            values,
            row_labels,
            col_labels,
        })
    }

    /// Build from row-major rows. Every row must have `col_labels.len()` entries.
    pub fn from_rows(
        rows: &[Vec<f64>],
        row_labels: Vec<String>,
        col_labels: Vec<String>,
    ) -> Result<Self> {
        let ncols = col_labels.len();
        for row in rows {
            if row.len() != ncols {
                return Err(SurveyError::DimensionMismatch {
                    expected: ncols,
                    actual: row.len(),
                });
            }
        }
        let values = DMatrix::from_fn(rows.len(), ncols, |r, c| rows[r][c]);
        Self::new(values, row_labels, col_labels)
    }

    /// Swap axes in place: values become their transpose and the two label
    /// lists trade places.
    pub fn transpose(&mut self) {
        self.values = self.values.transpose();
        std::mem::swap(&mut self.row_labels, &mut self.col_labels);
    }

    /// (row count, column count).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[(row, col)]
    }

    /// Values of one row, or `None` past the last row.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.len() {
            return None;
        }
        Some(self.values.row(index).iter().copied().collect())
    }

    /// All rows as owned row-major vectors.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.len())
            .map(|r| self.values.row(r).iter().copied().collect())
            .collect()
    }

    #[inline]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    #[inline]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    #[inline]
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Row totals.
    pub fn row_sums(&self) -> Vec<f64> {
        self.values.column_sum().iter().copied().collect()
    }

    /// Column totals.
    pub fn col_sums(&self) -> Vec<f64> {
        self.values.row_sum().iter().copied().collect()
    }

    /// Grand total over every cell.
    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    /// Keep only the rows at `indices`, in the given order.
    pub(crate) fn retain_rows(&mut self, indices: &[usize]) {
        self.values = self.values.select_rows(indices);
        self.row_labels = indices.iter().map(|&i| self.row_labels[i].clone()).collect();
    }

    /// Keep only the columns at `indices`, in the given order.
    pub(crate) fn retain_cols(&mut self, indices: &[usize]) {
        self.values = self.values.select_columns(indices);
        self.col_labels = indices.iter().map(|&i| self.col_labels[i].clone()).collect();
    }

    /// Scale every row by its own total. Rows summing to zero are left alone.
    pub(crate) fn scale_rows_to_unit(&mut self) {
        for r in 0..self.values.nrows() {
            let total: f64 = self.values.row(r).sum();
            if total > 0.0 {
                self.values.row_mut(r).unscale_mut(total);
            }
        }
    }

    /// Table view for export or printing.
    pub fn to_table(&self) -> LabeledTable {
        LabeledTable {
            row_labels: self.row_labels.clone(),
            col_labels: self.col_labels.clone(),
            values: self.rows(),
        }
    }

    /// Write as TSV. The header starts with `corner` followed by column labels.
    pub fn write_tsv<W: Write>(&self, writer: W, corner: &str) -> Result<()> {
        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);

        let mut header = Vec::with_capacity(self.col_labels.len() + 1);
        header.push(corner.to_string());
        header.extend(self.col_labels.iter().cloned());
        tsv.write_record(&header)?;

        for (r, label) in self.row_labels.iter().enumerate() {
            let mut record = Vec::with_capacity(self.col_labels.len() + 1);
            record.push(label.clone());
            record.extend(self.values.row(r).iter().map(|v| v.to_string()));
            tsv.write_record(&record)?;
        }
        tsv.flush()?;
        Ok(())
    }

    /// Write as a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P, corner: &str) -> Result<()> {
        let file = File::create(path)?;
        self.write_tsv(BufWriter::new(file), corner)
    }
}

fn check_unique(labels: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(SurveyError::DuplicateLabel(label.clone()));
        }
    }
    Ok(())
}
