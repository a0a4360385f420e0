//! Count matrix for ecological survey data.

use super::labeled::LabeledMatrix;
use super::metadata::{SurveyMetadata, Variable};
use crate::error::{Result, SurveyError};
use nalgebra::DMatrix;
use sprs::{CsMat, TriMat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Taxonomic level used when none is given.
pub const DEFAULT_LEVEL: &str = "phylum";

/// What the columns of a [`CountMatrix`] represent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixKind {
    /// Individual amplicon sequence variants.
    Asv,
    /// Taxonomic categories at a fixed rank.
    Taxonomy { level: String },
}

/// Row and column marginals of the relative frequency table, kept from the
/// last chi-squared computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Marginals {
    /// Per-sample share of the grand total.
    pub rows: Vec<f64>,
    /// Per-category share of the grand total.
    pub cols: Vec<f64>,
}

/// Observation counts across samples.
///
/// Rows represent samples, columns represent categories (ASVs or taxa).
/// Every column has a positive total: empty columns are dropped on
/// construction.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    matrix: LabeledMatrix,
    kind: MatrixKind,
    metadata: Option<SurveyMetadata>,
    normalized: bool,
    marginals: Option<Marginals>,
}

impl CountMatrix {
    /// Create an ASV count matrix from dense values (samples × categories).
    ///
    /// Cells must be finite, non-negative whole numbers.
    pub fn new(
        values: DMatrix<f64>,
        sample_ids: Vec<String>,
        category_ids: Vec<String>,
    ) -> Result<Self> {
        let matrix = LabeledMatrix::new(values, sample_ids, category_ids)?;
        Self::from_labeled(matrix)
    }

    /// Create an ASV count matrix from a labeled matrix.
    pub fn from_labeled(matrix: LabeledMatrix) -> Result<Self> {
        validate_counts(&matrix)?;
        Ok(Self::from_parts(matrix, MatrixKind::Asv, None, false))
    }

    /// Create from a sparse matrix in either storage order (samples × categories).
    pub fn from_sparse(
        data: &CsMat<u64>,
        sample_ids: Vec<String>,
        category_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        let mut dense = DMatrix::zeros(nrows, ncols);
        for (&val, (row, col)) in data.iter() {
            dense[(row, col)] += val as f64;
        }
        Self::new(dense, sample_ids, category_ids)
    }

    /// Load a count matrix from a TSV file.
    ///
    /// Expected format:
    /// - First row: header, a corner cell followed by category IDs
    /// - Subsequent rows: sample ID followed by counts
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;
        let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if header.len() < 2 {
            return Err(SurveyError::EmptyData(
                "TSV must have at least one category".to_string(),
            ));
        }
        let category_ids: Vec<String> = header[1..].to_vec();

        let mut sample_ids = Vec::new();
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            let sample_id = record.get(0).unwrap_or_default().to_string();
            let mut row = Vec::with_capacity(category_ids.len());
            for (col_idx, value_str) in record.iter().skip(1).enumerate() {
                let value: u64 =
                    value_str
                        .trim()
                        .parse()
                        .map_err(|_| SurveyError::InvalidCount {
                            value: value_str.to_string(),
                            row: sample_id.clone(),
                            col: category_ids[col_idx].clone(),
                        })?;
                row.push(value as f64);
            }
            sample_ids.push(sample_id);
            rows.push(row);
        }

        if sample_ids.is_empty() {
            return Err(SurveyError::EmptyData("No samples in TSV".to_string()));
        }

        Self::from_labeled(LabeledMatrix::from_rows(&rows, sample_ids, category_ids)?)
    }

    /// Assemble a matrix from validated parts, dropping empty columns.
    pub(crate) fn from_parts(
        matrix: LabeledMatrix,
        kind: MatrixKind,
        metadata: Option<SurveyMetadata>,
        normalized: bool,
    ) -> Self {
        let mut counts = Self {
            matrix,
            kind,
            metadata,
            normalized,
            marginals: None,
        };
        counts.filter_empty_columns();
        counts
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: SurveyMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Write the counts to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.matrix.write_tsv(&mut writer, "sample_id")?;
        writer.flush()?;
        Ok(())
    }

    /// Convert to a sparse CSR matrix (samples × categories).
    ///
    /// Fails on a normalized matrix, whose cells are no longer counts.
    pub fn to_sparse(&self) -> Result<CsMat<u64>> {
        if self.normalized {
            return Err(SurveyError::AlreadyNormalized(
                "sparse count export".to_string(),
            ));
        }
        let (nrows, ncols) = self.shape();
        let mut tri_mat = TriMat::new((nrows, ncols));
        for row in 0..nrows {
            for col in 0..ncols {
                let val = self.get(row, col);
                if val > 0.0 {
                    tri_mat.add_triplet(row, col, val as u64);
                }
            }
        }
        Ok(tri_mat.to_csr())
    }

    /// Get the value at (sample, category).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix.get(row, col)
    }

    /// (samples, categories).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.matrix.len()
    }

    /// Number of categories (columns).
    #[inline]
    pub fn n_categories(&self) -> usize {
        self.matrix.shape().1
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        self.matrix.row_labels()
    }

    /// Category identifiers.
    #[inline]
    pub fn category_ids(&self) -> &[String] {
        self.matrix.col_labels()
    }

    /// Values of sample `i`, or `None` past the last sample.
    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        self.matrix.row(i)
    }

    /// Total counts per sample (read depth).
    pub fn depths(&self) -> Vec<f64> {
        self.matrix.row_sums()
    }

    /// Total counts per category.
    pub fn category_totals(&self) -> Vec<f64> {
        self.matrix.col_sums()
    }

    /// Grand total over all cells.
    pub fn total(&self) -> f64 {
        self.matrix.total()
    }

    #[inline]
    pub fn matrix(&self) -> &LabeledMatrix {
        &self.matrix
    }

    pub fn into_matrix(self) -> LabeledMatrix {
        self.matrix
    }

    #[inline]
    pub fn kind(&self) -> &MatrixKind {
        &self.kind
    }

    /// Taxonomic level of the columns, for taxonomy matrices.
    pub fn level(&self) -> Option<&str> {
        match &self.kind {
            MatrixKind::Taxonomy { level } => Some(level),
            MatrixKind::Asv => None,
        }
    }

    #[inline]
    pub fn metadata(&self) -> Option<&SurveyMetadata> {
        self.metadata.as_ref()
    }

    /// Whether the cells hold relative abundances instead of counts.
    #[inline]
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Marginals from the last chi-squared computation, if still valid.
    #[inline]
    pub fn marginals(&self) -> Option<&Marginals> {
        self.marginals.as_ref()
    }

    pub(crate) fn set_marginals(&mut self, marginals: Marginals) {
        self.marginals = Some(marginals);
    }

    pub(crate) fn matrix_mut(&mut self) -> &mut LabeledMatrix {
        self.marginals = None;
        &mut self.matrix
    }

    pub(crate) fn metadata_mut(&mut self) -> Option<&mut SurveyMetadata> {
        self.metadata.as_mut()
    }

    pub(crate) fn set_normalized(&mut self) {
        self.normalized = true;
    }

    /// Per-sample values of a metadata field.
    pub fn metadata_field(&self, field: &str) -> Result<Vec<(String, Variable)>> {
        self.require_metadata("metadata lookup")?
            .sample_values(field)
    }

    /// Column names of the attached metadata.
    pub fn metadata_fields(&self) -> Result<Vec<String>> {
        Ok(self.require_metadata("metadata field listing")?.columns())
    }

    pub(crate) fn require_metadata(&self, operation: &str) -> Result<&SurveyMetadata> {
        self.metadata
            .as_ref()
            .ok_or_else(|| SurveyError::MissingMetadata(operation.to_string()))
    }

    /// Whole-number counts of sample `i`.
    pub(crate) fn counts_row(&self, i: usize) -> Result<Vec<u64>> {
        let row = self.matrix.row(i).ok_or(SurveyError::IndexOutOfBounds {
            index: i,
            len: self.n_samples(),
        })?;
        Ok(row.into_iter().map(|v| v as u64).collect())
    }
}

fn validate_counts(matrix: &LabeledMatrix) -> Result<()> {
    let (nrows, ncols) = matrix.shape();
    for row in 0..nrows {
        for col in 0..ncols {
            let v = matrix.get(row, col);
            if !v.is_finite() || v < 0.0 || v.fract() != 0.0 {
                return Err(SurveyError::InvalidCount {
                    value: v.to_string(),
                    row: matrix.row_labels()[row].clone(),
                    col: matrix.col_labels()[col].clone(),
                });
            }
        }
    }
    Ok(())
}
