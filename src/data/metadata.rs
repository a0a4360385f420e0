//! Survey metadata keyed by (sample, variant).
//!
//! Each record links one sample and one sequence variant to descriptive
//! fields, typically site information plus taxonomic rank assignments.

use crate::error::{Result, SurveyError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Default name of the sample identifier column.
pub const DEFAULT_SAMPLE_KEY: &str = "serial_code";
/// Default name of the variant identifier column.
pub const DEFAULT_VARIANT_KEY: &str = "asv";

/// A metadata value that can be categorical, continuous, or ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Ordinal variable with integer rank.
    Ordinal(i64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as ordinal i64.
    pub fn as_ordinal(&self) -> Option<i64> {
        match self {
            Variable::Ordinal(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Categorical(s) => f.write_str(s),
            Variable::Continuous(v) => write!(f, "{}", v),
            Variable::Ordinal(v) => write!(f, "{}", v),
            Variable::Missing => f.write_str("NA"),
        }
    }
}

/// Type hint for metadata columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
    Ordinal,
}

/// One metadata row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub sample_id: String,
    pub variant_id: String,
    /// Descriptive fields by column name. Key columns are not repeated here.
    pub fields: HashMap<String, Variable>,
}

/// Long-format metadata table, one record per (sample, variant) pair.
#[derive(Debug, Clone)]
pub struct SurveyMetadata {
    sample_key: String,
    variant_key: String,
    /// Descriptive column names in file order.
    field_names: Vec<String>,
    records: Vec<MetadataRecord>,
    field_types: HashMap<String, VariableType>,
}

impl SurveyMetadata {
    /// Empty metadata using the default key column names.
    pub fn new() -> Self {
        Self::with_keys(DEFAULT_SAMPLE_KEY, DEFAULT_VARIANT_KEY)
    }

    /// Empty metadata with custom key column names.
    pub fn with_keys(sample_key: &str, variant_key: &str) -> Self {
        Self {
            sample_key: sample_key.to_string(),
            variant_key: variant_key.to_string(),
            field_names: Vec::new(),
            records: Vec::new(),
            field_types: HashMap::new(),
        }
    }

    /// Load metadata from a TSV file with the default key columns.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_tsv_with_keys(path, DEFAULT_SAMPLE_KEY, DEFAULT_VARIANT_KEY)
    }

    /// Load metadata from a TSV file.
    ///
    /// The header must contain `sample_key` and `variant_key`; every other
    /// column becomes a descriptive field. Columns are continuous when every
    /// non-missing value parses as a number, otherwise categorical. Empty
    /// cells and `NA` are missing.
    pub fn from_tsv_with_keys<P: AsRef<Path>>(
        path: P,
        sample_key: &str,
        variant_key: &str,
    ) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;
        let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let sample_idx = header
            .iter()
            .position(|h| h == sample_key)
            .ok_or_else(|| SurveyError::MissingColumn(sample_key.to_string()))?;
        let variant_idx = header
            .iter()
            .position(|h| h == variant_key)
            .ok_or_else(|| SurveyError::MissingColumn(variant_key.to_string()))?;
        let field_cols: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != sample_idx && *i != variant_idx)
            .map(|(i, h)| (i, h.clone()))
            .collect();

        // First pass: collect raw strings to infer types
        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            raw_rows.push(record.iter().map(String::from).collect());
        }
        if raw_rows.is_empty() {
            return Err(SurveyError::EmptyData("No records in metadata".to_string()));
        }

        let mut field_types = HashMap::new();
        for (col_idx, name) in &field_cols {
            let all_numeric = raw_rows.iter().all(|row| {
                let v = row.get(*col_idx).map(|s| s.trim()).unwrap_or("");
                is_missing_token(v) || v.parse::<f64>().is_ok()
            });
            let var_type = if all_numeric {
                VariableType::Continuous
            } else {
                VariableType::Categorical
            };
            field_types.insert(name.clone(), var_type);
        }

        let records = raw_rows
            .into_iter()
            .map(|row| {
                let fields = field_cols
                    .iter()
                    .map(|(col_idx, name)| {
                        let raw = row.get(*col_idx).map(|s| s.trim()).unwrap_or("");
                        (name.clone(), parse_variable(raw, field_types.get(name).copied()))
                    })
                    .collect();
                MetadataRecord {
                    sample_id: row[sample_idx].clone(),
                    variant_id: row[variant_idx].clone(),
                    fields,
                }
            })
            .collect();

        Ok(Self {
            sample_key: sample_key.to_string(),
            variant_key: variant_key.to_string(),
            field_names: field_cols.into_iter().map(|(_, name)| name).collect(),
            records,
            field_types,
        })
    }

    /// Append a record. New field names are registered in first-seen order.
    pub fn push(&mut self, sample_id: &str, variant_id: &str, fields: Vec<(&str, Variable)>) {
        let mut map = HashMap::with_capacity(fields.len());
        for (name, value) in fields {
            if !self.field_types.contains_key(name) {
                self.field_names.push(name.to_string());
                self.field_types.insert(name.to_string(), infer_type(&value));
            }
            map.insert(name.to_string(), value);
        }
        self.records.push(MetadataRecord {
            sample_id: sample_id.to_string(),
            variant_id: variant_id.to_string(),
            fields: map,
        });
    }

    /// Sample identifier column name.
    pub fn sample_key(&self) -> &str {
        &self.sample_key
    }

    /// Variant identifier column name.
    pub fn variant_key(&self) -> &str {
        &self.variant_key
    }

    /// All column names: the two key columns followed by descriptive fields.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = Vec::with_capacity(self.field_names.len() + 2);
        cols.push(self.sample_key.clone());
        cols.push(self.variant_key.clone());
        cols.extend(self.field_names.iter().cloned());
        cols
    }

    /// Check if a column exists (key or descriptive).
    pub fn has_column(&self, column: &str) -> bool {
        column == self.sample_key
            || column == self.variant_key
            || self.field_types.contains_key(column)
    }

    /// Get the type of a descriptive column.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.field_types.get(column).copied()
    }

    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of `column` in one record. Key columns read as categorical.
    fn value_of(&self, record: &MetadataRecord, column: &str) -> Variable {
        if column == self.sample_key {
            Variable::Categorical(record.sample_id.clone())
        } else if column == self.variant_key {
            Variable::Categorical(record.variant_id.clone())
        } else {
            record.fields.get(column).cloned().unwrap_or(Variable::Missing)
        }
    }

    /// Reduce `column` to per-sample values.
    ///
    /// Duplicate (sample, value) pairs collapse to one entry; output follows
    /// first appearance in the table.
    pub fn sample_values(&self, column: &str) -> Result<Vec<(String, Variable)>> {
        if !self.has_column(column) {
            return Err(SurveyError::MissingColumn(column.to_string()));
        }
        let mut seen: HashMap<&str, Vec<Variable>> = HashMap::new();
        let mut out = Vec::new();
        for record in &self.records {
            let value = self.value_of(record, column);
            let values = seen.entry(record.sample_id.as_str()).or_default();
            if !values.contains(&value) {
                values.push(value.clone());
                out.push((record.sample_id.clone(), value));
            }
        }
        Ok(out)
    }

    /// Variant → rank value lookup for a taxonomic level.
    ///
    /// Records repeat the same assignment once per sample, so identical
    /// repeats are fine. Two different non-missing values for one variant
    /// are rejected. Variants with only missing values are left out.
    pub fn rank_lookup(&self, level: &str) -> Result<HashMap<String, String>> {
        if !self.has_column(level) {
            return Err(SurveyError::MissingColumn(level.to_string()));
        }
        let mut lookup: HashMap<String, String> = HashMap::new();
        for record in &self.records {
            let value = self.value_of(record, level);
            if value.is_missing() {
                continue;
            }
            let rank = value.to_string();
            match lookup.get(&record.variant_id) {
                Some(existing) if *existing != rank => {
                    return Err(SurveyError::RankAssignment {
                        variant: record.variant_id.clone(),
                        reason: format!(
                            "conflicting {} assignments '{}' and '{}'",
                            level, existing, rank
                        ),
                    });
                }
                Some(_) => {}
                None => {
                    lookup.insert(record.variant_id.clone(), rank);
                }
            }
        }
        Ok(lookup)
    }

    /// Drop records whose sample is not in `sample_ids`.
    pub fn retain_samples(&mut self, sample_ids: &[String]) {
        let keep: HashSet<&str> = sample_ids.iter().map(String::as_str).collect();
        self.records.retain(|r| keep.contains(r.sample_id.as_str()));
    }

    /// Distinct sample ids in first-seen order.
    pub fn sample_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.sample_id.as_str()))
            .map(|r| r.sample_id.clone())
            .collect()
    }
}

impl Default for SurveyMetadata {
    fn default() -> Self {
        Self::new()
    }
}

fn is_missing_token(v: &str) -> bool {
    v.is_empty() || v == "NA" || v == "na"
}

fn parse_variable(raw: &str, var_type: Option<VariableType>) -> Variable {
    if is_missing_token(raw) {
        return Variable::Missing;
    }
    match var_type {
        Some(VariableType::Continuous) => raw
            .parse::<f64>()
            .map(Variable::Continuous)
            .unwrap_or(Variable::Missing),
        Some(VariableType::Ordinal) => raw
            .parse::<i64>()
            .map(Variable::Ordinal)
            .unwrap_or(Variable::Missing),
        Some(VariableType::Categorical) | None => Variable::Categorical(raw.to_string()),
    }
}

fn infer_type(value: &Variable) -> VariableType {
    match value {
        Variable::Continuous(_) => VariableType::Continuous,
        Variable::Ordinal(_) => VariableType::Ordinal,
        Variable::Categorical(_) | Variable::Missing => VariableType::Categorical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_tsv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "serial_code\tasv\tsite\tdepth_m\tphylum").unwrap();
        writeln!(file, "S1\tasv1\treef\t10\tFirmicutes").unwrap();
        writeln!(file, "S1\tasv2\treef\t10\tProteobacteria").unwrap();
        writeln!(file, "S2\tasv1\tlagoon\t4\tFirmicutes").unwrap();
        writeln!(file, "S2\tasv2\tlagoon\tNA\tProteobacteria").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_metadata() {
        let file = create_test_tsv();
        let meta = SurveyMetadata::from_tsv(file.path()).unwrap();

        assert_eq!(meta.len(), 4);
        assert_eq!(
            meta.columns(),
            vec!["serial_code", "asv", "site", "depth_m", "phylum"]
        );
        assert_eq!(meta.column_type("site"), Some(VariableType::Categorical));
        assert_eq!(meta.column_type("depth_m"), Some(VariableType::Continuous));
        assert!(meta.records()[3].fields["depth_m"].is_missing());
        assert_eq!(meta.sample_ids(), vec!["S1", "S2"]);
    }

    #[test]
    fn test_missing_key_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample\tasv\tphylum").unwrap();
        writeln!(file, "S1\tasv1\tFirmicutes").unwrap();
        file.flush().unwrap();

        let err = SurveyMetadata::from_tsv(file.path()).unwrap_err();
        assert!(matches!(err, SurveyError::MissingColumn(ref c) if c == "serial_code"));

        let meta = SurveyMetadata::from_tsv_with_keys(file.path(), "sample", "asv").unwrap();
        assert_eq!(meta.sample_key(), "sample");
    }

    #[test]
    fn test_sample_values_deduplicates() {
        let file = create_test_tsv();
        let meta = SurveyMetadata::from_tsv(file.path()).unwrap();

        let sites = meta.sample_values("site").unwrap();
        assert_eq!(
            sites,
            vec![
                ("S1".to_string(), Variable::Categorical("reef".into())),
                ("S2".to_string(), Variable::Categorical("lagoon".into())),
            ]
        );

        // S2 carries two distinct depth values (4 and NA)
        let depths = meta.sample_values("depth_m").unwrap();
        assert_eq!(depths.len(), 3);

        assert!(matches!(
            meta.sample_values("salinity"),
            Err(SurveyError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_rank_lookup() {
        let file = create_test_tsv();
        let meta = SurveyMetadata::from_tsv(file.path()).unwrap();

        let lookup = meta.rank_lookup("phylum").unwrap();
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup["asv1"], "Firmicutes");
        assert_eq!(lookup["asv2"], "Proteobacteria");
    }

    #[test]
    fn test_rank_lookup_conflict() {
        let mut meta = SurveyMetadata::new();
        meta.push("S1", "asv1", vec![("phylum", Variable::Categorical("Firmicutes".into()))]);
        meta.push("S2", "asv1", vec![("phylum", Variable::Categorical("Bacteroidota".into()))]);

        let err = meta.rank_lookup("phylum").unwrap_err();
        assert!(matches!(err, SurveyError::RankAssignment { ref variant, .. } if variant == "asv1"));
    }

    #[test]
    fn test_retain_samples() {
        let file = create_test_tsv();
        let mut meta = SurveyMetadata::from_tsv(file.path()).unwrap();
        meta.retain_samples(&["S2".to_string()]);
        assert_eq!(meta.len(), 2);
        assert!(meta.records().iter().all(|r| r.sample_id == "S2"));
    }
}
