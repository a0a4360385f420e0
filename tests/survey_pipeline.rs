//! Integration tests for loading survey tables and computing dissimilarities.

use approx::assert_relative_eq;
use ecomatrix::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use tempfile::NamedTempFile;

const COUNTS_TSV: &str = "\
sample_id\tasv1\tasv2\tasv3\tasv4\tasv5
S1\t120\t30\t0\t50\t0
S2\t80\t60\t10\t40\t0
S3\t3\t1\t0\t0\t0
S4\t0\t90\t45\t15\t0
";

const METADATA_TSV: &str = "\
serial_code\tasv\tphylum\tclass\tdepth_m
S1\tasv1\tFirmicutes\tBacilli\t5
S1\tasv2\tBacteroidota\tBacteroidia\t5
S1\tasv4\tFirmicutes\tClostridia\t5
S2\tasv1\tFirmicutes\tBacilli\t12
S2\tasv2\tBacteroidota\tBacteroidia\t12
S2\tasv3\tProteobacteria\tGammaproteobacteria\t12
S2\tasv4\tFirmicutes\tClostridia\t12
S3\tasv1\tFirmicutes\tBacilli\tNA
S3\tasv2\tBacteroidota\tBacteroidia\tNA
S4\tasv2\tBacteroidota\tBacteroidia\t30
S4\tasv3\tProteobacteria\tGammaproteobacteria\t30
S4\tasv4\tFirmicutes\tClostridia\t30
";

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn load_survey() -> (CountMatrix, NamedTempFile, NamedTempFile) {
    let counts_file = write_temp(COUNTS_TSV);
    let meta_file = write_temp(METADATA_TSV);
    let counts = CountMatrix::from_tsv(counts_file.path()).unwrap();
    let metadata = SurveyMetadata::from_tsv(meta_file.path()).unwrap();
    (counts.with_metadata(metadata), counts_file, meta_file)
}

#[test]
fn test_load_drops_empty_columns() {
    let (counts, _c, _m) = load_survey();

    assert_eq!(counts.n_samples(), 4);
    // asv5 is empty in every sample
    assert_eq!(counts.category_ids(), &["asv1", "asv2", "asv3", "asv4"]);
    assert_eq!(counts.depths(), vec![200.0, 190.0, 4.0, 150.0]);
    assert_eq!(counts.kind(), &MatrixKind::Asv);
    assert!(!counts.is_normalized());
}

#[test]
fn test_metadata_loading() {
    let (counts, _c, _m) = load_survey();
    let metadata = counts.metadata().unwrap();

    assert_eq!(metadata.len(), 12);
    assert_eq!(metadata.column_type("phylum"), Some(VariableType::Categorical));
    assert_eq!(metadata.column_type("depth_m"), Some(VariableType::Continuous));

    let depths = counts.metadata_field("depth_m").unwrap();
    let s3 = depths.iter().find(|(s, _)| s == "S3").unwrap();
    assert!(s3.1.is_missing());
}

#[test]
fn test_invalid_count_reports_location() {
    let file = write_temp("sample_id\tasv1\tasv2\nS1\t4\tx\n");
    let err = CountMatrix::from_tsv(file.path()).unwrap_err();
    match err {
        SurveyError::InvalidCount { value, row, col } => {
            assert_eq!(value, "x");
            assert_eq!(row, "S1");
            assert_eq!(col, "asv2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_depth_filter_then_distances() {
    let (mut counts, _c, _m) = load_survey();

    let report = counts.filter_read_depth(100);
    assert_eq!(report.removed_samples, vec!["S3"]);
    assert_eq!(report.n_after, 3);
    assert!(!counts.metadata().unwrap().sample_ids().contains(&"S3".to_string()));

    let bc = counts.bray_curtis_distance().unwrap();
    assert_eq!(bc.labels(), &["S1", "S2", "S4"]);
    // S1 vs S2: sum|a-b| = 40 + 30 + 10 + 10 = 90, total = 390
    assert_relative_eq!(bc.get(0, 1), 90.0 / 390.0, epsilon = 1e-12);
    assert_relative_eq!(bc.get(1, 0), bc.get(0, 1));
    assert_eq!(bc.get(2, 2), 0.0);

    let chi = counts.chi_squared_distance().unwrap();
    assert_eq!(chi.metric(), Some(Metric::ChiSquared));
    assert!(chi.max_asymmetry() < 1e-12);
    let marginals = counts.marginals().unwrap();
    assert_relative_eq!(marginals.rows.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(marginals.cols.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_taxonomy_aggregation_from_files() {
    let (counts, _c, _m) = load_survey();
    let phyla = counts.taxonomy_matrix("phylum").unwrap();

    assert_eq!(phyla.level(), Some("phylum"));
    assert_eq!(
        phyla.category_ids(),
        &["Bacteroidota", "Firmicutes", "Proteobacteria"]
    );
    // Firmicutes = asv1 + asv4
    assert_eq!(phyla.get(0, 1), 170.0);
    assert_eq!(phyla.get(3, 1), 15.0);
    assert_eq!(phyla.depths(), counts.depths());
    assert_relative_eq!(phyla.total(), counts.total());
}

#[test]
fn test_missing_rank_is_an_error() {
    let counts_file = write_temp(COUNTS_TSV);
    let meta_file = write_temp(
        "serial_code\tasv\tphylum\n\
         S1\tasv1\tFirmicutes\n\
         S1\tasv2\tBacteroidota\n\
         S1\tasv4\tFirmicutes\n",
    );
    let counts = CountMatrix::from_tsv(counts_file.path())
        .unwrap()
        .with_metadata(SurveyMetadata::from_tsv(meta_file.path()).unwrap());

    let err = counts.taxonomy_matrix("phylum").unwrap_err();
    assert!(matches!(err, SurveyError::RankAssignment { ref variant, .. } if variant == "asv3"));
}

#[test]
fn test_custom_metadata_keys() {
    let counts_file = write_temp(COUNTS_TSV);
    let meta_file = write_temp(&METADATA_TSV.replacen("serial_code\tasv", "site\tvariant", 1));

    assert!(matches!(
        SurveyMetadata::from_tsv(meta_file.path()),
        Err(SurveyError::MissingColumn(_))
    ));

    let metadata = SurveyMetadata::from_tsv_with_keys(meta_file.path(), "site", "variant").unwrap();
    assert_eq!(metadata.sample_key(), "site");
    let classes = CountMatrix::from_tsv(counts_file.path())
        .unwrap()
        .with_metadata(metadata)
        .taxonomy_matrix("class")
        .unwrap();
    assert_eq!(classes.n_categories(), 4);
}

#[test]
fn test_yaml_pipeline_end_to_end() {
    let (counts, _c, _m) = load_survey();
    let config = PipelineConfig::from_yaml(
        r#"
name: phylum-beta
description: phylum level beta diversity
steps:
  - step: filter_read_depth
    min_depth: 100
  - step: filter_empty_columns
  - step: aggregate_taxonomy
    level: phylum
  - step: bray_curtis
  - step: chi_squared
"#,
    )
    .unwrap();

    let output = Pipeline::from_config(&config).run(&counts).unwrap();
    assert_eq!(output.depth_reports[0].n_removed, 1);
    assert_eq!(output.counts.n_samples(), 3);
    assert_eq!(output.distances.len(), 2);
    for dm in &output.distances {
        assert_eq!(dm.labels(), output.counts.sample_ids());
        assert!(dm.max_asymmetry() < 1e-12);
    }
}

#[test]
fn test_distance_tsv_output() {
    let (counts, _c, _m) = load_survey();
    let dm = counts.bray_curtis_distance().unwrap();

    let out = NamedTempFile::new().unwrap();
    dm.to_tsv(out.path()).unwrap();
    let written = std::fs::read_to_string(out.path()).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next().unwrap(), "bray-curtis\tS1\tS2\tS3\tS4");
    assert_eq!(written.lines().count(), 5);

    let json = serde_json::to_value(dm.to_table()).unwrap();
    assert_eq!(json["metric"], "bray-curtis");
    assert_eq!(json["row_labels"].as_array().unwrap().len(), 4);
}

#[test]
fn test_counts_tsv_roundtrip() {
    let (counts, _c, _m) = load_survey();
    let out = NamedTempFile::new().unwrap();
    counts.to_tsv(out.path()).unwrap();

    let reloaded = CountMatrix::from_tsv(out.path()).unwrap();
    assert_eq!(reloaded.sample_ids(), counts.sample_ids());
    assert_eq!(reloaded.category_ids(), counts.category_ids());
    assert_eq!(reloaded.matrix().values(), counts.matrix().values());
}

#[test]
fn test_rarefaction_reproducible() {
    let (counts, _c, _m) = load_survey();

    let mut rng = StdRng::seed_from_u64(7);
    let first = counts.sample(1, 50, &mut rng).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let second = counts.sample(1, 50, &mut rng).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.iter().sum::<u64>(), 50);

    let mut rng = StdRng::seed_from_u64(7);
    let curve = counts
        .rarefaction_curve(1, &[1, 50, 190, 500], 5, &mut rng)
        .unwrap();
    assert_eq!(curve.len(), 3);
    assert_eq!(curve[0].mean_richness, 1.0);
    // the full depth always recovers all four variants
    assert_eq!(curve[2].mean_richness, 4.0);
    assert_eq!(curve[2].std_dev, 0.0);
}

#[test]
fn test_sample_too_large() {
    let (counts, _c, _m) = load_survey();
    let mut rng = StdRng::seed_from_u64(1);
    let err = counts.sample(2, 5, &mut rng).unwrap_err();
    assert!(matches!(
        err,
        SurveyError::SampleTooLarge {
            requested: 5,
            available: 4
        }
    ));
}
