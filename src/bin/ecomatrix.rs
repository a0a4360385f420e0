//! ecomatrix - survey count matrix CLI
//!
//! Command-line interface for dissimilarities, taxonomic aggregation and
//! rarefaction over ASV count tables.

use clap::{Parser, Subcommand, ValueEnum};
use ecomatrix::data::{
    CountMatrix, DissimilarityMatrix, Metric, SurveyMetadata, DEFAULT_LEVEL, DEFAULT_SAMPLE_KEY,
    DEFAULT_VARIANT_KEY,
};
use ecomatrix::error::{Result, SurveyError};
use ecomatrix::pipeline::{Pipeline, PipelineConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// CLI-friendly metric enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMetric {
    /// Chi-squared distance on relative frequencies
    ChiSquared,
    /// Bray-Curtis dissimilarity on counts
    BrayCurtis,
}

impl From<CliMetric> for Metric {
    fn from(metric: CliMetric) -> Self {
        match metric {
            CliMetric::ChiSquared => Metric::ChiSquared,
            CliMetric::BrayCurtis => Metric::BrayCurtis,
        }
    }
}

/// Output format for matrices
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Tsv,
    Json,
}

/// Metadata location and key columns
#[derive(Debug, clap::Args)]
struct MetadataArgs {
    /// Path to metadata TSV (one row per sample and variant)
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Metadata column holding sample IDs
    #[arg(long, default_value = DEFAULT_SAMPLE_KEY)]
    sample_key: String,

    /// Metadata column holding variant IDs
    #[arg(long, default_value = DEFAULT_VARIANT_KEY)]
    variant_key: String,
}

/// Survey count matrix toolkit
#[derive(Parser)]
#[command(name = "ecomatrix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a sample dissimilarity matrix
    Distance {
        /// Path to count matrix TSV (samples as rows)
        #[arg(short = 'c', long)]
        counts: PathBuf,

        /// Dissimilarity metric
        #[arg(long, value_enum, default_value = "bray-curtis")]
        metric: CliMetric,

        /// Drop samples with fewer reads first
        #[arg(long)]
        min_depth: Option<u64>,

        /// Aggregate to this taxonomic level first (requires metadata)
        #[arg(long)]
        level: Option<String>,

        #[command(flatten)]
        metadata: MetadataArgs,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "tsv")]
        format: OutputFormat,
    },

    /// Aggregate ASV counts to a taxonomic level
    Aggregate {
        /// Path to count matrix TSV
        #[arg(short = 'c', long)]
        counts: PathBuf,

        #[command(flatten)]
        metadata: MetadataArgs,

        /// Taxonomic level (metadata column)
        #[arg(short, long, default_value = DEFAULT_LEVEL)]
        level: String,

        /// Output path for the taxonomy matrix TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Drop samples below a minimum read depth
    Filter {
        /// Path to count matrix TSV
        #[arg(short = 'c', long)]
        counts: PathBuf,

        /// Minimum total reads per sample
        #[arg(long)]
        min_depth: u64,

        /// Also drop categories left empty
        #[arg(long)]
        drop_empty: bool,

        /// Output path for the filtered TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rarefaction curve for one sample
    Rarefy {
        /// Path to count matrix TSV
        #[arg(short = 'c', long)]
        counts: PathBuf,

        /// Sample ID
        #[arg(short, long)]
        sample: String,

        /// Depths to draw (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        depths: Vec<usize>,

        /// Draws per depth
        #[arg(short, long, default_value = "10")]
        replicates: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(long)]
        config: PathBuf,

        /// Path to count matrix TSV
        #[arg(short = 'c', long)]
        counts: PathBuf,

        #[command(flatten)]
        metadata: MetadataArgs,

        /// Directory for output files
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Distance {
            counts,
            metric,
            min_depth,
            level,
            metadata,
            output,
            format,
        } => cmd_distance(
            &counts,
            metric.into(),
            min_depth,
            level.as_deref(),
            &metadata,
            &output,
            format,
        ),

        Commands::Aggregate {
            counts,
            metadata,
            level,
            output,
        } => cmd_aggregate(&counts, &metadata, &level, &output),

        Commands::Filter {
            counts,
            min_depth,
            drop_empty,
            output,
        } => cmd_filter(&counts, min_depth, drop_empty, &output),

        Commands::Rarefy {
            counts,
            sample,
            depths,
            replicates,
            seed,
        } => cmd_rarefy(&counts, &sample, &depths, replicates, seed),

        Commands::Run {
            config,
            counts,
            metadata,
            output_dir,
        } => cmd_run(&config, &counts, &metadata, &output_dir),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Load counts and attach metadata when a path is given.
fn load(counts_path: &Path, metadata: &MetadataArgs) -> Result<CountMatrix> {
    tracing::info!(path = ?counts_path, "loading count matrix");
    let mut counts = CountMatrix::from_tsv(counts_path)?;
    if let Some(path) = &metadata.metadata {
        tracing::info!(?path, "loading metadata");
        let meta =
            SurveyMetadata::from_tsv_with_keys(path, &metadata.sample_key, &metadata.variant_key)?;
        counts = counts.with_metadata(meta);
    }
    tracing::info!(
        samples = counts.n_samples(),
        categories = counts.n_categories(),
        "loaded count matrix"
    );
    Ok(counts)
}

fn write_distance(dm: &DissimilarityMatrix, output: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Tsv => dm.to_tsv(output)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&dm.to_table())?;
            std::fs::write(output, json)?;
        }
    }
    tracing::info!(path = ?output, samples = dm.len(), "wrote dissimilarity matrix");
    Ok(())
}

fn cmd_distance(
    counts_path: &Path,
    metric: Metric,
    min_depth: Option<u64>,
    level: Option<&str>,
    metadata: &MetadataArgs,
    output: &Path,
    format: OutputFormat,
) -> Result<()> {
    let counts = load(counts_path, metadata)?;

    let mut pipeline = Pipeline::new().name("distance");
    if let Some(depth) = min_depth {
        pipeline = pipeline.filter_read_depth(depth).filter_empty_columns();
    }
    if let Some(level) = level {
        pipeline = pipeline.aggregate_taxonomy(level);
    }
    pipeline = match metric {
        Metric::ChiSquared => pipeline.chi_squared(),
        Metric::BrayCurtis => pipeline.bray_curtis(),
    };

    let result = pipeline.run(&counts)?;
    for dm in &result.distances {
        write_distance(dm, output, format)?;
    }
    Ok(())
}

fn cmd_aggregate(
    counts_path: &Path,
    metadata: &MetadataArgs,
    level: &str,
    output: &Path,
) -> Result<()> {
    let counts = load(counts_path, metadata)?;
    let taxonomy = counts.taxonomy_matrix(level)?;
    taxonomy.to_tsv(output)?;
    tracing::info!(
        level,
        categories = taxonomy.n_categories(),
        path = ?output,
        "wrote taxonomy matrix"
    );
    Ok(())
}

fn cmd_filter(counts_path: &Path, min_depth: u64, drop_empty: bool, output: &Path) -> Result<()> {
    let mut counts = CountMatrix::from_tsv(counts_path)?;
    let report = counts.filter_read_depth(min_depth);
    eprint!("{}", report);
    if drop_empty {
        let removed = counts.filter_empty_columns();
        tracing::info!(removed, "dropped empty categories");
    }
    counts.to_tsv(output)?;
    Ok(())
}

fn cmd_rarefy(
    counts_path: &Path,
    sample: &str,
    depths: &[usize],
    replicates: usize,
    seed: u64,
) -> Result<()> {
    let counts = CountMatrix::from_tsv(counts_path)?;
    let index = counts
        .sample_ids()
        .iter()
        .position(|s| s == sample)
        .ok_or_else(|| SurveyError::InvalidParameter(format!("sample '{}' not found", sample)))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let curve = counts.rarefaction_curve(index, depths, replicates, &mut rng)?;

    println!("depth\tmean_richness\tstd_dev");
    for point in curve {
        println!(
            "{}\t{:.3}\t{:.3}",
            point.depth, point.mean_richness, point.std_dev
        );
    }
    Ok(())
}

fn cmd_run(
    config_path: &Path,
    counts_path: &Path,
    metadata: &MetadataArgs,
    output_dir: &Path,
) -> Result<()> {
    tracing::info!(path = ?config_path, "loading pipeline configuration");
    let config_str = std::fs::read_to_string(config_path)?;
    let config = PipelineConfig::from_yaml(&config_str)?;

    let counts = load(counts_path, metadata)?;
    let result = Pipeline::from_config(&config).run(&counts)?;

    std::fs::create_dir_all(output_dir)?;
    result.counts.to_tsv(output_dir.join("counts.tsv"))?;
    for (i, dm) in result.distances.iter().enumerate() {
        let name = dm.metric().map(|m| m.name()).unwrap_or("distance");
        dm.to_tsv(output_dir.join(format!("{}_{}.tsv", i + 1, name)))?;
    }
    if !result.depth_reports.is_empty() {
        let json = serde_json::to_string_pretty(&result.depth_reports)?;
        std::fs::write(output_dir.join("depth_filter.json"), json)?;
    }

    tracing::info!(
        pipeline = %config.name,
        distances = result.distances.len(),
        "pipeline finished"
    );
    Ok(())
}
