//! Pipeline runner for composing and executing analysis steps.

use crate::data::{CountMatrix, DissimilarityMatrix};
use crate::error::{Result, SurveyError};
use crate::filter::DepthFilterResult;
use serde::{Deserialize, Serialize};

/// A step in the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PipelineStep {
    // === Filtering ===
    /// Drop samples below a minimum read depth.
    FilterReadDepth { min_depth: u64 },
    /// Drop categories left without observations.
    FilterEmptyColumns,

    // === Transformation ===
    /// Convert counts to relative abundances.
    Normalize,
    /// Replace the matrix with its taxonomic roll-up.
    AggregateTaxonomy { level: String },

    // === Dissimilarities ===
    /// Chi-squared distance matrix.
    ChiSquared,
    /// Bray-Curtis dissimilarity matrix.
    BrayCurtis,
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Steps to execute.
    pub steps: Vec<PipelineStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(SurveyError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(SurveyError::from)
    }
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Count matrix after the last step.
    pub counts: CountMatrix,
    /// Reports from read-depth filtering steps, in step order.
    pub depth_reports: Vec<DepthFilterResult>,
    /// Dissimilarity matrices, in step order.
    pub distances: Vec<DissimilarityMatrix>,
}

/// Builder for constructing and running analysis pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    name: String,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Filter samples by minimum read depth.
    pub fn filter_read_depth(mut self, min_depth: u64) -> Self {
        self.steps.push(PipelineStep::FilterReadDepth { min_depth });
        self
    }

    /// Drop empty categories, typically after read-depth filtering.
    pub fn filter_empty_columns(mut self) -> Self {
        self.steps.push(PipelineStep::FilterEmptyColumns);
        self
    }

    /// Convert to relative abundances.
    pub fn normalize(mut self) -> Self {
        self.steps.push(PipelineStep::Normalize);
        self
    }

    /// Aggregate variants to a taxonomic level. Requires metadata.
    pub fn aggregate_taxonomy(mut self, level: &str) -> Self {
        self.steps.push(PipelineStep::AggregateTaxonomy {
            level: level.to_string(),
        });
        self
    }

    /// Compute chi-squared distances.
    pub fn chi_squared(mut self) -> Self {
        self.steps.push(PipelineStep::ChiSquared);
        self
    }

    /// Compute Bray-Curtis dissimilarities.
    pub fn bray_curtis(mut self) -> Self {
        self.steps.push(PipelineStep::BrayCurtis);
        self
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            steps: self.steps.clone(),
        }
    }

    /// Run the pipeline on a copy of `counts`.
    pub fn run(&self, counts: &CountMatrix) -> Result<PipelineOutput> {
        let mut state = PipelineOutput {
            counts: counts.clone(),
            depth_reports: Vec::new(),
            distances: Vec::new(),
        };

        tracing::info!(
            pipeline = %self.name,
            steps = self.steps.len(),
            samples = counts.n_samples(),
            categories = counts.n_categories(),
            "running pipeline"
        );

        for (i, step) in self.steps.iter().enumerate() {
            apply(&mut state, step).map_err(|e| {
                SurveyError::Pipeline(format!("Step {} ({:?}) failed: {}", i + 1, step, e))
            })?;
        }

        Ok(state)
    }
}

fn apply(state: &mut PipelineOutput, step: &PipelineStep) -> Result<()> {
    match step {
        PipelineStep::FilterReadDepth { min_depth } => {
            let report = state.counts.filter_read_depth(*min_depth);
            state.depth_reports.push(report);
        }
        PipelineStep::FilterEmptyColumns => {
            state.counts.filter_empty_columns();
        }
        PipelineStep::Normalize => {
            state.counts.normalize()?;
        }
        PipelineStep::AggregateTaxonomy { level } => {
            state.counts = state.counts.taxonomy_matrix(level)?;
        }
        PipelineStep::ChiSquared => {
            let dm = state.counts.chi_squared_distance()?;
            state.distances.push(dm);
        }
        PipelineStep::BrayCurtis => {
            let dm = state.counts.bray_curtis_distance()?;
            state.distances.push(dm);
        }
    }
    Ok(())
}
