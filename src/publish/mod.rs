//! Publication of data preparation outputs to the step's output folders.
//!
//! Processor outputs are sorted into registration / scan / session
//! buckets, either by file-name rules or by the files the config declares,
//! and copied into the directories the pipeline runner mounted for the
//! next step. Recommendation delivery for the final step lives here too.

mod categorize;
mod collect;
mod mappings;
mod metadata;
mod recommendations;
mod save;

pub use categorize::{categorize_output_file, OutputCategory};
pub use collect::{collect_output_files, copy_outputs_by_category, CategoryCopyReport};
pub use mappings::{
    build_output_file_mappings, resolve_output_directory, OutputFileMappings, PlannedCopy,
};
pub use metadata::{build_step_metadata, write_step_metadata, ArtifactDigest, StepMetadata};
pub use recommendations::{
    deliver_recommendations, locate_recommendation_artifacts, read_recommendation_statistics,
    recommendations_dir, DeliveryReport, RecommendationArtifacts, RecommendationStatistics,
    RecommendationSummary,
};
pub use save::{save_outputs, OutputTargets, RunContext, SaveReport};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("Template error: {0}")]
    TemplateError(#[from] crate::template::TemplateError),
}
