//! Staging of step outputs into the local data directory.
//!
//! Every file from every input directory is copied into the event-scoped
//! output folder and into a flat sibling folder; downstream steps read
//! from either one. Declared support files also land at a
//! nested path, and declared logical files are checked for completeness
//! afterwards (recovering from the flat folder when possible).

mod index;
mod stage;
mod targets;

pub use index::index_directory;
pub use stage::{stage_outputs, InputSource, StageOptions, StageResult};
pub use targets::{
    default_expected_files, neo4j_support_targets, relative_support_path, ExpectedFile,
    ExpectedFiles, SupportTargets,
};

pub(crate) use index::list_files;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("Expected file '{0}' declares no aliases")]
    EmptyAliases(String),
}
