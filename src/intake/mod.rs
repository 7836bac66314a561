//! Intake of the raw input payload for data preparation.
//!
//! Files from the payload are routed to the locations the config declares
//! for them (matched by file name), and every declared file is tracked so
//! the step can report what the payload was missing.

mod file_index;
mod ingest;
mod source;

pub use file_index::{ConfigFileEntry, ConfigFileIndex};
pub use ingest::{ingest_payload, IngestResult, MissingConfigFile};
pub use source::{open_payload_source, MountedDirectory, PayloadFile, PayloadSource};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to walk payload directory: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("Input path format not recognized: {0}")]
    UnrecognizedSource(String),

    #[error("Input source is not supported by this build: {0}")]
    UnsupportedSource(String),
}
