use super::file_index::ConfigFileIndex;
use super::source::PayloadSource;
use super::IntakeError;
use crate::config::{PipelineConfig, ProjectLayout};
use crate::reporter::Reporter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A declared input the payload did not provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingConfigFile {
    pub relative_path: String,
    pub section: String,
}

/// Outcome of routing a payload into the data directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestResult {
    pub event_dir: PathBuf,
    /// Destination of every copied file, in copy order
    pub copied: Vec<PathBuf>,
    pub missing: Vec<MissingConfigFile>,
}

/// Copy the input payload into the locations the config declares.
///
/// Payload files whose name matches a declared input go to that declared
/// path; anything else lands directly under `<data_dir>/<event>`.
pub async fn ingest_payload(
    config: &PipelineConfig,
    layout: &ProjectLayout,
    source: &dyn PayloadSource,
    data_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<IngestResult, IntakeError> {
    reporter.info(&format!("Processing input data from: {}", source.describe()));

    let event_dir = data_dir.join(config.event_name());
    fs::create_dir_all(&event_dir).await?;

    let mut file_index = ConfigFileIndex::build(config, layout);
    if file_index.is_empty() {
        reporter.warn(
            "No config-driven input files detected; all files will be placed directly under the event folder",
        );
    } else {
        reporter.info(&format!(
            "Tracking {} config-defined input files before copying payload",
            file_index.len()
        ));
    }

    let mut result = IngestResult {
        event_dir: event_dir.clone(),
        ..Default::default()
    };

    for file in source.list_files().await? {
        let matched = file_index
            .match_entry(&file.name)
            .map(|entry| (entry.absolute_path.clone(), entry.relative_path.clone()));

        let destination = match &matched {
            Some((absolute_path, _)) => absolute_path.clone(),
            None => event_dir.join(&file.name),
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }
        source.fetch(&file, &destination).await?;
        file_index.mark_found(&destination);

        match &matched {
            Some((_, relative_path)) => reporter.info(&format!(
                "Copied config file: {} -> {}",
                file.location.display(),
                relative_path
            )),
            None => reporter.info(&format!(
                "Copied unmapped file: {} -> {}",
                file.location.display(),
                destination.display()
            )),
        }

        result.copied.push(destination);
    }

    result.missing = report_missing(&file_index, reporter);
    reporter.info(&format!("Successfully processed {} files", result.copied.len()));

    Ok(result)
}

fn report_missing(file_index: &ConfigFileIndex, reporter: &dyn Reporter) -> Vec<MissingConfigFile> {
    if file_index.is_empty() {
        return Vec::new();
    }

    let missing: Vec<MissingConfigFile> = file_index
        .missing()
        .into_iter()
        .map(|entry| MissingConfigFile {
            relative_path: entry.relative_path.clone(),
            section: entry.section.clone(),
        })
        .collect();

    if missing.is_empty() {
        reporter.info("All config-declared input files were located in the payload.");
    } else {
        reporter.warn("Config declared input files missing from payload:");
        for entry in &missing {
            reporter.warn(&format!(
                "  - {} (section: {})",
                entry.relative_path, entry.section
            ));
        }
    }

    missing
}
