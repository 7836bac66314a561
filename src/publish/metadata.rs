use super::PublishError;
use crate::staging::list_files;
use crate::template::{StepSummaryContext, SummaryLocation, SummaryRenderer};
use crate::utils::{compute_file_digest, now_iso};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const METADATA_FILE: &str = "metadata.json";
pub const SUMMARY_FILE: &str = "step1_summary.txt";

/// Files listed per location in the summary
const SUMMARY_FILES_PER_LOCATION: usize = 10;

/// Digest of a file published to an output location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDigest {
    pub location: String,
    pub name: String,
    pub bytes: u64,
    pub sha256: String,
}

/// Record of a publication run, written as `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepMetadata {
    pub run_id: String,
    pub timestamp: String,
    pub config_path: String,
    pub event_name: String,
    pub incremental: bool,
    pub files_copied: usize,
    pub output_locations: BTreeMap<String, String>,
    pub artifacts: Vec<ArtifactDigest>,
}

/// Describe the current contents of every output location
pub async fn build_step_metadata(
    config_path: &str,
    event_name: &str,
    incremental: bool,
    files_copied: usize,
    output_locations: &BTreeMap<String, PathBuf>,
) -> Result<StepMetadata, PublishError> {
    let mut artifacts = Vec::new();

    for (location, path) in output_locations {
        if !path.is_dir() {
            continue;
        }
        for (name, file_path) in list_files(path).await? {
            let (sha256, bytes) = compute_file_digest(&file_path).await?;
            artifacts.push(ArtifactDigest {
                location: location.clone(),
                name,
                bytes,
                sha256,
            });
        }
    }

    Ok(StepMetadata {
        run_id: uuid::Uuid::new_v4().to_string(),
        timestamp: now_iso(),
        config_path: config_path.to_string(),
        event_name: event_name.to_string(),
        incremental,
        files_copied,
        output_locations: output_locations
            .iter()
            .map(|(k, v)| (k.clone(), v.display().to_string()))
            .collect(),
        artifacts,
    })
}

/// Write `metadata.json` and the human-readable summary into `metadata_dir`
pub async fn write_step_metadata(
    metadata_dir: &Path,
    metadata: &StepMetadata,
    renderer: &SummaryRenderer,
) -> Result<PathBuf, PublishError> {
    fs::create_dir_all(metadata_dir).await?;

    let metadata_path = metadata_dir.join(METADATA_FILE);
    let content = serde_json::to_string_pretty(metadata)?;
    fs::write(&metadata_path, content).await?;

    let context = StepSummaryContext {
        timestamp: metadata.timestamp.clone(),
        run_id: metadata.run_id.clone(),
        config_path: metadata.config_path.clone(),
        event_name: metadata.event_name.clone(),
        incremental: metadata.incremental,
        files_copied: metadata.files_copied,
        locations: metadata
            .output_locations
            .iter()
            .map(|(name, path)| SummaryLocation {
                name: name.clone(),
                path: path.clone(),
                files: metadata
                    .artifacts
                    .iter()
                    .filter(|a| &a.location == name)
                    .take(SUMMARY_FILES_PER_LOCATION)
                    .map(|a| a.name.clone())
                    .collect(),
            })
            .collect(),
    };
    let summary = renderer.render_step_summary(&context)?;
    fs::write(metadata_dir.join(SUMMARY_FILE), summary).await?;

    Ok(metadata_path)
}
