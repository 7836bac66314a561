use super::index::{index_directory, list_files};
use super::targets::{ExpectedFiles, SupportTargets};
use super::StagingError;
use crate::config::PipelineConfig;
use crate::reporter::Reporter;
use crate::utils::OUTPUT_FOLDER;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A named input directory handed over by the pipeline runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    pub label: String,
    pub path: Option<PathBuf>,
}

impl InputSource {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: Some(path.into()),
        }
    }

    /// An input the runner did not provide
    pub fn absent(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: None,
        }
    }
}

/// Optional declarations for a staging run
#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    /// Files that must also be placed at a nested path under the event root
    pub support_targets: SupportTargets,
    /// Logical files checked for completeness after copying
    pub expected_files: ExpectedFiles,
}

/// Outcome of a staging run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub event_root_dir: PathBuf,
    pub output_dir: PathBuf,
    pub alt_output_dir: PathBuf,
    /// File names in the order they were copied
    pub copied_files: Vec<String>,
    /// Files pulled from the alternate folder into the primary one
    pub recovered_files: Vec<String>,
    /// Logical names that no alias satisfied
    pub missing_expected: Vec<String>,
    pub support_status: BTreeMap<String, bool>,
}

impl StageResult {
    /// Support targets that no input provided, sorted
    pub fn missing_support(&self) -> Vec<&str> {
        self.support_status
            .iter()
            .filter(|(_, satisfied)| !**satisfied)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Whether every expected file and support target was satisfied
    pub fn is_complete(&self) -> bool {
        self.missing_expected.is_empty() && self.missing_support().is_empty()
    }
}

/// Copy step outputs from `inputs` into `data_dir`.
///
/// Creates `<data_dir>/<event>/output` and `<data_dir>/output` and copies
/// every file found directly inside each input directory into both.
/// Unavailable inputs, unmatched support targets and missing expected
/// files are reported and recorded in the result; only a failed copy
/// aborts the run.
pub async fn stage_outputs(
    config: &PipelineConfig,
    inputs: &[InputSource],
    data_dir: &Path,
    reporter: &dyn Reporter,
    options: &StageOptions,
) -> Result<StageResult, StagingError> {
    let event_root_dir = data_dir.join(config.event_name());
    let output_dir = event_root_dir.join(OUTPUT_FOLDER);
    let alt_output_dir = data_dir.join(OUTPUT_FOLDER);

    fs::create_dir_all(&output_dir).await?;
    fs::create_dir_all(&alt_output_dir).await?;

    let mut support_status: BTreeMap<String, bool> = options
        .support_targets
        .keys()
        .map(|key| (key.to_string(), false))
        .collect();
    let mut copied_files = Vec::new();

    let sources = available_sources(inputs, reporter).await;

    for (label, source_dir) in &sources {
        for (file_name, source_path) in list_files(source_dir).await? {
            copy_file(&source_path, &output_dir.join(&file_name), reporter).await?;
            copy_file(&source_path, &alt_output_dir.join(&file_name), reporter).await?;
            copied_files.push(file_name.clone());
            reporter.info(&format!("Copied {} from {}", file_name, label));

            let support_key = file_name.to_lowercase();
            if let Some(relative_target) = options.support_targets.get(&support_key) {
                let support_path = event_root_dir.join(relative_target);
                if let Some(parent) = support_path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                copy_file(&source_path, &support_path, reporter).await?;
                support_status.insert(support_key, true);
                reporter.info(&format!(
                    "Copied support artifact {} to {}",
                    file_name,
                    support_path.display()
                ));
            }
        }
    }

    let mut output_index = index_directory(&output_dir).await?;
    let alt_index = index_directory(&alt_output_dir).await?;

    let mut recovered_files = Vec::new();
    let mut missing_expected = Vec::new();

    for expected in options.expected_files.iter() {
        let lookups: Vec<String> = expected.aliases().iter().map(|a| a.to_lowercase()).collect();

        if lookups.iter().any(|key| output_index.contains_key(key)) {
            continue;
        }

        let recoverable = lookups
            .iter()
            .find_map(|key| alt_index.get(key).map(|path| (key.clone(), path.clone())));

        match recoverable {
            Some((key, source_path)) => {
                let file_name = source_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| key.clone());
                let destination = output_dir.join(&file_name);
                copy_file(&source_path, &destination, reporter).await?;
                output_index.insert(key, destination);
                reporter.info(&format!("Recovered {} from alternate directory", file_name));
                recovered_files.push(file_name);
            }
            None => {
                reporter.warn(&format!("Missing expected file: {}", expected.logical_name()));
                missing_expected.push(expected.logical_name().to_string());
            }
        }
    }

    let result = StageResult {
        event_root_dir,
        output_dir,
        alt_output_dir,
        copied_files,
        recovered_files,
        missing_expected,
        support_status,
    };

    let missing_support = result.missing_support();
    if !missing_support.is_empty() {
        reporter.warn(&format!(
            "Missing Neo4j support files from staged inputs: {}",
            missing_support.join(", ")
        ));
    }

    if result.copied_files.is_empty() {
        reporter.warn("No files were copied from step outputs; downstream processors may fail");
    } else {
        reporter.info(&format!(
            "Staged {} files from step outputs",
            result.copied_files.len()
        ));
    }

    Ok(result)
}

/// Inputs whose path exists and is a directory, in declaration order
async fn available_sources(
    inputs: &[InputSource],
    reporter: &dyn Reporter,
) -> Vec<(String, PathBuf)> {
    let mut sources = Vec::new();

    for input in inputs {
        let Some(path) = &input.path else {
            continue;
        };

        match fs::metadata(path).await {
            Err(_) => {
                reporter.warn(&format!(
                    "{} path does not exist: {}",
                    input.label,
                    path.display()
                ));
            }
            Ok(metadata) if !metadata.is_dir() => {
                reporter.warn(&format!(
                    "{} path is not a directory: {}",
                    input.label,
                    path.display()
                ));
            }
            Ok(_) => {
                let count = list_files(path).await.map(|f| f.len()).unwrap_or(0);
                reporter.info(&format!("{} contains {} files", input.label, count));
                sources.push((input.label.clone(), path.clone()));
            }
        }
    }

    sources
}

/// Copy `from` to `to`, leaving the file alone when both name the same file
async fn copy_file(from: &Path, to: &Path, reporter: &dyn Reporter) -> Result<(), StagingError> {
    if is_same_file(from, to).await {
        reporter.info(&format!("Skipped copying {} onto itself", from.display()));
        return Ok(());
    }

    fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|source| StagingError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
}

// A destination that cannot be resolved does not exist yet.
async fn is_same_file(from: &Path, to: &Path) -> bool {
    match (fs::canonicalize(from).await, fs::canonicalize(to).await) {
        (Ok(from), Ok(to)) => from == to,
        _ => false,
    }
}
