use super::categorize::{categorize_output_file, OutputCategory};
use super::save::OutputTargets;
use super::PublishError;
use crate::config::ProjectLayout;
use crate::reporter::Reporter;
use crate::utils::OUTPUT_FOLDER;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// What a categorized copy did
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryCopyReport {
    pub counts: BTreeMap<OutputCategory, usize>,
    /// Files that matched no category
    pub unclassified: Vec<String>,
    /// Where unclassified files were sent, if anywhere
    pub fallback_dir: Option<PathBuf>,
}

/// Roots processors write to: the event output folder, then the flat one
fn output_source_roots(layout: &ProjectLayout, event_name: &str) -> Vec<PathBuf> {
    let data_dir = layout.data_dir();
    [
        data_dir.join(event_name).join(OUTPUT_FOLDER),
        data_dir.join(OUTPUT_FOLDER),
    ]
    .into_iter()
    .filter(|root| root.exists())
    .collect()
}

/// Every processor output under the source roots, keyed by lowercase name.
///
/// Files are found recursively; when a name appears twice the event
/// folder copy wins. Entries that cannot be read are reported and skipped.
pub fn collect_output_files(
    layout: &ProjectLayout,
    event_name: &str,
    reporter: &dyn Reporter,
) -> BTreeMap<String, PathBuf> {
    let mut files = BTreeMap::new();

    for root in output_source_roots(layout, event_name) {
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    reporter.warn(&format!(
                        "Skipping unreadable entry under {}: {}",
                        root.display(),
                        e
                    ));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let key = entry.file_name().to_string_lossy().to_lowercase();
            files
                .entry(key)
                .or_insert_with(|| entry.path().to_path_buf());
        }
    }

    files
}

/// Copy processor outputs into the category directories by file-name rules.
///
/// Unclassified files go to the session output (or the scan output when
/// no session output is configured).
pub async fn copy_outputs_by_category(
    layout: &ProjectLayout,
    event_name: &str,
    targets: &OutputTargets,
    reporter: &dyn Reporter,
) -> Result<CategoryCopyReport, PublishError> {
    reporter.info("Copying outputs to step output directories");

    let file_index = collect_output_files(layout, event_name, reporter);
    let mut report = CategoryCopyReport::default();

    if file_index.is_empty() {
        reporter.warn(&format!(
            "No processor outputs discovered for event '{}'; nothing to copy to step outputs",
            event_name
        ));
        return Ok(report);
    }

    for category in OutputCategory::ALL {
        report.counts.insert(category, 0);
    }

    let mut unclassified: Vec<&PathBuf> = Vec::new();

    for source_path in file_index.values() {
        let categories = categorize_output_file(&file_name(source_path));
        if categories.is_empty() {
            unclassified.push(source_path);
            continue;
        }

        for category in categories {
            let Some(destination_dir) = targets.for_category(category) else {
                continue;
            };
            copy_into(source_path, destination_dir).await?;
            *report.counts.entry(category).or_default() += 1;
            reporter.info(&format!(
                "Copied {} to {}",
                file_name(source_path),
                destination_dir.display()
            ));
        }
    }

    report.unclassified = unclassified.iter().map(|p| file_name(p)).collect();

    if !unclassified.is_empty() {
        let fallback = targets
            .for_category(OutputCategory::Session)
            .or_else(|| targets.for_category(OutputCategory::Scan));

        match fallback {
            Some(fallback_dir) => {
                for source_path in &unclassified {
                    copy_into(source_path, fallback_dir).await?;
                }
                reporter.info(&format!(
                    "Copied {} unclassified files to {}",
                    unclassified.len(),
                    fallback_dir.display()
                ));
                report.fallback_dir = Some(fallback_dir.to_path_buf());
            }
            None => {
                reporter.warn(&format!(
                    "{} files could not be categorized and no fallback output was available",
                    unclassified.len()
                ));
            }
        }
    }

    for (category, count) in &report.counts {
        reporter.info(&format!("Category '{}' -> {} files", category, count));
    }

    Ok(report)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub(super) async fn copy_into(source: &Path, destination_dir: &Path) -> Result<PathBuf, PublishError> {
    fs::create_dir_all(destination_dir).await?;
    let destination = destination_dir.join(file_name(source));
    fs::copy(source, &destination)
        .await
        .map_err(|e| PublishError::Copy {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;
    Ok(destination)
}
