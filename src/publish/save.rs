use super::categorize::OutputCategory;
use super::mappings::{build_output_file_mappings, resolve_output_directory};
use super::metadata::{build_step_metadata, write_step_metadata};
use super::PublishError;
use crate::config::{PipelineConfig, ProjectLayout};
use crate::reporter::Reporter;
use crate::staging::list_files;
use crate::template::SummaryRenderer;
use crate::utils::OUTPUT_FOLDER;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Output directories mounted by the pipeline runner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTargets {
    pub registration: Option<PathBuf>,
    pub scan: Option<PathBuf>,
    pub session: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
}

impl OutputTargets {
    pub fn for_category(&self, category: OutputCategory) -> Option<&Path> {
        match category {
            OutputCategory::Registration => self.registration.as_deref(),
            OutputCategory::Scan => self.scan.as_deref(),
            OutputCategory::Session => self.session.as_deref(),
        }
    }
}

/// How the publishing step was invoked
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub config_path: String,
    pub incremental: bool,
}

/// What `save_outputs` did
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveReport {
    pub copied: BTreeMap<OutputCategory, usize>,
    pub total_copied: usize,
    /// Declared outputs no candidate location provided
    pub not_found: Vec<String>,
    /// Category outputs that were not accessible directories afterwards
    pub inaccessible: Vec<OutputCategory>,
    pub metadata_file: Option<PathBuf>,
}

/// Copy config-declared outputs into the category output directories.
///
/// Each declared file is looked up at its declared path, then under the
/// resolved output directory, then under `data/output`; the first
/// existing candidate is copied. Missing files are reported but do not
/// fail the run. When a metadata target is set, `metadata.json` and a
/// text summary are written there.
pub async fn save_outputs(
    config: &PipelineConfig,
    layout: &ProjectLayout,
    targets: &OutputTargets,
    run: &RunContext,
    reporter: &dyn Reporter,
) -> Result<SaveReport, PublishError> {
    reporter.info("Saving outputs to step output paths");

    let mappings = build_output_file_mappings(config, layout, reporter);
    let output_root = resolve_output_directory(config, layout);
    let flat_output = layout.data_dir().join(OUTPUT_FOLDER);
    let mut report = SaveReport::default();

    for (category, planned_files) in mappings.iter() {
        let Some(output_path) = targets.for_category(category) else {
            continue;
        };

        if let Err(e) = fs::create_dir_all(output_path).await {
            reporter.error(&format!(
                "Failed to create output directory {}: {}",
                output_path.display(),
                e
            ));
            continue;
        }
        reporter.info(&format!(
            "Processing {} -> {}",
            category.output_key(),
            output_path.display()
        ));

        let mut copied_for_output = 0;

        for planned in planned_files {
            let dest_base = Path::new(&planned.dest_name)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&planned.dest_name));
            let candidates = [
                planned.source.clone(),
                output_root.join(&planned.dest_name),
                output_root.join(&dest_base),
                flat_output.join(&planned.dest_name),
            ];

            let mut copied = false;
            for candidate in &candidates {
                if !candidate.is_file() {
                    continue;
                }
                let destination = output_path.join(&planned.dest_name);
                match fs::copy(candidate, &destination).await {
                    Ok(bytes) => {
                        reporter.info(&format!("Copied: {} ({} bytes)", planned.dest_name, bytes));
                        copied_for_output += 1;
                        copied = true;
                        break;
                    }
                    Err(e) => reporter.error(&format!(
                        "Failed to copy {}: {}",
                        planned.dest_name, e
                    )),
                }
            }

            if !copied {
                reporter.warn(&format!(
                    "Not found: {} (searched {} locations)",
                    planned.dest_name,
                    candidates.len()
                ));
                report.not_found.push(planned.dest_name.clone());
            }
        }

        reporter.info(&format!(
            "Summary: {} files copied to {}",
            copied_for_output,
            category.output_key()
        ));
        report.copied.insert(category, copied_for_output);
        report.total_copied += copied_for_output;
    }

    reporter.info(&format!("Total files copied to outputs: {}", report.total_copied));

    if let Some(metadata_dir) = &targets.metadata {
        let locations: BTreeMap<String, PathBuf> = OutputCategory::ALL
            .iter()
            .filter_map(|c| targets.for_category(*c).map(|p| (c.to_string(), p.to_path_buf())))
            .collect();
        let metadata = build_step_metadata(
            &run.config_path,
            config.event_name(),
            run.incremental,
            report.total_copied,
            &locations,
        )
        .await?;
        let renderer = SummaryRenderer::new()?;
        let metadata_file = write_step_metadata(metadata_dir, &metadata, &renderer).await?;
        reporter.info(&format!("Saved metadata to {}", metadata_file.display()));
        report.metadata_file = Some(metadata_file);
    }

    report.inaccessible = verify_outputs(targets, reporter).await;

    Ok(report)
}

/// Check every configured category output is a readable directory
async fn verify_outputs(targets: &OutputTargets, reporter: &dyn Reporter) -> Vec<OutputCategory> {
    let mut inaccessible = Vec::new();

    for category in OutputCategory::ALL {
        let Some(path) = targets.for_category(category) else {
            continue;
        };
        match list_files(path).await {
            Ok(files) => {
                reporter.info(&format!(
                    "{}: accessible ({} files)",
                    category.output_key(),
                    files.len()
                ));
                if !files.is_empty() {
                    let preview: Vec<&str> =
                        files.iter().take(5).map(|(name, _)| name.as_str()).collect();
                    reporter.info(&format!("  Files: {}", preview.join(", ")));
                }
            }
            Err(_) => {
                reporter.error(&format!(
                    "{}: NOT ACCESSIBLE - the next step will fail",
                    category.output_key()
                ));
                inaccessible.push(category);
            }
        }
    }

    inaccessible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::reporter::{MemoryReporter, ReportLevel};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_outputs_probes_candidates() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("steps");
        let event_output = root.join("data/bva/output");
        fs::create_dir_all(&event_output).await.unwrap();
        fs::create_dir_all(root.join("data/output")).await.unwrap();
        fs::write(event_output.join("df_reg_demo_this.csv"), "reg").await.unwrap();
        // Only present in the flat output folder
        fs::write(root.join("data/output/streams.json"), "{}").await.unwrap();

        let config = parse_config(
            r#"{
                "event": {"name": "bva"},
                "output_files": {"combined_demographic_registration": {"this_year": "df_reg_demo_this.csv"}},
                "session_output_files": {"streams_catalog": "streams.json"},
                "recommendation": {"theatre_capacity_limits": {"enabled": false}}
            }"#,
        )
        .unwrap();
        let targets = OutputTargets {
            registration: Some(temp.path().join("out/registration")),
            scan: None,
            session: Some(temp.path().join("out/session")),
            metadata: Some(temp.path().join("out/metadata")),
        };
        let run = RunContext {
            config_path: "config/config_vet_bva.json".to_string(),
            incremental: false,
        };
        let reporter = MemoryReporter::new();

        let report = save_outputs(&config, &ProjectLayout::new(&root), &targets, &run, &reporter)
            .await
            .unwrap();

        assert_eq!(report.total_copied, 2);
        assert_eq!(report.copied.get(&OutputCategory::Registration), Some(&1));
        assert_eq!(report.copied.get(&OutputCategory::Session), Some(&1));
        assert_eq!(report.not_found, vec!["streams_cache.json".to_string()]);
        assert!(report.inaccessible.is_empty());
        assert!(temp.path().join("out/session/streams.json").is_file());
        assert!(temp.path().join("out/metadata/metadata.json").is_file());
        assert!(temp.path().join("out/metadata/step1_summary.txt").is_file());
        assert!(reporter.contains(ReportLevel::Warn, "Not found: streams_cache.json"));
    }

    #[tokio::test]
    async fn test_save_outputs_without_targets_copies_nothing() {
        let temp = TempDir::new().unwrap();
        let reporter = MemoryReporter::new();

        let report = save_outputs(
            &PipelineConfig::for_event("bva"),
            &ProjectLayout::new(temp.path()),
            &OutputTargets::default(),
            &RunContext::default(),
            &reporter,
        )
        .await
        .unwrap();

        assert_eq!(report.total_copied, 0);
        assert!(report.copied.is_empty());
        assert!(report.metadata_file.is_none());
    }
}
