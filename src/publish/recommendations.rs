use super::collect::copy_into;
use super::PublishError;
use crate::config::ProjectLayout;
use crate::reporter::Reporter;
use crate::staging::list_files;
use crate::template::{CompletionMarkerContext, MarkerFile, SummaryRenderer};
use crate::utils::{now_iso, OUTPUT_FOLDER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

pub const COMPLETION_MARKER_FILE: &str = "recommendations_complete.txt";
pub const RECOMMENDATION_SUMMARY_FILE: &str = "recommendations_summary.json";
pub const RECOMMENDATION_STATISTICS_FILE: &str = "recommendations_statistics.json";

const COMPANION_EXTENSIONS: [&str; 2] = ["csv", "parquet"];

/// The newest recommendation export for a show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationArtifacts {
    pub json: PathBuf,
    /// Companion exports keyed by extension
    pub companions: BTreeMap<String, PathBuf>,
}

impl RecommendationArtifacts {
    /// The JSON export followed by its companions
    pub fn files(&self) -> impl Iterator<Item = (&str, &Path)> {
        std::iter::once(("json", self.json.as_path()))
            .chain(self.companions.iter().map(|(k, v)| (k.as_str(), v.as_path())))
    }
}

/// Where the recommendation processor writes its exports
pub fn recommendations_dir(layout: &ProjectLayout) -> PathBuf {
    layout.data_dir().join(OUTPUT_FOLDER).join("recommendations")
}

/// Find the most recently modified `visitor_recommendations_<show>_*.json`.
///
/// Returns `None` when the directory is missing or holds no export for
/// the show.
pub async fn locate_recommendation_artifacts(
    directory: &Path,
    show_name: &str,
) -> Result<Option<RecommendationArtifacts>, PublishError> {
    let files = match list_files(directory).await {
        Ok(files) => files,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let prefix = format!("visitor_recommendations_{}_", show_name);
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for (name, path) in files {
        if !name.starts_with(&prefix) || !name.ends_with(".json") {
            continue;
        }
        let modified = fs::metadata(&path).await?.modified()?;
        // Ties keep the later name
        if newest.as_ref().map_or(true, |(t, _)| modified >= *t) {
            newest = Some((modified, path));
        }
    }

    let Some((_, json)) = newest else {
        return Ok(None);
    };

    let companions = COMPANION_EXTENSIONS
        .iter()
        .map(|ext| (ext.to_string(), json.with_extension(ext)))
        .filter(|(_, candidate)| candidate.is_file())
        .collect();

    Ok(Some(RecommendationArtifacts { json, companions }))
}

/// Counts taken from the delivered JSON export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationStatistics {
    pub total_rows: usize,
    /// One entry of the `recommendations` array per visitor
    pub unique_visitors: usize,
}

/// Contents of `recommendations_summary.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub status: String,
    /// Located exports keyed by format
    pub output_files: BTreeMap<String, PathBuf>,
    pub statistics: Option<RecommendationStatistics>,
}

/// What `deliver_recommendations` did
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub status: String,
    pub delivered: Vec<PathBuf>,
    pub statistics: Option<RecommendationStatistics>,
    pub summary: PathBuf,
    pub marker: PathBuf,
}

/// Count the `recommendations` array of a JSON export.
///
/// An export that cannot be read or has no such array yields `None`.
pub async fn read_recommendation_statistics(
    json_export: &Path,
    reporter: &dyn Reporter,
) -> Option<RecommendationStatistics> {
    let parsed: Result<serde_json::Value, String> = match fs::read_to_string(json_export).await {
        Ok(content) => serde_json::from_str(&content).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let value = match parsed {
        Ok(value) => value,
        Err(e) => {
            reporter.warn(&format!(
                "Could not read statistics from {}: {}",
                json_export.display(),
                e
            ));
            return None;
        }
    };

    let rows = value.get("recommendations")?.as_array()?.len();
    Some(RecommendationStatistics {
        total_rows: rows,
        unique_visitors: rows,
    })
}

/// Copy the recommendation exports into `output_dir`, write the summary
/// and statistics JSON, then the completion marker listing everything in
/// the directory.
pub async fn deliver_recommendations(
    artifacts: Option<&RecommendationArtifacts>,
    output_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<DeliveryReport, PublishError> {
    reporter.info(&format!("Saving outputs to: {}", output_dir.display()));
    fs::create_dir_all(output_dir).await?;

    let mut delivered = Vec::new();
    let status = match artifacts {
        Some(artifacts) => {
            for (kind, source) in artifacts.files() {
                let destination = copy_into(source, output_dir).await?;
                reporter.info(&format!(
                    "Copied {} recommendations to: {}",
                    kind,
                    destination.display()
                ));
                delivered.push(destination);
            }
            "success"
        }
        None => {
            reporter.warn("No recommendation exports found to deliver");
            "missing"
        }
    };

    let statistics = match artifacts {
        Some(artifacts) => read_recommendation_statistics(&artifacts.json, reporter).await,
        None => None,
    };

    let summary = RecommendationSummary {
        status: status.to_string(),
        output_files: artifacts
            .map(|a| {
                a.files()
                    .map(|(kind, path)| (kind.to_string(), path.to_path_buf()))
                    .collect()
            })
            .unwrap_or_default(),
        statistics: statistics.clone(),
    };
    let summary_path = output_dir.join(RECOMMENDATION_SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?).await?;
    reporter.info(&format!(
        "Saved recommendations summary to: {}",
        summary_path.display()
    ));

    if let Some(statistics) = &statistics {
        let statistics_path = output_dir.join(RECOMMENDATION_STATISTICS_FILE);
        fs::write(&statistics_path, serde_json::to_string_pretty(statistics)?).await?;
        reporter.info(&format!("Saved statistics to: {}", statistics_path.display()));
    }

    let mut files = Vec::new();
    for (name, path) in list_files(output_dir).await? {
        if name == COMPLETION_MARKER_FILE {
            continue;
        }
        let bytes = fs::metadata(&path).await?.len();
        files.push(MarkerFile {
            name,
            size_kb: format!("{:.2}", bytes as f64 / 1024.0),
        });
    }

    let renderer = SummaryRenderer::new()?;
    let marker_content = renderer.render_completion_marker(&CompletionMarkerContext {
        timestamp: now_iso(),
        status: status.to_string(),
        files,
    })?;
    let marker = output_dir.join(COMPLETION_MARKER_FILE);
    fs::write(&marker, marker_content).await?;
    reporter.info(&format!("Created completion marker: {}", marker.display()));

    Ok(DeliveryReport {
        status: status.to_string(),
        delivered,
        statistics,
        summary: summary_path,
        marker,
    })
}
