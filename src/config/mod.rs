mod layout;
mod node;

pub use layout::ProjectLayout;
pub use node::ConfigNode;

use crate::utils::DEFAULT_EVENT_NAME;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config not found at {0}")]
    NotFound(String),
}

/// The event (show) being processed
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventConfig {
    #[serde(default)]
    pub name: Option<String>,
}

/// Post-analysis inputs that are tracked alongside the regular ones
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostAnalysisConfig {
    #[serde(default)]
    pub scan_files: Option<ConfigNode>,
    #[serde(default)]
    pub entry_scan_files: Option<ConfigNode>,
}

/// A `{ "file": "..." }` block
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MappingFileConfig {
    #[serde(default)]
    pub file: Option<String>,
}

/// Graph loader settings; only the mapping files matter for staging
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Neo4jConfig {
    #[serde(default)]
    pub job_stream_mapping: Option<MappingFileConfig>,
    #[serde(default)]
    pub specialization_stream_mapping: Option<MappingFileConfig>,
}

impl Neo4jConfig {
    pub fn job_stream_file(&self) -> Option<&str> {
        non_empty(self.job_stream_mapping.as_ref().and_then(|m| m.file.as_deref()))
    }

    pub fn specialization_file(&self) -> Option<&str> {
        non_empty(
            self.specialization_stream_mapping
                .as_ref()
                .and_then(|m| m.file.as_deref()),
        )
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TheatreCapacityConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub capacity_file: Option<String>,
    #[serde(default)]
    pub session_file: Option<String>,
}

impl Default for TheatreCapacityConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            capacity_file: None,
            session_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecommendationConfig {
    #[serde(default)]
    pub theatre_capacity_limits: TheatreCapacityConfig,
}

/// Pipeline configuration shared by every staging step.
///
/// Unknown keys are ignored; processors further down the pipeline read
/// their own sections from the same file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub input_files: Option<ConfigNode>,
    #[serde(default)]
    pub scan_files: Option<ConfigNode>,
    #[serde(default)]
    pub session_files: Option<ConfigNode>,
    #[serde(default)]
    pub post_analysis_mode: Option<PostAnalysisConfig>,
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub output_files: Option<ConfigNode>,
    #[serde(default)]
    pub scan_output_files: Option<ConfigNode>,
    #[serde(default)]
    pub session_output_files: Option<ConfigNode>,
    #[serde(default)]
    pub recommendation: RecommendationConfig,
}

impl PipelineConfig {
    /// Config for a named event with every other section empty
    pub fn for_event(name: &str) -> Self {
        Self {
            event: EventConfig {
                name: Some(name.to_string()),
            },
            ..Default::default()
        }
    }

    /// The event name, falling back to the default show
    pub fn event_name(&self) -> &str {
        non_empty(self.event.name.as_deref()).unwrap_or(DEFAULT_EVENT_NAME)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a configuration document
pub fn parse_config(content: &str) -> Result<PipelineConfig, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Read the configuration file
pub async fn read_config(config_path: &Path) -> Result<PipelineConfig, ConfigError> {
    if !config_path.exists() {
        return Err(ConfigError::NotFound(config_path.display().to_string()));
    }

    let content = fs::read_to_string(config_path).await?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_defaults() {
        assert_eq!(PipelineConfig::default().event_name(), "ecomm");
        assert_eq!(parse_config(r#"{"event": {"name": "  "}}"#).unwrap().event_name(), "ecomm");
        assert_eq!(PipelineConfig::for_event("bva").event_name(), "bva");
    }

    #[test]
    fn test_parse_config_sections() {
        let config = parse_config(
            r#"{
                "event": {"name": "lva"},
                "input_files": {"main_event_registration": "data/lva/reg.json"},
                "neo4j": {
                    "job_stream_mapping": {"file": "data/lva/job_to_stream.csv"},
                    "specialization_stream_mapping": {"file": ""}
                },
                "recommendation": {"theatre_capacity_limits": {"capacity_file": "teatres.csv"}},
                "unrelated": {"anything": 1}
            }"#,
        )
        .unwrap();

        assert_eq!(config.event_name(), "lva");
        assert_eq!(config.neo4j.job_stream_file(), Some("data/lva/job_to_stream.csv"));
        assert_eq!(config.neo4j.specialization_file(), None);
        assert!(config.recommendation.theatre_capacity_limits.enabled);
        assert_eq!(
            config.input_files.unwrap().file_paths(),
            vec!["data/lva/reg.json"]
        );
    }

    #[test]
    fn test_parse_config_rejects_malformed_json() {
        assert!(matches!(parse_config("{"), Err(ConfigError::JsonError(_))));
    }

    #[tokio::test]
    async fn test_read_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_config(&dir.path().join("config.json")).await;
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
