use super::categorize::OutputCategory;
use crate::config::{ConfigNode, PipelineConfig, ProjectLayout};
use crate::reporter::Reporter;
use crate::utils::{normalize_lexically, OUTPUT_FOLDER};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Year variants declared for most processed outputs
const YEAR_KEYS: [&str; 3] = ["this_year", "last_year_main", "last_year_secondary"];

const REGISTRATION_SECTIONS: [&str; 3] = [
    "combined_demographic_registration",
    "registration_with_demographic",
    "processed_demographic_data",
];

/// Cached stream catalog some downstream processors still read
const LEGACY_STREAMS_CACHE: &str = "streams_cache.json";

/// A file to copy into a category output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCopy {
    pub source: PathBuf,
    /// Name the file gets in the output directory
    pub dest_name: String,
}

/// Config-declared outputs grouped by category; empty buckets are absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputFileMappings {
    buckets: BTreeMap<OutputCategory, Vec<PlannedCopy>>,
}

impl OutputFileMappings {
    pub fn get(&self, category: OutputCategory) -> &[PlannedCopy] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutputCategory, &[PlannedCopy])> {
        self.buckets.iter().map(|(c, files)| (*c, files.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Directory processors write into: `output_dir` from the config, or `data/<event>`
pub fn resolve_output_directory(config: &PipelineConfig, layout: &ProjectLayout) -> PathBuf {
    match config.output_dir.as_deref().map(str::trim) {
        Some(configured) if !configured.is_empty() => layout.under_root(configured),
        _ => layout.data_dir().join(config.event_name()),
    }
}

/// Queue a config-declared output file, resolving bare names under `base_dir`
fn append_output_file(
    collection: &mut Vec<PlannedCopy>,
    base_dir: &Path,
    value: Option<&str>,
    dest_name: Option<&str>,
) {
    let Some(cleaned) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };

    let source = if Path::new(cleaned).is_absolute() {
        normalize_lexically(Path::new(cleaned))
    } else {
        normalize_lexically(&base_dir.join(cleaned))
    };

    let dest_name = dest_name
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| {
            Path::new(cleaned)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| cleaned.to_string());

    collection.push(PlannedCopy { source, dest_name });
}

fn lookup_str<'a>(node: Option<&'a ConfigNode>, keys: &[&str]) -> Option<&'a str> {
    node.and_then(|n| n.lookup(keys)).and_then(ConfigNode::as_str)
}

fn string_values<'a>(node: Option<&'a ConfigNode>, key: &str) -> Vec<&'a str> {
    node.and_then(|n| n.get(key))
        .map(|section| {
            section
                .entries()
                .into_iter()
                .filter_map(|(_, value)| value.as_str())
                .collect()
        })
        .unwrap_or_default()
}

/// Plan which config-declared outputs go to which category output.
///
/// Support files (stream mappings, raw session inputs, theatre capacity
/// files) are resolved against the project layout up front; declared
/// support files that do not exist are reported and skipped.
pub fn build_output_file_mappings(
    config: &PipelineConfig,
    layout: &ProjectLayout,
    reporter: &dyn Reporter,
) -> OutputFileMappings {
    let standard_output_dir = resolve_output_directory(config, layout).join(OUTPUT_FOLDER);

    let mut registration = Vec::new();
    let mut scan = Vec::new();
    let mut session = Vec::new();

    let output_files = config.output_files.as_ref();
    for section in REGISTRATION_SECTIONS {
        for key in YEAR_KEYS {
            append_output_file(
                &mut registration,
                &standard_output_dir,
                lookup_str(output_files, &[section, key]),
                None,
            );
        }
    }

    let scan_outputs = config.scan_output_files.as_ref();
    for key in YEAR_KEYS.iter().copied().chain(["this_year_post"]) {
        append_output_file(
            &mut scan,
            &standard_output_dir,
            lookup_str(scan_outputs, &["processed_scans", key]),
            None,
        );
    }
    for section in ["sessions_visited", "attended_session_inputs"] {
        for value in string_values(scan_outputs, section) {
            append_output_file(&mut scan, &standard_output_dir, Some(value), None);
        }
    }

    let session_outputs = config.session_output_files.as_ref();
    for key in YEAR_KEYS {
        append_output_file(
            &mut session,
            &standard_output_dir,
            lookup_str(session_outputs, &["processed_sessions", key]),
            None,
        );
    }
    append_output_file(
        &mut session,
        &standard_output_dir,
        lookup_str(session_outputs, &["streams_catalog"]),
        None,
    );
    append_output_file(
        &mut session,
        &standard_output_dir,
        Some(LEGACY_STREAMS_CACHE),
        Some(LEGACY_STREAMS_CACHE),
    );

    let mapping_files = [
        ("job stream", config.neo4j.job_stream_file()),
        ("specialization", config.neo4j.specialization_file()),
    ];
    for (label, value) in mapping_files {
        let Some(value) = value else { continue };
        match layout.resolve_existing_path(value) {
            Some(resolved) => session.push(planned_from(resolved)),
            None => reporter.warn(&format!(
                "Neo4j {} mapping file declared but not found: {}",
                label, value
            )),
        }
    }

    let mut append_support_file = |value: &str, context: &str| match layout.resolve_existing_path(value) {
        Some(resolved) => {
            let planned = planned_from(resolved);
            reporter.info(&format!(
                "Queued {} for session output transfer: {}",
                context, planned.dest_name
            ));
            session.push(planned);
        }
        None => reporter.warn(&format!(
            "Config-declared {} file not found prior to copy: {}",
            context, value
        )),
    };

    if let Some(session_files) = &config.session_files {
        for (key, node) in session_files.entries() {
            for value in node.file_paths() {
                append_support_file(&value, &format!("session_files.{}", key));
            }
        }
    }

    let theatre_limits = &config.recommendation.theatre_capacity_limits;
    if theatre_limits.enabled {
        let declared = [
            ("capacity_file", theatre_limits.capacity_file.as_deref()),
            ("session_file", theatre_limits.session_file.as_deref()),
        ];
        for (field, value) in declared {
            let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            append_support_file(
                value,
                &format!("recommendation.theatre_capacity_limits.{}", field),
            );
        }
    } else {
        reporter.info("Theatre capacity enforcement disabled; skipping capacity/session support files");
    }

    let mut buckets = BTreeMap::new();
    for (category, files) in [
        (OutputCategory::Registration, registration),
        (OutputCategory::Scan, scan),
        (OutputCategory::Session, session),
    ] {
        if !files.is_empty() {
            buckets.insert(category, files);
        }
    }

    OutputFileMappings { buckets }
}

fn planned_from(resolved: PathBuf) -> PlannedCopy {
    let dest_name = resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    PlannedCopy {
        source: resolved,
        dest_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::reporter::{MemoryReporter, ReportLevel};
    use tempfile::TempDir;

    #[test]
    fn test_resolve_output_directory() {
        let layout = ProjectLayout::new("/srv/steps");
        assert_eq!(
            resolve_output_directory(&PipelineConfig::for_event("bva"), &layout),
            PathBuf::from("/srv/steps/data/bva")
        );

        let config = parse_config(r#"{"output_dir": "./data/custom"}"#).unwrap();
        assert_eq!(
            resolve_output_directory(&config, &layout),
            PathBuf::from("/srv/steps/data/custom")
        );

        let config = parse_config(r#"{"output_dir": "/mnt/out"}"#).unwrap();
        assert_eq!(resolve_output_directory(&config, &layout), PathBuf::from("/mnt/out"));
    }

    #[test]
    fn test_declared_outputs_are_bucketed() {
        let config = parse_config(
            r#"{
                "event": {"name": "bva"},
                "output_files": {
                    "combined_demographic_registration": {
                        "this_year": "df_reg_demo_this.csv",
                        "last_year_main": "df_reg_demo_last_bva.csv"
                    },
                    "processed_demographic_data": {"this_year": "/abs/demographic_data_this.json"}
                },
                "scan_output_files": {
                    "processed_scans": {"this_year_post": "scan_this_post.csv"},
                    "sessions_visited": {"last_year_main": "sessions_visited_last_bva.csv"},
                    "attended_session_inputs": {"a": "attended.csv"}
                },
                "session_output_files": {
                    "processed_sessions": {"this_year": "session_this_filtered_valid_cols.csv"},
                    "streams_catalog": "streams.json"
                },
                "recommendation": {"theatre_capacity_limits": {"enabled": false}}
            }"#,
        )
        .unwrap();
        let reporter = MemoryReporter::new();
        let mappings =
            build_output_file_mappings(&config, &ProjectLayout::new("/srv/steps"), &reporter);

        let registration = mappings.get(OutputCategory::Registration);
        assert_eq!(registration.len(), 3);
        assert_eq!(
            registration[0].source,
            PathBuf::from("/srv/steps/data/bva/output/df_reg_demo_this.csv")
        );
        assert_eq!(registration[2].source, PathBuf::from("/abs/demographic_data_this.json"));
        assert_eq!(registration[2].dest_name, "demographic_data_this.json");

        let scan_names: Vec<&str> = mappings
            .get(OutputCategory::Scan)
            .iter()
            .map(|p| p.dest_name.as_str())
            .collect();
        assert_eq!(
            scan_names,
            vec!["scan_this_post.csv", "sessions_visited_last_bva.csv", "attended.csv"]
        );

        let session_names: Vec<&str> = mappings
            .get(OutputCategory::Session)
            .iter()
            .map(|p| p.dest_name.as_str())
            .collect();
        assert_eq!(
            session_names,
            vec!["session_this_filtered_valid_cols.csv", "streams.json", "streams_cache.json"]
        );
        assert!(reporter.contains(ReportLevel::Info, "Theatre capacity enforcement disabled"));
    }

    #[test]
    fn test_support_files_resolved_or_reported() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("steps");
        std::fs::create_dir_all(root.join("data/bva")).unwrap();
        std::fs::write(root.join("data/bva/teatres.csv"), "t").unwrap();
        std::fs::write(root.join("data/bva/job_to_stream.csv"), "j").unwrap();

        let config = parse_config(
            r#"{
                "event": {"name": "bva"},
                "neo4j": {
                    "job_stream_mapping": {"file": "data/bva/job_to_stream.csv"},
                    "specialization_stream_mapping": {"file": "data/bva/missing.csv"}
                },
                "session_files": {"session_this": "data/bva/absent_export.csv"},
                "recommendation": {"theatre_capacity_limits": {"capacity_file": "data/bva/teatres.csv"}}
            }"#,
        )
        .unwrap();
        let reporter = MemoryReporter::new();
        let mappings = build_output_file_mappings(&config, &ProjectLayout::new(&root), &reporter);

        let session_names: Vec<&str> = mappings
            .get(OutputCategory::Session)
            .iter()
            .map(|p| p.dest_name.as_str())
            .collect();
        assert_eq!(
            session_names,
            vec!["streams_cache.json", "job_to_stream.csv", "teatres.csv"]
        );
        assert!(reporter.contains(ReportLevel::Warn, "specialization mapping file declared but not found"));
        assert!(reporter.contains(ReportLevel::Warn, "session_files.session_this"));
        assert!(mappings.get(OutputCategory::Registration).is_empty());
    }

    #[test]
    fn test_only_legacy_cache_without_declarations() {
        let reporter = MemoryReporter::new();
        let mappings = build_output_file_mappings(
            &PipelineConfig::default(),
            &ProjectLayout::new("/srv/steps"),
            &reporter,
        );
        let buckets: Vec<OutputCategory> = mappings.iter().map(|(c, _)| c).collect();
        assert_eq!(buckets, vec![OutputCategory::Session]);
    }
}
