use super::StagingError;
use crate::config::PipelineConfig;
use crate::utils::normalize_config_path;
use std::collections::BTreeMap;

/// A logical file and the literal names it may appear under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedFile {
    logical_name: String,
    aliases: Vec<String>,
}

impl ExpectedFile {
    pub fn new(
        logical_name: impl Into<String>,
        aliases: Vec<String>,
    ) -> Result<Self, StagingError> {
        let logical_name = logical_name.into();
        if aliases.is_empty() {
            return Err(StagingError::EmptyAliases(logical_name));
        }
        Ok(Self {
            logical_name,
            aliases,
        })
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// Ordered set of expected logical files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedFiles {
    entries: Vec<ExpectedFile>,
}

impl ExpectedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(logical name, aliases)` pairs, keeping their order
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, StagingError>
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut files = Self::new();
        for (name, aliases) in pairs {
            files.push(ExpectedFile::new(name, aliases)?);
        }
        Ok(files)
    }

    /// Add an entry, replacing an earlier one with the same logical name
    pub fn push(&mut self, file: ExpectedFile) {
        self.entries
            .retain(|f| f.logical_name != file.logical_name);
        self.entries.push(file);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExpectedFile> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase file name -> path relative to the event root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportTargets {
    targets: BTreeMap<String, String>,
}

impl SupportTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target; the first registration for a name wins.
    pub fn insert(&mut self, file_name: &str, relative_path: impl Into<String>) {
        self.targets
            .entry(file_name.to_lowercase())
            .or_insert_with(|| relative_path.into());
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.targets
            .get(&file_name.to_lowercase())
            .map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Path of a support file relative to the event root.
///
/// Paths under `data/<event>/` keep their nesting below that prefix;
/// anything else is reduced to its file name.
pub fn relative_support_path(value: &str, event_name: &str) -> String {
    let normalized = normalize_config_path(value);
    let event_prefix = format!("data/{}/", event_name);

    if let Some(head) = normalized.get(..event_prefix.len()) {
        if head.eq_ignore_ascii_case(&event_prefix) {
            return normalized[event_prefix.len()..].to_string();
        }
    }

    normalized
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Support targets for the stream mapping files the graph loader reads
pub fn neo4j_support_targets(config: &PipelineConfig) -> SupportTargets {
    let event_name = config.event_name();
    let mut targets = SupportTargets::new();

    let mapping_files = [
        config.neo4j.job_stream_file(),
        config.neo4j.specialization_file(),
    ];

    for value in mapping_files.into_iter().flatten() {
        let relative = relative_support_path(value, event_name);
        let Some(file_name) = relative.rsplit('/').next().filter(|n| !n.is_empty()) else {
            continue;
        };
        targets.insert(file_name, relative.clone());
    }

    targets
}

/// Artifacts the graph preparation step expects from data preparation
const DEFAULT_EXPECTED: &[(&str, &[&str])] = &[
    // Registration outputs
    ("df_reg_demo_this.csv", &["df_reg_demo_this.csv"]),
    ("df_reg_demo_last_bva.csv", &["df_reg_demo_last_bva.csv"]),
    ("df_reg_demo_last_lva.csv", &["df_reg_demo_last_lva.csv"]),
    (
        "registration_data_with_demographicdata_bva_this.csv",
        &["Registration_data_with_demographicdata_bva_this.csv"],
    ),
    (
        "registration_data_with_demographicdata_bva_last.csv",
        &["Registration_data_with_demographicdata_bva_last.csv"],
    ),
    (
        "registration_data_with_demographicdata_lva_last.csv",
        &["Registration_data_with_demographicdata_lva_last.csv"],
    ),
    (
        "registration_data_with_demographicdata_lva_this.csv",
        &["Registration_data_with_demographicdata_lva_this.csv"],
    ),
    // Scan outputs
    ("sessions_visited_last_bva.csv", &["sessions_visited_last_bva.csv"]),
    ("sessions_visited_last_lva.csv", &["sessions_visited_last_lva.csv"]),
    ("scan_bva_past.csv", &["scan_bva_past.csv"]),
    ("scan_lva_past.csv", &["scan_lva_past.csv"]),
    // Session outputs
    (
        "session_this_filtered_valid_cols.csv",
        &["session_this_filtered_valid_cols.csv"],
    ),
    (
        "session_last_filtered_valid_cols_bva.csv",
        &["session_last_filtered_valid_cols_bva.csv"],
    ),
    (
        "session_last_filtered_valid_cols_lva.csv",
        &["session_last_filtered_valid_cols_lva.csv"],
    ),
    ("streams.json", &["streams.json"]),
    ("streams_cache.json", &["streams_cache.json"]),
    ("job_to_stream.csv", &["job_to_stream.csv"]),
    ("spezialization_to_stream.csv", &["spezialization_to_stream.csv"]),
    ("teatres.csv", &["teatres.csv"]),
    ("bva25_session_export.csv", &["BVA25_session_export.csv"]),
    ("lvs24_session_export.csv", &["LVS24_session_export.csv"]),
    ("lvs25_session_export.csv", &["LVS25_session_export.csv"]),
];

/// Get the expected-file table used when staging data preparation outputs
pub fn default_expected_files() -> ExpectedFiles {
    let mut files = ExpectedFiles::new();
    for (name, aliases) in DEFAULT_EXPECTED {
        files.entries.push(ExpectedFile {
            logical_name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        });
    }
    files
}
