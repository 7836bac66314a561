use crate::config::{ConfigNode, PipelineConfig, ProjectLayout};
use crate::utils::{file_name_lower, normalize_config_path, normalize_lexically};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One input file declared in the config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFileEntry {
    /// Path as shown in reports (normalized relative path, or the absolute one)
    pub relative_path: String,
    /// Where the file is expected on disk
    pub absolute_path: PathBuf,
    /// Config section that declared it, e.g. `post_analysis_mode.scan_files`
    pub section: String,
    pub found: bool,
}

/// Lookup tables over every config-declared input file
#[derive(Debug, Clone, Default)]
pub struct ConfigFileIndex {
    entries: Vec<ConfigFileEntry>,
    // Lowercase file names in first-declaration order
    names: Vec<String>,
    by_name: HashMap<String, Vec<usize>>,
    by_path: HashMap<PathBuf, Vec<usize>>,
}

impl ConfigFileIndex {
    /// Index the input sections of `config`, anchoring relative paths at `layout.root_dir`
    pub fn build(config: &PipelineConfig, layout: &ProjectLayout) -> Self {
        let mut index = Self::default();

        for (section, node) in declared_sections(config) {
            if node.is_empty() {
                continue;
            }
            for raw_path in node.file_paths() {
                index.add(&section, &raw_path, layout);
            }
        }

        index
    }

    fn add(&mut self, section: &str, raw_path: &str, layout: &ProjectLayout) {
        let cleaned = raw_path.trim();
        if cleaned.is_empty() {
            return;
        }

        let absolute_path = layout.under_root(cleaned);
        let relative_path = if Path::new(cleaned).is_absolute() {
            cleaned.to_string()
        } else {
            normalize_config_path(cleaned)
        };

        let Some(file_name) = file_name_lower(&absolute_path) else {
            return;
        };

        let position = self.entries.len();
        self.entries.push(ConfigFileEntry {
            relative_path,
            absolute_path: absolute_path.clone(),
            section: section.to_string(),
            found: false,
        });

        if !self.by_name.contains_key(&file_name) {
            self.names.push(file_name.clone());
        }
        self.by_name.entry(file_name).or_default().push(position);
        self.by_path.entry(absolute_path).or_default().push(position);
    }

    pub fn entries(&self) -> &[ConfigFileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the declared entry a payload file belongs to.
    ///
    /// Exact (case-insensitive) names win; otherwise the first declared
    /// name that contains, or is contained in, the file name. Among
    /// entries sharing a name the first one not yet found is preferred.
    pub fn match_entry(&self, file_name: &str) -> Option<&ConfigFileEntry> {
        let key = file_name.to_lowercase();

        if let Some(positions) = self.by_name.get(&key) {
            return self.pick(positions);
        }

        self.names
            .iter()
            .find(|candidate| candidate.contains(&key) || key.contains(candidate.as_str()))
            .and_then(|candidate| self.by_name.get(candidate))
            .and_then(|positions| self.pick(positions))
    }

    fn pick(&self, positions: &[usize]) -> Option<&ConfigFileEntry> {
        positions
            .iter()
            .map(|&i| &self.entries[i])
            .find(|entry| !entry.found)
            .or_else(|| positions.first().map(|&i| &self.entries[i]))
    }

    /// Mark every entry declared at `destination` as found
    pub fn mark_found(&mut self, destination: &Path) -> usize {
        let key = normalize_lexically(destination);
        let Some(positions) = self.by_path.get(&key) else {
            return 0;
        };
        for &i in positions {
            self.entries[i].found = true;
        }
        positions.len()
    }

    /// Entries no payload file was routed to, in declaration order
    pub fn missing(&self) -> Vec<&ConfigFileEntry> {
        self.entries.iter().filter(|entry| !entry.found).collect()
    }
}

/// Config sections that declare input files, with their report labels
fn declared_sections(config: &PipelineConfig) -> Vec<(String, ConfigNode)> {
    let mut sections = Vec::new();

    let top_level = [
        ("input_files", &config.input_files),
        ("scan_files", &config.scan_files),
        ("session_files", &config.session_files),
    ];
    for (name, node) in top_level {
        if let Some(node) = node {
            sections.push((name.to_string(), node.clone()));
        }
    }

    if let Some(post_analysis) = &config.post_analysis_mode {
        let nested = [
            ("scan_files", &post_analysis.scan_files),
            ("entry_scan_files", &post_analysis.entry_scan_files),
        ];
        for (name, node) in nested {
            if let Some(node) = node {
                sections.push((format!("post_analysis_mode.{}", name), node.clone()));
            }
        }
    }

    let mapping_files = [
        ("neo4j.job_stream_mapping.file", config.neo4j.job_stream_file()),
        (
            "neo4j.specialization_stream_mapping.file",
            config.neo4j.specialization_file(),
        ),
    ];
    for (name, value) in mapping_files {
        if let Some(value) = value {
            sections.push((name.to_string(), ConfigNode::from(value)));
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn sample_index() -> ConfigFileIndex {
        let config = parse_config(
            r#"{
                "event": {"name": "bva"},
                "input_files": {
                    "main_event_registration": "./data/bva/20250609_registration_BVA24_BVA25.json",
                    "main_event_demographic": "data/bva/demographics.json"
                },
                "scan_files": {"session_this": ["data/bva/BVA25_session_export.csv"]},
                "post_analysis_mode": {"scan_files": {"seminars_scans_this": "data/bva/scans.csv"}},
                "neo4j": {"job_stream_mapping": {"file": "/opt/shared/job_to_stream.csv"}}
            }"#,
        )
        .unwrap();
        ConfigFileIndex::build(&config, &ProjectLayout::new("/srv/steps"))
    }

    #[test]
    fn test_build_collects_every_section() {
        let index = sample_index();
        assert_eq!(index.len(), 5);

        let sections: Vec<&str> = index.entries().iter().map(|e| e.section.as_str()).collect();
        assert!(sections.contains(&"post_analysis_mode.scan_files"));
        assert!(sections.contains(&"neo4j.job_stream_mapping.file"));

        let registration = &index.entries()[1];
        assert_eq!(
            registration.relative_path,
            "data/bva/20250609_registration_BVA24_BVA25.json"
        );
        assert_eq!(
            registration.absolute_path,
            PathBuf::from("/srv/steps/data/bva/20250609_registration_BVA24_BVA25.json")
        );
    }

    #[test]
    fn test_absolute_paths_keep_display_form() {
        let index = sample_index();
        let mapping = index
            .entries()
            .iter()
            .find(|e| e.section == "neo4j.job_stream_mapping.file")
            .unwrap();
        assert_eq!(mapping.relative_path, "/opt/shared/job_to_stream.csv");
        assert_eq!(mapping.absolute_path, PathBuf::from("/opt/shared/job_to_stream.csv"));
    }

    #[test]
    fn test_match_entry_exact_is_case_insensitive() {
        let index = sample_index();
        let entry = index.match_entry("bva25_SESSION_export.csv").unwrap();
        assert_eq!(entry.section, "scan_files");
    }

    #[test]
    fn test_match_entry_substring_fallback() {
        let index = sample_index();
        // declared name contained in the payload name
        let entry = index.match_entry("copy_of_scans.csv").unwrap();
        assert_eq!(entry.relative_path, "data/bva/scans.csv");
        assert!(index.match_entry("unrelated.txt").is_none());
    }

    #[test]
    fn test_mark_found_and_missing() {
        let mut index = sample_index();
        let marked = index.mark_found(Path::new("/srv/steps/data/bva/./demographics.json"));
        assert_eq!(marked, 1);
        assert_eq!(index.mark_found(Path::new("/elsewhere/demographics.json")), 0);
        assert_eq!(index.missing().len(), 4);
    }

    #[test]
    fn test_match_prefers_entry_not_yet_found() {
        let config = parse_config(
            r#"{
                "input_files": {"a": "data/one/reg.json"},
                "scan_files": {"b": "data/two/reg.json"}
            }"#,
        )
        .unwrap();
        let mut index = ConfigFileIndex::build(&config, &ProjectLayout::new("/srv/steps"));

        let first = index.match_entry("reg.json").unwrap().absolute_path.clone();
        index.mark_found(&first);
        let second = index.match_entry("reg.json").unwrap().absolute_path.clone();
        assert_ne!(first, second);

        index.mark_found(&second);
        assert_eq!(index.match_entry("reg.json").unwrap().absolute_path, first);
    }
}
