use crate::utils::{normalize_config_path, normalize_lexically};
use std::path::{Path, PathBuf};

/// Anchors for resolving relative paths declared in the config.
///
/// `root_dir` is where the pipeline steps run (and where `data/` lives);
/// `project_root` is probed as a second location for shared files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root_dir: PathBuf,
    pub project_root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let project_root = root_dir
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root_dir.clone());
        Self {
            root_dir,
            project_root,
        }
    }

    pub fn with_project_root(mut self, project_root: impl Into<PathBuf>) -> Self {
        self.project_root = project_root.into();
        self
    }

    /// `<root>/data`
    pub fn data_dir(&self) -> PathBuf {
        self.root_dir.join("data")
    }

    /// Absolute config paths are kept, relative ones land under `root_dir`.
    pub fn under_root(&self, value: &str) -> PathBuf {
        let cleaned = value.trim();
        if Path::new(cleaned).is_absolute() {
            normalize_lexically(Path::new(cleaned))
        } else {
            normalize_lexically(&self.root_dir.join(normalize_config_path(cleaned)))
        }
    }

    /// Find an existing file or directory for a config-declared path.
    pub fn resolve_existing_path(&self, value: &str) -> Option<PathBuf> {
        let cleaned = value.trim();
        if cleaned.is_empty() {
            return None;
        }

        let candidates = if Path::new(cleaned).is_absolute() {
            vec![normalize_lexically(Path::new(cleaned))]
        } else {
            let relative = normalize_config_path(cleaned);
            vec![
                normalize_lexically(&self.root_dir.join(&relative)),
                normalize_lexically(&self.project_root.join(&relative)),
            ]
        };

        candidates.into_iter().find(|candidate| candidate.exists())
    }
}
