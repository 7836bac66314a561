use std::path::{Component, Path, PathBuf};

/// Normalize a config-declared relative path: forward slashes, no leading `./` or `/`.
pub fn normalize_config_path(value: &str) -> String {
    let mut normalized = value.trim().replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    normalized.trim_start_matches('/').to_string()
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    result.components().next_back(),
                    Some(Component::Normal(_))
                ) && result.pop();
                if !popped && !result.has_root() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Lowercased final path component, if any
pub fn file_name_lower(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
}
