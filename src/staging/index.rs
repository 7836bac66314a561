use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Map lowercase file name -> path for the regular files directly inside `directory`.
///
/// A directory that does not exist indexes as empty.
pub async fn index_directory(directory: &Path) -> Result<HashMap<String, PathBuf>, std::io::Error> {
    let mut index = HashMap::new();

    let mut entries = match fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(index),
        Err(e) => return Err(e),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_regular_file(&path).await {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        index.insert(name, path);
    }

    Ok(index)
}

/// Regular files directly inside `directory`, sorted by name
pub(crate) async fn list_files(directory: &Path) -> Result<Vec<(String, PathBuf)>, std::io::Error> {
    let mut files = Vec::new();
    let mut entries = fs::read_dir(directory).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_regular_file(&path).await {
            continue;
        }
        files.push((entry.file_name().to_string_lossy().to_string(), path));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

// Follows symlinks, so a link to a file counts as a file.
async fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
