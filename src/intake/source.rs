use super::IntakeError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

const AZUREML_SCHEME: &str = "azureml://";

/// A file offered by a payload source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFile {
    /// Bare file name, used for matching against config declarations
    pub name: String,
    /// Location inside the source
    pub location: PathBuf,
}

/// Where the input payload comes from.
///
/// Remote filesystems implement this outside the crate; the crate ships
/// the mounted-directory case.
#[async_trait]
pub trait PayloadSource: Send + Sync {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// Every file in the payload, in a stable order
    async fn list_files(&self) -> Result<Vec<PayloadFile>, IntakeError>;

    /// Copy one payload file to a local destination
    async fn fetch(&self, file: &PayloadFile, destination: &Path) -> Result<(), IntakeError>;
}

/// A payload already mounted on the local filesystem
#[derive(Debug, Clone)]
pub struct MountedDirectory {
    root: PathBuf,
}

impl MountedDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl PayloadSource for MountedDirectory {
    fn describe(&self) -> String {
        format!("mounted directory {}", self.root.display())
    }

    async fn list_files(&self) -> Result<Vec<PayloadFile>, IntakeError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            files.push(PayloadFile {
                name: entry.file_name().to_string_lossy().to_string(),
                location: entry.path().to_path_buf(),
            });
        }

        Ok(files)
    }

    async fn fetch(&self, file: &PayloadFile, destination: &Path) -> Result<(), IntakeError> {
        fs::copy(&file.location, destination)
            .await
            .map(|_| ())
            .map_err(|source| IntakeError::Copy {
                from: file.location.clone(),
                to: destination.to_path_buf(),
                source,
            })
    }
}

/// Pick a payload source for a URI or path given on the command line
pub fn open_payload_source(uri_or_path: &str) -> Result<Box<dyn PayloadSource>, IntakeError> {
    let path = Path::new(uri_or_path);
    if path.is_dir() {
        return Ok(Box::new(MountedDirectory::new(path)));
    }

    if uri_or_path.starts_with(AZUREML_SCHEME) {
        return Err(IntakeError::UnsupportedSource(uri_or_path.to_string()));
    }

    Err(IntakeError::UnrecognizedSource(uri_or_path.to_string()))
}
