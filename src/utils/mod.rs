mod hash;
mod paths;

pub use hash::{compute_file_digest, compute_hash};
pub use paths::{file_name_lower, normalize_config_path, normalize_lexically};

/// Event name used when the config does not declare one
pub const DEFAULT_EVENT_NAME: &str = "ecomm";

/// Name of the flat output folder used by every pipeline step
pub const OUTPUT_FOLDER: &str = "output";

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}
