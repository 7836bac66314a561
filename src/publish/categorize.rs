use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Output buckets handed to the next pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCategory {
    Registration,
    Scan,
    Session,
}

impl OutputCategory {
    pub const ALL: [OutputCategory; 3] = [
        OutputCategory::Registration,
        OutputCategory::Scan,
        OutputCategory::Session,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputCategory::Registration => "registration",
            OutputCategory::Scan => "scan",
            OutputCategory::Session => "session",
        }
    }

    /// Name of the runner output this bucket is written to
    pub fn output_key(&self) -> &'static str {
        match self {
            OutputCategory::Registration => "output_registration",
            OutputCategory::Scan => "output_scan",
            OutputCategory::Session => "output_session",
        }
    }
}

impl fmt::Display for OutputCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static REGISTRATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:registration_|df_reg_|demographic_)|registration")
        .expect("registration pattern should compile")
});

static SCAN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:scan_|sessions_visited)|scan_").expect("scan pattern should compile")
});

// "teatre" is the spelling used by the theatre capacity exports.
static SESSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^session_|_session_export\.csv$|stream|teatre")
        .expect("session pattern should compile")
});

/// Buckets a processor output belongs to, judged by its file name.
///
/// A file can land in several buckets; an empty result means the file is
/// unclassified.
pub fn categorize_output_file(file_name: &str) -> Vec<OutputCategory> {
    let name = file_name.to_lowercase();
    let rules: [(OutputCategory, &Lazy<Regex>); 3] = [
        (OutputCategory::Registration, &REGISTRATION_PATTERN),
        (OutputCategory::Scan, &SCAN_PATTERN),
        (OutputCategory::Session, &SESSION_PATTERN),
    ];

    rules
        .into_iter()
        .filter(|(_, pattern)| pattern.is_match(&name))
        .map(|(category, _)| category)
        .collect()
}
