use serde::Serialize;

/// Built-in text templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateType {
    StepSummary,
    CompletionMarker,
}

impl TemplateType {
    pub const ALL: [TemplateType; 2] = [TemplateType::StepSummary, TemplateType::CompletionMarker];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateType::StepSummary => "step_summary",
            TemplateType::CompletionMarker => "completion_marker",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            TemplateType::StepSummary => STEP_SUMMARY_TEMPLATE,
            TemplateType::CompletionMarker => COMPLETION_MARKER_TEMPLATE,
        }
    }
}

const STEP_SUMMARY_TEMPLATE: &str = "Data Preparation Step Summary
==================================================
Timestamp: {{timestamp}}
Run: {{run_id}}
Configuration: {{config_path}}
Event Type: {{event_name}}
Incremental: {{incremental}}
Files Copied to Outputs: {{files_copied}}

Output Locations:
{{#each locations}}
  - {{name}}: {{path}}
{{#each files}}
      * {{this}}
{{/each}}
{{/each}}
";

const COMPLETION_MARKER_TEMPLATE: &str = "Recommendations processing completed at {{timestamp}}
Status: {{status}}

Output Files:
{{#each files}}
  - {{name}} ({{size_kb}} KB)
{{/each}}
";

/// One output location listed in the step summary
#[derive(Debug, Clone, Serialize)]
pub struct SummaryLocation {
    pub name: String,
    pub path: String,
    /// First few file names in the location
    pub files: Vec<String>,
}

/// Context for the step summary
/// Placeholders: {{timestamp}}, {{run_id}}, {{config_path}}, {{event_name}}, {{incremental}}, {{files_copied}}, {{locations}}
#[derive(Debug, Clone, Serialize)]
pub struct StepSummaryContext {
    pub timestamp: String,
    pub run_id: String,
    pub config_path: String,
    pub event_name: String,
    pub incremental: bool,
    pub files_copied: usize,
    pub locations: Vec<SummaryLocation>,
}

/// A file listed in the completion marker
#[derive(Debug, Clone, Serialize)]
pub struct MarkerFile {
    pub name: String,
    /// Size in KB, two decimals
    pub size_kb: String,
}

/// Context for the recommendations completion marker
/// Placeholders: {{timestamp}}, {{status}}, {{files}}
#[derive(Debug, Clone, Serialize)]
pub struct CompletionMarkerContext {
    pub timestamp: String,
    pub status: String,
    pub files: Vec<MarkerFile>,
}
