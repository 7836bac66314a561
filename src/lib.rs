pub mod config;
pub mod intake;
pub mod publish;
pub mod reporter;
pub mod staging;
pub mod template;
pub mod utils;

// Re-export commonly used types
pub use config::{read_config, ConfigError, ConfigNode, PipelineConfig, ProjectLayout};
pub use intake::{
    ingest_payload, open_payload_source, IngestResult, IntakeError, MountedDirectory,
    PayloadSource,
};
pub use publish::{
    copy_outputs_by_category, deliver_recommendations, locate_recommendation_artifacts,
    save_outputs, OutputCategory, OutputTargets, PublishError, RunContext, SaveReport,
};
pub use reporter::{MemoryReporter, ReportLevel, Reporter, TracingReporter};
pub use staging::{
    default_expected_files, neo4j_support_targets, stage_outputs, ExpectedFile, ExpectedFiles,
    InputSource, StageOptions, StageResult, StagingError, SupportTargets,
};
pub use template::{SummaryRenderer, TemplateError};
