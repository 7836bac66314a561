mod engine;
mod types;

pub use engine::{SummaryRenderer, TemplateError};
pub use types::{
    CompletionMarkerContext, MarkerFile, StepSummaryContext, SummaryLocation, TemplateType,
};
