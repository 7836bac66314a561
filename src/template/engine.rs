use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

use super::types::{CompletionMarkerContext, StepSummaryContext, TemplateType};

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    TemplateError(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    RenderError(#[from] handlebars::RenderError),
}

/// Renders the plain-text summary files written next to step outputs
pub struct SummaryRenderer {
    handlebars: Handlebars<'static>,
}

impl SummaryRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        // Output is plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        for template_type in TemplateType::ALL {
            handlebars.register_template_string(template_type.name(), template_type.source())?;
        }

        Ok(Self { handlebars })
    }

    fn render<T: Serialize>(
        &self,
        template_type: TemplateType,
        context: &T,
    ) -> Result<String, TemplateError> {
        self.handlebars
            .render(template_type.name(), context)
            .map_err(TemplateError::from)
    }

    /// Render the data preparation step summary
    pub fn render_step_summary(&self, context: &StepSummaryContext) -> Result<String, TemplateError> {
        self.render(TemplateType::StepSummary, context)
    }

    /// Render the recommendations completion marker
    pub fn render_completion_marker(
        &self,
        context: &CompletionMarkerContext,
    ) -> Result<String, TemplateError> {
        self.render(TemplateType::CompletionMarker, context)
    }
}
