//! Error types for template parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::template::TemplateSource;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Position of a problem inside a template: the static fragment it was found
/// in, and a byte range relative to the start of that fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub fragment: usize,
    pub span: Span,
}

impl Location {
    pub fn new(fragment: usize, span: Span) -> Self {
        Self { fragment, span }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("attribute `{name}` opens a quote that is never closed")]
    UnterminatedAttribute { name: String, location: Location },

    #[error("boolean attribute `?{name}` binds {count} expressions, expected exactly one")]
    BooleanAttributeExpressions {
        name: String,
        count: usize,
        location: Location,
    },

    #[error("expression inside <{tag_name}> is not bound to an attribute")]
    UnboundTagExpression { tag_name: String, location: Location },

    #[error("placeholder `${{` is never closed")]
    UnclosedPlaceholder { location: Location },
}

impl TemplateError {
    pub fn location(&self) -> &Location {
        match self {
            TemplateError::UnterminatedAttribute { location, .. }
            | TemplateError::BooleanAttributeExpressions { location, .. }
            | TemplateError::UnboundTagExpression { location, .. }
            | TemplateError::UnclosedPlaceholder { location } => location,
        }
    }

    fn label(&self) -> String {
        match self {
            TemplateError::UnterminatedAttribute { .. } => "quote opened here".to_string(),
            TemplateError::BooleanAttributeExpressions { count, .. } => {
                format!("{} expressions merged into one boolean attribute", count)
            }
            TemplateError::UnboundTagExpression { .. } => {
                "expression follows this tag content".to_string()
            }
            TemplateError::UnclosedPlaceholder { .. } => "placeholder starts here".to_string(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &TemplateSource, filename: &str) -> String {
        let span = source.absolute_span(self.location());
        let message = self.to_string();
        let mut buf = Vec::new();

        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(&message)
            .with_label(
                Label::new((filename, span))
                    .with_message(self.label())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source.text())), &mut buf);

        match written {
            Ok(()) => String::from_utf8(buf).unwrap_or(message),
            Err(_) => message,
        }
    }
}
