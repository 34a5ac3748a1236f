use serde::{Deserialize, Serialize};

/// A struct that represents an error with a context and possibly the propagated source error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContextError {
    pub context: String,
    pub source_error: Option<String>,
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_error {
            Some(source_error) => write!(
                formatter,
                "{}: {}",
                self.context,
                minimize_first_letter(source_error.to_string()),
            ),
            None => write!(formatter, "{}", self.context),
        }
    }
}

impl std::error::Error for ContextError {}

impl ContextError {
    /// Create a new `ContextError` with the given context.
    pub fn with_context<S: Into<String>>(context: S) -> ContextError {
        ContextError {
            context: context.into(),
            source_error: None,
        }
    }

    /// Create a new `ContextError` with the given context and source error.
    pub fn with_error<S: Into<String>>(context: S, error: &dyn std::error::Error) -> ContextError {
        ContextError {
            context: context.into(),
            source_error: Some(error.to_string()),
        }
    }
}

/// The failures surfaced by the document assembler, which is the only recovery boundary
/// of the rendering path.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FormError {
    /// The request is missing something the form cannot be rendered without. Nothing was drawn.
    Validation(ContextError),
    /// Layout or serialization failed. No partial document is ever returned alongside it.
    Render(ContextError),
}

impl FormError {
    /// Retrieve the underlying error with its context, whatever the kind of failure.
    pub fn context_error(&self) -> &ContextError {
        match self {
            FormError::Validation(error) | FormError::Render(error) => error,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FormError::Validation(_))
    }
}

impl std::fmt::Display for FormError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::Validation(error) => write!(formatter, "Invalid request: {}", error),
            FormError::Render(error) => {
                write!(formatter, "Failed to render the form: {}", error)
            }
        }
    }
}

impl std::error::Error for FormError {}

/// Minimizes the first letter of a string, it is used for standardizing the error message.
fn minimize_first_letter(string: String) -> String {
    let mut characters = string.chars();
    match characters.next() {
        None => String::new(),
        Some(character) => character.to_lowercase().chain(characters).collect(),
    }
}
