//! Error types shared across components.

use crate::dom::SelectorError;

/// A component could not be constructed. Aborts the remaining startup.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// An element the page contract requires is absent.
    #[error("required element not found: {0}")]
    MissingElement(&'static str),
    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),
    #[error("invalid validation pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("could not create <{0}> element")]
    CreateElement(&'static str),
}

/// The contact message round trip failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("message rejected: {0}")]
    Rejected(String),
    /// The pending delivery was dropped before it completed.
    #[error("message delivery interrupted")]
    Interrupted,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid portfolio config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Inline validation failure for a single form field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// `label` is the field name with its first letter capitalized.
    #[error("{label} is required")]
    Required { label: String },
    #[error("Please enter a valid email address")]
    InvalidEmail,
}
