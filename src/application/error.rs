use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::{
    application::render::RenderError, application::source::SourceError, config::LoadError,
    domain::error::DomainError, infra::error::InfraError,
};

/// Flattened cause chain of an error, for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    /// Innermost message of the chain.
    pub fn root_cause(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.messages.join(": "))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("content source failed")]
    Source(#[from] SourceError),
    #[error("page rendering failed")]
    Render(#[from] RenderError),
    #[error("failed to load configuration")]
    Config(#[from] LoadError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
