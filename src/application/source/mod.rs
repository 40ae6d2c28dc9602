//! Content sources.
//!
//! A [`ContentSource`] resolves a normalized [`TopicKey`] to a
//! [`ContentRecord`], possibly after some latency. It is the seam where a
//! remote lookup would plug in; the shipped implementation is
//! [`CatalogSource`], a static catalog with simulated network delay that
//! falls back to a default record for unknown topics.

mod catalog;

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::content::ContentRecord;
use crate::domain::topic::TopicKey;

pub use catalog::{Catalog, CatalogSource, LatencyProfile};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content source unavailable: {message}")]
    Unavailable { message: String },
    #[error("catalog `{origin}` is invalid: {message}")]
    InvalidCatalog { origin: String, message: String },
    #[error("failed to read catalog `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn invalid_catalog(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCatalog {
            origin: origin.into(),
            message: message.into(),
        }
    }
}

/// Resolves topic keys to content records.
///
/// Callers pass keys that are already normalized; lookups are exact.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, key: &TopicKey) -> Result<ContentRecord, SourceError>;
}
