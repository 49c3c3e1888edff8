//! Lifecycle build failures

use std::time::Duration;
use thiserror::Error;

use crate::resource::{FetchError, InvalidTemplateId};

/// Why a component build was rejected
///
/// Cloneable because every caller sharing a pending build receives the
/// same outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidTemplateId),

    /// Template request failed (transport error or non-success status)
    #[error("failed to fetch template: {0}")]
    TemplateFetch(FetchError),

    /// Template answered but its body could not be read
    #[error("failed to read template body: {0}")]
    TemplateBody(FetchError),

    /// Stylesheet link reported a load error
    #[error("stylesheet {href} failed to load: {cause}")]
    StylesheetLoad { href: String, cause: FetchError },

    #[error("component build timed out after {0:?}")]
    Timeout(Duration),

    #[error("component build cancelled")]
    Cancelled,

    #[error("component was detached")]
    Detached,
}

impl LifecycleError {
    /// Classify a template fetch failure by stage
    pub(crate) fn from_template(error: FetchError) -> Self {
        match error {
            FetchError::Body { .. } => Self::TemplateBody(error),
            other => Self::TemplateFetch(other),
        }
    }
}
