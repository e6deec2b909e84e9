//! CMS error types

use thiserror::Error;

/// Coarse outcome class of a failed CMS call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The CMS could not be reached or answered with a non-2xx status
    NetworkFailure,
    /// The response body was not what we expected
    DecodeFailure,
    /// No document matched
    NotFound,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NetworkFailure => "network_failure",
            FailureKind::DecodeFailure => "decode_failure",
            FailureKind::NotFound => "not_found",
        }
    }
}

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("invalid CMS endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("refusing to follow cursor outside the CMS origin: {0}")]
    InvalidCursor(String),

    #[error("CMS request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("CMS responded with status {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("failed to decode CMS response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("the CMS API has no master ref")]
    MissingMasterRef,

    #[error("no {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },
}

impl CmsError {
    /// Map onto the three failure classes callers branch on
    pub fn kind(&self) -> FailureKind {
        match self {
            CmsError::NotFound { .. } => FailureKind::NotFound,
            CmsError::Decode(_) | CmsError::MissingMasterRef => FailureKind::DecodeFailure,
            CmsError::Network(e) if e.is_decode() => FailureKind::DecodeFailure,
            CmsError::InvalidEndpoint { .. }
            | CmsError::InvalidCursor(_)
            | CmsError::Network(_)
            | CmsError::Status { .. } => FailureKind::NetworkFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == FailureKind::NotFound
    }
}
