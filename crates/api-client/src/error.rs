//! Error types for the FOLIO client

use folio_core::PollError;
use thiserror::Error;

/// Result type alias for FOLIO operations
pub type FolioResult<T> = Result<T, FolioError>;

/// Body fragment FOLIO returns when two writers race on the same record
pub const DUPLICATE_KEY_SIGNATURE: &str = "duplicate key value violates unique constraint";

/// Typed classification of a non-success HTTP response
///
/// Built by [`UnexpectedResponse::from_status`]. Every variant keeps the
/// response body for diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnexpectedResponse {
    /// 401
    #[error("There was a problem with the access token: {body}")]
    Unauthorized {
        /// Response body
        body: String,
    },

    /// 403
    #[error("The operation requires privileges which the client does not have: {body}")]
    Forbidden {
        /// Response body
        body: String,
    },

    /// 404
    #[error("Endpoint not found or resource does not exist: {body}")]
    NotFound {
        /// Response body
        body: String,
    },

    /// 409, or 400 carrying the duplicate-key signature
    #[error("Resource cannot be updated: {body}")]
    Conflict {
        /// Response body
        body: String,
        /// Set when the conflict was reported as a database duplicate-key error
        duplicate_key: bool,
    },

    /// 422
    #[error("There was a validation problem with the request: {body}")]
    Validation {
        /// Response body
        body: String,
    },

    /// 500
    #[error("The remote server returned an internal server error: {body}")]
    ServiceUnavailable {
        /// Response body
        body: String,
    },

    /// Anything else
    #[error("Unexpected response: {status} {body}")]
    Unknown {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
}

impl UnexpectedResponse {
    /// Classify a non-success status and its body
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 => Self::Unauthorized { body },
            403 => Self::Forbidden { body },
            404 => Self::NotFound { body },
            409 => Self::Conflict {
                body,
                duplicate_key: false,
            },
            400 if body.contains(DUPLICATE_KEY_SIGNATURE) => Self::Conflict {
                body,
                duplicate_key: true,
            },
            422 => Self::Validation { body },
            500 => Self::ServiceUnavailable { body },
            _ => Self::Unknown { status, body },
        }
    }

    /// HTTP status this error was classified from
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict {
                duplicate_key: true,
                ..
            } => 400,
            Self::Conflict { .. } => 409,
            Self::Validation { .. } => 422,
            Self::ServiceUnavailable { .. } => 500,
            Self::Unknown { status, .. } => *status,
        }
    }

    /// Response body carried by this error
    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            Self::Unauthorized { body }
            | Self::Forbidden { body }
            | Self::NotFound { body }
            | Self::Conflict { body, .. }
            | Self::Validation { body }
            | Self::ServiceUnavailable { body }
            | Self::Unknown { body, .. } => body,
        }
    }

    /// Whether the server rejected the access token
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::Forbidden { .. })
    }

    /// Whether the body carries the duplicate-key signature of a racing write
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(
            self,
            Self::Conflict {
                duplicate_key: true,
                ..
            }
        ) || self.body().contains(DUPLICATE_KEY_SIGNATURE)
    }
}

/// Whether a status means the token should be refreshed
#[must_use]
pub fn is_auth_failure_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

/// FOLIO client errors
#[derive(Error, Debug)]
pub enum FolioError {
    /// The API answered with a non-success status
    #[error(transparent)]
    Response(#[from] UnexpectedResponse),

    /// Zero results where exactly one was expected
    #[error("{0}")]
    ResourceNotFound(String),

    /// Several results where exactly one was expected
    #[error("{0}")]
    MultipleResourcesFound(String),

    /// Caller supplied an invalid combination of arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Login succeeded but the token artifact was absent
    #[error("Problem with access token: {0}")]
    MissingToken(String),

    /// A successful response lacked data the operation depends on
    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// MARC record could not be interpreted or serialized
    #[error("MARC error: {0}")]
    Marc(String),

    /// HTTP transport failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FolioError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unexpected body error
    pub fn unexpected_body(msg: impl Into<String>) -> Self {
        Self::UnexpectedBody(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Classified response, if this error came from one
    #[must_use]
    pub fn response(&self) -> Option<&UnexpectedResponse> {
        match self {
            Self::Response(response) => Some(response),
            _ => None,
        }
    }

    /// Whether the server rejected the access token (401 or 403)
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.response().is_some_and(UnexpectedResponse::is_auth_failure)
    }

    /// Whether the server answered 404
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Response(UnexpectedResponse::NotFound { .. }))
    }

    /// Whether this is the duplicate-key error produced by racing record edits
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        self.response().is_some_and(UnexpectedResponse::is_duplicate_key)
    }
}

impl From<PollError<FolioError>> for FolioError {
    fn from(err: PollError<FolioError>) -> Self {
        match err {
            PollError::NotFoundExhausted { attempts } => {
                Self::ResourceNotFound(format!("Job not found after {attempts} status checks"))
            }
            PollError::Probe(e) => e,
        }
    }
}
