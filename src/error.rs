//! Error taxonomy
//!
//! [`ApiError`] is what the provider client raises for a single call.
//! Whether such an error aborts the request depends on where it happened:
//!
//! - region discovery and the global bucket listing are fatal and surface as
//!   [`InventoryError`]
//! - anything inside one region becomes a [`RegionFailure`] in the
//!   diagnostics ledger
//! - optional attribute lookups fall back to a sentinel value

use std::time::Duration;
use thiserror::Error;

/// Error codes that mean "this account can't use this region or service",
/// as opposed to something actually being broken.
const AUTHORIZATION_CODES: &[&str] = &[
    "UnauthorizedOperation",
    "OptInRequired",
    "InvalidClientTokenId",
    "AuthFailure",
    "AccessDenied",
    "AccessDeniedException",
    "UnrecognizedClientException",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "ExpiredTokenException",
];

/// Error raised by a single provider call
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with an error document
    #[error("{code}: {message}")]
    Service {
        code: String,
        message: String,
        status: u16,
    },

    /// The regional endpoint could not be reached
    #[error("could not connect to {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// The transport gave up waiting for the endpoint
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// The per-region deadline elapsed before enumeration finished
    #[error("region enumeration did not finish within {}s", .0.as_secs())]
    Deadline(Duration),

    /// The response body could not be decoded
    #[error("malformed response: {0}")]
    Decode(String),

    /// A field the record cannot be built without was absent
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Broad failure classes used for logging and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Region not enabled, permission missing, credentials rejected
    Authorization,
    /// Endpoint unreachable or too slow
    Connectivity,
    /// Everything else
    Unexpected,
}

impl ApiError {
    pub fn service(code: &str, message: &str, status: u16) -> Self {
        Self::Service {
            code: code.to_string(),
            message: message.to_string(),
            status,
        }
    }

    /// Provider error code, when the service returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Service { code, status, .. } => {
                if AUTHORIZATION_CODES.contains(&code.as_str()) || matches!(status, 401 | 403) {
                    ErrorCategory::Authorization
                } else {
                    ErrorCategory::Unexpected
                }
            }
            Self::Connection { .. } | Self::Timeout { .. } | Self::Deadline(_) => {
                ErrorCategory::Connectivity
            }
            Self::Decode(_) | Self::MissingField(_) | Self::Other(_) => ErrorCategory::Unexpected,
        }
    }

    /// Short class name, used in error logs next to the message
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Service { .. } => "ClientError",
            Self::Connection { .. } => "EndpointConnectionError",
            Self::Timeout { .. } => "ConnectTimeoutError",
            Self::Deadline(_) => "TimeoutError",
            Self::Decode(_) => "DecodeError",
            Self::MissingField(_) => "MissingFieldError",
            Self::Other(_) => "Error",
        }
    }

    /// Human readable line for the diagnostics ledger
    pub fn description(&self) -> String {
        match self {
            Self::Service { code, message, .. } => format!("ClientError: {} - {}", code, message),
            Self::Connection { endpoint, .. } => format!(
                "EndpointConnectionError: Could not connect to the endpoint URL: \"{}\"",
                endpoint
            ),
            Self::Timeout { endpoint } => format!(
                "ConnectTimeoutError: Connect timeout on endpoint URL: \"{}\"",
                endpoint
            ),
            Self::Deadline(after) => format!(
                "TimeoutError: Region enumeration did not finish within {}s",
                after.as_secs()
            ),
            other => format!("Unknown Error: {}", other),
        }
    }
}

/// A region that failed, as recorded in the diagnostics ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFailure {
    pub category: ErrorCategory,
    pub description: String,
}

impl From<&ApiError> for RegionFailure {
    fn from(err: &ApiError) -> Self {
        Self {
            category: err.category(),
            description: err.description(),
        }
    }
}

/// Failure that aborts the whole inventory request
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Failed to retrieve regions")]
    Discovery(#[source] ApiError),

    #[error("Failed to list buckets")]
    BucketListing(#[source] ApiError),
}

impl InventoryError {
    /// Message of the underlying provider error
    pub fn details(&self) -> String {
        match self {
            Self::Discovery(err) | Self::BucketListing(err) => err.to_string(),
        }
    }
}
