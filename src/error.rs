//! Error types for gated document submission
use crate::transport::TransportError;
use std::fmt;
use std::time::Duration;

/// Statuses that count as a successful submission.
pub const ACCEPTED_STATUSES: [u16; 2] = [200, 201];

/// Unified error type for [`DocumentClient::submit`](crate::DocumentClient::submit).
///
/// Every variant except `Cancelled` is produced after the permit has already been handed back;
/// `Cancelled` means no permit was ever taken.
#[derive(Debug)]
pub enum SubmitError {
    /// The document could not be encoded as JSON. No permit was consumed.
    Serialization(serde_json::Error),
    /// The HTTP exchange could not be completed.
    Transport(TransportError),
    /// The endpoint answered with a status outside [`ACCEPTED_STATUSES`].
    Rejected { status: u16, body: String },
    /// The caller gave up waiting for a permit.
    Cancelled { waited: Duration },
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization(e) => write!(f, "failed to serialize document: {}", e),
            Self::Transport(e) => write!(f, "document submission failed: {}", e),
            Self::Rejected { status, body } => {
                write!(f, "failed to create document (status {}): {}", status, body)
            }
            Self::Cancelled { waited } => {
                write!(f, "gave up waiting for a rate limit permit after {:?}", waited)
            }
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization(e) => Some(e),
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for SubmitError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<serde_json::Error> for SubmitError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

impl SubmitError {
    /// Check if the endpoint rejected the document
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
    /// Check if the HTTP exchange itself failed
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
    /// Check if the caller stopped waiting for a permit
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
    /// Check if the document could not be serialized
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }
    /// Status code of a rejected response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
    /// Body of a rejected response.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
    /// How long a cancelled caller waited.
    pub fn waited(&self) -> Option<Duration> {
        match self {
            Self::Cancelled { waited } => Some(*waited),
            _ => None,
        }
    }
}
