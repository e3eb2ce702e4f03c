use std::fmt;

use serde::{Deserialize, Serialize};

pub type JobId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub image_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub author: Author,
    pub source_url: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedResource {
    pub id: u64,
    pub image_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Submission ack: the server's opaque job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobTicket {
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamProgress {
    pub percent: u8,
    pub tag: String,
}

/// A decoded event from a job's progress stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Progress(StreamProgress),
    Done { results: Vec<SearchResult> },
    /// Server error event, malformed payload, or transport failure.
    Failed { message: String },
}

impl StreamEvent {
    /// `done` and `error` both end the job; `Failed` from a malformed
    /// payload counts because the orchestrator fails the job on it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    Network,
    Timeout,
    HttpStatus(u16),
    Decode,
    InvalidBaseUrl,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Network => write!(f, "network error"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ApiErrorKind::Decode => write!(f, "malformed response"),
            ApiErrorKind::InvalidBaseUrl => write!(f, "invalid base url"),
        }
    }
}

/// Everything the async layer reports back to the state machine. Each
/// variant carries enough identity for the core to filter stale responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    SubmitAccepted {
        job_id: JobId,
        stream_key: String,
    },
    SubmitFailed {
        job_id: JobId,
        error: ApiError,
    },
    Stream {
        job_id: JobId,
        event: StreamEvent,
    },
    SavedListed {
        resources: Vec<SavedResource>,
    },
    SavedListFailed {
        error: ApiError,
    },
    SavedCreated {
        image_url: String,
        resource: SavedResource,
    },
    /// 409 on create: already saved for this principal.
    SavedConflict {
        image_url: String,
    },
    SavedCreateFailed {
        image_url: String,
        error: ApiError,
    },
    SavedDeleted {
        resource_id: u64,
    },
    SavedDeleteFailed {
        resource_id: u64,
        error: ApiError,
    },
    FlagAccepted {
        source_url: String,
    },
    FlagFailed {
        source_url: String,
        error: ApiError,
    },
}
