use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub type RequestId = u64;
pub type Revision = u64;

/// Body of `POST /api/render`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderRequest {
    pub content: String,
    pub template: String,
    pub compile: bool,
}

/// Success-shaped response of the compile capability.
///
/// Every field is optional on the wire; a missing `success` means success.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, alias = "logs")]
    pub log: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct TemplateList {
    pub templates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The render request has been handed to the transport.
    RenderDispatched { render_id: RequestId },
    RenderCompleted {
        render_id: RequestId,
        result: Result<RenderResponse, CompileError>,
    },
    SourceExtracted {
        extract_id: RequestId,
        result: Result<String, CompileError>,
    },
    TemplatesListed {
        result: Result<Vec<String>, CompileError>,
    },
    DocumentSaved { revision: Revision },
    DocumentSaveFailed { revision: Revision, message: String },
    ArtifactExported { result: Result<PathBuf, String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: FailureKind,
    pub message: String,
}

impl CompileError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    /// Transport-level timeout from the HTTP client.
    Timeout,
    /// Local render deadline elapsed before any response.
    DeadlineExceeded { after: Duration },
    Network,
    /// Response body was not the expected JSON shape.
    Protocol,
    /// Backend answered with `success: false`.
    Rejected,
    TooLarge { max_bytes: u64, actual: Option<u64> },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::DeadlineExceeded { after } => {
                write!(f, "no response within {after:?}")
            }
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Protocol => write!(f, "unexpected response"),
            FailureKind::Rejected => write!(f, "rejected by backend"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
        }
    }
}
