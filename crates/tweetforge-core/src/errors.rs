use std::borrow::Cow;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("connection error: {details}")]
    Connect { details: Cow<'static, str> },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("connection error: {details}")]
    Connect { details: Cow<'static, str> },

    #[error("auth error: {details}")]
    Auth { details: Cow<'static, str> },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("rejected by destination: {details}")]
    Rejected { details: Cow<'static, str> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SinkError {
    pub fn kind(&self) -> &'static str {
        match self {
            SinkError::Connect { .. } => "connect error",
            SinkError::Auth { .. } => "auth error",
            SinkError::Io(_) => "io error",
            SinkError::Serialization(_) => "serialization error",
            SinkError::Rejected { .. } => "rejected",
            SinkError::Other(_) => "other error",
        }
    }
}

/// Failure of the sentiment enrichment call.
///
/// Every variant is terminal for the record on the annotated branch only;
/// the raw branch is never affected by these.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("sentiment call timed out after {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    #[error("transport error: {details}")]
    Transport { details: Cow<'static, str> },

    #[error("malformed response: {details}")]
    MalformedResponse { details: Cow<'static, str> },

    #[error("record has no text field")]
    MissingText,
}

impl EnrichError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EnrichError::Timeout { .. } => "timeout",
            EnrichError::Transport { .. } => "transport",
            EnrichError::MalformedResponse { .. } => "malformed_response",
            EnrichError::MissingText => "missing_text",
        }
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema descriptor itself is unusable. Fatal at startup.
    #[error("invalid schema descriptor: {details}")]
    InvalidDescriptor { details: Cow<'static, str> },

    /// A normalized record cannot be represented by the target schema.
    /// Per-record fatal and surfaced loudly; never retried.
    #[error("schema mismatch at `{field}`: {reason}")]
    Mismatch {
        field: String,
        reason: Cow<'static, str>,
    },

    #[error("I/O error reading schema: {0}")]
    Io(#[from] io::Error),

    #[error("schema parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
