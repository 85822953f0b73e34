//! TweetForge Core Types
//!
//! This crate defines the record model, the table schema descriptor, and the
//! traits connecting the pipeline to its external collaborators: the message
//! stream it reads from, the two tabular destinations it writes to, and the
//! sentiment analysis service used on the annotated path.
//!
//! A record is a plain `serde_json::Value` tree. Every per-record transform
//! in the pipeline is a `Value -> Value` function; the tagged variants of
//! `Value` (Null / Bool / Number / String / Array / Object) are matched
//! exhaustively wherever a field policy applies.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

pub mod errors;
pub mod row;
pub mod schema;

pub use errors::{EnrichError, SchemaError, SinkError, SourceError};
pub use row::{Row, build_row};
pub use schema::{FieldMode, FieldSchema, FieldType, TableSchema};

// ============================================================================
// Raw Message
// ============================================================================

/// One serialized event exactly as it arrived from the stream.
///
/// The fan-out duplicates this cheaply to both branches; each branch parses
/// its own tree from it, so no parsed record is ever shared across branches.
pub type RawMessage = Arc<str>;

// ============================================================================
// Sentiment Score
// ============================================================================

/// Document-level sentiment returned by the text analysis service.
///
/// `polarity` ranges from -1.0 (negative) to 1.0 (positive); `magnitude` is
/// the overall strength of emotion, 0.0 and up. Both are attached to an
/// enriched record verbatim as top-level numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub polarity: f64,
    pub magnitude: f64,
}

// ============================================================================
// Supporting Types
// ============================================================================

pub type SourceResult<T> = Result<T, SourceError>;
pub type SinkResult<T> = std::result::Result<T, SinkError>;

// ============================================================================
// Source Handle
// ============================================================================

/// Control handle for a running source task.
pub struct SourceHandle {
    pub cancel: CancellationToken,
    pub join: JoinHandle<SourceResult<()>>,
}

impl SourceHandle {
    /// Stop the source completely.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the source task to complete.
    pub async fn join(self) -> Result<()> {
        match self.join.await {
            Ok(r) => Ok(r?),
            Err(e) => Err(anyhow!("source task panicked: {e}")),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// A stream of serialized JSON event records.
///
/// Implementations push each arriving record into `tx` and run until the
/// stream ends or the handle is cancelled. Arrival order carries no meaning
/// for the pipeline.
#[async_trait]
pub trait EventSource: Send + Sync {
    fn id(&self) -> &str;

    async fn run(&self, tx: mpsc::Sender<RawMessage>) -> SourceHandle;
}

/// An append-only tabular destination with a fixed schema contract.
#[async_trait]
pub trait TableSink: Send + Sync {
    fn id(&self) -> &str;

    /// Create the destination table if it does not exist yet.
    ///
    /// Called once at startup, before any rows are appended.
    async fn ensure_table(&self) -> SinkResult<()> {
        Ok(())
    }

    async fn append(&self, row: &Row) -> SinkResult<()>;
}

/// The external text analysis capability: text in, sentiment out, or failure.
#[async_trait]
pub trait SentimentClient: Send + Sync {
    async fn analyze(
        &self,
        text: &str,
    ) -> Result<SentimentScore, EnrichError>;
}

// ============================================================================
// Pipeline Types
// ============================================================================

pub type ArcDynEventSource = Arc<dyn EventSource>;
pub type ArcDynTableSink = Arc<dyn TableSink>;
pub type ArcDynSentimentClient = Arc<dyn SentimentClient>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_score_roundtrip() {
        let score = SentimentScore {
            polarity: 0.8,
            magnitude: 1.2,
        };
        let json = serde_json::to_string(&score).unwrap();
        let parsed: SentimentScore = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, score);
    }

    #[test]
    fn raw_message_is_cheap_to_duplicate() {
        let msg: RawMessage = Arc::from(r#"{"text":"hi"}"#);
        let dup = msg.clone();
        assert_eq!(&*msg, &*dup);
        assert_eq!(Arc::strong_count(&msg), 2);
    }
}
