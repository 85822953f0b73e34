//! Event stream sources.
//!
//! A source delivers serialized JSON event records, one per message, into
//! the pipeline's ingest channel. The payload is opaque here: sources never
//! parse it, the pipeline branches each parse their own copy.
//!
//! # Available Sources
//!
//! - **Redis**: blocking `XREAD` on a Redis Stream, for live ingest
//! - **File**: newline-delimited JSON, for replaying captured streams

use std::sync::Arc;

use anyhow::Result;
use tweetforge_config::{PipelineSpec, SourceCfg};
use tweetforge_core::ArcDynEventSource;

mod file;
mod redis_stream;

pub use file::FileSource;
pub use redis_stream::RedisStreamSource;

/// Build an event source from pipeline configuration.
pub fn build_source(pipeline: &PipelineSpec) -> Result<ArcDynEventSource> {
    let source: ArcDynEventSource = match &pipeline.spec.source {
        SourceCfg::Redis(cfg) => {
            Arc::new(RedisStreamSource::new(cfg.clone())?)
        }
        SourceCfg::File(cfg) => Arc::new(FileSource::new(cfg.clone())),
    };
    Ok(source)
}
