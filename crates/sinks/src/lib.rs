//! Table sink implementations.
//!
//! Sinks accept finished rows and append them to a destination table. All
//! sinks implement the `TableSink` trait from `tweetforge_core`.
//!
//! # Available Sinks
//!
//! - **BigQuery**: streaming inserts over REST, table auto-created from the
//!   configured schema descriptor when absent
//! - **JSONL**: local newline-delimited file, for replays and tests
//!
//! # Design Principles
//!
//! - **No automatic retry**: a failed append is terminal for that row; the
//!   caller logs and moves on
//! - **Credential safety**: tokens come from the environment and never
//!   appear in logs
//! - **Bounded requests**: every remote call carries a timeout

use std::sync::Arc;

use anyhow::Result;
use tweetforge_config::SinkCfg;
use tweetforge_core::{ArcDynTableSink, TableSchema};

mod bigquery;
mod jsonl;

pub use bigquery::BigQuerySink;
pub use jsonl::JsonlSink;

/// Build a single sink from configuration.
///
/// `schema` is the descriptor of the destination table; remote sinks use
/// it to create the table when it does not exist yet.
pub fn build_sink(
    cfg: &SinkCfg,
    schema: TableSchema,
) -> Result<ArcDynTableSink> {
    let sink: ArcDynTableSink = match cfg {
        SinkCfg::Bigquery(bq_cfg) => {
            Arc::new(BigQuerySink::new(bq_cfg, schema)?)
        }
        SinkCfg::Jsonl(jsonl_cfg) => Arc::new(JsonlSink::new(jsonl_cfg)?),
    };
    Ok(sink)
}
