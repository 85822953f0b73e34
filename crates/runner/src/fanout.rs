//! Dual-branch fan-out coordinator.
//!
//! Every incoming serialized record is duplicated onto a broadcast channel
//! feeding two independent workers:
//!
//! - the **raw branch** parses, normalizes, and appends every record to the
//!   raw sink;
//! - the **annotated branch** parses its own copy, keeps only eligible
//!   records, enriches them with sentiment, then normalizes and appends to
//!   the annotated sink.
//!
//! The branches share nothing but the serialized input. A parse failure,
//! filter decision, slow sentiment call, or sink error on one branch cannot
//! reach the other; a branch that falls behind the broadcast loses only its
//! own records (logged and counted). Enrichment calls run on their own
//! tasks, bounded by `max_inflight`, so one slow call never delays the
//! records behind it.

use std::sync::Arc;

use anyhow::Result;
use metrics::{counter, histogram};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use processors::{RecordFilter, SentimentEnricher, normalize};
use tweetforge_core::{
    ArcDynTableSink, RawMessage, Row, TableSchema, build_row,
};

pub struct FanoutPipeline {
    pub name: String,
    pub filter: RecordFilter,
    pub enricher: Arc<SentimentEnricher>,
    pub raw_schema: Arc<TableSchema>,
    pub annotated_schema: Arc<TableSchema>,
    pub raw_sink: ArcDynTableSink,
    pub annotated_sink: ArcDynTableSink,
    /// Maximum concurrent enrichment calls.
    pub max_inflight: usize,
    /// Broadcast buffer per branch.
    pub channel_capacity: usize,
}

impl FanoutPipeline {
    /// Duplicate - process - drain.
    ///
    /// Runs until the ingest channel closes or `cancel` fires, then waits
    /// for both branches to finish whatever is already buffered.
    pub async fn run(
        self: Arc<Self>,
        mut ingest_rx: mpsc::Receiver<RawMessage>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let (fan_tx, _) =
            broadcast::channel::<RawMessage>(self.channel_capacity.max(1));

        let raw_branch = tokio::spawn(run_raw_branch(
            self.clone(),
            fan_tx.subscribe(),
        ));
        let annotated_branch = tokio::spawn(run_annotated_branch(
            self.clone(),
            fan_tx.subscribe(),
        ));

        loop {
            let msg = tokio::select! {
                _ = cancel.cancelled() => break,
                msg = ingest_rx.recv() => msg,
            };
            let Some(msg) = msg else { break };

            counter!(
                "tweetforge_records_ingested_total",
                "pipeline" => self.name.clone()
            )
            .increment(1);

            // Fails only when both branch receivers are gone.
            if fan_tx.send(msg).is_err() {
                break;
            }
        }

        // Closing the broadcast lets both branches drain and exit.
        drop(fan_tx);
        raw_branch.await?;
        annotated_branch.await?;

        info!(pipeline = %self.name, "fan-out drained");
        Ok(())
    }

    /// Parse one branch's own copy of the serialized record.
    fn parse(&self, msg: &str, branch: &'static str) -> Option<Value> {
        match serde_json::from_str(msg) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    pipeline = %self.name,
                    branch,
                    error = %e,
                    "record is not valid JSON; dropping"
                );
                counter!(
                    "tweetforge_parse_failures_total",
                    "branch" => branch
                )
                .increment(1);
                None
            }
        }
    }

    /// Normalize, build the row, and append. Schema mismatches are surfaced
    /// loudly: they mean the destination contract is being violated.
    async fn normalize_and_append(
        &self,
        record: Value,
        schema: &TableSchema,
        sink: &ArcDynTableSink,
        branch: &'static str,
    ) {
        let normalized = normalize(record);

        let row = match build_row(&normalized, schema) {
            Ok(row) => row,
            Err(e) => {
                error!(
                    pipeline = %self.name,
                    branch,
                    error = %e,
                    "normalized record does not fit destination schema"
                );
                counter!(
                    "tweetforge_schema_mismatches_total",
                    "branch" => branch
                )
                .increment(1);
                return;
            }
        };

        self.append(sink, &row).await;
    }

    async fn append(&self, sink: &ArcDynTableSink, row: &Row) {
        let start = Instant::now();
        match sink.append(row).await {
            Ok(()) => {
                counter!(
                    "tweetforge_rows_appended_total",
                    "sink" => sink.id().to_string()
                )
                .increment(1);
                histogram!(
                    "tweetforge_sink_latency_seconds",
                    "sink" => sink.id().to_string()
                )
                .record(start.elapsed().as_secs_f64());
            }
            Err(e) => {
                error!(
                    pipeline = %self.name,
                    sink = %sink.id(),
                    error = %e,
                    "append failed; row dropped"
                );
                counter!(
                    "tweetforge_sink_errors_total",
                    "sink" => sink.id().to_string()
                )
                .increment(1);
            }
        }
    }

    async fn enrich_and_append(&self, record: Value) {
        let start = Instant::now();
        match self.enricher.enrich(record).await {
            Ok(enriched) => {
                histogram!("tweetforge_enrichment_latency_seconds")
                    .record(start.elapsed().as_secs_f64());
                counter!("tweetforge_enriched_records_total").increment(1);

                self.normalize_and_append(
                    enriched,
                    &self.annotated_schema,
                    &self.annotated_sink,
                    "annotated",
                )
                .await;
            }
            Err(e) => {
                debug!(
                    pipeline = %self.name,
                    error = %e,
                    "enrichment failed; record dropped from annotated branch"
                );
                counter!(
                    "tweetforge_enrichment_failures_total",
                    "reason" => e.kind()
                )
                .increment(1);
            }
        }
    }
}

// ============================================================================
// Branch Workers
// ============================================================================

async fn run_raw_branch(
    p: Arc<FanoutPipeline>,
    mut rx: broadcast::Receiver<RawMessage>,
) {
    loop {
        match rx.recv().await {
            Ok(msg) => {
                let Some(record) = p.parse(&msg, "raw") else {
                    continue;
                };
                p.normalize_and_append(record, &p.raw_schema, &p.raw_sink, "raw")
                    .await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(
                    pipeline = %p.name,
                    branch = "raw",
                    skipped,
                    "branch lagged the broadcast; records dropped"
                );
                counter!(
                    "tweetforge_branch_lag_dropped_total",
                    "branch" => "raw"
                )
                .increment(skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn run_annotated_branch(
    p: Arc<FanoutPipeline>,
    mut rx: broadcast::Receiver<RawMessage>,
) {
    let mut inflight: JoinSet<()> = JoinSet::new();

    loop {
        match rx.recv().await {
            Ok(msg) => {
                let Some(record) = p.parse(&msg, "annotated") else {
                    continue;
                };

                if !p.filter.is_eligible(&record) {
                    debug!(pipeline = %p.name, "record not eligible for enrichment");
                    continue;
                }

                counter!("tweetforge_eligible_records_total").increment(1);
                info!(pipeline = %p.name, "processing eligible record");

                // Bound the number of concurrent sentiment calls without
                // ever blocking the raw branch.
                while inflight.len() >= p.max_inflight.max(1) {
                    inflight.join_next().await;
                }

                let p = p.clone();
                inflight.spawn(async move {
                    p.enrich_and_append(record).await;
                });
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(
                    pipeline = %p.name,
                    branch = "annotated",
                    skipped,
                    "branch lagged the broadcast; records dropped"
                );
                counter!(
                    "tweetforge_branch_lag_dropped_total",
                    "branch" => "annotated"
                )
                .increment(skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    while inflight.join_next().await.is_some() {}
}
