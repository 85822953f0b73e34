//! End-to-end fan-out tests.
//!
//! Drives the coordinator with an in-memory ingest channel, JSONL sinks,
//! and a scripted sentiment client, then inspects what each destination
//! actually received. Uses the real destination schema descriptors from
//! the repository's `schemas/` directory.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use processors::{RecordFilter, SentimentEnricher};
use runner::fanout::FanoutPipeline;
use sinks::JsonlSink;
use tweetforge_config::JsonlSinkCfg;
use tweetforge_core::{
    ArcDynTableSink, EnrichError, RawMessage, SentimentClient,
    SentimentScore, TableSchema,
};

/// Succeeds with a fixed score unless the text mentions "broken".
struct ScriptedClient;

#[async_trait]
impl SentimentClient for ScriptedClient {
    async fn analyze(
        &self,
        text: &str,
    ) -> Result<SentimentScore, EnrichError> {
        if text.contains("broken") {
            return Err(EnrichError::Transport {
                details: "connection refused".into(),
            });
        }
        Ok(SentimentScore {
            polarity: 0.8,
            magnitude: 1.2,
        })
    }
}

fn load_schema(name: &str) -> TableSchema {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../schemas")
        .join(name);
    TableSchema::from_file(path).expect("schema file parses")
}

fn jsonl_sink(dir: &Path, name: &str) -> ArcDynTableSink {
    Arc::new(
        JsonlSink::new(&JsonlSinkCfg {
            id: name.into(),
            path: dir.join(name).to_str().unwrap().to_string(),
        })
        .unwrap(),
    )
}

fn read_rows(dir: &Path, name: &str) -> Vec<Value> {
    let contents = match std::fs::read_to_string(dir.join(name)) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    contents
        .lines()
        .map(|l| serde_json::from_str(l).expect("row line parses"))
        .collect()
}

async fn run_pipeline(dir: &Path, records: &[&str]) {
    let pipeline = Arc::new(FanoutPipeline {
        name: "e2e".into(),
        filter: RecordFilter::from_parts("blackfriday", "en"),
        enricher: Arc::new(SentimentEnricher::new(
            Arc::new(ScriptedClient),
            std::time::Duration::from_secs(1),
        )),
        raw_schema: Arc::new(load_schema("tweets_raw.json")),
        annotated_schema: Arc::new(load_schema("tweets_sentiment.json")),
        raw_sink: jsonl_sink(dir, "raw.jsonl"),
        annotated_sink: jsonl_sink(dir, "annotated.jsonl"),
        max_inflight: 2,
        channel_capacity: 64,
    });

    let (tx, rx) = mpsc::channel::<RawMessage>(64);
    for r in records {
        tx.send(Arc::from(*r)).await.unwrap();
    }
    drop(tx);

    pipeline
        .run(rx, CancellationToken::new())
        .await
        .expect("pipeline runs to completion");
}

// ============================================================================
// Dual-Branch Behavior
// ============================================================================

#[tokio::test]
async fn eligible_record_lands_in_both_destinations() {
    let dir = tempfile::tempdir().unwrap();
    let record = json!({
        "created_at": "Tue Oct 18 07:01:50 +0000 2016",
        "id": 1,
        "id_str": "1",
        "text": "Big BlackFriday sale!",
        "lang": "en"
    })
    .to_string();

    run_pipeline(dir.path(), &[&record]).await;

    let raw = read_rows(dir.path(), "raw.jsonl");
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0]["created_at"], "2016-10-18 07:01:50");
    assert_eq!(raw[0]["text"], "Big BlackFriday sale!");
    assert!(raw[0].get("polarity").is_none());
    assert!(raw[0].get("magnitude").is_none());

    let annotated = read_rows(dir.path(), "annotated.jsonl");
    assert_eq!(annotated.len(), 1);
    assert_eq!(annotated[0]["polarity"], json!(0.8));
    assert_eq!(annotated[0]["magnitude"], json!(1.2));
    assert_eq!(annotated[0]["created_at"], "2016-10-18 07:01:50");
    assert_eq!(annotated[0]["text"], "Big BlackFriday sale!");
}

#[tokio::test]
async fn ineligible_record_lands_only_in_raw() {
    let dir = tempfile::tempdir().unwrap();
    let records = [
        json!({"id": 1, "id_str": "1", "text": "quiet tuesday", "lang": "en"})
            .to_string(),
        json!({"id": 2, "id_str": "2", "text": "BlackFriday!", "lang": "fr"})
            .to_string(),
    ];

    run_pipeline(
        dir.path(),
        &records.iter().map(String::as_str).collect::<Vec<_>>(),
    )
    .await;

    assert_eq!(read_rows(dir.path(), "raw.jsonl").len(), 2);
    assert_eq!(read_rows(dir.path(), "annotated.jsonl").len(), 0);
}

#[tokio::test]
async fn enrichment_failure_drops_only_the_annotated_copy() {
    let dir = tempfile::tempdir().unwrap();
    let record = json!({
        "id": 3,
        "id_str": "3",
        "text": "BlackFriday broken promo",
        "lang": "en"
    })
    .to_string();

    run_pipeline(dir.path(), &[&record]).await;

    let raw = read_rows(dir.path(), "raw.jsonl");
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0]["id"], 3);
    assert_eq!(read_rows(dir.path(), "annotated.jsonl").len(), 0);
}

#[tokio::test]
async fn invalid_json_is_dropped_on_both_branches() {
    let dir = tempfile::tempdir().unwrap();
    let good =
        json!({"id": 4, "id_str": "4", "text": "hello", "lang": "en"})
            .to_string();

    run_pipeline(dir.path(), &["{definitely not json", &good]).await;

    let raw = read_rows(dir.path(), "raw.jsonl");
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0]["id"], 4);
    assert_eq!(read_rows(dir.path(), "annotated.jsonl").len(), 0);
}

#[tokio::test]
async fn schema_mismatch_drops_the_row_but_not_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    let records = [
        // `subscriber_count` is not a column of the destination tables.
        json!({"id": 5, "subscriber_count": 9}).to_string(),
        json!({"id": 6, "id_str": "6", "text": "hello", "lang": "en"})
            .to_string(),
    ];

    run_pipeline(
        dir.path(),
        &records.iter().map(String::as_str).collect::<Vec<_>>(),
    )
    .await;

    let raw = read_rows(dir.path(), "raw.jsonl");
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0]["id"], 6);
}

#[tokio::test]
async fn records_flow_through_both_branches_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let records: Vec<String> = (0..20)
        .map(|i| {
            json!({
                "id": i,
                "id_str": i.to_string(),
                "text": format!("BlackFriday deal {i}"),
                "lang": "en"
            })
            .to_string()
        })
        .collect();

    run_pipeline(
        dir.path(),
        &records.iter().map(String::as_str).collect::<Vec<_>>(),
    )
    .await;

    assert_eq!(read_rows(dir.path(), "raw.jsonl").len(), 20);

    let annotated = read_rows(dir.path(), "annotated.jsonl");
    assert_eq!(annotated.len(), 20);
    assert!(annotated.iter().all(|r| r["polarity"] == json!(0.8)));
}
