use serde::{Deserialize, Serialize};

/// The two destinations of the fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinksCfg {
    /// Every successfully parsed record lands here, without sentiment.
    pub raw: SinkCfg,

    /// Eligible, successfully enriched records land here as well.
    pub annotated: SinkCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum SinkCfg {
    Bigquery(BigQuerySinkCfg),
    Jsonl(JsonlSinkCfg),
}

impl SinkCfg {
    pub fn id(&self) -> &str {
        match self {
            SinkCfg::Bigquery(c) => &c.id,
            SinkCfg::Jsonl(c) => &c.id,
        }
    }
}

/// BigQuery streaming-insert sink configuration.
///
/// Rows are appended with `insertAll`; the destination table is created
/// from the configured schema descriptor if it does not exist.
///
/// # Example
///
/// ```yaml
/// sinks:
///   raw:
///     type: bigquery
///     config:
///       id: raw-out
///       project: my-project
///       dataset: black_friday_analytics
///       table: tweets_raw
///       auth_token_env: BQ_TOKEN
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigQuerySinkCfg {
    /// Unique identifier for this sink instance.
    pub id: String,

    /// API base URL. Overridable for emulators and tests.
    #[serde(default = "default_bigquery_endpoint")]
    pub endpoint: String,

    pub project: String,

    pub dataset: String,

    pub table: String,

    /// Name of the environment variable holding the bearer token.
    /// Unset means unauthenticated requests (emulators).
    #[serde(default)]
    pub auth_token_env: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

fn default_bigquery_endpoint() -> String {
    "https://bigquery.googleapis.com/bigquery/v2".into()
}

fn default_send_timeout_secs() -> u64 {
    30
}

/// Local newline-delimited JSON sink, one row per line. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonlSinkCfg {
    /// Unique identifier for this sink instance.
    pub id: String,

    /// Path of the output file. Parent directories are created on startup.
    pub path: String,
}
