//! Pipeline configuration.
//!
//! Pipelines are described in YAML documents with a `metadata` block and a
//! `spec` block. Environment variables in the file are expanded with
//! `${VAR}` syntax before parsing, so credentials and endpoints never have
//! to be committed to the config file itself.
//!
//! ```yaml
//! apiVersion: tweetforge/v1
//! kind: Pipeline
//! metadata:
//!   name: blackfriday
//! spec:
//!   source:
//!     type: redis
//!     config:
//!       id: tweets-in
//!       uri: ${TWEETS_REDIS_URI}
//!       stream: tweets
//!   enrichment:
//!     endpoint: https://language.googleapis.com/v1beta1/documents:analyzeSentiment
//!     auth_token_env: NL_API_TOKEN
//!   sinks:
//!     raw:
//!       type: bigquery
//!       config: { id: raw-out, project: p, dataset: d, table: tweets_raw }
//!     annotated:
//!       type: bigquery
//!       config: { id: ann-out, project: p, dataset: d, table: tweets_sentiment }
//!   schemas:
//!     raw: schemas/tweets_raw.json
//!     annotated: schemas/tweets_sentiment.json
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;
use tracing::error;
use walkdir::WalkDir;

mod enrichment_cfg;
mod sinks_cfg;
mod source_cfg;

pub use enrichment_cfg::{EnrichmentCfg, FilterCfg};
pub use sinks_cfg::{BigQuerySinkCfg, JsonlSinkCfg, SinkCfg, SinksCfg};
pub use source_cfg::{FileSourceCfg, RedisSourceCfg, SourceCfg};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("expanding environment in {path}: {details}")]
    Env { path: String, details: String },

    #[error("parsing config {path}: {details}")]
    Parse { path: String, details: String },
}

// ============================================================================
// Pipeline Spec
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub metadata: Metadata,
    pub spec: Spec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Pipeline name (unique)
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spec {
    /// Where serialized event records come from.
    pub source: SourceCfg,

    /// Eligibility predicate constants for the annotated branch.
    #[serde(default)]
    pub filter: FilterCfg,

    /// Sentiment service endpoint and call limits.
    pub enrichment: EnrichmentCfg,

    /// The two destinations: every record lands in `raw`; eligible,
    /// successfully enriched records additionally land in `annotated`.
    pub sinks: SinksCfg,

    /// Paths to the two table schema descriptor files.
    pub schemas: SchemasCfg,

    /// Capacity of the ingest and fan-out channels.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemasCfg {
    pub raw: String,
    pub annotated: String,
}

fn default_channel_capacity() -> usize {
    4096
}

// ============================================================================
// Loading
// ============================================================================

pub fn load_from_path(file_path: &str) -> Result<PipelineSpec, ConfigError> {
    let raw = fs::read_to_string(file_path).map_err(|e| ConfigError::Io {
        path: file_path.to_string(),
        source: e,
    })?;

    let with_env =
        shellexpand::env(&raw).map_err(|e| ConfigError::Env {
            path: file_path.to_string(),
            details: e.to_string(),
        })?;

    serde_yaml::from_str(&with_env).map_err(|e| ConfigError::Parse {
        path: file_path.to_string(),
        details: e.to_string(),
    })
}

pub fn load_from_dir(dir_path: &str) -> Result<Vec<PipelineSpec>, ConfigError> {
    let mut specs = Vec::<PipelineSpec>::new();
    for entry in WalkDir::new(dir_path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        if let Some(path_str) = entry.path().to_str() {
            specs.push(load_from_path(path_str)?);
        } else {
            error!(file=%entry.path().display(), "skipping file in config dir")
        }
    }

    Ok(specs)
}

pub fn load_cfg(path: &str) -> Result<Vec<PipelineSpec>, ConfigError> {
    let cfg_path = std::path::Path::new(path);

    match cfg_path.is_dir() {
        true => load_from_dir(path),
        false => {
            let spec = load_from_path(path)?;
            Ok(vec![spec])
        }
    }
}
