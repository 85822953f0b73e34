//! Local JSONL sink.
//!
//! Appends one serialized row per line. Used for replaying pipelines
//! offline and throughout the test suite.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use tweetforge_config::JsonlSinkCfg;
use tweetforge_core::{Row, SinkResult, TableSink};

pub struct JsonlSink {
    id: String,
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonlSink {
    pub fn new(cfg: &JsonlSinkCfg) -> Result<Self> {
        let path = PathBuf::from(&cfg.path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("creating sink directory {}", parent.display())
                })?;
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening sink file {}", path.display()))?;

        Ok(Self {
            id: cfg.id.clone(),
            path,
            file: Mutex::new(tokio::fs::File::from_std(file)),
        })
    }
}

#[async_trait]
impl TableSink for JsonlSink {
    fn id(&self) -> &str {
        &self.id
    }

    async fn append(&self, row: &Row) -> SinkResult<()> {
        let mut line = serde_json::to_vec(row)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;

        debug!(sink = %self.id, path = %self.path.display(), "row appended");
        Ok(())
    }
}
