//! Newline-delimited JSON file source.
//!
//! Replays a captured stream, one serialized event per line. Blank lines
//! are skipped. The source ends when the file does, which is what makes it
//! useful for tests and backfills.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tweetforge_config::FileSourceCfg;
use tweetforge_core::{
    EventSource, RawMessage, SourceHandle, SourceResult,
};

#[derive(Clone)]
pub struct FileSource {
    cfg: FileSourceCfg,
}

impl FileSource {
    pub fn new(cfg: FileSourceCfg) -> Self {
        Self { cfg }
    }

    async fn run_inner(
        self,
        tx: mpsc::Sender<RawMessage>,
        cancel: CancellationToken,
    ) -> SourceResult<()> {
        let file = File::open(&self.cfg.path).await?;
        let mut lines = BufReader::new(file).lines();

        let mut sent = 0usize;
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                line = lines.next_line() => line?,
            };

            let Some(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }

            if tx.send(Arc::from(line.as_str())).await.is_err() {
                return Ok(());
            }
            sent += 1;
        }

        info!(source = %self.cfg.id, path = %self.cfg.path, records = sent, "file source drained");
        Ok(())
    }
}

#[async_trait]
impl EventSource for FileSource {
    fn id(&self) -> &str {
        &self.cfg.id
    }

    async fn run(&self, tx: mpsc::Sender<RawMessage>) -> SourceHandle {
        let cancel = CancellationToken::new();

        let this = self.clone();
        let cancel_for_task = cancel.clone();

        let join = tokio::spawn(async move {
            let res = this.run_inner(tx, cancel_for_task).await;
            if let Err(e) = &res {
                error!(error = ?e, "file source ended with error");
            }
            res
        });

        SourceHandle { cancel, join }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::TempPath {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(contents.as_bytes()).expect("write");
        f.into_temp_path()
    }

    #[tokio::test]
    async fn replays_one_record_per_line() {
        let path = write_temp("{\"id\":1}\n\n{\"id\":2}\n");
        let source = FileSource::new(FileSourceCfg {
            id: "replay".into(),
            path: path.to_str().unwrap().to_string(),
        });

        let (tx, mut rx) = mpsc::channel(16);
        let handle = source.run(tx).await;

        assert_eq!(&*rx.recv().await.unwrap(), "{\"id\":1}");
        assert_eq!(&*rx.recv().await.unwrap(), "{\"id\":2}");
        assert!(rx.recv().await.is_none());

        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_ends_with_io_error() {
        let source = FileSource::new(FileSourceCfg {
            id: "replay".into(),
            path: "/nonexistent/tweets.ndjson".into(),
        });

        let (tx, _rx) = mpsc::channel(16);
        let handle = source.run(tx).await;
        assert!(handle.join().await.is_err());
    }
}
