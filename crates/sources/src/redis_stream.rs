//! Redis Streams source.
//!
//! Reads serialized events from a stream with blocking `XREAD`, starting
//! after `start_id` (default `$`, only entries arriving after connect).
//! Each entry's payload field is forwarded verbatim; entries without a
//! usable payload are logged and skipped, they never stop the stream.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::streams::StreamReadReply;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use common::redact::redact_url_password;
use tweetforge_config::RedisSourceCfg;
use tweetforge_core::{
    EventSource, RawMessage, SourceError, SourceHandle, SourceResult,
};

/// How long one XREAD blocks before re-checking for cancellation.
const BLOCK_MS: usize = 1_000;

#[derive(Clone)]
pub struct RedisStreamSource {
    cfg: RedisSourceCfg,
    client: redis::Client,
}

impl RedisStreamSource {
    pub fn new(cfg: RedisSourceCfg) -> Result<Self> {
        let client = redis::Client::open(cfg.uri.clone())
            .context("open redis uri")?;
        Ok(Self { cfg, client })
    }

    async fn run_inner(
        self,
        tx: mpsc::Sender<RawMessage>,
        cancel: CancellationToken,
    ) -> SourceResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| SourceError::Connect {
                details: format!("redis connect: {e}").into(),
            })?;

        info!(
            source = %self.cfg.id,
            stream = %self.cfg.stream,
            uri = %redact_url_password(&self.cfg.uri),
            "redis stream source connected"
        );

        let mut last_id = self.cfg.start_id.clone();

        loop {
            let mut read = redis::cmd("XREAD");
            read.arg("BLOCK")
                .arg(BLOCK_MS)
                .arg("STREAMS")
                .arg(&self.cfg.stream)
                .arg(&last_id);

            let reply: StreamReadReply = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                reply = read.query_async(&mut conn) => {
                    reply.map_err(|e| SourceError::Connect {
                        details: format!("redis read: {e}").into(),
                    })?
                }
            };

            for key in reply.keys {
                for entry in key.ids {
                    last_id.clone_from(&entry.id);

                    let Some(payload) =
                        entry.map.get(&self.cfg.payload_field)
                    else {
                        warn!(
                            entry = %entry.id,
                            field = %self.cfg.payload_field,
                            "stream entry has no payload field; skipping"
                        );
                        continue;
                    };

                    let Ok(text) = redis::from_redis_value::<String>(payload)
                    else {
                        warn!(
                            entry = %entry.id,
                            "stream entry payload is not a string; skipping"
                        );
                        continue;
                    };

                    if tx.send(Arc::from(text.as_str())).await.is_err() {
                        // Pipeline went away; nothing left to feed.
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[async_trait]
impl EventSource for RedisStreamSource {
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
                error!(error = ?e, "redis stream source ended with error");
            }
            res
        });

        SourceHandle { cancel, join }
    }
}
