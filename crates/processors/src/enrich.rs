//! Sentiment enrichment.
//!
//! Sends an eligible record's `text` to the analysis service and merges the
//! returned scores into a copy of the record as top-level numeric fields.
//! Runs before normalization so the injected fields are plain numbers by
//! the time rows are built.
//!
//! The service call is the one latency-bearing operation in the pipeline,
//! so it is bounded by a timeout here; a timeout is an ordinary enrichment
//! failure, terminal for the record on the annotated branch only.

use std::time::Duration;

use serde_json::{Number, Value};
use tokio::time::timeout;
use tracing::debug;

use tweetforge_config::EnrichmentCfg;
use tweetforge_core::{ArcDynSentimentClient, EnrichError, SentimentScore};

pub struct SentimentEnricher {
    client: ArcDynSentimentClient,
    timeout: Duration,
}

impl SentimentEnricher {
    pub fn new(client: ArcDynSentimentClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_cfg(client: ArcDynSentimentClient, cfg: &EnrichmentCfg) -> Self {
        Self::new(client, Duration::from_millis(cfg.timeout_ms))
    }

    /// Attach `polarity` and `magnitude` to the record.
    ///
    /// Takes ownership of the record and returns the enriched copy; on any
    /// failure the record is gone, which is exactly the drop semantics the
    /// annotated branch wants.
    pub async fn enrich(&self, record: Value) -> Result<Value, EnrichError> {
        let text = record
            .get("text")
            .and_then(Value::as_str)
            .ok_or(EnrichError::MissingText)?
            .to_owned();

        let score = timeout(self.timeout, self.client.analyze(&text))
            .await
            .map_err(|_| EnrichError::Timeout {
                waited_ms: self.timeout.as_millis() as u64,
            })??;

        debug!(
            polarity = score.polarity,
            magnitude = score.magnitude,
            "sentiment received"
        );

        merge_score(record, score)
    }
}

fn merge_score(
    record: Value,
    score: SentimentScore,
) -> Result<Value, EnrichError> {
    let Value::Object(mut map) = record else {
        return Err(EnrichError::MissingText);
    };

    map.insert("polarity".into(), finite_number(score.polarity, "polarity")?);
    map.insert(
        "magnitude".into(),
        finite_number(score.magnitude, "magnitude")?,
    );

    Ok(Value::Object(map))
}

fn finite_number(value: f64, field: &str) -> Result<Value, EnrichError> {
    Number::from_f64(value).map(Value::Number).ok_or_else(|| {
        EnrichError::MalformedResponse {
            details: format!("non-finite {field}").into(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tweetforge_core::SentimentClient;

    struct FixedClient(SentimentScore);

    #[async_trait]
    impl SentimentClient for FixedClient {
        async fn analyze(
            &self,
            _text: &str,
        ) -> Result<SentimentScore, EnrichError> {
            Ok(self.0)
        }
    }

    struct FailingClient;

    #[async_trait]
    impl SentimentClient for FailingClient {
        async fn analyze(
            &self,
            _text: &str,
        ) -> Result<SentimentScore, EnrichError> {
            Err(EnrichError::Transport {
                details: "connection refused".into(),
            })
        }
    }

    struct SlowClient;

    #[async_trait]
    impl SentimentClient for SlowClient {
        async fn analyze(
            &self,
            _text: &str,
        ) -> Result<SentimentScore, EnrichError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(SentimentScore {
                polarity: 0.0,
                magnitude: 0.0,
            })
        }
    }

    fn enricher(client: impl SentimentClient + 'static) -> SentimentEnricher {
        SentimentEnricher::new(Arc::new(client), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn merges_scores_as_top_level_numbers() {
        let e = enricher(FixedClient(SentimentScore {
            polarity: 0.8,
            magnitude: 1.2,
        }));

        let out = e
            .enrich(json!({"text": "Big BlackFriday sale!", "lang": "en"}))
            .await
            .unwrap();

        assert_eq!(out["polarity"], json!(0.8));
        assert_eq!(out["magnitude"], json!(1.2));
        assert_eq!(out["text"], "Big BlackFriday sale!");
    }

    #[tokio::test]
    async fn missing_text_is_an_error() {
        let e = enricher(FixedClient(SentimentScore {
            polarity: 0.0,
            magnitude: 0.0,
        }));
        let err = e.enrich(json!({"lang": "en"})).await.unwrap_err();
        assert!(matches!(err, EnrichError::MissingText));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let e = enricher(FailingClient);
        let err = e.enrich(json!({"text": "hello"})).await.unwrap_err();
        assert!(matches!(err, EnrichError::Transport { .. }));
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let e = enricher(SlowClient);
        let err = e.enrich(json!({"text": "hello"})).await.unwrap_err();
        assert!(matches!(err, EnrichError::Timeout { waited_ms: 50 }));
    }
}
