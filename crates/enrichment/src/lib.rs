//! Sentiment service adapter.
//!
//! Implements the `SentimentClient` trait against a natural-language REST
//! endpoint of the `documents:analyzeSentiment` family: the record text is
//! posted as a plain-text document and the response carries a
//! document-level sentiment with `polarity` and `magnitude`.
//!
//! Token acquisition is out of scope here; the client reads a ready bearer
//! token from the environment variable named in the config, if any.

use std::env;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::debug;

use common::redact::redact_auth_token;
use tweetforge_config::EnrichmentCfg;
use tweetforge_core::{EnrichError, SentimentClient, SentimentScore};

pub struct LanguageApiClient {
    http: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl LanguageApiClient {
    pub fn new(cfg: &EnrichmentCfg) -> Result<Self> {
        let auth_token = match &cfg.auth_token_env {
            Some(var) => Some(env::var(var).with_context(|| {
                format!("reading sentiment auth token from ${var}")
            })?),
            None => None,
        };

        debug!(
            endpoint = %redact_auth_token(&cfg.endpoint),
            authenticated = auth_token.is_some(),
            "sentiment client configured"
        );

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: cfg.endpoint.clone(),
            auth_token,
        })
    }
}

#[async_trait]
impl SentimentClient for LanguageApiClient {
    async fn analyze(
        &self,
        text: &str,
    ) -> Result<SentimentScore, EnrichError> {
        let body = json!({
            "document": {
                "type": "PLAIN_TEXT",
                "content": text,
            }
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response =
            request.send().await.map_err(|e| EnrichError::Transport {
                details: e.to_string().into(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(EnrichError::Transport {
                details: format!("sentiment endpoint returned {status}")
                    .into(),
            });
        }

        let payload: Value =
            response.json().await.map_err(|e| {
                EnrichError::MalformedResponse {
                    details: e.to_string().into(),
                }
            })?;

        parse_sentiment_response(&payload)
    }
}

/// Extract the document-level sentiment from a response payload.
fn parse_sentiment_response(
    payload: &Value,
) -> Result<SentimentScore, EnrichError> {
    let sentiment =
        payload.get("documentSentiment").ok_or_else(|| {
            EnrichError::MalformedResponse {
                details: "missing documentSentiment".into(),
            }
        })?;

    let polarity = score_field(sentiment, "polarity")?;
    let magnitude = score_field(sentiment, "magnitude")?;

    Ok(SentimentScore {
        polarity,
        magnitude,
    })
}

fn score_field(sentiment: &Value, name: &str) -> Result<f64, EnrichError> {
    sentiment.get(name).and_then(Value::as_f64).ok_or_else(|| {
        EnrichError::MalformedResponse {
            details: format!("missing or non-numeric {name}").into(),
        }
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_sentiment() {
        let payload = json!({
            "documentSentiment": {"polarity": 0.8, "magnitude": 1.2},
            "language": "en"
        });
        let score = parse_sentiment_response(&payload).unwrap();
        assert_eq!(score.polarity, 0.8);
        assert_eq!(score.magnitude, 1.2);
    }

    #[test]
    fn integer_scores_are_accepted() {
        let payload =
            json!({"documentSentiment": {"polarity": 1, "magnitude": 2}});
        let score = parse_sentiment_response(&payload).unwrap();
        assert_eq!(score.polarity, 1.0);
        assert_eq!(score.magnitude, 2.0);
    }

    #[test]
    fn missing_sentiment_block_is_malformed() {
        let err =
            parse_sentiment_response(&json!({"language": "en"})).unwrap_err();
        assert!(matches!(err, EnrichError::MalformedResponse { .. }));
    }

    #[test]
    fn non_numeric_score_is_malformed() {
        let payload = json!({
            "documentSentiment": {"polarity": "positive", "magnitude": 1.0}
        });
        let err = parse_sentiment_response(&payload).unwrap_err();
        assert!(matches!(err, EnrichError::MalformedResponse { .. }));
    }
}
