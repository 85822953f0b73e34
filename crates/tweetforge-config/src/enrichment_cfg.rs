use serde::{Deserialize, Serialize};

/// Eligibility constants for the annotated branch.
///
/// Both values are fixed at startup and never mutated. A record qualifies
/// when its `text` contains `keyword` (case-insensitive) and its `lang`
/// equals `language` (case-insensitive).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    pub keyword: String,
    pub language: String,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            keyword: "blackfriday".into(),
            language: "en".into(),
        }
    }
}

/// Sentiment service configuration.
///
/// # Example
///
/// ```yaml
/// enrichment:
///   endpoint: https://language.googleapis.com/v1beta1/documents:analyzeSentiment
///   auth_token_env: NL_API_TOKEN
///   timeout_ms: 5000
///   max_inflight: 8
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentCfg {
    /// Sentiment analysis endpoint URL.
    pub endpoint: String,

    /// Name of the environment variable holding the bearer token.
    #[serde(default)]
    pub auth_token_env: Option<String>,

    /// Upper bound on one sentiment call; a call that exceeds it counts
    /// as an enrichment failure for that record.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum concurrent enrichment calls in flight.
    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_inflight() -> usize {
    8
}
