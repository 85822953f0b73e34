//! Eligibility predicate for the annotated branch.

use serde_json::Value;
use tweetforge_config::FilterCfg;

/// Decides which raw records get sentiment enrichment.
///
/// A record qualifies when its `text` contains the keyword anywhere
/// (case-insensitive, hashtag or not) and its `lang` matches the configured
/// language. Runs on the raw record, before normalization; a missing or
/// wrong-typed field means ineligible, never an error.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    keyword: String,
    language: String,
}

impl RecordFilter {
    pub fn new(cfg: &FilterCfg) -> Self {
        Self::from_parts(&cfg.keyword, &cfg.language)
    }

    pub fn from_parts(keyword: &str, language: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            language: language.to_string(),
        }
    }

    pub fn is_eligible(&self, record: &Value) -> bool {
        let Some(text) = record.get("text").and_then(Value::as_str) else {
            return false;
        };
        let Some(lang) = record.get("lang").and_then(Value::as_str) else {
            return false;
        };

        text.to_lowercase().contains(&self.keyword)
            && lang.eq_ignore_ascii_case(&self.language)
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::new(&FilterCfg::default())
    }
}
