use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum SourceCfg {
    Redis(RedisSourceCfg),
    File(FileSourceCfg),
}

/// Redis Streams source configuration.
///
/// Reads serialized events from a stream with blocking `XREAD`, one event
/// per entry.
///
/// # Example
///
/// ```yaml
/// source:
///   type: redis
///   config:
///     id: tweets-in
///     uri: redis://localhost:6379
///     stream: tweets
///     payload_field: payload
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSourceCfg {
    /// Unique identifier for this source instance.
    pub id: String,

    /// Redis connection URI.
    pub uri: String,

    /// Stream key to read from.
    pub stream: String,

    /// Entry field holding the serialized event.
    #[serde(default = "default_payload_field")]
    pub payload_field: String,

    /// Stream ID to start reading after. `$` means only entries that
    /// arrive after the source connects.
    #[serde(default = "default_start_id")]
    pub start_id: String,
}

fn default_payload_field() -> String {
    "payload".into()
}

fn default_start_id() -> String {
    "$".into()
}

/// Newline-delimited JSON file source, one event per line.
///
/// Used for replaying captured streams and in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSourceCfg {
    /// Unique identifier for this source instance.
    pub id: String,

    /// Path to the NDJSON file.
    pub path: String,
}
