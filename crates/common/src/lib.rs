//! Shared utilities for TweetForge sources, sinks, and processors.
//!
//! - **Redaction**: make connection URIs and API endpoints safe for logging
//! - **Time**: event timestamp reformatting between the stream's wire
//!   format and the destination table format

pub mod redact;
pub mod time;

pub use redact::{redact_auth_token, redact_url_password};

pub use time::{
    EVENT_TS_FORMAT, TABLE_TS_FORMAT, now_ms, reformat_event_timestamp,
};
