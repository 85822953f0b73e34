//! Per-record transforms.
//!
//! Everything in this crate is pure with respect to the record it is given:
//! each function or call owns its input tree and returns a new one, so
//! concurrent pipeline branches never observe each other's work.
//!
//! - [`normalize`]: the recursive field-policy rewrite applied before row
//!   construction on both branches
//! - [`flatten_deep`]: depth-first flattening of nested arrays, used for
//!   coordinate fields
//! - [`RecordFilter`]: eligibility predicate for the annotated branch
//! - [`SentimentEnricher`]: attaches sentiment scores to eligible records
//!   via the external analysis service

mod enrich;
mod filter;
mod flatten;
mod normalize;

pub use enrich::SentimentEnricher;
pub use filter::RecordFilter;
pub use flatten::{flatten_deep, flatten_to_array};
pub use normalize::{IGNORED_FIELDS, normalize};
