//! Query execution stages.
//!
//! A query passes through submission, polling, result download and CSV
//! decoding, strictly in that order. [`QueryExecutor`] drives the whole
//! sequence.

pub mod decoder;
pub mod executor;
pub mod fetcher;
pub mod poller;
pub mod submitter;

pub use decoder::{decode_records, OrderedRecord, Record, RecordSet};
pub use executor::QueryExecutor;
pub use fetcher::fetch_artifact;
pub use poller::{poll_until_complete, PollPolicy};
pub use submitter::submit_query;
