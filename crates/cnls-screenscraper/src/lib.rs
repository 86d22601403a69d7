//! cNLS Screenscraper: submit protein sequences to the cNLS Mapper and parse
//! its nuclear localization signal predictions.

pub mod batch;
pub mod client;
pub mod config;
pub mod cutoff;
pub mod parser;
pub mod types;
pub mod validate;

pub use batch::{BatchItem, BatchOutcome, BatchRunner};
pub use client::{HttpTransport, RawResponse, Screenscraper, Transport};
pub use config::{ScreenscraperConfig, DEFAULT_ENDPOINT, DEFAULT_PAUSE};
pub use cutoff::Cutoff;
pub use parser::{parse, parse_variant};
pub use types::*;
pub use validate::{is_submittable, validate_sequence, SequenceRejection, QUERY_LENGTH_MINIMUM};
