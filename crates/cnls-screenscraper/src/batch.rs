//! Validate-then-submit over a stream of named sequences.
//!
//! Entries are pulled lazily, so the source may be arbitrarily long. At most
//! `concurrency` submissions are in flight, and each carries its own
//! post-request pause, so every lane stays paced. Results come back in input
//! order.

use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};

use crate::client::{HttpTransport, Screenscraper, Transport};
use crate::config::ScreenscraperConfig;
use crate::cutoff::Cutoff;
use crate::types::{CnlsError, CnlsResult, Prediction};
use crate::validate::{validate_sequence, SequenceRejection};

/// What happened to one entry.
#[derive(Debug)]
pub enum BatchOutcome<T> {
    /// Rejected before submission; nothing was sent.
    Skipped(SequenceRejection),
    Done(T),
    Failed(CnlsError),
}

impl<T> From<CnlsResult<T>> for BatchOutcome<T> {
    fn from(result: CnlsResult<T>) -> Self {
        match result {
            Ok(value) => BatchOutcome::Done(value),
            Err(e) => BatchOutcome::Failed(e),
        }
    }
}

/// An entry's name paired with its outcome.
#[derive(Debug)]
pub struct BatchItem<T> {
    pub name: String,
    pub outcome: BatchOutcome<T>,
}

/// Drives a [`Screenscraper`] over many sequences.
pub struct BatchRunner<T: Transport = HttpTransport> {
    client: Screenscraper<T>,
    cut_off: Cutoff,
    pause: Duration,
    concurrency: usize,
}

impl<T: Transport> BatchRunner<T> {
    pub fn new(client: Screenscraper<T>, config: &ScreenscraperConfig) -> Self {
        Self {
            client,
            cut_off: config.cut_off,
            pause: config.pause,
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn client(&self) -> &Screenscraper<T> {
        &self.client
    }

    /// Submit and parse each acceptable entry.
    pub fn predict<'a, I>(&'a self, entries: I) -> impl Stream<Item = BatchItem<Prediction>> + 'a
    where
        I: IntoIterator<Item = (String, String)>,
        I::IntoIter: 'a,
    {
        stream::iter(entries)
            .map(move |(name, residues)| async move {
                let outcome = match screen(&name, &residues) {
                    Some(rejection) => BatchOutcome::Skipped(rejection),
                    None => self
                        .client
                        .submit(&residues, self.cut_off.as_token(), self.pause)
                        .await
                        .into(),
                };
                report(&name, &outcome);
                BatchItem { name, outcome }
            })
            .buffered(self.concurrency)
    }

    /// Fetch the raw page for each acceptable entry without parsing it.
    pub fn fetch<'a, I>(&'a self, entries: I) -> impl Stream<Item = BatchItem<String>> + 'a
    where
        I: IntoIterator<Item = (String, String)>,
        I::IntoIter: 'a,
    {
        stream::iter(entries)
            .map(move |(name, residues)| async move {
                let outcome = match screen(&name, &residues) {
                    Some(rejection) => BatchOutcome::Skipped(rejection),
                    None => self
                        .client
                        .fetch_raw(&residues, self.cut_off.as_token(), self.pause)
                        .await
                        .into(),
                };
                report(&name, &outcome);
                BatchItem { name, outcome }
            })
            .buffered(self.concurrency)
    }
}

fn screen(name: &str, residues: &str) -> Option<SequenceRejection> {
    match validate_sequence(residues) {
        Ok(()) => None,
        Err(rejection) => {
            tracing::warn!("skipping {name}: {rejection}");
            Some(rejection)
        }
    }
}

fn report<T>(name: &str, outcome: &BatchOutcome<T>) {
    match outcome {
        BatchOutcome::Done(_) => tracing::info!("{name}: done"),
        BatchOutcome::Failed(e) => tracing::warn!("{name}: {e}"),
        BatchOutcome::Skipped(_) => {}
    }
}
