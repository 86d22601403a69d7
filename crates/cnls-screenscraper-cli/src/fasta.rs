//! FASTA input via rust-bio.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use bio::io::fasta;

/// A `(definition, residues)` pair, where the definition is the full header
/// line without the leading `>`.
pub type Entry = (String, String);

/// Lazily read entries from `path`, or from stdin when `path` is `None`.
pub fn open(path: Option<&Path>) -> Result<Box<dyn Iterator<Item = Result<Entry>>>> {
    let input: Box<dyn Read> = match path {
        Some(p) => Box::new(
            File::open(p).with_context(|| format!("failed to open FASTA file: {}", p.display()))?,
        ),
        None => Box::new(io::stdin()),
    };
    Ok(Box::new(entries(input)))
}

/// Iterate over the records of any FASTA reader.
pub fn entries<R: Read>(input: R) -> impl Iterator<Item = Result<Entry>> {
    fasta::Reader::new(input).records().map(|record| {
        let record = record.context("malformed FASTA record")?;
        let definition = match record.desc() {
            Some(desc) => format!("{} {}", record.id(), desc),
            None => record.id().to_string(),
        };
        let residues = String::from_utf8_lossy(record.seq()).into_owned();
        Ok((definition, residues))
    })
}
