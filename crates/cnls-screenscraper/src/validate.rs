//! Pre-submission checks on residue strings.
//!
//! The cNLS Mapper does not reliably report short queries: below 10 residues it
//! complains, but between 10 and 18 it silently returns nothing useful. These
//! checks run before any request is made.

use std::fmt;

/// Minimum residue count, excluding stop markers, the service handles.
pub const QUERY_LENGTH_MINIMUM: usize = 19;

/// Stop-codon marker allowed anywhere in a submitted sequence.
pub const STOP_MARKER: char = '*';

/// One-letter amino-acid codes the service accepts (including selenocysteine).
pub const AMINO_ACID_CODES: &str = "ACDEFGHIKLMNPQRSTUVWY";

/// Why a sequence was not submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceRejection {
    /// Characters that are neither amino-acid codes nor the stop marker, each
    /// listed once in order of first appearance.
    InvalidCharacters(Vec<char>),
    /// Too few residues once stop markers are removed.
    TooShort { length: usize, minimum: usize },
}

impl fmt::Display for SequenceRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceRejection::InvalidCharacters(chars) => {
                let found: String = chars.iter().collect();
                write!(f, "found unacceptable characters: {found}")
            }
            SequenceRejection::TooShort { length, minimum } => write!(
                f,
                "query sequence too short ({length} residues, less than {minimum} excluding stop codons)"
            ),
        }
    }
}

fn is_acceptable(c: char) -> bool {
    c == STOP_MARKER || AMINO_ACID_CODES.contains(c)
}

/// Check whether `residues` can be sent to the service.
pub fn validate_sequence(residues: &str) -> Result<(), SequenceRejection> {
    let mut offending: Vec<char> = Vec::new();
    for c in residues.chars().filter(|c| !is_acceptable(*c)) {
        if !offending.contains(&c) {
            offending.push(c);
        }
    }
    if !offending.is_empty() {
        return Err(SequenceRejection::InvalidCharacters(offending));
    }

    let length = residues.chars().filter(|c| *c != STOP_MARKER).count();
    if length < QUERY_LENGTH_MINIMUM {
        return Err(SequenceRejection::TooShort {
            length,
            minimum: QUERY_LENGTH_MINIMUM,
        });
    }

    Ok(())
}

/// Shorthand for `validate_sequence(residues).is_ok()`.
pub fn is_submittable(residues: &str) -> bool {
    validate_sequence(residues).is_ok()
}
