//! Core data types for NLS predictions returned by the cNLS Mapper.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural class of a nuclear localization signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NlsVariant {
    Monopartite,
    Bipartite,
}

impl NlsVariant {
    /// Both variants, in the order the parser visits them.
    pub const ALL: [NlsVariant; 2] = [NlsVariant::Monopartite, NlsVariant::Bipartite];

    /// Lowercase name as printed in the service's table headings.
    pub fn as_str(&self) -> &'static str {
        match self {
            NlsVariant::Monopartite => "monopartite",
            NlsVariant::Bipartite => "bipartite",
        }
    }
}

impl fmt::Display for NlsVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One predicted signal from a single response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlsSignal {
    variant: NlsVariant,
    position: u32,
    sequence: String,
    score: f64,
}

impl NlsSignal {
    pub fn new(variant: NlsVariant, position: u32, sequence: impl Into<String>, score: f64) -> Self {
        Self {
            variant,
            position,
            sequence: sequence.into(),
            score,
        }
    }

    pub fn variant(&self) -> NlsVariant {
        self.variant
    }

    /// 1-based start of the signal within the submitted sequence.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Residues of the signal as reported by the service.
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Order signals by score, highest first.
///
/// Meant for `sort_by`; equal scores compare as `Equal` so a stable sort keeps
/// their original relative order.
pub fn by_score_descending(a: &NlsSignal, b: &NlsSignal) -> Ordering {
    b.score.total_cmp(&a.score)
}

/// All signals parsed out of one cNLS Mapper response.
///
/// Signals are kept in the order they were parsed: monopartite first, then
/// bipartite. Use [`Prediction::sorted_by_score`] for a ranked view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    signals: Vec<NlsSignal>,
}

impl Prediction {
    /// Create an empty prediction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a prediction from already-decoded signals.
    pub fn from_signals(signals: Vec<NlsSignal>) -> Self {
        Self { signals }
    }

    pub(crate) fn extend(&mut self, signals: impl IntoIterator<Item = NlsSignal>) {
        self.signals.extend(signals);
    }

    /// Signals in parse order.
    pub fn signals(&self) -> &[NlsSignal] {
        &self.signals
    }

    /// Signals of a single variant, in parse order.
    pub fn signals_of(&self, variant: NlsVariant) -> impl Iterator<Item = &NlsSignal> {
        self.signals.iter().filter(move |s| s.variant == variant)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// True if the service reported at least one signal of any variant.
    pub fn has_any_prediction(&self) -> bool {
        !self.signals.is_empty()
    }

    /// True if a signal of `variant` exists, and, when `minimum_score` is
    /// given, at least one of them scores `>= minimum_score`.
    pub fn has_variant(&self, variant: NlsVariant, minimum_score: Option<f64>) -> bool {
        self.signals_of(variant).any(|s| match minimum_score {
            Some(min) => s.score >= min,
            None => true,
        })
    }

    /// Highest score among signals of `variant`, or `0.0` when there are none.
    pub fn max_score(&self, variant: NlsVariant) -> f64 {
        self.signals_of(variant)
            .map(|s| s.score)
            .fold(0.0, f64::max)
    }

    /// Signals ranked by [`by_score_descending`]. The stored order is untouched.
    pub fn sorted_by_score(&self) -> Vec<&NlsSignal> {
        let mut ranked: Vec<&NlsSignal> = self.signals.iter().collect();
        ranked.sort_by(|a, b| by_score_descending(a, b));
        ranked
    }
}

/// Errors raised while submitting to or parsing output from the cNLS Mapper.
#[derive(thiserror::Error, Debug)]
pub enum CnlsError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to retrieve cNLS result for cutoff/sequence {cut_off}/{sequence}: {reason}")]
    Network {
        cut_off: String,
        sequence: String,
        reason: String,
    },

    #[error("Query sequence provided was too long (> 5000 aa)")]
    QueryTooLong,

    #[error("Could not parse {variant} NLS output from the cNLS prediction server: {reason}")]
    Parse {
        variant: NlsVariant,
        reason: String,
        html: String,
    },
}

impl CnlsError {
    /// The full response body attached to a parse failure.
    pub fn raw_html(&self) -> Option<&str> {
        match self {
            CnlsError::Parse { html, .. } => Some(html),
            _ => None,
        }
    }
}

/// Convenience result type.
pub type CnlsResult<T> = Result<T, CnlsError>;
