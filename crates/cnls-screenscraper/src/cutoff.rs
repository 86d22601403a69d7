//! Service-side sensitivity cutoffs accepted by the cNLS Mapper form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::CnlsError;

/// One of the five `cut_off` values the cNLS Mapper understands.
///
/// The service takes these as literal string tokens, so `"3"` or `"3.00"` are
/// not accepted even though they name the same number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cutoff {
    Two,
    #[default]
    Three,
    Four,
    Five,
    Six,
}

impl Cutoff {
    pub const ALL: [Cutoff; 5] = [
        Cutoff::Two,
        Cutoff::Three,
        Cutoff::Four,
        Cutoff::Five,
        Cutoff::Six,
    ];

    /// The token sent in the `cut_off` form field.
    pub fn as_token(&self) -> &'static str {
        match self {
            Cutoff::Two => "2.0",
            Cutoff::Three => "3.0",
            Cutoff::Four => "4.0",
            Cutoff::Five => "5.0",
            Cutoff::Six => "6.0",
        }
    }

    fn accepted_tokens() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_token())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Cutoff {
    type Err = CnlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_token() == s)
            .ok_or_else(|| {
                CnlsError::InvalidParameter(format!(
                    "cutoff `{s}' is invalid. Valid cutoffs are {}. They are strings, not floating point values.",
                    Self::accepted_tokens()
                ))
            })
    }
}

impl TryFrom<String> for Cutoff {
    type Error = CnlsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cutoff> for String {
    fn from(value: Cutoff) -> Self {
        value.as_token().to_string()
    }
}

impl fmt::Display for Cutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}
