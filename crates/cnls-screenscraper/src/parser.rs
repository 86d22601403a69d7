//! Regex extractor for cNLS Mapper result pages.
//!
//! The service has no machine-readable output. Each result page carries one
//! table per NLS variant, and the generator is not consistent about how it
//! renders them: hit tables, empty tables with `<code></code>` cells, and empty
//! tables with self-closing `<code />` cells have all been observed, with tag
//! case varying between them. Each shape gets its own pattern. Folding them
//! into one looser pattern would risk matching markup we have never seen.
//!
//! The two variants use the same table layout and differ only in the heading,
//! so the patterns are generated from one template per shape.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{CnlsError, CnlsResult, NlsSignal, NlsVariant, Prediction};

/// Text the service prints instead of results when the query is too long.
const TOO_LONG_MARKER: &str = "Query sequence should be < 5000 aa";

/// Results table with at least one hit. Captures positions, sequences, scores.
const HIT_TEMPLATE: &str = r##"(?i)Predicted {variant} NLS</th>\s+</TR>\s*<TR bgcolor="#d0d0d0">\s*<th>Pos.</th>\s*<th>Sequence</th>\s*<th>Score</th>\s*</TR>\s*<TR><td><strong><big><code>(.*?)</code></big></strong><br.{0,2}><strong><big><code.{2,8}></big></strong></td><td><strong><big><code>(.*?)</code></big></strong><br.{0,2}><strong><big><code.{2,8}></big></strong></td><td align="center"><strong><big><code>(.*?)</code></big></strong><br.{0,2}><strong><big><code.{2,8}></big></strong></td></TR>"##;

/// Empty results table with `<code></code>` cells (usually lowercase `<tr>`).
const NO_HITS_TEMPLATE: &str = r##"(?i)Predicted {variant} NLS</th>\s*</tr>\s*<tr bgcolor="#d0d0d0">\s*<th>Pos.</th>\s*<th>Sequence</th>\s*<th>Score</th>\s*</tr>\s*<tr><td><strong><big><code></code></big></strong></td><td><strong><big><code></code></big></strong></td><td align="center"><strong><big><code></code></big></strong></td></tr>"##;

/// Empty results table with self-closing `<code />` cells (usually `<TR>`).
const NO_HITS_SELF_CLOSING_TEMPLATE: &str = r##"(?i)Predicted {variant} NLS</th>\s*</TR>\s*<TR bgcolor="#d0d0d0">\s*<th>Pos.</th>\s*<th>Sequence</th>\s*<th>Score</th>\s*</TR>\s*<TR><td><strong><big><code /></big></strong></td><td><strong><big><code /></big></strong></td><td align="center"><strong><big><code /></big></strong></td></TR>"##;

/// Separator between entries inside a hit cell. Case-sensitive, as emitted.
const ENTRY_SEPARATOR: &str = r"</code></big></strong><br.{0,2}><strong><big><code>";

struct VariantPatterns {
    hit: Regex,
    no_hits: Regex,
    no_hits_self_closing: Regex,
}

impl VariantPatterns {
    fn compile(variant: NlsVariant) -> Self {
        let build = |template: &str| {
            Regex::new(&template.replace("{variant}", variant.as_str()))
                .expect("result table regex is valid")
        };
        Self {
            hit: build(HIT_TEMPLATE),
            no_hits: build(NO_HITS_TEMPLATE),
            no_hits_self_closing: build(NO_HITS_SELF_CLOSING_TEMPLATE),
        }
    }
}

fn patterns(variant: NlsVariant) -> &'static VariantPatterns {
    static MONOPARTITE: OnceLock<VariantPatterns> = OnceLock::new();
    static BIPARTITE: OnceLock<VariantPatterns> = OnceLock::new();
    match variant {
        NlsVariant::Monopartite => {
            MONOPARTITE.get_or_init(|| VariantPatterns::compile(NlsVariant::Monopartite))
        }
        NlsVariant::Bipartite => {
            BIPARTITE.get_or_init(|| VariantPatterns::compile(NlsVariant::Bipartite))
        }
    }
}

fn entry_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(ENTRY_SEPARATOR).expect("entry separator regex is valid"))
}

// ── Public API ──────────────────────────────────────────────────────────────

/// Parse a full cNLS Mapper result page.
///
/// Fails with [`CnlsError::QueryTooLong`] if the service refused the query, and
/// with [`CnlsError::Parse`] if either variant's table is unrecognisable. Both
/// variants are examined even when the first fails; the monopartite error is
/// the one reported in that case.
pub fn parse(html: &str) -> CnlsResult<Prediction> {
    check_length(html)?;

    let mut prediction = Prediction::new();
    let mut first_error = None;

    for variant in NlsVariant::ALL {
        match extract_variant(html, variant) {
            Ok(signals) => prediction.extend(signals),
            Err(e) => {
                tracing::debug!("{variant} table not recognised: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            tracing::debug!("parsed {} NLS signals", prediction.len());
            Ok(prediction)
        }
    }
}

/// Parse only one variant's table.
///
/// Lets a caller keep the signals of a variant that parsed cleanly when the
/// other variant's table is malformed.
pub fn parse_variant(html: &str, variant: NlsVariant) -> CnlsResult<Vec<NlsSignal>> {
    check_length(html)?;
    extract_variant(html, variant)
}

// ── Extraction ──────────────────────────────────────────────────────────────

fn check_length(html: &str) -> CnlsResult<()> {
    if html.contains(TOO_LONG_MARKER) {
        return Err(CnlsError::QueryTooLong);
    }
    Ok(())
}

fn extract_variant(html: &str, variant: NlsVariant) -> CnlsResult<Vec<NlsSignal>> {
    let patterns = patterns(variant);

    if let Some(caps) = patterns.hit.captures(html) {
        let cell = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
        return decode_hits(html, variant, cell(1), cell(2), cell(3));
    }

    if patterns.no_hits.is_match(html) || patterns.no_hits_self_closing.is_match(html) {
        return Ok(Vec::new());
    }

    Err(parse_error(
        html,
        variant,
        "no recognised results table".to_string(),
    ))
}

/// Pair up the three hit cells entry by entry.
fn decode_hits(
    html: &str,
    variant: NlsVariant,
    positions: &str,
    sequences: &str,
    scores: &str,
) -> CnlsResult<Vec<NlsSignal>> {
    let positions = split_entries(positions);
    let sequences = split_entries(sequences);
    let scores = split_entries(scores);

    if positions.len() != sequences.len() || positions.len() != scores.len() {
        return Err(parse_error(
            html,
            variant,
            format!(
                "mismatched column lengths: {} positions, {} sequences, {} scores",
                positions.len(),
                sequences.len(),
                scores.len()
            ),
        ));
    }

    let mut signals = Vec::with_capacity(positions.len());
    for ((position, sequence), score) in positions.iter().zip(&sequences).zip(&scores) {
        let position = position
            .trim()
            .parse::<u32>()
            .map_err(|_| parse_error(html, variant, format!("bad position `{position}'")))?;
        let score = score
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|s| s.is_finite() && *s >= 0.0)
            .ok_or_else(|| parse_error(html, variant, format!("bad score `{score}'")))?;
        let sequence = sequence.trim();
        if sequence.is_empty() {
            return Err(parse_error(
                html,
                variant,
                format!("empty sequence at position {position}"),
            ));
        }
        signals.push(NlsSignal::new(variant, position, sequence, score));
    }

    tracing::debug!("{variant} table: {} hits", signals.len());
    Ok(signals)
}

fn split_entries(cell: &str) -> Vec<&str> {
    if cell.is_empty() {
        return Vec::new();
    }
    entry_separator().split(cell).collect()
}

fn parse_error(html: &str, variant: NlsVariant, reason: String) -> CnlsError {
    CnlsError::Parse {
        variant,
        reason,
        html: html.to_string(),
    }
}
