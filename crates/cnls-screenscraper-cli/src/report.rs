//! Row rendering for predictions: tab-separated by default, JSON lines with
//! `--json`.

use cnls_screenscraper::{NlsVariant, Prediction};
use serde_json::json;

/// How predictions are printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Client-side score threshold for the yes/no columns.
    pub minimum_score: Option<f64>,
    pub print_scores: bool,
    pub json: bool,
}

/// Header line for tabular output; `None` in JSON mode.
pub fn header(opts: &ReportOptions) -> Option<String> {
    if opts.json {
        return None;
    }
    let mut columns = vec!["Name", "Monopartite signal?", "Bipartite signal?"];
    if opts.print_scores {
        columns.push("Max monopartite score");
        columns.push("Max bipartite score");
    }
    Some(columns.join("\t"))
}

/// One output line for `name`.
pub fn row(name: &str, prediction: &Prediction, opts: &ReportOptions) -> String {
    let mono = prediction.has_variant(NlsVariant::Monopartite, opts.minimum_score);
    let bi = prediction.has_variant(NlsVariant::Bipartite, opts.minimum_score);
    let max_mono = prediction.max_score(NlsVariant::Monopartite);
    let max_bi = prediction.max_score(NlsVariant::Bipartite);

    if opts.json {
        let mut value = json!({
            "name": name,
            "monopartite": mono,
            "bipartite": bi,
            "signals": prediction.sorted_by_score(),
        });
        if opts.print_scores {
            value["max_monopartite_score"] = json!(max_mono);
            value["max_bipartite_score"] = json!(max_bi);
        }
        return value.to_string();
    }

    let mut fields = vec![name.to_string(), mono.to_string(), bi.to_string()];
    if opts.print_scores {
        fields.push(format!("{max_mono:?}"));
        fields.push(format!("{max_bi:?}"));
    }
    fields.join("\t")
}
