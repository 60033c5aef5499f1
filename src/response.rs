use crate::chart::ChartSpec;
use crate::data::Dataset;
use crate::extract::extract;
use crate::fallback;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;

/// Turn raw generator output into chart specs with extracted data.
///
/// Looks for the outermost `[ ... ]` span (first `[` to last `]`) and parses
/// it as a JSON array of objects; with no such span the whole text is tried.
/// If that fails for any reason the heuristic suggestions are returned
/// instead, so the result is always usable.
pub fn parse(raw: &str, dataset: &Dataset) -> Vec<ChartSpec> {
    match parse_candidates(raw) {
        Ok(mut specs) => {
            for spec in &mut specs {
                spec.data = extract(dataset, &spec.chart_type, &spec.parameters);
                if spec.data.is_empty() {
                    log::warn!(
                        "No data extracted for {} chart '{}' (parameters: {})",
                        spec.chart_type,
                        spec.title,
                        serde_json::to_string(&spec.parameters).unwrap_or_default()
                    );
                }
            }
            specs
        }
        Err(e) => {
            log::warn!("Could not parse suggestion response ({:#}), using fallback analysis", e);
            fallback::suggest(dataset)
        }
    }
}

/// Parse the candidate chart list out of the text, without extracting data
pub fn parse_candidates(raw: &str) -> Result<Vec<ChartSpec>> {
    let json_text = match bracket_span(raw) {
        Some(span) => {
            log::debug!("Found bracketed span of {} bytes", span.len());
            span
        }
        None => {
            log::debug!("No bracketed span, parsing the whole response");
            raw
        }
    };

    let value: Value = serde_json::from_str(json_text).context("Response is not valid JSON")?;
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("Response JSON is not an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_object()
                .map(ChartSpec::from_candidate)
                .ok_or_else(|| anyhow!("Array element {} is not an object", i))
        })
        .collect()
}

/// Greedy span from the first `[` to the last `]` after it
fn bracket_span(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
