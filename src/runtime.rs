// Pipeline runner: load, ask the generator, parse or fall back, emit JSON

use crate::chart::ChartSpec;
use crate::csv_reader;
use crate::data::Dataset;
use crate::fallback;
use crate::generator::{CommandSource, SourceError, SuggestionSource, Unavailable, INSTRUCTION};
use crate::response;
use crate::{AnalysisOptions, OutputStyle};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Produce chart specs for a dataset.
///
/// Generator problems of any kind are logged and answered with the
/// heuristic suggestions; this never fails.
pub fn analyze(dataset: &Dataset, source: &dyn SuggestionSource) -> Vec<ChartSpec> {
    match source.suggest(dataset, INSTRUCTION) {
        Ok(text) => response::parse(&text, dataset),
        Err(SourceError::Unavailable) => {
            log::warn!("Suggestion generator not available, using fallback analysis");
            fallback::suggest(dataset)
        }
        Err(e) => {
            log::warn!("Suggestion generator failed ({}), using fallback analysis", e);
            fallback::suggest(dataset)
        }
    }
}

/// Build the suggestion source described by the options
pub fn source_from_options(options: &AnalysisOptions) -> Box<dyn SuggestionSource> {
    let Some(line) = options.generator.as_deref() else {
        return Box::new(Unavailable);
    };
    match CommandSource::from_command_line(line, options.sample_rows) {
        Ok(source) => Box::new(source),
        Err(e) => {
            log::warn!("Ignoring generator setting: {}", e);
            Box::new(Unavailable)
        }
    }
}

/// Load the file at `path` and analyze it with the configured generator
pub fn run(path: &Path, options: &AnalysisOptions) -> Result<Vec<ChartSpec>> {
    let dataset = csv_reader::load_dataset(path)?;
    let source = source_from_options(options);
    Ok(analyze(&dataset, source.as_ref()))
}

/// Serialize the charts as a JSON array followed by a newline
pub fn write_charts<W: Write>(charts: &[ChartSpec], mut out: W, style: OutputStyle) -> Result<()> {
    match style {
        OutputStyle::Pretty => serde_json::to_writer_pretty(&mut out, charts),
        OutputStyle::Compact => serde_json::to_writer(&mut out, charts),
    }
    .context("Failed to serialize charts")?;
    writeln!(out).context("Failed to write output")?;
    out.flush().context("Failed to flush output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Canned(&'static str);

    impl SuggestionSource for Canned {
        fn suggest(&self, _dataset: &Dataset, instruction: &str) -> Result<String, SourceError> {
            assert_eq!(instruction, INSTRUCTION);
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    impl SuggestionSource for Broken {
        fn suggest(&self, _dataset: &Dataset, _instruction: &str) -> Result<String, SourceError> {
            Err(SourceError::EmptyCommand)
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_json(&json!([
            {"region": "north", "sales": 10, "cost": 4},
            {"region": "south", "sales": 20, "cost": 9},
        ]))
        .unwrap()
    }

    #[test]
    fn test_analyze_uses_generator_output() {
        let ds = dataset();
        let out = analyze(
            &ds,
            &Canned(r#"```json
[{"title": "Sales", "chart_type": "scatter", "parameters": {"x_axis": "cost", "y_axis": "sales"}, "insight": "up"}]
```"#),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Sales");
        assert_eq!(out[0].data.len(), 2);
    }

    #[test]
    fn test_analyze_falls_back() {
        let ds = dataset();
        let expected = fallback::suggest(&ds);
        assert_eq!(expected.len(), 3);
        assert_eq!(analyze(&ds, &Unavailable), expected);
        assert_eq!(analyze(&ds, &Broken), expected);
        assert_eq!(analyze(&ds, &Canned("no charts today")), expected);
    }

    #[test]
    fn test_source_from_options() {
        let mut options = AnalysisOptions::default();
        let ds = dataset();
        assert!(matches!(
            source_from_options(&options).suggest(&ds, INSTRUCTION),
            Err(SourceError::Unavailable)
        ));
        options.generator = Some("   ".to_string());
        assert!(matches!(
            source_from_options(&options).suggest(&ds, INSTRUCTION),
            Err(SourceError::Unavailable)
        ));
    }

    #[test]
    fn test_write_charts_styles() {
        let charts = fallback::suggest(&dataset());
        let mut compact = Vec::new();
        write_charts(&charts, &mut compact, OutputStyle::Compact).unwrap();
        let text = String::from_utf8(compact).unwrap();
        assert_eq!(text.lines().count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);

        let mut pretty = Vec::new();
        write_charts(&charts, &mut pretty, OutputStyle::Pretty).unwrap();
        assert!(String::from_utf8(pretty).unwrap().starts_with("[\n  {"));
    }
}
