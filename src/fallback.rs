use crate::chart::{ChartParameters, ChartSpec, ChartType};
use crate::data::Dataset;
use crate::extract::extract;

/// Upper bound on the number of heuristic suggestions
pub const MAX_SUGGESTIONS: usize = 3;

/// Propose charts from the column classification alone.
///
/// Used whenever no external suggestion can be trusted. Each rule fires
/// independently, in this order:
/// 1. a categorical and a numeric column: bar of the first numeric by the first categorical
/// 2. two numeric columns: line of the second numeric against the first
/// 3. a categorical column: pie of the first categorical
///
/// Datasets that satisfy none of the rules produce no suggestions.
pub fn suggest(dataset: &Dataset) -> Vec<ChartSpec> {
    let numeric = dataset.numeric_columns();
    let categorical = dataset.categorical_columns();

    let mut suggestions = Vec::new();

    if let (Some(category), Some(measure)) = (categorical.first(), numeric.first()) {
        suggestions.push(ChartSpec::new(
            format!("Distribution by {}", category),
            ChartType::Bar,
            ChartParameters::new()
                .with("x_axis", category)
                .with("y_axis", measure),
            format!("This chart shows the distribution of {} by {}.", measure, category),
        ));
    }

    if let [first, second, ..] = numeric.as_slice() {
        suggestions.push(ChartSpec::new(
            format!("{} tendency vs {}", second, first),
            ChartType::Line,
            ChartParameters::new()
                .with("x_axis", first)
                .with("y_axis", second),
            format!("This chart shows the relation between {} and {}.", first, second),
        ));
    }

    if let Some(category) = categorical.first() {
        suggestions.push(ChartSpec::new(
            format!("Percentage distribution of {}", category),
            ChartType::Pie,
            ChartParameters::new()
                .with("category", category)
                .with("value", "count"),
            format!(
                "This chart shows the percentage distribution of the categories in {}.",
                category
            ),
        ));
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    for spec in &mut suggestions {
        spec.data = extract(dataset, &spec.chart_type, &spec.parameters);
        log::debug!("fallback {} chart '{}': {} records", spec.chart_type, spec.title, spec.data.len());
    }
    suggestions
}
