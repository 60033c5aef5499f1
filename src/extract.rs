use crate::chart::{ChartParameters, ChartType, Record};
use crate::data::{Cell, Dataset};
use serde_json::Value;
use std::collections::BTreeMap;

/// Compute the plot-ready records for one chart.
///
/// Never fails: an unknown chart type, a missing parameter, a parameter
/// naming a column the dataset does not have, or x and y naming the same
/// column all yield an empty sequence.
pub fn extract(dataset: &Dataset, chart_type: &ChartType, params: &ChartParameters) -> Vec<Record> {
    let x = params.column("x_axis").and_then(|name| resolve(dataset, name));
    let y = params.column("y_axis").and_then(|name| resolve(dataset, name));

    match chart_type {
        ChartType::Bar => match (x, y) {
            (Some(x), Some(y)) if x.idx == y.idx => Vec::new(),
            (Some(x), Some(y)) => sum_by_group(dataset, x, y),
            (Some(x), None) => count_by_value(dataset, x, "count"),
            _ => Vec::new(),
        },
        ChartType::Line => match (x, y) {
            (Some(x), Some(y)) if x.idx != y.idx => sorted_points(dataset, x, y),
            _ => Vec::new(),
        },
        ChartType::Pie => {
            let category = params
                .column("category")
                .filter(|name| !name.is_empty())
                .or_else(|| params.column("x_axis"))
                .and_then(|name| resolve(dataset, name));
            match category {
                Some(col) => count_by_value(dataset, col, "value"),
                None => Vec::new(),
            }
        }
        ChartType::Scatter => match (x, y) {
            (Some(x), Some(y)) if x.idx != y.idx => raw_points(dataset, x, y),
            _ => Vec::new(),
        },
        ChartType::Other(_) => Vec::new(),
    }
}

/// A column found in the dataset: its name and position
#[derive(Debug, Clone, Copy)]
struct ColumnRef<'a> {
    name: &'a str,
    idx: usize,
}

fn resolve<'a>(dataset: &Dataset, name: &'a str) -> Option<ColumnRef<'a>> {
    dataset.column_index(name).map(|idx| ColumnRef { name, idx })
}

/// Running total that stays integral until a float shows up.
/// Booleans add 0 or 1; any other non-numeric value makes the total undefined.
#[derive(Debug, Clone, Copy)]
enum Sum {
    Int(i64),
    Float(f64),
    Undefined,
}

impl Sum {
    fn add(self, cell: &Cell) -> Sum {
        let cell = match cell {
            Cell::Null => return self,
            Cell::Bool(b) => Cell::Int(i64::from(*b)),
            Cell::Text(_) => return Sum::Undefined,
            other => other.clone(),
        };
        match (self, cell) {
            (Sum::Int(acc), Cell::Int(v)) => match acc.checked_add(v) {
                Some(total) => Sum::Int(total),
                None => Sum::Float(acc as f64 + v as f64),
            },
            (Sum::Int(acc), Cell::Float(v)) => Sum::Float(acc as f64 + v),
            (Sum::Float(acc), Cell::Int(v)) => Sum::Float(acc + v as f64),
            (Sum::Float(acc), Cell::Float(v)) => Sum::Float(acc + v),
            (sum, _) => sum,
        }
    }

    fn to_json(self) -> Value {
        match self {
            Sum::Int(i) => Cell::Int(i).to_json(),
            Sum::Float(f) => Cell::Float(f).to_json(),
            Sum::Undefined => Value::Null,
        }
    }
}

/// Group rows by the x value and sum y per group, one record per group in key order.
/// Null keys are dropped and null y values add nothing; a group holding any
/// text y value sums to null.
fn sum_by_group(dataset: &Dataset, x: ColumnRef, y: ColumnRef) -> Vec<Record> {
    let mut groups: BTreeMap<&Cell, Sum> = BTreeMap::new();
    for row in dataset.rows() {
        let key = &row[x.idx];
        if key.is_null() {
            continue;
        }
        let entry = groups.entry(key).or_insert(Sum::Int(0));
        *entry = entry.add(&row[y.idx]);
    }

    groups
        .into_iter()
        .map(|(key, sum)| {
            let mut record = Record::new();
            record.insert(x.name.to_string(), key.to_json());
            record.insert(y.name.to_string(), sum.to_json());
            record
        })
        .collect()
}

/// Frequency of each distinct non-null value, most frequent first.
/// Ties keep the order in which the values were first seen.
fn count_by_value(dataset: &Dataset, col: ColumnRef, label: &str) -> Vec<Record> {
    // value -> (first row seen, occurrences)
    let mut counts: BTreeMap<&Cell, (usize, u64)> = BTreeMap::new();
    for (i, row) in dataset.rows().iter().enumerate() {
        let value = &row[col.idx];
        if value.is_null() {
            continue;
        }
        counts.entry(value).or_insert((i, 0)).1 += 1;
    }

    let mut ordered: Vec<(&Cell, usize, u64)> = counts
        .into_iter()
        .map(|(value, (first, n))| (value, first, n))
        .collect();
    ordered.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)));

    ordered
        .into_iter()
        .map(|(value, _, n)| {
            let mut record = Record::new();
            record.insert(col.name.to_string(), value.to_json());
            record.insert(label.to_string(), Value::from(n));
            record
        })
        .collect()
}

/// Every row restricted to the two columns, stable-sorted by x (nulls last)
fn sorted_points(dataset: &Dataset, x: ColumnRef, y: ColumnRef) -> Vec<Record> {
    let mut rows: Vec<&Vec<Cell>> = dataset.rows().iter().collect();
    rows.sort_by(|a, b| a[x.idx].cmp(&b[x.idx]));
    rows.into_iter().map(|row| point(row, x, y)).collect()
}

/// Every row restricted to the two columns, in source order
fn raw_points(dataset: &Dataset, x: ColumnRef, y: ColumnRef) -> Vec<Record> {
    dataset.rows().iter().map(|row| point(row, x, y)).collect()
}

fn point(row: &[Cell], x: ColumnRef, y: ColumnRef) -> Record {
    let mut record = Record::new();
    record.insert(x.name.to_string(), row[x.idx].to_json());
    record.insert(y.name.to_string(), row[y.idx].to_json());
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sales() -> Dataset {
        Dataset::from_json(&json!([
            {"region": "north", "sales": 10, "units": 3.0, "day": 3},
            {"region": "south", "sales": 20, "units": 1.5, "day": 1},
            {"region": "north", "sales": 5, "units": 2.0, "day": 2},
        ]))
        .unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> ChartParameters {
        pairs
            .iter()
            .fold(ChartParameters::new(), |p, (role, col)| p.with(role, col))
    }

    fn total(records: &[Record], key: &str) -> f64 {
        records.iter().filter_map(|r| r[key].as_f64()).sum()
    }

    #[test]
    fn test_bar_sums_per_group_in_key_order() {
        let ds = sales();
        let out = extract(&ds, &ChartType::Bar, &params(&[("x_axis", "region"), ("y_axis", "sales")]));
        assert_eq!(
            out,
            vec![
                json!({"region": "north", "sales": 15}).as_object().unwrap().clone(),
                json!({"region": "south", "sales": 20}).as_object().unwrap().clone(),
            ]
        );
    }

    #[test]
    fn test_bar_conserves_total() {
        let ds = sales();
        let out = extract(&ds, &ChartType::Bar, &params(&[("x_axis", "region"), ("y_axis", "units")]));
        assert_eq!(total(&out, "units"), 6.5);
    }

    #[test]
    fn test_bar_without_y_counts() {
        let ds = Dataset::from_json(&json!([
            {"c": "b"}, {"c": "a"}, {"c": "a"}, {"c": "c"}, {"c": null}
        ]))
        .unwrap();
        let out = extract(&ds, &ChartType::Bar, &params(&[("x_axis", "c"), ("y_axis", "missing")]));
        let got: Vec<_> = out.iter().map(|r| (r["c"].clone(), r["count"].clone())).collect();
        // "b" and "c" tie; "b" was seen first
        assert_eq!(
            got,
            vec![(json!("a"), json!(2)), (json!("b"), json!(1)), (json!("c"), json!(1))]
        );
        assert_eq!(total(&out, "count"), 4.0);
    }

    #[test]
    fn test_bar_groups_numeric_keys_numerically() {
        let ds = Dataset::from_json(&json!([
            {"k": 10, "v": 1}, {"k": 9, "v": 2}, {"k": 10, "v": 3}
        ]))
        .unwrap();
        let out = extract(&ds, &ChartType::Bar, &params(&[("x_axis", "k"), ("y_axis", "v")]));
        assert_eq!(out[0]["k"], json!(9));
        assert_eq!(out[1]["v"], json!(4));
    }

    #[test]
    fn test_bar_skips_null_keys_and_values() {
        let ds = Dataset::from_json(&json!([
            {"k": "a", "v": 1}, {"k": null, "v": 2}, {"k": "a", "v": null}
        ]))
        .unwrap();
        let out = extract(&ds, &ChartType::Bar, &params(&[("x_axis", "k"), ("y_axis", "v")]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["v"], json!(1));
    }

    #[test]
    fn test_bar_sums_booleans_as_ones() {
        let ds = Dataset::from_json(&json!([
            {"k": "a", "flag": true}, {"k": "a", "flag": true}, {"k": "b", "flag": false}
        ]))
        .unwrap();
        let out = extract(&ds, &ChartType::Bar, &params(&[("x_axis", "k"), ("y_axis", "flag")]));
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!([{"k": "a", "flag": 2}, {"k": "b", "flag": 0}])
        );
        assert_eq!(total(&out, "flag"), 2.0);
    }

    #[test]
    fn test_bar_text_values_sum_to_null() {
        let ds = Dataset::from_json(&json!([
            {"k": "a", "name": "x"}, {"k": "a", "name": "y"}, {"k": "b", "name": null}
        ]))
        .unwrap();
        let out = extract(&ds, &ChartType::Bar, &params(&[("x_axis", "k"), ("y_axis", "name")]));
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!([{"k": "a", "name": null}, {"k": "b", "name": 0}])
        );
    }

    #[test]
    fn test_same_column_for_both_axes_is_empty() {
        let ds = sales();
        let same = params(&[("x_axis", "sales"), ("y_axis", "sales")]);
        for t in [ChartType::Bar, ChartType::Line, ChartType::Scatter] {
            assert!(extract(&ds, &t, &same).is_empty());
        }
    }

    #[test]
    fn test_bar_merges_signed_zero_keys() {
        let ds = Dataset::from_json(&json!([
            {"k": -0.0, "v": 2}, {"k": 0.0, "v": 1}
        ]))
        .unwrap();
        let out = extract(&ds, &ChartType::Bar, &params(&[("x_axis", "k"), ("y_axis", "v")]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["v"], json!(3));
    }

    #[test]
    fn test_line_sorted_by_x_and_stable() {
        let ds = Dataset::from_json(&json!([
            {"x": 2, "y": "first"}, {"x": 1, "y": "a"}, {"x": 2, "y": "second"}, {"x": null, "y": "z"}
        ]))
        .unwrap();
        let out = extract(&ds, &ChartType::Line, &params(&[("x_axis", "x"), ("y_axis", "y")]));
        let ys: Vec<_> = out.iter().map(|r| r["y"].clone()).collect();
        assert_eq!(ys, vec![json!("a"), json!("first"), json!("second"), json!("z")]);
        assert_eq!(out[3]["x"], Value::Null);
    }

    #[test]
    fn test_line_is_non_decreasing() {
        let ds = sales();
        let out = extract(&ds, &ChartType::Line, &params(&[("x_axis", "day"), ("y_axis", "sales")]));
        let xs: Vec<i64> = out.iter().map(|r| r["day"].as_i64().unwrap()).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(out[0].keys().collect::<Vec<_>>(), vec!["day", "sales"]);
    }

    #[test]
    fn test_pie_counts_category_then_x_axis() {
        let ds = sales();
        let out = extract(&ds, &ChartType::Pie, &params(&[("category", "region")]));
        assert_eq!(
            out[0],
            json!({"region": "north", "value": 2}).as_object().unwrap().clone()
        );
        assert_eq!(total(&out, "value"), 3.0);

        let aliased = extract(&ds, &ChartType::Pie, &params(&[("x_axis", "region")]));
        assert_eq!(aliased, out);

        let blank = extract(&ds, &ChartType::Pie, &params(&[("category", ""), ("x_axis", "region")]));
        assert_eq!(blank, out);
    }

    #[test]
    fn test_pie_missing_category_column() {
        let ds = sales();
        let out = extract(&ds, &ChartType::Pie, &params(&[("category", "nope"), ("x_axis", "region")]));
        assert!(out.is_empty());
    }

    #[test]
    fn test_scatter_keeps_every_row_in_order() {
        let ds = Dataset::from_json(&json!([
            {"x": 3, "y": 1}, {"x": 1, "y": 1}, {"x": 3, "y": 1}
        ]))
        .unwrap();
        let out = extract(&ds, &ChartType::Scatter, &params(&[("x_axis", "x"), ("y_axis", "y")]));
        assert_eq!(out.len(), ds.row_count());
        assert_eq!(out[0]["x"], json!(3));
        assert_eq!(out[1]["x"], json!(1));
    }

    #[test]
    fn test_unknown_type_and_missing_columns_are_empty() {
        let ds = sales();
        let full = params(&[("x_axis", "region"), ("y_axis", "sales"), ("category", "region")]);
        assert!(extract(&ds, &ChartType::Other("heatmap".into()), &full).is_empty());

        let missing = params(&[("x_axis", "nope"), ("y_axis", "sales")]);
        for t in [ChartType::Bar, ChartType::Line, ChartType::Scatter] {
            assert!(extract(&ds, &t, &missing).is_empty());
        }
        for t in [ChartType::Line, ChartType::Scatter] {
            assert!(extract(&ds, &t, &params(&[("x_axis", "region")])).is_empty());
        }
        assert!(extract(&ds, &ChartType::Pie, &ChartParameters::new()).is_empty());
    }
}
