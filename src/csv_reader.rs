// Dataset loading for CSV and Excel files

use crate::data::{dedupe_headers, Cell, ColumnKind, Dataset};
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file format '{extension}' (expected .csv, .xlsx, .xls or .xlsm)")]
    UnsupportedFormat { extension: String },
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read workbook: {0}")]
    Excel(#[from] calamine::Error),
    #[error("workbook has no worksheets")]
    NoWorksheet,
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Supported tabular file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Excel,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Ok(Format::Csv),
            "xlsx" | "xls" | "xlsm" => Ok(Format::Excel),
            _ => Err(LoadError::UnsupportedFormat { extension }),
        }
    }
}

/// Load a dataset from disk, dispatching on the file extension
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let format = Format::from_path(path)?;
    let dataset = match format {
        Format::Csv => {
            let file = File::open(path).map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })?;
            read_csv(file)
        }
        Format::Excel => read_excel(path),
    }
    .with_context(|| format!("Failed to load {}", path.display()))?;

    log::info!(
        "Loaded {} rows x {} columns from {}",
        dataset.row_count(),
        dataset.columns().len(),
        path.display()
    );
    Ok(dataset)
}

/// Read CSV with a header row from any reader
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(LoadError::from)?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let headers = dedupe_headers(headers);

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record.map_err(LoadError::from)?;
        for (col, field) in raw.iter_mut().zip(record.iter()) {
            col.push(field.to_string());
        }
    }

    let named = headers
        .into_iter()
        .zip(raw)
        .map(|(name, fields)| (name, csv_column(fields)))
        .collect();
    Dataset::from_columns(named)
}

/// Parse one column of raw CSV fields. A column that ends up categorical keeps
/// every present value as its original text.
fn csv_column(fields: Vec<String>) -> Vec<Cell> {
    let cells: Vec<Cell> = fields.iter().map(|f| parse_field(f)).collect();
    if ColumnKind::classify(&cells) != ColumnKind::Categorical {
        return cells;
    }
    cells
        .into_iter()
        .zip(fields)
        .map(|(cell, field)| if cell.is_null() { cell } else { Cell::Text(field) })
        .collect()
}

const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

fn parse_field(field: &str) -> Cell {
    let trimmed = field.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        return Cell::Null;
    }
    match trimmed {
        "true" | "True" | "TRUE" => return Cell::Bool(true),
        "false" | "False" | "FALSE" => return Cell::Bool(false),
        _ => {}
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        Cell::Int(i)
    } else if let Ok(f) = trimmed.parse::<f64>() {
        Cell::Float(f)
    } else {
        Cell::Text(field.to_string())
    }
}

/// Read the first worksheet of a workbook; the first row is the header
pub fn read_excel(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).map_err(LoadError::from)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)?
        .map_err(LoadError::from)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string()).collect(),
        None => Vec::new(),
    };
    let headers = dedupe_headers(headers);

    let empty = Data::Empty;
    let mut columns: Vec<Vec<&Data>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (idx, col) in columns.iter_mut().enumerate() {
            col.push(row.get(idx).unwrap_or(&empty));
        }
    }

    let mut named = Vec::with_capacity(headers.len());
    let mut temporal = Vec::with_capacity(headers.len());
    for (name, col) in headers.into_iter().zip(&columns) {
        temporal.push(is_temporal(col));
        named.push((name, col.iter().map(|d| excel_cell(d)).collect()));
    }

    let mut dataset = Dataset::from_columns(named)?;
    // Date/time columns are neither numeric nor categorical
    for (idx, flagged) in temporal.into_iter().enumerate() {
        if flagged {
            dataset.reclassify(idx, ColumnKind::Other);
        }
    }
    Ok(dataset)
}

fn excel_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => parse_text_cell(s),
        other => Cell::Text(other.to_string()),
    }
}

fn parse_text_cell(s: &str) -> Cell {
    if s.trim().is_empty() {
        Cell::Null
    } else {
        Cell::Text(s.to_string())
    }
}

/// Column holds dates or durations and nothing textual
fn is_temporal(cells: &[&Data]) -> bool {
    let mut any = false;
    for cell in cells {
        match cell {
            Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => any = true,
            Data::Empty | Data::Error(_) => {}
            _ => return false,
        }
    }
    any
}
