use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// A single scalar value held by a dataset row
#[derive(Debug, Clone)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// JSON form of the cell. Non-finite floats have no JSON number and become null.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }

    fn from_json(value: &Value, field: &str) -> Result<Self> {
        Ok(match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => Cell::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Cell::Text(s.clone()),
            _ => bail!("Unsupported value type for field '{}'", field),
        })
    }

    // Cross-type order: booleans, numbers, text, null
    fn rank(&self) -> u8 {
        match self {
            Cell::Bool(_) => 0,
            Cell::Int(_) | Cell::Float(_) => 1,
            Cell::Text(_) => 2,
            Cell::Null => 3,
        }
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Null, Cell::Null) => Ordering::Equal,
            (Cell::Float(a), Cell::Float(b)) => cmp_floats(*a, *b),
            (Cell::Int(a), Cell::Float(b)) => cmp_int_float(*a, *b),
            (Cell::Float(a), Cell::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Float order with `-0.0 == 0.0` and every NaN equal and greatest
fn cmp_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        // partial_cmp is total on non-NaN values and already equates the zeros
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact integer/float comparison, without rounding the integer through f64
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return Ordering::Less;
    }
    if f.is_infinite() {
        return if f > 0.0 { Ordering::Less } else { Ordering::Greater };
    }
    let whole = f.trunc();
    // `as` saturates, and every i64 lies well inside the i128 range
    match (i as i128).cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        unequal => unequal,
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Classification of a column as assigned by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Other,
}

impl ColumnKind {
    /// Classify a column from its cells.
    ///
    /// All-numeric (ignoring nulls) is numeric, and so is a column of nulls.
    /// An all-boolean column without gaps is `Other`. Everything else,
    /// including a column with no rows at all, is categorical.
    pub fn classify(cells: &[Cell]) -> ColumnKind {
        if cells.is_empty() {
            return ColumnKind::Categorical;
        }
        let present: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();
        if present.iter().all(|c| c.is_numeric()) {
            ColumnKind::Numeric
        } else if present.len() == cells.len() && present.iter().all(|c| matches!(c, Cell::Bool(_))) {
            ColumnKind::Other
        } else {
            ColumnKind::Categorical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Other => "other",
        }
    }
}

/// Widen integers to floats when a numeric column contains any float
pub fn widen_numeric(cells: &mut [Cell]) {
    if !cells.iter().any(|c| matches!(c, Cell::Float(_))) {
        return;
    }
    for cell in cells.iter_mut() {
        if let Cell::Int(i) = cell {
            *cell = Cell::Float(*i as f64);
        }
    }
}

/// Make header names unique: blanks become `Unnamed: <idx>`, repeats get `.1`, `.2`, ...
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());
    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header
        };
        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// In-memory table with named, classified columns. Rows are stored
/// positionally; every row has exactly one cell per column.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut names = HashSet::new();
        for col in &columns {
            if !names.insert(col.name.as_str()) {
                bail!("Duplicate column name '{}'", col.name);
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                bail!(
                    "Row {} has {} values but the dataset declares {} columns",
                    i,
                    row.len(),
                    columns.len()
                );
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a dataset from column-major cells, classifying each column
    pub fn from_columns(named: Vec<(String, Vec<Cell>)>) -> Result<Self> {
        let height = named.first().map(|(_, cells)| cells.len()).unwrap_or(0);
        let mut columns = Vec::with_capacity(named.len());
        let mut data = Vec::with_capacity(named.len());
        for (name, mut cells) in named {
            if cells.len() != height {
                bail!("Column '{}' has {} values, expected {}", name, cells.len(), height);
            }
            let kind = ColumnKind::classify(&cells);
            if kind == ColumnKind::Numeric {
                widen_numeric(&mut cells);
            }
            columns.push(Column { name, kind });
            data.push(cells);
        }

        let mut rows: Vec<Vec<Cell>> = (0..height).map(|_| Vec::with_capacity(data.len())).collect();
        for cells in data {
            for (row, cell) in rows.iter_mut().zip(cells) {
                row.push(cell);
            }
        }
        Self::new(columns, rows)
    }

    /// Create a Dataset from a JSON array of objects. Columns are the union
    /// of object keys in first-seen order; absent keys are null.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }

        let mut objects = Vec::with_capacity(array.len());
        let mut headers: Vec<String> = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
            objects.push(obj);
        }

        let mut named = Vec::with_capacity(headers.len());
        for header in headers {
            let cells = objects
                .iter()
                .map(|obj| match obj.get(&header) {
                    Some(v) => Cell::from_json(v, &header),
                    None => Ok(Cell::Null),
                })
                .collect::<Result<Vec<_>>>()?;
            named.push((header, cells));
        }
        Self::from_columns(named)
    }

    /// Override the loader's classification of one column
    pub(crate) fn reclassify(&mut self, idx: usize, kind: ColumnKind) {
        if let Some(col) = self.columns.get_mut(idx) {
            col.kind = kind;
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Exact-name column lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of all columns with the given classification, in declaration order
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns_of_kind(ColumnKind::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns_of_kind(ColumnKind::Categorical)
    }
}
