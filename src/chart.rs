use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One plot-ready record: column name (or derived label) to scalar
pub type Record = Map<String, Value>;

/// Chart type named by a specification. Anything outside the four known
/// types is kept verbatim so it can be echoed back, and extracts no data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Other(String),
}

impl ChartType {
    pub fn as_str(&self) -> &str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Other(s) => s,
        }
    }
}

impl From<&str> for ChartType {
    fn from(s: &str) -> Self {
        match s {
            "bar" => ChartType::Bar,
            "line" => ChartType::Line,
            "pie" => ChartType::Pie,
            "scatter" => ChartType::Scatter,
            other => ChartType::Other(other.to_string()),
        }
    }
}

impl From<ChartType> for String {
    fn from(t: ChartType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role name -> column name. Values are kept as received; a role only
/// resolves to a column when its value is a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChartParameters(Map<String, Value>);

impl ChartParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: &str, column: &str) -> Self {
        self.0.insert(role.to_string(), Value::String(column.to_string()));
        self
    }

    /// Column named by `role`, if the role is present and holds a string
    pub fn column(&self, role: &str) -> Option<&str> {
        self.0.get(role).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ChartParameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A chart specification together with the data extracted for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub chart_type: ChartType,
    pub parameters: ChartParameters,
    pub insight: String,
    pub data: Vec<Record>,
}

impl ChartSpec {
    /// A spec with no data yet; `data` is filled by extraction
    pub fn new(
        title: impl Into<String>,
        chart_type: ChartType,
        parameters: ChartParameters,
        insight: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            chart_type,
            parameters,
            insight: insight.into(),
            data: Vec::new(),
        }
    }

    /// Build a spec from an untrusted JSON object. Missing or mistyped
    /// fields fall back to empty values rather than failing.
    pub fn from_candidate(obj: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let parameters = obj
            .get("parameters")
            .and_then(Value::as_object)
            .cloned()
            .map(ChartParameters::from)
            .unwrap_or_default();

        Self::new(
            text("title"),
            ChartType::from(text("chart_type").as_str()),
            parameters,
            text("insight"),
        )
    }
}
