// Library exports for chartsmith

pub mod chart;
pub mod csv_reader;
pub mod data;
pub mod extract;
pub mod fallback;
pub mod generator;
pub mod response;
pub mod runtime;

pub use chart::{ChartParameters, ChartSpec, ChartType, Record};
pub use data::{Cell, Column, ColumnKind, Dataset};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
pub enum OutputStyle {
    #[serde(rename = "pretty")]
    #[default]
    Pretty,
    #[serde(rename = "compact")]
    Compact,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnalysisOptions {
    /// Command line of the external suggestion generator
    #[serde(default)]
    pub generator: Option<String>,
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    #[serde(default)]
    pub output: OutputStyle,
}

fn default_sample_rows() -> usize { 50 }

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            generator: None,
            sample_rows: default_sample_rows(),
            output: OutputStyle::Pretty,
        }
    }
}

impl AnalysisOptions {
    /// Read options from a JSON file; absent fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))
    }
}
