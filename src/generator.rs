use crate::data::Dataset;
use anyhow::Result;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Fixed instruction sent to the external generator
pub const INSTRUCTION: &str = "\
Assume you are a super-intelligent data analyst.
Return ONLY valid JSON. Do not include explanations, disclaimers, greetings, or text outside the JSON.

The JSON must follow this format:
[
  {
    \"title\": (a title for the chart),
    \"chart_type\": (one of: bar, line, pie, scatter),
    \"parameters\": {\"x_axis\": (x axis column), \"y_axis\": (y axis column)},
    \"insight\": (an adequate and professional analysis of the data, as a string)
  }
]

Requirements:
- Output 3 to 5 JSON objects in the array.
- Do not add any text before or after the JSON.
- Axis names must match the dataset's column names EXACTLY, including case.
- Only dataset columns may be used as parameters; do not invent derived fields such as mean, mode, median or distribution.
- The dataset may contain an identifier column. Do not use it as a parameter.
- Every chart must compare two columns: one qualitative and one quantitative.
";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no suggestion generator is configured")]
    Unavailable,
    #[error("generator command is empty")]
    EmptyCommand,
    #[error("failed to start generator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("generator exited with {status}: {stderr}")]
    Exit { status: std::process::ExitStatus, stderr: String },
    #[error("generator I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("generator output is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Prompt(#[from] anyhow::Error),
}

/// Something that can propose charts for a dataset as free-form text
pub trait SuggestionSource {
    fn suggest(&self, dataset: &Dataset, instruction: &str) -> Result<String, SourceError>;
}

/// Source used when no generator is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl SuggestionSource for Unavailable {
    fn suggest(&self, _dataset: &Dataset, _instruction: &str) -> Result<String, SourceError> {
        Err(SourceError::Unavailable)
    }
}

/// Runs an external program, writing the prompt to its stdin and reading
/// the answer from its stdout (e.g. `ollama run llama3:latest`).
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    sample_rows: usize,
}

impl CommandSource {
    /// Split a command line on whitespace. No shell quoting is applied.
    pub fn from_command_line(line: &str, sample_rows: usize) -> Result<Self, SourceError> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(SourceError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
            sample_rows,
        })
    }
}

impl SuggestionSource for CommandSource {
    fn suggest(&self, dataset: &Dataset, instruction: &str) -> Result<String, SourceError> {
        let prompt = build_prompt(dataset, instruction, self.sample_rows)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SourceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // The generator may fill stdout before it has drained stdin
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || match stdin.write_all(prompt.as_bytes()) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    log::debug!("generator closed stdin early");
                    Ok(())
                }
                other => other,
            })
        });

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| std::io::Error::new(ErrorKind::Other, "stdin writer panicked"))??;
        }
        if !output.status.success() {
            return Err(SourceError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Instruction followed by the column list and a CSV sample of the dataset
pub fn build_prompt(dataset: &Dataset, instruction: &str, sample_rows: usize) -> Result<String> {
    let mut prompt = String::from(instruction);
    prompt.push_str("\nColumns:\n");
    for col in dataset.columns() {
        prompt.push_str(&format!("- {} ({})\n", col.name, col.kind.as_str()));
    }

    let shown = sample_rows.min(dataset.row_count());
    prompt.push_str(&format!(
        "\nFirst {} of {} rows (CSV):\n",
        shown,
        dataset.row_count()
    ));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(dataset.columns().iter().map(|c| c.name.as_str()))?;
    for row in dataset.rows().iter().take(shown) {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?;
    prompt.push_str(&String::from_utf8(bytes)?);
    Ok(prompt)
}
