//! Report formatting for the CLI.

use crate::cli::ReportFormat;
use colored::*;
use recurrent_agent::{render_output, AgentError, Mode, RunOutput};

/// Report formatter.
pub struct Formatter {
    format: ReportFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: ReportFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a finished run.
    pub fn format_run(&self, mode: Mode, output: &RunOutput) -> String {
        match self.format {
            ReportFormat::Json => {
                let document = render_output(mode, &output.results, output.summary.as_deref());
                serde_json::to_string_pretty(&document).unwrap_or_else(|_| document.to_string())
            }
            ReportFormat::Text => self.format_run_text(output),
        }
    }

    fn format_run_text(&self, output: &RunOutput) -> String {
        let mut report = self.success(&format!(
            "Processed {} chunks with {} valid results",
            output.chunks_processed,
            output.results.len()
        ));

        if let Some(summary) = &output.summary {
            report.push_str("\n\n");
            report.push_str(&self.colorize("Summary:", "cyan"));
            report.push('\n');
            report.push_str(summary);
        }
        report
    }

    /// Format a fatal error.
    pub fn error(&self, error: &AgentError) -> String {
        self.colorize(&format!("✗ {}", error), "red")
    }

    fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recurrent_agent::ChunkResult;
    use serde_json::{json, Value};

    fn run_output(summary: Option<&str>) -> RunOutput {
        RunOutput {
            results: vec![ChunkResult {
                chunk_index: 0,
                value: json!({"summary": "A."}),
            }],
            summary: summary.map(String::from),
            chunks_processed: 2,
            provider_calls: 4,
        }
    }

    #[test]
    fn test_text_report() {
        let formatter = Formatter::new(ReportFormat::Text, false);
        let report = formatter.format_run(Mode::Extract, &run_output(None));
        assert_eq!(report, "✓ Processed 2 chunks with 1 valid results");
    }

    #[test]
    fn test_text_report_with_summary() {
        let formatter = Formatter::new(ReportFormat::Text, false);
        let report = formatter.format_run(Mode::CumulativeSummary, &run_output(Some("A.")));
        assert!(report.ends_with("Summary:\nA."));
    }

    #[test]
    fn test_json_report() {
        let formatter = Formatter::new(ReportFormat::Json, false);
        let report = formatter.format_run(Mode::CumulativeSummary, &run_output(Some("A.")));
        let parsed: Value = serde_json::from_str(&report).unwrap();
        assert_eq!(parsed["summary"], "A.");
        assert_eq!(parsed["results"][0]["summary"], "A.");
    }

    #[test]
    fn test_error_without_color() {
        let formatter = Formatter::new(ReportFormat::Text, false);
        let message = formatter.error(&AgentError::Config("chunk_size must be greater than 0".into()));
        assert_eq!(message, "✗ Configuration error: chunk_size must be greater than 0");
    }
}
