//! Output format helpers for CLI commands.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use clap::{Args, ValueEnum};
use confhub_shared::ErrorEnvelope;
use serde_json::{Value, json};

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text output.
    Text,
    /// Machine-friendly JSON output.
    Json,
    /// Line-delimited JSON (NDJSON) output.
    Ndjson,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
    /// Suppress progress lines on stderr.
    #[arg(long, global = true)]
    pub quiet: bool,
    /// Emit machine-readable JSON output (alias of `--output json`).
    #[arg(long, global = true, hide = true)]
    pub json: bool,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputMode {
    /// Build output mode from CLI flags.
    #[must_use]
    pub const fn from_args(args: &OutputArgs) -> Self {
        let format = match (args.output, args.json) {
            (Some(value), _) => value,
            (None, true) => OutputFormat::Json,
            (None, false) => OutputFormat::Text,
        };
        Self {
            format,
            quiet: args.quiet,
        }
    }

    /// Returns true when JSON output is requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Returns true when NDJSON output is requested.
    #[must_use]
    pub const fn is_ndjson(self) -> bool {
        matches!(self.format, OutputFormat::Ndjson)
    }
}

/// Successful output: `payload` gains `"status": "ok"` in JSON modes, `text`
/// is printed otherwise.
pub fn ok_output(
    mode: OutputMode,
    payload: Value,
    text: impl FnOnce() -> String,
    progress: &str,
) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_ndjson() {
        let mut line = serde_json::to_string(&with_status("ok", payload))?;
        line.push('\n');
        line
    } else if mode.is_json() {
        let mut out = serde_json::to_string_pretty(&with_status("ok", payload))?;
        out.push('\n');
        out
    } else {
        text()
    };

    let mut stderr = String::new();
    log_info(&mut stderr, progress, mode.quiet);
    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Failure output carrying the envelope's code, message, and metadata.
pub fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let exit_code = ExitCode::for_envelope(error);
    let error_json = json!({
        "code": error.code.to_string(),
        "message": error.message,
        "kind": error.kind.to_string(),
        "metadata": error.metadata,
    });

    let stdout = if mode.is_ndjson() {
        let line = serde_json::to_string(&json!({"status": "error", "error": error_json}))
            .unwrap_or_else(|_| fallback_error_json());
        format!("{line}\n")
    } else if mode.is_json() {
        // A CLI boundary: serialization failures here are internal.
        let out = serde_json::to_string_pretty(&json!({"status": "error", "error": error_json}))
            .unwrap_or_else(|_| fallback_error_json());
        format!("{out}\n")
    } else {
        String::new()
    };
    let stderr = if mode.is_json() || mode.is_ndjson() {
        String::new()
    } else {
        format_error_text(error)
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

fn format_error_text(error: &ErrorEnvelope) -> String {
    let mut out = format!("error: [{}] {}\n", error.code, error.message);
    for (key, value) in &error.metadata {
        out.push_str(&format!("  {key}: {value}\n"));
    }
    out
}

fn fallback_error_json() -> String {
    "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}"
        .to_string()
}

fn with_status(status: &str, payload: Value) -> Value {
    match payload {
        Value::Object(mut map) => {
            map.insert("status".to_owned(), Value::String(status.to_owned()));
            Value::Object(map)
        },
        other => json!({ "status": status, "result": other }),
    }
}

/// Plain-text rendering of a resolved value: strings unquoted, the rest as JSON.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => format!("{text}\n"),
        other => format!("{other}\n"),
    }
}

fn log_info(stderr: &mut String, message: &str, quiet: bool) {
    if quiet || message.is_empty() {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use confhub_shared::ErrorCode;

    const TEXT: OutputMode = OutputMode {
        format: OutputFormat::Text,
        quiet: false,
    };
    const JSON: OutputMode = OutputMode {
        format: OutputFormat::Json,
        quiet: true,
    };

    #[test]
    fn json_output_gains_a_status_field() -> Result<(), CliError> {
        let output = ok_output(JSON, json!({"value": 1}), String::new, "done")?;
        let value: Value = serde_json::from_str(&output.stdout)?;
        assert_eq!(value, json!({"status": "ok", "value": 1}));
        assert!(output.stderr.is_empty());
        Ok(())
    }

    #[test]
    fn text_errors_go_to_stderr_with_metadata() {
        let error = ErrorEnvelope::expected(ErrorCode::new("config", "not_found"), "missing key")
            .with_metadata("key_path", "config.a");
        let output = format_error_output(TEXT, &error);
        assert!(output.stdout.is_empty());
        assert!(output.stderr.starts_with("error: [config:not_found] missing key\n"));
        assert!(output.stderr.contains("key_path: config.a"));
        assert_eq!(output.exit_code, ExitCode::NotFound);
    }

    #[test]
    fn strings_print_without_quotes() {
        assert_eq!(value_text(&json!("azure")), "azure\n");
        assert_eq!(value_text(&json!({"a": 1})), "{\"a\":1}\n");
        assert_eq!(value_text(&Value::Null), "null\n");
    }
}
