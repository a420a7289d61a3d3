//! Project-level commands: show and materialize.

use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, format_error_output, ok_output};
use confhub_infra::{LocalTarget, ProjectView, run_materialize_local, run_show_local};

/// Print the project's snapshot in the remote wire shape.
pub fn run_show(
    mode: OutputMode,
    target: LocalTarget<'_>,
    remote_enabled: bool,
) -> Result<CliOutput, CliError> {
    let view = match run_show_local(target, remote_enabled) {
        Ok(view) => view,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let payload = serde_json::to_value(&view)?;
    let text = show_text(&view)?;
    ok_output(mode, payload, || text, "")
}

/// Write the project's snapshot to local files.
pub fn run_materialize(mode: OutputMode, target: LocalTarget<'_>) -> Result<CliOutput, CliError> {
    match run_materialize_local(target) {
        Ok(report) => {
            let text = report
                .changed
                .iter()
                .map(|path| format!("wrote: {path}\n"))
                .collect::<String>();
            ok_output(mode, serde_json::to_value(&report)?, || text, "materialize completed")
        },
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

fn show_text(view: &ProjectView) -> Result<String, CliError> {
    let mut out = String::new();
    out.push_str("project: ");
    out.push_str(view.project_id.as_deref().unwrap_or("<global>"));
    out.push_str("\norigin: ");
    out.push_str(view.origin.as_str());
    out.push('\n');
    if !view.payload.name.is_empty() {
        out.push_str("name: ");
        out.push_str(&view.payload.name);
        out.push('\n');
    }
    for (section, options) in &view.payload.system_config {
        out.push('[');
        out.push_str(section);
        out.push_str("]\n");
        for (option, value) in options {
            out.push_str(option);
            out.push_str(" = ");
            match value {
                serde_json::Value::String(text) => out.push_str(text),
                other => out.push_str(&other.to_string()),
            }
            out.push('\n');
        }
    }
    out.push_str("config:\n");
    out.push_str(&serde_json::to_string_pretty(&view.payload.config_json)?);
    out.push('\n');
    Ok(out)
}
