//! Key-level commands: get, set, delete, form, import-config.

use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, format_error_output, ok_output, value_text};
use confhub_infra::{
    LocalTarget, MutationReport, run_delete_local, run_form_local, run_get_local,
    run_replace_config_local, run_set_local,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Resolve one key.
pub fn run_get(
    mode: OutputMode,
    target: LocalTarget<'_>,
    key_path: &str,
    default: Option<&str>,
    remote_enabled: bool,
) -> Result<CliOutput, CliError> {
    let default = default.map_or(Value::Null, parse_default);
    match run_get_local(target, key_path, default, remote_enabled) {
        Ok(value) => ok_output(
            mode,
            json!({ "keyPath": key_path, "value": value }),
            || value_text(&value),
            "",
        ),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

/// Set one key.
pub fn run_set(
    mode: OutputMode,
    target: LocalTarget<'_>,
    key_path: &str,
    raw: &str,
) -> Result<CliOutput, CliError> {
    match run_set_local(target, key_path, raw) {
        Ok(report) => mutation_output(mode, &report, "set completed"),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

/// Delete one key.
pub fn run_delete(
    mode: OutputMode,
    target: LocalTarget<'_>,
    key_path: &str,
) -> Result<CliOutput, CliError> {
    match run_delete_local(target, key_path) {
        Ok(report) => mutation_output(mode, &report, "delete completed"),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

/// Update existing system options from `section_option=value` pairs.
pub fn run_form(
    mode: OutputMode,
    target: LocalTarget<'_>,
    fields: &[String],
) -> Result<CliOutput, CliError> {
    let fields = parse_fields(fields)?;
    match run_form_local(target, fields) {
        Ok(report) => mutation_output(mode, &report, "form applied"),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

/// Replace the user document with the JSON in `source` (`-` reads stdin).
pub fn run_import_config(
    mode: OutputMode,
    target: LocalTarget<'_>,
    source: &Path,
) -> Result<CliOutput, CliError> {
    let text = if source.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source)?
    };
    let document: Value = serde_json::from_str(&text)
        .map_err(|error| CliError::InvalidInput(format!("config document is not JSON: {error}")))?;
    match run_replace_config_local(target, document) {
        Ok(report) => mutation_output(mode, &report, "config replaced"),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

fn mutation_output(
    mode: OutputMode,
    report: &MutationReport,
    progress: &str,
) -> Result<CliOutput, CliError> {
    ok_output(mode, serde_json::to_value(report)?, || mutation_text(report), progress)
}

fn mutation_text(report: &MutationReport) -> String {
    let mut out = String::new();
    if report.changed.is_empty() {
        out.push_str("unchanged\n");
    } else {
        for name in &report.changed {
            out.push_str("changed: ");
            out.push_str(name);
            out.push('\n');
        }
    }
    if !report.persisted && !report.changed.is_empty() {
        out.push_str("not persisted (remote snapshot)\n");
    }
    for backup in &report.backups {
        out.push_str("backup: ");
        out.push_str(backup);
        out.push('\n');
    }
    out
}

/// Defaults are JSON when they parse as JSON, plain strings otherwise.
fn parse_default(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn parse_fields(fields: &[String]) -> Result<BTreeMap<String, String>, CliError> {
    fields
        .iter()
        .map(|field| {
            let (name, value) = field.split_once('=').ok_or_else(|| {
                CliError::InvalidInput(format!("expected NAME=VALUE, got `{field}`"))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(CliError::InvalidInput(format!("empty field name in `{field}`")));
            }
            Ok((name.to_owned(), value.to_owned()))
        })
        .collect()
}
