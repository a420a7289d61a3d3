//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{
    run_delete, run_form, run_get, run_import_config, run_materialize, run_set,
    run_settings_schema, run_settings_show, run_show,
};
use confhub_infra::LocalTarget;
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "confhub",
    version,
    about = "Multi-project configuration resolution",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Engine settings file (JSON/TOML).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Enable debug diagnostics on stderr.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a key path.
    Get {
        /// Key path (`name`, `system.name`, `system.section.name`, `config.a.b`).
        key_path: String,
        /// Project directory (defaults to the global configuration).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Value printed when the key is absent (JSON or plain text).
        #[arg(long)]
        default: Option<String>,
        /// Never contact the remote service.
        #[arg(long)]
        no_remote: bool,
    },
    /// Set a key path and persist the change.
    Set {
        /// Key path (`system.section.option` or `config.a.b`).
        key_path: String,
        /// New value; JSON-side values are coerced to number/bool when possible.
        value: String,
        /// Project directory (defaults to the global configuration).
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Delete a key path and persist the change.
    Delete {
        /// Key path (`system.section.option` or `config.a.b`).
        key_path: String,
        /// Project directory (defaults to the global configuration).
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Update existing system options from `section_option=value` fields.
    Form {
        /// Fields as `section_option=value`.
        #[arg(value_name = "FIELD", required = true)]
        fields: Vec<String>,
        /// Project directory (defaults to the global configuration).
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Replace the JSON user configuration with a document (`-` reads stdin).
    ImportConfig {
        /// JSON document path.
        source: PathBuf,
        /// Project directory (defaults to the global configuration).
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Show the resolved configuration of a project.
    Show {
        /// Project directory (defaults to the global configuration).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Never contact the remote service.
        #[arg(long)]
        no_remote: bool,
    },
    /// Write a project's configuration (typically remote) to local files.
    Materialize {
        /// Project directory.
        #[arg(long)]
        project: PathBuf,
    },
    /// Engine settings commands.
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommands {
    /// Print the effective settings (file, then `CONFHUB_*` env overrides).
    Show {
        /// Settings file path (overrides the global `--settings`).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Render as TOML in text mode.
        #[arg(long)]
        toml: bool,
    },
    /// Print the JSON Schema of the settings file.
    Schema,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug,hyper=warn,hyper_util=warn,reqwest=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(cli: &Cli, mode: OutputMode) -> Result<CliOutput, CliError> {
    let settings_path = cli.settings.as_deref();

    match &cli.command {
        Commands::Get {
            key_path,
            project,
            default,
            no_remote,
        } => run_get(
            mode,
            local_target(settings_path, project.as_ref()),
            key_path,
            default.as_deref(),
            !no_remote,
        ),
        Commands::Set {
            key_path,
            value,
            project,
        } => run_set(
            mode,
            local_target(settings_path, project.as_ref()),
            key_path,
            value,
        ),
        Commands::Delete { key_path, project } => {
            run_delete(mode, local_target(settings_path, project.as_ref()), key_path)
        },
        Commands::Form { fields, project } => {
            run_form(mode, local_target(settings_path, project.as_ref()), fields)
        },
        Commands::ImportConfig { source, project } => {
            run_import_config(mode, local_target(settings_path, project.as_ref()), source)
        },
        Commands::Show { project, no_remote } => {
            run_show(mode, local_target(settings_path, project.as_ref()), !no_remote)
        },
        Commands::Materialize { project } => {
            run_materialize(mode, local_target(settings_path, Some(project)))
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show { path, toml } => {
                run_settings_show(mode, path.as_deref().or(settings_path), *toml)
            },
            SettingsCommands::Schema => run_settings_schema(mode),
        },
    }
}

fn local_target<'a>(
    settings_path: Option<&'a Path>,
    project: Option<&'a PathBuf>,
) -> LocalTarget<'a> {
    LocalTarget {
        settings_path,
        project: project.map(PathBuf::as_path),
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
