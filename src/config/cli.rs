use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

pub const DEFAULT_PROFILE_PATH: &str = "./.civic.yaml";
pub const DEFAULT_OUTPUT_PATH: &str = "./civic.pdf";
pub const DEFAULT_SCHEMA_PATH: &str = "./civic-jsonschema.json";

/// Command-line arguments for the civic binary.
#[derive(Debug, Parser)]
#[command(
    name = "civic",
    version,
    about = "Render a résumé profile through an HTML template into HTML or PDF"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "CIVIC_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Skip the latest-release lookup.
    #[arg(long = "no-update-check", global = true, action = clap::ArgAction::SetTrue)]
    pub no_update_check: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate an HTML page or PDF from a profile and its template.
    Generate(GenerateArgs),
    /// Write a sample profile and template to start from.
    Init(InitArgs),
    /// Export the JSON schema of the profile document.
    Schema(SchemaArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Profile document: a local path or an http(s) URL.
    #[arg(
        short = 's',
        long = "profile",
        value_name = "SOURCE",
        default_value = DEFAULT_PROFILE_PATH,
        value_hint = ValueHint::AnyPath
    )]
    pub profile: String,

    /// Output file; the extension (.html or .pdf) selects the format.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT_PATH,
        value_hint = ValueHint::FilePath
    )]
    pub output: PathBuf,

    #[command(flatten)]
    pub overrides: GenerateOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GenerateOverrides {
    /// Override the Chrome/Chromium executable used for PDF output.
    #[arg(long = "chrome-path", value_name = "PATH", value_hint = ValueHint::ExecutablePath)]
    pub chrome_path: Option<PathBuf>,

    /// Override the overall generation timeout.
    #[arg(long = "timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct InitArgs {
    /// Where to write the sample profile.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = DEFAULT_PROFILE_PATH,
        value_hint = ValueHint::FilePath
    )]
    pub output: PathBuf,

    /// Replace an existing file.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub force: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SchemaArgs {
    /// Where to write the JSON schema.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = DEFAULT_SCHEMA_PATH,
        value_hint = ValueHint::FilePath
    )]
    pub output: PathBuf,
}
