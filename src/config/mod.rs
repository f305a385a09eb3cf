//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{
    CliArgs, Command, DEFAULT_OUTPUT_PATH, DEFAULT_PROFILE_PATH, DEFAULT_SCHEMA_PATH, GenerateArgs,
    GenerateOverrides, InitArgs, LoggingOverrides, SchemaArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "civic";
const ENV_PREFIX: &str = "CIVIC";
const DEFAULT_LOADER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_GENERATE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_UPDATE_CHECK_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RELEASES_URL: &str =
    "https://api.github.com/repos/seinshah/civic/releases?per_page=1";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub loader: LoaderSettings,
    pub render: RenderSettings,
    pub generate: GenerateSettings,
    pub update_check: UpdateCheckSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: LevelFilter::INFO,
                format: LogFormat::Compact,
            },
            loader: LoaderSettings {
                timeout: Duration::from_secs(DEFAULT_LOADER_TIMEOUT_SECS),
            },
            render: RenderSettings {
                chrome_path: None,
                timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
            },
            generate: GenerateSettings {
                timeout: Duration::from_secs(DEFAULT_GENERATE_TIMEOUT_SECS),
            },
            update_check: UpdateCheckSettings {
                enabled: true,
                url: default_releases_url(),
                timeout: Duration::from_secs(DEFAULT_UPDATE_CHECK_TIMEOUT_SECS),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub chrome_path: Option<PathBuf>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GenerateSettings {
    pub timeout: Duration,
}

/// Latest-release lookup performed alongside every command.
#[derive(Debug, Clone)]
pub struct UpdateCheckSettings {
    pub enabled: bool,
    pub url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_logging_overrides(&cli.logging);
    if cli.no_update_check {
        raw.update_check.enabled = Some(false);
    }
    if let Command::Generate(args) = &cli.command {
        raw.apply_generate_overrides(&args.overrides);
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    loader: RawLoaderSettings,
    render: RawRenderSettings,
    generate: RawGenerateSettings,
    update_check: RawUpdateCheckSettings,
}

impl RawSettings {
    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_generate_overrides(&mut self, overrides: &GenerateOverrides) {
        if let Some(path) = overrides.chrome_path.as_ref() {
            self.render.chrome_path = Some(path.clone());
        }
        if let Some(seconds) = overrides.timeout_seconds {
            self.generate.timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            loader,
            render,
            generate,
            update_check,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let loader = build_loader_settings(loader)?;
        let render = build_render_settings(render)?;
        let generate = build_generate_settings(generate)?;
        let update_check = build_update_check_settings(update_check)?;

        Ok(Self {
            logging,
            loader,
            render,
            generate,
            update_check,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_loader_settings(loader: RawLoaderSettings) -> Result<LoaderSettings, LoadError> {
    let timeout = positive_seconds(
        loader.timeout_seconds.unwrap_or(DEFAULT_LOADER_TIMEOUT_SECS),
        "loader.timeout_seconds",
    )?;
    Ok(LoaderSettings { timeout })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let chrome_path = match render.chrome_path {
        Some(path) if path.as_os_str().is_empty() => {
            return Err(LoadError::invalid(
                "render.chrome_path",
                "path must not be empty",
            ));
        }
        other => other,
    };

    let timeout = positive_seconds(
        render.timeout_seconds.unwrap_or(DEFAULT_RENDER_TIMEOUT_SECS),
        "render.timeout_seconds",
    )?;

    Ok(RenderSettings {
        chrome_path,
        timeout,
    })
}

fn build_generate_settings(generate: RawGenerateSettings) -> Result<GenerateSettings, LoadError> {
    let timeout = positive_seconds(
        generate
            .timeout_seconds
            .unwrap_or(DEFAULT_GENERATE_TIMEOUT_SECS),
        "generate.timeout_seconds",
    )?;
    Ok(GenerateSettings { timeout })
}

fn build_update_check_settings(
    update_check: RawUpdateCheckSettings,
) -> Result<UpdateCheckSettings, LoadError> {
    let url = match update_check.url {
        Some(raw) => Url::parse(raw.trim()).map_err(|err| {
            LoadError::invalid("update_check.url", format!("failed to parse: {err}"))
        })?,
        None => default_releases_url(),
    };

    let timeout = positive_seconds(
        update_check
            .timeout_seconds
            .unwrap_or(DEFAULT_UPDATE_CHECK_TIMEOUT_SECS),
        "update_check.timeout_seconds",
    )?;

    Ok(UpdateCheckSettings {
        enabled: update_check.enabled.unwrap_or(true),
        url,
        timeout,
    })
}

fn default_releases_url() -> Url {
    Url::parse(DEFAULT_RELEASES_URL).expect("default releases URL is valid")
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoaderSettings {
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    chrome_path: Option<PathBuf>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGenerateSettings {
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpdateCheckSettings {
    enabled: Option<bool>,
    url: Option<String>,
    timeout_seconds: Option<u64>,
}

fn positive_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
