use std::process;

use civic::{
    application::{
        error::AppError,
        generate::{GenerateRequest, Generator, app_version},
        init,
        release::ReleaseChecker,
        schema,
    },
    config::{self, Command, GenerateArgs, InitArgs, SchemaArgs, Settings},
    infra::{loader::http_client, telemetry},
};
use reqwest::Client;
use tracing::{Dispatch, Level, debug, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let stage = match error {
        AppError::Generate(err) => err.stage(),
        AppError::Config(_) => "config",
        AppError::Infra(_) => "telemetry",
        AppError::Init(_) => "init",
        AppError::Schema(_) => "schema",
        AppError::Client(_) => "client",
    };

    if dispatcher::has_been_set() {
        error!(error = %error, stage, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, stage, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let client = http_client().map_err(AppError::Client)?;
    let update_check = settings.update_check.enabled.then(|| {
        let checker = ReleaseChecker::new(client.clone(), &settings.update_check);
        tokio::spawn(async move { checker.report(&app_version()).await })
    });

    let result = match cli_args.command {
        Command::Generate(args) => run_generate(&settings, client, args).await,
        Command::Init(args) => run_init(args),
        Command::Schema(args) => run_schema(args),
    };

    // The lookup carries its own timeout; a failed command does not wait for it.
    if let Some(handle) = update_check {
        if result.is_ok() {
            if let Err(err) = handle.await {
                debug!(error = %err, "update check task ended abnormally");
            }
        } else {
            handle.abort();
        }
    }

    result
}

async fn run_generate(
    settings: &Settings,
    client: Client,
    args: GenerateArgs,
) -> Result<(), AppError> {
    let generator = Generator::with_client(settings, client);
    let request = GenerateRequest {
        profile: args.profile,
        output: args.output,
    };

    let report = generator.generate(&request).await?;
    if !report.warnings.is_empty() {
        warn!(
            output = %report.output.display(),
            warnings = report.warnings.len(),
            "generated with warnings"
        );
    }
    info!(
        output = %report.output.display(),
        kind = %report.kind,
        bytes = report.bytes,
        "generation complete"
    );
    Ok(())
}

fn run_init(args: InitArgs) -> Result<(), AppError> {
    let report = init::init(&args.output, args.force)?;
    info!(
        profile = %report.profile.display(),
        template = %report.template.display(),
        "sample profile ready"
    );
    Ok(())
}

fn run_schema(args: SchemaArgs) -> Result<(), AppError> {
    schema::export(&args.output)?;
    Ok(())
}
