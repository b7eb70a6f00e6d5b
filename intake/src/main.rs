use clap::Parser;
use composer::client::RelayClient;
use composer::composer::Composer;
use composer::errors::ComposerError;
use composer::form::{FormState, SelectedFile};
use config::{CommonConfig, Config, ConfigError};
use relay::errors::RelayError;
use shared::submission::AttachmentSlot;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use url::Url;

mod config;

#[derive(Parser)]
enum CliCommand {
    /// Runs the submission relay
    Relay {
        #[arg(long)]
        config_file: PathBuf,
    },
    /// Sends one serialized form to a running relay
    Submit {
        #[arg(long)]
        relay_url: Url,
        /// JSON file holding the form state
        #[arg(long)]
        form: PathBuf,
        /// Attachment as `slot=path`; may be repeated
        #[arg(long, value_parser = parse_attachment)]
        attach: Vec<(AttachmentSlot, PathBuf)>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("relay failed: {0}")]
    Relay(#[from] RelayError),
    #[error("submission failed: {0}")]
    Composer(#[from] ComposerError),
    #[error("could not read form: {0}")]
    Form(#[from] serde_json::Error),
    #[error("invalid sentry dsn: {0}")]
    SentryDsn(#[from] sentry::types::ParseDsnError),
    #[error("could not install metrics recorder: {0}")]
    Metrics(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn parse_attachment(arg: &str) -> Result<(AttachmentSlot, PathBuf), String> {
    let (slot, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected slot=path, got {arg}"))?;
    let slot = AttachmentSlot::from_name(slot).ok_or_else(|| {
        let known: Vec<_> = AttachmentSlot::ALL.iter().map(|s| s.as_str()).collect();
        format!("unknown attachment slot {slot}, expected one of {}", known.join(", "))
    })?;
    if path.is_empty() {
        return Err(format!("missing path for {slot}"));
    }
    Ok((slot, PathBuf::from(path)))
}

/// Installs the fmt subscriber, with sentry's layer when a DSN is configured.
/// The returned guard flushes sentry on drop.
fn init_logging(common: &CommonConfig) -> Result<Option<sentry::ClientInitGuard>, CliError> {
    let dsn = common
        .logging
        .as_ref()
        .and_then(|logging| logging.sentry_dsn.as_deref())
        .map(str::parse::<sentry::types::Dsn>)
        .transpose()?;

    let guard = dsn.map(|dsn| {
        sentry::init(sentry::ClientOptions {
            dsn: Some(dsn),
            release: sentry::release_name!(),
            ..Default::default()
        })
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    Ok(guard)
}

fn init_metrics(common: &CommonConfig) -> Result<(), CliError> {
    let Some(metrics_config) = &common.metrics else {
        return Ok(());
    };

    let recorder = metrics_exporter_statsd::StatsdBuilder::from(
        metrics_config.statsd_host.clone(),
        metrics_config.statsd_port,
    )
    .build(Some("intake"))
    .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;

    shared::metrics_defs::describe_all(relay::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %metrics_config.statsd_host,
        port = metrics_config.statsd_port,
        "Statsd metrics enabled"
    );
    Ok(())
}

async fn submit(
    relay_url: Url,
    form_path: PathBuf,
    attachments: Vec<(AttachmentSlot, PathBuf)>,
) -> Result<(), CliError> {
    let mut form: FormState = serde_json::from_slice(&tokio::fs::read(&form_path).await?)?;
    for (slot, path) in attachments {
        let file = SelectedFile::from_path(&path).await.map_err(ComposerError::from)?;
        tracing::debug!(%slot, file_name = %file.file_name, size = file.size(), "Attached file");
        form.select_file(slot, file);
    }

    let composer = Composer::with_form(RelayClient::new(&relay_url)?, form);
    let result = composer.submit().await;
    if let Some(notice) = composer.notice() {
        println!("{}", notice.message);
    }
    result?;
    Ok(())
}

fn run(cli: CliCommand) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new()?;

    match cli {
        CliCommand::Relay { config_file } => {
            let config = Config::from_file(&config_file)?;
            let _sentry = init_logging(&config.common)?;
            init_metrics(&config.common)?;

            tracing::info!(config_file = %config_file.display(), "Starting relay");
            runtime.block_on(relay::run(config.relay))?;
        }
        CliCommand::Submit {
            relay_url,
            form,
            attach,
        } => {
            let _sentry = init_logging(&CommonConfig::default())?;
            runtime.block_on(submit(relay_url, form, attach))?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
