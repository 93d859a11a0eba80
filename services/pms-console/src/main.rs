//! PMS Console
//!
//! Command-line client for the performance-management backend:
//! 1. Loads configuration and the persisted credential bundle
//! 2. Builds the authenticated gateway (bearer + userId decoration,
//!    transparent token refresh)
//! 3. Runs one command and prints its JSON result to stdout
//!
//! Exit codes: 0 success, 1 request failure, 2 session missing or ended,
//! 64 bad input.

mod api;
mod commands;
mod config;
mod console;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gateway::Gateway;
use session::CredentialStore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::{ReqwestTransport, TransportConfig};

use crate::commands::Cli;
use crate::config::Config;
use crate::console::{ConsoleNavigator, ConsoleNotifier};
use crate::error::Error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let notifier = Arc::new(ConsoleNotifier::default());
    match run(cli, notifier.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err, &notifier),
    }
}

/// Tracing to stderr with LOG_LEVEL / RUST_LOG support; JSON when
/// LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli, notifier: Arc<ConsoleNotifier>) -> Result<()> {
    let config_path = Config::resolve_path(cli.config.as_deref());
    debug!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        credentials = %config.session.credentials_path.display(),
        "configuration loaded"
    );

    let mut transport_config = TransportConfig::new(config.api.base_url.clone());
    transport_config.timeout = config.timeout();
    let transport =
        ReqwestTransport::new(&transport_config).context("failed to build HTTP client")?;

    let store = CredentialStore::load(config.session.credentials_path.clone())
        .await
        .with_context(|| {
            format!(
                "failed to load credentials from {}",
                config.session.credentials_path.display()
            )
        })?;

    let navigator = Arc::new(ConsoleNavigator::default());
    let gateway = Gateway::new(Arc::new(transport), Arc::new(store))
        .with_notifier(notifier)
        .with_navigator(navigator.clone())
        .with_expiry_signal(config.expiry.signal());

    let opens_session = cli.command.opens_session();
    let outcome = commands::execute(cli.command, &gateway).await;

    // A login rejected with 401 also "ends" the (absent) session; only
    // commands that relied on a session report it as ended
    if navigator.redirected() && !opens_session {
        return Err(Error::SessionEnded.into());
    }
    outcome
}

/// Print what the user has not seen yet and pick the exit code.
fn report(err: &anyhow::Error, notifier: &ConsoleNotifier) -> ExitCode {
    if let Some(console_err) = err.downcast_ref::<Error>() {
        eprintln!("{console_err}");
        return ExitCode::from(console_err.exit_code());
    }
    if already_shown(err, notifier) {
        debug!(error = %err, "command failed");
    } else {
        eprintln!("error: {err:#}");
    }
    ExitCode::FAILURE
}

/// Request failures and messages the gateway already printed as notices.
fn already_shown(err: &anyhow::Error, notifier: &ConsoleNotifier) -> bool {
    matches!(err.downcast_ref::<gateway::Error>(), Some(gateway::Error::Api(_)))
        || notifier.has_shown(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::{Notice, Notifier};

    #[test]
    fn notified_message_is_not_reported_twice() {
        let notifier = ConsoleNotifier::default();
        notifier.notify(Notice::error("Invalid email or password"));

        let err = anyhow::anyhow!("Invalid email or password");
        assert!(already_shown(&err, &notifier));

        let other = anyhow::anyhow!("Login failed. Please try again.");
        assert!(!already_shown(&other, &notifier));
    }
}
