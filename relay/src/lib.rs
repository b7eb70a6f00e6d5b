pub mod config;
pub mod decode;
pub mod encode;
pub mod errors;
pub mod handler;
pub mod http;
pub mod metrics_defs;
pub mod router;
pub mod staging;

#[cfg(test)]
mod testutils;

use errors::RelayError;
use handler::RelayState;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;

/// Runs the submission endpoint and the admin listener until either fails.
pub async fn run(config: config::Config) -> Result<(), RelayError> {
    config.validate()?;

    let state = RelayState::new(&config)?;
    let app = router::build_router(state, config.max_request_bytes);
    let ready = Arc::new(AtomicBool::new(false));

    let listener = TcpListener::bind(format!(
        "{}:{}",
        config.listener.host, config.listener.port
    ))
    .await?;
    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        staging_dir = %config.staging_dir.display(),
        "Relay listening"
    );

    let ready_flag = ready.clone();
    let admin_service = AdminService::new(move || ready_flag.load(Ordering::Relaxed));
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    let relay_task = async {
        ready.store(true, Ordering::Relaxed);
        axum::serve(listener, app).await
    };

    tokio::try_join!(relay_task, admin_task)?;
    Ok(())
}
