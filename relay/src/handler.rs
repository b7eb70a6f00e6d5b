use crate::config::Config;
use crate::decode::decode;
use crate::encode::build_form;
use crate::errors::{DecodeError, RelayError};
use crate::http::{ForwardOutcome, send_to_collector};
use crate::metrics_defs::{
    FORWARD_DURATION, REQUESTS_INFLIGHT, STAGING_CLEANUP_FAILURES, SUBMISSIONS_FORWARDED,
    SUBMISSIONS_RECEIVED, SUBMISSIONS_REJECTED,
};
use crate::staging::Staging;
use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use http::{Method, StatusCode};
use shared::submission::Ack;
use shared::{counter, gauge, histogram};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Where a single submission is in its trip through the relay.
///
/// `Cleaned` is reached from both terminal forwarding states and always comes
/// before `Responded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Decoded,
    Forwarding,
    Succeeded,
    Failed,
    Cleaned,
    Responded,
}

/// Per-request record of the phases passed through.
#[derive(Debug)]
pub struct Lifecycle {
    request_id: String,
    phases: Vec<Phase>,
}

impl Lifecycle {
    fn new(request_id: String) -> Self {
        let mut lifecycle = Lifecycle {
            request_id,
            phases: Vec::new(),
        };
        lifecycle.advance(Phase::Received);
        lifecycle
    }

    pub fn advance(&mut self, phase: Phase) {
        tracing::debug!(request = %self.request_id, phase = ?phase, "Submission phase");
        self.phases.push(phase);
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }
}

#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    collector_url: Arc<Url>,
    staging_dir: Arc<PathBuf>,
    max_file_bytes: u64,
}

impl RelayState {
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(RelayError::HttpClient)?;

        Ok(RelayState {
            client,
            collector_url: Arc::new(config.collector_url()?),
            staging_dir: Arc::new(config.staging_dir.clone()),
            max_file_bytes: config.max_file_bytes,
        })
    }

    /// Runs decode, forward and cleanup for one submission.
    ///
    /// Staged files are always deleted before this returns, whatever the
    /// forwarding outcome.
    pub async fn relay(
        &self,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> (Result<ForwardOutcome, RelayError>, Lifecycle) {
        let mut staging = match Staging::new(&self.staging_dir).await {
            Ok(staging) => staging,
            Err(e) => {
                let mut lifecycle = Lifecycle::new("unstaged".to_string());
                lifecycle.advance(Phase::Failed);
                return (Err(e.into()), lifecycle);
            }
        };
        let mut lifecycle = Lifecycle::new(staging.id().to_string());

        let result = self
            .decode_and_forward(multipart, &mut staging, &mut lifecycle)
            .await;

        lifecycle.advance(match result {
            Ok(_) => Phase::Succeeded,
            Err(_) => Phase::Failed,
        });

        let failures = staging.cleanup().await;
        if failures > 0 {
            counter!(STAGING_CLEANUP_FAILURES).increment(failures as u64);
        }
        lifecycle.advance(Phase::Cleaned);

        (result, lifecycle)
    }

    async fn decode_and_forward(
        &self,
        multipart: Result<Multipart, MultipartRejection>,
        staging: &mut Staging,
        lifecycle: &mut Lifecycle,
    ) -> Result<ForwardOutcome, RelayError> {
        let multipart = multipart.map_err(DecodeError::from)?;
        let decoded = decode(multipart, staging, self.max_file_bytes).await?;
        lifecycle.advance(Phase::Decoded);

        let (form, summary) = build_form(&decoded).await?;
        tracing::info!(
            request = %lifecycle.request_id(),
            fields = summary.fields,
            files = summary.files,
            skipped_empty = ?summary.skipped_empty,
            "Forwarding submission"
        );

        lifecycle.advance(Phase::Forwarding);
        let started = Instant::now();
        let outcome = send_to_collector(&self.client, &self.collector_url, form).await;
        histogram!(FORWARD_DURATION).record(started.elapsed().as_secs_f64());

        let outcome = outcome?;
        if !outcome.is_success() {
            tracing::error!(
                request = %lifecycle.request_id(),
                status = %outcome.status,
                body = ?outcome.body,
                "Collector rejected submission"
            );
            return Err(RelayError::CollectorRejected(outcome.status));
        }

        tracing::info!(
            request = %lifecycle.request_id(),
            status = %outcome.status,
            body = ?outcome.body,
            "Collector accepted submission"
        );
        Ok(outcome)
    }
}

struct InflightGuard;

impl InflightGuard {
    fn enter() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

/// `POST /api/county`
pub async fn submit(
    State(state): State<RelayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let _inflight = InflightGuard::enter();
    counter!(SUBMISSIONS_RECEIVED).increment(1);

    let (result, mut lifecycle) = state.relay(multipart).await;

    let response = match result {
        Ok(_) => {
            counter!(SUBMISSIONS_FORWARDED, "outcome" => "success").increment(1);
            (StatusCode::OK, Json(Ack::success())).into_response()
        }
        Err(e) => {
            if e.is_forwarding_failure() {
                counter!(SUBMISSIONS_FORWARDED, "outcome" => "forward_failed").increment(1);
            } else {
                counter!(SUBMISSIONS_REJECTED, "reason" => e.rejection_reason()).increment(1);
            }
            tracing::error!(request = %lifecycle.request_id(), error = %e, "Error processing submission");
            e.into_response()
        }
    };

    lifecycle.advance(Phase::Responded);
    response
}

/// Any method other than POST on the submission endpoint.
pub async fn method_not_allowed(method: Method) -> Response {
    tracing::warn!(method = %method, "Rejected submission request method");
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(Ack::message("Method not allowed")),
    )
        .into_response()
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Ack::error(self.public_message())),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::MockCollector;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use http::Request;

    const BOUNDARY: &str = "relay-state-boundary";

    async fn contract_only() -> Result<Multipart, MultipartRejection> {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"insuredName\"\r\n\r\nJane\r\n\
             --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"aobContract\"; filename=\"c.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n%PDF\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await
    }

    fn state_for(collector: &MockCollector, staging_dir: PathBuf) -> RelayState {
        let config = Config {
            collector_url: collector.url.to_string(),
            staging_dir,
            ..Config::default()
        };
        RelayState::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle_on_success() {
        let collector = MockCollector::start(StatusCode::OK).await;
        let root = tempfile::tempdir().unwrap();
        let state = state_for(&collector, root.path().to_path_buf());

        let (result, lifecycle) = state.relay(contract_only().await).await;
        assert!(result.is_ok());
        assert_eq!(
            lifecycle.phases(),
            &[
                Phase::Received,
                Phase::Decoded,
                Phase::Forwarding,
                Phase::Succeeded,
                Phase::Cleaned
            ]
        );
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_lifecycle_on_collector_failure() {
        let collector = MockCollector::start(StatusCode::INTERNAL_SERVER_ERROR).await;
        let root = tempfile::tempdir().unwrap();
        let state = state_for(&collector, root.path().to_path_buf());

        let (result, lifecycle) = state.relay(contract_only().await).await;
        assert!(matches!(
            result,
            Err(RelayError::CollectorRejected(StatusCode::INTERNAL_SERVER_ERROR))
        ));
        assert_eq!(
            lifecycle.phases(),
            &[
                Phase::Received,
                Phase::Decoded,
                Phase::Forwarding,
                Phase::Failed,
                Phase::Cleaned
            ]
        );
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_cleanup_keeps_forwarding_result() {
        let root = tempfile::tempdir().unwrap();
        let staging_root = root.path().to_path_buf();

        // Once the collector has the payload, swap every staged file for a
        // non-empty directory so deleting it fails.
        let hook_root = staging_root.clone();
        let collector = MockCollector::start_with_hook(StatusCode::OK, move || {
            for dir in std::fs::read_dir(&hook_root).unwrap() {
                for staged in std::fs::read_dir(dir.unwrap().path()).unwrap() {
                    let path = staged.unwrap().path();
                    std::fs::remove_file(&path).unwrap();
                    std::fs::create_dir(&path).unwrap();
                    std::fs::write(path.join("leftover"), b"x").unwrap();
                }
            }
        })
        .await;
        let state = state_for(&collector, staging_root);

        let (result, lifecycle) = state.relay(contract_only().await).await;
        let outcome = result.unwrap();
        assert!(outcome.is_success());
        assert_eq!(
            lifecycle.phases(),
            &[
                Phase::Received,
                Phase::Decoded,
                Phase::Forwarding,
                Phase::Succeeded,
                Phase::Cleaned
            ]
        );
        assert_eq!(collector.received().len(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_on_decode_failure() {
        let collector = MockCollector::start(StatusCode::OK).await;
        let root = tempfile::tempdir().unwrap();
        let mut state = state_for(&collector, root.path().to_path_buf());
        state.max_file_bytes = 2;

        let (result, lifecycle) = state.relay(contract_only().await).await;
        assert!(matches!(
            result,
            Err(RelayError::Decode(DecodeError::FileTooLarge { .. }))
        ));
        // no forwarding attempt after a decode failure
        assert_eq!(
            lifecycle.phases(),
            &[Phase::Received, Phase::Failed, Phase::Cleaned]
        );
        assert!(collector.received().is_empty());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
