use crate::errors::ForwardError;
use http::StatusCode;
use reqwest::multipart::Form;

/// What the collector answered, captured once.
#[derive(Debug)]
pub struct ForwardOutcome {
    pub status: StatusCode,
    /// Response body, when it parses as JSON
    pub body: Option<serde_json::Value>,
}

impl ForwardOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Send the rebuilt payload to the collector in a single request.
///
/// There is no retry and no timeout of our own: the outcome of this one
/// attempt is what the caller gets. A non-2xx status is returned as an
/// outcome, not an error, so the caller can log what the collector said.
/// The body is captured only when it can be read and parses as JSON.
pub async fn send_to_collector(
    client: &reqwest::Client,
    collector_url: &url::Url,
    form: Form,
) -> Result<ForwardOutcome, ForwardError> {
    let response = client
        .post(collector_url.clone())
        .multipart(form)
        .send()
        .await
        .map_err(ForwardError::Request)?;

    // The status alone decides the outcome. A body that cannot be read after
    // a 2xx must not turn an accepted submission into a failure.
    let status = response.status();
    let body = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).ok(),
        Err(e) => {
            tracing::warn!(status = %status, error = %e, "Failed to read collector response body");
            None
        }
    };

    Ok(ForwardOutcome { status, body })
}
