use crate::compose::Submission;
use crate::errors::ComposerError;
use shared::submission::{Ack, SUBMIT_PATH};
use url::Url;

/// HTTP client for the relay's submission endpoint.
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    submit_url: Url,
}

impl RelayClient {
    /// `relay_url` is the relay's base URL; the submission path is appended.
    pub fn new(relay_url: &Url) -> Result<Self, ComposerError> {
        Ok(RelayClient {
            client: reqwest::Client::new(),
            submit_url: relay_url.join(SUBMIT_PATH)?,
        })
    }

    pub fn submit_url(&self) -> &Url {
        &self.submit_url
    }

    /// Sends one submission. Any non-2xx answer is an error carrying the
    /// relay's message.
    pub async fn send(&self, submission: Submission) -> Result<Ack, ComposerError> {
        let form = submission.into_form().map_err(ComposerError::Encode)?;

        let response = self
            .client
            .post(self.submit_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(ComposerError::Request)?;

        let status = response.status();
        let ack = match response.json::<Ack>().await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::warn!(error = %e, "Could not parse relay response");
                Ack::error("Could not parse server response")
            }
        };

        if !status.is_success() {
            let message = ack.text().unwrap_or("Submission failed").to_string();
            tracing::error!(status = %status, message = %message, "Relay returned error");
            return Err(ComposerError::Rejected { status, message });
        }

        Ok(ack)
    }
}
