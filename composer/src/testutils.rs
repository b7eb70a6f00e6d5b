use crate::form::{FormState, SelectedFile};
use axum::Json;
use axum::Router;
use axum::extract::{Multipart, State};
use axum::routing::post;
use http::StatusCode;
use shared::submission::{Ack, AttachmentSlot, Field, SUBMIT_PATH};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

/// A form with every field filled and the contract attached.
pub fn filled_form() -> FormState {
    let mut state = FormState::default();
    for field in Field::ALL {
        state.set_field(field, format!("{field} value"));
    }
    state.set_field(Field::County, "Greene");
    state.select_file(
        AttachmentSlot::AobContract,
        SelectedFile::new("contract.pdf", Some("application/pdf"), "%PDF"),
    );
    state
}

/// What the relay saw: text parts in order and the names of file parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceivedSubmission {
    pub fields: Vec<(String, String)>,
    pub files: Vec<String>,
}

#[derive(Clone)]
struct RelayState {
    status: StatusCode,
    gate: Arc<Semaphore>,
    arrivals: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<ReceivedSubmission>>>,
}

/// In-process stand-in for the relay endpoint.
pub struct MockRelay {
    pub url: url::Url,
    gate: Arc<Semaphore>,
    arrivals: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<ReceivedSubmission>>>,
}

impl MockRelay {
    /// Answers every request immediately with `status`.
    pub async fn start(status: StatusCode) -> Self {
        Self::spawn(status, Semaphore::MAX_PERMITS).await
    }

    /// Holds every request until [`MockRelay::release`] is called.
    pub async fn start_held(status: StatusCode) -> Self {
        Self::spawn(status, 0).await
    }

    async fn spawn(status: StatusCode, permits: usize) -> Self {
        let gate = Arc::new(Semaphore::new(permits));
        let arrivals = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = RelayState {
            status,
            gate: gate.clone(),
            arrivals: arrivals.clone(),
            received: received.clone(),
        };

        let app = Router::new()
            .route(SUBMIT_PATH, post(capture))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockRelay {
            url: url::Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap(),
            gate,
            arrivals,
            received,
        }
    }

    pub fn release(&self, requests: usize) {
        self.gate.add_permits(requests);
    }

    /// Waits until `count` requests have reached the relay.
    pub async fn wait_for_arrivals(&self, count: usize) {
        while self.arrivals.load(Ordering::Acquire) < count {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    pub fn received(&self) -> Vec<ReceivedSubmission> {
        self.received.lock().unwrap().clone()
    }
}

async fn capture(
    State(state): State<RelayState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Ack>) {
    let mut captured = ReceivedSubmission::default();

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            let bytes = field.bytes().await.unwrap();
            if !bytes.is_empty() {
                captured.files.push(name);
            }
        } else {
            let value = field.text().await.unwrap();
            captured.fields.push((name, value));
        }
    }

    state.arrivals.fetch_add(1, Ordering::AcqRel);
    state.gate.acquire().await.unwrap().forget();
    state.received.lock().unwrap().push(captured);

    if state.status.is_success() {
        (state.status, Json(Ack::success()))
    } else {
        (state.status, Json(Ack::error("Failed to submit complaint")))
    }
}
