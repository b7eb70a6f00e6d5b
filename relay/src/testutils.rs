use axum::Json;
use axum::Router;
use axum::extract::{Multipart, State};
use axum::routing::post;
use http::StatusCode;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFile {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// One multipart payload as the collector saw it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedSubmission {
    pub fields: Vec<(String, String)>,
    pub files: Vec<CapturedFile>,
}

impl CapturedSubmission {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn file(&self, name: &str) -> Option<&CapturedFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

type ReceiveHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
struct CollectorState {
    status: StatusCode,
    received: Arc<Mutex<Vec<CapturedSubmission>>>,
    on_receive: Option<ReceiveHook>,
}

/// In-process stand-in for the collector webhook. Records every payload and
/// answers with a fixed status.
pub struct MockCollector {
    pub url: url::Url,
    received: Arc<Mutex<Vec<CapturedSubmission>>>,
}

impl MockCollector {
    pub async fn start(status: StatusCode) -> Self {
        Self::spawn(status, None).await
    }

    /// Like `start`, but runs `hook` after each payload is read and before
    /// the answer is sent.
    pub async fn start_with_hook(status: StatusCode, hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self::spawn(status, Some(Arc::new(hook))).await
    }

    async fn spawn(status: StatusCode, on_receive: Option<ReceiveHook>) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = CollectorState {
            status,
            received: received.clone(),
            on_receive,
        };

        let app = Router::new()
            .route("/hook", post(capture))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockCollector {
            url: url::Url::parse(&format!("http://127.0.0.1:{port}/hook")).unwrap(),
            received,
        }
    }

    pub fn received(&self) -> Vec<CapturedSubmission> {
        self.received.lock().unwrap().clone()
    }
}

async fn capture(
    State(state): State<CollectorState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut captured = CapturedSubmission::default();

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_owned) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.unwrap().to_vec();
                captured.files.push(CapturedFile {
                    name,
                    file_name: Some(file_name),
                    content_type,
                    bytes,
                });
            }
            None => {
                let value = field.text().await.unwrap();
                captured.fields.push((name, value));
            }
        }
    }

    state.received.lock().unwrap().push(captured);
    if let Some(hook) = &state.on_receive {
        hook();
    }

    let body = if state.status.is_success() {
        serde_json::json!({"status": "success"})
    } else {
        serde_json::json!({"status": "error"})
    };
    (state.status, Json(body))
}
