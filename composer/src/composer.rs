use crate::client::RelayClient;
use crate::compose::compose;
use crate::errors::ComposerError;
use crate::form::FormState;
use shared::submission::Ack;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// How long a success notice stays visible.
pub const SUCCESS_NOTICE_TTL: Duration = Duration::from_secs(5);

const SUCCESS_MESSAGE: &str = "Your complaint form has been submitted successfully.";
const FAILURE_MESSAGE: &str = "Submission failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub shown_at: Instant,
}

impl Notice {
    fn new(kind: NoticeKind, message: &str) -> Self {
        Notice {
            kind,
            message: message.to_string(),
            shown_at: Instant::now(),
        }
    }

    /// Success notices dismiss themselves; failure notices stay until
    /// dismissed or replaced.
    pub fn is_visible_at(&self, now: Instant) -> bool {
        match self.kind {
            NoticeKind::Success => now.saturating_duration_since(self.shown_at) < SUCCESS_NOTICE_TTL,
            NoticeKind::Failure => true,
        }
    }
}

/// Owns the form state and turns a submit action into exactly one relay call.
pub struct Composer {
    client: RelayClient,
    form: Mutex<FormState>,
    submitting: AtomicBool,
    notice: Mutex<Option<Notice>>,
}

// Held for the duration of one submit; clears the in-flight flag on drop,
// including when the submit future is dropped early.
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitGuard(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Composer {
    pub fn new(client: RelayClient) -> Self {
        Composer::with_form(client, FormState::default())
    }

    pub fn with_form(client: RelayClient, form: FormState) -> Self {
        Composer {
            client,
            form: Mutex::new(form),
            submitting: AtomicBool::new(false),
            notice: Mutex::new(None),
        }
    }

    /// Applies an edit to the form.
    pub fn edit<R>(&self, f: impl FnOnce(&mut FormState) -> R) -> R {
        f(&mut lock(&self.form))
    }

    /// Snapshot of the current form state.
    pub fn form(&self) -> FormState {
        lock(&self.form).clone()
    }

    /// True while a submit is in flight; the submit action is disabled.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice_at(Instant::now())
    }

    pub fn notice_at(&self, now: Instant) -> Option<Notice> {
        lock(&self.notice)
            .as_ref()
            .filter(|n| n.is_visible_at(now))
            .cloned()
    }

    pub fn dismiss_notice(&self) {
        lock(&self.notice).take();
    }

    /// Sends the current form to the relay.
    ///
    /// On success the form is reset and a success notice is shown. On
    /// failure a failure notice is shown and the form is left as it was so
    /// the user can try again. A submit attempted while another is in flight
    /// is refused without any call.
    pub async fn submit(&self) -> Result<Ack, ComposerError> {
        let _guard = SubmitGuard::acquire(&self.submitting).ok_or(ComposerError::SubmitInProgress)?;

        let snapshot = self.form();
        let missing = snapshot.missing_required();
        if !missing.is_empty() {
            return Err(ComposerError::MissingRequired(missing));
        }

        let submission = compose(&snapshot);
        tracing::info!(
            attachments = submission.attachments.len(),
            url = %self.client.submit_url(),
            "Submitting form"
        );

        match self.client.send(submission).await {
            Ok(ack) => {
                tracing::info!("Form submitted successfully");
                lock(&self.form).reset();
                *lock(&self.notice) = Some(Notice::new(NoticeKind::Success, SUCCESS_MESSAGE));
                Ok(ack)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error submitting form");
                *lock(&self.notice) = Some(Notice::new(NoticeKind::Failure, FAILURE_MESSAGE));
                Err(e)
            }
        }
    }
}
