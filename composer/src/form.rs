//! Client-side form state as an explicit value object.
//!
//! The composer never reads ambient UI state: whatever the form holds at the
//! moment of a send is captured in a [`FormState`] and handed to
//! [`crate::compose::compose`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shared::submission::{AttachmentSlot, Field, NOT_APPLICABLE};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A file chosen for an attachment slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, bytes: impl Into<Bytes>) -> Self {
        SelectedFile {
            file_name: file_name.into(),
            content_type: content_type.filter(|ct| !ct.is_empty()).map(str::to_owned),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, guessing its media type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(media_type_for_extension);

        Ok(SelectedFile::new(file_name, content_type, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "heic" => Some("image/heic"),
        "txt" => Some("text/plain"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default)]
    pub fields: BTreeMap<Field, String>,
    /// Fields switched into "not applicable" mode
    #[serde(default)]
    pub not_applicable: BTreeSet<Field>,
    #[serde(default)]
    pub files: BTreeMap<AttachmentSlot, SelectedFile>,
}

impl FormState {
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    /// The value the form currently shows for `field`.
    pub fn value(&self, field: Field) -> &str {
        if self.is_not_applicable(field) {
            return NOT_APPLICABLE;
        }
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Supplies the sentinel value for `field` until cleared. Returns false,
    /// leaving the form unchanged, for a field without that mode.
    pub fn mark_not_applicable(&mut self, field: Field) -> bool {
        if !field.accepts_not_applicable() {
            tracing::warn!(%field, "Field has no not-applicable mode");
            return false;
        }
        self.not_applicable.insert(field);
        true
    }

    /// Leaves "not applicable" mode; the field is cleared to empty.
    pub fn clear_not_applicable(&mut self, field: Field) {
        if self.not_applicable.remove(&field) {
            self.fields.insert(field, String::new());
        }
    }

    pub fn is_not_applicable(&self, field: Field) -> bool {
        field.accepts_not_applicable() && self.not_applicable.contains(&field)
    }

    pub fn select_file(&mut self, slot: AttachmentSlot, file: SelectedFile) {
        self.files.insert(slot, file);
    }

    pub fn clear_file(&mut self, slot: AttachmentSlot) {
        self.files.remove(&slot);
    }

    pub fn file(&self, slot: AttachmentSlot) -> Option<&SelectedFile> {
        self.files.get(&slot)
    }

    /// Empties every field and every file selection.
    pub fn reset(&mut self) {
        *self = FormState::default();
    }

    /// Names of required fields left blank and required slots left empty.
    ///
    /// This is the whole of the form's gating: a value made only of
    /// whitespace still counts as present, like a browser's required check.
    pub fn missing_required(&self) -> Vec<String> {
        let fields = Field::ALL
            .into_iter()
            .filter(|f| f.is_required() && self.value(*f).is_empty())
            .map(|f| f.as_str().to_string());

        let files = AttachmentSlot::ALL
            .into_iter()
            .filter(|s| s.is_required() && self.file(*s).is_none())
            .map(|s| s.as_str().to_string());

        fields.chain(files).collect()
    }
}
