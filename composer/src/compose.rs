use crate::form::FormState;
use bytes::Bytes;
use indexmap::IndexMap;
use reqwest::multipart::{Form, Part};
use shared::submission::{AttachmentSlot, Field, normalize_field};

/// An attachment that will be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundAttachment {
    pub slot: AttachmentSlot,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// One send's worth of normalized fields and non-empty attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub fields: IndexMap<String, String>,
    pub attachments: Vec<OutboundAttachment>,
}

/// Builds the outbound submission from a snapshot of the form.
///
/// Every field is sent, trimmed and with the county rewrite applied; the form
/// itself keeps what the user selected. Attachments with no content are left
/// out entirely.
pub fn compose(state: &FormState) -> Submission {
    let fields = Field::ALL
        .into_iter()
        .map(|field| {
            let name = field.as_str();
            (name.to_string(), normalize_field(name, state.value(field)))
        })
        .collect();

    let attachments = AttachmentSlot::ALL
        .into_iter()
        .filter_map(|slot| state.file(slot).map(|file| (slot, file)))
        .filter(|(_, file)| !file.is_empty())
        .map(|(slot, file)| OutboundAttachment {
            slot,
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            bytes: file.bytes.clone(),
        })
        .collect();

    Submission {
        fields,
        attachments,
    }
}

impl Submission {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn attachment(&self, slot: AttachmentSlot) -> Option<&OutboundAttachment> {
        self.attachments.iter().find(|a| a.slot == slot)
    }

    /// Encodes the submission as a multipart form.
    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();

        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        for attachment in self.attachments {
            let length = attachment.bytes.len() as u64;
            let mut part =
                Part::stream_with_length(attachment.bytes, length).file_name(attachment.file_name);
            if let Some(content_type) = attachment.content_type {
                part = part.mime_str(&content_type)?;
            }
            form = form.part(attachment.slot.as_str(), part);
        }

        Ok(form)
    }
}
