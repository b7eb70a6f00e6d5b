use crate::decode::DecodedSubmission;
use crate::errors::RelayError;
use reqwest::multipart::{Form, Part};
use shared::submission::{FALLBACK_CONTENT_TYPE, fallback_file_name, normalize_field};

/// Summary of what went into the outbound payload, for logging.
#[derive(Debug, Default, PartialEq)]
pub struct EncodeSummary {
    pub fields: usize,
    pub files: usize,
    pub skipped_empty: Vec<String>,
}

/// Rebuilds the collector payload from a decoded submission.
///
/// Field values are trimmed and the county rewrite is applied again here, as
/// this is the last point before the collector. Empty files are left out
/// because the collector rejects empty file parts. Staged files are streamed
/// from disk rather than buffered.
pub async fn build_form(decoded: &DecodedSubmission) -> Result<(Form, EncodeSummary), RelayError> {
    let mut form = Form::new();
    let mut summary = EncodeSummary::default();

    for (name, values) in &decoded.fields {
        for value in values {
            form = form.text(name.clone(), normalize_field(name, value));
            summary.fields += 1;
        }
    }

    for (name, file) in &decoded.files {
        if file.is_empty() {
            tracing::info!(part = %name, "Skipping empty file");
            summary.skipped_empty.push(name.clone());
            continue;
        }

        let handle = tokio::fs::File::open(&file.path).await?;
        let file_name = file
            .file_name
            .clone()
            .unwrap_or_else(|| fallback_file_name(name));
        let content_type = file
            .content_type
            .as_deref()
            .unwrap_or(FALLBACK_CONTENT_TYPE);

        tracing::info!(part = %name, file_name = %file_name, size = file.size, "Forwarding file");
        let part = Part::stream_with_length(handle, file.size)
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(RelayError::Encode)?;

        form = form.part(name.clone(), part);
        summary.files += 1;
    }

    Ok((form, summary))
}
