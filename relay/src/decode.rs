use crate::errors::DecodeError;
use crate::staging::Staging;
use axum::extract::Multipart;
use axum::extract::multipart::Field;
use indexmap::IndexMap;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// A file part staged to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub path: PathBuf,
    pub size: u64,
}

impl DecodedFile {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// The inbound submission split into text fields and staged files.
///
/// Text values are kept exactly as received; normalization happens when the
/// outbound payload is built.
#[derive(Debug, Default, PartialEq)]
pub struct DecodedSubmission {
    pub fields: IndexMap<String, Vec<String>>,
    pub files: IndexMap<String, DecodedFile>,
}

/// Decodes a multipart body. Parts carrying a filename are streamed into
/// `staging`; every other part is read as text.
///
/// Empty files are accepted here and filtered out when the outbound payload
/// is built. Only the first file for a given part name is staged.
pub async fn decode(
    mut multipart: Multipart,
    staging: &mut Staging,
    max_file_bytes: u64,
) -> Result<DecodedSubmission, DecodeError> {
    let mut decoded = DecodedSubmission::default();

    while let Some(mut field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            tracing::warn!("Skipping multipart part without a name");
            drain(&mut field).await?;
            continue;
        };

        if field.file_name().is_none() {
            let value = field.text().await?;
            decoded.fields.entry(name).or_default().push(value);
            continue;
        }

        if decoded.files.contains_key(&name) {
            tracing::warn!(part = %name, "Ignoring additional file for part");
            drain(&mut field).await?;
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);

        let (path, mut file) = staging.create_file(&name).await?;
        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len() as u64;
            if size > max_file_bytes {
                return Err(DecodeError::FileTooLarge {
                    part: name,
                    limit: max_file_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        tracing::debug!(part = %name, size, "Staged file part");
        decoded.files.insert(
            name,
            DecodedFile {
                file_name,
                content_type,
                path,
                size,
            },
        );
    }

    Ok(decoded)
}

async fn drain(field: &mut Field<'_>) -> Result<(), DecodeError> {
    while field.chunk().await?.is_some() {}
    Ok(())
}
