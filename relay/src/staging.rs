// Request-scoped staging of decoded file parts. Each request gets its own
// temporary directory under the configured root, so concurrent submissions
// never share a path.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Staging {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl Staging {
    /// Creates a fresh staging directory under `root`, creating `root` if needed.
    pub async fn new(root: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        let dir = tempfile::Builder::new()
            .prefix("submission-")
            .tempdir_in(root)?;

        Ok(Staging {
            dir,
            files: Vec::new(),
        })
    }

    /// Identifier of this staging area, used to correlate log lines.
    pub fn id(&self) -> &str {
        self.dir
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("submission")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates a new file for `part_name` and records it for cleanup.
    pub async fn create_file(&mut self, part_name: &str) -> io::Result<(PathBuf, tokio::fs::File)> {
        let filename = format!("{}-{}", self.files.len(), sanitize(part_name));
        let path = self.dir.path().join(filename);
        let file = tokio::fs::File::create(&path).await?;
        self.files.push(path.clone());
        Ok((path, file))
    }

    /// Deletes every staged file and the staging directory itself.
    ///
    /// Failures are logged and counted, never returned: a failed cleanup must
    /// not change the outcome reported to the caller.
    pub async fn cleanup(self) -> usize {
        let mut failures = 0;

        for path in &self.files {
            match tokio::fs::remove_file(path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Deleted staged file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    failures += 1;
                    tracing::error!(path = %path.display(), error = %e, "Failed to delete staged file");
                }
            }
        }

        let dir_path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            failures += 1;
            tracing::error!(path = %dir_path.display(), error = %e, "Failed to remove staging directory");
        }

        failures
    }
}

// Part names come from the client; keep only characters that are safe in a filename.
fn sanitize(part_name: &str) -> String {
    let cleaned: String = part_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(64)
        .collect();

    if cleaned.is_empty() {
        "part".to_string()
    } else {
        cleaned
    }
}
