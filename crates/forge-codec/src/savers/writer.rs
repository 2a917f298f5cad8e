//! File writing helper shared by the savers

use super::SavedFile;
use crate::error::SaveError;
use forge_artifact::{ContentHash, RelativePath};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Write `content` to `root/relative`, creating parent directories
///
/// The file handle is closed before returning on every path.
pub(crate) async fn write_file(
    root: &Path,
    relative: &RelativePath,
    content: &str,
) -> Result<SavedFile, SaveError> {
    let target = root.join(relative.to_path_buf());

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SaveError::io_error(parent, e))?;
    }

    let mut file = tokio::fs::File::create(&target)
        .await
        .map_err(|e| SaveError::io_error(&target, e))?;
    let written = async {
        file.write_all(content.as_bytes()).await?;
        file.flush().await
    }
    .await;
    drop(file);
    written.map_err(|e| SaveError::io_error(&target, e))?;

    tracing::debug!(path = %target.display(), bytes = content.len(), "wrote artifact file");

    Ok(SavedFile {
        path: relative.clone(),
        bytes: content.len(),
        hash: ContentHash::compute(content.as_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_file_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let relative: RelativePath = "assets/css/site.css".parse().unwrap();

        let saved = write_file(dir.path(), &relative, "body{}").await.unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("assets/css/site.css")).unwrap();
        assert_eq!(on_disk, "body{}");
        assert_eq!(saved.bytes, 6);
        assert!(saved.hash.matches(b"body{}"));
    }

    #[tokio::test]
    async fn write_file_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let relative: RelativePath = "index.html".parse().unwrap();

        write_file(dir.path(), &relative, "<p>old, and longer</p>").await.unwrap();
        write_file(dir.path(), &relative, "<p>new</p>").await.unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert_eq!(on_disk, "<p>new</p>");
    }
}
