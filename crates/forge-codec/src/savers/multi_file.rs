//! Multi-file saver

use super::writer::write_file;
use super::{EmitFiles, SavedFile};
use crate::error::SaveError;
use async_trait::async_trait;
use forge_artifact::MultiFileArtifact;
use std::collections::HashSet;
use std::path::Path;

#[async_trait]
impl EmitFiles for MultiFileArtifact {
    fn validate(&self) -> Result<(), SaveError> {
        if self.files.is_empty() {
            return Err(SaveError::validation("multi-file result has no files"));
        }

        let mut files = HashSet::new();
        for file in &self.files {
            if !files.insert(file.path.segments()) {
                return Err(SaveError::validation(format!(
                    "duplicate file path: {}",
                    file.path
                )));
            }
        }

        // A file cannot also be a directory of another file
        for file in &self.files {
            let segments = file.path.segments();
            for depth in 1..segments.len() {
                if files.contains(&segments[..depth]) {
                    return Err(SaveError::validation(format!(
                        "path {} is nested under file {}",
                        file.path,
                        segments[..depth].join("/")
                    )));
                }
            }
        }

        if !self.has_entry_point() {
            tracing::warn!(
                files = self.files.len(),
                "multi-file result has no top-level index.html"
            );
        }

        Ok(())
    }

    async fn emit_files(&self, root: &Path) -> Result<Vec<SavedFile>, SaveError> {
        let mut saved = Vec::with_capacity(self.files.len());
        for file in &self.files {
            saved.push(write_file(root, &file.path, &file.content).await?);
        }
        Ok(saved)
    }
}
