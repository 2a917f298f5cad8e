//! Single-page saver

use super::writer::write_file;
use super::{EmitFiles, SavedFile};
use crate::error::SaveError;
use async_trait::async_trait;
use forge_artifact::{RelativePath, SinglePageArtifact, ENTRY_POINT};
use std::path::Path;

#[async_trait]
impl EmitFiles for SinglePageArtifact {
    fn validate(&self) -> Result<(), SaveError> {
        if self.is_blank() {
            return Err(SaveError::validation("single page markup is empty"));
        }
        Ok(())
    }

    async fn emit_files(&self, root: &Path) -> Result<Vec<SavedFile>, SaveError> {
        let entry: RelativePath = ENTRY_POINT.parse()?;
        let saved = write_file(root, &entry, &self.markup).await?;
        Ok(vec![saved])
    }
}
