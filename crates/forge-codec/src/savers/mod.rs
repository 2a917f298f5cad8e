//! Savers from typed results to files on disk
//!
//! Each result variant implements [`EmitFiles`]; [`CodeSaver`] picks the
//! artifact directory and dispatches on the variant. Layout:
//!
//! ```text
//! {root}/html_{app_id}/index.html
//! {root}/multi_file_{app_id}/{relative paths...}
//! ```

use crate::error::SaveError;
use async_trait::async_trait;
use forge_artifact::{AppId, CodeGenMode, ContentHash, ParsedCode, RelativePath};
use serde::Serialize;
use std::path::{Path, PathBuf};

mod multi_file;
mod single_page;
mod writer;

/// Capability to check and write a result's files
#[async_trait]
pub trait EmitFiles: Send + Sync {
    /// Check invariants before anything touches the filesystem
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Validation`] describing the first violation.
    fn validate(&self) -> Result<(), SaveError>;

    /// Write every file under `root`
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Io`] on the first failed write.
    async fn emit_files(&self, root: &Path) -> Result<Vec<SavedFile>, SaveError>;
}

/// One file written by a save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    /// Location relative to the artifact directory
    pub path: RelativePath,
    /// Bytes written
    pub bytes: usize,
    /// Content hash of what was written
    pub hash: ContentHash,
}

/// Outcome of a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtifact {
    /// Artifact directory
    pub root: PathBuf,
    /// Files written, in write order
    pub files: Vec<SavedFile>,
}

impl SavedArtifact {
    /// Total bytes across all files
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

/// Writes parsed results under an output root
#[derive(Debug, Clone)]
pub struct CodeSaver {
    root: PathBuf,
}

impl CodeSaver {
    /// Create saver writing under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory an application's artifact for `mode` is written to
    #[must_use]
    pub fn artifact_dir(&self, app_id: AppId, mode: CodeGenMode) -> PathBuf {
        self.root.join(format!("{}_{}", mode.as_str(), app_id))
    }

    /// Validate and write `code` for `mode`
    ///
    /// Without an application id the legacy directory ([`AppId::LEGACY`]) is
    /// used. Saving again overwrites files of the same name.
    ///
    /// # Errors
    ///
    /// - [`SaveError::ModeMismatch`] if `code` is not a `mode` result
    /// - [`SaveError::Validation`] if `code` breaks its invariants
    /// - [`SaveError::Io`] if a directory or file cannot be written
    pub async fn save(
        &self,
        code: &ParsedCode,
        mode: CodeGenMode,
        app_id: Option<AppId>,
    ) -> Result<SavedArtifact, SaveError> {
        if code.mode() != mode {
            return Err(SaveError::ModeMismatch {
                expected: mode,
                actual: code.mode(),
            });
        }

        let emitter: &dyn EmitFiles = match code {
            ParsedCode::SinglePage(page) => page,
            ParsedCode::MultiFile(project) => project,
        };
        emitter.validate()?;

        let app_id = app_id.unwrap_or(AppId::LEGACY);
        let root = self.artifact_dir(app_id, mode);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| SaveError::io_error(&root, e))?;

        let files = emitter.emit_files(&root).await?;

        tracing::info!(
            %app_id,
            %mode,
            dir = %root.display(),
            files = files.len(),
            "saved generated code"
        );

        Ok(SavedArtifact { root, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse;
    use forge_artifact::SinglePageArtifact;
    use pretty_assertions::assert_eq;

    #[test]
    fn artifact_dir_layout() {
        let saver = CodeSaver::new("/out");
        assert_eq!(
            saver.artifact_dir(AppId(7), CodeGenMode::SinglePage),
            PathBuf::from("/out/html_7")
        );
        assert_eq!(
            saver.artifact_dir(AppId(7), CodeGenMode::MultiFile),
            PathBuf::from("/out/multi_file_7")
        );
    }

    #[tokio::test]
    async fn save_parsed_multi_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let saver = CodeSaver::new(dir.path());
        let raw = "```html\n<h1>Hi</h1>\n```\n```css\nh1{color:red}\n```\n";

        let code = parse(raw, CodeGenMode::MultiFile).unwrap();
        let saved = saver
            .save(&code, CodeGenMode::MultiFile, Some(AppId(42)))
            .await
            .unwrap();

        assert_eq!(saved.root, dir.path().join("multi_file_42"));
        assert_eq!(
            std::fs::read_to_string(saved.root.join("index.html")).unwrap(),
            "<h1>Hi</h1>\n"
        );
        assert_eq!(
            std::fs::read_to_string(saved.root.join("style.css")).unwrap(),
            "h1{color:red}\n"
        );
        assert_eq!(saved.total_bytes(), "<h1>Hi</h1>\n".len() + "h1{color:red}\n".len());
    }

    #[tokio::test]
    async fn save_without_app_id_uses_legacy_dir() {
        let dir = tempfile::tempdir().unwrap();
        let saver = CodeSaver::new(dir.path());
        let code = ParsedCode::from(SinglePageArtifact::new("<p>x</p>"));

        let saved = saver.save(&code, CodeGenMode::SinglePage, None).await.unwrap();

        assert_eq!(saved.root, dir.path().join("html_0"));
    }

    #[tokio::test]
    async fn save_rejects_mode_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let saver = CodeSaver::new(dir.path());
        let code = ParsedCode::from(SinglePageArtifact::new("<p>x</p>"));

        let err = saver
            .save(&code, CodeGenMode::MultiFile, Some(AppId(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, SaveError::ModeMismatch { .. }));
        assert!(!dir.path().join("multi_file_1").exists());
    }

    #[tokio::test]
    async fn save_blank_page_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let saver = CodeSaver::new(dir.path());
        let code = ParsedCode::from(SinglePageArtifact::new("   "));

        let err = saver
            .save(&code, CodeGenMode::SinglePage, Some(AppId(3)))
            .await
            .unwrap_err();

        assert!(matches!(err, SaveError::Validation(_)));
        assert!(!dir.path().join("html_3").exists());
    }

    #[tokio::test]
    async fn save_reports_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "not a directory").unwrap();
        let saver = CodeSaver::new(&blocker);
        let code = ParsedCode::from(SinglePageArtifact::new("<p>x</p>"));

        let err = saver
            .save(&code, CodeGenMode::SinglePage, Some(AppId(1)))
            .await
            .unwrap_err();

        assert!(err.is_io());
    }
}
