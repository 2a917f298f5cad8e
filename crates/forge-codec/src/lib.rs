//! Forge Codec
//!
//! The boundary between raw model output and files on disk.
//!
//! # Core Operations
//!
//! - **Parse**: Extract a typed `ParsedCode` from accumulated generated text
//! - **Save**: Validate a result and write it under its artifact directory
//!
//! # Architecture
//!
//! ```text
//! generated text → parse(raw, mode) → ParsedCode → CodeSaver::save → {root}/{mode}_{app_id}/
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use forge_codec::{parse, CodeSaver};
//! use forge_artifact::{AppId, CodeGenMode};
//!
//! # async fn example(raw: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let code = parse(raw, CodeGenMode::MultiFile)?;
//! let saved = CodeSaver::new("tmp/code_output")
//!     .save(&code, CodeGenMode::MultiFile, Some(AppId(42)))
//!     .await?;
//! println!("wrote {} files to {}", saved.files.len(), saved.root.display());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod parsers;
pub mod savers;

pub use error::{ParseError, SaveError};
pub use parsers::{parse, CodeParser, MultiFileParser, SinglePageParser};
pub use savers::{CodeSaver, EmitFiles, SavedArtifact, SavedFile};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for parsing and saving generated code
    pub use crate::error::{ParseError, SaveError};
    pub use crate::parsers::{parse, CodeParser};
    pub use crate::savers::{CodeSaver, EmitFiles, SavedArtifact};
    pub use forge_artifact::{AppId, CodeGenMode, ParsedCode};
}
