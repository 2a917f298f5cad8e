//! Forge Artifact Model
//!
//! Typed values that flow between the parser, the saver and the pipeline.
//!
//! # Core Concepts
//!
//! - [`CodeGenMode`]: single page or multi-file project
//! - [`ParsedCode`]: sum type produced by the parser, consumed by the saver
//! - [`RelativePath`]: normalized path that cannot escape an artifact root
//! - [`ContentHash`]: Blake3 digest of written bytes
//! - [`AppId`] / [`UserId`]: application and principal identifiers
//!
//! # Example
//!
//! ```rust,ignore
//! use forge_artifact::{ArtifactFile, MultiFileArtifact, ParsedCode};
//!
//! let code: ParsedCode = MultiFileArtifact::new(vec![
//!     ArtifactFile::new("index.html".parse()?, "<h1>Hi</h1>\n"),
//! ])
//! .into();
//! assert_eq!(code.file_count(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod code;
mod hash;
mod path;
mod types;

pub use code::{ArtifactFile, MultiFileArtifact, ParsedCode, SinglePageArtifact, ENTRY_POINT};
pub use hash::{ContentHash, HashError};
pub use path::{PathError, RelativePath};
pub use types::{AppId, CodeGenMode, UnknownMode, UserId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
