//! Style-preserving placeholder substitution for DOCX templates.
//!
//! This crate holds everything between an uploaded template and the bytes
//! handed back to a caller:
//! - `model`: flat document tree of paragraphs, tables and style runs
//! - `package`: reading a `.docx` archive into that tree and writing it back
//! - `accessor`: document-order traversal of every paragraph, tables included
//! - `replace`: the run-spanning replacer
//! - `substitute`: applying a placeholder map to a whole document
//! - `convert`: best-effort PDF rendering through external converters
//! - `pipeline`: the end-to-end build operations used by the CLI and server

pub mod accessor;
pub mod convert;
mod error;
pub mod model;
pub mod package;
pub mod pipeline;
pub mod replace;
pub mod substitute;

pub use accessor::{collect_containers, containers};
pub use convert::{Backend, BackendKind, ChainConfig, ConversionChain, ConversionOutcome, Locator};
pub use error::{Result, TemplateError};
pub use model::{Block, Cell, Document, Paragraph, Row, Run, RunFormat, Table};
pub use package::{PackageOptions, TemplatePackage};
pub use pipeline::{
    build, build_files, build_with_options, fill, BuildArtifacts, BuildOutput, FilledDocument,
};
pub use replace::replace_all;
pub use substitute::{apply_all, parse_placeholder_map, PlaceholderMap, SubstitutionReport};
