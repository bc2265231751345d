//! Shared types for the WAEL geometry language.
//!
//! This crate defines the AST node types, source spans, diagnostics,
//! and the geometry kind tags shared by the lexer, parser and evaluator.

mod error;
mod span;
pub mod ast;

pub use error::{ErrorCategory, ErrorCode, ErrorList, Severity, WaelError, MAX_ERRORS};
pub use span::{SourceFile, Span};

/// Result type used by the front end.
pub type Result<T> = std::result::Result<T, WaelError>;
