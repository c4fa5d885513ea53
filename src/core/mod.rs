// Public modules
pub mod bundle;
pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod rename;
pub mod rewrite;
pub mod syntax;

// Re-export common types for convenience
pub use bundle::{Bundle, EmittedFile};
pub use config::{ParserOptions, ParserOverrides, RenameConfig};
pub use error::{Error, ErrorCode, Result};
pub use filter::{Filter, Pattern};
pub use mapper::{MapRule, PathMapper};
pub use rename::{RenameReport, RenamedFile, Renamer, RenamerBuilder};
pub use rewrite::{Rewritten, SourceMapOptions, TextRewriter};
pub use syntax::{OxcFrontend, SyntaxFrontend, SyntaxTree};
