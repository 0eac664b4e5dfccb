//! Compiler for a line-oriented book markup language.
//!
//! Documents are split into blocks (paragraphs, lists, tables, headings,
//! diagrams, fenced code), and each block renders to an HTML fragment.
//! Inline spans inside a line carry formatting, images and footnotes.
//!
//! ```
//! use markup::DocumentCompiler;
//!
//! let mut compiler = DocumentCompiler::default();
//! compiler.set_section(1, 1, "Intro");
//! let compiled = compiler.compile_entire("= Hello\n\nSome **bold** text.").unwrap();
//! assert_eq!(compiled.html.len(), 2);
//! ```

pub mod block;
pub mod compiler;
pub mod error;
pub mod footnote;
pub mod index;
pub mod parser;
pub mod tags;

pub use block::{Block, HtmlTable, RenderContext, TableRenderer};
pub use compiler::{Compiled, DocumentCompiler, Preview, Section};
pub use error::MarkupError;
pub use footnote::Footnotes;
pub use index::Index;
pub use parser::{InlineForge, Located, ParseWarning, Parser, Partition};
