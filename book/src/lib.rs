//! Assembles a book from a directory of markup files: chapters and sections
//! are discovered on disk, compiled in order with one shared footnote
//! registry, and written out as a single HTML page with a table of contents.

pub mod config;
pub mod error;
pub mod render;
pub mod source;
pub mod toc;

pub use config::BookConfig;
pub use error::BookError;
pub use render::{Book, FileWarnings, Rendered};
pub use source::{ChapterSource, SectionSource, discover};
pub use toc::{Toc, TocEntry};
