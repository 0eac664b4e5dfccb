use std::path::PathBuf;

use markup::MarkupError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{kind} index {index} is used twice (second use: {})", .path.display())]
    DuplicateIndex {
        kind: &'static str,
        index: u32,
        path: PathBuf,
    },

    #[error("in {}: {source}", .path.display())]
    Markup {
        path: PathBuf,
        source: MarkupError,
    },
}
