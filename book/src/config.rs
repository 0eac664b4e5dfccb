use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BookError;

/// Contents of `book.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    /// Title of the assembled page.
    pub title: String,
    /// Chapter directories live here. Relative to the config file.
    pub content_dir: PathBuf,
    /// Assembled page. Relative to the config file.
    pub output: PathBuf,
    /// Run the extended inline stages (italics, links, mentions, ...).
    pub extended_inline: bool,
    /// Language tag for code fences that do not name one.
    pub language: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        BookConfig {
            title: "Book".to_string(),
            content_dir: PathBuf::from("content"),
            output: PathBuf::from("output.html"),
            extended_inline: false,
            language: markup::block::code::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl BookConfig {
    /// Parse config text; `path` is only used for error reporting.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, BookError> {
        toml::from_str(text).map_err(|source| BookError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a config file that must exist.
    pub fn load(path: &Path) -> Result<Self, BookError> {
        let text = std::fs::read_to_string(path).map_err(|source| BookError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Load a config file, falling back to the defaults when there is none.
    pub fn load_or_default(path: &Path) -> Result<Self, BookError> {
        if !path.exists() {
            log::info!("{} not found, using default configuration", path.display());
            return Ok(BookConfig::default());
        }
        Self::load(path)
    }
}
