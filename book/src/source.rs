//! Discovery of chapters and sections under the content directory.
//!
//! ```text
//! content/
//!   1.Getting started/
//!     0.-intro.txt        prelude, compiled before the sections
//!     1.Installing.txt    section 1.1 "Installing"
//!     2.First steps.txt   section 1.2 "First steps"
//!   2.Reference/
//!     ...
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BookError;

const PRELUDE_PREFIX: &str = "0.-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSource {
    pub index: u32,
    pub title: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSource {
    pub index: u32,
    pub title: String,
    pub path: PathBuf,
    /// Prelude files, sorted by name.
    pub preludes: Vec<PathBuf>,
    /// Sections, sorted by index.
    pub sections: Vec<SectionSource>,
}

/// Split `<index>.<title>` into its parts. The title may be empty.
pub fn parse_name(name: &str) -> Option<(u32, &str)> {
    let (index, title) = name.split_once('.')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((index.parse().ok()?, title))
}

fn entries(dir: &Path) -> Result<Vec<(String, PathBuf)>, BookError> {
    let read_error = |source| BookError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        out.push((name, entry.path()));
    }
    out.sort();
    Ok(out)
}

/// Find every chapter under `content_dir`, sorted by index.
pub fn discover(content_dir: &Path) -> Result<Vec<ChapterSource>, BookError> {
    let mut chapters = BTreeMap::new();
    for (name, path) in entries(content_dir)? {
        if !path.is_dir() {
            log::warn!("skipping {}: not a chapter directory", path.display());
            continue;
        }
        let Some((index, title)) = parse_name(&name) else {
            log::warn!("skipping {}: expected <index>.<title>", path.display());
            continue;
        };
        let chapter = chapter(index, title, path)?;
        if chapters.contains_key(&index) {
            return Err(BookError::DuplicateIndex {
                kind: "chapter",
                index,
                path: chapter.path,
            });
        }
        chapters.insert(index, chapter);
    }
    log::debug!("found {} chapters in {}", chapters.len(), content_dir.display());
    Ok(chapters.into_values().collect())
}

fn chapter(index: u32, title: &str, path: PathBuf) -> Result<ChapterSource, BookError> {
    let mut preludes = Vec::new();
    let mut sections: BTreeMap<u32, SectionSource> = BTreeMap::new();
    for (name, file) in entries(&path)? {
        if !file.is_file() {
            log::warn!("skipping {}: not a file", file.display());
            continue;
        }
        if name.starts_with(PRELUDE_PREFIX) {
            preludes.push(file);
            continue;
        }
        let stem = Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some((section, title)) = parse_name(&stem) else {
            log::warn!("skipping {}: expected <index>.<title>.<ext>", file.display());
            continue;
        };
        if sections.contains_key(&section) {
            return Err(BookError::DuplicateIndex {
                kind: "section",
                index: section,
                path: file,
            });
        }
        sections.insert(
            section,
            SectionSource {
                index: section,
                title: title.to_string(),
                path: file,
            },
        );
    }

    Ok(ChapterSource {
        index,
        title: title.to_string(),
        path,
        preludes,
        sections: sections.into_values().collect(),
    })
}
