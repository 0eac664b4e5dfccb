use std::fs;
use std::path::{Path, PathBuf};

use html_escape::encode_text;
use markup::{DocumentCompiler, InlineForge, ParseWarning};

use crate::config::BookConfig;
use crate::error::BookError;
use crate::source::{self, ChapterSource};
use crate::toc::{Toc, TocEntry};

/// Warnings raised while compiling one content file. The source text is
/// kept so the caller can render diagnostics against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWarnings {
    pub path: PathBuf,
    pub source: String,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub page: String,
    pub toc: Toc,
    pub warnings: Vec<FileWarnings>,
}

/// A book on disk: a configuration plus the directory its relative paths
/// resolve against.
#[derive(Debug, Clone)]
pub struct Book {
    config: BookConfig,
    root: PathBuf,
}

impl Book {
    pub fn new(config: BookConfig, root: impl Into<PathBuf>) -> Self {
        Book {
            config,
            root: root.into(),
        }
    }

    /// Open the book described by an existing config file.
    pub fn load(config_path: &Path) -> Result<Self, BookError> {
        Ok(Book::new(BookConfig::load(config_path)?, parent(config_path)))
    }

    /// Like [`Book::load`], but a missing config file means the defaults.
    pub fn load_or_default(config_path: &Path) -> Result<Self, BookError> {
        Ok(Book::new(
            BookConfig::load_or_default(config_path)?,
            parent(config_path),
        ))
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join(&self.config.content_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.config.output)
    }

    fn compiler(&self) -> DocumentCompiler {
        let inline = if self.config.extended_inline {
            InlineForge::extended()
        } else {
            InlineForge::default()
        };
        DocumentCompiler::new(inline).with_language(&self.config.language)
    }

    /// Compile every chapter and assemble the page.
    pub fn render(&self) -> Result<Rendered, BookError> {
        let chapters = source::discover(&self.content_dir())?;
        let mut compiler = self.compiler();
        let mut toc = Toc::new();
        let mut body = Vec::new();
        let mut warnings = Vec::new();

        for chapter in &chapters {
            let entry = TocEntry::chapter(chapter.index, &chapter.title);
            body.push(entry.heading_html());
            toc.push(entry);
            self.render_chapter(chapter, &mut compiler, &mut toc, &mut body, &mut warnings)?;
        }

        let page = page(
            &self.config.title,
            &toc.render(),
            &body.concat(),
            &compiler.render_footnotes().concat(),
        );
        log::info!(
            "rendered {} chapters, {} footnotes",
            chapters.len(),
            compiler.footnotes().len()
        );
        Ok(Rendered {
            page,
            toc,
            warnings,
        })
    }

    fn render_chapter(
        &self,
        chapter: &ChapterSource,
        compiler: &mut DocumentCompiler,
        toc: &mut Toc,
        body: &mut Vec<String>,
        warnings: &mut Vec<FileWarnings>,
    ) -> Result<(), BookError> {
        if !chapter.preludes.is_empty() {
            compiler.set_section(chapter.index, 0, &chapter.title);
            for prelude in &chapter.preludes {
                compile_file(compiler, prelude, body, warnings)?;
            }
        }
        for section in &chapter.sections {
            compiler.set_section(chapter.index, section.index, &section.title);
            let entry = TocEntry::section(chapter.index, section.index, &section.title);
            body.push(entry.heading_html());
            toc.push(entry);
            compile_file(compiler, &section.path, body, warnings)?;
        }
        Ok(())
    }

    /// Render and write the page to the configured output path.
    pub fn write(&self) -> Result<Rendered, BookError> {
        let rendered = self.render()?;
        let output = self.output_path();
        fs::write(&output, &rendered.page).map_err(|source| BookError::Write {
            path: output.clone(),
            source,
        })?;
        log::info!("wrote {}", output.display());
        Ok(rendered)
    }
}

fn parent(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn compile_file(
    compiler: &mut DocumentCompiler,
    path: &Path,
    body: &mut Vec<String>,
    warnings: &mut Vec<FileWarnings>,
) -> Result<(), BookError> {
    let source = fs::read_to_string(path).map_err(|source| BookError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let compiled = compiler
        .compile_entire(&source)
        .map_err(|source| BookError::Markup {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("compiled {} ({} blocks)", path.display(), compiled.html.len());
    body.extend(compiled.html);
    if !compiled.warnings.is_empty() {
        warnings.push(FileWarnings {
            path: path.to_path_buf(),
            source,
            warnings: compiled.warnings,
        });
    }
    Ok(())
}

fn page(title: &str, toc: &str, body: &str, footnotes: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset='utf-8'>\n<title>{title}</title>\n</head>\n<body>\n\
         {toc}\n<article>{body}</article>\n<div class='footnotes'>{footnotes}</div>\n</body>\n</html>\n",
        title = encode_text(title),
    )
}
