use crate::block::{HtmlTable, RenderContext, TableRenderer, Truncated};
use crate::block::code::DEFAULT_LANGUAGE;
use crate::error::MarkupError;
use crate::footnote::Footnotes;
use crate::index::Index;
use crate::parser::{InlineForge, ParseWarning, Parser, Partition};

/// A section opened with [`DocumentCompiler::set_section`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub index: Index,
    pub title: String,
}

/// Output of a whole-document compile: one markup fragment per block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compiled {
    pub html: Vec<String>,
    pub warnings: Vec<ParseWarning>,
}

impl Compiled {
    pub fn to_html(&self) -> String {
        self.html.concat()
    }
}

/// Output of a budget-limited compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub html: String,
    /// False when any block was shortened or left out.
    pub complete: bool,
    pub warnings: Vec<ParseWarning>,
}

/// Top-level compiler for one document (a whole book).
///
/// Owns the footnote registry for the document and the numbering context
/// of the section currently being compiled. Not meant to be shared between
/// threads; separate compilers share nothing and can run side by side.
pub struct DocumentCompiler {
    inline: InlineForge,
    tables: Box<dyn TableRenderer>,
    language: String,
    sections: Vec<Section>,
    footnotes: Footnotes,
}

impl Default for DocumentCompiler {
    fn default() -> Self {
        DocumentCompiler::new(InlineForge::default())
    }
}

impl DocumentCompiler {
    pub fn new(inline: InlineForge) -> Self {
        DocumentCompiler {
            inline,
            tables: Box::new(HtmlTable),
            language: DEFAULT_LANGUAGE.to_string(),
            sections: Vec::new(),
            footnotes: Footnotes::new(),
        }
    }

    pub fn with_table_renderer(mut self, tables: impl TableRenderer + 'static) -> Self {
        self.tables = Box::new(tables);
        self
    }

    /// Language tag for code fences that do not name one.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Open a new section. Headings and numbered listings compiled from
    /// here on are numbered `chapter.section.n`, counting from zero.
    pub fn set_section(&mut self, chapter: u32, section: u32, title: impl Into<String>) {
        log::debug!("section {}.{} opened", chapter, section);
        self.sections.push(Section {
            index: Index::new(chapter, section),
            title: title.into(),
        });
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn current_index(&self) -> Option<&Index> {
        self.sections.last().map(|s| &s.index)
    }

    pub fn footnotes(&self) -> &Footnotes {
        &self.footnotes
    }

    pub fn partition(&self, doc: &str) -> Partition {
        Parser::new(doc).with_language(&self.language).parse()
    }

    /// Render every block of `doc` in source order.
    pub fn compile_entire(&mut self, doc: &str) -> Result<Compiled, MarkupError> {
        let Partition { blocks, warnings } = self.partition(doc);
        let mut ctx = RenderContext::new(
            &self.inline,
            self.tables.as_ref(),
            self.sections.last_mut().map(|s| &mut s.index),
            &mut self.footnotes,
        );
        let html = blocks
            .iter()
            .map(|located| located.block.render(&mut ctx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Compiled { html, warnings })
    }

    /// Render a preview of `doc` holding about `limit` characters of text.
    ///
    /// Blocks are spent in source order; the block that exhausts the budget
    /// is cut at line granularity and nothing after it is kept. The preview
    /// renders against copies of the numbering context and an empty
    /// footnote registry, so the document's own counters do not move.
    pub fn compile_partial(&self, doc: &str, limit: usize) -> Result<Preview, MarkupError> {
        let Partition { blocks, warnings } = self.partition(doc);
        let mut index = self.current_index().cloned();
        let mut scratch = Footnotes::new();
        let mut ctx = RenderContext::new(
            &self.inline,
            self.tables.as_ref(),
            index.as_mut(),
            &mut scratch,
        );

        let total = blocks.len();
        let mut remaining = isize::try_from(limit).unwrap_or(isize::MAX);
        let mut html = String::new();
        let mut complete = true;
        for (i, located) in blocks.into_iter().enumerate() {
            let Truncated {
                block,
                remaining: left,
                shortened,
            } = located.block.truncate_to(remaining);
            html.push_str(&block.render(&mut ctx)?);
            complete &= !shortened;
            if left <= 0 {
                if i + 1 < total {
                    complete = false;
                }
                log::debug!(
                    "preview budget of {} spent after {} of {} blocks",
                    limit,
                    i + 1,
                    total
                );
                break;
            }
            remaining = left;
        }

        Ok(Preview {
            html,
            complete,
            warnings,
        })
    }

    pub fn render_footnotes(&self) -> Vec<String> {
        self.footnotes.render()
    }
}
