pub mod code;
pub mod table;

pub use code::CodeBlock;
pub use table::{HtmlTable, Table, TableRenderer};

use crate::error::MarkupError;
use crate::footnote::Footnotes;
use crate::index::Index;
use crate::parser::inline::InlineForge;
use crate::tags;

/// Everything a block needs while rendering: the inline transformer, the
/// table provider, the current section's numbering context (if a section is
/// open) and the document's footnote registry.
pub struct RenderContext<'a> {
    inline: &'a InlineForge,
    tables: &'a dyn TableRenderer,
    index: Option<&'a mut Index>,
    footnotes: &'a mut Footnotes,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        inline: &'a InlineForge,
        tables: &'a dyn TableRenderer,
        index: Option<&'a mut Index>,
        footnotes: &'a mut Footnotes,
    ) -> Self {
        RenderContext {
            inline,
            tables,
            index,
            footnotes,
        }
    }

    /// Run one line of author text through the inline transformer.
    pub fn forge(&mut self, text: &str) -> String {
        self.inline.forge(text, self.footnotes)
    }

    pub fn tables(&self) -> &'a dyn TableRenderer {
        self.tables
    }

    /// The open section's numbering context. `what` names the construct
    /// asking for a number, for the error message.
    pub fn index(&mut self, what: &'static str) -> Result<&mut Index, MarkupError> {
        self.index
            .as_deref_mut()
            .ok_or(MarkupError::NoSection { what })
    }
}

/// A heading line: `== text` renders at level 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub text: String,
    /// Always at least 2; level 1 belongs to chapter and section titles.
    pub level: usize,
}

/// One structural unit of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Consecutive non-blank lines of free text.
    Paragraph(Vec<String>),
    /// `* item` lines, markers stripped.
    Bullets(Vec<String>),
    /// `# item` lines, markers stripped.
    SortedList(Vec<String>),
    Heading(Heading),
    /// `|` rows, optionally preceded by a `||caption` line.
    Table(Table),
    /// Whitespace-significant diagram lines, from either `: ` markers or a
    /// `:::` fence.
    AsciiArt(Vec<String>),
    /// Fenced code; never produced by the line partitioner.
    Code(CodeBlock),
}

/// Result of [`Block::truncate_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub block: Block,
    /// Budget left after this block. Zero or negative means the budget is
    /// spent and no further block should be appended.
    pub remaining: isize,
    /// Whether lines or rows were dropped from the block.
    pub shortened: bool,
}

pub(crate) fn char_len(text: &str) -> isize {
    text.chars().count() as isize
}

fn strip_marker(line: &str) -> &str {
    line.get(2..).unwrap_or("")
}

/// Keep lines until the budget is spent. The line that spends it is kept,
/// so a truncated block never ends up empty.
pub(crate) fn truncate_lines(mut lines: Vec<String>, limit: isize) -> (Vec<String>, isize, bool) {
    let mut limit = limit;
    let total = lines.len();
    for (i, line) in lines.iter().enumerate() {
        limit -= char_len(line);
        if limit <= 0 {
            lines.truncate(i + 1);
            return (lines, limit, i + 1 < total);
        }
    }
    (lines, limit, false)
}

impl Block {
    /// Blank lines are dropped; nothing left means no paragraph.
    pub fn paragraph(lines: &[&str]) -> Option<Block> {
        let lines: Vec<String> = lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.to_string())
            .collect();
        (!lines.is_empty()).then_some(Block::Paragraph(lines))
    }

    pub fn bullets(lines: &[&str]) -> Option<Block> {
        list_items(lines).map(Block::Bullets)
    }

    pub fn sorted_list(lines: &[&str]) -> Option<Block> {
        list_items(lines).map(Block::SortedList)
    }

    /// Only the first line is used: `=` run, a space, the text.
    pub fn heading(lines: &[&str]) -> Option<Block> {
        let line = lines.first()?;
        let marks = line.bytes().take_while(|&b| b == b'=').count();
        if marks == 0 {
            return None;
        }
        Some(Block::Heading(Heading {
            text: line[marks..].trim().to_string(),
            level: marks + 1,
        }))
    }

    pub fn table(lines: &[&str]) -> Option<Block> {
        Some(Block::Table(Table::new(None, lines)))
    }

    /// The first line is the caption, `||` marker stripped.
    pub fn table_with_caption(lines: &[&str]) -> Option<Block> {
        let (caption, rows) = lines.split_first()?;
        Some(Block::Table(Table::new(
            Some(strip_marker(caption).trim().to_string()),
            rows,
        )))
    }

    /// Lines between `:::` fences, kept verbatim. An empty fence yields
    /// nothing.
    pub fn ascii_art(lines: &[&str]) -> Option<Block> {
        (!lines.is_empty()).then(|| Block::AsciiArt(lines.iter().map(|l| l.to_string()).collect()))
    }

    /// `: ` marked lines; the marker is stripped, a bare `:` is an empty line.
    pub fn ascii_art_marked(lines: &[&str]) -> Option<Block> {
        Some(Block::AsciiArt(
            lines.iter().map(|l| strip_marker(l).to_string()).collect(),
        ))
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Bullets(_) => "bullets",
            Block::SortedList(_) => "sorted list",
            Block::Heading(_) => "heading",
            Block::Table(_) => "table",
            Block::AsciiArt(_) => "ascii art",
            Block::Code(_) => "code block",
        }
    }

    /// Render to markup. Fails only when a heading or numbered listing is
    /// rendered without an open section.
    pub fn render(&self, ctx: &mut RenderContext<'_>) -> Result<String, MarkupError> {
        match self {
            Block::Heading(heading) => {
                let label = ctx.index("heading")?.next_heading();
                let anchor = format!("h-{}", label.trim().replace('.', "-"));
                let text = format!("{}{}", label, ctx.forge(&heading.text));
                Ok(tags::heading(heading.level, &anchor, &text))
            }
            Block::Table(table) => Ok(table.render(ctx)),
            Block::Code(code) => code.render(ctx),
            _ => {
                let head = self.head();
                let body = self.body(ctx);
                Ok(format!("{}{}{}", head, body, self.tail()))
            }
        }
    }

    fn head(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => tags::PARA_BEGIN,
            Block::Bullets(_) => tags::UL_BEGIN,
            Block::SortedList(_) => tags::OL_BEGIN,
            Block::AsciiArt(_) => tags::AA_BEGIN,
            _ => "",
        }
    }

    fn body(&self, ctx: &mut RenderContext<'_>) -> String {
        match self {
            Block::Paragraph(lines) => wrap_lines(lines, ctx, tags::PLINE_BEGIN, tags::PLINE_END),
            Block::Bullets(items) | Block::SortedList(items) => {
                wrap_lines(items, ctx, tags::LI_BEGIN, tags::LI_END)
            }
            Block::AsciiArt(lines) => lines
                .iter()
                .map(|line| html_escape::encode_quoted_attribute(line).replace(' ', tags::SPACE))
                .collect::<Vec<_>>()
                .join(tags::BR),
            _ => String::new(),
        }
    }

    fn tail(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => tags::PARA_END,
            Block::Bullets(_) => tags::UL_END,
            Block::SortedList(_) => tags::OL_END,
            Block::AsciiArt(_) => tags::AA_END,
            _ => "",
        }
    }

    /// Spend up to `limit` characters of this block's text.
    ///
    /// Works at line (or table row) granularity: the block is cut after the
    /// line that exhausts the budget, never inside a line.
    pub fn truncate_to(self, limit: isize) -> Truncated {
        let cut = |lines, wrap: fn(Vec<String>) -> Block| {
            let (lines, remaining, shortened) = truncate_lines(lines, limit);
            Truncated {
                block: wrap(lines),
                remaining,
                shortened,
            }
        };
        match self {
            Block::Paragraph(l) => cut(l, Block::Paragraph),
            Block::Bullets(l) => cut(l, Block::Bullets),
            Block::SortedList(l) => cut(l, Block::SortedList),
            Block::AsciiArt(l) => cut(l, Block::AsciiArt),
            Block::Heading(heading) => Truncated {
                remaining: limit - char_len(&heading.text),
                block: Block::Heading(heading),
                shortened: false,
            },
            Block::Table(table) => {
                let (table, remaining, shortened) = table.truncate_to(limit);
                Truncated {
                    block: Block::Table(table),
                    remaining,
                    shortened,
                }
            }
            Block::Code(code) => {
                let (code, remaining, shortened) = code.truncate_to(limit);
                Truncated {
                    block: Block::Code(code),
                    remaining,
                    shortened,
                }
            }
        }
    }
}

fn list_items(lines: &[&str]) -> Option<Vec<String>> {
    let items: Vec<String> = lines
        .iter()
        .map(|line| strip_marker(line))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

fn wrap_lines(lines: &[String], ctx: &mut RenderContext<'_>, begin: &str, end: &str) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(begin);
        out.push_str(&ctx.forge(line));
        out.push_str(end);
    }
    out
}
