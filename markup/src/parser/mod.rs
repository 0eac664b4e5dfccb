pub mod error;
pub mod inline;
mod structural;

pub use error::ParseWarning;
pub use inline::{InlineForge, Stage};
pub use structural::{LINE_RULES, LineRule, Partitioner};

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::block::{Block, CodeBlock, code::DEFAULT_LANGUAGE};

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```[-!+ ]*\w*[-!+ ]*\r?\n").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n(?:[ \t\r]*\n)+").unwrap());

const FENCE: &str = "```";

/// A block together with the byte range of source it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub block: Block,
    pub span: Range<usize>,
}

/// The blocks of a document in source order, plus anything the parser had
/// to recover from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub blocks: Vec<Located>,
    pub warnings: Vec<ParseWarning>,
}

/// Parser entry point.
///
/// Fenced code is located first, directly in the whole text, because code
/// bodies may hold blank lines and any other block's syntax. The text
/// between fences is split on blank-line runs and each run goes through the
/// line [`Partitioner`].
pub struct Parser<'a> {
    source: &'a str,
    language: &'a str,
    partitioner: Partitioner<'static>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            source,
            language: DEFAULT_LANGUAGE,
            partitioner: Partitioner::default(),
        }
    }

    /// Language tag for fences that do not name one.
    pub fn with_language(mut self, language: &'a str) -> Self {
        self.language = language;
        self
    }

    pub fn parse(&self) -> Partition {
        let doc = self.source;
        let mut partition = Partition::default();
        let mut cursor = 0;

        while let Some(head) = CODE_FENCE_RE.find_at(doc, cursor) {
            self.paragraphs(cursor..head.start(), &mut partition);

            let body_start = head.end();
            let (body_end, next) = match closing_fence(doc, body_start) {
                Some(close) => (close.saturating_sub(1).max(body_start), end_of_line(doc, close)),
                None => {
                    let header = head.start()..head.end() - 1;
                    log::warn!("unterminated code block at byte {}", head.start());
                    partition.warnings.push(
                        ParseWarning::new("unterminated code block", header)
                            .with_note("the rest of the document is treated as code"),
                    );
                    (doc.len(), doc.len())
                }
            };

            let code = CodeBlock::parse(head.as_str(), &doc[body_start..body_end], self.language);
            partition.blocks.push(Located {
                block: Block::Code(code),
                span: head.start()..next,
            });
            cursor = next;
        }
        self.paragraphs(cursor..doc.len(), &mut partition);

        log::debug!(
            "partitioned {} bytes into {} blocks",
            doc.len(),
            partition.blocks.len()
        );
        partition
    }

    /// Partition fence-free text, one blank-line-separated run at a time.
    fn paragraphs(&self, range: Range<usize>, partition: &mut Partition) {
        let text = &self.source[range.clone()];
        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            return;
        }
        let base = range.start + (text.len() - trimmed.len());

        let mut start = 0;
        for blank in BLANK_RUN_RE.find_iter(trimmed) {
            self.partitioner.partition(
                &trimmed[start..blank.start()],
                base + start,
                &mut partition.blocks,
                &mut partition.warnings,
            );
            start = blank.end();
        }
        if start < trimmed.len() {
            self.partitioner.partition(
                &trimmed[start..],
                base + start,
                &mut partition.blocks,
                &mut partition.warnings,
            );
        }
    }
}

/// Start of the line closing a fence whose body begins at `body_start`.
fn closing_fence(doc: &str, body_start: usize) -> Option<usize> {
    let rest = &doc[body_start..];
    if rest.starts_with(FENCE) {
        return Some(body_start);
    }
    rest.find(&format!("\n{FENCE}")).map(|pos| body_start + pos + 1)
}

fn end_of_line(doc: &str, from: usize) -> usize {
    doc[from..].find('\n').map_or(doc.len(), |pos| from + pos + 1)
}
