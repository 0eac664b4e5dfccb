use std::sync::LazyLock;

use regex::Regex;

use crate::block::{RenderContext, truncate_lines};
use crate::error::MarkupError;
use crate::tags;

/// Fallback language tag for fences that name none.
pub const DEFAULT_LANGUAGE: &str = "cpp";

/// Listings longer than this are numbered unless a flag says otherwise.
const AUTO_NUMBER_LINES: usize = 8;

static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(" {2,}").unwrap());
/// Flags before the language word, the word with any marks glued to its
/// end (`c++`), then flags separated from it.
static FENCE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<before>[-!+ ]*)(?P<lang>\w+[-!+]*)?(?P<after>[-!+ ]*)$").unwrap()
});

/// A fenced code listing.
///
/// The fence header is `` ``` `` followed by any of the flags `-` (never
/// number), `!` (always number) and `+` (run body lines through the inline
/// transformer) around an optional language word. Marks glued to the end of
/// the word belong to it, so `` ```c++ `` names C++ and sets no flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub lines: Vec<String>,
    pub lang: String,
    pub no_number: bool,
    pub require_number: bool,
    pub inline: bool,
}

impl CodeBlock {
    /// Build from a fence header line (`` ```+python ``) and the raw body
    /// between the fences.
    pub fn parse(head: &str, body: &str, default_lang: &str) -> Self {
        let header = head.trim().trim_start_matches('`');
        let (flags, lang) = match FENCE_HEADER_RE.captures(header) {
            Some(caps) => {
                let lang = caps.name("lang").map_or("", |m| m.as_str());
                let flags = format!(
                    "{}{}",
                    caps.name("before").map_or("", |m| m.as_str()),
                    caps.name("after").map_or("", |m| m.as_str())
                );
                (flags, lang)
            }
            None => (String::new(), ""),
        };
        CodeBlock {
            lines: body.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect(),
            lang: if lang.is_empty() {
                default_lang.to_string()
            } else {
                lang.to_string()
            },
            no_number: flags.contains('-'),
            require_number: flags.contains('!'),
            inline: flags.contains('+'),
        }
    }

    /// `!` wins over `-`; unflagged listings are numbered when long.
    pub fn numbered(&self) -> bool {
        if self.require_number {
            return true;
        }
        if self.no_number {
            return false;
        }
        self.lines.len() > AUTO_NUMBER_LINES
    }

    pub fn render(&self, ctx: &mut RenderContext<'_>) -> Result<String, MarkupError> {
        let numbered = self.numbered();
        let mut out = String::new();
        if numbered {
            let index = ctx.index("code listing")?;
            let caption =
                tags::code_block_caption(index.chapter(), index.section(), index.next_code_index());
            out.push_str(&caption);
        }
        out.push_str(&tags::code_block_begin(&html_escape::encode_quoted_attribute(
            &self.lang,
        )));

        let body: Vec<String> = self
            .lines
            .iter()
            .map(|line| {
                let line = if self.inline {
                    ctx.forge(line)
                } else {
                    html_escape::encode_quoted_attribute(line).into_owned()
                };
                preserve_indent(&line)
            })
            .collect();
        out.push_str(&body.join(tags::BR));

        out.push_str(tags::CODE_BLOCK_END);
        if numbered {
            out.push_str(tags::CODE_BLOCK_RULE);
        }
        Ok(out)
    }

    pub fn truncate_to(self, limit: isize) -> (Self, isize, bool) {
        let (lines, remaining, shortened) = truncate_lines(self.lines, limit);
        (CodeBlock { lines, ..self }, remaining, shortened)
    }
}

/// Runs of two or more spaces become the same number of `&nbsp;` so
/// indentation survives; single spaces stay breakable.
fn preserve_indent(line: &str) -> String {
    SPACE_RUN_RE
        .replace_all(line, |caps: &regex::Captures<'_>| tags::SPACE.repeat(caps[0].len()))
        .into_owned()
}
