//! Inline span transformer.
//!
//! A line of author text is carried through the pipeline as a list of
//! pieces. Each stage only scans the pieces that are still open author
//! text, so markup emitted by one stage is never re-interpreted by a later
//! one. Literal text is escaped exactly once, when the pieces are joined.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::footnote::Footnotes;
use crate::tags;

static FOOTNOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\^\[\[(?P<body>.*?)\]\]").unwrap());
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[img (?P<uri>[^ |\]]+)\]").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[link (?P<uri>[^ |\]]+)(?:\|(?P<text>[^\]]*))?\]").unwrap()
});
static PAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[p (?P<uri>[^ |\]]+)(?:\|(?P<text>[^\]]*))?\]").unwrap()
});

// ---------------------------------------------------------------------------
// Pieces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    /// Author text, still open to later stages.
    Text(String),
    /// Author text closed to formatting (monospace, expressions, bare URIs).
    Literal(String),
    /// Emitted markup.
    Markup(String),
}

fn push_text(out: &mut Vec<Piece>, text: &str) {
    if !text.is_empty() {
        out.push(Piece::Text(text.to_string()));
    }
}

/// Resolve `\X` to `X`. A trailing lone backslash stays.
fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Escaped form of an author string used inside an attribute value.
fn attribute(text: &str) -> String {
    html_escape::encode_quoted_attribute(&unescape(text)).into_owned()
}

fn escaped(bytes: &[u8], at: usize) -> bool {
    at > 0 && bytes[at - 1] == b'\\'
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

// ---------------------------------------------------------------------------
// Delimited spans
// ---------------------------------------------------------------------------

/// A span delimited by the same mark on both sides, e.g. `**bold**`.
struct Delimiter {
    mark: u8,
    width: usize,
    /// Content is closed to later stages.
    literal: bool,
    /// Check on the byte after the closing delimiter.
    follow: fn(Option<u8>) -> bool,
    open: fn(&str) -> String,
    close: &'static str,
}

/// Location of one delimited span: `start..end` covers the delimiters,
/// `content` what lies between them.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    start: usize,
    content: Range<usize>,
    end: usize,
}

fn any_follow(_: Option<u8>) -> bool {
    true
}

/// Italics must not run into a word, a path or a ratio (`1/2`, `a/b:c`).
fn italic_follow(next: Option<u8>) -> bool {
    !matches!(next, Some(b) if b == b'\\' || b == b':' || b == b'/' || b.is_ascii_alphanumeric())
}

fn bold_open(_: &str) -> String {
    tags::BOLD_BEGIN.to_string()
}

fn monospace_open(_: &str) -> String {
    tags::MONOSPACE_BEGIN.to_string()
}

fn italic_open(_: &str) -> String {
    tags::ITALIC_BEGIN.to_string()
}

fn strike_open(_: &str) -> String {
    tags::STRIKE_BEGIN.to_string()
}

fn expression_open(_: &str) -> String {
    tags::EXPR_BEGIN.to_string()
}

fn anchor_open(name: &str) -> String {
    tags::anchor_begin(&attribute(name))
}

const BOLD: Delimiter = Delimiter {
    mark: b'*',
    width: 2,
    literal: false,
    follow: any_follow,
    open: bold_open,
    close: tags::BOLD_END,
};

const MONOSPACE: Delimiter = Delimiter {
    mark: b'`',
    width: 1,
    literal: true,
    follow: any_follow,
    open: monospace_open,
    close: tags::MONOSPACE_END,
};

const ITALIC: Delimiter = Delimiter {
    mark: b'/',
    width: 1,
    literal: false,
    follow: italic_follow,
    open: italic_open,
    close: tags::ITALIC_END,
};

const STRIKE: Delimiter = Delimiter {
    mark: b'~',
    width: 1,
    literal: false,
    follow: any_follow,
    open: strike_open,
    close: tags::STRIKE_END,
};

const EXPRESSION: Delimiter = Delimiter {
    mark: b'$',
    width: 1,
    literal: true,
    follow: any_follow,
    open: expression_open,
    close: tags::EXPR_END,
};

const ANCHOR: Delimiter = Delimiter {
    mark: b'#',
    width: 1,
    literal: false,
    follow: any_follow,
    open: anchor_open,
    close: tags::LINK_END,
};

impl Delimiter {
    fn opens_at(&self, bytes: &[u8], at: usize) -> bool {
        at + self.width <= bytes.len() && bytes[at..at + self.width].iter().all(|&b| b == self.mark)
    }

    /// Find the first span at or after `from`.
    ///
    /// The opening delimiter must not be preceded by a backslash or followed
    /// by a space. The content may not contain the mark except escaped as
    /// `\X`, may not be empty, and may not end with a backslash or a space.
    fn find(&self, text: &str, from: usize) -> Option<Span> {
        let bytes = text.as_bytes();
        let mut at = from;
        while at < bytes.len() {
            if self.opens_at(bytes, at) && !escaped(bytes, at) {
                if let Some(span) = self.close_from(bytes, at) {
                    return Some(span);
                }
            }
            at += 1;
        }
        None
    }

    fn close_from(&self, bytes: &[u8], start: usize) -> Option<Span> {
        let content_start = start + self.width;
        if bytes.get(content_start).is_none_or(|&b| b == b' ') {
            return None;
        }
        let mut at = content_start;
        while at < bytes.len() {
            if bytes[at] == b'\\' && bytes.get(at + 1) == Some(&self.mark) {
                at += 2;
                continue;
            }
            if bytes[at] == self.mark {
                break;
            }
            at += 1;
        }
        let last = bytes[at - 1];
        if at == content_start
            || !self.opens_at(bytes, at)
            || last == b'\\'
            || last == b' '
            || !(self.follow)(bytes.get(at + self.width).copied())
        {
            return None;
        }
        Some(Span {
            start,
            content: content_start..at,
            end: at + self.width,
        })
    }

    fn apply(&self, text: &str, out: &mut Vec<Piece>) {
        let mut cursor = 0;
        while let Some(span) = self.find(text, cursor) {
            push_text(out, &text[cursor..span.start]);
            let content = &text[span.content];
            out.push(Piece::Markup((self.open)(content)));
            out.push(if self.literal {
                Piece::Literal(content.to_string())
            } else {
                Piece::Text(content.to_string())
            });
            out.push(Piece::Markup(self.close.to_string()));
            cursor = span.end;
        }
        push_text(out, &text[cursor..]);
    }
}

// ---------------------------------------------------------------------------
// Pattern stages
// ---------------------------------------------------------------------------

/// Replace every match of `re` that is not preceded by a backslash.
fn replace_matches(
    text: &str,
    out: &mut Vec<Piece>,
    re: &Regex,
    mut emit: impl FnMut(&Captures<'_>, &mut Vec<Piece>),
) {
    let bytes = text.as_bytes();
    let mut cursor = 0;
    let mut from = 0;
    while let Some(caps) = re.captures_at(text, from) {
        let Some(whole) = caps.get(0) else { break };
        if escaped(bytes, whole.start()) {
            from = whole.start() + 1;
            continue;
        }
        push_text(out, &text[cursor..whole.start()]);
        emit(&caps, out);
        cursor = whole.end();
        from = whole.end();
    }
    push_text(out, &text[cursor..]);
}

fn link(caps: &Captures<'_>, out: &mut Vec<Piece>, open: fn(&str) -> String) {
    let uri = &caps["uri"];
    out.push(Piece::Markup(open(&attribute(uri))));
    match caps.name("text").map(|m| m.as_str()).filter(|t| !t.is_empty()) {
        Some(text) => out.push(Piece::Text(text.to_string())),
        None => out.push(Piece::Literal(uri.to_string())),
    }
    out.push(Piece::Markup(tags::LINK_END.to_string()));
}

/// `@name` mentions. Names followed by `.word` are e-mail domains and are
/// left alone.
fn mentions(text: &str, out: &mut Vec<Piece>) {
    let bytes = text.as_bytes();
    let mut cursor = 0;
    let mut at = 0;
    while at < bytes.len() {
        if bytes[at] != b'@'
            || escaped(bytes, at)
            || !bytes.get(at + 1).is_some_and(|b| b.is_ascii_alphabetic())
        {
            at += 1;
            continue;
        }
        let mut end = at + 2;
        while end < bytes.len() && is_word(bytes[end]) {
            end += 1;
        }
        let email = bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(|&b| is_word(b));
        if !email {
            push_text(out, &text[cursor..at]);
            out.push(Piece::Markup(tags::mention(&text[at + 1..end])));
            cursor = end;
        }
        at = end;
    }
    push_text(out, &text[cursor..]);
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// One transformation applied to open author text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `^[[body]]`
    Footnote,
    /// `` `code` ``
    Monospace,
    /// `**bold**`
    Bold,
    /// `[img uri]`
    Image,
    /// `$expr$`
    Expression,
    /// `/italic/`
    Italic,
    /// `~strike~`
    Strike,
    /// `[link uri|text]`
    Link,
    /// `[p uri|text]`
    Page,
    /// `#anchor#`
    Anchor,
    /// `@name`
    Mention,
}

pub const DEFAULT_STAGES: &[Stage] = &[Stage::Footnote, Stage::Monospace, Stage::Bold, Stage::Image];

/// Links and page references run right after images so their URIs become
/// attributes before the italic, strike and anchor delimiters are scanned.
pub const EXTENDED_STAGES: &[Stage] = &[
    Stage::Footnote,
    Stage::Monospace,
    Stage::Bold,
    Stage::Image,
    Stage::Link,
    Stage::Page,
    Stage::Expression,
    Stage::Italic,
    Stage::Strike,
    Stage::Anchor,
    Stage::Mention,
];

impl Stage {
    fn apply(self, text: &str, out: &mut Vec<Piece>, footnotes: &mut Footnotes) {
        match self {
            Stage::Footnote => replace_matches(text, out, &FOOTNOTE_RE, |caps, out| {
                let index = footnotes.next_footnote_index(&caps["body"]);
                out.push(Piece::Markup(tags::footnote_anchor(index)));
            }),
            Stage::Monospace => MONOSPACE.apply(text, out),
            Stage::Bold => BOLD.apply(text, out),
            Stage::Image => replace_matches(text, out, &IMAGE_RE, |caps, out| {
                out.push(Piece::Markup(tags::image(&attribute(&caps["uri"]))));
            }),
            Stage::Expression => EXPRESSION.apply(text, out),
            Stage::Italic => ITALIC.apply(text, out),
            Stage::Strike => STRIKE.apply(text, out),
            Stage::Link => replace_matches(text, out, &LINK_RE, |caps, out| {
                link(caps, out, tags::link_begin)
            }),
            Stage::Page => replace_matches(text, out, &PAGE_RE, |caps, out| {
                link(caps, out, tags::page_link_begin)
            }),
            Stage::Anchor => ANCHOR.apply(text, out),
            Stage::Mention => mentions(text, out),
        }
    }
}

/// Stateless inline transformer. Footnote indices are allocated from the
/// registry passed to each [`InlineForge::forge`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineForge {
    stages: &'static [Stage],
}

impl Default for InlineForge {
    fn default() -> Self {
        InlineForge {
            stages: DEFAULT_STAGES,
        }
    }
}

impl InlineForge {
    /// The default stages plus italics, strikes, expressions, links, page
    /// references, anchors and mentions.
    pub fn extended() -> Self {
        InlineForge {
            stages: EXTENDED_STAGES,
        }
    }

    pub fn stages(&self) -> &'static [Stage] {
        self.stages
    }

    /// Transform one line of author text into inline markup.
    ///
    /// Never fails: unmatched delimiters come out as escaped literal text.
    pub fn forge(&self, text: &str, footnotes: &mut Footnotes) -> String {
        let mut pieces = vec![Piece::Text(text.to_string())];
        for &stage in self.stages {
            let mut next = Vec::with_capacity(pieces.len());
            for piece in pieces {
                match piece {
                    Piece::Text(text) => stage.apply(&text, &mut next, footnotes),
                    other => next.push(other),
                }
            }
            pieces = next;
        }

        let mut out = String::with_capacity(text.len());
        for piece in pieces {
            match piece {
                Piece::Text(text) | Piece::Literal(text) => {
                    out.push_str(&html_escape::encode_quoted_attribute(&unescape(&text)))
                }
                Piece::Markup(markup) => out.push_str(&markup),
            }
        }
        out
    }
}

/// Byte ranges of link, page-reference and expression spans in `line`,
/// sorted by start offset. Pipes inside these spans do not split table
/// cells.
pub fn protected_spans(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let mut spans: Vec<Range<usize>> = LINK_RE
        .find_iter(line)
        .chain(PAGE_RE.find_iter(line))
        .filter(|m| !escaped(bytes, m.start()))
        .map(|m| m.range())
        .collect();
    let mut from = 0;
    while let Some(span) = EXPRESSION.find(line, from) {
        spans.push(span.start..span.end);
        from = span.end;
    }
    spans.sort_by_key(|span| (span.start, span.end));
    spans
}
