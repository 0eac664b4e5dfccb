//! HTML fragments emitted by the compiler.
//!
//! Attributes are single-quoted throughout, so every value interpolated into
//! an attribute must already be escaped with
//! [`html_escape::encode_quoted_attribute`].

pub const SPACE: &str = "&nbsp;";
pub const BR: &str = "<br>";

pub const PARA_BEGIN: &str = "<section class='sec'>";
pub const PARA_END: &str = "</section>";
pub const PLINE_BEGIN: &str = "<p class='ln'>";
pub const PLINE_END: &str = "</p>";

pub const UL_BEGIN: &str = "<ul>";
pub const UL_END: &str = "</ul>";
pub const OL_BEGIN: &str = "<ol>";
pub const OL_END: &str = "</ol>";
pub const LI_BEGIN: &str = "<li>";
pub const LI_END: &str = "</li>";

pub const BOLD_BEGIN: &str = "<b>";
pub const BOLD_END: &str = "</b>";
pub const ITALIC_BEGIN: &str = "<i>";
pub const ITALIC_END: &str = "</i>";
pub const STRIKE_BEGIN: &str = "<del>";
pub const STRIKE_END: &str = "</del>";
pub const MONOSPACE_BEGIN: &str = "<code class='codei'>";
pub const MONOSPACE_END: &str = "</code>";
pub const EXPR_BEGIN: &str = "<span class='expr'>";
pub const EXPR_END: &str = "</span>";
pub const LINK_END: &str = "</a>";

pub const CODE_BLOCK_END: &str = "</code></div>";
pub const CODE_BLOCK_RULE: &str = "<hr>";

pub const AA_BEGIN: &str = "<div class='aa'><pre><code>";
pub const AA_END: &str = "</code></pre></div>";

pub const TABLE_BEGIN: &str = "<table class='tbl'>";
pub const TABLE_END: &str = "</table>";

pub const IMAGE_ROOT: &str = "../images/";

pub fn heading(level: usize, anchor: &str, text: &str) -> String {
    format!("<h{level} id='{anchor}' class='h{level} hx'>{text}</h{level}>")
}

pub fn code_block_caption(chapter: u32, section: u32, index: u32) -> String {
    format!("<div class='code-snippet'>Listing {chapter}-{section}-{index}</div><hr>")
}

pub fn code_block_begin(lang: &str) -> String {
    format!("<div class='codeb'><code class='prettyprint lang-{lang}'>")
}

pub fn footnote_anchor(index: usize) -> String {
    format!("<sup class='fn-anchor' id='fn-anchor-{index}'><a href='#fn-{index}'>{index}</a></sup>")
}

pub fn footnote(index: usize, content: &str) -> String {
    format!("<div class='fn' id='fn-{index}'><a href='#fn-anchor-{index}'>^</a> {index}. {content}</div>")
}

pub fn image(uri: &str) -> String {
    format!("<img src='{IMAGE_ROOT}{uri}'>")
}

pub fn link_begin(uri: &str) -> String {
    format!("<a href='{uri}'>")
}

pub fn page_link_begin(uri: &str) -> String {
    format!("<a href='{uri}' class='page'>")
}

pub fn anchor_begin(name: &str) -> String {
    format!("<a href='#{name}' class='anchor'>")
}

pub fn mention(name: &str) -> String {
    format!("<span class='user'>@{name}</span>")
}
