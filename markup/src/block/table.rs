use crate::block::{RenderContext, char_len};
use crate::parser::inline::protected_spans;
use crate::tags;

const HEAD_ROW: &str = "|!";

/// Turns parsed table contents into markup. Cells arrive already forged.
pub trait TableRenderer: Send + Sync {
    fn render(
        &self,
        caption: Option<&str>,
        head_rows: &[Vec<String>],
        body_rows: &[Vec<String>],
    ) -> String;
}

/// Plain `<table>` with `<thead>`/`<tbody>` sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTable;

impl TableRenderer for HtmlTable {
    fn render(
        &self,
        caption: Option<&str>,
        head_rows: &[Vec<String>],
        body_rows: &[Vec<String>],
    ) -> String {
        fn rows(out: &mut String, rows: &[Vec<String>], cell: &str) {
            for row in rows {
                out.push_str("<tr>");
                for content in row {
                    out.push_str(&format!("<{cell}>{content}</{cell}>"));
                }
                out.push_str("</tr>");
            }
        }

        let mut out = String::from(tags::TABLE_BEGIN);
        if let Some(caption) = caption {
            out.push_str(&format!("<caption>{caption}</caption>"));
        }
        if !head_rows.is_empty() {
            out.push_str("<thead>");
            rows(&mut out, head_rows, "th");
            out.push_str("</thead>");
        }
        out.push_str("<tbody>");
        rows(&mut out, body_rows, "td");
        out.push_str("</tbody>");
        out.push_str(tags::TABLE_END);
        out
    }
}

/// Raw table rows. Cells are only split out when rendering or truncating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub caption: Option<String>,
    /// Source lines including their `|` or `|!` prefix.
    pub rows: Vec<String>,
}

impl Table {
    pub fn new(caption: Option<String>, rows: &[&str]) -> Self {
        Table {
            caption,
            rows: rows.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Number of header rows: the `|!` rows at the top of the table. The
    /// first other row ends the header.
    pub fn head_len(&self) -> usize {
        self.rows.iter().take_while(|r| r.starts_with(HEAD_ROW)).count()
    }

    /// Raw cell text of every row, header rows first.
    pub fn cells(&self) -> (Vec<Vec<&str>>, Vec<Vec<&str>>) {
        let head_len = self.head_len();
        let head = self.rows[..head_len]
            .iter()
            .map(|r| split_cells(&r[HEAD_ROW.len()..]))
            .collect();
        let body = self.rows[head_len..]
            .iter()
            .map(|r| split_cells(r.get(1..).unwrap_or("")))
            .collect();
        (head, body)
    }

    pub fn render(&self, ctx: &mut RenderContext<'_>) -> String {
        let caption = self.caption.as_deref().map(|c| ctx.forge(c));
        let (head, body) = self.cells();
        let mut forge = |rows: Vec<Vec<&str>>| -> Vec<Vec<String>> {
            rows.into_iter()
                .map(|row| row.into_iter().map(|cell| ctx.forge(cell)).collect())
                .collect()
        };
        let head = forge(head);
        let body = forge(body);
        ctx.tables().render(caption.as_deref(), &head, &body)
    }

    /// The caption is spent first, then rows from the top (header rows
    /// before body rows), stopping at the row that exhausts the budget.
    pub fn truncate_to(self, limit: isize) -> (Self, isize, bool) {
        let mut limit = limit - self.caption.as_deref().map_or(0, char_len);
        let (head, body) = self.cells();
        let lengths: Vec<isize> = head
            .iter()
            .chain(body.iter())
            .map(|row| row.iter().map(|cell| char_len(cell)).sum())
            .collect();

        let total = self.rows.len();
        let mut keep = total;
        if limit <= 0 {
            keep = 0;
        } else {
            for (i, len) in lengths.iter().enumerate() {
                limit -= len;
                if limit <= 0 {
                    keep = i + 1;
                    break;
                }
            }
        }

        let Table { caption, mut rows } = self;
        rows.truncate(keep);
        (Table { caption, rows }, limit, keep < total)
    }
}

/// Split a row (prefix removed) into trimmed cells.
///
/// A `|` is a delimiter unless it is escaped or falls inside a link, page
/// reference or expression span. Spans are sorted by start, so the only
/// candidate for covering a pipe is the last span starting before it. A
/// trailing `|` closes the row rather than opening an empty cell.
pub fn split_cells(row: &str) -> Vec<&str> {
    let spans = protected_spans(row);
    let bytes = row.as_bytes();
    let mut cells = Vec::new();
    let mut begin = 0;
    for (pos, &b) in bytes.iter().enumerate() {
        if b != b'|' || (pos > 0 && bytes[pos - 1] == b'\\') {
            continue;
        }
        let nearest = spans.partition_point(|span| span.start <= pos);
        if nearest > 0 && spans[nearest - 1].end > pos {
            continue;
        }
        cells.push(row[begin..pos].trim());
        begin = pos + 1;
    }
    let last = row[begin..].trim();
    if !(last.is_empty() && begin > 0 && begin == row.trim_end().len()) {
        cells.push(last);
    }
    cells
}
