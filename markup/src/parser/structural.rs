use std::ops::Range;

use crate::block::Block;
use crate::parser::error::ParseWarning;
use crate::parser::Located;

// ---------------------------------------------------------------------------
// Line rules
// ---------------------------------------------------------------------------

/// How one block type is recognised line by line.
///
/// A block starts at a line matching `begin` and runs until the next line
/// matching `end` (or the end of the chunk). The `*_excluded` flags say
/// whether those delimiting lines belong to the block's content.
#[derive(Clone, Copy)]
pub struct LineRule {
    pub name: &'static str,
    pub begin: fn(&str) -> bool,
    pub end: fn(&str) -> bool,
    pub build: fn(&[&str]) -> Option<Block>,
    pub begin_excluded: bool,
    pub end_excluded: bool,
}

fn bullet(line: &str) -> bool {
    line.starts_with("* ")
}

fn not_bullet(line: &str) -> bool {
    !bullet(line)
}

fn sorted_item(line: &str) -> bool {
    line.starts_with("# ")
}

fn not_sorted_item(line: &str) -> bool {
    !sorted_item(line)
}

fn caption_row(line: &str) -> bool {
    line.starts_with("||")
}

fn table_row(line: &str) -> bool {
    line.starts_with('|')
}

fn not_table_row(line: &str) -> bool {
    !table_row(line)
}

fn heading(line: &str) -> bool {
    let marks = line.bytes().take_while(|&b| b == b'=').count();
    marks > 0 && line.as_bytes().get(marks) == Some(&b' ')
}

fn any_line(_: &str) -> bool {
    true
}

fn marked_art(line: &str) -> bool {
    line.starts_with(": ") || line == ":"
}

fn not_marked_art(line: &str) -> bool {
    !marked_art(line)
}

fn art_fence(line: &str) -> bool {
    line == ":::"
}

/// Checked in order; the first rule whose `begin` matches wins.
pub static LINE_RULES: [LineRule; 7] = [
    LineRule {
        name: "bullets",
        begin: bullet,
        end: not_bullet,
        build: Block::bullets,
        begin_excluded: false,
        end_excluded: false,
    },
    LineRule {
        name: "sorted list",
        begin: sorted_item,
        end: not_sorted_item,
        build: Block::sorted_list,
        begin_excluded: false,
        end_excluded: false,
    },
    LineRule {
        name: "captioned table",
        begin: caption_row,
        end: not_table_row,
        build: Block::table_with_caption,
        begin_excluded: false,
        end_excluded: false,
    },
    LineRule {
        name: "table",
        begin: table_row,
        end: not_table_row,
        build: Block::table,
        begin_excluded: false,
        end_excluded: false,
    },
    LineRule {
        name: "heading",
        begin: heading,
        end: any_line,
        build: Block::heading,
        begin_excluded: false,
        end_excluded: false,
    },
    LineRule {
        name: "ascii art",
        begin: marked_art,
        end: not_marked_art,
        build: Block::ascii_art_marked,
        begin_excluded: false,
        end_excluded: false,
    },
    LineRule {
        name: "ascii art fence",
        begin: art_fence,
        end: art_fence,
        build: Block::ascii_art,
        begin_excluded: true,
        end_excluded: true,
    },
];

// ---------------------------------------------------------------------------
// Partitioner
// ---------------------------------------------------------------------------

/// Splits a chunk of text that contains no fenced code into blocks.
pub struct Partitioner<'r> {
    rules: &'r [LineRule],
}

impl Default for Partitioner<'static> {
    fn default() -> Self {
        Partitioner { rules: &LINE_RULES }
    }
}

impl<'r> Partitioner<'r> {
    pub fn new(rules: &'r [LineRule]) -> Self {
        Partitioner { rules }
    }

    fn rule_for(&self, line: &str) -> Option<&'r LineRule> {
        self.rules.iter().find(|rule| (rule.begin)(line))
    }

    /// Partition `chunk`, whose first byte sits at `base` in the document.
    /// Blocks are appended to `out` in source order.
    pub fn partition(
        &self,
        chunk: &str,
        base: usize,
        out: &mut Vec<Located>,
        warnings: &mut Vec<ParseWarning>,
    ) {
        let mut lines: Vec<(usize, &str)> = Vec::new();
        let mut offset = 0;
        for line in chunk.split('\n') {
            lines.push((offset, line.strip_suffix('\r').unwrap_or(line)));
            offset += line.len() + 1;
        }
        // Byte offset just past line `i` (its newline included).
        let line_end = |i: usize| lines.get(i + 1).map_or(chunk.len(), |&(off, _)| off);
        let text = |range: Range<usize>| lines[range].iter().map(|&(_, l)| l).collect::<Vec<_>>();

        let mut i = 0;
        while i < lines.len() {
            let Some(rule) = self.rule_for(lines[i].1) else {
                let start = i;
                while i < lines.len() && self.rule_for(lines[i].1).is_none() {
                    i += 1;
                }
                if let Some(block) = Block::paragraph(&text(start..i)) {
                    out.push(Located {
                        block,
                        span: base + lines[start].0..base + line_end(i - 1),
                    });
                }
                continue;
            };

            let content_start = if rule.begin_excluded { i + 1 } else { i };
            let mut end = i + 1;
            while end < lines.len() && !(rule.end)(lines[end].1) {
                end += 1;
            }
            let next = if rule.end_excluded && end < lines.len() {
                end + 1
            } else {
                end
            };
            if rule.end_excluded && end == lines.len() {
                warnings.push(
                    ParseWarning::new(
                        format!("unterminated {} block", rule.name),
                        base + lines[i].0..base + lines[i].0 + lines[i].1.len(),
                    )
                    .with_note("the block runs to the next blank line"),
                );
            }

            let span = base + lines[i].0..base + line_end(next - 1);
            if let Some(block) = (rule.build)(&text(content_start..end.max(content_start))) {
                out.push(Located { block, span });
            }
            i = next;
        }
    }
}
