use markup::block::{Block, Heading};
use markup::{DocumentCompiler, Footnotes, InlineForge, MarkupError, Parser};
use pretty_assertions::assert_eq;

fn blocks(source: &str) -> Vec<Block> {
    Parser::new(source)
        .parse()
        .blocks
        .into_iter()
        .map(|located| located.block)
        .collect()
}

fn forge(text: &str) -> String {
    InlineForge::default().forge(text, &mut Footnotes::new())
}

fn forge_extended(text: &str) -> String {
    InlineForge::extended().forge(text, &mut Footnotes::new())
}

fn compile(source: &str) -> String {
    let mut compiler = DocumentCompiler::default();
    compiler.set_section(1, 1, "Test");
    compiler.compile_entire(source).expect("compile failed").to_html()
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

#[test]
fn bullets_then_paragraph() {
    assert_eq!(
        blocks("* a\n* b\n\nnormal text"),
        vec![
            Block::Bullets(lines(&["a", "b"])),
            Block::Paragraph(lines(&["normal text"])),
        ]
    );
}

#[test]
fn sorted_list_and_heading() {
    assert_eq!(
        blocks("== Title\n# one\n# two"),
        vec![
            Block::Heading(Heading {
                text: "Title".to_string(),
                level: 3,
            }),
            Block::SortedList(lines(&["one", "two"])),
        ]
    );
}

#[test]
fn paragraph_lines_stay_together() {
    assert_eq!(
        blocks("first line\nsecond line\n\n\n  \nthird"),
        vec![
            Block::Paragraph(lines(&["first line", "second line"])),
            Block::Paragraph(lines(&["third"])),
        ]
    );
}

#[test]
fn whitespace_only_document_has_no_blocks() {
    assert!(blocks("").is_empty());
    assert!(blocks("\n   \n\t\n").is_empty());
}

#[test]
fn table_header_and_body_rows() {
    let parsed = blocks("|!h1|h2\n|a|b");
    let [Block::Table(table)] = parsed.as_slice() else {
        panic!("expected one table, got {:?}", parsed);
    };
    assert_eq!(table.caption, None);
    let (head, body) = table.cells();
    assert_eq!(head, vec![vec!["h1", "h2"]]);
    assert_eq!(body, vec![vec!["a", "b"]]);
}

#[test]
fn table_caption_is_stripped() {
    let parsed = blocks("|| Results\n|!k|v\n|x|1\n|y|2");
    let [Block::Table(table)] = parsed.as_slice() else {
        panic!("expected one table, got {:?}", parsed);
    };
    assert_eq!(table.caption.as_deref(), Some("Results"));
    assert_eq!(table.head_len(), 1);
    assert_eq!(table.cells().1, vec![vec!["x", "1"], vec!["y", "2"]]);
}

#[test]
fn header_rows_only_at_top() {
    let parsed = blocks("|!h\n|a\n|!not a header");
    let [Block::Table(table)] = parsed.as_slice() else {
        panic!("expected one table, got {:?}", parsed);
    };
    assert_eq!(table.head_len(), 1);
    assert_eq!(table.cells().1.len(), 2);
}

#[test]
fn ascii_art_marked_and_fenced() {
    assert_eq!(
        blocks(": +--+\n:\n: |  |"),
        vec![Block::AsciiArt(lines(&["+--+", "", "|  |"]))]
    );
    assert_eq!(
        blocks(":::\n* a\n|b|\n:::\nafter"),
        vec![
            Block::AsciiArt(lines(&["* a", "|b|"])),
            Block::Paragraph(lines(&["after"])),
        ]
    );
}

#[test]
fn empty_ascii_art_fence_yields_nothing() {
    assert!(blocks(":::\n:::").is_empty());
}

#[test]
fn unterminated_ascii_art_fence_warns() {
    let partition = Parser::new("text\n\n:::\nart").parse();
    assert_eq!(partition.warnings.len(), 1);
    assert_eq!(partition.warnings[0].message, "unterminated ascii art fence block");
    assert_eq!(partition.warnings[0].span, 6..9);
    assert_eq!(
        partition.blocks.last().map(|l| &l.block),
        Some(&Block::AsciiArt(lines(&["art"])))
    );
}

#[test]
fn block_spans_cover_source() {
    let source = "* a\n* b\n\nnormal text";
    let partition = Parser::new(source).parse();
    let spans: Vec<_> = partition.blocks.iter().map(|l| l.span.clone()).collect();
    assert_eq!(spans, vec![0..7, 9..source.len()]);
}

// ---------------------------------------------------------------------------
// Fenced code
// ---------------------------------------------------------------------------

#[test]
fn code_block_flags_and_language() {
    let parsed = blocks("```+python\nprint(1)\n```");
    let [Block::Code(code)] = parsed.as_slice() else {
        panic!("expected one code block, got {:?}", parsed);
    };
    assert_eq!(code.lang, "python");
    assert_eq!(code.lines, lines(&["print(1)"]));
    assert!(code.inline);
    assert!(!code.numbered());
}

#[test]
fn fence_language_keeps_glued_marks() {
    let parsed = blocks("```c++\nint **p = **q;\n```\n\n```c++ !\nx\n```\n\n```-!\ny\n```");
    let [Block::Code(cpp), Block::Code(numbered), Block::Code(bare)] = parsed.as_slice() else {
        panic!("expected three code blocks, got {:?}", parsed);
    };
    assert_eq!(cpp.lang, "c++");
    assert!(!cpp.inline && !cpp.no_number && !cpp.require_number);
    assert_eq!(numbered.lang, "c++");
    assert!(numbered.require_number && !numbered.inline);
    assert_eq!(bare.lang, "cpp");
    assert!(bare.no_number && bare.require_number);
    assert!(bare.numbered());
    assert_eq!(
        compile("```c++\nint **p = **q;\n```"),
        "<div class='codeb'><code class='prettyprint lang-c++'>int **p = **q;</code></div>"
    );
}

#[test]
fn inline_code_body_is_forged() {
    assert_eq!(
        compile("```+python\n**print**(1)\n```"),
        "<div class='codeb'><code class='prettyprint lang-python'><b>print</b>(1)</code></div>"
    );
    assert_eq!(
        compile("```python\n**print**(1)\n```"),
        "<div class='codeb'><code class='prettyprint lang-python'>**print**(1)</code></div>"
    );
}

#[test]
fn fenced_code_is_opaque() {
    assert_eq!(
        compile("```\n* item\n|a|b|\n## heading\n<tag>\n```"),
        "<div class='codeb'><code class='prettyprint lang-cpp'>\
         * item<br>|a|b|<br>## heading<br>&lt;tag&gt;</code></div>"
    );
}

#[test]
fn code_keeps_blank_lines_and_indentation() {
    let parsed = blocks("text\n```\nint x;\n\n    x = 1;\n```\nafter");
    assert_eq!(parsed.len(), 3);
    let Block::Code(code) = &parsed[1] else {
        panic!("expected a code block, got {:?}", parsed[1]);
    };
    assert_eq!(code.lines, lines(&["int x;", "", "    x = 1;"]));
    assert_eq!(
        compile("```\n    x = 1;\n```"),
        "<div class='codeb'><code class='prettyprint lang-cpp'>\
         &nbsp;&nbsp;&nbsp;&nbsp;x = 1;</code></div>"
    );
}

#[test]
fn empty_code_block() {
    let parsed = blocks("```\n```\nafter");
    let [Block::Code(code), Block::Paragraph(_)] = parsed.as_slice() else {
        panic!("expected code then paragraph, got {:?}", parsed);
    };
    assert_eq!(code.lines, lines(&[""]));
}

#[test]
fn unterminated_fence_consumes_rest() {
    let partition = Parser::new("before\n\n```\nint x;\n\n* not a list").parse();
    let parsed: Vec<_> = partition.blocks.into_iter().map(|l| l.block).collect();
    let [Block::Paragraph(_), Block::Code(code)] = parsed.as_slice() else {
        panic!("expected paragraph then code, got {:?}", parsed);
    };
    assert_eq!(code.lines, lines(&["int x;", "", "* not a list"]));
    assert_eq!(partition.warnings.len(), 1);
    assert_eq!(partition.warnings[0].message, "unterminated code block");
    assert_eq!(partition.warnings[0].span, 8..11);
}

#[test]
fn listing_numbering() {
    let long = format!("```\n{}```", "x\n".repeat(9));
    let short = "```\nx\n```";
    let forced = "```!\nx\n```";
    let suppressed = format!("```-\n{}```", "x\n".repeat(9));
    let both = "```-!\nx\n```";

    let check = |source: &str, numbered: bool| {
        let parsed = blocks(source);
        let Block::Code(code) = &parsed[0] else {
            panic!("expected a code block, got {:?}", parsed);
        };
        assert_eq!(code.numbered(), numbered, "{}", source);
    };
    check(&long, true);
    check(short, false);
    check(forced, true);
    check(&suppressed, false);
    check(both, true);
}

#[test]
fn numbered_listing_caption() {
    let mut compiler = DocumentCompiler::default();
    compiler.set_section(1, 2, "Listings");
    let html = compiler
        .compile_entire("```!\na\n```\n\n```!rust\nb\n```")
        .unwrap()
        .html;
    assert_eq!(
        html,
        vec![
            "<div class='code-snippet'>Listing 1-2-0</div><hr>\
             <div class='codeb'><code class='prettyprint lang-cpp'>a</code></div><hr>"
                .to_string(),
            "<div class='code-snippet'>Listing 1-2-1</div><hr>\
             <div class='codeb'><code class='prettyprint lang-rust'>b</code></div><hr>"
                .to_string(),
        ]
    );
}

#[test]
fn configured_default_language() {
    let mut compiler = DocumentCompiler::default().with_language("python");
    compiler.set_section(1, 1, "Code");
    let html = compiler.compile_entire("```\npass\n```").unwrap().to_html();
    assert!(html.contains("lang-python"), "{}", html);
}

// ---------------------------------------------------------------------------
// Inline transformer
// ---------------------------------------------------------------------------

#[test]
fn bold_and_monospace() {
    assert_eq!(forge("a **b** c"), "a <b>b</b> c");
    assert_eq!(
        forge("call `f(**x**)` now"),
        "call <code class='codei'>f(**x**)</code> now"
    );
    assert_eq!(forge("`a<b`"), "<code class='codei'>a&lt;b</code>");
}

#[test]
fn unmatched_delimiters_stay_literal() {
    assert_eq!(forge("2 ** 3"), "2 ** 3");
    assert_eq!(forge("**open"), "**open");
    assert_eq!(forge("** spaced**"), "** spaced**");
    assert_eq!(forge("**spaced **"), "**spaced **");
    assert_eq!(forge("a ` b"), "a ` b");
}

#[test]
fn backslash_escapes() {
    assert_eq!(forge(r"\*\*not bold\*\*"), "**not bold**");
    assert_eq!(forge(r"\`tick\`"), "`tick`");
    assert_eq!(forge(r"\[img a.png]"), "[img a.png]");
    assert_eq!(forge(r"\^[[no note]]"), "^[[no note]]");
}

#[test]
fn images() {
    assert_eq!(
        forge("see [img fig/one.png] here"),
        "see <img src='../images/fig/one.png'> here"
    );
}

#[test]
fn escaping_is_applied_once() {
    let escaped = forge(r#"a < b & "c" > 'd'"#);
    assert_eq!(escaped, "a &lt; b &amp; &quot;c&quot; &gt; &#x27;d&#x27;");
    for c in ['<', '>', '"', '\''] {
        assert!(!escaped.contains(c), "{}", escaped);
    }
    assert_eq!(forge("plain words, nothing else"), "plain words, nothing else");
}

#[test]
fn default_stages_ignore_extended_syntax() {
    assert_eq!(InlineForge::default().stages(), markup::parser::inline::DEFAULT_STAGES);
    assert_eq!(forge("/it/ ~st~ @alice"), "/it/ ~st~ @alice");
}

#[test]
fn extended_stages() {
    assert_eq!(
        forge_extended("/it/ ~st~ $a|b$ #top# @alice"),
        "<i>it</i> <del>st</del> <span class='expr'>a|b</span> \
         <a href='#top' class='anchor'>top</a> <span class='user'>@alice</span>"
    );
    assert_eq!(
        forge_extended("[link http://x.io|the site] and [p intro.html]"),
        "<a href='http://x.io'>the site</a> and <a href='intro.html' class='page'>intro.html</a>"
    );
}

#[test]
fn link_uris_keep_slashes_and_fragments() {
    assert_eq!(
        forge_extended("[link http://example.com/docs/|Docs]"),
        "<a href='http://example.com/docs/'>Docs</a>"
    );
    assert_eq!(
        forge_extended("[p ch/intro/|Intro]"),
        "<a href='ch/intro/' class='page'>Intro</a>"
    );
    assert_eq!(
        forge_extended("[link http://a.com/#top|go]"),
        "<a href='http://a.com/#top'>go</a>"
    );
}

#[test]
fn expressions_are_closed_to_formatting() {
    assert_eq!(
        forge_extended("$a/b/c$"),
        "<span class='expr'>a/b/c</span>"
    );
}

#[test]
fn italic_avoids_paths_and_ratios() {
    assert_eq!(forge_extended("1/2 and 3/4"), "1/2 and 3/4");
    assert_eq!(forge_extended("/usr/bin"), "/usr/bin");
    assert_eq!(forge_extended("/x/:"), "/x/:");
}

#[test]
fn mentions_skip_email_addresses() {
    assert_eq!(forge_extended("mail bob@example.com"), "mail bob@example.com");
    assert_eq!(
        forge_extended("thanks @bob."),
        "thanks <span class='user'>@bob</span>."
    );
    assert_eq!(forge_extended(r"\@bob"), "@bob");
}

#[test]
fn entities_are_not_anchors() {
    assert_eq!(forge_extended("it's #x#"), "it&#x27;s <a href='#x' class='anchor'>x</a>");
}

// ---------------------------------------------------------------------------
// Footnotes
// ---------------------------------------------------------------------------

#[test]
fn footnote_anchor_and_registry() {
    let mut compiler = DocumentCompiler::default();
    let html = compiler
        .compile_entire("Some text with a footnote^[[note body]] here.")
        .unwrap()
        .to_html();
    assert_eq!(
        html,
        "<section class='sec'><p class='ln'>Some text with a footnote\
         <sup class='fn-anchor' id='fn-anchor-0'><a href='#fn-0'>0</a></sup> here.</p></section>"
    );
    assert_eq!(compiler.footnotes().len(), 1);
    assert_eq!(compiler.footnotes().get(0), Some("note body"));
}

#[test]
fn footnotes_keep_source_order() {
    let mut compiler = DocumentCompiler::default();
    compiler
        .compile_entire("first^[[one]]\n\n* item\n\nlater^[[two]] and^[[three]]")
        .unwrap();
    let bodies: Vec<_> = compiler.footnotes().iter().cloned().collect();
    assert_eq!(bodies, vec!["one", "two", "three"]);
}

#[test]
fn footnotes_span_compiles() {
    let mut compiler = DocumentCompiler::default();
    compiler.set_section(1, 1, "One");
    compiler.compile_entire("a^[[first]]").unwrap();
    compiler.set_section(1, 2, "Two");
    let html = compiler.compile_entire("b^[[second]]").unwrap().to_html();
    assert!(html.contains("id='fn-anchor-1'"), "{}", html);
}

#[test]
fn rendered_footnotes_are_escaped() {
    let mut compiler = DocumentCompiler::default();
    compiler.compile_entire("x^[[a <b> **c**]]").unwrap();
    assert_eq!(compiler.footnotes().get(0), Some("a <b> **c**"));
    assert_eq!(
        compiler.render_footnotes(),
        vec!["<div class='fn' id='fn-0'><a href='#fn-anchor-0'>^</a> 0. a &lt;b&gt; **c**</div>"]
    );
}

// ---------------------------------------------------------------------------
// Rendering and numbering
// ---------------------------------------------------------------------------

#[test]
fn heading_labels_in_order() {
    let mut compiler = DocumentCompiler::default();
    compiler.set_section(2, 1, "Numbers");
    let html = compiler
        .compile_entire("= A\n\ntext\n\n```\ncode\n```\n\n== B\n* x\n\n= C")
        .unwrap()
        .html;
    let headings: Vec<_> = html.iter().filter(|h| h.starts_with("<h")).collect();
    assert_eq!(
        headings,
        vec![
            "<h2 id='h-2-1-0' class='h2 hx'>2.1.0 A</h2>",
            "<h3 id='h-2-1-1' class='h3 hx'>2.1.1 B</h3>",
            "<h2 id='h-2-1-2' class='h2 hx'>2.1.2 C</h2>",
        ]
    );
}

#[test]
fn sections_restart_numbering() {
    let mut compiler = DocumentCompiler::default();
    compiler.set_section(3, 0, "Prelude");
    assert!(compiler.compile_entire("= P").unwrap().to_html().contains("3.0.0 P"));
    compiler.set_section(3, 1, "First");
    assert!(compiler.compile_entire("= Q").unwrap().to_html().contains("3.1.0 Q"));
    let titles: Vec<_> = compiler.sections().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Prelude", "First"]);
}

#[test]
fn numbering_outside_section_is_an_error() {
    let mut compiler = DocumentCompiler::default();
    assert_eq!(
        compiler.compile_entire("= Heading").unwrap_err(),
        MarkupError::NoSection { what: "heading" }
    );
    assert_eq!(
        compiler.compile_entire("```!\nx\n```").unwrap_err(),
        MarkupError::NoSection { what: "code listing" }
    );
    assert!(compiler.compile_entire("text\n\n```\nx\n```").is_ok());
}

#[test]
fn lists_and_paragraphs() {
    assert_eq!(
        compile("* a\n* **b**\n\n# one\n\nline one\nline two"),
        "<ul><li>a</li><li><b>b</b></li></ul>\
         <ol><li>one</li></ol>\
         <section class='sec'><p class='ln'>line one</p><p class='ln'>line two</p></section>"
    );
}

#[test]
fn ascii_art_keeps_spacing() {
    assert_eq!(
        compile(": a  <b>"),
        "<div class='aa'><pre><code>a&nbsp;&nbsp;&lt;b&gt;</code></pre></div>"
    );
}

#[test]
fn table_rendering() {
    assert_eq!(
        compile("|!h1|h2\n|a|**b**"),
        "<table class='tbl'><thead><tr><th>h1</th><th>h2</th></tr></thead>\
         <tbody><tr><td>a</td><td><b>b</b></td></tr></tbody></table>"
    );
    assert_eq!(
        compile("||Cap\n|a|"),
        "<table class='tbl'><caption>Cap</caption><tbody><tr><td>a</td></tr></tbody></table>"
    );
}

#[test]
fn table_pipes_inside_spans() {
    let mut compiler = DocumentCompiler::new(InlineForge::extended());
    compiler.set_section(1, 1, "Tables");
    let html = compiler
        .compile_entire("|[link http://x.io|the x]|$a|b$|c\\|d")
        .unwrap()
        .to_html();
    assert_eq!(
        html,
        "<table class='tbl'><tbody><tr>\
         <td><a href='http://x.io'>the x</a></td>\
         <td><span class='expr'>a|b</span></td>\
         <td>c|d</td>\
         </tr></tbody></table>"
    );
}

#[test]
fn custom_table_renderer() {
    struct CellCount;

    impl markup::TableRenderer for CellCount {
        fn render(
            &self,
            _caption: Option<&str>,
            head_rows: &[Vec<String>],
            body_rows: &[Vec<String>],
        ) -> String {
            let cells: usize = head_rows.iter().chain(body_rows).map(Vec::len).sum();
            format!("[{} cells]", cells)
        }
    }

    let mut compiler = DocumentCompiler::default().with_table_renderer(CellCount);
    let html = compiler.compile_entire("|!a|b\n|c|d\n|e|f").unwrap().to_html();
    assert_eq!(html, "[6 cells]");
}

// ---------------------------------------------------------------------------
// Budget-limited compile
// ---------------------------------------------------------------------------

const THREE_PARAGRAPHS: &str = "first paragraph line one\nline two\n\nsecond paragraph\n\nthird paragraph";

#[test]
fn preview_stops_inside_first_paragraph() {
    let compiler = DocumentCompiler::default();
    let preview = compiler.compile_partial(THREE_PARAGRAPHS, 5).unwrap();
    assert_eq!(
        preview.html,
        "<section class='sec'><p class='ln'>first paragraph line one</p></section>"
    );
    assert!(!preview.complete);
}

#[test]
fn preview_with_room_to_spare_is_complete() {
    let compiler = DocumentCompiler::default();
    let preview = compiler.compile_partial(THREE_PARAGRAPHS, 10_000).unwrap();
    assert!(preview.complete);
    let mut full = DocumentCompiler::default();
    assert_eq!(preview.html, full.compile_entire(THREE_PARAGRAPHS).unwrap().to_html());
}

#[test]
fn preview_drops_following_blocks() {
    let compiler = DocumentCompiler::default();
    let first = "first paragraph line one".len() + "line two".len();
    let preview = compiler.compile_partial(THREE_PARAGRAPHS, first).unwrap();
    assert_eq!(preview.html.matches("<section").count(), 1);
    assert!(!preview.complete);
}

#[test]
fn preview_is_monotonic() {
    let compiler = DocumentCompiler::default();
    let doc = "one\ntwo\nthree\n\n* four\n* five\n\n```\nsix\nseven\n```\n\n|eight|nine\n|ten|x";
    let mut previous = String::new();
    let mut was_complete = false;
    for limit in 1..80 {
        let preview = compiler.compile_partial(doc, limit).unwrap();
        assert!(preview.html.len() >= previous.len(), "limit {}", limit);
        assert!(
            preview.html.matches("<br>").count() >= previous.matches("<br>").count(),
            "limit {}",
            limit
        );
        if was_complete {
            assert!(preview.complete, "limit {}", limit);
        }
        was_complete = preview.complete;
        previous = preview.html;
    }
    assert!(was_complete);
}

#[test]
fn preview_does_not_advance_counters() {
    let mut compiler = DocumentCompiler::default();
    compiler.set_section(1, 1, "Preview");
    let preview = compiler.compile_partial("= A\n\nnote^[[x]]", 100).unwrap();
    assert!(preview.html.contains("1.1.0 A"), "{}", preview.html);
    assert!(compiler.footnotes().is_empty());

    let html = compiler.compile_entire("= A").unwrap().to_html();
    assert!(html.contains("1.1.0 A"), "{}", html);
}

#[test]
fn table_truncation_spends_caption_then_rows() {
    let table = blocks("||cap\n|!aa|bb\n|cc|dd\n|ee|ff").remove(0);

    let cut = table.clone().truncate_to(2);
    let Block::Table(t) = &cut.block else { unreachable!() };
    assert!(t.rows.is_empty());
    assert!(cut.shortened);

    let cut = table.clone().truncate_to(8);
    let Block::Table(t) = &cut.block else { unreachable!() };
    assert_eq!(t.rows, lines(&["|!aa|bb", "|cc|dd"]));
    assert_eq!(cut.remaining, -3);

    let cut = table.truncate_to(100);
    assert!(!cut.shortened);
    assert_eq!(cut.remaining, 100 - 3 - 12);
}

#[test]
fn partitioner_accepts_extra_rules() {
    use markup::parser::{LINE_RULES, LineRule, Partitioner};

    fn quote(line: &str) -> bool {
        line.starts_with("> ")
    }
    fn not_quote(line: &str) -> bool {
        !quote(line)
    }
    fn quote_block(lines: &[&str]) -> Option<Block> {
        let stripped: Vec<&str> = lines.iter().map(|l| &l[2..]).collect();
        Block::paragraph(&stripped)
    }

    let mut rules = vec![LineRule {
        name: "quote",
        begin: quote,
        end: not_quote,
        build: quote_block,
        begin_excluded: false,
        end_excluded: false,
    }];
    rules.extend(LINE_RULES.iter().copied());

    let mut out = Vec::new();
    let mut warnings = Vec::new();
    Partitioner::new(&rules).partition("> said\n> twice\n* item", 0, &mut out, &mut warnings);
    let parsed: Vec<_> = out.into_iter().map(|l| l.block).collect();
    assert_eq!(
        parsed,
        vec![
            Block::Paragraph(lines(&["said", "twice"])),
            Block::Bullets(lines(&["item"])),
        ]
    );
    assert!(warnings.is_empty());
}
