//! Runner for `.test.txt` fixtures.
//!
//! A fixture is a TOML header between `---` lines followed by a markup
//! document:
//!
//! ```text
//! ---
//! description = "bold inside a list item"
//! expect_output = "<ul><li><b>x</b></li></ul>"
//! ---
//! * **x**
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use markup::{DocumentCompiler, InlineForge, ParseWarning};
use serde::Deserialize;

const FIXTURE_SUFFIX: &str = ".test.txt";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fixture {
    pub description: Option<String>,

    /// Open a section before compiling. Either key opens one; the other
    /// defaults to 1.
    pub chapter: Option<u32>,
    pub section: Option<u32>,

    /// Use the extended inline stages.
    pub extended_inline: bool,

    /// Compile a preview with this budget instead of the whole document.
    pub limit: Option<usize>,

    /// Exact rendered markup, compared trimmed.
    pub expect_output: Option<String>,

    /// Substrings the rendered markup must contain.
    pub expect_contains: Vec<String>,

    /// Completeness of a preview. Requires `limit`.
    pub expect_complete: Option<bool>,

    /// Exact footnote registry contents after the compile.
    pub expect_footnotes: Option<Vec<String>>,

    /// Substring of the expected compile error.
    pub expect_error: Option<String>,

    /// If present (even empty), warning count and content are checked.
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a fixture into its header and markup document.
fn split_fixture(content: &str) -> Result<(Fixture, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let header = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
        .ok_or("missing opening --- line")?;
    let close = header.find("\n---").ok_or("missing closing --- line")?;

    let rest = &header[close + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);
    let fixture = toml::from_str(header[..close].trim_end_matches('\r'))
        .map_err(|e| format!("invalid fixture header: {}", e))?;
    Ok((fixture, source))
}

struct Outcome {
    html: String,
    complete: Option<bool>,
    footnotes: Vec<String>,
    warnings: Vec<ParseWarning>,
}

fn compile(fixture: &Fixture, source: &str) -> Result<Outcome, markup::MarkupError> {
    let inline = if fixture.extended_inline {
        InlineForge::extended()
    } else {
        InlineForge::default()
    };
    let mut compiler = DocumentCompiler::new(inline);
    if fixture.chapter.is_some() || fixture.section.is_some() {
        compiler.set_section(
            fixture.chapter.unwrap_or(1),
            fixture.section.unwrap_or(1),
            "fixture",
        );
    }

    let (html, complete, warnings) = match fixture.limit {
        Some(limit) => {
            let preview = compiler.compile_partial(source, limit)?;
            (preview.html, Some(preview.complete), preview.warnings)
        }
        None => {
            let compiled = compiler.compile_entire(source)?;
            (compiled.to_html(), None, compiled.warnings)
        }
    };
    Ok(Outcome {
        html,
        complete,
        footnotes: compiler.footnotes().iter().cloned().collect(),
        warnings,
    })
}

fn check(fixture: &Fixture, source: &str) -> Result<(), String> {
    let outcome = match (compile(fixture, source), &fixture.expect_error) {
        (Err(err), Some(expected)) if err.to_string().contains(expected.as_str()) => {
            return Ok(());
        }
        (Err(err), Some(expected)) => {
            return Err(format!(
                "expected error containing \"{}\", got: {}",
                expected, err
            ));
        }
        (Err(err), None) => return Err(format!("unexpected error: {}", err)),
        (Ok(_), Some(expected)) => {
            return Err(format!(
                "expected error containing \"{}\", but compiling succeeded",
                expected
            ));
        }
        (Ok(outcome), None) => outcome,
    };

    if let Some(expected) = &fixture.expect_output {
        let (expected, actual) = (expected.trim(), outcome.html.trim());
        if expected != actual {
            return Err(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected, actual
            ));
        }
    }

    for needle in &fixture.expect_contains {
        if !outcome.html.contains(needle.as_str()) {
            return Err(format!(
                "output does not contain \"{}\"\n  actual: {}",
                needle, outcome.html
            ));
        }
    }

    if let Some(expected) = fixture.expect_complete {
        match outcome.complete {
            None => return Err("expect_complete needs a limit".into()),
            Some(actual) if actual != expected => {
                return Err(format!("expected complete = {}, got {}", expected, actual));
            }
            Some(_) => {}
        }
    }

    if let Some(expected) = &fixture.expect_footnotes {
        if *expected != outcome.footnotes {
            return Err(format!(
                "footnote mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, outcome.footnotes
            ));
        }
    }

    match &fixture.expect_warnings {
        Some(expected) => check_warnings(source, &outcome.warnings, expected),
        None => Ok(()),
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

fn check_warnings(
    source: &str,
    actual: &[ParseWarning],
    expected: &[ExpectedWarning],
) -> Result<(), String> {
    if actual.len() != expected.len() {
        let listed: Vec<String> = actual.iter().map(|w| format!("    - {}", w)).collect();
        return Err(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            if listed.is_empty() {
                "    (none)".to_string()
            } else {
                listed.join("\n")
            }
        ));
    }

    for (i, (warning, expected)) in actual.iter().zip(expected).enumerate() {
        if !warning.message.contains(&expected.contains) {
            return Err(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, warning
            ));
        }
        let line = line_of(source, warning.span.start);
        if expected.line.is_some_and(|expected| expected != line) {
            return Err(format!(
                "warning[{}]: expected on line {}, but span is on line {}",
                i,
                expected.line.unwrap_or_default(),
                line
            ));
        }
    }
    Ok(())
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: Result<(), String>,
}

impl TestResult {
    fn label(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => self
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.trim_end_matches(FIXTURE_SUFFIX).to_string())
                .unwrap_or_else(|| "?".to_string()),
        }
    }
}

fn run_fixture(path: &Path) -> TestResult {
    let fail = |reason: String| TestResult {
        path: path.to_path_buf(),
        description: None,
        outcome: Err(reason),
    };
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return fail(format!("cannot read file: {}", e)),
    };
    let (fixture, source) = match split_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(e),
    };
    log::debug!("running {}", path.display());
    TestResult {
        path: path.to_path_buf(),
        outcome: check(&fixture, source),
        description: fixture.description,
    }
}

/// Fixtures grouped by category: their directory relative to `root`.
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_fixtures(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_fixtures(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        log::warn!("cannot read {}", dir.display());
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            collect_fixtures(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(FIXTURE_SUFFIX));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Keep the requested categories and their sub-categories.
fn select<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&format!("{}/", request)) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

struct Paint {
    no_color: bool,
}

impl Paint {
    fn wrap(&self, code: &str, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn pass(&self, text: &str) -> String {
        self.wrap("32", text)
    }

    fn fail(&self, text: &str) -> String {
        self.wrap("31", text)
    }

    fn bold(&self, text: &str) -> String {
        self.wrap("1", text)
    }
}

/// Run every fixture under `path` (or the single fixture `path`). Returns
/// the process exit code: 0 when everything passed.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let paint = Paint { no_color };
    let all = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };
    if all.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return 1;
    }
    let selected = select(&all, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures = Vec::new();
    for (category, files) in &selected {
        eprintln!();
        eprintln!("{}", paint.bold(category_label(category)));
        for file in *files {
            let result = run_fixture(file);
            match result.outcome {
                Ok(()) => {
                    passed += 1;
                    eprintln!("  {}  {}", paint.pass("PASS"), result.label());
                }
                Err(_) => {
                    eprintln!("  {}  {}", paint.fail("FAIL"), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let Err(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", paint.pass("ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint.fail("FAILED"),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
