mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use book::{Book, FileWarnings};
use markup::{DocumentCompiler, InlineForge, ParseWarning};

const SUBCOMMANDS: &[&str] = &["build", "compile", "test", "help"];
const DEFAULT_CONFIG: &str = "book.toml";

#[derive(Parser)]
#[command(name = "bookc", version, about = "Book markup compiler")]
struct Cli {
    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the whole book into one page
    Build(BuildArgs),

    /// Compile a single markup file to stdout
    Compile(CompileArgs),

    /// Run .test.txt fixtures
    Test(TestArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Book configuration (defaults apply when book.toml is absent)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Markup source file
    file: PathBuf,

    /// Chapter number for headings and listings
    #[arg(long, default_value_t = 1)]
    chapter: u32,

    /// Section number for headings and listings
    #[arg(long, default_value_t = 1)]
    section: u32,

    /// Render a preview holding about this many characters of text
    #[arg(short, long)]
    limit: Option<usize>,

    /// Append the rendered footnotes
    #[arg(long)]
    footnotes: bool,

    /// Use the extended inline syntax
    #[arg(long)]
    extended: bool,

    /// Language for code fences that name none
    #[arg(long)]
    language: Option<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.txt file or a directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `bookc chapter.txt` is short for `bookc compile chapter.txt`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        if !SUBCOMMANDS.contains(&args[pos + 1].as_str()) {
            args.insert(pos + 1, "compile".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Build(build_args) => do_build(build_args, cli.no_color),
        Command::Compile(compile_args) => do_compile(compile_args, cli.no_color),
        Command::Test(test_args) => {
            if test_args.list_categories {
                test_runner::list_categories(&test_args.path);
                return;
            }
            let code = test_runner::run_tests(&test_args.path, cli.no_color, &test_args.category);
            process::exit(code);
        }
    };

    if let Err(message) = result {
        eprintln!("error: {}", message);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn color_choice(no_color: bool) -> ColorChoice {
    if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

/// Print warnings against their source file.
fn emit_warnings(name: &Path, source: &str, warnings: &[ParseWarning], no_color: bool) {
    if warnings.is_empty() {
        return;
    }
    let mut files = SimpleFiles::new();
    let file_id = files.add(name.display().to_string(), source);
    let writer = StandardStream::stderr(color_choice(no_color));
    let config = term::Config::default();
    for warning in warnings {
        let diagnostic = warning.to_diagnostic(file_id);
        if let Err(e) = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic) {
            log::error!("cannot print diagnostic: {}", e);
        }
    }
}

fn do_build(args: BuildArgs, no_color: bool) -> Result<(), String> {
    let book = match &args.config {
        Some(path) => Book::load(path),
        None => Book::load_or_default(Path::new(DEFAULT_CONFIG)),
    }
    .map_err(|e| e.to_string())?;

    let rendered = book.write().map_err(|e| e.to_string())?;
    for FileWarnings {
        path,
        source,
        warnings,
    } in &rendered.warnings
    {
        emit_warnings(path, source, warnings, no_color);
    }
    eprintln!("ok: wrote {}", book.output_path().display());
    Ok(())
}

fn do_compile(args: CompileArgs, no_color: bool) -> Result<(), String> {
    let source = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("cannot read '{}': {}", args.file.display(), e))?;

    let inline = if args.extended {
        InlineForge::extended()
    } else {
        InlineForge::default()
    };
    let mut compiler = DocumentCompiler::new(inline);
    if let Some(language) = &args.language {
        compiler = compiler.with_language(language);
    }
    compiler.set_section(args.chapter, args.section, args.file.display().to_string());

    match args.limit {
        Some(limit) => {
            let preview = compiler
                .compile_partial(&source, limit)
                .map_err(|e| e.to_string())?;
            emit_warnings(&args.file, &source, &preview.warnings, no_color);
            println!("{}", preview.html);
            if !preview.complete {
                println!("<!-- incomplete -->");
            }
        }
        None => {
            let compiled = compiler
                .compile_entire(&source)
                .map_err(|e| e.to_string())?;
            emit_warnings(&args.file, &source, &compiled.warnings, no_color);
            for fragment in &compiled.html {
                println!("{}", fragment);
            }
        }
    }

    if args.footnotes {
        for footnote in compiler.render_footnotes() {
            println!("{}", footnote);
        }
    }
    Ok(())
}
