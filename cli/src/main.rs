mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::info;
use tracing_subscriber::EnvFilter;

use search::{SearchConfig, SearchIndex, Session};
use sitesearch::page::load_pages;
use sitesearch::{Block, Highlighter, IndexError, Page, segment};

#[derive(Parser)]
#[command(name = "sitesearch", version, about = "Full-text search over static site indexes")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// More logging (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the blocks each page of an index is split into
    Blocks(BlocksArgs),

    /// Search an index and print highlighted results
    Query(QueryArgs),

    /// Build an index from a directory of Markdown files
    Export(ExportArgs),

    /// Run .test.html fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct BlocksArgs {
    /// Page index (JSON array of {permalink, title, htmlString})
    index: PathBuf,

    /// Print blocks as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Page index (JSON array of {permalink, title, htmlString})
    index: PathBuf,

    /// Search term
    term: String,

    /// Search configuration file
    #[arg(short, long, default_value = "search.toml")]
    config: PathBuf,

    /// Show at most this many results
    #[arg(short = 'n', long, default_value_t = 10)]
    limit: usize,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Directory containing .md sources
    dir: PathBuf,

    /// URL the site is served under
    #[arg(long)]
    base_url: String,

    /// Write the index here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.html file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    let result = match cli.command {
        Command::Blocks(args) => do_blocks(args, cli.no_color),
        Command::Query(args) => do_query(args, cli.no_color),
        Command::Export(args) => do_export(args),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                return;
            }
            let exit_code = test_runner::run_tests(&args.path, cli.no_color, &args.category);
            process::exit(exit_code);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8, no_color: bool) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .init();
}

/// Read and parse an index, rendering syntax errors against the source.
fn read_pages(path: &Path, no_color: bool) -> Result<Vec<Page>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;

    match load_pages(&source) {
        Ok(pages) => Ok(pages),
        Err(error) => {
            emit_index_error(path, source, &error, no_color);
            Err(error).with_context(|| format!("'{}' is not a page index", path.display()))
        }
    }
}

fn emit_index_error(path: &Path, source: String, error: &IndexError, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let mut files = SimpleFiles::new();
    let file_id = files.add(path.display().to_string(), source);
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    let _ = term::emit_to_write_style(
        &mut writer.lock(),
        &config,
        &files,
        &error.to_diagnostic(file_id),
    );
}

fn do_blocks(args: BlocksArgs, no_color: bool) -> Result<()> {
    let pages = read_pages(&args.index, no_color)?;
    let blocks: Vec<Block> = pages.iter().flat_map(segment).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    for block in &blocks {
        let pad = "  ".repeat(u8::from(block.level) as usize - 1);
        println!("{}{} [{}]", pad, block.label, block.permalink);
        if !block.content.is_empty() {
            println!("{}  {}", pad, preview(&block.content, 72));
        }
    }
    Ok(())
}

fn do_query(args: QueryArgs, no_color: bool) -> Result<()> {
    let config = SearchConfig::load(&args.config)
        .with_context(|| format!("loading '{}'", args.config.display()))?;
    let pages = read_pages(&args.index, no_color)?;
    let index = SearchIndex::from_pages(&pages, config.matching.clone());
    let session = Session::new(
        index,
        Highlighter::new(config.snippet.to_highlight_options()),
    );

    let Some(hits) = session.search(&args.term) else {
        eprintln!("nothing to search for");
        return Ok(());
    };
    if hits.is_empty() {
        eprintln!("no results");
        return Ok(());
    }

    for hit in hits.iter().take(args.limit) {
        println!("{}", bold(&hit.label, no_color));
        println!("  {}", hit.permalink);
        if let Some(snippet) = &hit.snippet {
            println!("  {}", snippet);
        }
    }
    if hits.len() > args.limit {
        eprintln!("({} more)", hits.len() - args.limit);
    }
    Ok(())
}

fn do_export(args: ExportArgs) -> Result<()> {
    let pages = sitesearch::export::export_dir(&args.dir, &args.base_url)?;
    info!(dir = %args.dir.display(), pages = pages.len(), "exported markdown sources");
    let json = serde_json::to_string_pretty(&pages)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("cannot write '{}'", path.display()))?;
            eprintln!("wrote {} pages to {}", pages.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// First `max` characters of `text`, on one line.
fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{}...", cut)
    }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}
