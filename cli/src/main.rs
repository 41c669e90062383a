//! pagemark CLI - PDF layout to Markdown

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagemark::{
    convert, convert_to_html, convert_with_stats, inspect, PageSelection, ParseOptions,
    PdfDocument, RenderOptions,
};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pagemark")]
#[command(version)]
#[command(about = "Rebuild Markdown from the layout of PDF pages", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert PDF to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input PDF file, or - for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Compose pages one at a time
        #[arg(long)]
        sequential: bool,

        /// Skip table detection
        #[arg(long)]
        no_tables: bool,

        /// Print conversion statistics to stderr
        #[arg(long)]
        stats: bool,

        /// Give up on pages not started within this many seconds
        #[arg(long, value_name = "SECS", env = "PAGEMARK_TIMEOUT")]
        timeout: Option<u64>,
    },

    /// Convert PDF to HTML
    Html {
        /// Input PDF file, or - for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Dump ordered layout items as JSON
    Inspect {
        /// Input PDF file, or - for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Single page to inspect
        #[arg(long)]
        page: Option<u32>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input PDF file, or - for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Markdown {
            input,
            output,
            pages,
            sequential,
            no_tables,
            stats,
            timeout,
        }) => cmd_markdown(
            &input,
            output.as_deref(),
            MarkdownFlags {
                pages,
                sequential,
                no_tables,
                stats,
                timeout,
            },
        ),
        Some(Commands::Html {
            input,
            output,
            pages,
        }) => cmd_html(&input, output.as_deref(), pages.as_deref()),
        Some(Commands::Inspect {
            input,
            page,
            compact,
        }) => cmd_inspect(&input, page, compact),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(input) = cli.input {
                cmd_markdown(&input, None, MarkdownFlags::default())
            } else {
                println!("{}", "Usage: pagemark <FILE>".yellow());
                println!("       pagemark --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

#[derive(Default)]
struct MarkdownFlags {
    pages: Option<String>,
    sequential: bool,
    no_tables: bool,
    stats: bool,
    timeout: Option<u64>,
}

fn parse_pages(pages: Option<&str>) -> CliResult<PageSelection> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p)?),
        None => Ok(PageSelection::All),
    }
}

/// Open a PDF path, or read one from stdin when the path is `-`.
fn open_input(input: &Path, options: ParseOptions) -> CliResult<PdfDocument> {
    let doc = if input == Path::new("-") {
        PdfDocument::from_reader_with_options(io::stdin().lock(), options)?
    } else {
        PdfDocument::open_with_options(input, options)?
    };
    Ok(doc)
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_markdown(input: &Path, output: Option<&Path>, flags: MarkdownFlags) -> CliResult {
    let doc = open_input(input, ParseOptions::new().with_tables(!flags.no_tables))?;
    log::debug!("opened {} (PDF {})", input.display(), doc.version());

    let mut render_options = RenderOptions::new()
        .with_pages(parse_pages(flags.pages.as_deref())?)
        .with_parallel(!flags.sequential);
    if let Some(secs) = flags.timeout {
        render_options = render_options.with_timeout(Duration::from_secs(secs));
    }

    // Keep stdout clean when the document goes there
    let pb = output.map(|_| spinner("Converting to Markdown..."));

    let markdown = if flags.stats {
        let result = convert_with_stats(&doc, &render_options)?;
        eprintln!("{}", serde_json::to_string_pretty(&result.stats)?);
        result.content
    } else {
        convert(&doc, &render_options)?
    };

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    write_output(output, &markdown)
}

fn cmd_html(input: &Path, output: Option<&Path>, pages: Option<&str>) -> CliResult {
    let doc = open_input(input, ParseOptions::new())?;
    let render_options = RenderOptions::new().with_pages(parse_pages(pages)?);

    let pb = output.map(|_| spinner("Converting to HTML..."));
    let html = convert_to_html(&doc, &render_options)?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    write_output(output, &html)
}

fn cmd_inspect(input: &Path, page: Option<u32>, compact: bool) -> CliResult {
    let doc = open_input(input, ParseOptions::new())?;
    let selection = match page {
        Some(p) => PageSelection::Pages(vec![p]),
        None => PageSelection::All,
    };
    let layouts = inspect(&doc, &RenderOptions::new().with_pages(selection))?;

    let json = if compact {
        serde_json::to_string(&layouts)?
    } else {
        serde_json::to_string_pretty(&layouts)?
    };
    println!("{}", json);
    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let doc = open_input(input, ParseOptions::new())?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), doc.version());
    println!("{}: {}", "Pages".bold(), pagemark::PageSource::page_count(&doc));

    if let Ok(size) = doc.page_size(1) {
        println!(
            "{}: {:.0} x {:.0} pt",
            "Page size".bold(),
            size.width,
            size.height
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagemark".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF layout to Markdown tool");
    println!();
    println!("License: MIT");
}
