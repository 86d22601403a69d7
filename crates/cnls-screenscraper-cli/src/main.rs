//! cNLS Screenscraper command line: FASTA in, NLS predictions out.

use std::cell::Cell;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use futures::StreamExt;

use cnls_screenscraper::{
    parse, validate_sequence, BatchOutcome, BatchRunner, CnlsError, Cutoff, Screenscraper,
    ScreenscraperConfig,
};

mod cache;
mod fasta;
mod report;

use report::ReportOptions;

#[derive(Parser)]
#[command(
    name = "cnls-screenscraper",
    about = "Predict nuclear localization signals with the cNLS Mapper",
    version,
    after_help = "FASTA input is read from stdin when no file is given."
)]
struct Cli {
    /// Only print errors.
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print results as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    /// Minimum score for a signal to count, applied when reading results
    /// (not sent to the server).
    #[arg(long, short, global = true, value_parser = parse_score)]
    score: Option<f64>,

    /// Print the max monopartite and bipartite scores as well.
    #[arg(long, short, global = true)]
    print_scores: bool,

    /// Server-side cutoff: 2.0, 3.0, 4.0, 5.0 or 6.0. [env: CNLS_CUTOFF]
    #[arg(long, global = true)]
    cutoff: Option<String>,

    /// Seconds to wait after each request. [env: CNLS_PAUSE_SECS]
    #[arg(long, global = true)]
    pause: Option<String>,

    /// Form endpoint of the service. [env: CNLS_ENDPOINT]
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Maximum requests in flight. [env: CNLS_CONCURRENCY]
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit each sequence and print its prediction (default).
    Predict {
        /// FASTA file.
        input: Option<PathBuf>,
    },
    /// Submit each sequence and save the raw result pages instead of parsing them.
    Fetch {
        /// FASTA file.
        input: Option<PathBuf>,
        /// Directory for the saved pages.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Parse result pages previously saved with `fetch`.
    ParseCached {
        /// Directory holding the pages.
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Check which sequences would be submitted, without contacting the server.
    Validate {
        /// FASTA file.
        input: Option<PathBuf>,
    },
    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn parse_score(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(score) if score >= 0.0 => Ok(score),
        _ => Err(format!("`{raw}' is not a non-negative number")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "error" } else { cli.log_level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(&cli)?;
    let opts = ReportOptions {
        minimum_score: cli.score,
        print_scores: cli.print_scores,
        json: cli.json,
    };

    match cli.command.unwrap_or(Commands::Predict { input: None }) {
        Commands::Predict { input } => predict(&config, input.as_deref(), &opts).await,
        Commands::Fetch { input, out_dir } => {
            fetch(&config, input.as_deref(), &out_dir, cli.quiet).await
        }
        Commands::ParseCached { dir } => parse_cached(&dir, &opts),
        Commands::Validate { input } => validate(input.as_deref(), cli.json),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "cnls-screenscraper",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

/// Environment first, then command-line flags on top.
fn resolve_config(cli: &Cli) -> Result<ScreenscraperConfig> {
    let mut config = ScreenscraperConfig::from_env();
    if let Some(raw) = &cli.cutoff {
        config.cut_off = raw.parse::<Cutoff>()?;
    }
    if let Some(raw) = &cli.pause {
        config.pause = cnls_screenscraper::config::parse_pause(raw)
            .with_context(|| format!("invalid --pause `{raw}': expected seconds"))?;
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(n) = cli.concurrency {
        if n == 0 {
            bail!("--concurrency must be at least 1");
        }
        config.concurrency = n;
    }
    tracing::debug!(
        "endpoint={} cut_off={} pause={:?} concurrency={}",
        config.endpoint,
        config.cut_off,
        config.pause,
        config.concurrency
    );
    Ok(config)
}

/// Wrap a FASTA source so a read error ends the run instead of being
/// silently dropped.
fn readable_entries<'a>(
    source: Box<dyn Iterator<Item = Result<fasta::Entry>>>,
    read_failed: &'a Cell<bool>,
) -> impl Iterator<Item = fasta::Entry> + 'a {
    source.map_while(move |entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::error!("{e:#}");
            read_failed.set(true);
            None
        }
    })
}

fn log_failure(name: &str, e: &CnlsError) {
    tracing::error!("{name}: {e}");
    log_raw_html(name, e);
}

/// The batch runner already reported the failure itself.
fn log_raw_html(name: &str, e: &CnlsError) {
    if let Some(html) = e.raw_html() {
        tracing::debug!("{name}: response body:\n{html}");
    }
}

async fn predict(config: &ScreenscraperConfig, input: Option<&Path>, opts: &ReportOptions) -> Result<()> {
    let read_failed = Cell::new(false);
    let entries = readable_entries(fasta::open(input)?, &read_failed);
    let runner = BatchRunner::new(Screenscraper::new(config), config);

    if let Some(header) = report::header(opts) {
        println!("{header}");
    }

    let mut predicted = 0usize;
    let mut stream = std::pin::pin!(runner.predict(entries));
    while let Some(item) = stream.next().await {
        match item.outcome {
            BatchOutcome::Done(prediction) => {
                predicted += 1;
                println!("{}", report::row(&item.name, &prediction, opts));
            }
            BatchOutcome::Failed(e) => log_raw_html(&item.name, &e),
            BatchOutcome::Skipped(_) => {}
        }
    }

    tracing::info!("{predicted} sequences predicted");
    if read_failed.get() {
        bail!("stopped early: could not read FASTA input");
    }
    Ok(())
}

async fn fetch(config: &ScreenscraperConfig, input: Option<&Path>, out_dir: &Path, quiet: bool) -> Result<()> {
    let read_failed = Cell::new(false);
    let entries = readable_entries(fasta::open(input)?, &read_failed);
    let runner = BatchRunner::new(Screenscraper::new(config), config);

    let mut pages = cache::PageWriter::new(out_dir);
    let mut saved = 0usize;
    let mut stream = std::pin::pin!(runner.fetch(entries));
    while let Some(item) = stream.next().await {
        match item.outcome {
            BatchOutcome::Done(body) => {
                let path = pages.write(&item.name, &body)?;
                tracing::debug!("saved {}", path.display());
                saved += 1;
                if !quiet {
                    eprint!(".");
                    let _ = std::io::stderr().flush();
                }
            }
            BatchOutcome::Failed(e) => log_raw_html(&item.name, &e),
            BatchOutcome::Skipped(_) => {}
        }
    }
    if !quiet && saved > 0 {
        eprintln!();
    }

    tracing::info!("{saved} pages saved to {}", out_dir.display());
    if read_failed.get() {
        bail!("stopped early: could not read FASTA input");
    }
    Ok(())
}

fn parse_cached(dir: &Path, opts: &ReportOptions) -> Result<()> {
    let pages = cache::cached_pages(dir)?;
    let parsed = write_cached_rows(&pages, opts, &mut std::io::stdout().lock())?;
    tracing::info!("{parsed} of {} cached pages parsed", pages.len());
    Ok(())
}

/// Print one row per page. Pages that cannot be read or parsed are logged
/// and skipped. Returns how many rows were written.
fn write_cached_rows(pages: &[PathBuf], opts: &ReportOptions, out: &mut impl Write) -> Result<usize> {
    if let Some(header) = report::header(opts) {
        writeln!(out, "{header}")?;
    }
    let mut parsed = 0usize;
    for path in pages {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let html = match cache::read_page(path) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("{e:#}");
                continue;
            }
        };
        match parse(&html) {
            Ok(prediction) => {
                writeln!(out, "{}", report::row(&name, &prediction, opts))?;
                parsed += 1;
            }
            Err(e) => log_failure(&format!("failed to parse {name}"), &e),
        }
    }
    Ok(parsed)
}

fn validate(input: Option<&Path>, json: bool) -> Result<()> {
    for entry in fasta::open(input)? {
        let (name, residues) = entry?;
        let verdict = validate_sequence(&residues);
        if json {
            let line = serde_json::json!({
                "name": name,
                "accepted": verdict.is_ok(),
                "reason": verdict.as_ref().err().map(|r| r.to_string()),
            });
            println!("{line}");
        } else {
            match verdict {
                Ok(()) => println!("{name}\tok"),
                Err(rejection) => println!("{name}\trejected: {rejection}"),
            }
        }
    }
    Ok(())
}
