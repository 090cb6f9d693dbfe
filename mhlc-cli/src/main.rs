use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mhlc_core::{parse_manifest, CompareConfig, Manifest, MhlError, Reconciler, Report, ReportConfig, Side, SizeFormat};

const RULE: &str = "--------------";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SizeUnits { Decimal, Binary }

impl From<SizeUnits> for SizeFormat {
    fn from(u: SizeUnits) -> Self {
        match u { SizeUnits::Decimal => SizeFormat::Decimal, SizeUnits::Binary => SizeFormat::Binary }
    }
}

#[derive(Parser)]
#[command(name="mhlc", version, about="Compare Media Hash List (MHL) files")]
struct Cli {
    /// One MHL file to list, or two to compare
    #[arg(required = true, num_args = 1..=2)]
    paths: Vec<PathBuf>,
    /// Give greater detail on all files affected
    #[arg(short = 'v', long = "verbose", visible_alias = "info")]
    verbose: bool,
    /// Units for human-readable sizes
    #[arg(long, value_enum, default_value_t = SizeUnits::Decimal)]
    size_format: SizeUnits,
    /// Count modification, creation and hash date differences as MINOR
    #[arg(long)]
    dates: bool,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
    /// Never colour output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
    init_logging()?;

    let missing: Vec<PathBuf> = cli.paths.iter().filter(|p| !p.is_file()).cloned().collect();
    if !missing.is_empty() {
        return Err(MhlError::InputNotFound { paths: missing }.into());
    }

    let report = Report::new(ReportConfig {
        verbose: cli.verbose,
        size_format: cli.size_format.into(),
        include_date_differences: cli.dates,
    });

    match cli.paths.as_slice() {
        [only] => list(&report, only, cli.json),
        [first, second] => compare(&report, first, second, cli.json),
        _ => anyhow::bail!("expected one or two MHL files"),
    }
}

/// Diagnostics go to stderr so they never mix with the report.
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_env("MHLC_LOG")
        .or_else(|_| EnvFilter::try_new("warn"))
        .context("build log filter")?;
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(console::colors_enabled_stderr())
        .compact();
    tracing_subscriber::registry().with(filter).with(layer).init();
    Ok(())
}

fn load(path: &Path) -> Result<Manifest> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let source = path.to_string_lossy();
    let parsed = parse_manifest(&source, &text).with_context(|| format!("parse {}", path.display()))?;
    let manifest = Manifest::from_parsed(&source, parsed)?;
    debug!(path = %source, records = manifest.len(), "loaded");
    Ok(manifest)
}

fn print_lines(lines: Vec<String>) {
    for l in lines { println!("{l}"); }
}

fn list(report: &Report, path: &Path, json: bool) -> Result<()> {
    let manifest = load(path)?;
    if json {
        println!("{}", report.listing_json(&manifest).context("serialise listing")?);
        return Ok(());
    }
    println!("{RULE}");
    println!("{}", Report::banner(env!("CARGO_PKG_VERSION")));
    println!();
    print_lines(report.listing_lines(&manifest));
    println!("{RULE}");
    Ok(())
}

fn compare(report: &Report, first: &Path, second: &Path, json: bool) -> Result<()> {
    let a = load(first)?;
    let b = load(second)?;
    let mut reconciler = Reconciler::new(a, b, CompareConfig {
        include_date_differences: report.config().include_date_differences,
    });
    let result = reconciler.reconcile();
    let (a, b) = reconciler.into_manifests();

    if json {
        println!("{}", report.json(&a, &b, &result).context("serialise comparison")?);
        return Ok(());
    }

    println!("{RULE}");
    println!("{}", Report::banner(env!("CARGO_PKG_VERSION")));
    println!();
    print_lines(report.manifest_summary(&a, Side::First));
    print_lines(report.manifest_summary(&b, Side::Second));
    if report.config().verbose {
        for o in &result.outcomes {
            println!();
            print_lines(report.detail_lines(o));
        }
    }
    println!();
    print_lines(report.tally_lines(&result.tally));
    println!("{RULE}");
    Ok(())
}
