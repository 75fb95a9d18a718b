use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use visitlog_engine::catalog::PathCatalog;
use visitlog_engine::config::ParserOptions;

#[derive(Parser)]
#[command(name = "visitlog-engine", version, about = "Per-path daily visit histogram builder")]
struct Cli {
    /// Path to the append-only visit log.
    #[arg(long)]
    input: PathBuf,

    /// Path to write the JSON histogram to.
    #[arg(long)]
    output: PathBuf,

    /// Path to the catalog file: one `id,uri` pair per line.
    #[arg(long)]
    catalog: PathBuf,

    /// Worker count override (1-16). Defaults to PARSER_WORKERS or 8.
    #[arg(long)]
    workers: Option<usize>,

    /// Disable the small-file single-worker fallback.
    #[arg(long)]
    force_multicore: bool,

    /// Print per-slice ranges and stage timings to stderr.
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("visitlog_engine=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let catalog = load_catalog(&cli.catalog)
        .with_context(|| format!("reading catalog {}", cli.catalog.display()))?;
    if catalog.is_empty() {
        tracing::warn!(path = %cli.catalog.display(), "catalog has no valid entries, output will be {{}}");
    }

    let options = ParserOptions::from_env()
        .context("loading parser options from the environment")?
        .with_overrides(cli.workers, cli.force_multicore);

    let stats = visitlog_engine::parse(&cli.input, &cli.output, &catalog, &options)
        .with_context(|| format!("parsing {} into {}", cli.input.display(), cli.output.display()))?;

    if cli.stats {
        print_stats(&stats);
    }

    Ok(())
}

#[derive(serde::Deserialize)]
struct CatalogEntry {
    id: u32,
    uri: String,
}

fn load_catalog(path: &PathBuf) -> Result<PathCatalog> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog file {}", path.display()))?;
    let trimmed = contents.trim_start();

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let entries: Vec<CatalogEntry> = serde_json::from_str(&contents)
            .with_context(|| format!("parsing catalog file {} as JSON", path.display()))?;
        return Ok(PathCatalog::build(
            entries.into_iter().map(|e| (e.id, e.uri)),
        ));
    }

    let pairs = contents.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (id_str, uri) = line.split_once(',')?;
        let id = id_str.trim().parse::<u32>().ok()?;
        Some((id, uri.trim().to_string()))
    });

    Ok(PathCatalog::build(pairs))
}

fn print_stats(stats: &visitlog_engine::RunStats) {
    eprintln!("\n=== Run Stats ===");
    eprintln!("Slices:  {}", stats.slice_count);
    for (i, (start, end)) in stats.slice_ranges.iter().enumerate() {
        eprintln!("  [{}] {}..{}", i, start, end);
    }
    eprintln!("Parse:   {:.3}s", stats.parse_seconds);
    eprintln!("Merge:   {:.3}s", stats.merge_seconds);
    eprintln!("Emit:    {:.3}s", stats.emit_seconds);
}
