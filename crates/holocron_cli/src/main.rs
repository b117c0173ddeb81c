use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use holocron_core::core_api::{
    ConversionReport, Engine, RecordType, ScanOptions, ScanReport, SourceCatalog, TargetRecord,
};
use holocron_render::{
    JsonStyle, TextRenderOptions, render_records_json, render_records_text, render_scan_json,
    render_scan_summary,
};
use serde_json::Value as JsonValue;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directories holding OggDude XML and adversary JSON files.
    #[arg(value_name = "ROOT", required = true)]
    roots: Vec<PathBuf>,
    /// Source book key to keep; repeat for several. Default keeps all.
    #[arg(long = "source", value_name = "KEY")]
    sources: Vec<String>,
    /// Record type to keep; repeat for several. Default keeps all.
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_record_type)]
    types: Vec<RecordType>,
    #[arg(long = "max-per-type", value_name = "N", default_value_t = 0)]
    max_per_type: usize,
    #[arg(long = "campaign", value_name = "ID", default_value = "")]
    campaign: String,
    #[arg(long = "sources-file", value_name = "PATH")]
    sources_file: Option<PathBuf>,
    #[arg(long)]
    json: bool,
    /// Only scan and report counts per record type.
    #[arg(long)]
    counts: bool,
    #[arg(short, long)]
    verbose: bool,
    /// Write converted records to PATH as a JSON array.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn parse_record_type(value: &str) -> Result<RecordType, String> {
    value.parse()
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let catalog = match &cli.sources_file {
        Some(path) => SourceCatalog::load_from_path(path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        }),
        None => SourceCatalog::default(),
    };
    if let Some(unknown) = cli.sources.iter().find(|key| catalog.get(key).is_none()) {
        eprintln!("unknown source key '{unknown}'");
        process::exit(2);
    }
    if cli.counts && cli.output.is_some() {
        eprintln!("--output cannot be combined with --counts");
        process::exit(2);
    }

    if let Err(e) = run(&cli, catalog) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli, catalog: SourceCatalog) -> Result<()> {
    let options = ScanOptions {
        selected_sources: cli.sources.iter().cloned().collect(),
        selected_types: cli.types.iter().copied().collect(),
        max_per_type: cli.max_per_type,
        campaign_id: cli.campaign.clone(),
    };
    let engine = Engine::with_catalog(catalog);

    let mut summary = ScanReport::default();
    let mut records: Vec<TargetRecord> = Vec::new();
    for root in &cli.roots {
        let report = engine
            .scan(root, &options)
            .with_context(|| format!("failed to scan {}", root.display()))?;
        let converted = if cli.counts {
            None
        } else {
            let session = engine
                .open(root)
                .with_context(|| format!("failed to index {}", root.display()))?;
            Some(session.convert_all(&report, &options.campaign_id))
        };
        merge_report(&mut summary, report);
        if let Some(ConversionReport {
            records: groups,
            issues,
        }) = converted
        {
            summary.issues.extend(issues);
            records.extend(groups.into_values().flatten());
        }
    }

    let text_options = TextRenderOptions {
        verbose: cli.verbose,
    };
    if let Some(path) = &cli.output {
        write_records(path, &records)?;
        info!(path = %path.display(), records = records.len(), "records written");
        if cli.json {
            print_json(&render_scan_json(&summary))?;
        } else {
            print!("{}", render_scan_summary(&summary, text_options));
            println!("Wrote {} records to {}", records.len(), path.display());
        }
        return Ok(());
    }

    match (cli.counts, cli.json) {
        (true, true) => print_json(&render_scan_json(&summary))?,
        (true, false) => print!("{}", render_scan_summary(&summary, text_options)),
        (false, true) => print_json(&render_records_json(&records, JsonStyle::default()))?,
        (false, false) => {
            print!("{}", render_scan_summary(&summary, text_options));
            println!();
            print!("{}", render_records_text(&records));
        }
    }
    Ok(())
}

fn merge_report(into: &mut ScanReport, report: ScanReport) {
    into.files_seen += report.files_seen;
    into.issues.extend(report.issues);
    for (kind, group) in report.records {
        into.records.entry(kind).or_default().extend(group);
    }
}

fn write_records(path: &Path, records: &[TargetRecord]) -> Result<()> {
    let rendered = serde_json::to_string_pretty(&render_records_json(records, JsonStyle::default()))
        .context("failed to render records")?;
    fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))
}

fn print_json(value: &JsonValue) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    println!("{rendered}");
    Ok(())
}
