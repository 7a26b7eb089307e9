use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

use orsr_parser::config::BASE_URL;
use orsr_parser::output::{render, OutputFormat};
use orsr_parser::{
    Connector, ConnectorConfig, Extractor, FetchConfig, MetaContext, ParserConfig, Record,
    RepairMode, SearchResults, Strictness, Variant,
};

#[derive(Parser)]
#[command(name = "orsr", about = "Slovak business register (ORSR) extractor")]
struct Cli {
    /// Output format: json, xml, raw, or "" for a plain listing
    #[arg(long, global = true, env = "ORSR_FORMAT", default_value = "json")]
    format: String,
    /// Cache fetched pages in this directory
    #[arg(long, global = true, env = "ORSR_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
    #[arg(long, global = true, env = "ORSR_BASE_URL", default_value = BASE_URL)]
    base_url: String,
    /// Parse in one tolerant pass instead of repairing the markup first
    #[arg(long, global = true)]
    no_repair: bool,
    /// Turn unusable pages into empty records instead of errors
    #[arg(long, global = true)]
    lenient: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a detail page by entity and court id
    Detail {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        court: u8,
        /// Full historical extract instead of the current one
        #[arg(long)]
        full: bool,
    },
    /// Extract a detail page from a link such as "vypis.asp?ID=1001&SID=2&P=0"
    Link {
        link: String,
        #[arg(long)]
        full: bool,
    },
    /// Search by ICO, optionally opening the first hit
    Ico {
        ico: String,
        #[arg(long)]
        detail: bool,
        #[arg(long)]
        full: bool,
    },
    /// Search by business name
    Name { name: String },
    /// Search by person
    Person {
        surname: String,
        first_name: Option<String>,
    },
    /// Extract a saved detail page
    Parse { file: PathBuf },
    /// Extract every *.html in a directory, writing <name>.json next to each
    Batch { dir: PathBuf },
}

impl Cli {
    fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            repair: if self.no_repair { RepairMode::TolerantOnly } else { RepairMode::Repair },
            strictness: if self.lenient { Strictness::Lenient } else { Strictness::Strict },
            ..ParserConfig::default()
        }
    }

    fn connector_config(&self) -> ConnectorConfig {
        ConnectorConfig {
            parser: self.parser_config(),
            fetch: FetchConfig {
                base_url: self.base_url.clone(),
                ..FetchConfig::default()
            },
            cache_dir: self.cache_dir.clone(),
            server: server_name(),
        }
    }
}

fn server_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "orsr".into())
}

fn variant(full: bool) -> Variant {
    if full {
        Variant::Full
    } else {
        Variant::Current
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let format: OutputFormat = cli.format.parse()?;

    let result = match &cli.command {
        Commands::Parse { file } => {
            let raw = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
            let extractor = Extractor::new(&cli.parser_config());
            let record = extractor.extract_detail(&raw, &MetaContext::new(server_name()))?;
            print_record(&record, format)
        }
        Commands::Batch { dir } => {
            let extractor = Extractor::new(&cli.parser_config());
            let counts = extract_dir(&extractor, dir)?;
            println!("Extracted {} pages ({} ok, {} errors).", counts.total, counts.ok, counts.errors);
            Ok(())
        }
        command => {
            let connector = Connector::from_config(&cli.connector_config())?;
            run_online(&connector, command, format).await
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_online(connector: &Connector, command: &Commands, format: OutputFormat) -> Result<()> {
    match command {
        Commands::Detail { id, court, full } => {
            let record = connector
                .detail_by_id(*id, *court, variant(*full))
                .await
                .with_context(|| format!("Detail ID={} SID={} failed", id, court))?;
            print_record(&record, format)
        }
        Commands::Link { link, full } => {
            let record = connector
                .detail_by_link(link, full.then_some(Variant::Full))
                .await
                .with_context(|| format!("Detail {} failed", link))?;
            print_record(&record, format)
        }
        Commands::Ico { ico, detail: true, full } => {
            match connector.detail_by_ico(ico, full.then_some(Variant::Full)).await? {
                Some(record) => print_record(&record, format),
                None => {
                    println!("No entity found for ICO {}.", ico);
                    Ok(())
                }
            }
        }
        Commands::Ico { ico, .. } => print_results(&connector.find_by_ico(ico).await?, format),
        Commands::Name { name } => print_results(&connector.find_by_name(name).await?, format),
        Commands::Person { surname, first_name } => {
            let results = connector
                .find_by_person(surname, first_name.as_deref().unwrap_or_default())
                .await?;
            print_results(&results, format)
        }
        Commands::Parse { .. } | Commands::Batch { .. } => Ok(()),
    }
}

fn print_record(record: &Record, format: OutputFormat) -> Result<()> {
    let value = serde_json::to_value(record)?;
    match render(&value, format)? {
        Some(text) => println!("{}", text),
        None => {
            let s = record.summary();
            for (label, text) in [
                ("ICO", &s.ico),
                ("Name", &s.obchodne_meno),
                ("Street", &s.street),
                ("Number", &s.number),
                ("City", &s.city),
                ("ZIP", &s.zip),
                ("Kind", &s.typ_osoby),
                ("Header", &s.hlavicka_kratka),
            ] {
                println!("{:<8} {}", label, text);
            }
        }
    }
    Ok(())
}

fn print_results(results: &SearchResults, format: OutputFormat) -> Result<()> {
    let value: Value = serde_json::to_value(results)?;
    match render(&value, format)? {
        Some(text) => println!("{}", text),
        None => {
            if results.is_empty() {
                println!("Nothing found.");
                return Ok(());
            }
            println!("{:>3} | {:<48} | {}", "#", "Entity", "Link");
            println!("{}", "-".repeat(90));
            for (i, (label, link)) in results.iter().enumerate() {
                println!("{:>3} | {:<48} | {}", i + 1, truncate(label, 48), link);
            }
        }
    }
    Ok(())
}

struct BatchCounts {
    total: usize,
    ok: usize,
    errors: usize,
}

fn extract_dir(extractor: &Extractor, dir: &Path) -> Result<BatchCounts> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("html")))
        .collect();
    pages.sort();
    info!("Extracting {} pages from {}", pages.len(), dir.display());

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let server = server_name();
    let mut counts = BatchCounts { total: pages.len(), ok: 0, errors: 0 };

    for chunk in pages.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|path| {
                let result = extract_file(extractor, path, &server);
                pb.inc(1);
                result
            })
            .collect();

        for (path, result) in chunk.iter().zip(results) {
            match result {
                Ok(_) => counts.ok += 1,
                Err(e) => {
                    warn!("{}: {:#}", path.display(), e);
                    counts.errors += 1;
                }
            }
        }
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn extract_file(extractor: &Extractor, path: &Path, server: &str) -> Result<PathBuf> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let record = extractor.extract_detail(&raw, &MetaContext::new(server))?;
    let out = path.with_extension("json");
    std::fs::write(&out, serde_json::to_string_pretty(&record)?)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(out)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
