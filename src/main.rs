use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use log::{info, warn};

use covid_explorer::data::export::write_to;
use covid_explorer::data::loader::load_file;
use covid_explorer::{enrich, query, Dataset, ExportFormat, Filter, Index};

/// Filter an OWID-style COVID-19 dataset and export the result.
#[derive(Parser, Debug)]
#[command(name = "covid-explorer", version, about)]
struct Args {
    /// Input dataset (.csv, .json or .parquet)
    #[arg(short, long)]
    input: PathBuf,

    /// Comma-separated locations; all locations when omitted
    #[arg(short, long, value_delimiter = ',')]
    locations: Vec<String>,

    /// First date (YYYY-MM-DD); defaults to the earliest date in the data
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD), inclusive; defaults to the latest date in the data
    #[arg(long)]
    end: Option<NaiveDate>,

    /// JSON file holding a complete filter, instead of --locations/--start/--end
    #[arg(long, conflicts_with_all = ["locations", "start", "end"])]
    filter: Option<PathBuf>,

    /// Export format: csv or tsv
    #[arg(short, long, default_value = "csv")]
    format: String,

    /// Write the export here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print per-location summaries as JSON instead of exporting rows
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Fail on a bad format before doing any work.
    let format: ExportFormat = args.format.parse()?;

    let rows = load_file(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let (dataset, _report) = Dataset::build(rows)?;
    let index = Index::build(Arc::new(dataset));

    let filter = match &args.filter {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading filter {}", path.display()))?;
            serde_json::from_str::<Filter>(&text).context("parsing filter JSON")?
        }
        None => {
            let (first, last) = index
                .date_span()
                .context("dataset has no dates")?;
            Filter::all(args.start.unwrap_or(first), args.end.unwrap_or(last))
                .with_locations(
                    args.locations
                        .iter()
                        .map(|l| l.trim())
                        .filter(|l| !l.is_empty()),
                )
        }
    };

    let view = enrich(query(&index, &filter)?);
    for w in view.warnings() {
        warn!("{w}");
    }
    info!(
        "{} rows across {} locations",
        view.len(),
        view.summaries().len()
    );

    if args.summary {
        let json = serde_json::to_string_pretty(view.summaries())?;
        println!("{json}");
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_to(&view, format, io::BufWriter::new(file))?;
            info!("wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_to(&view, format, &mut lock)?;
            lock.flush()?;
        }
    }

    Ok(())
}
