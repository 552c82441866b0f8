use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use serpatlas::config::{self, AtlasSettings, SerpSettings};
use serpatlas::console::Prompter;
use serpatlas::table::format_columns;
use serpatlas::{
    HttpPageSource, IngestReport, Ingestion, PublishOutcome, Publisher, ResultTable, TableError,
};

#[derive(Parser, Debug)]
#[command(
    name = "serpatlas-ingest",
    about = "Scrape a page and its top search results, then map them with Nomic Atlas"
)]
struct IngestCli {
    #[command(flatten)]
    atlas: AtlasSettings,

    #[command(flatten)]
    serp: SerpSettings,

    /// CSV written with the assembled rows before upload
    #[arg(long, env = "SERPATLAS_OUTPUT", default_value = "top_results.csv")]
    output: PathBuf,

    /// Name given to the new Atlas dataset
    #[arg(long, env = "SERPATLAS_DATASET_NAME", default_value = "serp-results")]
    dataset_name: String,

    /// Publish a previously written CSV instead of scraping
    #[arg(long)]
    from_csv: Option<PathBuf>,
}

fn main() {
    config::init_tracing();
    config::load_dotenv();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = IngestCli::parse();
    let timeout = cli.atlas.timeout();
    let publisher = Publisher::new(cli.atlas.client()?, cli.dataset_name.clone());

    if let Some(path) = &cli.from_csv {
        let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
        let table = match ResultTable::read_csv(file) {
            Ok(table) => table,
            Err(TableError::MissingColumns(missing)) => {
                println!("Missing columns: {}", format_columns(&missing));
                return Ok(());
            }
            Err(err) => return Err(err).with_context(|| format!("failed to read {:?}", path)),
        };
        report_outcome(&publisher.publish(&table));
        return Ok(());
    }

    let mut prompter = Prompter::stdio();
    let url = prompter.ask("Enter your website URL: ")?;
    let phrase = prompter.ask("Enter the keyword related to your website: ")?;

    let ingestion = Ingestion::new(
        HttpPageSource::new(timeout)?,
        cli.serp.client(timeout)?,
        publisher,
    );
    let report = ingestion.run(&url, &phrase, &cli.output)?;
    summarize(&report, &cli.output);
    Ok(())
}

fn summarize(report: &IngestReport, output: &Path) {
    println!(
        "Saved {} rows to {}{}",
        report.table.len(),
        output.display(),
        if report.seed_included {
            " (including your page)"
        } else {
            ""
        }
    );
    println!("Columns in table: {:?}", report.table.columns());
    report_outcome(&report.outcome);
}

fn report_outcome(outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::Submitted(receipt) => {
            println!(
                "Submitted dataset '{}' ({} records), id: {}",
                receipt.name, receipt.records, receipt.dataset_id
            );
            println!(
                "Please wait for an email confirmation regarding the creation of the map (up to 10 minutes). \
                 After receiving it, run serpatlas-explore with the dataset id above."
            );
        }
        PublishOutcome::MissingColumns(missing) => {
            println!("Missing columns: {}", format_columns(missing));
        }
        PublishOutcome::Failed(message) => {
            println!("Error mapping data to Atlas: {message}");
        }
    }
}
