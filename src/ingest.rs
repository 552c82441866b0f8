//! Ingestion pipeline: seed page + search results → CSV → mapping service.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};

use crate::atlas::MappingService;
use crate::metadata::{PageSource, SeedUrl};
use crate::publisher::{PublishOutcome, Publisher};
use crate::serp::{fetch_search_rows, SearchProvider};
use crate::table::ResultTable;

/// Result of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows written to CSV and offered for upload.
    pub table: ResultTable,
    /// Whether the seed page made it into the table.
    pub seed_included: bool,
    /// Upload result.
    pub outcome: PublishOutcome,
}

/// Wires a page source, a search provider and a publisher together.
pub struct Ingestion<P, S, M> {
    pages: P,
    search: S,
    publisher: Publisher<M>,
}

impl<P, S, M> Ingestion<P, S, M>
where
    P: PageSource,
    S: SearchProvider,
    M: MappingService,
{
    /// Creates a pipeline from its collaborators.
    pub fn new(pages: P, search: S, publisher: Publisher<M>) -> Self {
        Self {
            pages,
            search,
            publisher,
        }
    }

    /// Borrow the publisher (and through it the mapping service).
    pub fn publisher(&self) -> &Publisher<M> {
        &self.publisher
    }

    /// Runs the whole stage. An invalid seed URL aborts before any request is made;
    /// every other failure is reported inside the returned [`IngestReport`].
    pub fn run(&self, raw_url: &str, phrase: &str, csv_path: &Path) -> Result<IngestReport> {
        let url = SeedUrl::parse(raw_url)?;

        let metadata = self.pages.page_metadata(&url);
        tracing::debug!(url = url.as_str(), ?metadata, "seed metadata");

        let mut table = ResultTable::new(fetch_search_rows(&self.search, phrase));
        // without search rows there is nothing to compare the seed page against
        let seed_included = !table.is_empty() && table.push_seed(&url, &metadata);
        tracing::info!(rows = table.len(), seed_included, "assembled result table");

        write_table(&table, csv_path)?;

        let outcome = self.publisher.publish(&table);
        Ok(IngestReport {
            table,
            seed_included,
            outcome,
        })
    }

    /// Re-publishes a table loaded from disk instead of scraping.
    pub fn publish_table(&self, table: &ResultTable) -> PublishOutcome {
        self.publisher.publish(table)
    }
}

/// Writes `table` to `path` as CSV, replacing any previous file.
pub fn write_table(table: &ResultTable, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    table
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("failed to write {:?}", path))
}
