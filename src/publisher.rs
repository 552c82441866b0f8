//! Turns a result table into indexed records and submits it to the mapping service.

use std::collections::BTreeSet;

use crate::atlas::{DatasetReceipt, IndexedRecord, MappingService};
use crate::table::{format_columns, missing_columns, ResultTable, SearchResultRow};

/// Name of the column the service embeds.
pub const INDEXED_FIELD: &str = "indexed_field";

/// What happened to a publish request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The dataset was accepted; the map is built asynchronously.
    Submitted(DatasetReceipt),
    /// Upload skipped because the table lacks these columns.
    MissingColumns(BTreeSet<String>),
    /// The service rejected the upload.
    Failed(String),
}

impl PublishOutcome {
    /// True when the service accepted the dataset.
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// Concatenates the row fields into the text the service embeds.
pub fn indexed_field(row: &SearchResultRow) -> String {
    format!(
        "{} {} {} {}",
        row.position, row.title, row.link, row.meta_description
    )
}

/// Builds upload records with zero-based string ids.
pub fn indexed_records(table: &ResultTable) -> Vec<IndexedRecord> {
    table
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| IndexedRecord {
            id: idx.to_string(),
            position: row.position,
            title: row.title.clone(),
            link: row.link.clone(),
            meta_description: row.meta_description.clone(),
            indexed_field: indexed_field(row),
        })
        .collect()
}

/// Publishes result tables under a fixed dataset name.
pub struct Publisher<M> {
    service: M,
    dataset_name: String,
}

impl<M: MappingService> Publisher<M> {
    /// Creates a publisher that names new datasets `dataset_name`.
    pub fn new(service: M, dataset_name: impl Into<String>) -> Self {
        Self {
            service,
            dataset_name: dataset_name.into(),
        }
    }

    /// Borrow the underlying service.
    pub fn service(&self) -> &M {
        &self.service
    }

    /// Validates required columns and uploads the table when they are all present.
    pub fn publish(&self, table: &ResultTable) -> PublishOutcome {
        let columns = table.columns();
        tracing::debug!(?columns, rows = table.len(), "publishing result table");
        let missing = missing_columns(columns.iter().copied());
        if !missing.is_empty() {
            tracing::warn!(missing = %format_columns(&missing), "skipping upload");
            return PublishOutcome::MissingColumns(missing);
        }

        let records = indexed_records(table);
        match self
            .service
            .create_dataset(&self.dataset_name, &records, INDEXED_FIELD)
        {
            Ok(receipt) => PublishOutcome::Submitted(receipt),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "dataset upload failed");
                PublishOutcome::Failed(format!("{err:#}"))
            }
        }
    }
}
