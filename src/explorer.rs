//! Reloads a hosted dataset and resolves nearest-neighbor tables around a record.

use thiserror::Error;

use crate::atlas::{align_records, AtlasDataset, MappingService};

/// Neighbors requested per query.
pub const NEIGHBOR_COUNT: usize = 30;

/// One resolved neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRow {
    /// Record identifier.
    pub id: String,
    /// Result title.
    pub title: String,
    /// Result URL.
    pub link: String,
    /// Snippet or meta description.
    pub meta_description: String,
    /// Distance from the query record, when the service reported one.
    pub distance: Option<f32>,
}

/// Neighborhood of the active query record; the operand of every analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborTable {
    query_id: String,
    rows: Vec<NeighborRow>,
}

impl NeighborTable {
    /// Builds a table for `query_id`, keeping at most [`NEIGHBOR_COUNT`] rows.
    pub fn new(query_id: impl Into<String>, mut rows: Vec<NeighborRow>) -> Self {
        rows.truncate(NEIGHBOR_COUNT);
        Self {
            query_id: query_id.into(),
            rows,
        }
    }

    /// Record id the neighborhood was built around.
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Rows closest first.
    pub fn rows(&self) -> &[NeighborRow] {
        &self.rows
    }

    /// Whether `id` is the active query record.
    pub fn is_query(&self, id: &str) -> bool {
        id == self.query_id
    }
}

/// Failures while loading datasets or neighborhoods; all of them lead to a re-prompt.
#[derive(Debug, Error)]
pub enum ExploreError {
    /// Blank identifier entered.
    #[error("{0} must not be empty")]
    EmptyId(&'static str),
    /// The service could not load the dataset or its map.
    #[error("could not load dataset '{id}': {message}")]
    Dataset {
        /// Requested dataset id.
        id: String,
        /// Service error text.
        message: String,
    },
    /// The neighbor query or record lookup failed.
    #[error("could not find neighbors of '{id}': {message}")]
    Neighbors {
        /// Requested record id.
        id: String,
        /// Service error text.
        message: String,
    },
}

/// Dataset handle bound to the service it came from.
pub struct Explorer<'a, M: ?Sized> {
    service: &'a M,
    dataset: AtlasDataset,
}

impl<'a, M: MappingService + ?Sized> Explorer<'a, M> {
    /// Loads `dataset_id` and its default map.
    pub fn open(service: &'a M, dataset_id: &str) -> Result<Self, ExploreError> {
        let dataset_id = dataset_id.trim();
        if dataset_id.is_empty() {
            return Err(ExploreError::EmptyId("dataset id"));
        }
        let dataset = service
            .load_dataset(dataset_id)
            .map_err(|err| ExploreError::Dataset {
                id: dataset_id.to_string(),
                message: format!("{err:#}"),
            })?;
        tracing::info!(dataset = %dataset.id, map = %dataset.map_id, "loaded dataset");
        Ok(Self { service, dataset })
    }

    /// Loaded dataset metadata.
    pub fn dataset(&self) -> &AtlasDataset {
        &self.dataset
    }

    /// Queries the [`NEIGHBOR_COUNT`] nearest neighbors of `record_id` and resolves their fields.
    pub fn neighborhood(&self, record_id: &str) -> Result<NeighborTable, ExploreError> {
        let record_id = record_id.trim();
        if record_id.is_empty() {
            return Err(ExploreError::EmptyId("record id"));
        }
        let wrap = |err: anyhow::Error| ExploreError::Neighbors {
            id: record_id.to_string(),
            message: format!("{err:#}"),
        };

        let neighbors = self
            .service
            .nearest_neighbors(&self.dataset, record_id, NEIGHBOR_COUNT)
            .map_err(wrap)?;
        let records = self
            .service
            .get_records(&self.dataset, &neighbors.ids)
            .map_err(wrap)?;

        let rows: Vec<NeighborRow> = align_records(&neighbors.ids, records)
            .into_iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                let record = record?;
                Some(NeighborRow {
                    id: record.id,
                    title: record.title,
                    link: record.link,
                    meta_description: record.meta_description,
                    distance: neighbors.distances.get(idx).copied(),
                })
            })
            .collect();
        tracing::debug!(
            record = record_id,
            requested = neighbors.ids.len(),
            resolved = rows.len(),
            "built neighbor table"
        );
        Ok(NeighborTable::new(record_id, rows))
    }
}
