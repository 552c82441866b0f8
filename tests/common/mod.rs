#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use anyhow::{anyhow, Result};
use serpatlas::{
    AtlasDataset, DatasetReceipt, IndexedRecord, MappingService, NeighborSet, OrganicResult,
    PageMetadata, PageSource, SearchProvider, SeedUrl, StoredRecord,
};

/// Page source that counts calls and returns canned metadata.
pub struct FakePages {
    pub metadata: PageMetadata,
    pub calls: Cell<usize>,
}

impl FakePages {
    pub fn reachable(title: &str, meta: &str) -> Self {
        Self {
            metadata: PageMetadata {
                title: Some(title.to_string()),
                meta_description: Some(meta.to_string()),
            },
            calls: Cell::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            metadata: PageMetadata::absent(),
            calls: Cell::new(0),
        }
    }
}

impl PageSource for FakePages {
    fn page_metadata(&self, _url: &SeedUrl) -> PageMetadata {
        self.calls.set(self.calls.get() + 1);
        self.metadata.clone()
    }
}

/// Search provider returning `n` numbered hits, or failing.
pub struct FakeSearch {
    pub hits: Option<usize>,
    pub calls: Cell<usize>,
}

impl FakeSearch {
    pub fn with_hits(n: usize) -> Self {
        Self {
            hits: Some(n),
            calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: None,
            calls: Cell::new(0),
        }
    }
}

impl SearchProvider for FakeSearch {
    fn organic_results(&self, phrase: &str, limit: usize) -> Result<Vec<OrganicResult>> {
        self.calls.set(self.calls.get() + 1);
        let n = self.hits.ok_or_else(|| anyhow!("provider down"))?;
        Ok((1..=n.min(limit))
            .map(|i| OrganicResult {
                title: Some(format!("{phrase} result {i}")),
                link: Some(format!("https://site{i}.test/{phrase}")),
                snippet: Some(format!("All about {phrase}, part {i}")),
            })
            .collect())
    }
}

/// In-memory mapping service holding one dataset `ds-1` whose records are all
/// mutual neighbors, ordered by id distance.
#[derive(Default)]
pub struct FakeAtlas {
    pub uploads: RefCell<Vec<Vec<IndexedRecord>>>,
    pub records: Vec<StoredRecord>,
}

impl FakeAtlas {
    pub fn with_records(records: Vec<StoredRecord>) -> Self {
        Self {
            uploads: RefCell::new(Vec::new()),
            records,
        }
    }
}

pub fn stored(id: &str, title: &str, link: &str, meta: &str) -> StoredRecord {
    StoredRecord {
        id: id.to_string(),
        title: title.to_string(),
        link: link.to_string(),
        meta_description: meta.to_string(),
    }
}

impl MappingService for FakeAtlas {
    fn create_dataset(
        &self,
        name: &str,
        records: &[IndexedRecord],
        _indexed_field: &str,
    ) -> Result<DatasetReceipt> {
        self.uploads.borrow_mut().push(records.to_vec());
        Ok(DatasetReceipt {
            dataset_id: "ds-1".to_string(),
            name: name.to_string(),
            records: records.len(),
        })
    }

    fn load_dataset(&self, dataset_id: &str) -> Result<AtlasDataset> {
        if dataset_id != "ds-1" {
            return Err(anyhow!("dataset {dataset_id} not found"));
        }
        Ok(AtlasDataset {
            id: "ds-1".to_string(),
            name: "serp-results".to_string(),
            map_id: "map-1".to_string(),
        })
    }

    fn nearest_neighbors(
        &self,
        _dataset: &AtlasDataset,
        record_id: &str,
        k: usize,
    ) -> Result<NeighborSet> {
        let anchor: i64 = record_id
            .parse()
            .map_err(|_| anyhow!("unknown record {record_id}"))?;
        if !self.records.iter().any(|r| r.id == record_id) {
            return Err(anyhow!("unknown record {record_id}"));
        }
        let mut ids: Vec<(i64, String)> = self
            .records
            .iter()
            .map(|r| {
                let id: i64 = r.id.parse().unwrap_or(i64::MAX / 2);
                ((id - anchor).abs(), r.id.clone())
            })
            .collect();
        ids.sort();
        ids.truncate(k);
        Ok(NeighborSet {
            distances: ids.iter().map(|(d, _)| *d as f32).collect(),
            ids: ids.into_iter().map(|(_, id)| id).collect(),
        })
    }

    fn get_records(&self, _dataset: &AtlasDataset, ids: &[String]) -> Result<Vec<StoredRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }
}
