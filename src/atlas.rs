//! Hosted embedding-map service (Nomic Atlas) client and the trait the pipeline talks to.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Row submitted to the mapping service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedRecord {
    /// Service-side record identifier.
    #[serde(rename = "id_")]
    pub id: String,
    /// 1-based search rank.
    pub position: u32,
    /// Result title.
    pub title: String,
    /// Result URL.
    pub link: String,
    /// Snippet or meta description.
    pub meta_description: String,
    /// Text the service embeds.
    pub indexed_field: String,
}

/// Acknowledgement for a submitted dataset; the map itself is built asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReceipt {
    /// Identifier to hand to the explorer once the map is ready.
    pub dataset_id: String,
    /// Human-readable dataset name.
    pub name: String,
    /// Number of records uploaded.
    pub records: usize,
}

/// Loaded dataset plus its default map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasDataset {
    /// Dataset identifier.
    pub id: String,
    /// Dataset display name.
    pub name: String,
    /// Identifier of the first map (projection) built over the dataset.
    pub map_id: String,
}

/// Nearest-neighbor ids with parallel distances, closest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborSet {
    /// Neighbor record ids.
    pub ids: Vec<String>,
    /// Distances aligned with `ids`.
    pub distances: Vec<f32>,
}

/// Stored fields of one record as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredRecord {
    /// Record identifier.
    #[serde(rename = "id_")]
    pub id: String,
    /// Result title.
    #[serde(default)]
    pub title: String,
    /// Result URL.
    #[serde(default)]
    pub link: String,
    /// Snippet or meta description.
    #[serde(default)]
    pub meta_description: String,
}

/// Operations the pipeline needs from the hosted mapping service.
pub trait MappingService {
    /// Uploads `records` and requests a map embedding `indexed_field`.
    fn create_dataset(
        &self,
        name: &str,
        records: &[IndexedRecord],
        indexed_field: &str,
    ) -> Result<DatasetReceipt>;

    /// Reloads a dataset and its default map by identifier.
    fn load_dataset(&self, dataset_id: &str) -> Result<AtlasDataset>;

    /// Runs a k-nearest-neighbor query around `record_id` in the dataset's map.
    fn nearest_neighbors(
        &self,
        dataset: &AtlasDataset,
        record_id: &str,
        k: usize,
    ) -> Result<NeighborSet>;

    /// Fetches stored fields for `ids`. Unknown ids are omitted from the result.
    fn get_records(&self, dataset: &AtlasDataset, ids: &[String]) -> Result<Vec<StoredRecord>>;
}

impl<T: MappingService + ?Sized> MappingService for &T {
    fn create_dataset(
        &self,
        name: &str,
        records: &[IndexedRecord],
        indexed_field: &str,
    ) -> Result<DatasetReceipt> {
        (**self).create_dataset(name, records, indexed_field)
    }

    fn load_dataset(&self, dataset_id: &str) -> Result<AtlasDataset> {
        (**self).load_dataset(dataset_id)
    }

    fn nearest_neighbors(
        &self,
        dataset: &AtlasDataset,
        record_id: &str,
        k: usize,
    ) -> Result<NeighborSet> {
        (**self).nearest_neighbors(dataset, record_id, k)
    }

    fn get_records(&self, dataset: &AtlasDataset, ids: &[String]) -> Result<Vec<StoredRecord>> {
        (**self).get_records(dataset, ids)
    }
}

/// Blocking Nomic Atlas REST client.
#[derive(Clone)]
pub struct AtlasClient {
    client: Client,
    base_url: String,
}

impl AtlasClient {
    /// Builds a new Atlas client.
    ///
    /// # Arguments
    /// * `api_key` - Bearer token (usually from `NOMIC_API_KEY`)
    /// * `base_url` - API root, e.g. `https://api-atlas.nomic.ai`
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing Nomic API key");
        anyhow::ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "Atlas base must be an http(s) URL"
        );
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid Nomic API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build Atlas HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .with_context(|| format!("failed to call Atlas {path}"))?;
        decode(resp, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .with_context(|| format!("failed to call Atlas {path}"))?;
        decode(resp, path)
    }
}

fn decode<T: DeserializeOwned>(resp: reqwest::blocking::Response, path: &str) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp
            .text()
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        anyhow::bail!("Atlas {} returned {}: {}", path, status, body);
    }
    resp.json()
        .with_context(|| format!("failed to parse Atlas {path} response"))
}

impl MappingService for AtlasClient {
    fn create_dataset(
        &self,
        name: &str,
        records: &[IndexedRecord],
        indexed_field: &str,
    ) -> Result<DatasetReceipt> {
        anyhow::ensure!(!records.is_empty(), "refusing to create an empty dataset");
        let created: CreateProjectResponse = self.post(
            "/v1/project/create",
            &json!({
                "project_name": name,
                "description": "Top search results mapped by serpatlas",
                "unique_id_field": "id_",
                "modality": "text",
                "is_public": false,
            }),
        )?;
        tracing::info!(dataset_id = %created.project_id, "created Atlas dataset");

        let _: serde_json::Value = self.post(
            "/v1/project/data/add/json",
            &json!({ "project_id": created.project_id, "data": records }),
        )?;
        let _: serde_json::Value = self.post(
            "/v1/project/index/create",
            &json!({
                "project_id": created.project_id,
                "index_name": name,
                "indexed_field": indexed_field,
                "atomizer_strategies": ["document"],
                "model": "nomic-embed-text-v1.5",
                "build_topic_model": false,
            }),
        )?;

        Ok(DatasetReceipt {
            dataset_id: created.project_id,
            name: name.to_string(),
            records: records.len(),
        })
    }

    fn load_dataset(&self, dataset_id: &str) -> Result<AtlasDataset> {
        let dataset_id = dataset_id.trim();
        anyhow::ensure!(!dataset_id.is_empty(), "dataset id is required");
        let project: ProjectInfo = self.get(&format!("/v1/project/{dataset_id}"))?;
        let map_id = project
            .atlas_indices
            .iter()
            .flat_map(|index| index.projections.iter())
            .map(|projection| projection.id.clone())
            .next()
            .ok_or_else(|| anyhow!("dataset {dataset_id} has no map yet"))?;
        Ok(AtlasDataset {
            id: project.id,
            name: project.project_name,
            map_id,
        })
    }

    fn nearest_neighbors(
        &self,
        dataset: &AtlasDataset,
        record_id: &str,
        k: usize,
    ) -> Result<NeighborSet> {
        let resp: TopKResponse = self.post(
            "/v1/project/search/topk",
            &json!({
                "projection_id": dataset.map_id,
                "k": k,
                "datum_ids": [record_id],
            }),
        )?;
        let ids = resp
            .neighbors
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no neighbors returned for {record_id}"))?;
        let distances = resp.distances.into_iter().next().unwrap_or_default();
        anyhow::ensure!(
            distances.is_empty() || distances.len() == ids.len(),
            "Atlas returned {} distances for {} neighbors",
            distances.len(),
            ids.len()
        );
        Ok(NeighborSet { ids, distances })
    }

    fn get_records(&self, dataset: &AtlasDataset, ids: &[String]) -> Result<Vec<StoredRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let resp: DataGetResponse = self.post(
            "/v1/project/data/get",
            &json!({ "project_id": dataset.id, "datum_ids": ids }),
        )?;
        Ok(resp.datums)
    }
}

/// Orders `records` to follow `ids`, dropping ids the service did not return.
pub fn align_records(ids: &[String], records: Vec<StoredRecord>) -> Vec<Option<StoredRecord>> {
    let mut by_id: HashMap<String, StoredRecord> = records
        .into_iter()
        .map(|record| (record.id.clone(), record))
        .collect();
    ids.iter().map(|id| by_id.remove(id)).collect()
}

#[derive(Debug, Deserialize)]
struct CreateProjectResponse {
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    id: String,
    #[serde(default)]
    project_name: String,
    #[serde(default)]
    atlas_indices: Vec<AtlasIndex>,
}

#[derive(Debug, Deserialize)]
struct AtlasIndex {
    #[serde(default)]
    projections: Vec<Projection>,
}

#[derive(Debug, Deserialize)]
struct Projection {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TopKResponse {
    neighbors: Vec<Vec<String>>,
    #[serde(default)]
    distances: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct DataGetResponse {
    #[serde(default)]
    datums: Vec<StoredRecord>,
}
