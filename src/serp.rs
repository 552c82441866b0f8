//! Organic search results from a ranked-search provider (SerpApi).

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::table::SearchResultRow;

/// Number of organic results requested per phrase.
pub const TOP_RESULTS: usize = 30;

/// Placeholder for results without a title.
pub const NO_TITLE: &str = "No title";
/// Placeholder for results without a link.
pub const NO_LINK: &str = "No link";
/// Placeholder for results without a snippet.
pub const NO_DESCRIPTION: &str = "No description";

/// Single organic hit as the provider reports it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OrganicResult {
    /// Result title.
    #[serde(default)]
    pub title: Option<String>,
    /// Target URL.
    #[serde(default)]
    pub link: Option<String>,
    /// Snippet shown under the result, used as the meta description.
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Ranked-search backend returning organic results in rank order.
pub trait SearchProvider {
    /// Returns up to `limit` organic results for `phrase`.
    fn organic_results(&self, phrase: &str, limit: usize) -> Result<Vec<OrganicResult>>;
}

impl<T: SearchProvider + ?Sized> SearchProvider for &T {
    fn organic_results(&self, phrase: &str, limit: usize) -> Result<Vec<OrganicResult>> {
        (**self).organic_results(phrase, limit)
    }
}

/// Blocking SerpApi client using the Google engine.
#[derive(Clone)]
pub struct SerpApiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl SerpApiClient {
    /// Builds a new SerpApi client.
    ///
    /// # Arguments
    /// * `api_key` - SerpApi private key (usually from `SERPAPI_API_KEY`)
    /// * `base_url` - API root, e.g. `https://serpapi.com`
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing SerpApi API key");
        anyhow::ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "SerpApi base must be an http(s) URL"
        );
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build SerpApi HTTP client")?;
        let endpoint = format!("{}/search.json", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.trim().to_string(),
        })
    }
}

impl SearchProvider for SerpApiClient {
    fn organic_results(&self, phrase: &str, limit: usize) -> Result<Vec<OrganicResult>> {
        let num = limit.to_string();
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", phrase),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .context("failed to call SerpApi")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("SerpApi returned {}: {}", status, body);
        }
        let parsed: SerpResponse = resp.json().context("failed to parse SerpApi response")?;
        if let Some(error) = parsed.error {
            anyhow::bail!("SerpApi error: {error}");
        }
        Ok(parsed.organic_results)
    }
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

/// Converts provider hits into rows with contiguous 1-based positions.
pub fn rows_from_results(results: Vec<OrganicResult>, limit: usize) -> Vec<SearchResultRow> {
    results
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, result)| SearchResultRow {
            position: idx as u32 + 1,
            title: result.title.unwrap_or_else(|| NO_TITLE.to_string()),
            link: result.link.unwrap_or_else(|| NO_LINK.to_string()),
            meta_description: result
                .snippet
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        })
        .collect()
}

/// Fetches the top results for `phrase`; provider failures yield an empty list.
pub fn fetch_search_rows<P: SearchProvider + ?Sized>(
    provider: &P,
    phrase: &str,
) -> Vec<SearchResultRow> {
    match provider.organic_results(phrase, TOP_RESULTS) {
        Ok(results) => {
            tracing::debug!(phrase, count = results.len(), "received organic results");
            rows_from_results(results, TOP_RESULTS)
        }
        Err(err) => {
            tracing::warn!(phrase, error = %format!("{err:#}"), "search provider failed");
            eprintln!("Error fetching search results: {err:#}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl SearchProvider for Failing {
        fn organic_results(&self, _phrase: &str, _limit: usize) -> Result<Vec<OrganicResult>> {
            anyhow::bail!("quota exhausted")
        }
    }

    struct Fixed(usize);

    impl SearchProvider for Fixed {
        fn organic_results(&self, _phrase: &str, limit: usize) -> Result<Vec<OrganicResult>> {
            Ok((0..self.0.min(limit))
                .map(|i| OrganicResult {
                    title: Some(format!("t{i}")),
                    link: Some(format!("https://site{i}.test")),
                    snippet: Some(format!("s{i}")),
                })
                .collect())
        }
    }

    #[test]
    fn positions_are_contiguous_from_one() {
        for n in [0usize, 1, 7, 30] {
            let rows = fetch_search_rows(&Fixed(n), "widgets");
            assert_eq!(rows.len(), n);
            let positions: Vec<u32> = rows.iter().map(|r| r.position).collect();
            assert_eq!(positions, (1..=n as u32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let rows = rows_from_results(
            vec![OrganicResult {
                title: None,
                link: Some("https://a.test".into()),
                snippet: None,
            }],
            TOP_RESULTS,
        );
        assert_eq!(rows[0].title, NO_TITLE);
        assert_eq!(rows[0].link, "https://a.test");
        assert_eq!(rows[0].meta_description, NO_DESCRIPTION);
    }

    #[test]
    fn extra_results_are_truncated() {
        let results = vec![OrganicResult::default(); 35];
        assert_eq!(rows_from_results(results, TOP_RESULTS).len(), TOP_RESULTS);
    }

    #[test]
    fn provider_failure_is_not_fatal() {
        assert!(fetch_search_rows(&Failing, "widgets").is_empty());
    }

    #[test]
    fn parses_serpapi_payload() {
        let payload = r#"{
            "search_metadata": {"status": "Success"},
            "organic_results": [
                {"position": 1, "title": "A", "link": "https://a.test", "snippet": "alpha"},
                {"position": 2, "title": "B", "link": "https://b.test"}
            ]
        }"#;
        let parsed: SerpResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.organic_results.len(), 2);
        assert_eq!(parsed.organic_results[1].snippet, None);

        let empty: SerpResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.organic_results.is_empty());
    }
}
