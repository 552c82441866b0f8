//! Seed page validation and title/meta-description extraction built on `scraper`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// Placeholder stored when the page has no `<title>` element.
pub const TITLE_NOT_FOUND: &str = "Title not found";
/// Placeholder stored when the page has no `meta[name="description"]` tag.
pub const META_DESCRIPTION_NOT_FOUND: &str = "Meta description not found";

const ACCEPTED_SCHEMES: &[&str] = &["http://", "https://"];

/// Seed URL that passed scheme validation. Only values of this type reach the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUrl {
    raw: String,
    parsed: Url,
}

impl SeedUrl {
    /// Validates that `raw` starts with `http://` or `https://` and parses as a URL.
    pub fn parse(raw: &str) -> Result<Self, SeedUrlError> {
        let raw = raw.trim();
        if !ACCEPTED_SCHEMES
            .iter()
            .any(|prefix| raw.starts_with(prefix))
        {
            return Err(SeedUrlError::Scheme(raw.to_string()));
        }
        let parsed = Url::parse(raw).map_err(|source| SeedUrlError::Malformed {
            url: raw.to_string(),
            source,
        })?;
        Ok(Self {
            raw: raw.to_string(),
            parsed,
        })
    }

    /// URL exactly as the user typed it (trimmed). This is what lands in the seed row.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed form used for the HTTP request.
    pub fn url(&self) -> &Url {
        &self.parsed
    }
}

/// Reasons a seed URL is rejected before any request is made.
#[derive(Debug, Error)]
pub enum SeedUrlError {
    /// The URL does not start with an accepted scheme prefix.
    #[error("invalid URL '{0}': it must start with 'http://' or 'https://'")]
    Scheme(String),
    /// The URL has an accepted prefix but cannot be parsed.
    #[error("invalid URL '{url}': {source}")]
    Malformed {
        /// Offending input.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
}

/// Title and meta description of the seed page. Both are absent when the fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// Text of the `<title>` element, or [`TITLE_NOT_FOUND`].
    pub title: Option<String>,
    /// `content` of the description meta tag, or [`META_DESCRIPTION_NOT_FOUND`].
    pub meta_description: Option<String>,
}

impl PageMetadata {
    /// Metadata for a page that could not be fetched.
    pub fn absent() -> Self {
        Self::default()
    }

    /// Returns `(title, meta_description)` when both are present and non-empty.
    pub fn complete(&self) -> Option<(&str, &str)> {
        match (self.title.as_deref(), self.meta_description.as_deref()) {
            (Some(title), Some(meta)) if !title.is_empty() && !meta.is_empty() => {
                Some((title, meta))
            }
            _ => None,
        }
    }
}

/// Anything that can turn a validated seed URL into page metadata.
///
/// Implementations must not fail: fetch problems are logged and reported as
/// [`PageMetadata::absent`].
pub trait PageSource {
    /// Fetches metadata for `url`.
    fn page_metadata(&self, url: &SeedUrl) -> PageMetadata;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn page_metadata(&self, url: &SeedUrl) -> PageMetadata {
        (**self).page_metadata(url)
    }
}

/// Blocking HTTP page source.
#[derive(Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    /// Builds a page source whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build page HTTP client")?;
        Ok(Self { client })
    }

    fn fetch_html(&self, url: &SeedUrl) -> Result<String> {
        let resp = self
            .client
            .get(url.url().clone())
            .send()
            .with_context(|| format!("failed to fetch {}", url.as_str()))?;
        let status = resp.status();
        anyhow::ensure!(status.is_success(), "{} returned {}", url.as_str(), status);
        resp.text()
            .with_context(|| format!("failed to read body of {}", url.as_str()))
    }
}

impl PageSource for HttpPageSource {
    fn page_metadata(&self, url: &SeedUrl) -> PageMetadata {
        match self.fetch_html(url) {
            Ok(html) => extract_metadata(&html),
            Err(err) => {
                tracing::warn!(url = url.as_str(), error = %format!("{err:#}"), "page metadata fetch failed");
                eprintln!("Error fetching page metadata: {err:#}");
                PageMetadata::absent()
            }
        }
    }
}

/// Pulls the title and description meta tag out of an HTML document.
pub fn extract_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").expect("title selector");
    let meta_selector = Selector::parse("meta").expect("meta selector");

    let title = document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_else(|| TITLE_NOT_FOUND.to_string());

    // attribute selectors are case-sensitive on values, so match by hand
    let meta_description = match document
        .select(&meta_selector)
        .find(|el| el.value().attr("name") == Some("description"))
    {
        Some(el) => el.value().attr("content").map(str::to_string),
        None => Some(META_DESCRIPTION_NOT_FOUND.to_string()),
    };

    PageMetadata {
        title: Some(title),
        meta_description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_urls_without_http_scheme() {
        for raw in ["example.com", "ftp://example.com", "www.example.com", "", "HTTP//x"] {
            assert!(
                matches!(SeedUrl::parse(raw), Err(SeedUrlError::Scheme(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_http_and_https() {
        let url = SeedUrl::parse(" https://example.com/page ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
        assert_eq!(url.url().host_str(), Some("example.com"));
        assert!(SeedUrl::parse("http://localhost:8080").is_ok());
    }

    #[test]
    fn extracts_title_and_description() {
        let html = r#"
            <html><head>
              <title> Widgets &amp; Co </title>
              <meta name="keywords" content="ignored">
              <meta name="description" content="We sell widgets.">
            </head><body></body></html>
        "#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title.as_deref(), Some("Widgets & Co"));
        assert_eq!(meta.meta_description.as_deref(), Some("We sell widgets."));
        assert_eq!(meta.complete(), Some(("Widgets & Co", "We sell widgets.")));
    }

    #[test]
    fn falls_back_to_sentinels() {
        let meta = extract_metadata("<html><body><p>bare</p></body></html>");
        assert_eq!(meta.title.as_deref(), Some(TITLE_NOT_FOUND));
        assert_eq!(
            meta.meta_description.as_deref(),
            Some(META_DESCRIPTION_NOT_FOUND)
        );
    }

    #[test]
    fn description_without_content_is_absent() {
        let meta = extract_metadata(r#"<title>t</title><meta name="description">"#);
        assert_eq!(meta.meta_description, None);
        assert_eq!(meta.complete(), None);
    }

    #[test]
    fn unreachable_page_yields_absent_pair() {
        let source = HttpPageSource::new(Duration::from_secs(2)).unwrap();
        let url = SeedUrl::parse("http://127.0.0.1:1/").unwrap();
        assert_eq!(source.page_metadata(&url), PageMetadata::absent());
    }
}
