//! Row-oriented result table shared by the ingest stages, plus its CSV form.

use std::collections::BTreeSet;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metadata::{PageMetadata, SeedUrl};

/// Columns every uploaded table must carry, in output order.
pub const REQUIRED_COLUMNS: [&str; 4] = ["position", "title", "link", "meta_description"];

/// Older exports used localized headers; they are renamed on read.
const HEADER_ALIASES: &[(&str, &str)] = &[
    ("pozycja", "position"),
    ("tytuł", "title"),
    ("metaopis", "meta_description"),
];

/// One ranked search result (or the appended seed page).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultRow {
    /// 1-based rank.
    pub position: u32,
    /// Result title.
    pub title: String,
    /// Result URL.
    pub link: String,
    /// Snippet or meta description.
    pub meta_description: String,
}

/// Search rows in rank order, optionally followed by the seed page row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    rows: Vec<SearchResultRow>,
}

impl ResultTable {
    /// Wraps already-ranked search rows.
    pub fn new(rows: Vec<SearchResultRow>) -> Self {
        Self { rows }
    }

    /// Appends the seed page when both its title and meta description are known.
    ///
    /// Returns `true` when a row was added.
    pub fn push_seed(&mut self, url: &SeedUrl, metadata: &PageMetadata) -> bool {
        let Some((title, meta)) = metadata.complete() else {
            return false;
        };
        self.rows.push(SearchResultRow {
            position: self.rows.len() as u32 + 1,
            title: title.to_string(),
            link: url.as_str().to_string(),
            meta_description: meta.to_string(),
        });
        true
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[SearchResultRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columns the table exposes. A table built from zero records has none.
    pub fn columns(&self) -> Vec<&'static str> {
        if self.rows.is_empty() {
            Vec::new()
        } else {
            REQUIRED_COLUMNS.to_vec()
        }
    }

    /// Writes the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            // nothing to describe; keep the file empty like an empty frame export
            wtr.flush()?;
            return Ok(());
        }
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Reads a CSV previously written by [`ResultTable::write_csv`] (or a legacy export).
    ///
    /// Header names are renamed through the legacy alias table first; when any
    /// required column is still missing the exact missing set is returned.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|name| canonical_header(name.trim()).to_string())
            .collect();
        let missing = missing_columns(headers.iter().map(String::as_str));
        if !missing.is_empty() {
            return Err(TableError::MissingColumns(missing));
        }

        let index_of = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .unwrap_or_default()
        };
        let (pos_idx, title_idx, link_idx, meta_idx) = (
            index_of("position"),
            index_of("title"),
            index_of("link"),
            index_of("meta_description"),
        );

        let mut rows = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
            let position = field(pos_idx)
                .trim()
                .parse::<u32>()
                .map_err(|_| TableError::BadPosition {
                    line: line + 2,
                    value: field(pos_idx),
                })?;
            rows.push(SearchResultRow {
                position,
                title: field(title_idx),
                link: field(link_idx),
                meta_description: field(meta_idx),
            });
        }
        Ok(Self { rows })
    }
}

fn canonical_header(name: &str) -> &str {
    HEADER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

/// Required columns absent from `present`, sorted.
pub fn missing_columns<'a, I>(present: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: BTreeSet<&str> = present.into_iter().collect();
    REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.contains(*col))
        .map(|col| col.to_string())
        .collect()
}

/// Errors raised while converting tables to and from CSV.
#[derive(Debug, Error)]
pub enum TableError {
    /// Underlying CSV or I/O failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Flush failure on the output writer.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Required columns are absent.
    #[error("missing columns: {}", format_columns(.0))]
    MissingColumns(BTreeSet<String>),
    /// A position cell is not a positive integer.
    #[error("line {line}: invalid position '{value}'")]
    BadPosition {
        /// 1-based CSV line number (header is line 1).
        line: usize,
        /// Offending cell.
        value: String,
    },
}

/// Renders a column set as `{a, b}`.
pub fn format_columns(columns: &BTreeSet<String>) -> String {
    let joined = columns
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{joined}}}")
}
