#![warn(missing_docs)]
//! Core library for serpatlas: scrape a seed page and its search competitors,
//! publish them to Nomic Atlas, and explore nearest-neighbor neighborhoods.

pub mod analysis;
pub mod atlas;
pub mod chart;
pub mod config;
pub mod console;
pub mod explorer;
pub mod ingest;
pub mod menu;
pub mod metadata;
pub mod publisher;
pub mod serp;
pub mod table;

pub use analysis::{AnalysisReport, KeywordError, LengthRange, RangeError, ReportRow, TextField};
pub use atlas::{
    AtlasClient, AtlasDataset, DatasetReceipt, IndexedRecord, MappingService, NeighborSet,
    StoredRecord,
};
pub use chart::Histogram;
pub use console::Prompter;
pub use explorer::{ExploreError, Explorer, NeighborRow, NeighborTable, NEIGHBOR_COUNT};
pub use ingest::{IngestReport, Ingestion};
pub use menu::{MenuChoice, MenuState, Session};
pub use metadata::{HttpPageSource, PageMetadata, PageSource, SeedUrl, SeedUrlError};
pub use publisher::{PublishOutcome, Publisher};
pub use serp::{OrganicResult, SearchProvider, SerpApiClient};
pub use table::{ResultTable, SearchResultRow, TableError, REQUIRED_COLUMNS};
