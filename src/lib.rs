//! # notes-dl
//!
//! Backend library for scraping social-media notes: fetch posts by URL, by
//! owner, or by keyword search, export one spreadsheet row per note and
//! download the referenced media files.
//!
//! ## Design Philosophy
//!
//! notes-dl is designed to be:
//! - **Deliberately sequential** - One request in flight at a time, with a
//!   randomized pause between items, to respect the vendor's rate limits
//! - **Crash-tolerant** - Spreadsheet rows are flushed as they are written,
//!   so an interrupted run keeps everything already fetched
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use notes_dl::{Config, NoteScraper, SaveMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new("web_session=...; a1=...");
//!     let scraper = NoteScraper::new(config)?;
//!
//!     let urls = vec![
//!         "https://www.xiaohongshu.com/explore/683fe17f0000000023017c6a?xsec_token=AB...".to_string(),
//!     ];
//!     let summary = scraper
//!         .scrape_notes(&urls, "all".parse::<SaveMode>()?, "test")
//!         .await?;
//!
//!     println!("fetched {} of {}", summary.succeeded, summary.attempted);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Vendor API client
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Retrying note fetcher
pub mod fetcher;
/// Dataset folder renaming utility
pub mod folder_cleanup;
/// Field normalization
pub mod normalize;
/// Retry logic with exponential backoff
pub mod retry;
/// Batch runner
pub mod runner;
/// Scraper facade
pub mod scraper;
/// Output sinks (spreadsheet rows, media files)
pub mod sink;
/// Core data types
pub mod types;

// Re-export commonly used types
pub use api::{ApiEnvelope, NoteApi, NoteStub};
pub use config::{
    Config, FlushStrategy, MediaFilter, OutputConfig, PacingConfig, RetryConfig, SaveMode,
};
pub use error::{Error, Result};
pub use folder_cleanup::{clean_media_folders, CleanupStats};
pub use retry::IsRetryable;
pub use runner::BatchSummary;
pub use scraper::NoteScraper;
pub use types::{
    Distance, GeoPoint, Note, NoteKind, NoteKindFilter, NoteRef, RecencyWindow, SearchFilters,
    SortOrder, VisibilityScope,
};
