//! Scraper facade
//!
//! [`NoteScraper`] ties the query sources, the retrying fetcher and the
//! sinks together. Three entry points mirror the three ways a run can be
//! seeded: an explicit URL list, everything one owner posted, or a keyword
//! search. Each resolves to an ordered reference list consumed by the batch
//! runner.

use serde_json::Value;

use crate::api::NoteApi;
use crate::config::{Config, SaveMode};
use crate::error::{Error, Result};
use crate::runner::{run_batch, BatchSummary};
use crate::types::{NoteRef, SearchFilters};

/// Sequential scraper over the vendor's note API
#[derive(Clone, Debug)]
pub struct NoteScraper {
    api: NoteApi,
    config: Config,
}

impl NoteScraper {
    /// Build a scraper from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let api = NoteApi::new(&config)?;
        Ok(Self { api, config })
    }

    /// Scrape an explicit list of note URLs, in order
    ///
    /// `base_name` names the spreadsheet file and must be non-empty whenever
    /// the save mode produces spreadsheet output. A URL that fails to parse
    /// is logged and skipped like any other per-item failure; it still
    /// counts toward the summary's attempted total.
    pub async fn scrape_notes(
        &self,
        note_urls: &[String],
        save_mode: SaveMode,
        base_name: &str,
    ) -> Result<BatchSummary> {
        let mut refs = Vec::with_capacity(note_urls.len());
        let mut unparsable = 0;
        for note_url in note_urls {
            match NoteRef::parse(note_url) {
                Ok(note_ref) => refs.push(note_ref),
                Err(e) => {
                    unparsable += 1;
                    tracing::warn!(url = %note_url, error = %e, "invalid note URL, skipping");
                }
            }
        }

        let mut summary = run_batch(&self.api, &self.config, &refs, save_mode, base_name).await?;
        summary.attempted += unparsable;
        Ok(summary)
    }

    /// Scrape every note posted by one owner
    ///
    /// The spreadsheet base name defaults to the owner's identifier. Returns
    /// the resolved references alongside the batch summary.
    pub async fn scrape_user_notes(
        &self,
        user_url: &str,
        save_mode: SaveMode,
    ) -> Result<(Vec<NoteRef>, BatchSummary)> {
        let user_id = extract_user_id(user_url)?;
        let stubs = self.api.user_notes(&user_id).await?;
        let refs: Vec<NoteRef> = stubs
            .iter()
            .map(|s| NoteRef::from_parts(&self.config.base_url, &s.note_id, &s.xsec_token))
            .collect();
        tracing::info!(user_id = %user_id, notes = refs.len(), "resolved owner notes");

        let summary = run_batch(&self.api, &self.config, &refs, save_mode, &user_id).await?;
        Ok((refs, summary))
    }

    /// Scrape up to `require_num` search results for a keyword
    ///
    /// Search results may contain kinds other than notes (users, ads); only
    /// genuine notes are resolved and fetched. The spreadsheet base name
    /// defaults to the keyword. Returns the resolved references alongside
    /// the batch summary.
    pub async fn scrape_search_notes(
        &self,
        query: &str,
        require_num: usize,
        filters: &SearchFilters,
        save_mode: SaveMode,
    ) -> Result<(Vec<NoteRef>, BatchSummary)> {
        filters.validate()?;
        let items = self.api.search_notes(query, require_num, filters).await?;
        let refs: Vec<NoteRef> = items
            .iter()
            .filter(|item| item.get("model_type").and_then(Value::as_str) == Some("note"))
            .filter_map(|item| {
                let id = item.get("id").and_then(Value::as_str)?;
                let token = item
                    .get("xsec_token")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(NoteRef::from_parts(&self.config.base_url, id, token))
            })
            .collect();
        tracing::info!(query, requested = require_num, notes = refs.len(), "resolved search notes");

        let summary = run_batch(&self.api, &self.config, &refs, save_mode, query).await?;
        Ok((refs, summary))
    }
}

/// Owner identifier from a profile URL (last path segment, query stripped)
fn extract_user_id(user_url: &str) -> Result<String> {
    let parsed = url::Url::parse(user_url).map_err(|e| Error::InvalidUrl {
        url: user_url.to_string(),
        reason: e.to_string(),
    })?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidUrl {
            url: user_url.to_string(),
            reason: "no user id path segment".to_string(),
        })
}
