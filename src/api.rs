//! Vendor API client
//!
//! Thin wrapper over the three undocumented web API calls this crate
//! consumes: fetch-note-by-reference, list-notes-by-owner and
//! search-notes-by-keyword. Every response arrives as a JSON envelope with a
//! success flag, a message and a nested data payload; the envelope is parsed
//! into [`ApiEnvelope`] and validated by the callers, never poked at as a
//! raw dictionary.
//!
//! The exact schema is owned by the vendor. Authentication is out of scope:
//! the caller's cookie string is forwarded verbatim.

use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{NoteRef, SearchFilters};

/// Timeout for individual HTTP requests against the vendor
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Results per search page, fixed by the vendor
const SEARCH_PAGE_SIZE: usize = 20;

/// Page size for owner-notes enumeration
const USER_NOTES_PAGE_SIZE: usize = 30;

/// Parsed vendor response envelope
#[derive(Clone, Debug, Deserialize)]
pub struct ApiEnvelope {
    /// Overall call success flag
    #[serde(default)]
    pub success: bool,
    /// Vendor message, usually only meaningful on failure
    #[serde(default)]
    pub msg: String,
    /// Vendor status code
    #[serde(default)]
    pub code: i64,
    /// Nested data payload; absent on some failures
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ApiEnvelope {
    /// Unwrap the data payload, mapping the two envelope-level faults
    pub(crate) fn into_data(self) -> Result<serde_json::Value> {
        if !self.success {
            return Err(Error::ApiFailure(self.msg));
        }
        self.data.ok_or(Error::MissingData)
    }
}

/// A note id + access token pair from a listing endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct NoteStub {
    /// Note identifier
    #[serde(default)]
    pub note_id: String,
    /// Per-note access token
    #[serde(default)]
    pub xsec_token: String,
}

/// HTTP client for the vendor API
#[derive(Clone, Debug)]
pub struct NoteApi {
    client: reqwest::Client,
    base_url: String,
    cookies: String,
}

impl NoteApi {
    /// Build the client from run configuration
    ///
    /// Applies the request timeout and, when configured, the proxy to every
    /// call made through this instance (media downloads included).
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookies: config.cookies.clone(),
        })
    }

    /// The underlying HTTP client, shared with the media sink
    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Fetch one note's raw envelope by reference
    pub async fn note_feed(&self, note: &NoteRef) -> Result<ApiEnvelope> {
        let body = json!({
            "source_note_id": note.note_id,
            "xsec_token": note.xsec_token,
            "xsec_source": "pc_feed",
            "image_formats": ["jpg", "webp", "avif"],
        });

        let envelope = self
            .client
            .post(format!("{}/api/sns/web/v1/feed", self.base_url))
            .header(reqwest::header::COOKIE, &self.cookies)
            .json(&body)
            .send()
            .await?
            .json::<ApiEnvelope>()
            .await?;

        tracing::debug!(note_id = %note.note_id, success = envelope.success, "fetched note envelope");
        Ok(envelope)
    }

    /// Enumerate all notes for one owner, following cursor pagination
    pub async fn user_notes(&self, user_id: &str) -> Result<Vec<NoteStub>> {
        let mut stubs = Vec::new();
        let mut cursor = String::new();

        loop {
            let envelope = self
                .client
                .get(format!("{}/api/sns/web/v1/user_posted", self.base_url))
                .header(reqwest::header::COOKIE, &self.cookies)
                .query(&[
                    ("num", USER_NOTES_PAGE_SIZE.to_string().as_str()),
                    ("cursor", cursor.as_str()),
                    ("user_id", user_id),
                    ("image_formats", "jpg,webp,avif"),
                ])
                .send()
                .await?
                .json::<ApiEnvelope>()
                .await?;

            let data = envelope.into_data()?;

            let page: Vec<NoteStub> = data
                .get("notes")
                .cloned()
                .map(serde_json::from_value)
                .transpose()?
                .unwrap_or_default();
            let page_len = page.len();
            stubs.extend(page);

            let has_more = data.get("has_more").and_then(|v| v.as_bool()).unwrap_or(false);
            cursor = data
                .get("cursor")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            tracing::debug!(user_id, page_len, total = stubs.len(), has_more, "user notes page");

            if !has_more || page_len == 0 {
                break;
            }
        }

        Ok(stubs)
    }

    /// Search notes by keyword, paging until `require_num` raw results
    ///
    /// Returns raw result items (which may include non-note kinds such as
    /// users or ads); the caller filters by model type. The list is
    /// truncated to `require_num` before filtering, matching how many
    /// results the vendor UI would have shown.
    pub async fn search_notes(
        &self,
        keyword: &str,
        require_num: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<serde_json::Value>> {
        filters.validate()?;

        let search_id = generate_search_id();
        let mut items: Vec<serde_json::Value> = Vec::new();
        let mut page = 1;

        while items.len() < require_num {
            let mut body = json!({
                "keyword": keyword,
                "page": page,
                "page_size": SEARCH_PAGE_SIZE,
                "search_id": search_id,
                "sort": filters.sort.to_i32(),
                "note_type": filters.kind.to_i32(),
                "note_time": filters.recency.to_i32(),
                "note_range": filters.scope.to_i32(),
                "pos_distance": filters.distance.to_i32(),
            });
            if let Some(geo) = &filters.geo {
                body["geo"] = json!({
                    "latitude": geo.latitude,
                    "longitude": geo.longitude,
                });
            }

            let envelope = self
                .client
                .post(format!("{}/api/sns/web/v1/search/notes", self.base_url))
                .header(reqwest::header::COOKIE, &self.cookies)
                .json(&body)
                .send()
                .await?
                .json::<ApiEnvelope>()
                .await?;

            let data = envelope.into_data()?;

            let page_items = data
                .get("items")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let page_len = page_items.len();
            items.extend(page_items);

            let has_more = data.get("has_more").and_then(|v| v.as_bool()).unwrap_or(false);
            tracing::debug!(keyword, page, page_len, total = items.len(), has_more, "search page");

            if !has_more || page_len == 0 {
                break;
            }
            page += 1;
        }

        items.truncate(require_num);
        Ok(items)
    }
}

/// Random per-search session id, as the web frontend generates one
fn generate_search_id() -> String {
    let mut rng = rand::thread_rng();
    format!("{:016x}{:08x}", rng.gen::<u64>(), rng.gen::<u32>())
}
