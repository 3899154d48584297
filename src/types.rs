//! Core data types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of a note
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// A video note (one or more video streams plus a cover frame)
    Video,
    /// A standard image note
    #[default]
    Normal,
}

impl NoteKind {
    /// Wire/display string for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Video => "video",
            NoteKind::Normal => "normal",
        }
    }
}

/// One fetched note, normalized to display-ready scalar fields
///
/// Constructed per fetch by the normalizer, consumed immediately by the
/// sinks, then dropped. Counters default to zero when the source omits them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Note {
    /// Note identifier, unique within one run's output
    pub note_id: String,
    /// The exact source URL this note was fetched from
    pub url: String,
    /// Video or standard note
    pub kind: NoteKind,
    /// Owner's user identifier
    pub user_id: String,
    /// Owner's profile URL
    pub user_url: String,
    /// Owner's display name
    pub nickname: String,
    /// Owner's avatar URL
    pub avatar_url: String,
    /// Note title
    pub title: String,
    /// Note description
    pub desc: String,
    /// Like count
    pub like_count: u64,
    /// Collect (bookmark) count
    pub collect_count: u64,
    /// Comment count
    pub comment_count: u64,
    /// Share count
    pub share_count: u64,
    /// Video cover image URL (video notes only)
    pub video_cover_url: String,
    /// Video stream URLs in source order
    pub video_urls: Vec<String>,
    /// Image URLs in source order
    pub image_urls: Vec<String>,
    /// Tags in source order
    pub tags: Vec<String>,
    /// Upload timestamp, formatted
    pub upload_time: String,
    /// Geographic label attached by the vendor
    pub ip_location: String,
}

/// Reference to one note: canonical URL plus the pieces needed to fetch it
///
/// The `xsec_token` is an opaque per-note access token the vendor requires
/// alongside the identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteRef {
    /// Canonical note URL, stamped onto the fetched record
    pub url: String,
    /// Note identifier, the last path segment of the URL
    pub note_id: String,
    /// Per-note access token
    pub xsec_token: String,
}

impl NoteRef {
    /// Parse a note URL into a reference
    ///
    /// The identifier is the last path segment; the access token comes from
    /// the `xsec_token` query parameter. A missing token stays empty and the
    /// vendor rejects the fetch, which surfaces as an API failure.
    pub fn parse(note_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(note_url).map_err(|e| Error::InvalidUrl {
            url: note_url.to_string(),
            reason: e.to_string(),
        })?;

        let note_id = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidUrl {
                url: note_url.to_string(),
                reason: "no note id path segment".to_string(),
            })?;

        let xsec_token = parsed
            .query_pairs()
            .find(|(k, _)| k == "xsec_token")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        Ok(Self {
            url: note_url.to_string(),
            note_id,
            xsec_token,
        })
    }

    /// Build the canonical reference for a note id and token
    pub fn from_parts(base_url: &str, note_id: &str, xsec_token: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            url: format!("{base}/explore/{note_id}?xsec_token={xsec_token}"),
            note_id: note_id.to_string(),
            xsec_token: xsec_token.to_string(),
        }
    }
}

/// Search filters for the search-by-keyword source
///
/// All filters default to "unrestricted". A distance other than
/// [`Distance::Unlimited`] requires a [`GeoPoint`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Result ordering
    #[serde(default)]
    pub sort: SortOrder,
    /// Restrict to a note kind
    #[serde(default)]
    pub kind: NoteKindFilter,
    /// Restrict to a recency window
    #[serde(default)]
    pub recency: RecencyWindow,
    /// Restrict by the caller's viewing history
    #[serde(default)]
    pub scope: VisibilityScope,
    /// Restrict by geographic distance
    #[serde(default)]
    pub distance: Distance,
    /// Caller position, required when `distance` is not unlimited
    #[serde(default)]
    pub geo: Option<GeoPoint>,
}

impl SearchFilters {
    /// Reject filter combinations the vendor cannot serve
    pub fn validate(&self) -> Result<()> {
        if self.distance != Distance::Unlimited && self.geo.is_none() {
            return Err(Error::config(
                "a distance filter requires a geo position",
                "filters.geo",
            ));
        }
        Ok(())
    }
}

/// Search result ordering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Vendor's blended relevance ordering (default)
    #[default]
    Comprehensive,
    /// Most recent first
    Latest,
    /// Most liked first
    MostLiked,
    /// Most commented first
    MostCommented,
    /// Most collected first
    MostCollected,
}

impl SortOrder {
    /// Vendor wire value
    pub fn to_i32(self) -> i32 {
        match self {
            SortOrder::Comprehensive => 0,
            SortOrder::Latest => 1,
            SortOrder::MostLiked => 2,
            SortOrder::MostCommented => 3,
            SortOrder::MostCollected => 4,
        }
    }
}

/// Note-kind restriction for search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKindFilter {
    /// Any kind (default)
    #[default]
    All,
    /// Video notes only
    Video,
    /// Standard notes only
    Normal,
}

impl NoteKindFilter {
    /// Vendor wire value
    pub fn to_i32(self) -> i32 {
        match self {
            NoteKindFilter::All => 0,
            NoteKindFilter::Video => 1,
            NoteKindFilter::Normal => 2,
        }
    }
}

/// Recency restriction for search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyWindow {
    /// Any age (default)
    #[default]
    All,
    /// Last day
    Day,
    /// Last week
    Week,
    /// Last half year
    HalfYear,
}

impl RecencyWindow {
    /// Vendor wire value
    pub fn to_i32(self) -> i32 {
        match self {
            RecencyWindow::All => 0,
            RecencyWindow::Day => 1,
            RecencyWindow::Week => 2,
            RecencyWindow::HalfYear => 3,
        }
    }
}

/// Viewing-history restriction for search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityScope {
    /// Any note (default)
    #[default]
    All,
    /// Already viewed
    Viewed,
    /// Not yet viewed
    Unviewed,
    /// From followed accounts
    Followed,
}

impl VisibilityScope {
    /// Vendor wire value
    pub fn to_i32(self) -> i32 {
        match self {
            VisibilityScope::All => 0,
            VisibilityScope::Viewed => 1,
            VisibilityScope::Unviewed => 2,
            VisibilityScope::Followed => 3,
        }
    }
}

/// Geographic distance restriction for search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    /// Any distance (default)
    #[default]
    Unlimited,
    /// Same city as the geo position
    SameCity,
    /// Near the geo position
    Nearby,
}

impl Distance {
    /// Vendor wire value
    pub fn to_i32(self) -> i32 {
        match self {
            Distance::Unlimited => 0,
            Distance::SameCity => 1,
            Distance::Nearby => 2,
        }
    }
}

/// Caller position for distance-filtered search
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}
