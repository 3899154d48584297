//! Field normalization
//!
//! Converts one raw vendor record (nested, loosely typed) into a flat
//! [`Note`] with display-ready scalar fields. Counters default to zero when
//! absent and text fields are stripped of control characters so they can be
//! written into a spreadsheet cell verbatim.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{Note, NoteKind};

/// Strip control characters and surrounding whitespace from a text field
pub fn norm_text(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect::<String>().trim().to_string()
}

/// Normalize one raw record into a [`Note`], stamped with its source URL
///
/// The record is the first element of the feed envelope's items array. Only
/// the note id is mandatory; every other field falls back to an empty value
/// so a sparse record still produces a complete row.
pub fn normalize_note(raw: &Value, source_url: &str) -> Result<Note> {
    let note_id = raw
        .get("id")
        .and_then(Value::as_str)
        .or_else(|| raw.pointer("/note_card/note_id").and_then(Value::as_str))
        .ok_or_else(|| Error::MalformedRecord("record has no note id".to_string()))?
        .to_string();

    let card = raw.get("note_card").unwrap_or(&Value::Null);

    let kind = match card.get("type").and_then(Value::as_str) {
        Some("video") => NoteKind::Video,
        _ => NoteKind::Normal,
    };

    let user_id = text_at(card, "/user/user_id");
    let user_url = profile_url(source_url, &user_id);

    let image_urls: Vec<String> = card
        .pointer("/image_list")
        .and_then(Value::as_array)
        .map(|images| {
            images
                .iter()
                .filter_map(|img| {
                    img.get("url_default")
                        .or_else(|| img.get("url"))
                        .and_then(Value::as_str)
                        .filter(|u| !u.is_empty())
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default();

    let video_urls: Vec<String> = card
        .pointer("/video/media/stream/h264")
        .and_then(Value::as_array)
        .map(|streams| {
            streams
                .iter()
                .filter_map(|s| s.get("master_url").and_then(Value::as_str))
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let video_cover_url = card
        .pointer("/video/image/first_frame")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| image_urls.first().cloned())
        .filter(|_| kind == NoteKind::Video)
        .unwrap_or_default();

    let tags: Vec<String> = card
        .pointer("/tag_list")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t.get("name").and_then(Value::as_str))
                .map(norm_text)
                .collect()
        })
        .unwrap_or_default();

    Ok(Note {
        note_id,
        url: source_url.to_string(),
        kind,
        user_id,
        user_url,
        nickname: norm_text(&text_at(card, "/user/nickname")),
        avatar_url: text_at(card, "/user/avatar"),
        title: norm_text(&text_at(card, "/title")),
        desc: norm_text(&text_at(card, "/desc")),
        like_count: count_at(card, "/interact_info/liked_count"),
        collect_count: count_at(card, "/interact_info/collected_count"),
        comment_count: count_at(card, "/interact_info/comment_count"),
        share_count: count_at(card, "/interact_info/share_count"),
        video_cover_url,
        video_urls,
        image_urls,
        tags,
        upload_time: format_timestamp(card.get("time")),
        ip_location: norm_text(&text_at(card, "/ip_location")),
    })
}

fn text_at(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Parse an engagement counter that may arrive as a number, a plain numeric
/// string, or the vendor's abbreviated form ("1.2万"). Absent or unparsable
/// counters are zero.
fn count_at(value: &Value, pointer: &str) -> u64 {
    match value.pointer(pointer) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => parse_count(s),
        _ => 0,
    }
}

fn parse_count(s: &str) -> u64 {
    let s = s.trim();
    if let Some(prefix) = s.strip_suffix('万') {
        return prefix
            .parse::<f64>()
            .map(|n| (n * 10_000.0) as u64)
            .unwrap_or(0);
    }
    s.parse::<u64>().unwrap_or(0)
}

/// Format a vendor timestamp (milliseconds or seconds since epoch)
fn format_timestamp(value: Option<&Value>) -> String {
    let Some(ts) = value.and_then(Value::as_i64) else {
        return String::new();
    };
    // The feed reports milliseconds; older records use seconds
    let ts_secs = if ts > 1_000_000_000_000 { ts / 1000 } else { ts };
    chrono::DateTime::from_timestamp(ts_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Owner profile URL on the same host the note was fetched from
fn profile_url(source_url: &str, user_id: &str) -> String {
    if user_id.is_empty() {
        return String::new();
    }
    match url::Url::parse(source_url) {
        Ok(parsed) => format!(
            "{}/user/profile/{user_id}",
            parsed.origin().ascii_serialization()
        ),
        Err(_) => String::new(),
    }
}
