//! Retrying note fetcher
//!
//! One network call per attempt, then three ordered envelope validations,
//! each raising its own retryable fault: the overall success flag, the data
//! container, and a non-empty items array. Anything else that goes wrong is
//! definitive. On success the raw record is stamped with its source URL and
//! run through the normalizer.

use serde_json::Value;

use crate::api::{ApiEnvelope, NoteApi};
use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::normalize::normalize_note;
use crate::retry::fetch_with_retry;
use crate::types::{Note, NoteRef};

/// Fetch and normalize one note, retrying transient faults
///
/// Retries cover transport errors and the three envelope validations.
/// Exhausting the budget returns [`Error::RetriesExhausted`]; a fault
/// outside the retryable set returns immediately.
pub async fn fetch_note(api: &NoteApi, retry: &RetryConfig, note: &NoteRef) -> Result<Note> {
    let raw = fetch_with_retry(retry, || async move {
        let envelope = api.note_feed(note).await?;
        validate_feed_envelope(envelope)
    })
    .await?;

    // Normalization failures are definitive, so they stay outside the loop
    let normalized = normalize_note(&raw, &note.url)?;
    tracing::info!(note_id = %normalized.note_id, url = %note.url, "fetched note");
    Ok(normalized)
}

/// Apply the three ordered envelope validations, returning the first item
fn validate_feed_envelope(envelope: ApiEnvelope) -> Result<Value> {
    if !envelope.success {
        return Err(Error::ApiFailure(envelope.msg));
    }
    let data = envelope.data.ok_or(Error::MissingData)?;
    let items = data
        .get("items")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or(Error::EmptyItems)?;
    Ok(items[0].clone())
}
