//! Batch runner
//!
//! Processes an ordered list of note references strictly sequentially: fetch
//! with retry, fan out to the configured sinks, then sleep a random pacing
//! interval before the next item. One bad note never aborts a batch; sink
//! failures are logged and skipped the same way.

use rand::Rng;
use std::time::Duration;

use crate::api::NoteApi;
use crate::config::{Config, FlushStrategy, PacingConfig, SaveMode};
use crate::error::{Error, Result};
use crate::fetcher::fetch_note;
use crate::sink::{MediaSink, SpreadsheetSink};
use crate::types::{Note, NoteRef};

/// Counters for one batch run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Notes attempted (equals the identifier list length)
    pub attempted: usize,
    /// Notes fetched and normalized successfully
    pub succeeded: usize,
    /// Spreadsheet rows written
    pub rows_written: usize,
    /// Notes whose media was downloaded
    pub media_saved: usize,
}

/// Run one batch over the given references
///
/// Rejects a spreadsheet-producing save mode without a base name before any
/// network activity. The flush strategy decides whether rows are written per
/// note (streaming, the default) or once at the end (buffered); media
/// downloads happen per note either way.
pub(crate) async fn run_batch(
    api: &NoteApi,
    config: &Config,
    refs: &[NoteRef],
    save_mode: SaveMode,
    base_name: &str,
) -> Result<BatchSummary> {
    if save_mode.wants_spreadsheet() && base_name.is_empty() {
        return Err(Error::config(
            "save mode requires spreadsheet output but no base name was supplied",
            "base_name",
        ));
    }

    let mut spreadsheet = if save_mode.wants_spreadsheet() {
        Some(SpreadsheetSink::create(
            &config.output.spreadsheet_dir,
            base_name,
        )?)
    } else {
        None
    };
    let media = save_mode
        .media_filter()
        .map(|filter| (MediaSink::new(api.client().clone(), config.output.media_dir.clone()), filter));

    let mut summary = BatchSummary::default();
    let mut buffered: Vec<Note> = Vec::new();

    for note_ref in refs {
        summary.attempted += 1;

        match fetch_note(api, &config.retry, note_ref).await {
            Ok(note) => {
                summary.succeeded += 1;

                if let Some((sink, filter)) = &media {
                    match sink.download(&note, *filter).await {
                        Ok(_) => summary.media_saved += 1,
                        Err(e) => {
                            tracing::error!(note_id = %note.note_id, error = %e, "media download failed")
                        }
                    }
                }

                if let Some(sink) = spreadsheet.as_mut() {
                    match config.flush {
                        FlushStrategy::Streaming => match sink.append(&note) {
                            Ok(()) => summary.rows_written += 1,
                            Err(e) => {
                                tracing::error!(note_id = %note.note_id, error = %e, "row write failed")
                            }
                        },
                        FlushStrategy::Buffered => buffered.push(note),
                    }
                }
            }
            Err(e) => {
                tracing::warn!(url = %note_ref.url, error = %e, "note failed, continuing batch");
            }
        }

        tracing::info!(
            done = summary.attempted,
            total = refs.len(),
            succeeded = summary.succeeded,
            "batch progress"
        );

        let pause = pacing_pause(&config.pacing);
        tracing::debug!(pause_ms = pause.as_millis(), "pacing sleep");
        tokio::time::sleep(pause).await;
    }

    if let Some(sink) = spreadsheet.as_mut() {
        if config.flush == FlushStrategy::Buffered {
            match sink.append_all(&buffered) {
                Ok(()) => summary.rows_written = buffered.len(),
                Err(e) => {
                    tracing::error!(rows = buffered.len(), error = %e, "buffered row write failed")
                }
            }
        }
    }

    Ok(summary)
}

/// Uniform random pause in `[min, max)`
fn pacing_pause(pacing: &PacingConfig) -> Duration {
    if pacing.max <= pacing.min {
        return pacing.min;
    }
    let secs = rand::thread_rng().gen_range(pacing.min.as_secs_f64()..pacing.max.as_secs_f64());
    Duration::from_secs_f64(secs)
}
