//! Spreadsheet sink
//!
//! A CSV file created once at run start with a fixed header, then only ever
//! extended. Every append flushes to disk so a long, rate-limited scrape
//! loses at most the in-flight note if the process dies.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::normalize::norm_text;
use crate::types::Note;

/// Column order of the output file, one column per note attribute
pub const HEADERS: [&str; 19] = [
    "note id",
    "note url",
    "note type",
    "user id",
    "user url",
    "nickname",
    "avatar url",
    "title",
    "description",
    "like count",
    "collect count",
    "comment count",
    "share count",
    "video cover url",
    "video url",
    "image url list",
    "tags",
    "upload time",
    "ip location",
];

/// Append-only CSV writer for normalized notes
pub struct SpreadsheetSink {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl SpreadsheetSink {
    /// Create `{base_name}.csv` under `dir` and write the header row
    ///
    /// An existing file with the same name is replaced; within a run the
    /// file is only extended.
    pub fn create(dir: &Path, base_name: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{base_name}.csv"));
        let mut writer = csv::Writer::from_writer(File::create(&path)?);
        writer.write_record(HEADERS)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), "created spreadsheet");
        Ok(Self { writer, path })
    }

    /// Append one row in header column order and flush it to disk
    pub fn append(&mut self, note: &Note) -> Result<()> {
        self.writer.write_record(row(note))?;
        self.writer.flush()?;
        tracing::debug!(note_id = %note.note_id, "wrote spreadsheet row");
        Ok(())
    }

    /// Append many rows, flushing once at the end (buffered strategy)
    pub fn append_all(&mut self, notes: &[Note]) -> Result<()> {
        for note in notes {
            self.writer.write_record(row(note))?;
        }
        self.writer.flush()?;
        tracing::info!(rows = notes.len(), "wrote buffered spreadsheet rows");
        Ok(())
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One note as text cells, in [`HEADERS`] order
fn row(note: &Note) -> Vec<String> {
    [
        note.note_id.clone(),
        note.url.clone(),
        note.kind.as_str().to_string(),
        note.user_id.clone(),
        note.user_url.clone(),
        note.nickname.clone(),
        note.avatar_url.clone(),
        note.title.clone(),
        note.desc.clone(),
        note.like_count.to_string(),
        note.collect_count.to_string(),
        note.comment_count.to_string(),
        note.share_count.to_string(),
        note.video_cover_url.clone(),
        note.video_urls.join(","),
        note.image_urls.join(","),
        note.tags.join(","),
        note.upload_time.clone(),
        note.ip_location.clone(),
    ]
    .into_iter()
    .map(|cell| norm_text(&cell))
    .collect()
}
