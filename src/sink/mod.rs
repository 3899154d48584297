//! Output sinks
//!
//! A successful fetch fans out to zero or more sinks depending on the save
//! mode: one spreadsheet row, and/or the note's media assets.

pub mod media;
pub mod spreadsheet;

pub use media::MediaSink;
pub use spreadsheet::SpreadsheetSink;
