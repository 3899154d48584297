//! Dataset folder renaming
//!
//! One-shot cleanup for media trees produced by earlier runs, where folder
//! names carried a human-readable prefix before the identifier
//! (`nickname_userid/title_noteid`). Walks exactly two levels (owner
//! folders, then note folders) and renames anything containing an
//! underscore to the substring after its last underscore. Name collisions
//! get a numeric suffix rather than overwriting.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Counters for one cleanup pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupStats {
    /// Folders renamed
    pub renamed: usize,
    /// Folders whose rename failed (logged and left in place)
    pub failed: usize,
}

/// Rename owner and note folders under `root` to their bare identifiers
///
/// Files and folders without an underscore are left untouched, so a second
/// pass over a tree that needed no collision suffixes is a no-op.
pub fn clean_media_folders(root: &Path) -> Result<CleanupStats> {
    let mut stats = CleanupStats::default();
    tracing::info!(root = %root.display(), "cleaning media folders");

    for owner_entry in fs::read_dir(root)? {
        let owner_entry = owner_entry?;
        if !owner_entry.file_type()?.is_dir() {
            continue;
        }

        // Rename the owner folder first so note folders are walked under
        // their final parent
        let owner_path = rename_to_id(owner_entry.path(), &mut stats);

        for note_entry in fs::read_dir(&owner_path)? {
            let note_entry = note_entry?;
            if !note_entry.file_type()?.is_dir() {
                continue;
            }
            rename_to_id(note_entry.path(), &mut stats);
        }
    }

    tracing::info!(renamed = stats.renamed, failed = stats.failed, "cleanup finished");
    Ok(stats)
}

/// Strip a folder name to the part after its last underscore
///
/// Returns `None` when there is nothing to do: no underscore, or an empty
/// remainder (a trailing underscore).
fn reduced_name(name: &str) -> Option<&str> {
    match name.rsplit_once('_') {
        Some((_, id)) if !id.is_empty() => Some(id),
        Some(_) => {
            tracing::warn!(name, "trailing underscore leaves an empty name, skipping");
            None
        }
        None => None,
    }
}

/// Rename one folder if its name reduces; returns the folder's current path
fn rename_to_id(path: PathBuf, stats: &mut CleanupStats) -> PathBuf {
    let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
        return path;
    };
    let Some(new_name) = reduced_name(&name) else {
        return path;
    };
    let Some(parent) = path.parent() else {
        return path;
    };

    let target = unique_sibling(parent, new_name);
    match fs::rename(&path, &target) {
        Ok(()) => {
            tracing::info!(from = %name, to = %target.display(), "renamed folder");
            stats.renamed += 1;
            target
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "rename failed, skipping");
            stats.failed += 1;
            path
        }
    }
}

/// First non-existing sibling path: `name`, then `name_1`, `name_2`, …
fn unique_sibling(parent: &Path, name: &str) -> PathBuf {
    let mut candidate = parent.join(name);
    let mut counter = 1;
    while candidate.exists() {
        candidate = parent.join(format!("{name}_{counter}"));
        counter += 1;
    }
    candidate
}
