#![deny(missing_docs)]

//! # Client Tree Relocation
//!
//! Moves the rewritten `Api`, `Client` and `Model` directories out of the
//! generator's scratch output into the consuming project, replacing whatever
//! a previous run left there.
//!
//! A failure part way through leaves the destination with a partial set of
//! directories. Callers must re-run from generation in that case.

use crate::error::{AppError, AppResult};
use crate::resolver::MODEL_DIR;
use crate::rewriter::{API_DIR, CLIENT_DIR};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// The directories a generated client tree consists of.
pub const TREE_DIRS: [&str; 3] = [API_DIR, CLIENT_DIR, MODEL_DIR];

/// Result of a relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// All three directories were moved into the destination.
    Moved,
    /// The source held none of the directories; the destination was not touched.
    NothingToMove,
}

/// Replaces `destination_root/{Api,Client,Model}` with the ones under `generated_root`.
///
/// The source must hold all three directories or none of them. With none the
/// call is a no-op, so repeating a relocation leaves the first result intact.
pub fn relocate(generated_root: &Path, destination_root: &Path) -> AppResult<Relocation> {
    let present: Vec<&str> = TREE_DIRS
        .iter()
        .copied()
        .filter(|dir| generated_root.join(dir).is_dir())
        .collect();

    if present.is_empty() {
        warn!(source = %generated_root.display(), "nothing to relocate");
        return Ok(Relocation::NothingToMove);
    }
    if present.len() != TREE_DIRS.len() {
        return Err(AppError::Relocation(format!(
            "incomplete client tree in {:?}: found only {}",
            generated_root,
            present.join(", ")
        )));
    }

    fs::create_dir_all(destination_root).map_err(|e| {
        AppError::Relocation(format!(
            "Failed to create destination {:?}: {}",
            destination_root, e
        ))
    })?;

    for dir in TREE_DIRS {
        let target = destination_root.join(dir);
        if target.exists() {
            fs::remove_dir_all(&target).map_err(|e| {
                AppError::Relocation(format!("Failed to clear {:?}: {}", target, e))
            })?;
            debug!(dir = %target.display(), "cleared stale output");
        }
    }

    for dir in TREE_DIRS {
        move_dir(&generated_root.join(dir), &destination_root.join(dir))?;
    }

    info!(destination = %destination_root.display(), "relocated generated client");
    Ok(Relocation::Moved)
}

/// Removes the generator's scratch tree. A missing tree is fine.
pub fn remove_scratch(scratch_root: &Path) -> AppResult<()> {
    if !scratch_root.exists() {
        return Ok(());
    }
    fs::remove_dir_all(scratch_root).map_err(|e| {
        AppError::Relocation(format!(
            "Failed to remove scratch output {:?}: {}",
            scratch_root, e
        ))
    })
}

/// Renames `from` to `to`, copying when the rename crosses filesystems.
fn move_dir(from: &Path, to: &Path) -> AppResult<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    debug!(from = %from.display(), to = %to.display(), "rename failed, copying");
    copy_tree(from, to)?;
    fs::remove_dir_all(from)
        .map_err(|e| AppError::Relocation(format!("Failed to remove {:?}: {}", from, e)))
}

fn copy_tree(from: &Path, to: &Path) -> AppResult<()> {
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry =
            entry.map_err(|e| AppError::Relocation(format!("Failed to walk {:?}: {}", from, e)))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| AppError::Relocation(e.to_string()))?;
        let target = to.join(relative);

        let res = if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
        } else {
            fs::copy(entry.path(), &target).map(|_| ())
        };
        res.map_err(|e| {
            AppError::Relocation(format!(
                "Failed to copy {:?} to {:?}: {}",
                entry.path(),
                target,
                e
            ))
        })?;
    }
    Ok(())
}
