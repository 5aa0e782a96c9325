//! Two-copy knowledge base mirror.
//!
//! The durable tree lives in the project directory and is the copy humans
//! trust. The ephemeral tree lives inside the source directory, is the only
//! place the agent may write, and is rebuilt from the durable tree at the
//! start of every session.
//!
//! Promotion is staged: the ephemeral tree is copied next to the durable
//! tree, the durable tree is moved aside, and the staged copy is renamed into
//! place. A failed copy therefore never touches the durable tree, and a crash
//! between the two renames is repaired by [`recover_interrupted_promotion`].

pub mod diff;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{Error, Result};

pub use diff::{DiffReport, diff, list_files, render};

/// What a tree entry holds once symlinks are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Dir,
    File,
}

/// Classify `entry`, following symlinks.
///
/// Dangling links and links to an enclosing directory yield `None`.
pub(crate) fn entry_kind(entry: &fs::DirEntry) -> Result<Option<EntryKind>> {
    let path = entry.path();
    let file_type = entry.file_type().map_err(|e| Error::tree(&path, e))?;
    if !file_type.is_symlink() {
        return Ok(Some(if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        }));
    }

    let target = match fs::canonicalize(&path) {
        Ok(target) => target,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping dangling symlink");
            return Ok(None);
        }
    };
    if !target.is_dir() {
        return Ok(Some(EntryKind::File));
    }
    let parent = path.parent().and_then(|p| fs::canonicalize(p).ok());
    if parent.is_some_and(|parent| parent.starts_with(&target)) {
        warn!(
            path = %path.display(),
            target = %target.display(),
            "skipping symlink to an enclosing directory"
        );
        return Ok(None);
    }
    Ok(Some(EntryKind::Dir))
}

/// Recursively copy `src` into `dst`, creating `dst`.
///
/// Symlinks are copied as the files or directories they point to.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::tree(dst, e))?;
    for entry in fs::read_dir(src).map_err(|e| Error::tree(src, e))? {
        let entry = entry.map_err(|e| Error::tree(src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        match entry_kind(&entry)? {
            Some(EntryKind::Dir) => copy_tree(&from, &to)?,
            Some(EntryKind::File) => {
                fs::copy(&from, &to).map_err(|e| Error::tree(&from, e))?;
            }
            None => {}
        }
    }
    Ok(())
}

fn remove_tree(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| Error::tree(path, e))?;
    }
    Ok(())
}

/// Sibling path `.<name>.<suffix>` next to `tree`.
fn sibling(tree: &Path, suffix: &str) -> PathBuf {
    let name = tree
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "tree".to_string());
    let hidden = format!(".{}.{}", name, suffix);
    match tree.parent() {
        Some(parent) => parent.join(hidden),
        None => PathBuf::from(hidden),
    }
}

/// Where a promotion stages the incoming tree.
pub fn staging_path(durable: &Path) -> PathBuf {
    sibling(durable, "staging")
}

/// Where a promotion parks the outgoing tree.
pub fn previous_path(durable: &Path) -> PathBuf {
    sibling(durable, "previous")
}

/// Replace `ephemeral` with a fresh copy of `durable`.
///
/// Call once per session, before the first agent turn.
pub fn reset_ephemeral(durable: &Path, ephemeral: &Path) -> Result<()> {
    if !durable.is_dir() {
        return Err(Error::tree(
            durable,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "durable knowledge base does not exist",
            ),
        ));
    }
    remove_tree(ephemeral)?;
    copy_tree(durable, ephemeral)?;
    info!(
        durable = %durable.display(),
        ephemeral = %ephemeral.display(),
        "reset ephemeral knowledge base"
    );
    Ok(())
}

/// Replace the whole `durable` tree with the contents of `ephemeral`.
pub fn promote(ephemeral: &Path, durable: &Path) -> Result<()> {
    if !ephemeral.is_dir() {
        return Err(Error::tree(
            ephemeral,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "ephemeral knowledge base does not exist",
            ),
        ));
    }

    let staging = staging_path(durable);
    let previous = previous_path(durable);
    remove_tree(&staging)?;
    if let Err(e) = copy_tree(ephemeral, &staging) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    let had_durable = durable.exists();
    if had_durable {
        remove_tree(&previous)?;
        fs::rename(durable, &previous).map_err(|e| Error::tree(durable, e))?;
    }

    if let Err(e) = fs::rename(&staging, durable) {
        if had_durable {
            if let Err(restore) = fs::rename(&previous, durable) {
                warn!(
                    previous = %previous.display(),
                    error = %restore,
                    "failed to restore durable knowledge base after aborted promotion"
                );
            }
        }
        return Err(Error::tree(durable, e));
    }

    remove_tree(&previous)?;
    info!(
        ephemeral = %ephemeral.display(),
        durable = %durable.display(),
        "promoted ephemeral knowledge base"
    );
    Ok(())
}

/// Repair the durable tree after a promotion was interrupted.
///
/// Returns `true` when a parked copy had to be restored.
pub fn recover_interrupted_promotion(durable: &Path) -> Result<bool> {
    let staging = staging_path(durable);
    let previous = previous_path(durable);
    let mut restored = false;

    if !durable.exists() && previous.is_dir() {
        fs::rename(&previous, durable).map_err(|e| Error::tree(&previous, e))?;
        warn!(
            durable = %durable.display(),
            "restored knowledge base from an interrupted promotion"
        );
        restored = true;
    } else if previous.exists() {
        debug!(path = %previous.display(), "removing leftover previous tree");
        remove_tree(&previous)?;
    }

    if staging.exists() {
        debug!(path = %staging.display(), "removing stale staging tree");
        remove_tree(&staging)?;
    }

    Ok(restored)
}

/// The durable/ephemeral pair of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBaseMirror {
    pub durable: PathBuf,
    pub ephemeral: PathBuf,
}

impl KnowledgeBaseMirror {
    pub fn new(durable: impl Into<PathBuf>, ephemeral: impl Into<PathBuf>) -> Self {
        Self {
            durable: durable.into(),
            ephemeral: ephemeral.into(),
        }
    }

    pub fn reset(&self) -> Result<()> {
        reset_ephemeral(&self.durable, &self.ephemeral)
    }

    pub fn promote(&self) -> Result<()> {
        promote(&self.ephemeral, &self.durable)
    }

    /// What promoting now would change in the durable tree.
    pub fn pending_changes(&self) -> Result<DiffReport> {
        diff(&self.durable, &self.ephemeral)
    }
}
