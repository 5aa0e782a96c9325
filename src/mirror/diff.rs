//! Structured diff between two knowledge base trees.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use colored::{ColoredString, Colorize};
use serde::Serialize;
use similar::TextDiff;

use super::{EntryKind, entry_kind};
use crate::{Error, Result};

/// Added, deleted and modified files between two trees, as relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub added: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// One-line summary, e.g. `1 added, 0 deleted, 2 modified`.
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} deleted, {} modified",
            self.added.len(),
            self.deleted.len(),
            self.modified.len()
        )
    }
}

/// Relative paths of every file under `root`, sorted. A missing root is empty.
pub fn list_files(root: &Path) -> Result<BTreeSet<PathBuf>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeSet<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(dir).map_err(|e| Error::tree(dir, e))? {
            let entry = entry.map_err(|e| Error::tree(dir, e))?;
            let path = entry.path();
            match entry_kind(&entry)? {
                Some(EntryKind::Dir) => walk(root, &path, out)?,
                Some(EntryKind::File) => {
                    if let Ok(rel) = path.strip_prefix(root) {
                        out.insert(rel.to_path_buf());
                    }
                }
                None => {}
            }
        }
        Ok(())
    }

    let mut files = BTreeSet::new();
    if root.is_dir() {
        walk(root, root, &mut files)?;
    }
    Ok(files)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::tree(path, e))
}

/// Classify every file of `before` and `after`. Content is compared byte for byte.
pub fn diff(before: &Path, after: &Path) -> Result<DiffReport> {
    let old = list_files(before)?;
    let new = list_files(after)?;

    let mut report = DiffReport {
        added: new.difference(&old).cloned().collect(),
        deleted: old.difference(&new).cloned().collect(),
        modified: Vec::new(),
    };
    for rel in old.intersection(&new) {
        if read_bytes(&before.join(rel))? != read_bytes(&after.join(rel))? {
            report.modified.push(rel.clone());
        }
    }
    Ok(report)
}

/// Style for one line of a unified diff.
fn diff_line(line: &str) -> ColoredString {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold()
    } else if line.starts_with('+') {
        line.green()
    } else if line.starts_with('-') {
        line.red()
    } else if line.starts_with("@@") {
        line.cyan()
    } else {
        line.normal()
    }
}

/// Human-readable rendering of `report` with unified diffs for modified files.
pub fn render(report: &DiffReport, before: &Path, after: &Path, color: bool) -> Result<String> {
    if report.is_empty() {
        return Ok("No changes to the knowledge base.\n".to_string());
    }

    let mut out = String::new();
    let entries = [
        ("+ added   ", &report.added),
        ("- deleted ", &report.deleted),
        ("~ modified", &report.modified),
    ];
    for (label, paths) in entries {
        for path in paths {
            let line = format!("{} {}", label, path.display());
            let styled = match (color, label.chars().next()) {
                (false, _) => line.normal(),
                (true, Some('+')) => line.green(),
                (true, Some('-')) => line.red(),
                (true, _) => line.cyan(),
            };
            out.push_str(&format!("{}\n", styled));
        }
    }

    for path in &report.modified {
        let old = String::from_utf8_lossy(&read_bytes(&before.join(path))?).to_string();
        let new = String::from_utf8_lossy(&read_bytes(&after.join(path))?).to_string();
        let name = path.display().to_string();
        let unified = TextDiff::from_lines(&old, &new)
            .unified_diff()
            .context_radius(2)
            .header(&format!("a/{}", name), &format!("b/{}", name))
            .to_string();

        out.push('\n');
        for line in unified.lines() {
            if color {
                out.push_str(&diff_line(line).to_string());
            } else {
                out.push_str(line);
            }
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&report.summary());
    out.push('\n');
    Ok(out)
}
