//! Knowledge units.
//!
//! A unit is one markdown file named `NNN_<slug>.md`. The numeric prefix is
//! the unit id; gaps after deletions are allowed. Files with other names are
//! ignored here but are still mirrored and diffed like any other file.

pub mod edit;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{Error, Result};

pub use edit::{UnitCommand, apply_commands, parse_commands};

/// Longest slug produced by [`slugify`].
pub const MAX_SLUG_LEN: usize = 48;

/// One knowledge unit on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeUnit {
    pub id: u32,
    pub file_name: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub content: String,
}

/// Parse the id out of a unit file name.
pub fn parse_unit_id(file_name: &str) -> Option<u32> {
    let stem = file_name.strip_suffix(".md")?;
    let (digits, rest) = stem.split_once('_')?;
    if digits.len() < 3 || rest.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// File name for unit `id` with the given title.
pub fn unit_file_name(id: u32, title: &str) -> String {
    format!("{:03}_{}.md", id, slugify(title))
}

/// Lowercase ASCII alphanumeric words joined by single underscores.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for word in title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_ascii_lowercase();
        let needed = if slug.is_empty() { word.len() } else { word.len() + 1 };
        if slug.len() + needed > MAX_SLUG_LEN {
            if slug.is_empty() {
                slug.push_str(&word[..MAX_SLUG_LEN]);
            }
            break;
        }
        if !slug.is_empty() {
            slug.push('_');
        }
        slug.push_str(&word);
    }
    if slug.is_empty() {
        "unit".to_string()
    } else {
        slug
    }
}

/// Top-level units of `root`, sorted by id. A missing root has no units.
pub fn list_units(root: &Path) -> Result<Vec<KnowledgeUnit>> {
    let mut units = Vec::new();
    if !root.is_dir() {
        return Ok(units);
    }
    for entry in fs::read_dir(root).map_err(|e| Error::tree(root, e))? {
        let entry = entry.map_err(|e| Error::tree(root, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(id) = parse_unit_id(&file_name) else {
            continue;
        };
        let content = fs::read_to_string(&path).map_err(|e| Error::tree(&path, e))?;
        units.push(KnowledgeUnit {
            id,
            file_name,
            path,
            content,
        });
    }
    units.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.file_name.cmp(&b.file_name)));
    Ok(units)
}

/// The id a new unit should take.
pub fn next_id(units: &[KnowledgeUnit]) -> Result<u32> {
    match units.iter().map(|u| u.id).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            Error::InvalidInput(format!("No unit id left after {}", max))
        }),
    }
}

/// Find a unit by id.
pub fn find_unit(units: &[KnowledgeUnit], id: u32) -> Option<&KnowledgeUnit> {
    units.iter().find(|u| u.id == id)
}

/// Parse a comma-separated id list such as `1, 3,7`.
///
/// Returns the valid ids and the entries that could not be parsed.
pub fn parse_id_list(text: &str) -> (Vec<u32>, Vec<String>) {
    let mut ids = Vec::new();
    let mut invalid = Vec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<u32>() {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(_) => invalid.push(part.to_string()),
        }
    }
    (ids, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_tree;
    use tempfile::TempDir;

    #[test]
    fn test_parse_unit_id() {
        assert_eq!(parse_unit_id("001_intro.md"), Some(1));
        assert_eq!(parse_unit_id("1234_big.md"), Some(1234));
        assert_eq!(parse_unit_id("01_short.md"), None);
        assert_eq!(parse_unit_id("001_.md"), None);
        assert_eq!(parse_unit_id("001_intro.txt"), None);
        assert_eq!(parse_unit_id("README.md"), None);
        assert_eq!(parse_unit_id("0a1_x.md"), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Execution Model"), "execution_model");
        assert_eq!(slugify("  Memory -- Layout!! "), "memory_layout");
        assert_eq!(slugify("???"), "unit");
        assert_eq!(slugify("Über cache"), "ber_cache");
        let long = slugify(&"word ".repeat(30));
        assert!(long.len() <= MAX_SLUG_LEN);
        assert!(!long.ends_with('_'));
        assert_eq!(slugify(&"x".repeat(60)).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_unit_file_name() {
        assert_eq!(unit_file_name(7, "Access Control"), "007_access_control.md");
        assert_eq!(unit_file_name(1000, "x"), "1000_x.md");
    }

    #[test]
    fn test_list_units_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        write_tree(
            dir.path(),
            &[
                ("010_later.md", "later"),
                ("002_early.md", "early"),
                ("notes.txt", "n"),
                ("sub/003_nested.md", "nested"),
            ],
        );
        let units = list_units(dir.path()).unwrap();
        let names: Vec<_> = units.iter().map(|u| u.file_name.as_str()).collect();
        assert_eq!(names, vec!["002_early.md", "010_later.md"]);
        assert_eq!(next_id(&units).unwrap(), 11);
        assert_eq!(find_unit(&units, 2).unwrap().content, "early");
    }

    #[test]
    fn test_next_id_for_empty_tree() {
        assert_eq!(next_id(&[]).unwrap(), 1);
        let dir = TempDir::new().unwrap();
        assert!(list_units(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_next_id_rejects_exhausted_ids() {
        let dir = TempDir::new().unwrap();
        write_tree(dir.path(), &[("4294967295_big.md", "big")]);
        let units = list_units(dir.path()).unwrap();
        assert_eq!(units[0].id, u32::MAX);
        let err = next_id(&units).unwrap_err();
        assert_eq!(err.category(), "input");
    }

    #[test]
    fn test_parse_id_list() {
        let (ids, invalid) = parse_id_list(" 3, 1,abc, ,3, 12");
        assert_eq!(ids, vec![3, 1, 12]);
        assert_eq!(invalid, vec!["abc".to_string()]);
    }
}
