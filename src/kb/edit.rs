//! Command scripts that edit a knowledge base tree.
//!
//! The script format has three commands:
//!
//! ```text
//! <cmd type="add">TEXT</cmd>
//! <cmd type="modify" id="4">TEXT</cmd>
//! <cmd type="delete" id="9" />
//! ```
//!
//! Anything outside `<cmd>` elements is ignored.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::kb::{find_unit, list_units, next_id, unit_file_name};
use crate::{Error, Result};

static COMMAND_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<cmd\s+type="(add|modify|delete)"(?:\s+id="(\d+)")?\s*>(.*?)</cmd>|<cmd\s+type="(delete)"(?:\s+id="(\d+)")?\s*/>"#,
    )
    .ok()
});

/// One parsed edit command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UnitCommand {
    Add { text: String },
    Modify { id: u32, text: String },
    Delete { id: u32 },
}

/// File names touched by [`apply_commands`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedEdits {
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub added: Vec<String>,
}

fn parse_id(raw: Option<regex::Match<'_>>, action: &str) -> Result<u32> {
    let Some(raw) = raw else {
        return Err(Error::InvalidInput(format!(
            "'{}' command is missing an id",
            action
        )));
    };
    raw.as_str().parse().map_err(|_| {
        Error::InvalidInput(format!("invalid unit id '{}' in {} command", raw.as_str(), action))
    })
}

/// Parse every `<cmd>` element in `script`, in order.
pub fn parse_commands(script: &str) -> Result<Vec<UnitCommand>> {
    let Some(pattern) = COMMAND_PATTERN.as_ref() else {
        return Err(Error::Other("command pattern failed to compile".to_string()));
    };

    let mut commands = Vec::new();
    for caps in pattern.captures_iter(script) {
        let command = if let Some(action) = caps.get(1) {
            let action = action.as_str().to_lowercase();
            let text = caps.get(3).map_or("", |m| m.as_str()).trim().to_string();
            match action.as_str() {
                "add" => UnitCommand::Add { text },
                "modify" => UnitCommand::Modify {
                    id: parse_id(caps.get(2), "modify")?,
                    text,
                },
                _ => UnitCommand::Delete {
                    id: parse_id(caps.get(2), "delete")?,
                },
            }
        } else {
            UnitCommand::Delete {
                id: parse_id(caps.get(5), "delete")?,
            }
        };
        commands.push(command);
    }
    Ok(commands)
}

/// Apply `commands` to the tree at `root`.
///
/// Modifies run first, then deletes, then adds. Every referenced id is
/// checked before anything is written. `title` produces a title for each
/// added unit's text.
pub fn apply_commands(
    root: &Path,
    commands: &[UnitCommand],
    mut title: impl FnMut(&str) -> Result<String>,
) -> Result<AppliedEdits> {
    let units = list_units(root)?;
    for command in commands {
        if let UnitCommand::Modify { id, .. } | UnitCommand::Delete { id } = command {
            if find_unit(&units, *id).is_none() {
                return Err(Error::InvalidInput(format!(
                    "knowledge unit {} does not exist",
                    id
                )));
            }
        }
    }

    let mut applied = AppliedEdits::default();

    for command in commands {
        if let UnitCommand::Modify { id, text } = command {
            if let Some(unit) = find_unit(&units, *id) {
                fs::write(&unit.path, text).map_err(|e| Error::tree(&unit.path, e))?;
                debug!(unit = %unit.file_name, "modified knowledge unit");
                applied.modified.push(unit.file_name.clone());
            }
        }
    }

    for command in commands {
        if let UnitCommand::Delete { id } = command {
            if let Some(unit) = find_unit(&units, *id) {
                if unit.path.exists() {
                    fs::remove_file(&unit.path).map_err(|e| Error::tree(&unit.path, e))?;
                    debug!(unit = %unit.file_name, "deleted knowledge unit");
                    applied.deleted.push(unit.file_name.clone());
                }
            }
        }
    }

    let mut last_id: Option<u32> = None;
    for command in commands {
        if let UnitCommand::Add { text } = command {
            let id = match last_id {
                None => next_id(&units)?,
                Some(prev) => prev.checked_add(1).ok_or_else(|| {
                    Error::InvalidInput(format!("No unit id left after {}", prev))
                })?,
            };
            last_id = Some(id);
            let file_name = unit_file_name(id, &title(text)?);
            let path = root.join(&file_name);
            fs::write(&path, text).map_err(|e| Error::tree(&path, e))?;
            debug!(unit = %file_name, "added knowledge unit");
            applied.added.push(file_name);
        }
    }

    info!(
        modified = applied.modified.len(),
        deleted = applied.deleted.len(),
        added = applied.added.len(),
        "applied knowledge base commands"
    );
    Ok(applied)
}
