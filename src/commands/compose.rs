//! Prompt snippets composed from selected knowledge units.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use crate::commands::{FILE_TIMESTAMP_FORMAT, Output};
use crate::kb::{KnowledgeUnit, find_unit, list_units, parse_id_list};
use crate::llm::TextTransform;
use crate::llm::prompts::COMPOSE_SYSTEM;
use crate::project::Project;
use crate::turn::TurnIo;
use crate::{Error, Result};

/// Which units to compose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitSelection {
    /// Ids from a comma-separated list
    Ids(String),
    All,
    /// Ask the human to pick from a listing
    Interactive,
}

impl UnitSelection {
    pub fn from_args(units: Option<&str>, all: bool) -> Self {
        match (units, all) {
            (_, true) => UnitSelection::All,
            (Some(list), false) => UnitSelection::Ids(list.to_string()),
            (None, false) => UnitSelection::Interactive,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ComposeResult {
    /// Written snippet; `None` when nothing was selected
    pub path: Option<PathBuf>,
    pub units: Vec<u32>,
}

impl Output for ComposeResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_human(&self) -> String {
        match &self.path {
            Some(path) => format!(
                "Composed {} unit(s) into {}",
                self.units.len(),
                path.display()
            ),
            None => "No units selected.".to_string(),
        }
    }
}

fn unit_label(unit: &KnowledgeUnit) -> String {
    let heading = unit
        .content
        .lines()
        .map(|line| line.trim().trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .unwrap_or("");
    format!("{:>4}  {}  {}", unit.id, unit.file_name, heading)
}

fn pick<'u>(units: &'u [KnowledgeUnit], list: &str) -> Result<Vec<&'u KnowledgeUnit>> {
    let (ids, invalid) = parse_id_list(list);
    if !invalid.is_empty() {
        return Err(Error::InvalidInput(format!(
            "invalid unit ids: {}",
            invalid.join(", ")
        )));
    }
    let mut picked = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    for id in ids {
        match find_unit(units, id) {
            Some(unit) => picked.push(unit),
            None => missing.push(id.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(Error::InvalidInput(format!(
            "knowledge units not found: {}",
            missing.join(", ")
        )));
    }
    Ok(picked)
}

/// Compose the selected units, stamping the file name with the current time.
pub fn compose(
    project: &Project,
    transform: &dyn TextTransform,
    selection: &UnitSelection,
    io: &mut dyn TurnIo,
) -> Result<ComposeResult> {
    compose_at(project, transform, selection, io, Local::now())
}

/// Compose the selected units into `compose-<timestamp>.md` in the project directory.
pub fn compose_at(
    project: &Project,
    transform: &dyn TextTransform,
    selection: &UnitSelection,
    io: &mut dyn TurnIo,
    now: DateTime<Local>,
) -> Result<ComposeResult> {
    let units = list_units(&project.durable_kb())?;
    if units.is_empty() {
        return Err(Error::InvalidInput(format!(
            "Knowledge base for '{}' has no units",
            project.name
        )));
    }

    let selected = match selection {
        UnitSelection::All => units.iter().collect(),
        UnitSelection::Ids(list) => pick(&units, list)?,
        UnitSelection::Interactive => {
            let listing: Vec<String> = units.iter().map(unit_label).collect();
            io.reply("KNOWLEDGE UNITS", &listing.join("\n"));
            match io.read_line("Units to compose (comma-separated ids, empty to cancel):")? {
                Some(line) if !line.trim().is_empty() => pick(&units, &line)?,
                _ => Vec::new(),
            }
        }
    };
    if selected.is_empty() {
        return Ok(ComposeResult::default());
    }

    io.status("Composing prompt snippet...");
    let payload = serde_json::to_string_pretty(&selected)?;
    let snippet = transform.complete(COMPOSE_SYSTEM, &payload)?;

    let path = project
        .dir
        .join(format!("compose-{}.md", now.format(FILE_TIMESTAMP_FORMAT)));
    fs::write(&path, snippet).map_err(|e| Error::tree(&path, e))?;
    info!(path = %path.display(), units = selected.len(), "composed prompt snippet");

    Ok(ComposeResult {
        path: Some(path),
        units: selected.iter().map(|unit| unit.id).collect(),
    })
}
