//! Single-file export of the durable knowledge base.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use crate::commands::{FILE_TIMESTAMP_FORMAT, Output};
use crate::project::Project;
use crate::{Error, Result};

#[derive(Debug, Serialize)]
pub struct ExportResult {
    pub path: PathBuf,
    pub files: Vec<String>,
}

impl Output for ExportResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_human(&self) -> String {
        format!(
            "Exported {} file(s) to {}",
            self.files.len(),
            self.path.display()
        )
    }
}

/// Top-level markdown files of `root`, sorted by name.
fn markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| Error::tree(root, e))? {
        let path = entry.map_err(|e| Error::tree(root, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Export the knowledge base, stamping the file name with the current time.
pub fn export(project: &Project) -> Result<ExportResult> {
    export_at(project, Local::now())
}

/// Concatenate the knowledge base into `<project>_<timestamp>.md` in the project directory.
pub fn export_at(project: &Project, now: DateTime<Local>) -> Result<ExportResult> {
    let durable = project.durable_kb();
    if !durable.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Knowledge base not found at {}. Run `socratic synthesize --project {}` first.",
            durable.display(),
            project.name
        )));
    }

    let files = markdown_files(&durable)?;
    if files.is_empty() {
        return Err(Error::InvalidInput(format!(
            "No markdown files found in {}",
            durable.display()
        )));
    }

    let mut sections = Vec::with_capacity(files.len());
    for path in &files {
        sections.push(fs::read_to_string(path).map_err(|e| Error::tree(path, e))?);
    }

    let path = project.dir.join(format!(
        "{}_{}.md",
        project.name,
        now.format(FILE_TIMESTAMP_FORMAT)
    ));
    fs::write(&path, sections.join("\n")).map_err(|e| Error::tree(&path, e))?;
    info!(path = %path.display(), files = files.len(), "exported knowledge base");

    Ok(ExportResult {
        path,
        files: files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::session::tests::setup;
    use crate::test_utils::write_tree;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).single().unwrap()
    }

    #[test]
    fn test_export_concatenates_sorted_markdown() {
        let s = setup();
        write_tree(
            &s.project.durable_kb(),
            &[
                ("002_second.md", "Second."),
                ("001_first.md", "First."),
                ("notes.txt", "ignored"),
                ("nested/003_deep.md", "ignored too"),
            ],
        );

        let result = export_at(&s.project, fixed_time()).unwrap();

        assert_eq!(
            result.path,
            s.project.dir.join("demo_2026-03-04T05-06-07.md")
        );
        assert_eq!(result.files, vec!["001_first.md", "002_second.md"]);
        assert_eq!(fs::read_to_string(&result.path).unwrap(), "First.\nSecond.");
    }

    #[test]
    fn test_export_requires_knowledge_base() {
        let s = setup();
        fs::remove_dir_all(s.project.durable_kb()).unwrap();
        let err = export_at(&s.project, fixed_time()).unwrap_err();
        assert!(err.to_string().contains("Knowledge base not found"));
    }

    #[test]
    fn test_export_requires_markdown() {
        let s = setup();
        write_tree(&s.project.durable_kb(), &[("notes.txt", "x")]);
        let err = export_at(&s.project, fixed_time()).unwrap_err();
        assert!(err.to_string().contains("No markdown files"));
    }
}
