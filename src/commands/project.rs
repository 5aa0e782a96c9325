//! Project lifecycle commands: init, diff and promote.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::commands::Output;
use crate::mirror::{DiffReport, render};
use crate::project::Project;
use crate::{Error, Result};

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub project: String,
    pub project_dir: PathBuf,
    pub source_dir: PathBuf,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_human(&self) -> String {
        format!(
            "Created project '{}' at {}\nSource documents: {}\nNext: socratic synthesize --project {}",
            self.project,
            self.project_dir.display(),
            self.source_dir.display(),
            self.project
        )
    }
}

/// Create a project under `projects_root` for `source_dir`.
pub fn init(projects_root: &Path, name: &str, source_dir: &Path) -> Result<InitResult> {
    let project = Project::create(projects_root, name, source_dir)?;
    info!(project = %project.name, dir = %project.dir.display(), "created project");
    Ok(InitResult {
        project: project.name,
        project_dir: project.dir,
        source_dir: project.source_dir,
    })
}

#[derive(Debug, Serialize)]
pub struct DiffResult {
    #[serde(flatten)]
    pub report: DiffReport,
    #[serde(skip)]
    pub rendered: String,
}

impl Output for DiffResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_human(&self) -> String {
        self.rendered.trim_end().to_string()
    }
}

fn working_copy(project: &Project) -> Result<PathBuf> {
    let ephemeral = project.ephemeral_kb();
    if !ephemeral.is_dir() {
        return Err(Error::InvalidInput(format!(
            "No working copy at {}. Run a session with --plain first.",
            ephemeral.display()
        )));
    }
    Ok(ephemeral)
}

/// What promoting the working copy would change.
pub fn diff(project: &Project, color: bool) -> Result<DiffResult> {
    let durable = project.ensure_knowledge_base()?;
    let ephemeral = working_copy(project)?;
    let report = project.mirror().pending_changes()?;
    let rendered = render(&report, &durable, &ephemeral, color)?;
    Ok(DiffResult { report, rendered })
}

#[derive(Debug, Serialize)]
pub struct PromoteResult {
    pub promoted: bool,
    #[serde(flatten)]
    pub report: DiffReport,
    #[serde(skip)]
    pub rendered: String,
}

impl Output for PromoteResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_human(&self) -> String {
        if self.promoted {
            format!("{}\nPromoted working copy.", self.rendered.trim_end())
        } else {
            "Nothing to promote; the knowledge base is up to date.".to_string()
        }
    }
}

/// Replace the durable tree with the working copy.
///
/// A working copy identical to the durable tree is left alone.
pub fn promote(project: &Project, color: bool) -> Result<PromoteResult> {
    let durable = project.ensure_knowledge_base()?;
    let ephemeral = working_copy(project)?;
    let mirror = project.mirror();
    let report = mirror.pending_changes()?;
    if report.is_empty() {
        return Ok(PromoteResult {
            promoted: false,
            report,
            rendered: String::new(),
        });
    }
    let rendered = render(&report, &durable, &ephemeral, color)?;
    mirror.promote()?;
    Ok(PromoteResult {
        promoted: true,
        report,
        rendered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::session::tests::setup;
    use crate::test_utils::{read_tree, write_tree};
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_openable_project() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("docs");
        std::fs::create_dir_all(&source).unwrap();

        let result = init(dir.path(), "alpha", &source).unwrap();

        assert_eq!(result.project, "alpha");
        assert!(result.to_human().contains("socratic synthesize --project alpha"));
        let project = Project::open(dir.path(), "alpha").unwrap();
        assert_eq!(project.source_dir, source.canonicalize().unwrap());
        assert!(init(dir.path(), "alpha", &source).is_err());
    }

    #[test]
    fn test_diff_and_promote_working_copy() {
        let s = setup();
        write_tree(&s.project.durable_kb(), &[("001_a.md", "A"), ("002_b.md", "B")]);
        write_tree(&s.project.ephemeral_kb(), &[("001_a.md", "A2"), ("003_c.md", "C")]);

        let pending = diff(&s.project, false).unwrap();
        assert_eq!(pending.report.added, vec![PathBuf::from("003_c.md")]);
        assert_eq!(pending.report.deleted, vec![PathBuf::from("002_b.md")]);
        assert!(pending.to_human().contains("1 added, 1 deleted, 1 modified"));
        let json: serde_json::Value = serde_json::from_str(&pending.to_json()).unwrap();
        assert_eq!(json["modified"][0], "001_a.md");

        let result = promote(&s.project, false).unwrap();
        assert!(result.promoted);
        assert!(result.to_human().contains("+ added    003_c.md"));
        assert_eq!(read_tree(&s.project.durable_kb()), read_tree(&s.project.ephemeral_kb()));

        let again = promote(&s.project, false).unwrap();
        assert!(!again.promoted);
    }

    #[test]
    fn test_promote_without_working_copy_fails() {
        let s = setup();
        let err = promote(&s.project, false).unwrap_err();
        assert_eq!(err.category(), "input");
        assert!(diff(&s.project, false).is_err());
    }
}
