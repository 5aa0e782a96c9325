//! Project store.
//!
//! A project is a directory under the projects root:
//!
//! ```text
//! projects/<name>/
//!   project.yaml        # project_name, input_dir
//!   knowledge_base/     # durable tree
//! ```
//!
//! The ephemeral tree lives at `<input_dir>/knowledge_base`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mirror::{KnowledgeBaseMirror, recover_interrupted_promotion};
use crate::{Error, Result};

/// Default projects root, relative to the working directory.
pub const DEFAULT_PROJECTS_DIR: &str = "projects";

/// Metadata file inside each project directory.
pub const PROJECT_FILE: &str = "project.yaml";

/// Name of the knowledge base directory in both locations.
pub const KNOWLEDGE_BASE_DIR: &str = "knowledge_base";

/// Contents of `project.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,
}

/// A resolved project with a known source directory.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub dir: PathBuf,
    pub source_dir: PathBuf,
}

impl Project {
    /// Resolve `name` under `root` and load its metadata.
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        validate_name(name)?;
        let dir = root.join(name);
        if !dir.is_dir() {
            return Err(Error::ProjectNotFound(format!(
                "Project directory not found: {}",
                dir.display()
            )));
        }

        let metadata_path = dir.join(PROJECT_FILE);
        if !metadata_path.is_file() {
            return Err(Error::Config(format!(
                "Project metadata not found: {}",
                metadata_path.display()
            )));
        }
        let content =
            fs::read_to_string(&metadata_path).map_err(|e| Error::tree(&metadata_path, e))?;
        let metadata: ProjectMetadata = serde_yaml_ng::from_str(&content)?;

        let Some(input_dir) = metadata.input_dir else {
            return Err(Error::Config(format!(
                "'input_dir' is not set in {}",
                metadata_path.display()
            )));
        };
        let source_dir = if input_dir.is_absolute() {
            input_dir
        } else {
            dir.join(input_dir)
        };
        if !source_dir.is_dir() {
            return Err(Error::Config(format!(
                "Source directory not found: {}",
                source_dir.display()
            )));
        }

        debug!(
            project = name,
            source_dir = %source_dir.display(),
            "opened project"
        );
        Ok(Self {
            name: metadata.project_name.unwrap_or_else(|| name.to_string()),
            dir,
            source_dir,
        })
    }

    /// Create a new project pointing at `source_dir`.
    pub fn create(root: &Path, name: &str, source_dir: &Path) -> Result<Self> {
        validate_name(name)?;
        let dir = root.join(name);
        if dir.exists() {
            return Err(Error::InvalidInput(format!(
                "Project already exists: {}",
                dir.display()
            )));
        }
        if !source_dir.is_dir() {
            return Err(Error::Config(format!(
                "Source directory not found: {}",
                source_dir.display()
            )));
        }
        let source_dir = source_dir
            .canonicalize()
            .map_err(|e| Error::tree(source_dir, e))?;

        let durable = dir.join(KNOWLEDGE_BASE_DIR);
        fs::create_dir_all(&durable).map_err(|e| Error::tree(&durable, e))?;

        let metadata = ProjectMetadata {
            project_name: Some(name.to_string()),
            input_dir: Some(source_dir.clone()),
        };
        let metadata_path = dir.join(PROJECT_FILE);
        fs::write(&metadata_path, serde_yaml_ng::to_string(&metadata)?)
            .map_err(|e| Error::tree(&metadata_path, e))?;

        Ok(Self {
            name: name.to_string(),
            dir,
            source_dir,
        })
    }

    pub fn durable_kb(&self) -> PathBuf {
        self.dir.join(KNOWLEDGE_BASE_DIR)
    }

    pub fn ephemeral_kb(&self) -> PathBuf {
        self.source_dir.join(KNOWLEDGE_BASE_DIR)
    }

    pub fn mirror(&self) -> KnowledgeBaseMirror {
        KnowledgeBaseMirror::new(self.durable_kb(), self.ephemeral_kb())
    }

    /// Make sure the durable tree exists, repairing an interrupted promotion first.
    pub fn ensure_knowledge_base(&self) -> Result<PathBuf> {
        let durable = self.durable_kb();
        recover_interrupted_promotion(&durable)?;
        fs::create_dir_all(&durable).map_err(|e| Error::tree(&durable, e))?;
        Ok(durable)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Invalid project name: '{}'",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("projects");
        let source = dir.path().join("source");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&source).unwrap();
        (dir, root, source)
    }

    #[test]
    fn test_create_then_open() {
        let (_dir, root, source) = setup();
        let created = Project::create(&root, "demo", &source).unwrap();
        assert!(created.durable_kb().is_dir());
        assert!(created.source_dir.is_absolute());

        let opened = Project::open(&root, "demo").unwrap();
        assert_eq!(opened.name, "demo");
        assert_eq!(opened.source_dir, created.source_dir);
        assert_eq!(
            opened.ephemeral_kb(),
            created.source_dir.join(KNOWLEDGE_BASE_DIR)
        );
    }

    #[test]
    fn test_create_twice_fails() {
        let (_dir, root, source) = setup();
        Project::create(&root, "demo", &source).unwrap();
        assert!(matches!(
            Project::create(&root, "demo", &source),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_open_missing_project_names_path() {
        let (_dir, root, _source) = setup();
        let err = Project::open(&root, "nope").unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound(_)));
        assert!(err.to_string().contains("nope"));
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_open_without_input_dir_is_config_error() {
        let (_dir, root, _source) = setup();
        fs::create_dir_all(root.join("demo")).unwrap();
        fs::write(root.join("demo").join(PROJECT_FILE), "project_name: demo\n").unwrap();
        let err = Project::open(&root, "demo").unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("input_dir")));
    }

    #[test]
    fn test_open_with_missing_source_dir() {
        let (dir, root, _source) = setup();
        fs::create_dir_all(root.join("demo")).unwrap();
        let gone = dir.path().join("gone");
        fs::write(
            root.join("demo").join(PROJECT_FILE),
            format!("input_dir: {}\n", gone.display()),
        )
        .unwrap();
        let err = Project::open(&root, "demo").unwrap_err();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let (_dir, root, source) = setup();
        for name in ["", "..", "a/b"] {
            assert!(Project::create(&root, name, &source).is_err());
        }
    }

    #[test]
    fn test_ensure_knowledge_base_recovers() {
        let (_dir, root, source) = setup();
        let project = Project::create(&root, "demo", &source).unwrap();
        let durable = project.durable_kb();
        fs::write(durable.join("001_a.md"), "alpha").unwrap();
        fs::rename(&durable, crate::mirror::previous_path(&durable)).unwrap();

        project.ensure_knowledge_base().unwrap();
        assert_eq!(fs::read_to_string(durable.join("001_a.md")).unwrap(), "alpha");
    }
}
