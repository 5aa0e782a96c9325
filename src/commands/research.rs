//! Parallel research notes.
//!
//! Each topic gets its own single-turn, read-only session over the durable
//! knowledge base. A fixed number of workers pull topics from a shared index;
//! notes are written in topic order once every session has finished.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agents::{AgentRunner, AgentSession, SessionMode, SessionSettings, embedded};
use crate::commands::{Output, role_overrides};
use crate::config::ResolvedConfig;
use crate::kb::slugify;
use crate::project::Project;
use crate::{Error, Result};

/// Directory under the project holding research notes.
pub const RESEARCH_DIR: &str = "research";

#[derive(Debug, Clone, Serialize)]
pub struct ResearchNote {
    pub topic: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchFailure {
    pub topic: String,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ResearchReport {
    pub notes: Vec<ResearchNote>,
    pub failures: Vec<ResearchFailure>,
}

impl ResearchReport {
    /// Fail when any topic could not be researched.
    pub fn ensure_complete(&self) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        let topics: Vec<&str> = self.failures.iter().map(|f| f.topic.as_str()).collect();
        Err(Error::Other(format!(
            "{} of {} research topics failed: {}",
            self.failures.len(),
            self.failures.len() + self.notes.len(),
            topics.join(", ")
        )))
    }
}

impl Output for ResearchReport {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for note in &self.notes {
            lines.push(format!("wrote {} ({})", note.path.display(), note.topic));
        }
        for failure in &self.failures {
            lines.push(format!("failed {}: {}", failure.topic, failure.error));
        }
        lines.join("\n")
    }
}

/// Read one topic per non-blank line.
pub fn read_topics(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| Error::tree(path, e))?;
    let topics: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if topics.is_empty() {
        return Err(Error::InvalidInput(format!(
            "No topics found in {}",
            path.display()
        )));
    }
    Ok(topics)
}

/// Research every topic with up to `workers` concurrent sessions.
pub fn research(
    project: &Project,
    config: &ResolvedConfig,
    runner: &dyn AgentRunner,
    topics: &[String],
    workers: usize,
) -> Result<ResearchReport> {
    let durable = project.ensure_knowledge_base()?;
    let role = embedded::research();
    let mode = SessionMode::ReadOnly;
    let settings = SessionSettings {
        working_dir: durable,
        sandbox: mode.sandbox(),
        model: config.llm.model.clone(),
        config_overrides: role_overrides(&role, config),
    };

    let next = AtomicUsize::new(0);
    let results: Mutex<Vec<Option<Result<String>>>> =
        Mutex::new(topics.iter().map(|_| None).collect());
    let workers = workers.clamp(1, topics.len().max(1));
    info!(topics = topics.len(), workers, "starting research");

    std::thread::scope(|scope| {
        for worker in 0..workers {
            let (next, results, settings, role) = (&next, &results, &settings, &role);
            scope.spawn(move || {
                loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(topic) = topics.get(index) else {
                        break;
                    };
                    debug!(worker, topic = %topic, "researching topic");
                    let mut session = AgentSession::new(runner, settings.clone());
                    let outcome = session
                        .start(&role.render(&project.source_dir, topic))
                        .map(|reply| reply.text);
                    let mut slots = results.lock().unwrap_or_else(PoisonError::into_inner);
                    slots[index] = Some(outcome);
                }
            });
        }
    });

    let out_dir = project.dir.join(RESEARCH_DIR);
    let mut report = ResearchReport::default();
    let results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
    for (index, (topic, outcome)) in topics.iter().zip(results).enumerate() {
        match outcome {
            Some(Ok(text)) => {
                fs::create_dir_all(&out_dir).map_err(|e| Error::tree(&out_dir, e))?;
                let path = out_dir.join(format!("{:03}_{}.md", index + 1, slugify(topic)));
                fs::write(&path, text).map_err(|e| Error::tree(&path, e))?;
                report.notes.push(ResearchNote {
                    topic: topic.clone(),
                    path,
                });
            }
            Some(Err(e)) => {
                warn!(topic = %topic, error = %e, "research topic failed");
                report.failures.push(ResearchFailure {
                    topic: topic.clone(),
                    error: e.to_string(),
                });
            }
            None => report.failures.push(ResearchFailure {
                topic: topic.clone(),
                error: "topic was never processed".to_string(),
            }),
        }
    }
    Ok(report)
}
