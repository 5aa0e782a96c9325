//! Built-in role definitions.
//!
//! The role prompts are compiled into the binary. The session roles are:
//! - **synthesize**: build and extend the knowledge base from the sources
//! - **digest**: reorganize the knowledge base (starts without a question)
//! - **triage**: investigate an issue and record findings
//! - **ask**: read-only question answering
//! - **update**: read-only planning of a patch that is applied afterwards
//! - **research**: single-turn read-only notes for the batch research flow

use crate::agents::definitions::{
    ROLE_ASK, ROLE_DIGEST, ROLE_RESEARCH, ROLE_SYNTHESIZE, ROLE_TRIAGE, ROLE_UPDATE,
    ReasoningEffort, RoleDefinition,
};

// Embedded prompt content (included at compile time)
const SYNTHESIZE_PROMPT: &str = include_str!("embedded/synthesize.md");
const DIGEST_PROMPT: &str = include_str!("embedded/digest.md");
const TRIAGE_PROMPT: &str = include_str!("embedded/triage.md");
const ASK_PROMPT: &str = include_str!("embedded/ask.md");
const UPDATE_PROMPT: &str = include_str!("embedded/update.md");
const RESEARCH_PROMPT: &str = include_str!("embedded/research.md");

pub fn synthesize() -> RoleDefinition {
    RoleDefinition {
        name: ROLE_SYNTHESIZE,
        description: "Build and extend the knowledge base from the source documents",
        prompt_template: SYNTHESIZE_PROMPT,
        opening_question: Some("What should we work on?"),
        reasoning_effort: ReasoningEffort::Medium,
        first_title: "SYNTHESIZE AGENT RESPONSE",
        followup_title: "FOLLOW-UP RESPONSE",
    }
}

pub fn digest() -> RoleDefinition {
    RoleDefinition {
        name: ROLE_DIGEST,
        description: "Reorganize the knowledge base for readability",
        prompt_template: DIGEST_PROMPT,
        opening_question: None,
        reasoning_effort: ReasoningEffort::High,
        first_title: "DIGEST AGENT RESPONSE",
        followup_title: "FOLLOW-UP RESPONSE",
    }
}

pub fn triage() -> RoleDefinition {
    RoleDefinition {
        name: ROLE_TRIAGE,
        description: "Investigate an issue against the knowledge base and record findings",
        prompt_template: TRIAGE_PROMPT,
        opening_question: Some("What should we triage?"),
        reasoning_effort: ReasoningEffort::Medium,
        first_title: "TRIAGE AGENT RESPONSE",
        followup_title: "FOLLOW-UP RESPONSE",
    }
}

pub fn ask() -> RoleDefinition {
    RoleDefinition {
        name: ROLE_ASK,
        description: "Answer questions from the knowledge base (read-only)",
        prompt_template: ASK_PROMPT,
        opening_question: Some("What would you like to know?"),
        reasoning_effort: ReasoningEffort::Low,
        first_title: "ANSWER",
        followup_title: "FOLLOW-UP ANSWER",
    }
}

pub fn update() -> RoleDefinition {
    RoleDefinition {
        name: ROLE_UPDATE,
        description: "Plan a knowledge base patch with the agent, then apply it",
        prompt_template: UPDATE_PROMPT,
        opening_question: Some("What would you like to update?"),
        reasoning_effort: ReasoningEffort::Medium,
        first_title: "PROPOSED UPDATE",
        followup_title: "REVISED UPDATE",
    }
}

pub fn research() -> RoleDefinition {
    RoleDefinition {
        name: ROLE_RESEARCH,
        description: "Write one research note per topic",
        prompt_template: RESEARCH_PROMPT,
        opening_question: None,
        reasoning_effort: ReasoningEffort::Medium,
        first_title: "RESEARCH NOTE",
        followup_title: "RESEARCH NOTE",
    }
}

/// Get all built-in roles.
pub fn all_roles() -> Vec<RoleDefinition> {
    vec![
        synthesize(),
        digest(),
        triage(),
        ask(),
        update(),
        research(),
    ]
}

/// Look up a built-in role by name.
pub fn get_role(name: &str) -> Option<RoleDefinition> {
    all_roles().into_iter().find(|role| role.name == name)
}
