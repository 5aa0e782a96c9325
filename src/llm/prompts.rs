//! System prompts for the auxiliary transforms.

/// Produces a short title for a knowledge unit.
pub const TITLE_SYSTEM: &str = "You write titles for knowledge base sections. Given the text of a section, reply with a concise title of at most six words. Reply with the title only, without quotes or punctuation at the end.";

/// Extracts the ids of units an update request modifies.
pub const MODIFIED_IDS_SYSTEM: &str = "You are given a proposed change to a knowledge base whose units are numbered. List the ids of the units the change modifies. Do not list units that are only added or deleted. Reply with a comma-separated list of integers such as 1,2,4, or with nothing if no unit is modified. Do not add any other text.";

/// Converts an update request into a command script.
pub const COMMANDS_SYSTEM: &str = r#"You maintain a knowledge base by emitting commands in an XML format. You may emit several commands in one reply.

Commands:
1. ADD: <cmd type="add">TEXT</cmd>
2. MODIFY: <cmd type="modify" id="1">TEXT</cmd>
3. DELETE: <cmd type="delete" id="2" />

Rules:
- "id" is the integer id of an existing unit.
- TEXT is the complete markdown content of the unit. It may span lines and contain quotes; do not escape them.
- A modify replaces the whole unit, so repeat every part that should be kept.
- Emit nothing but commands.

The user message contains the requested update followed by the current content of the units it modifies."#;

/// Turns selected knowledge units into a reusable prompt snippet.
pub const COMPOSE_SYSTEM: &str = "You are given a JSON array of knowledge base units. Compose them into one coherent markdown document that can be pasted into another AI assistant's prompt as background context. Keep every fact, remove repetition, order the material so terms are defined before use, and keep it concise. Reply with the document only.";

/// Build the user message for [`COMMANDS_SYSTEM`].
pub fn commands_request(update_request: &str, existing_units: &[(u32, String)]) -> String {
    let mut out = String::from("## Requested update\n\n");
    out.push_str(update_request.trim());
    out.push_str("\n\n## Units to modify\n");
    if existing_units.is_empty() {
        out.push_str("\n(none)\n");
    }
    for (id, content) in existing_units {
        out.push_str(&format!("\n### Unit {}\n\n{}\n", id, content.trim_end()));
    }
    out
}
