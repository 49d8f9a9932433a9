//! Prompt composition: persona, history window, inventory snapshot,
//! retrieved protocols, patient details and the task directive, in a
//! fixed order, followed by the user query and the image (last, so
//! vision attention binds to the preceding textual context).

use crate::gemini::Part;
use crate::store::inventory::Inventory;
use crate::store::knowledge::Protocol;

use super::types::{ConversationTurn, ImageAttachment, PatientMetadata, Role};

/// Trailing history turns carried into the prompt.
const HISTORY_WINDOW: usize = 6;

/// Numeric legend mapping body regions to codes, so the model's
/// location output is machine-parseable.
pub const SPOT_MAP: &str = "1: Head, 3: Face, 5: Neck, 8: Chest, 11: Abdomen, \
13-18: Arms, 19-20: Hands, 21-28: Legs, 29-30: Feet";

const PERSONA: &str = "PERSONA: You are Dr. Guardian, a senior school nurse and \
emergency first-aid expert. Your tone is professional, expert, and ultra-concise.";

const TASK: &str = "TASK:
1. Analyze the visuals and the query.
2. Use the provided CONTEXT DATA for steps.
3. CROSS-REFERENCE with AVAILABLE INVENTORY. Tell the user what to use from inventory.
4. If a critical item is missing but needed (e.g. bandage, antiseptic), WARN specifically.
5. Be direct. No filler phrases.
6. REFER TO PREVIOUS STEPS (History) if relevant. Avoid repeating instructions already given.";

const FORMAT: &str = "FORMAT (MUST BE LAST LINES):
[SPOT_ID: <number>]
[PROCEDURE: <step_1>, <step_2>, ...]
[SEARCH: <missing_item_1>, <item_to_use_from_inventory>, ...]";

/// Assemble the full request: one instruction part, the literal user
/// query part, and the image part when present.
pub fn compose(
    query: &str,
    history: &[ConversationTurn],
    inventory: &Inventory,
    matches: &[&Protocol],
    metadata: &PatientMetadata,
    language: &str,
    image: Option<&ImageAttachment>,
) -> Vec<Part> {
    let mut instruction = String::new();

    instruction.push_str(PERSONA);
    instruction.push_str("\n\n");

    render_history(&mut instruction, history);
    render_inventory(&mut instruction, inventory);
    render_matches(&mut instruction, matches);
    render_metadata(&mut instruction, metadata);

    instruction.push_str(TASK);
    instruction.push_str("\n\n");
    instruction.push_str(&format!("SPOT MAP: {SPOT_MAP}\n\n"));
    instruction.push_str(FORMAT);
    instruction.push_str("\n\n");
    instruction.push_str(&format!("LANGUAGE: You must strictly respond in {language}.\n"));

    let mut parts = vec![Part::Text(instruction), Part::Text(format!("User Query: {query}"))];
    if let Some(image) = image {
        parts.push(Part::InlineImage {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
        });
    }
    parts
}

fn render_history(out: &mut String, history: &[ConversationTurn]) {
    let window = history.len().saturating_sub(HISTORY_WINDOW);
    let recent = &history[window..];
    if recent.is_empty() {
        return;
    }
    out.push_str("CONVERSATION HISTORY:\n");
    for turn in recent {
        let label = match turn.role {
            Role::User => "Patient",
            Role::Assistant => "Dr. Guardian",
        };
        out.push_str(&format!("{label}: {}\n", turn.text));
    }
    out.push('\n');
}

fn render_inventory(out: &mut String, inventory: &Inventory) {
    out.push_str("AVAILABLE INVENTORY (Medicines & Equipment):\n");
    if inventory.medicines.is_empty() {
        out.push_str("- (none)\n");
    }
    for item in &inventory.medicines {
        out.push_str(&format!("- {item}\n"));
    }
    out.push('\n');
}

fn render_matches(out: &mut String, matches: &[&Protocol]) {
    out.push_str("CONTEXT DATA:\n");
    if matches.is_empty() {
        out.push_str("(no matching protocol)\n");
    }
    for protocol in matches {
        out.push_str(&format!(
            "Protocol: {} (grade {})\n",
            protocol.title, protocol.grade_level
        ));
        for (index, step) in protocol.steps.iter().enumerate() {
            out.push_str(&format!("  {}. {step}\n", index + 1));
        }
        for flag in &protocol.red_flags {
            out.push_str(&format!("  RED FLAG: {flag}\n"));
        }
    }
    out.push('\n');
}

fn render_metadata(out: &mut String, metadata: &PatientMetadata) {
    let field = |value: &Option<String>| -> String {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or("N/A")
            .to_string()
    };
    out.push_str(&format!(
        "PATIENT DETAILS:\n- Age: {}, Gender: {}, Location: {}, Duration: {}\n\n",
        field(&metadata.age),
        field(&metadata.gender),
        field(&metadata.location),
        field(&metadata.duration),
    ));
}
