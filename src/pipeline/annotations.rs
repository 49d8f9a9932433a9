//! Parsing of the fixed-format trailing lines the model is instructed
//! to emit: `[SPOT_ID: n]`, `[PROCEDURE: …]`, `[SEARCH: …]`.
//!
//! Free-form prose stays human-readable; only the bracketed suffix is
//! machine-parseable. Markers are matched case-insensitively and
//! stripped from the display text.

use std::sync::LazyLock;

use regex::Regex;

use super::types::Annotations;

static SPOT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[SPOT_ID:\s*(\d+)\]").unwrap());

static PROCEDURE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[PROCEDURE:\s*([^\]]*)\]").unwrap());

static SEARCH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[SEARCH:\s*([^\]]*)\]").unwrap());

static MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[(?:SPOT_ID|PROCEDURE|SEARCH):[^\]]*\]").unwrap());

/// Parse the annotation suffix from a model reply. Missing or garbled
/// markers simply leave their field at the default.
pub fn parse(response: &str) -> Annotations {
    Annotations {
        spot_id: SPOT_PATTERN
            .captures(response)
            .and_then(|cap| cap[1].parse().ok()),
        procedure: list_capture(&PROCEDURE_PATTERN, response),
        search: list_capture(&SEARCH_PATTERN, response),
    }
}

fn list_capture(pattern: &Regex, response: &str) -> Vec<String> {
    pattern
        .captures(response)
        .map(|cap| {
            cap[1]
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Remove the annotation markers from the text shown to the user.
pub fn strip_markers(response: &str) -> String {
    MARKER_PATTERN.replace_all(response, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "Apply firm pressure with the bandage from inventory.\n\
[SPOT_ID: 14]\n\
[PROCEDURE: Apply pressure, Elevate the arm, Clean the wound]\n\
[SEARCH: antiseptic, bandage]";

    #[test]
    fn parses_all_three_markers() {
        let annotations = parse(REPLY);
        assert_eq!(annotations.spot_id, Some(14));
        assert_eq!(
            annotations.procedure,
            vec!["Apply pressure", "Elevate the arm", "Clean the wound"]
        );
        assert_eq!(annotations.search, vec!["antiseptic", "bandage"]);
    }

    #[test]
    fn markers_match_case_insensitively() {
        let annotations = parse("[spot_id: 3]\n[procedure: Rinse]\n[search: water]");
        assert_eq!(annotations.spot_id, Some(3));
        assert_eq!(annotations.procedure, vec!["Rinse"]);
    }

    #[test]
    fn missing_markers_leave_defaults() {
        let annotations = parse("Just prose, no markers.");
        assert_eq!(annotations, Annotations::default());
    }

    #[test]
    fn garbled_spot_id_is_none() {
        let annotations = parse("[SPOT_ID: left arm]");
        assert!(annotations.spot_id.is_none());
    }

    #[test]
    fn empty_list_items_are_dropped() {
        let annotations = parse("[SEARCH: gauze,, , tape]");
        assert_eq!(annotations.search, vec!["gauze", "tape"]);
    }

    #[test]
    fn strip_removes_markers_and_trims() {
        let display = strip_markers(REPLY);
        assert_eq!(display, "Apply firm pressure with the bandage from inventory.");
    }

    #[test]
    fn strip_is_identity_without_markers() {
        assert_eq!(strip_markers("plain advice"), "plain advice");
    }
}
