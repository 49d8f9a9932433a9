//! Keyword retrieval over the protocol knowledge base.
//!
//! Substring scoring, not tokenized or stemmed: a multi-word keyword
//! must appear verbatim in the query to match.

use crate::store::knowledge::Protocol;

/// Protocols a single prompt will carry.
const TOP_K: usize = 3;

/// A title hit outweighs any single keyword hit.
const TITLE_WEIGHT: u32 = 5;
const KEYWORD_WEIGHT: u32 = 1;

fn score(query: &str, protocol: &Protocol) -> u32 {
    let mut score = 0;
    let title = protocol.title.to_lowercase();
    if !title.is_empty() && query.contains(&title) {
        score += TITLE_WEIGHT;
    }
    for keyword in &protocol.keywords {
        let keyword = keyword.to_lowercase();
        if !keyword.is_empty() && query.contains(&keyword) {
            score += KEYWORD_WEIGHT;
        }
    }
    score
}

/// Top three protocols by score, descending; zero-score protocols are
/// dropped and ties keep knowledge-base order.
pub fn retrieve<'a>(query: &str, protocols: &'a [Protocol]) -> Vec<&'a Protocol> {
    let query = query.to_lowercase();
    let mut scored: Vec<(u32, &Protocol)> = protocols
        .iter()
        .filter_map(|protocol| {
            let score = score(&query, protocol);
            (score > 0).then_some((score, protocol))
        })
        .collect();

    // Stable sort: equal scores preserve document order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(TOP_K).map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol(title: &str, keywords: &[&str]) -> Protocol {
        Protocol {
            title: title.to_string(),
            grade_level: "6-8".to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            steps: vec![],
            red_flags: vec![],
        }
    }

    #[test]
    fn title_substring_match_ranks_first() {
        let protocols = vec![
            protocol("Sprain", &["ankle", "swelling"]),
            protocol("Laceration", &["cut"]),
        ];
        let matches = retrieve("student has a laceration and a cut on the ankle", &protocols);
        // Laceration: title (5) + "cut" (1); Sprain: "ankle" (1)
        assert_eq!(matches[0].title, "Laceration");
        assert_eq!(matches[1].title, "Sprain");
    }

    #[test]
    fn keyword_match_is_enough() {
        let protocols = vec![protocol("Laceration", &["cut", "bleeding"])];
        let matches = retrieve("deep cut on arm", &protocols);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Laceration");
    }

    #[test]
    fn zero_score_protocols_are_excluded() {
        let protocols = vec![
            protocol("Burn", &["scald", "blister"]),
            protocol("Nosebleed", &["nose"]),
        ];
        let matches = retrieve("my nose is bleeding", &protocols);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Nosebleed");
    }

    #[test]
    fn result_capped_at_three() {
        let protocols: Vec<Protocol> = (0..5)
            .map(|i| protocol(&format!("P{i}"), &["pain"]))
            .collect();
        let matches = retrieve("pain everywhere", &protocols);
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn ties_keep_knowledge_base_order() {
        let protocols = vec![
            protocol("First", &["pain"]),
            protocol("Second", &["pain"]),
            protocol("Third", &["pain"]),
        ];
        let matches = retrieve("sharp pain", &protocols);
        let titles: Vec<&str> = matches.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let protocols = vec![protocol("Laceration", &["CUT"])];
        assert_eq!(retrieve("DEEP CUT ON ARM", &protocols).len(), 1);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let protocols = vec![protocol("Laceration", &["cut"])];
        assert!(retrieve("", &protocols).is_empty());
    }

    #[test]
    fn empty_knowledge_base_returns_nothing() {
        assert!(retrieve("deep cut on arm", &[]).is_empty());
    }

    #[test]
    fn multiword_keyword_must_appear_verbatim() {
        let protocols = vec![protocol("Anaphylaxis", &["allergic reaction"])];
        assert!(retrieve("having a reaction that is allergic", &protocols).is_empty());
        assert_eq!(retrieve("severe allergic reaction", &protocols).len(), 1);
    }
}
