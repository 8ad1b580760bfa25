//! Response normalization for analysis providers
//!
//! AI backends return anything from clean JSON to loosely labeled prose.
//! Normalization converts whatever came back into a fixed [`ProcessedData`]
//! record and never fails: a reply the parser cannot make sense of degrades
//! to a deterministic fallback record instead of an error. The attempt
//! order is fixed and load-bearing: JSON first, then labeled text, then
//! the fallback.

use super::ProcessedData;
use regex::Regex;

/// Fallback category when none could be extracted
pub const FALLBACK_CATEGORY: &str = "Miscellaneous";

/// Fallback action item when none could be extracted
pub const FALLBACK_ACTION: &str = "No action needed";

/// Default intent when none could be extracted
pub const DEFAULT_INTENT: &str = "note";

/// Normalize a raw provider reply into a structured record.
///
/// `original` is the captured clipboard text, used only to build the
/// fallback topic when the reply is unusable.
pub fn normalize(raw: &str, original: &str) -> ProcessedData {
    if raw.trim().is_empty() {
        return fallback_record(original);
    }

    if raw.contains('{') && raw.contains('}') {
        if let Some(data) = parse_json_block(raw) {
            return data;
        }
        tracing::debug!("No parseable JSON in reply, falling back to text patterns");
    }

    parse_labeled_text(raw)
}

/// Deterministic record built from the original text alone
pub fn fallback_record(original: &str) -> ProcessedData {
    let topic = if original.trim().is_empty() {
        "Unknown topic".to_string()
    } else {
        truncate_topic(original)
    };

    ProcessedData {
        topic,
        entities: Vec::new(),
        intent: DEFAULT_INTENT.to_string(),
        categories: vec![FALLBACK_CATEGORY.to_string()],
        action_items: vec![FALLBACK_ACTION.to_string()],
    }
}

/// Truncate text to a topic: cut at 30 characters, drop the trailing
/// partial word, append an ellipsis. Short text passes through unchanged.
pub fn truncate_topic(text: &str) -> String {
    if text.chars().count() <= 30 {
        return text.to_string();
    }

    let head: String = text.chars().take(30).collect();
    let mut words: Vec<&str> = head.split(' ').collect();
    words.pop();
    format!("{}...", words.join(" "))
}

/// Attempt to parse a JSON object embedded in the reply.
///
/// Tries the shortest brace span first (first `{` to first `}`), then the
/// outermost (first `{` to last `}`), so both "prose {..} prose" and
/// nested objects parse. Keys are matched case-insensitively with the
/// synonyms some models prefer (`mainTopic` for `topic`, `primaryIntent`
/// for `intent`).
fn parse_json_block(raw: &str) -> Option<ProcessedData> {
    let start = raw.find('{')?;
    let first_end = raw[start..].find('}').map(|i| start + i)?;
    let last_end = raw.rfind('}')?;

    let value: serde_json::Value = [first_end, last_end]
        .iter()
        .filter(|&&end| end > start)
        .find_map(|&end| serde_json::from_str(&raw[start..=end]).ok())?;
    let map = value.as_object()?;

    let lookup = |names: &[&str]| -> Option<&serde_json::Value> {
        map.iter()
            .find(|(key, _)| names.iter().any(|name| key.eq_ignore_ascii_case(name)))
            .map(|(_, value)| value)
    };

    let string_field = |names: &[&str], default: &str| -> String {
        lookup(names)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    // Non-array values coerce to an empty list rather than failing the parse
    let list_field = |names: &[&str]| -> Vec<String> {
        lookup(names)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };

    Some(ProcessedData {
        topic: string_field(&["topic", "mainTopic"], "Unknown topic"),
        entities: list_field(&["entities"]),
        intent: string_field(&["intent", "primaryIntent"], DEFAULT_INTENT),
        categories: non_empty_or(list_field(&["categories"]), FALLBACK_CATEGORY),
        action_items: non_empty_or(list_field(&["actionItems"]), FALLBACK_ACTION),
    })
}

/// Parse a loosely labeled free-text reply.
///
/// Single-value fields use a `label:` line match; list fields capture a
/// labeled block until a blank line or the next numbered item, then split
/// on commas and newlines with bullet markers stripped.
fn parse_labeled_text(raw: &str) -> ProcessedData {
    let topic = label_line(raw, &["topic", "subject"])
        .or_else(|| first_non_blank_line(raw))
        .unwrap_or_else(|| "Unknown topic".to_string());

    let intent =
        label_line(raw, &["intent", "purpose"]).unwrap_or_else(|| DEFAULT_INTENT.to_string());

    let entities = label_block(raw, &["entities"])
        .map(|block| split_list(&block))
        .unwrap_or_default();

    let categories = non_empty_or(
        label_block(raw, &["categories", "tags"])
            .map(|block| split_list(&block))
            .unwrap_or_default(),
        FALLBACK_CATEGORY,
    );

    let action_items = non_empty_or(
        label_block(raw, &["action items", "actions"])
            .map(|block| split_list(&block))
            .unwrap_or_default(),
        FALLBACK_ACTION,
    );

    ProcessedData {
        topic,
        entities,
        intent,
        categories,
        action_items,
    }
}

/// Match `label: value` anywhere in the text, first label wins
fn label_line(raw: &str, labels: &[&str]) -> Option<String> {
    for label in labels {
        let re = Regex::new(&format!(r"(?i){}:?[ \t]*(.*)", label)).unwrap();
        if let Some(caps) = re.captures(raw) {
            let value = caps[1].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Capture a labeled block: everything after `label:` up to a blank line,
/// the next numbered item, or end of input
fn label_block(raw: &str, labels: &[&str]) -> Option<String> {
    for label in labels {
        let re = Regex::new(&format!(r"(?i){}:?[ \t]*(.*(?:\n.*)*?)(?:\n\n|\n\d|$)", label)).unwrap();
        if let Some(caps) = re.captures(raw) {
            let value = caps[1].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Split a captured block on commas and newlines, stripping bullet markers
fn split_list(block: &str) -> Vec<String> {
    block
        .split(['\n', ','])
        .map(clean_entry)
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Trim an entry and drop a single leading bullet marker
fn clean_entry(entry: &str) -> String {
    let mut entry = entry.trim();
    if let Some(rest) = entry
        .strip_prefix('-')
        .or_else(|| entry.strip_prefix('*'))
        .or_else(|| entry.strip_prefix('•'))
    {
        entry = rest.trim_start();
    }
    entry.trim().to_string()
}

fn non_empty_or(list: Vec<String>, default: &str) -> Vec<String> {
    if list.is_empty() {
        vec![default.to_string()]
    } else {
        list
    }
}

fn first_non_blank_line(raw: &str) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip_exact() {
        let raw = serde_json::json!({
            "topic": "T",
            "intent": "I",
            "entities": ["a"],
            "categories": ["c"],
            "actionItems": ["x"]
        })
        .to_string();

        let data = normalize(&raw, "original");
        assert_eq!(data.topic, "T");
        assert_eq!(data.intent, "I");
        assert_eq!(data.entities, vec!["a"]);
        assert_eq!(data.categories, vec!["c"]);
        assert_eq!(data.action_items, vec!["x"]);
    }

    #[test]
    fn test_json_with_surrounding_prose() {
        let raw = r#"Here is the analysis you asked for: {"topic": "Grocery run", "intent": "shopping"} hope it helps"#;
        let data = normalize(raw, "original");
        assert_eq!(data.topic, "Grocery run");
        assert_eq!(data.intent, "shopping");
        assert_eq!(data.categories, vec![FALLBACK_CATEGORY]);
        assert_eq!(data.action_items, vec![FALLBACK_ACTION]);
    }

    #[test]
    fn test_json_first_object_wins_over_trailing_junk() {
        let raw = r#"{"topic": "First"} {"topic": "Second"}"#;
        let data = normalize(raw, "original");
        assert_eq!(data.topic, "First");
    }

    #[test]
    fn test_json_nested_object_parses_via_outer_span() {
        let raw = r#"{"topic": "Outer", "details": {"inner": true}}"#;
        let data = normalize(raw, "original");
        assert_eq!(data.topic, "Outer");
    }

    #[test]
    fn test_json_key_synonyms_case_insensitive() {
        let raw = r#"{"MainTopic": "Budget", "primaryintent": "meeting"}"#;
        let data = normalize(raw, "original");
        assert_eq!(data.topic, "Budget");
        assert_eq!(data.intent, "meeting");
    }

    #[test]
    fn test_json_non_array_lists_coerce_to_fallbacks() {
        let raw = r#"{"topic": "T", "entities": "not a list", "categories": 42}"#;
        let data = normalize(raw, "original");
        assert!(data.entities.is_empty());
        assert_eq!(data.categories, vec![FALLBACK_CATEGORY]);
        assert_eq!(data.action_items, vec![FALLBACK_ACTION]);
    }

    #[test]
    fn test_broken_json_falls_through_to_text() {
        let raw = "topic: Weekly sync\nintent: meeting\n{not json}";
        let data = normalize(raw, "original");
        assert_eq!(data.topic, "Weekly sync");
        assert_eq!(data.intent, "meeting");
    }

    #[test]
    fn test_labeled_text_full() {
        let raw = "Topic: Project kickoff\n\
                   Entities: Alice, Bob\n\n\
                   Intent: meeting\n\
                   Categories: Work, Planning\n\n\
                   Action items:\n\
                   - Book a room\n\
                   - Send the agenda";

        let data = normalize(raw, "original");
        assert_eq!(data.topic, "Project kickoff");
        assert_eq!(data.entities, vec!["Alice", "Bob"]);
        assert_eq!(data.intent, "meeting");
        assert_eq!(data.categories, vec!["Work", "Planning"]);
        assert_eq!(data.action_items, vec!["Book a room", "Send the agenda"]);
    }

    #[test]
    fn test_labeled_text_subject_and_tags_synonyms() {
        let raw = "Subject: Lunch plans\n\nTags: Food\n\nPurpose: note";
        let data = normalize(raw, "original");
        assert_eq!(data.topic, "Lunch plans");
        assert_eq!(data.categories, vec!["Food"]);
        assert_eq!(data.intent, "note");
    }

    #[test]
    fn test_block_stops_at_numbered_item() {
        let raw = "Categories: Work\n1. Something else entirely";
        let data = normalize(raw, "original");
        assert_eq!(data.categories, vec!["Work"]);
    }

    #[test]
    fn test_bullet_markers_stripped() {
        let raw = "Actions:\n* Call the vendor\n\u{2022} Update the sheet";
        let data = normalize(raw, "original");
        assert_eq!(data.action_items, vec!["Call the vendor", "Update the sheet"]);
    }

    #[test]
    fn test_plain_prose_uses_first_line_as_topic() {
        let raw = "Quarterly numbers look fine.\nNothing else to report.";
        let data = normalize(raw, "original");
        assert_eq!(data.topic, "Quarterly numbers look fine.");
        assert_eq!(data.intent, "note");
        assert_eq!(data.categories, vec![FALLBACK_CATEGORY]);
        assert_eq!(data.action_items, vec![FALLBACK_ACTION]);
    }

    #[test]
    fn test_blank_reply_uses_fallback_record() {
        let original = "This is a fairly long original text over thirty chars";
        let data = normalize("", original);
        assert!(data.topic.ends_with("..."));
        // At most 30 chars of content before the ellipsis
        assert!(data.topic.chars().count() <= 33);
        assert!(data.entities.is_empty());
        assert_eq!(data.intent, "note");
        assert_eq!(data.categories, vec![FALLBACK_CATEGORY]);
        assert_eq!(data.action_items, vec![FALLBACK_ACTION]);
    }

    #[test]
    fn test_garbage_never_panics_and_upholds_invariants() {
        let samples = [
            "}{",
            "{{{{",
            "\u{0}\u{1}\u{2}",
            "::::\n\n\n,,,,",
            "intent:",
            "{\"topic\": null}",
            "entities: ,,,",
        ];

        for raw in samples {
            let data = normalize(raw, "fallback text");
            assert!(!data.topic.is_empty(), "topic empty for {:?}", raw);
            assert!(!data.categories.is_empty(), "categories empty for {:?}", raw);
            assert!(
                !data.action_items.is_empty(),
                "action items empty for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_topic("Buy milk"), "Buy milk");
        // Exactly 30 characters passes through
        let exact: String = "x".repeat(30);
        assert_eq!(truncate_topic(&exact), exact);
    }

    #[test]
    fn test_truncate_cuts_at_word_boundary() {
        let text = "This is a fairly long original text over thirty chars";
        let topic = truncate_topic(text);
        assert!(topic.ends_with("..."));
        let body = topic.trim_end_matches("...");
        assert!(body.chars().count() <= 30);
        assert!(text.starts_with(body));
    }

    #[test]
    fn test_truncate_unbroken_word_degenerates_to_ellipsis() {
        let text = "x".repeat(40);
        assert_eq!(truncate_topic(&text), "...");
    }
}
