//! Heuristic mock analyzer
//!
//! Stands in for a remote AI backend: no credentials, no network. Produces
//! a plausible [`ProcessedData`] from simple string patterns, simulates
//! provider latency, and injects random failures so the retry and
//! failed-state paths get exercised in normal use. Both the delay and the
//! failure probability are injectable so tests run deterministically.

use super::{Analyzer, ProcessedData};
use crate::analyze::normalize::{truncate_topic, FALLBACK_ACTION, FALLBACK_CATEGORY};
use crate::config::MockSettings;
use crate::error::ProviderError;
use std::time::Duration;

/// Local heuristic analyzer
#[derive(Debug, Clone)]
pub struct MockAnalyzer {
    /// Simulated network latency
    delay: Duration,
    /// Probability of an injected failure per call (0.0 - 1.0)
    failure_rate: f64,
}

impl MockAnalyzer {
    /// Create a mock analyzer from settings
    pub fn new(settings: &MockSettings) -> Self {
        Self {
            delay: Duration::from_millis(settings.delay_ms),
            failure_rate: settings.failure_rate,
        }
    }

    /// Create a mock analyzer with explicit parameters
    pub fn with_params(delay: Duration, failure_rate: f64) -> Self {
        Self {
            delay,
            failure_rate,
        }
    }

    /// Instant, never-failing analyzer
    pub fn instant() -> Self {
        Self::with_params(Duration::ZERO, 0.0)
    }
}

impl Analyzer for MockAnalyzer {
    fn analyze(&self, text: &str, _template: &str) -> Result<ProcessedData, ProviderError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            tracing::debug!("Mock analyzer injecting a failure");
            return Err(ProviderError::InjectedFailure);
        }

        Ok(heuristic_analysis(text))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Pattern-based analysis of the captured text
pub fn heuristic_analysis(text: &str) -> ProcessedData {
    let lower = text.to_lowercase();

    // Capitalized tokens longer than 4 characters, first three in order
    let entities: Vec<String> = text
        .split_whitespace()
        .filter(|word| {
            word.chars().count() > 4
                && word.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        })
        .take(3)
        .map(str::to_string)
        .collect();

    // A question mark wins over every vocabulary match
    let intent = if text.contains('?') {
        "question"
    } else if contains_any(&lower, &["buy", "purchase", "get", "pick up"]) {
        "shopping"
    } else if contains_any(&lower, &["meet", "call", "talk", "discuss", "appointment"]) {
        "meeting"
    } else if contains_any(&lower, &["todo", "task", "remember", "don't forget"]) {
        "task"
    } else {
        "note"
    };

    let mut action_items = Vec::new();
    if contains_any(&lower, &["call", "email", "contact", "reach out"]) {
        action_items.push("Contact someone".to_string());
    }
    if contains_any(&lower, &["buy", "purchase", "get"]) {
        action_items.push("Purchase items".to_string());
    }
    if contains_any(&lower, &["schedule", "plan", "arrange"]) {
        action_items.push("Schedule event".to_string());
    }
    if contains_any(&lower, &["review", "check", "look at"]) {
        action_items.push("Review information".to_string());
    }
    if action_items.is_empty() {
        action_items.push(FALLBACK_ACTION.to_string());
    }

    let mut categories = Vec::new();
    if contains_any(&lower, &["work", "project", "client", "meeting", "deadline"]) {
        categories.push("Work".to_string());
    }
    if contains_any(&lower, &["buy", "shop", "store", "purchase", "price"]) {
        categories.push("Shopping".to_string());
    }
    if contains_any(
        &lower,
        &["eat", "food", "restaurant", "lunch", "dinner", "breakfast"],
    ) {
        categories.push("Food".to_string());
    }
    if contains_any(&lower, &["family", "kids", "parents", "home"]) {
        categories.push("Personal".to_string());
    }
    if categories.is_empty() {
        categories.push(FALLBACK_CATEGORY.to_string());
    }

    ProcessedData {
        topic: truncate_topic(text),
        entities,
        intent: intent.to_string(),
        categories,
        action_items,
    }
}

fn contains_any(lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| lower.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_wins_over_meeting_vocabulary() {
        let data = heuristic_analysis("Call John tomorrow about the budget?");
        assert_eq!(data.intent, "question");
        assert!(data.action_items.contains(&"Contact someone".to_string()));
    }

    #[test]
    fn test_shopping_text() {
        let data = heuristic_analysis("Buy milk and eggs");
        assert_eq!(data.intent, "shopping");
        assert!(data.categories.contains(&"Shopping".to_string()));
        assert!(data.action_items.contains(&"Purchase items".to_string()));
    }

    #[test]
    fn test_meeting_text() {
        let data = heuristic_analysis("Discuss the roadmap with the client");
        assert_eq!(data.intent, "meeting");
        assert!(data.categories.contains(&"Work".to_string()));
    }

    #[test]
    fn test_task_text() {
        let data = heuristic_analysis("Remember to water the plants");
        assert_eq!(data.intent, "task");
    }

    #[test]
    fn test_plain_note() {
        let data = heuristic_analysis("The sky was overcast all morning");
        assert_eq!(data.intent, "note");
        assert_eq!(data.categories, vec![FALLBACK_CATEGORY]);
        assert_eq!(data.action_items, vec![FALLBACK_ACTION]);
    }

    #[test]
    fn test_entities_capitalized_tokens() {
        let data = heuristic_analysis(
            "Arrange travel for Margaret and Jonathan via Heathrow then Brussels",
        );
        // First three capitalized tokens longer than 4 chars, in order
        assert_eq!(data.entities, vec!["Arrange", "Margaret", "Jonathan"]);
    }

    #[test]
    fn test_entities_short_or_lowercase_excluded() {
        let data = heuristic_analysis("meet Anna at HQ about budget");
        assert!(data.entities.is_empty());
    }

    #[test]
    fn test_action_items_fixed_order() {
        let data = heuristic_analysis("Email the team, buy supplies, plan the review");
        assert_eq!(
            data.action_items,
            vec![
                "Contact someone",
                "Purchase items",
                "Schedule event",
                "Review information"
            ]
        );
    }

    #[test]
    fn test_categories_union_in_fixed_order() {
        let data = heuristic_analysis("Buy lunch for the project team at home");
        assert_eq!(data.categories, vec!["Work", "Shopping", "Food", "Personal"]);
    }

    #[test]
    fn test_topic_truncation() {
        let data =
            heuristic_analysis("Pick up the dry cleaning before the shop closes tonight");
        assert!(data.topic.ends_with("..."));
    }

    #[test]
    fn test_injected_failure_is_deterministic_at_extremes() {
        let always = MockAnalyzer::with_params(Duration::ZERO, 1.0);
        assert!(matches!(
            always.analyze("anything", ""),
            Err(ProviderError::InjectedFailure)
        ));

        let never = MockAnalyzer::instant();
        assert!(never.analyze("anything", "").is_ok());
    }

    #[test]
    fn test_from_settings() {
        let settings = MockSettings {
            delay_ms: 0,
            failure_rate: 0.0,
        };
        let analyzer = MockAnalyzer::new(&settings);
        assert_eq!(analyzer.name(), "mock");
        assert!(analyzer.analyze("hello", "").is_ok());
    }
}
