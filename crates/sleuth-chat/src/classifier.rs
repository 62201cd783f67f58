//! Intent classification.
//!
//! An ordered table of keyword rules. Rules are evaluated top to bottom and
//! the first match decides the intent, so a query that mentions several
//! capabilities ("find the risk for accounts of kash") always resolves the
//! same way: investigation, then intelligence, then analysis, then reporting,
//! falling back to general.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{GeneralTopic, QueryIntent};

/// One classification rule.
#[derive(Debug)]
pub struct IntentRule {
    pub intent: QueryIntent,
    pub name: &'static str,
    pattern: Regex,
}

impl IntentRule {
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

static INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    let mk = |intent: QueryIntent, pats: &[(&'static str, &str)]| -> Vec<IntentRule> {
        pats.iter()
            .map(|&(name, p)| IntentRule {
                intent,
                name,
                pattern: Regex::new(p).expect("Invalid intent regex"),
            })
            .collect()
    };

    let mut rules = Vec::new();
    rules.extend(mk(
        QueryIntent::Investigation,
        &[
            ("find", r"(?i)\bfind\b"),
            ("search", r"(?i)\bsearch(?:es|ing)?\b"),
            ("locate", r"(?i)\blocate\b"),
            ("look_up", r"(?i)\blook\s*up\b"),
            ("discover", r"(?i)\bdiscover\b"),
            ("enumerate", r"(?i)\benumerate\b"),
            ("accounts_of", r"(?i)\baccounts?\s+(?:of|for)\b"),
            (
                "where_registered",
                r"(?i)\bwhere\b.*\b(?:registered|signed\s+up|active)\b",
            ),
        ],
    ));
    rules.extend(mk(
        QueryIntent::Intelligence,
        &[
            ("suspicious", r"(?i)\bsuspicious\b"),
            (
                "risk_for_platform",
                r"(?i)\brisk\s+(?:for|per|by|on)\s+(?:each\s+)?platforms?\b",
            ),
            (
                "riskiest",
                r"(?i)\briskiest\b|\bhighest[\s\-]+risk\b|\bmost\s+(?:dangerous|risky)\b",
            ),
            ("threat", r"(?i)\bthreats?\b"),
            (
                "authenticity",
                r"(?i)\b(?:fake|scam(?:mer)?|fraud(?:ulent)?|legit(?:imate)?|an?\s+bot|bots)\b",
            ),
            ("risky", r"(?i)\b(?:risky|dangerous)\b"),
        ],
    ));
    rules.extend(mk(
        QueryIntent::Analysis,
        &[
            ("risk_score", r"(?i)\brisk\s+score\b"),
            ("analyze", r"(?i)\banaly[sz](?:e|es|ed|is|ing)\b"),
            ("risk_level", r"(?i)\brisk\s+level\b"),
            ("risk_assessment", r"(?i)\brisk\s+(?:assessment|rating)\b"),
            ("score", r"(?i)\bscore\b"),
        ],
    ));
    rules.extend(mk(
        QueryIntent::Reporting,
        &[
            ("report", r"(?i)\breports?\b"),
            ("summary", r"(?i)\bsummary\b"),
            ("summarize", r"(?i)\bsummari[sz]e\b"),
        ],
    ));
    rules
});

static GREETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:hi|hello|hey|howdy|yo|good\s+(?:morning|afternoon|evening))\b")
        .expect("Invalid greeting regex")
});

static THANKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:thanks|thank\s+you|thx|cheers)\b").expect("Invalid thanks regex")
});

/// Stateless intent classifier over the static rule table.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &'static [IntentRule] {
        INTENT_RULES.as_slice()
    }

    /// Classify `text` into exactly one intent.
    pub fn classify(&self, text: &str) -> QueryIntent {
        self.matching_rule(text)
            .map(|rule| rule.intent)
            .unwrap_or(QueryIntent::General)
    }

    /// The first rule that matches, if any.
    pub fn matching_rule(&self, text: &str) -> Option<&'static IntentRule> {
        self.rules().iter().find(|rule| rule.matches(text))
    }
}

/// Pick the canned reply flavour for a general query.
pub fn general_topic(text: &str) -> GeneralTopic {
    if THANKS_RE.is_match(text) {
        GeneralTopic::Thanks
    } else if GREETING_RE.is_match(text) {
        GeneralTopic::Greeting
    } else {
        GeneralTopic::Help
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> QueryIntent {
        IntentClassifier::new().classify(text)
    }

    #[test]
    fn test_investigation() {
        assert_eq!(classify("Find all accounts of kash"), QueryIntent::Investigation);
        assert_eq!(classify("search the username kash"), QueryIntent::Investigation);
        assert_eq!(classify("Look up johnny"), QueryIntent::Investigation);
        assert_eq!(classify("lookup johnny"), QueryIntent::Investigation);
        assert_eq!(classify("where is kash registered?"), QueryIntent::Investigation);
        assert_eq!(classify("accounts for z3r0"), QueryIntent::Investigation);
    }

    #[test]
    fn test_intelligence() {
        assert_eq!(classify("Is it suspicious?"), QueryIntent::Intelligence);
        assert_eq!(
            classify("which platform has the highest risk?"),
            QueryIntent::Intelligence
        );
        assert_eq!(classify("show risk for each platform"), QueryIntent::Intelligence);
        assert_eq!(classify("is kash a scammer"), QueryIntent::Intelligence);
        assert_eq!(classify("any threats here?"), QueryIntent::Intelligence);
        assert_eq!(classify("is this profile fake"), QueryIntent::Intelligence);
    }

    #[test]
    fn test_analysis() {
        assert_eq!(classify("What's the risk score?"), QueryIntent::Analysis);
        assert_eq!(classify("analyze kash"), QueryIntent::Analysis);
        assert_eq!(classify("run an analysis"), QueryIntent::Analysis);
        assert_eq!(classify("what risk level is kash"), QueryIntent::Analysis);
        assert_eq!(classify("give me a score"), QueryIntent::Analysis);
    }

    #[test]
    fn test_reporting() {
        assert_eq!(classify("Generate a report"), QueryIntent::Reporting);
        assert_eq!(classify("give me a summary"), QueryIntent::Reporting);
        assert_eq!(classify("summarise it"), QueryIntent::Reporting);
    }

    #[test]
    fn test_general() {
        assert_eq!(classify("hello"), QueryIntent::General);
        assert_eq!(classify("thanks!"), QueryIntent::General);
        assert_eq!(classify("what can you do?"), QueryIntent::General);
        assert_eq!(classify(""), QueryIntent::General);
    }

    #[test]
    fn test_bot_only_as_accusation() {
        assert_eq!(classify("is kash a bot?"), QueryIntent::Intelligence);
        assert_eq!(classify("are these accounts bots"), QueryIntent::Intelligence);
        assert_eq!(classify("what can this bot do?"), QueryIntent::General);
        assert_eq!(general_topic("what can this bot do?"), GeneralTopic::Help);
    }

    #[test]
    fn test_precedence_investigation_over_everything() {
        assert_eq!(
            classify("find the risk for accounts of kash"),
            QueryIntent::Investigation
        );
        assert_eq!(
            classify("search and report on suspicious accounts"),
            QueryIntent::Investigation
        );
    }

    #[test]
    fn test_precedence_intelligence_over_analysis_and_reporting() {
        assert_eq!(
            classify("analyze whether kash is suspicious"),
            QueryIntent::Intelligence
        );
        assert_eq!(
            classify("report the riskiest platform"),
            QueryIntent::Intelligence
        );
    }

    #[test]
    fn test_precedence_analysis_over_reporting() {
        assert_eq!(
            classify("include the risk score in a report"),
            QueryIntent::Analysis
        );
    }

    #[test]
    fn test_matching_rule_names() {
        let c = IntentClassifier::new();
        assert_eq!(c.matching_rule("Find kash").map(|r| r.name), Some("find"));
        assert_eq!(
            c.matching_rule("What's the risk score?").map(|r| r.name),
            Some("risk_score")
        );
        assert!(c.matching_rule("hello").is_none());
    }

    #[test]
    fn test_rules_grouped_by_precedence() {
        let rules = IntentClassifier::new().rules();
        let order: Vec<QueryIntent> = rules.iter().map(|r| r.intent).collect();
        let mut last_rank = 0;
        for intent in order {
            let rank = QueryIntent::ALL
                .iter()
                .position(|i| *i == intent)
                .unwrap();
            assert!(rank >= last_rank, "rule table out of precedence order");
            last_rank = rank;
        }
        assert!(rules.iter().all(|r| r.intent != QueryIntent::General));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let c = IntentClassifier::new();
        let text = "analyze and report on kash";
        let first = c.classify(text);
        for _ in 0..10 {
            assert_eq!(c.classify(text), first);
        }
    }

    #[test]
    fn test_general_topic() {
        assert_eq!(general_topic("hello there"), GeneralTopic::Greeting);
        assert_eq!(general_topic("Good morning"), GeneralTopic::Greeting);
        assert_eq!(general_topic("thanks a lot"), GeneralTopic::Thanks);
        assert_eq!(general_topic("hi, thank you"), GeneralTopic::Thanks);
        assert_eq!(general_topic("what can you do?"), GeneralTopic::Help);
    }
}
