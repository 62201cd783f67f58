//! Username extraction.
//!
//! Pulls the target username out of a free-text query by running an ordered
//! list of phrase rules. Each rule proposes candidate tokens; the first
//! candidate that survives cleaning and the stop-word filter wins. A final
//! fallback looks at the trailing token, but only accepts it when it is
//! shaped like a username (contains a digit, `_`, `-`, or an interior `.`),
//! so that "is it suspicious?" never yields "suspicious".

use regex::Regex;
use std::sync::LazyLock;

/// Longest identifier accepted from a query.
pub const MAX_IDENTIFIER_LEN: usize = 64;

// =============================================================================
// Rules
// =============================================================================

/// How a rule's candidates are vetted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Anchored on a phrase ("accounts of X"): any non-stop-word token is accepted.
    Anchored,
    /// Anchored on a bare noun ("user X"): the token must also look like a username.
    Weak,
    /// Bare trailing token: must also look like a username.
    Fallback,
}

/// One named extraction rule. Capture group 1 holds the candidate.
#[derive(Debug)]
pub struct ExtractionRule {
    pub name: &'static str,
    pub kind: RuleKind,
    pattern: Regex,
}

impl ExtractionRule {
    fn new(name: &'static str, kind: RuleKind, pattern: &str) -> Self {
        Self {
            name,
            kind,
            pattern: Regex::new(pattern).expect("Invalid extraction regex"),
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Raw candidate tokens in the order they occur in `text`.
    pub fn candidates<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
    }
}

static EXTRACTION_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    use RuleKind::{Anchored, Fallback, Weak};
    vec![
        // "@kash"
        ExtractionRule::new("handle", Anchored, r"(?:^|[\s(,])@([A-Za-z0-9_.\-]+)"),
        // "accounts of kash", "account belonging to kash"
        ExtractionRule::new(
            "accounts_of",
            Anchored,
            r"(?i)\baccounts?\s+(?:of|for|belonging\s+to|named|called)\s+(\S+)",
        ),
        // "username kash", "username: kash", "username is kash"
        ExtractionRule::new(
            "username",
            Anchored,
            r"(?i)\b(?:username|user\s+name)(?:\s*[:=]\s*|\s+is\s+|\s+)(\S+)",
        ),
        // "profile of kash", "profile: kash", "profile named kash"
        ExtractionRule::new(
            "profile",
            Anchored,
            r"(?i)\bprofiles?(?:\s*[:=]\s*|\s+(?:of|for|is|named|called)\s+)(\S+)",
        ),
        // "handle: kash", "user named kash"
        ExtractionRule::new(
            "user_handle",
            Anchored,
            r"(?i)\b(?:user|handle|alias|nickname)(?:\s*[:=]\s*|\s+(?:is|named|called)\s+)(\S+)",
        ),
        // "user kash_99", "profile dark-knight"; "this user looks fake" must not match
        ExtractionRule::new(
            "bare_noun",
            Weak,
            r"(?i)\b(?:user|handle|alias|nickname|profiles?)\s+(\S+)",
        ),
        // "is kash suspicious?"
        ExtractionRule::new(
            "subject",
            Anchored,
            r"(?i)^\s*(?:is|was|does|did)\s+(\S+)\s+(?:suspicious|legit|legitimate|fake|a\s+bot|a\s+scam|risky|dangerous|safe|real)\b",
        ),
        // "risk score for kash"
        ExtractionRule::new("for", Anchored, r"(?i)\bfor\s+(\S+)"),
        // "report on kash", "summary on kash"
        ExtractionRule::new(
            "report_on",
            Anchored,
            r"(?i)\b(?:reports?|summary|overview|write-?up|dossier)\s+on\s+(\S+)",
        ),
        // "report about kash", "summary of kash"
        ExtractionRule::new(
            "about",
            Anchored,
            r"(?i)\b(?:about|regarding|of|named|called)\s+(\S+)",
        ),
        // "find kash", "analyze kash"
        ExtractionRule::new(
            "verb_object",
            Anchored,
            r"(?i)\b(?:find|search|locate|lookup|look\s+up|check|investigate|analy[sz]e|scan|trace|track|enumerate|discover)\s+(\S+)",
        ),
        ExtractionRule::new("trailing", Fallback, r"(\S+)\s*$"),
    ]
});

/// Tokens that are never usernames: function words, pronouns, and the
/// vocabulary of the queries themselves.
pub static STOP_WORDS: &[&str] = &[
    // determiners and quantifiers
    "a", "an", "the", "this", "that", "these", "those", "all", "any", "some", "every", "each",
    "my", "your", "his", "her", "their", "our", "its", "other", "another", "same", "more",
    // pronouns
    "i", "me", "you", "he", "she", "it", "they", "them", "we", "us", "him", "who", "what",
    "which", "whom", "whose", "one", "someone", "anyone", "everyone", "somebody", "anybody",
    "everything", "anything", "something",
    // prepositions, conjunctions, auxiliaries
    "of", "for", "on", "in", "at", "to", "with", "by", "from", "about", "and", "or", "is",
    "are", "was", "were", "be", "been", "do", "does", "did", "can", "could", "should",
    "would", "will", "please", "there", "here", "now", "then", "again", "too", "also",
    "how", "where", "why", "when", "if", "not", "up",
    // query vocabulary
    "name", "names", "user", "users", "username", "usernames", "account", "accounts",
    "profile", "profiles", "handle", "handles", "platform", "platforms", "site", "sites",
    "person", "people", "guy", "risk", "risks", "risky", "score", "scores", "level",
    "report", "reports", "summary", "analysis", "assessment", "threat", "threats",
    "suspicious", "info", "information", "details", "result", "results", "search", "find",
    "check", "social", "media", "online", "internet", "web",
    // predicates of follow-up questions
    "fake", "legit", "legitimate", "real", "safe", "look", "looks", "bot", "bots", "scam",
    "scammer", "dangerous", "active", "genuine", "trustworthy",
];

/// Whether `token` is a stop-word (case-insensitive).
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.iter().any(|w| w.eq_ignore_ascii_case(token))
}

// Platform filter: "... on GitHub and Reddit"
static PLATFORM_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bon\s+([A-Za-z0-9][A-Za-z0-9 .&+,\-]*?)\s*[?!.]*\s*$")
        .expect("Invalid platform clause regex")
});

static PLATFORM_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:,|&|\band\b|\bor\b)\s*").expect("Invalid platform split regex")
});

// =============================================================================
// Extractor
// =============================================================================

/// Stateless username extractor over the static rule table.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifierExtractor;

impl IdentifierExtractor {
    pub fn new() -> Self {
        Self
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &'static [ExtractionRule] {
        EXTRACTION_RULES.as_slice()
    }

    /// Extract the target username, or `None` when no rule yields one.
    pub fn extract(&self, text: &str) -> Option<String> {
        self.extract_with_rule(text).map(|(id, _)| id)
    }

    /// Like [`extract`](Self::extract), also naming the rule that matched.
    pub fn extract_with_rule(&self, text: &str) -> Option<(String, &'static str)> {
        for rule in self.rules() {
            for raw in rule.candidates(text) {
                let Some(token) = clean_token(raw) else {
                    continue;
                };
                if is_stop_word(token) {
                    continue;
                }
                if rule.kind != RuleKind::Anchored && !is_username_shaped(token) {
                    continue;
                }
                return Some((token.to_string(), rule.name));
            }
        }
        None
    }

    /// Platforms named in a trailing "on X, Y and Z" clause.
    ///
    /// The clause only counts when it directly follows the username
    /// ("accounts of kash on GitHub"), so "a report on kash" or
    /// "active on Monday" yield nothing.
    pub fn extract_platforms(&self, text: &str) -> Vec<String> {
        let Some(caps) = PLATFORM_CLAUSE_RE.captures(text) else {
            return Vec::new();
        };
        let (Some(whole), Some(clause)) = (caps.get(0), caps.get(1)) else {
            return Vec::new();
        };
        let prefix = &text[..whole.start()];
        let Some(identifier) = self.extract(prefix) else {
            return Vec::new();
        };
        let follows_identifier = prefix
            .split_whitespace()
            .last()
            .and_then(clean_token)
            .is_some_and(|last| last.eq_ignore_ascii_case(&identifier));
        if !follows_identifier {
            return Vec::new();
        }
        let clause = clause.as_str();

        let mut platforms: Vec<String> = Vec::new();
        for part in PLATFORM_SPLIT_RE.split(clause) {
            let name = part.trim().trim_end_matches('.');
            if name.is_empty() || name.split_whitespace().any(is_stop_word) {
                continue;
            }
            if !platforms.iter().any(|p| p.eq_ignore_ascii_case(name)) {
                platforms.push(name.to_string());
            }
        }
        platforms
    }
}

/// Strip surrounding punctuation and possessives. Returns `None` when nothing
/// usable remains.
fn clean_token(raw: &str) -> Option<&str> {
    let is_body = |c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.';
    let mut token = raw.trim_matches(|c: char| !is_body(c));
    for suffix in ["'s", "\u{2019}s"] {
        if let Some(stripped) = token.strip_suffix(suffix) {
            token = stripped;
        }
    }
    let token = token
        .trim_end_matches('.')
        .trim_matches(|c: char| !is_body(c));

    let valid = !token.is_empty()
        && token.chars().count() <= MAX_IDENTIFIER_LEN
        && token.chars().any(|c| c.is_alphanumeric())
        && token.chars().all(is_body);
    valid.then_some(token)
}

/// Heuristic for bare tokens: real words rarely carry digits or separators.
fn is_username_shaped(token: &str) -> bool {
    token.trim_matches('.').contains('.')
        || token
            .chars()
            .any(|c| c.is_ascii_digit() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<String> {
        IdentifierExtractor::new().extract(text)
    }

    fn rule_for(text: &str) -> Option<&'static str> {
        IdentifierExtractor::new()
            .extract_with_rule(text)
            .map(|(_, rule)| rule)
    }

    // =========================================================================
    // Phrase rules
    // =========================================================================

    #[test]
    fn test_accounts_of() {
        assert_eq!(extract("Find all accounts of kash").as_deref(), Some("kash"));
        assert_eq!(rule_for("Find all accounts of kash"), Some("accounts_of"));
    }

    #[test]
    fn test_handle_prefix() {
        assert_eq!(extract("what do you know about @kash_99?").as_deref(), Some("kash_99"));
        assert_eq!(rule_for("check @kash"), Some("handle"));
    }

    #[test]
    fn test_username_forms() {
        assert_eq!(extract("search the username kash").as_deref(), Some("kash"));
        assert_eq!(extract("username: kash").as_deref(), Some("kash"));
        assert_eq!(extract("the username is kash").as_deref(), Some("kash"));
    }

    #[test]
    fn test_profile_of() {
        assert_eq!(extract("show the profile of johnny").as_deref(), Some("johnny"));
    }

    #[test]
    fn test_user_handle() {
        assert_eq!(extract("look at the user named johnny").as_deref(), Some("johnny"));
        assert_eq!(extract("handle: z3r0cool").as_deref(), Some("z3r0cool"));
        assert_eq!(rule_for("handle: z3r0cool"), Some("user_handle"));
    }

    #[test]
    fn test_bare_noun_needs_username_shape() {
        assert_eq!(extract("look at user kash_99").as_deref(), Some("kash_99"));
        assert_eq!(rule_for("look at user kash_99"), Some("bare_noun"));
        assert_eq!(extract("look at user johnny"), None);
    }

    #[test]
    fn test_follow_up_predicates_are_not_usernames() {
        for text in [
            "does this user look fake?",
            "is this user legit?",
            "is this handle legit?",
            "is the profile fake?",
            "is this user a bot?",
            "does the profile look real?",
        ] {
            assert_eq!(extract(text), None, "{}", text);
        }
    }

    #[test]
    fn test_report_on() {
        assert_eq!(extract("write a report on kash").as_deref(), Some("kash"));
        assert_eq!(rule_for("write a report on kash"), Some("report_on"));
        assert_eq!(extract("give me a summary on johnny").as_deref(), Some("johnny"));
    }

    #[test]
    fn test_subject_question() {
        assert_eq!(extract("Is johnny suspicious?").as_deref(), Some("johnny"));
        assert_eq!(rule_for("Is johnny suspicious?"), Some("subject"));
    }

    #[test]
    fn test_for_phrase() {
        assert_eq!(extract("What's the risk score for kash?").as_deref(), Some("kash"));
        assert_eq!(extract("search for kash").as_deref(), Some("kash"));
    }

    #[test]
    fn test_about_phrase() {
        assert_eq!(extract("write a report about kash").as_deref(), Some("kash"));
        assert_eq!(extract("give me a summary of kash").as_deref(), Some("kash"));
    }

    #[test]
    fn test_verb_object() {
        assert_eq!(extract("analyze johnny").as_deref(), Some("johnny"));
        assert_eq!(extract("Find kash_1 on GitHub").as_deref(), Some("kash_1"));
    }

    #[test]
    fn test_possessive_is_stripped() {
        assert_eq!(extract("check kash's accounts").as_deref(), Some("kash"));
    }

    #[test]
    fn test_quotes_and_punctuation_are_stripped() {
        assert_eq!(extract("accounts of \"kash\".").as_deref(), Some("kash"));
        assert_eq!(extract("accounts of kash, please").as_deref(), Some("kash"));
    }

    // =========================================================================
    // Fallback and rejection
    // =========================================================================

    #[test]
    fn test_trailing_fallback_accepts_username_shapes() {
        assert_eq!(extract("kash_2024").as_deref(), Some("kash_2024"));
        assert_eq!(extract("what about john.doe").as_deref(), Some("john.doe"));
        assert_eq!(rule_for("dark-knight"), Some("trailing"));
    }

    #[test]
    fn test_trailing_fallback_rejects_plain_words() {
        assert_eq!(extract("is it suspicious?"), None);
        assert_eq!(extract("generate a report"), None);
        assert_eq!(extract("hello there"), None);
    }

    #[test]
    fn test_stop_words_never_extracted() {
        assert_eq!(extract("find accounts of them"), None);
        assert_eq!(extract("what's the risk score for this user"), None);
        assert_eq!(extract("search for the"), None);
    }

    #[test]
    fn test_stop_word_skipped_in_favour_of_later_candidate() {
        // "for them" is rejected; "about kash" still wins
        assert_eq!(extract("summary for them about kash").as_deref(), Some("kash"));
        assert_eq!(rule_for("summary for them about kash"), Some("about"));
    }

    #[test]
    fn test_rule_order_prefers_earlier_rule() {
        // accounts_of precedes for
        assert_eq!(
            extract("risk for accounts of kash").as_deref(),
            Some("kash")
        );
        assert_eq!(rule_for("risk for accounts of kash"), Some("accounts_of"));
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert_eq!(extract(""), None);
        assert_eq!(extract("   "), None);
        assert_eq!(extract("?!"), None);
    }

    #[test]
    fn test_overlong_token_rejected() {
        let long = "a1".repeat(40);
        assert_eq!(extract(&format!("accounts of {}", long)), None);
    }

    #[test]
    fn test_stop_words_case_insensitive() {
        assert!(is_stop_word("The"));
        assert!(is_stop_word("ACCOUNTS"));
        assert!(!is_stop_word("kash"));
    }

    #[test]
    fn test_rules_are_ordered() {
        let names: Vec<&str> = IdentifierExtractor::new()
            .rules()
            .iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names.first(), Some(&"handle"));
        assert_eq!(names.last(), Some(&"trailing"));
        assert_eq!(
            IdentifierExtractor::new().rules().last().map(|r| r.kind),
            Some(RuleKind::Fallback)
        );
    }

    // =========================================================================
    // Platforms
    // =========================================================================

    #[test]
    fn test_extract_platforms() {
        let ex = IdentifierExtractor::new();
        assert_eq!(
            ex.extract_platforms("Find all accounts of kash on GitHub and Reddit"),
            vec!["GitHub", "Reddit"]
        );
        assert_eq!(
            ex.extract_platforms("find kash on Twitter, Instagram & TikTok?"),
            vec!["Twitter", "Instagram", "TikTok"]
        );
    }

    #[test]
    fn test_extract_platforms_none() {
        let ex = IdentifierExtractor::new();
        assert!(ex.extract_platforms("Find all accounts of kash").is_empty());
        assert!(ex.extract_platforms("what's going on").is_empty());
        assert!(ex
            .extract_platforms("tell me about kash based on his activity")
            .is_empty());
    }

    #[test]
    fn test_on_clause_not_after_username_is_ignored() {
        let ex = IdentifierExtractor::new();
        assert!(ex.extract_platforms("write a report on kash").is_empty());
        assert!(ex.extract_platforms("Is kash active on Monday?").is_empty());
        assert!(ex.extract_platforms("is it suspicious on GitHub?").is_empty());
        assert_eq!(
            ex.extract_platforms("Find kash_1 on GitHub"),
            vec!["GitHub"]
        );
    }

    #[test]
    fn test_extract_platforms_dedupes() {
        let ex = IdentifierExtractor::new();
        assert_eq!(
            ex.extract_platforms("find kash on github and GitHub"),
            vec!["github"]
        );
    }
}
