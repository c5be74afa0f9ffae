//! The ordered rule table.
//!
//! Rules are evaluated top to bottom and the first match wins, so the order
//! of [`rules`] is part of the contract: output containing both `SyntaxError:`
//! and `Assertion failed` must land in the syntax error bucket.

use regex::Regex;
use std::sync::OnceLock;

use crate::result::RuleCode;

/// How a rule recognises its failure shape.
#[derive(Debug)]
pub enum Matcher {
    /// Literal substring anywhere in the output.
    Contains(&'static str),
    /// Regex with exactly one capture group holding a word.
    Capture(Regex),
}

impl Matcher {
    /// Returns `None` if the output does not match. On a match, returns the
    /// captured word for `Capture` matchers and `None` inside for `Contains`.
    pub fn find<'t>(&self, text: &'t str) -> Option<Option<&'t str>> {
        match self {
            Matcher::Contains(needle) => text.contains(*needle).then_some(None),
            Matcher::Capture(re) => re
                .captures(text)
                .map(|caps| caps.get(1).map(|m| m.as_str())),
        }
    }
}

/// A single classification rule.
#[derive(Debug)]
pub struct Rule {
    pub code: RuleCode,
    pub matcher: Matcher,
    format: fn(&str) -> String,
}

impl Rule {
    fn contains(code: RuleCode, needle: &'static str, format: fn(&str) -> String) -> Self {
        Self {
            code,
            matcher: Matcher::Contains(needle),
            format,
        }
    }

    fn capture(code: RuleCode, pattern: &str, format: fn(&str) -> String) -> Self {
        Self {
            code,
            // Patterns are literals in this file and covered by tests.
            matcher: Matcher::Capture(Regex::new(pattern).expect("invalid built-in rule pattern")),
            format,
        }
    }

    /// Apply the rule. Returns the category message if it matched.
    pub fn apply(&self, text: &str) -> Option<String> {
        self.matcher
            .find(text)
            .map(|word| (self.format)(word.unwrap_or_default()))
    }
}

/// A word is a maximal run of Unicode word characters (`\w`).
const WORD: &str = r"(\w+)";

/// The built-in rules, in evaluation order.
pub fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            Rule::capture(
                RuleCode::UnhandledNode,
                &format!("Unhandled node type {WORD}"),
                |w| format!("Unhandled node {w}"),
            ),
            Rule::contains(RuleCode::SyntaxError, "SyntaxError:", |_| {
                "Syntax Error".to_string()
            }),
            Rule::contains(
                RuleCode::InvalidForIn,
                "Expected variable declaration as init part of a for-in loop",
                |_| "Invalid for-in loop".to_string(),
            ),
            Rule::capture(
                RuleCode::UnknownPropertyKey,
                &format!("Unknown property key type: {WORD}"),
                |w| format!("Unknown property key type: {w}"),
            ),
            Rule::capture(
                RuleCode::UnsupportedClassField,
                &format!("Unsupported class declaration field: {WORD}"),
                |w| format!("Unsupported class declaration field: {w}"),
            ),
            Rule::contains(RuleCode::AssertionFailure, "Assertion failed", |_| {
                "Unknown assertion failure".to_string()
            }),
            Rule::contains(
                RuleCode::StackOverflow,
                "Maximum call stack size exceeded",
                |_| "Stack overflow during parsing".to_string(),
            ),
            Rule::capture(
                RuleCode::OtherParseFailure,
                &format!("Failed to parse .*: {WORD}"),
                |w| format!("Other failure: {w}"),
            ),
        ]
    })
}
