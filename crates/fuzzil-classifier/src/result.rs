//! Classification result types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of the rule that produced a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleCode {
    /// `Unhandled node type <word>`
    UnhandledNode,
    /// `SyntaxError:` anywhere in the output.
    SyntaxError,
    /// for-in loop without a variable declaration as init part.
    InvalidForIn,
    /// `Unknown property key type: <word>`
    UnknownPropertyKey,
    /// `Unsupported class declaration field: <word>`
    UnsupportedClassField,
    /// Assertion failure inside the compiler.
    AssertionFailure,
    /// The parser ran out of stack.
    StackOverflow,
    /// `Failed to parse ...: <word>`
    OtherParseFailure,
    /// No rule matched; the category is the trimmed raw output.
    Unrecognized,
}

impl RuleCode {
    /// Get a machine-readable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCode::UnhandledNode => "UNHANDLED_NODE",
            RuleCode::SyntaxError => "SYNTAX_ERROR",
            RuleCode::InvalidForIn => "INVALID_FOR_IN",
            RuleCode::UnknownPropertyKey => "UNKNOWN_PROPERTY_KEY",
            RuleCode::UnsupportedClassField => "UNSUPPORTED_CLASS_FIELD",
            RuleCode::AssertionFailure => "ASSERTION_FAILURE",
            RuleCode::StackOverflow => "STACK_OVERFLOW",
            RuleCode::OtherParseFailure => "OTHER_PARSE_FAILURE",
            RuleCode::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one blob of compiler output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The rule that matched first.
    pub rule: RuleCode,

    /// Category key, whitespace-trimmed.
    pub message: String,
}

impl Classification {
    pub(crate) fn new(rule: RuleCode, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into().trim().to_string(),
        }
    }

    /// True if no known failure shape matched.
    pub fn is_unrecognized(&self) -> bool {
        self.rule == RuleCode::Unrecognized
    }
}

/// Every rule that matches a piece of output, in evaluation order.
///
/// `classification` is what [`crate::classify`] returns; `shadowed` lists the
/// later rules that also matched but lost to the first one.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub classification: Classification,
    pub shadowed: Vec<RuleCode>,
}

impl Explanation {
    /// Render for a terminal.
    pub fn to_human(&self) -> String {
        let mut out = format!(
            "rule:     {}\ncategory: {}",
            self.classification.rule, self.classification.message
        );
        if !self.shadowed.is_empty() {
            let codes: Vec<&str> = self.shadowed.iter().map(|c| c.as_str()).collect();
            out.push_str(&format!("\nshadowed: {}", codes.join(", ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_trimmed() {
        let c = Classification::new(RuleCode::Unrecognized, "  boom \n");
        assert_eq!(c.message, "boom");
        assert!(c.is_unrecognized());
    }

    #[test]
    fn test_rule_code_serialization() {
        let json = serde_json::to_string(&RuleCode::UnknownPropertyKey).unwrap();
        assert_eq!(json, "\"UNKNOWN_PROPERTY_KEY\"");
        assert_eq!(RuleCode::OtherParseFailure.to_string(), "OTHER_PARSE_FAILURE");
    }

    #[test]
    fn test_explanation_human_lists_shadowed_rules() {
        let explanation = Explanation {
            classification: Classification::new(RuleCode::SyntaxError, "Syntax Error"),
            shadowed: vec![RuleCode::AssertionFailure],
        };
        let human = explanation.to_human();
        assert!(human.contains("rule:     SYNTAX_ERROR"));
        assert!(human.contains("category: Syntax Error"));
        assert!(human.contains("shadowed: ASSERTION_FAILURE"));
    }
}
