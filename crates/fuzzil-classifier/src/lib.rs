//! Failure classifier for FuzzIL compiler output.
//!
//! The compiler prints free-form diagnostics when it cannot translate a
//! JavaScript sample. This crate maps that text onto a small set of stable,
//! human-readable failure categories so that a corpus run can be summarised
//! by failure shape instead of by raw message.

mod result;
mod rules;

pub use result::{Classification, Explanation, RuleCode};
pub use rules::{rules, Matcher, Rule};

/// Classify raw compiler output.
///
/// Rules are tried in order and the first match wins. If nothing matches,
/// the category is the raw output with surrounding whitespace removed.
pub fn classify(output: &str) -> Classification {
    rules()
        .iter()
        .find_map(|rule| {
            rule.apply(output)
                .map(|message| Classification::new(rule.code, message))
        })
        .unwrap_or_else(|| Classification::new(RuleCode::Unrecognized, output))
}

/// Classify and also report which later rules were shadowed by the winner.
pub fn explain(output: &str) -> Explanation {
    let classification = classify(output);
    let shadowed = rules()
        .iter()
        .filter(|rule| rule.code != classification.rule && rule.matcher.find(output).is_some())
        .map(|rule| rule.code)
        .collect();
    Explanation {
        classification,
        shadowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unhandled_node() {
        let c = classify("Unhandled node type BigIntLiteral");
        assert_eq!(c.rule, RuleCode::UnhandledNode);
        assert_eq!(c.message, "Unhandled node BigIntLiteral");
    }

    #[test]
    fn test_syntax_error() {
        let c = classify("SyntaxError: Unexpected token (3:7)\n");
        assert_eq!(c.rule, RuleCode::SyntaxError);
        assert_eq!(c.message, "Syntax Error");
    }

    #[test]
    fn test_invalid_for_in() {
        let c = classify(
            "Assertion: Expected variable declaration as init part of a for-in loop, got Identifier",
        );
        assert_eq!(c.message, "Invalid for-in loop");
    }

    #[test]
    fn test_unknown_property_key() {
        let c = classify("Unknown property key type: Computed");
        assert_eq!(c.message, "Unknown property key type: Computed");
    }

    #[test]
    fn test_unsupported_class_field() {
        let c = classify("Unsupported class declaration field: StaticBlock");
        assert_eq!(c.rule, RuleCode::UnsupportedClassField);
        assert_eq!(c.message, "Unsupported class declaration field: StaticBlock");
    }

    #[test]
    fn test_assertion_failure() {
        let c = classify("Fatal error: Assertion failed: file Compiler.swift, line 42");
        assert_eq!(c.message, "Unknown assertion failure");
    }

    #[test]
    fn test_stack_overflow() {
        let c = classify("RangeError: Maximum call stack size exceeded");
        assert_eq!(c.rule, RuleCode::StackOverflow);
        assert_eq!(c.message, "Stack overflow during parsing");
    }

    #[test]
    fn test_other_parse_failure() {
        let c = classify("Failed to parse /tmp/x.js: TypeError");
        assert_eq!(c.message, "Other failure: TypeError");
    }

    #[test]
    fn test_unrecognized_is_trimmed_raw_output() {
        let c = classify("\n  something entirely new happened \n\n");
        assert_eq!(c.rule, RuleCode::Unrecognized);
        assert_eq!(c.message, "something entirely new happened");
    }

    #[test]
    fn test_empty_output_is_unrecognized_empty_message() {
        let c = classify("");
        assert!(c.is_unrecognized());
        assert_eq!(c.message, "");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let c = classify("SyntaxError: bad\nAssertion failed");
        assert_eq!(c.message, "Syntax Error");

        let c = classify("Assertion failed\nUnhandled node type Foo");
        assert_eq!(c.message, "Unhandled node Foo");
    }

    #[test]
    fn test_word_capture_stops_at_non_word() {
        let c = classify("Unknown property key type: Private-Name");
        assert_eq!(c.message, "Unknown property key type: Private");
    }

    #[test]
    fn test_capture_rule_without_word_falls_through() {
        // Rule 1 needs a word after the prefix; rule 6 still applies.
        let c = classify("Unhandled node type \nAssertion failed");
        assert_eq!(c.rule, RuleCode::AssertionFailure);
    }

    #[test]
    fn test_classification_is_pure() {
        let text = "Failed to parse a.js: Whatever";
        assert_eq!(classify(text), classify(text));
    }

    #[test]
    fn test_explain_reports_shadowed_rules() {
        let e = explain("SyntaxError: x\nAssertion failed\nMaximum call stack size exceeded");
        assert_eq!(e.classification.rule, RuleCode::SyntaxError);
        assert_eq!(
            e.shadowed,
            vec![RuleCode::AssertionFailure, RuleCode::StackOverflow]
        );
    }

    #[test]
    fn test_explain_unrecognized_has_no_shadowed() {
        let e = explain("nothing known");
        assert!(e.classification.is_unrecognized());
        assert!(e.shadowed.is_empty());
    }
}
