//! Pattern rule engine.
//!
//! Each line is tested against a fixed, ordered table of regex rules. The
//! first rule that matches produces the line's only diagnostic; later rules
//! are not tested against that line. The patterns are loose heuristics,
//! not a parser: `def snake_case():` trips the naming rule, and the
//! magic-number rule only fires on lines the hardcoded-value rule misses.

use std::sync::LazyLock;

use regex::Regex;

use crate::source::{Diagnostic, SourceText};

/// A line-level rule: a pattern and the message emitted when it matches.
#[derive(Debug)]
pub struct Rule {
    /// Short stable identifier.
    pub id: &'static str,
    /// Compiled pattern, tested with an unanchored search.
    pub pattern: Regex,
    /// Message attached to the diagnostic.
    pub message: &'static str,
}

impl Rule {
    fn new(id: &'static str, pattern: &str, message: &'static str) -> Self {
        Self {
            id,
            pattern: Regex::new(pattern).expect("valid regex"),
            message,
        }
    }

    /// Whether this rule matches anywhere in `line`.
    pub fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

// -- Rule table ------------------------------------------------------------

/// The built-in rules, in precedence order.
pub static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "hardcoded-value",
            r#"'[^']*'|"[^"]*"|\b\d+\b"#,
            "Hardcoded value detected",
        ),
        Rule::new(
            "function-naming",
            r"def\s+[a-z][a-zA-Z0-9_]*\s*\(.*?\)\s*:",
            "Improper function naming detected (use snake_case)",
        ),
        Rule::new("print-usage", r"\bprint\s*\(", "Print statement detected"),
        Rule::new(
            "magic-number",
            r"\b\d+(\.\d+)?\b",
            "Magic number detected",
        ),
    ]
});

/// Run the rule table over `source`.
///
/// Returns at most one diagnostic per line, in line order.
#[tracing::instrument(skip(source), fields(lines = source.len()))]
pub fn apply_rules(source: &SourceText<'_>) -> Vec<Diagnostic> {
    let diagnostics: Vec<Diagnostic> = source
        .numbered()
        .filter_map(|(line_num, line)| {
            first_match(line).map(|rule| Diagnostic::new(line_num, rule.message))
        })
        .collect();
    tracing::debug!(count = diagnostics.len(), "rules applied");
    diagnostics
}

/// The first rule in table order that matches `line`.
pub fn first_match(line: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.is_match(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(code: &str) -> Vec<String> {
        apply_rules(&SourceText::new(code))
            .into_iter()
            .map(|d| d.to_string())
            .collect()
    }

    fn rule(id: &str) -> &'static Rule {
        RULES.iter().find(|r| r.id == id).unwrap()
    }

    #[test]
    fn table_compiles_in_order() {
        let ids: Vec<&str> = RULES.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec!["hardcoded-value", "function-naming", "print-usage", "magic-number"]
        );
    }

    #[test]
    fn single_and_double_quoted_strings_are_hardcoded() {
        assert_eq!(messages("x = 'hello'"), vec!["Line 1: Hardcoded value detected"]);
        assert_eq!(messages(r#"y = "hi""#), vec!["Line 1: Hardcoded value detected"]);
        assert_eq!(messages("z = ''"), vec!["Line 1: Hardcoded value detected"]);
    }

    #[test]
    fn bare_integer_is_hardcoded() {
        assert_eq!(messages("timeout = 30"), vec!["Line 1: Hardcoded value detected"]);
    }

    #[test]
    fn digits_inside_identifiers_ignored() {
        assert!(messages("x2 = y3").is_empty());
    }

    #[test]
    fn function_definition_flagged() {
        assert_eq!(
            messages("def computeTotal(a, b):"),
            vec!["Line 1: Improper function naming detected (use snake_case)"]
        );
    }

    #[test]
    fn snake_case_definition_also_flagged() {
        // Loose heuristic: any lowercase-initial name matches.
        assert_eq!(
            messages("def compute_total():"),
            vec!["Line 1: Improper function naming detected (use snake_case)"]
        );
    }

    #[test]
    fn capitalized_definition_not_flagged() {
        assert!(messages("def Compute():").is_empty());
    }

    #[test]
    fn print_call_flagged() {
        assert_eq!(messages("print(x)"), vec!["Line 1: Print statement detected"]);
        assert_eq!(messages("    print (x)"), vec!["Line 1: Print statement detected"]);
    }

    #[test]
    fn pprint_not_flagged() {
        assert!(messages("pprint(x)").is_empty());
    }

    #[test]
    fn hardcoded_takes_precedence_over_print() {
        assert_eq!(
            messages("print('hello')"),
            vec!["Line 1: Hardcoded value detected"]
        );
    }

    #[test]
    fn decimals_caught_by_hardcoded_rule_first() {
        assert_eq!(messages("pi = 3.14"), vec!["Line 1: Hardcoded value detected"]);
    }

    #[test]
    fn magic_number_pattern_matches_decimals() {
        let magic = rule("magic-number");
        assert!(magic.is_match("rate = 0.75"));
        assert!(magic.is_match("n = 42"));
        assert!(!magic.is_match("name = value"));
    }

    #[test]
    fn at_most_one_diagnostic_per_line() {
        let code = "def foo(): print('x', 1, 2.5)\nprint(1)\nplain";
        let diags = apply_rules(&SourceText::new(code));
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].line, 1);
        assert_eq!(diags[1].line, 2);
    }

    #[test]
    fn clean_code_yields_nothing() {
        assert!(messages("").is_empty());
        assert!(messages("result = compute(a, b)\nreturn result").is_empty());
    }

    #[test]
    fn line_numbers_follow_input() {
        assert_eq!(
            messages("a = b\n\nprint(a)"),
            vec!["Line 3: Print statement detected"]
        );
    }
}
