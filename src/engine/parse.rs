//! Engine diagnostics parsing.
//!
//! The adapter understands two output shapes:
//! - a JSON array of `{filePath, messages: [...]}` objects (the common
//!   machine-readable format), parsed field-by-field and tolerant of
//!   missing fields
//! - a `file:line:col: message` text fallback for engines without JSON
//!   output
//!
//! All parsed violations carry 1-based line and column. Engines that emit
//! 0-based positions declare it in their command definition and are
//! normalized here.

use serde::{Deserialize, Serialize};

use crate::report::Violation;

/// Position convention of the engine's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionBase {
    /// Lines and columns start at 0; normalized by adding 1
    ZeroBased,
    /// Lines and columns already start at 1
    #[default]
    OneBased,
}

/// Parse engine diagnostics for a single file into violations
pub fn parse_diagnostics(stdout: &str, base: PositionBase) -> Vec<Violation> {
    // Try the JSON array format first
    if let Ok(results) = serde_json::from_str::<Vec<serde_json::Value>>(stdout.trim()) {
        let mut violations = Vec::new();

        for result in results {
            if let Some(messages) = result.get("messages").and_then(|m| m.as_array()) {
                for msg in messages {
                    let line = msg.get("line").and_then(|l| l.as_u64());
                    let column = msg.get("column").and_then(|c| c.as_u64());
                    let rule = msg
                        .get("ruleId")
                        .and_then(|r| r.as_str())
                        .unwrap_or("unknown");
                    let message = msg.get("message").and_then(|m| m.as_str()).unwrap_or("");

                    violations.push(Violation {
                        rule: rule.to_string(),
                        message: message.to_string(),
                        line: normalize(line, base),
                        column: normalize(column, base),
                    });
                }
            }
        }

        return violations;
    }

    parse_text_output(stdout, base)
}

/// Fallback: parse `file:line:col: message` or `file:line:col: message (rule)`
fn parse_text_output(stdout: &str, base: PositionBase) -> Vec<Violation> {
    let mut violations = Vec::new();

    let re = regex::Regex::new(r"^(.+?):(\d+):(\d+):\s*(.+)$").ok();

    for line in stdout.lines() {
        if let Some(ref re) = re {
            if let Some(caps) = re.captures(line) {
                let line_num = caps.get(2).and_then(|m| m.as_str().parse::<u64>().ok());
                let col = caps.get(3).and_then(|m| m.as_str().parse::<u64>().ok());
                let raw_message = caps.get(4).map(|m| m.as_str()).unwrap_or("");

                let (message, rule) = split_trailing_rule(raw_message);

                violations.push(Violation {
                    rule: rule.to_string(),
                    message: message.to_string(),
                    line: normalize(line_num, base),
                    column: normalize(col, base),
                });
            }
        }
    }

    violations
}

/// Convert a raw engine position to a 1-based one
fn normalize(value: Option<u64>, base: PositionBase) -> usize {
    match base {
        PositionBase::OneBased => value.unwrap_or(1).max(1) as usize,
        PositionBase::ZeroBased => value.unwrap_or(0) as usize + 1,
    }
}

/// Split a trailing `(rule-name)` suffix off a message, if present
fn split_trailing_rule(message: &str) -> (&str, &str) {
    if let Some(open) = message.rfind(" (") {
        if message.ends_with(')') {
            let rule = &message[open + 2..message.len() - 1];
            if !rule.is_empty() && !rule.contains(' ') {
                return (&message[..open], rule);
            }
        }
    }
    (message, "engine")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_diagnostics() {
        let output = r#"[{"filePath":"src/app.js","messages":[{"ruleId":"no-unused-vars","severity":2,"message":"'x' is defined but never used","line":5,"column":10}]}]"#;

        let violations = parse_diagnostics(output, PositionBase::OneBased);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "no-unused-vars");
        assert_eq!(violations[0].line, 5);
        assert_eq!(violations[0].column, 10);
    }

    #[test]
    fn test_zero_based_positions_are_normalized() {
        let output = r#"[{"messages":[{"ruleId":"no-undef","message":"x","line":0,"column":4}]}]"#;

        let violations = parse_diagnostics(output, PositionBase::ZeroBased);
        assert_eq!(violations[0].line, 1);
        assert_eq!(violations[0].column, 5);
    }

    #[test]
    fn test_one_based_positions_pass_through() {
        let output = r#"[{"messages":[{"ruleId":"no-undef","message":"x","line":3,"column":7}]}]"#;

        let violations = parse_diagnostics(output, PositionBase::OneBased);
        assert_eq!(violations[0].line, 3);
        assert_eq!(violations[0].column, 7);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let output = r#"[{"messages":[{"message":"mystery"}]}]"#;

        let violations = parse_diagnostics(output, PositionBase::OneBased);
        assert_eq!(violations[0].rule, "unknown");
        assert_eq!(violations[0].line, 1);
        assert_eq!(violations[0].column, 1);
    }

    #[test]
    fn test_text_fallback() {
        let output = "src/app.js:12:3: Unexpected console statement (no-console)\n";

        let violations = parse_diagnostics(output, PositionBase::OneBased);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "no-console");
        assert_eq!(violations[0].message, "Unexpected console statement");
        assert_eq!(violations[0].line, 12);
        assert_eq!(violations[0].column, 3);
    }

    #[test]
    fn test_text_fallback_zero_based() {
        let output = "src/app.js:0:0: something\n";

        let violations = parse_diagnostics(output, PositionBase::ZeroBased);
        assert_eq!(violations[0].line, 1);
        assert_eq!(violations[0].column, 1);
    }

    #[test]
    fn test_unparseable_output_yields_nothing() {
        assert!(parse_diagnostics("all clean!", PositionBase::OneBased).is_empty());
        assert!(parse_diagnostics("", PositionBase::OneBased).is_empty());
    }
}
