//! Consistency-check reply parsing.
//!
//! Turns the model's review of a plot into a [`ConsistencyReport`]. An
//! embedded JSON object is preferred; otherwise the labelled "issues" and
//! "suggestions" sections of the prose are collected line by line.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::strategies::json::{fenced_block, CandidateScan};
use super::structuring::{
    is_heading, normalize_input, strip_emphasis, strip_list_marker, value_to_string,
    ConsistencyReport,
};
use crate::config::ParserConfig;

const HAS_ISSUES_KEYS: &[&str] = &["hasIssues", "has_issues", "問題あり"];
const ISSUES_KEYS: &[&str] = &["issues", "problems", "問題点"];
const SUGGESTIONS_KEYS: &[&str] = &["suggestions", "recommendations", "改善提案", "提案"];

/// Words that signal a problem was found somewhere in the prose.
const ISSUE_KEYWORDS: &[&str] = &["問題", "矛盾", "problem", "contradiction", "inconsistent"];

/// Explicit confirmations that nothing is wrong.
const NO_ISSUE_PHRASES: &[&str] = &[
    "問題ありません",
    "問題はありません",
    "問題は見当たりません",
    "矛盾はありません",
    "矛盾は見当たりません",
    "一貫しています",
    "整合性が取れています",
    "no issues",
    "no problems",
    "no inconsistencies",
    "no contradictions",
    "is consistent",
];

/// Section items that mean "nothing here".
const PLACEHOLDER_ITEMS: &[&str] = &["なし", "特になし", "ありません", "none", "n/a", "nothing"];

fn label_pattern(labels: &str) -> Regex {
    // Heading, bullet, or bold wrapped label, optionally followed by a colon
    // and inline content.
    let pattern = format!(
        r"(?i)^\s*(?:#{{1,6}}\s*)?(?:[-*・•]\s*)?(?:\*\*|__)?\s*(?:{labels})\s*(?:\*\*|__)?\s*(?:[:：]\s*(?:\*\*|__)?\s*(.*))?$"
    );
    Regex::new(&pattern).expect("valid regex")
}

static ISSUES_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    label_pattern(r"問題点|矛盾点|問題|矛盾|issues?|problems?|inconsistenc(?:y|ies)")
});

static SUGGESTIONS_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    label_pattern(r"改善提案|改善案|修正案|改善点|提案|suggestions?|recommendations?")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Issues,
    Suggestions,
}

/// Parse a consistency-check reply with the default configuration.
pub fn parse_consistency_response(raw: &str) -> ConsistencyReport {
    parse_consistency_response_with(raw, &ParserConfig::default())
}

/// Parse a consistency-check reply. Never fails; blank input yields an
/// empty report without issues.
pub fn parse_consistency_response_with(raw: &str, config: &ParserConfig) -> ConsistencyReport {
    let text = normalize_input(raw);
    if text.trim().is_empty() {
        return ConsistencyReport::default();
    }

    if let Some(report) = from_json(&text) {
        debug!(
            path = "json",
            issues = report.issues.len(),
            suggestions = report.suggestions.len(),
            "Consistency reply parsed"
        );
        return report;
    }

    let report = from_text(&text, config.min_report_item_chars);
    debug!(
        path = "text",
        issues = report.issues.len(),
        suggestions = report.suggestions.len(),
        has_issues = report.has_issues,
        "Consistency reply parsed"
    );
    report
}

/// First JSON object carrying any report key, fenced block first.
fn from_json(text: &str) -> Option<ConsistencyReport> {
    fenced_block(text)
        .and_then(report_object)
        .or_else(|| report_object(text))
        .map(|object| report_from_object(&object))
}

fn report_object(text: &str) -> Option<Map<String, Value>> {
    CandidateScan::new(text).find_map('{', '}', |value| {
        let Value::Object(object) = value else {
            return None;
        };
        let is_report = HAS_ISSUES_KEYS
            .iter()
            .chain(ISSUES_KEYS)
            .chain(SUGGESTIONS_KEYS)
            .any(|k| object.contains_key(*k));
        is_report.then_some(object)
    })
}

fn report_from_object(object: &Map<String, Value>) -> ConsistencyReport {
    let issues = string_items(object, ISSUES_KEYS);
    let suggestions = string_items(object, SUGGESTIONS_KEYS);
    let has_issues = HAS_ISSUES_KEYS
        .iter()
        .find_map(|k| object.get(*k))
        .and_then(coerce_bool)
        .unwrap_or(!issues.is_empty());

    ConsistencyReport {
        has_issues,
        issues,
        suggestions,
    }
}

/// Items of the first array found under `keys`; non-arrays are empty.
fn string_items(object: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|k| object.get(*k))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(value_to_string).collect())
        .unwrap_or_default()
}

/// Booleans, 0/1 numbers, and yes/no style strings.
fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "はい" | "あり" => Some(true),
            "false" | "no" | "0" | "いいえ" | "なし" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn from_text(text: &str, min_item_chars: usize) -> ConsistencyReport {
    let mut issues: Vec<String> = Vec::new();
    let mut suggestions: Vec<String> = Vec::new();
    let mut section: Option<Section> = None;
    let mut keyword_found = false;

    for line in text.lines() {
        let label = if let Some(c) = ISSUES_LABEL_RE.captures(line) {
            Some((Section::Issues, c.get(1).map_or("", |m| m.as_str())))
        } else {
            SUGGESTIONS_LABEL_RE
                .captures(line)
                .map(|c| (Section::Suggestions, c.get(1).map_or("", |m| m.as_str())))
        };

        let content = match label {
            Some((next, inline)) => {
                section = Some(next);
                inline
            }
            None if is_heading(line) => {
                section = None;
                continue;
            }
            None => {
                let lower = line.to_lowercase();
                keyword_found |= ISSUE_KEYWORDS.iter().any(|k| lower.contains(k));
                line
            }
        };

        let target = match section {
            Some(Section::Issues) => &mut issues,
            Some(Section::Suggestions) => &mut suggestions,
            None => continue,
        };
        if let Some(item) = clean_item(content, min_item_chars) {
            target.push(item);
        }
    }

    let mut has_issues = !issues.is_empty() || keyword_found;
    if issues.is_empty() && confirms_no_issues(text) {
        has_issues = false;
    }

    ConsistencyReport {
        has_issues,
        issues,
        suggestions,
    }
}

fn clean_item(line: &str, min_chars: usize) -> Option<String> {
    let item = strip_emphasis(strip_list_marker(line));
    if item.chars().count() < min_chars {
        return None;
    }
    let bare = item
        .trim_end_matches(['。', '.', '！', '!'])
        .trim()
        .to_lowercase();
    (!PLACEHOLDER_ITEMS.contains(&bare.as_str())).then_some(item)
}

fn confirms_no_issues(text: &str) -> bool {
    let lower = text.to_lowercase();
    NO_ISSUE_PHRASES.iter().any(|p| lower.contains(p))
}
