use std::ops::Range;

use serde_json::Value;
use tracing::debug;

use super::traits::ParseStrategy;
use crate::config::ParserConfig;
use crate::pipeline::structuring::{FormatDetected, Normalizer, ParseError, ParsedEvent};

/// Bracket positions tried per delimiter before giving up.
const MAX_CANDIDATES: usize = 16;

/// Keys under which a wrapper object may hold the event array.
const WRAPPER_KEYS: &[&str] = &["events", "timeline", "イベント"];

/// Parses the schema the prompt asks for: an array of event objects,
/// possibly fenced, wrapped, or surrounded by prose.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStrategy {
    normalizer: Normalizer,
}

impl JsonStrategy {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
        }
    }
}

impl ParseStrategy for JsonStrategy {
    fn name(&self) -> &'static str {
        "json"
    }

    fn format(&self) -> FormatDetected {
        FormatDetected::Json
    }

    fn extract(&self, text: &str) -> Result<Vec<ParsedEvent>, ParseError> {
        let entries = match fenced_block(text) {
            Some(block) => match locate_entries(block) {
                Ok(Some(entries)) => Some(entries),
                _ => locate_entries(text)?,
            },
            None => locate_entries(text)?,
        };
        let Some(entries) = entries else {
            return Ok(Vec::new());
        };

        let events: Vec<ParsedEvent> = entries
            .iter()
            .filter_map(|entry| self.normalizer.normalize_value(entry))
            .collect();
        if events.len() < entries.len() {
            debug!(
                dropped = entries.len() - events.len(),
                kept = events.len(),
                "Dropped JSON entries without a title"
            );
        }
        Ok(events)
    }
}

/// Content of the first ``` fence whose body looks like JSON.
pub(crate) fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
    let tag = after_fence[..body_start].trim();
    if !(tag.is_empty() || tag.eq_ignore_ascii_case("json")) {
        return None;
    }
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    let block = body[..end].trim();
    (block.starts_with('[') || block.starts_with('{')).then_some(block)
}

/// Find the event entries: the first array holding at least one object,
/// otherwise the first object (unwrapped if it carries an event array).
///
/// `Ok(None)` when no candidate exists; `Err` when candidates existed but
/// none parsed.
fn locate_entries(text: &str) -> Result<Option<Vec<Value>>, ParseError> {
    let mut scan = CandidateScan::new(text);

    let array = scan.find_map('[', ']', |value| match value {
        Value::Array(items) if items.iter().any(Value::is_object) => Some(items),
        _ => None,
    });
    if array.is_some() {
        return Ok(array);
    }

    let object = scan.find_map('{', '}', |value| match value {
        Value::Object(object) => {
            let wrapped = WRAPPER_KEYS
                .iter()
                .find_map(|k| object.get(*k).and_then(Value::as_array).cloned());
            Some(wrapped.unwrap_or_else(|| vec![Value::Object(object)]))
        }
        _ => None,
    });
    if object.is_some() {
        return Ok(object);
    }

    match scan.last_error {
        Some(e) => Err(ParseError::MalformedFragment(e)),
        None => Ok(None),
    }
}

/// Walks bracket candidates in a reply and remembers which spans failed to
/// parse. A candidate starting inside a failed span is never tried: the
/// values nested in a malformed array or object are not the answer.
pub(crate) struct CandidateScan<'a> {
    text: &'a str,
    failed: Vec<Range<usize>>,
    pub(crate) last_error: Option<String>,
}

impl<'a> CandidateScan<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            text,
            failed: Vec::new(),
            last_error: None,
        }
    }

    /// First parsed candidate for which `accept` returns `Some`.
    pub(crate) fn find_map<T>(
        &mut self,
        open: char,
        close: char,
        mut accept: impl FnMut(Value) -> Option<T>,
    ) -> Option<T> {
        for (start, span) in candidate_spans(self.text, open, close) {
            if self.failed.iter().any(|r| r.contains(&start)) {
                continue;
            }
            match serde_json::from_str::<Value>(span) {
                Ok(value) => {
                    if let Some(found) = accept(value) {
                        return Some(found);
                    }
                }
                Err(e) => {
                    self.failed.push(start..start + span.len());
                    self.last_error = Some(e.to_string());
                }
            }
        }
        None
    }
}

/// Balanced spans, with their offsets, starting at successive `open`
/// delimiters.
fn candidate_spans(
    text: &str,
    open: char,
    close: char,
) -> impl Iterator<Item = (usize, &str)> {
    text.match_indices(open)
        .take(MAX_CANDIDATES)
        .filter_map(move |(start, _)| {
            balanced_span(text, start, open, close).map(|span| (start, span))
        })
}

/// The span from `start` to its matching `close`, skipping delimiters
/// inside JSON strings.
fn balanced_span(text: &str, start: usize, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::EventCategory;

    fn extract(text: &str) -> Result<Vec<ParsedEvent>, ParseError> {
        JsonStrategy::default().extract(text)
    }

    #[test]
    fn parses_plain_array() {
        let events = extract(
            r#"[{"title": "旅立ち", "description": "村を出る", "category": "character"},
                {"title": "決戦", "description": "魔王と戦う", "category": "plot"}]"#,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "旅立ち");
        assert_eq!(events[0].category, EventCategory::Character);
        assert_eq!(events[1].title, "決戦");
    }

    #[test]
    fn drops_entries_without_title() {
        let events = extract(
            r#"[{"title": "A event"}, {"description": "orphan"}, {"title": ""}, {"title": "B event"}]"#,
        )
        .unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["A event", "B event"]);
    }

    #[test]
    fn finds_array_inside_prose() {
        let events = extract(
            "以下がタイムラインです。\n[{\"title\": \"出会い\", \"description\": \"二人が出会う\"}]\nご確認ください。",
        )
        .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn prefers_fenced_block() {
        let text = "Example: [1, 2]\n```json\n[{\"title\": \"Fenced\"}]\n```\nDone.";
        let events = extract(text).unwrap();
        assert_eq!(events[0].title, "Fenced");
    }

    #[test]
    fn skips_bracketed_prose_before_real_array() {
        let text = "[注意] 以下を参照\n[{\"title\": \"本物\"}]";
        let events = extract(text).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "本物");
    }

    #[test]
    fn single_object_becomes_one_event() {
        let events =
            extract(r#"{"title": "会議", "characterNames": ["アリス", "ボブ"]}"#).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].character_names.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn unwraps_events_key() {
        let events = extract(r#"{"events": [{"title": "一"}, {"title": "二"}]}"#).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let events = extract(r#"[{"title": "The [hidden] door", "description": "a ] b"}]"#).unwrap();
        assert_eq!(events[0].title, "The [hidden] door");
        assert_eq!(events[0].description, "a ] b");
    }

    #[test]
    fn escaped_quotes_are_handled() {
        let events = extract(r#"[{"title": "He said \"go]\""}]"#).unwrap();
        assert_eq!(events[0].title, "He said \"go]\"");
    }

    #[test]
    fn malformed_outer_array_does_not_surface_nested_objects() {
        let text = r#"[{"title":"旅立ち","description":"村を出る","characters":[{"name":"アリス"},{"name":"ボブ"}]},]"#;
        assert!(matches!(extract(text), Err(ParseError::MalformedFragment(_))));
    }

    #[test]
    fn malformed_outer_object_does_not_surface_nested_object() {
        let text = r#"{"title":"旅立ち","description":"村を出る","meta":{"title":"内部メタ情報"},}"#;
        assert!(matches!(extract(text), Err(ParseError::MalformedFragment(_))));
    }

    #[test]
    fn valid_array_after_malformed_one_is_used() {
        let text = "[{\"title\": \"壊れ\",}]\n[{\"title\": \"正しい\"}]";
        let events = extract(text).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "正しい");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let result = extract(r#"[{"title": "broken",}]"#);
        assert!(matches!(result, Err(ParseError::MalformedFragment(_))));
    }

    #[test]
    fn no_json_is_empty() {
        assert!(extract("## 見出し\n本文").unwrap().is_empty());
    }

    #[test]
    fn unbalanced_brackets_are_empty() {
        assert!(extract("[{\"title\": \"never closed\"").unwrap().is_empty());
    }

    #[test]
    fn attempt_reports_json_without_warning() {
        let result = JsonStrategy::default()
            .attempt(r#"[{"title": "x1"}]"#)
            .unwrap();
        assert_eq!(result.format_detected, FormatDetected::Json);
        assert!(result.warning.is_none());
    }

    #[test]
    fn fence_helper() {
        assert_eq!(fenced_block("```json\n[1]\n```"), Some("[1]"));
        assert_eq!(fenced_block("```\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        assert_eq!(fenced_block("```python\nprint()\n```"), None);
        assert_eq!(fenced_block("no fence"), None);
    }
}
