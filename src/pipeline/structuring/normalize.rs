use serde_json::{Map, Value};

use super::classify::{infer_category, map_category_label};
use super::extractors::MAX_CHARACTER_NAMES;
use super::sanitize::{non_empty, truncate_chars};
use super::types::{EventCategory, ParsedEvent};
use crate::config::ParserConfig;

const TITLE_KEYS: &[&str] = &["title", "name", "event", "タイトル", "イベント名"];
const DESCRIPTION_KEYS: &[&str] = &["description", "summary", "details", "説明", "内容"];
const DATE_KEYS: &[&str] = &["date", "time", "timing", "when", "日付", "時期"];
const CATEGORY_KEYS: &[&str] = &["category", "type", "kind", "カテゴリ", "種類"];
const CHAPTER_KEYS: &[&str] = &["chapterTitle", "chapter_title", "chapter", "章"];
const CHARACTER_KEYS: &[&str] = &["characterNames", "character_names", "characters", "登場人物"];

/// Loosely-populated event as a strategy recovered it, before the
/// canonical invariants are enforced.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: Option<String>,
    /// `None` means "infer from title and description".
    pub category: Option<EventCategory>,
    pub chapter_title: Option<String>,
    pub character_names: Option<Vec<String>>,
}

/// Coerces drafts and loose JSON into canonical [`ParsedEvent`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: ParserConfig,
}

impl Normalizer {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Enforce the canonical shape. Returns `None` when the title is blank.
    pub fn finish(&self, draft: EventDraft) -> Option<ParsedEvent> {
        let title = non_empty(&draft.title)?;
        let title = truncate_chars(&title, self.config.max_title_chars);
        let description =
            truncate_chars(draft.description.trim(), self.config.max_description_chars);
        let category = draft
            .category
            .unwrap_or_else(|| infer_category(&title, &description));

        Some(ParsedEvent {
            date: draft
                .date
                .as_deref()
                .and_then(non_empty)
                .map(|d| truncate_chars(&d, self.config.max_date_chars)),
            chapter_title: draft
                .chapter_title
                .as_deref()
                .and_then(non_empty)
                .map(|c| truncate_chars(&c, self.config.max_title_chars)),
            character_names: draft.character_names.and_then(clean_names),
            title,
            description,
            category,
        })
    }

    /// Normalize one JSON entry. Non-objects and entries without a usable
    /// title yield `None`.
    pub fn normalize_value(&self, value: &Value) -> Option<ParsedEvent> {
        let object = value.as_object()?;
        let title = field(object, TITLE_KEYS).and_then(value_to_string)?;

        let draft = EventDraft {
            title,
            description: field(object, DESCRIPTION_KEYS)
                .and_then(value_to_string)
                .unwrap_or_default(),
            date: field(object, DATE_KEYS).and_then(value_to_string),
            category: field(object, CATEGORY_KEYS)
                .and_then(value_to_string)
                .and_then(|label| map_category_label(&label)),
            chapter_title: field(object, CHAPTER_KEYS).and_then(value_to_string),
            character_names: field(object, CHARACTER_KEYS).and_then(string_list),
        };
        self.finish(draft)
    }
}

/// First non-null value among the key aliases.
fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| object.get(*k))
        .find(|v| !v.is_null())
}

/// Stringify any JSON scalar or container; blank results become `None`.
pub fn value_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    };
    non_empty(&text)
}

/// A JSON array whose elements are all strings; anything else is absent.
fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let strings = items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    Some(strings)
}

/// Trim, drop blanks and duplicates, keep at most [`MAX_CHARACTER_NAMES`].
fn clean_names(names: Vec<String>) -> Option<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::new();
    for name in names {
        let Some(name) = non_empty(&name) else { continue };
        if !cleaned.contains(&name) {
            cleaned.push(name);
        }
    }
    cleaned.truncate(MAX_CHARACTER_NAMES);
    (!cleaned.is_empty()).then_some(cleaned)
}
