use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of timeline categories. Every event has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Character,
    World,
    #[default]
    Plot,
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::World => "world",
            Self::Plot => "plot",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which strategy produced the events of a `ParseResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatDetected {
    Json,
    Markdown,
    Text,
    Unknown,
}

impl FormatDetected {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FormatDetected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timeline-worthy occurrence recovered from a model reply.
///
/// Optional fields are either `None` or meaningfully populated: no empty
/// strings, no empty lists. `character_names` holds 1 to 5 entries when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEvent {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub category: EventCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_names: Option<Vec<String>>,
}

/// Outcome of one `parse_timeline_response` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub success: bool,
    pub events: Vec<ParsedEvent>,
    pub format_detected: FormatDetected,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ParseResult {
    /// Successful parse. JSON results carry no warning; every other format
    /// tells the user the reply did not follow the requested schema.
    pub fn parsed(events: Vec<ParsedEvent>, format: FormatDetected) -> Self {
        let warning = match format {
            FormatDetected::Json => None,
            FormatDetected::Markdown => {
                Some("AI response was not JSON; events were recovered from markdown".to_string())
            }
            FormatDetected::Text => {
                Some("AI response was not JSON; events were recovered from plain text".to_string())
            }
            FormatDetected::Unknown => Some("AI response format was not recognized".to_string()),
        };
        Self {
            success: true,
            events,
            format_detected: format,
            warning,
        }
    }

    /// Failed parse with a user-facing note.
    pub fn failed(warning: impl Into<String>) -> Self {
        Self {
            success: false,
            events: Vec::new(),
            format_detected: FormatDetected::Unknown,
            warning: Some(warning.into()),
        }
    }
}

/// Narrative-consistency check summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub has_issues: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> ParsedEvent {
        ParsedEvent {
            title: "旅立ち".into(),
            description: "アリスが村を出る".into(),
            date: Some("序盤".into()),
            category: EventCategory::Character,
            chapter_title: None,
            character_names: Some(vec!["アリス".into()]),
        }
    }

    #[test]
    fn category_defaults_to_plot() {
        assert_eq!(EventCategory::default(), EventCategory::Plot);
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&EventCategory::World).unwrap();
        assert_eq!(json, "\"world\"");
        assert_eq!(format!("{}", EventCategory::Character), "character");
    }

    #[test]
    fn event_serializes_camel_case_and_omits_none() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(json["characterNames"][0], "アリス");
        assert!(json.get("chapterTitle").is_none());
        assert_eq!(json["category"], "character");
    }

    #[test]
    fn json_results_have_no_warning() {
        let result = ParseResult::parsed(vec![sample_event()], FormatDetected::Json);
        assert!(result.success);
        assert!(result.warning.is_none());
    }

    #[test]
    fn non_json_results_warn() {
        for format in [FormatDetected::Markdown, FormatDetected::Text] {
            let result = ParseResult::parsed(vec![sample_event()], format);
            assert!(result.warning.is_some(), "{format} should warn");
        }
    }

    #[test]
    fn failed_result_is_unknown_format() {
        let result = ParseResult::failed("empty input");
        assert!(!result.success);
        assert!(result.events.is_empty());
        assert_eq!(result.format_detected, FormatDetected::Unknown);
        assert_eq!(result.warning.as_deref(), Some("empty input"));
    }

    #[test]
    fn report_serializes_has_issues() {
        let json = serde_json::to_string(&ConsistencyReport::default()).unwrap();
        assert!(json.contains("\"hasIssues\":false"));
    }
}
