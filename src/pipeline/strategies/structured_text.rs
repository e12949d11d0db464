use std::sync::LazyLock;

use regex::Regex;

use super::traits::ParseStrategy;
use crate::config::ParserConfig;
use crate::pipeline::structuring::{
    extract_character_names, extract_date, strip_emphasis, EventDraft, FormatDetected, Normalizer,
    ParseError, ParsedEvent,
};

static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[0-9０-９]+\s*[.)．、）]\s*(.+)$").expect("valid regex")
});

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*]\s+|[・•]\s*)(.+)$").expect("valid regex"));

/// Title/description separator: spaced hyphen, dashes, or colons.
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+-\s+|\s*[–—:：]\s*").expect("valid regex"));

static TITLE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*・•]\s*)?(?:\*\*)?(?:title|event|タイトル|イベント名|出来事|見出し)(?:\*\*)?\s*[:：]\s*(.+)$",
    )
    .expect("valid regex")
});

static DESCRIPTION_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*・•]\s*)?(?:\*\*)?(?:description|details|summary|説明|内容|詳細|概要)(?:\*\*)?\s*[:：]\s*(.+)$",
    )
    .expect("valid regex")
});

/// Loosely structured prose. Three shapes are tried in order and the
/// first that yields an event wins: numbered lines, `title:`/`description:`
/// label pairs, plain bullets.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredTextStrategy {
    normalizer: Normalizer,
}

impl StructuredTextStrategy {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
        }
    }

    /// One event per line matching `pattern`, split on the first separator.
    fn from_lines(&self, text: &str, pattern: &Regex) -> Vec<ParsedEvent> {
        text.lines()
            .filter_map(|line| pattern.captures(line))
            .filter_map(|captures| {
                let content = captures[1].trim();
                let (title, description) = split_title_description(content);
                self.event(title, description, content)
            })
            .collect()
    }

    /// Title and description labels, paired by position.
    fn from_labels(&self, text: &str) -> Vec<ParsedEvent> {
        let titles: Vec<&str> = text
            .lines()
            .filter_map(|line| TITLE_LABEL_RE.captures(line))
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        let descriptions: Vec<&str> = text
            .lines()
            .filter_map(|line| DESCRIPTION_LABEL_RE.captures(line))
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        titles
            .iter()
            .enumerate()
            .filter_map(|(i, title)| {
                let title = strip_emphasis(title);
                let description = descriptions
                    .get(i)
                    .map(|d| strip_emphasis(d))
                    .unwrap_or_default();
                let span = format!("{title}\n{description}");
                self.event(title, description, &span)
            })
            .collect()
    }

    fn event(&self, title: String, description: String, span: &str) -> Option<ParsedEvent> {
        self.normalizer.finish(EventDraft {
            title,
            description,
            date: extract_date(span, self.normalizer.config().max_date_chars),
            category: None,
            chapter_title: None,
            character_names: extract_character_names(span),
        })
    }
}

impl ParseStrategy for StructuredTextStrategy {
    fn name(&self) -> &'static str {
        "structured_text"
    }

    fn format(&self) -> FormatDetected {
        FormatDetected::Text
    }

    fn extract(&self, text: &str) -> Result<Vec<ParsedEvent>, ParseError> {
        let numbered = self.from_lines(text, &NUMBERED_RE);
        if !numbered.is_empty() {
            return Ok(numbered);
        }
        let labelled = self.from_labels(text);
        if !labelled.is_empty() {
            return Ok(labelled);
        }
        Ok(self.from_lines(text, &BULLET_RE))
    }
}

/// Split `"旅立ち：アリスが村を出る"` into title and description. Without a
/// separator the whole line serves as both.
fn split_title_description(content: &str) -> (String, String) {
    if let Some(m) = SEPARATOR_RE.find(content) {
        let title = strip_emphasis(&content[..m.start()]);
        let description = strip_emphasis(&content[m.end()..]);
        if !title.is_empty() && !description.is_empty() {
            return (title, description);
        }
    }
    let whole = strip_emphasis(content);
    (whole.clone(), whole)
}
