use std::sync::LazyLock;

use regex::Regex;

use super::traits::ParseStrategy;
use crate::config::ParserConfig;
use crate::pipeline::structuring::{
    extract_character_names, extract_date, extract_description, split_chapter_reference,
    strip_emphasis, strip_list_marker, EventDraft, FormatDetected, Normalizer, ParseError,
    ParsedEvent,
};

static EVENT_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#{2,3}\s+(.+?)\s*#*\s*$").expect("valid regex"));

/// Heading-delimited markdown: every `##`/`###` heading is one event and
/// the prose under it is the description. Category is inferred per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownStrategy {
    normalizer: Normalizer,
}

impl MarkdownStrategy {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
        }
    }

    fn build_event(&self, heading: &str, body: &[&str]) -> Option<ParsedEvent> {
        let config = self.normalizer.config();
        let heading = strip_emphasis(strip_list_marker(heading));
        let (title, chapter_title) = split_chapter_reference(&heading);
        let block = body.join("\n");
        let description =
            extract_description(&block, config.max_description_lines, config.max_description_chars);

        let span = format!("{heading}\n{block}");
        self.normalizer.finish(EventDraft {
            title,
            description,
            date: extract_date(&span, config.max_date_chars),
            category: None,
            chapter_title,
            character_names: extract_character_names(&span),
        })
    }
}

impl ParseStrategy for MarkdownStrategy {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn format(&self) -> FormatDetected {
        FormatDetected::Markdown
    }

    fn extract(&self, text: &str) -> Result<Vec<ParsedEvent>, ParseError> {
        let mut sections: Vec<(String, Vec<&str>)> = Vec::new();

        for line in text.lines() {
            if let Some(captures) = EVENT_HEADING_RE.captures(line) {
                sections.push((captures[1].to_string(), Vec::new()));
            } else if let Some((_, body)) = sections.last_mut() {
                body.push(line);
            }
        }

        Ok(sections
            .iter()
            .filter_map(|(heading, body)| self.build_event(heading, body))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::EventCategory;

    fn extract(text: &str) -> Vec<ParsedEvent> {
        MarkdownStrategy::default().extract(text).unwrap()
    }

    #[test]
    fn two_headings_two_events_with_inferred_categories() {
        let text = "\
## 主人公の決意
幼なじみを失った主人公は、復讐ではなく守るために剣を取ると決意する。

## 王国の歴史
千年前に建国された王国には、魔法を封じた伝説が残っている。
";
        let events = extract(text);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "主人公の決意");
        assert_eq!(events[0].category, EventCategory::Character);
        assert_eq!(events[1].title, "王国の歴史");
        assert_eq!(events[1].category, EventCategory::World);
        assert!(events[1].description.starts_with("千年前に建国"));
    }

    #[test]
    fn level_three_headings_count() {
        let text = "### 1. 出会い\n二人が港町で出会う\n### 2. 別れ\n嵐の夜に別れる";
        let events = extract(text);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "出会い");
    }

    #[test]
    fn no_headings_is_empty() {
        assert!(extract("just prose\n- a bullet").is_empty());
        assert!(extract("# Only a level one title\nbody").is_empty());
        assert!(extract("#### too deep\nbody").is_empty());
    }

    #[test]
    fn description_is_limited_to_a_few_lines() {
        let text = "## 長い章\n一行目です\n二行目です\n三行目です\n四行目です";
        let events = extract(text);
        assert_eq!(events[0].description, "一行目です 二行目です 三行目です");
    }

    #[test]
    fn description_stops_at_next_heading() {
        let text = "## 序\n始まりの文章\n#### 注記\n## 破\n破の文章";
        let events = extract(text);
        assert_eq!(events[0].description, "始まりの文章");
        assert_eq!(events[1].description, "破の文章");
    }

    #[test]
    fn heading_chapter_and_date() {
        let text = "## **嵐の夜** (第3章)\n時期: 中盤\nクロードが船から落ちる";
        let events = extract(text);
        assert_eq!(events[0].title, "嵐の夜");
        assert_eq!(events[0].chapter_title.as_deref(), Some("第3章"));
        assert_eq!(events[0].date.as_deref(), Some("中盤"));
        assert_eq!(events[0].character_names.clone().unwrap(), vec!["クロード"]);
    }

    #[test]
    fn heading_without_body_keeps_empty_description() {
        let events = extract("## 空の章\n\n## 次の章\n本文");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].description, "");
    }
}
