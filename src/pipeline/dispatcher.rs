//! Timeline reply dispatcher.
//!
//! Runs the strategies in priority order over a cleaned reply and returns
//! the first non-empty result. Parsing never fails outward: every problem
//! ends up as a `ParseResult` with `success == false` and a warning.

use tracing::{debug, warn};

use super::strategies::{
    JsonStrategy, MarkdownStrategy, ParseStrategy, StructuredTextStrategy, VendorMarkdownStrategy,
};
use super::structuring::{normalize_input, ParseError, ParseResult};
use crate::config::ParserConfig;

pub struct ResponseParser {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl ResponseParser {
    /// Default cascade: JSON, vendor markdown, generic markdown, structured text.
    pub fn new(config: ParserConfig) -> Self {
        Self::with_strategies(vec![
            Box::new(JsonStrategy::new(config)),
            Box::new(VendorMarkdownStrategy::new(config)),
            Box::new(MarkdownStrategy::new(config)),
            Box::new(StructuredTextStrategy::new(config)),
        ])
    }

    /// Custom cascade, tried in the given order.
    pub fn with_strategies(strategies: Vec<Box<dyn ParseStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn parse(&self, raw: &str) -> ParseResult {
        if raw.trim().is_empty() {
            return ParseResult::failed(ParseError::EmptyInput.to_string());
        }

        let text = normalize_input(raw);
        if text.trim().is_empty() {
            return ParseResult::failed(ParseError::EmptyInput.to_string());
        }

        for strategy in &self.strategies {
            if let Some(result) = strategy.attempt(&text) {
                debug!(
                    strategy = strategy.name(),
                    events = result.events.len(),
                    format = %result.format_detected,
                    "Timeline reply parsed"
                );
                return result;
            }
        }

        warn!(
            input_chars = text.chars().count(),
            strategies = self.strategies.len(),
            "No strategy recognized the timeline reply"
        );
        ParseResult::failed(ParseError::NoEventsFound.to_string())
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

/// Parse a timeline reply with the default configuration.
pub fn parse_timeline_response(raw: &str) -> ParseResult {
    ResponseParser::default().parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::{FormatDetected, ParsedEvent};

    #[test]
    fn default_order() {
        assert_eq!(
            ResponseParser::default().strategy_names(),
            vec!["json", "vendor_markdown", "markdown", "structured_text"]
        );
    }

    #[test]
    fn empty_input_fails_with_warning() {
        for raw in ["", "   ", "\n\t\n"] {
            let result = parse_timeline_response(raw);
            assert!(!result.success);
            assert!(result.events.is_empty());
            assert_eq!(result.format_detected, FormatDetected::Unknown);
            assert_eq!(result.warning.as_deref(), Some("empty input"));
        }
    }

    #[test]
    fn input_of_only_special_tokens_is_empty() {
        let result = parse_timeline_response("<|im_end|>\u{200B}");
        assert_eq!(result.warning.as_deref(), Some("empty input"));
    }

    #[test]
    fn unrecognized_input_fails_with_warning() {
        let result = parse_timeline_response("ごめんなさい、うまく作れませんでした。");
        assert!(!result.success);
        assert_eq!(result.format_detected, FormatDetected::Unknown);
        assert_eq!(result.warning.as_deref(), Some("could not parse"));
    }

    #[test]
    fn json_reply_has_no_warning() {
        let result = parse_timeline_response(r#"[{"title": "旅立ち", "category": "plot"}]"#);
        assert!(result.success);
        assert_eq!(result.format_detected, FormatDetected::Json);
        assert!(result.warning.is_none());
    }

    #[test]
    fn special_tokens_are_removed_before_parsing() {
        let result = parse_timeline_response("<|im_start|>[{\"title\": \"出会い\"}]<|im_end|>");
        assert!(result.success);
        assert_eq!(result.events[0].title, "出会い");
    }

    #[test]
    fn vendor_markdown_beats_generic_markdown() {
        let text = "#### 導入\n* **アリスの旅立ち**\n    * 村を出て王都を目指す旅が始まる\n";
        let result = parse_timeline_response(text);
        assert_eq!(result.format_detected, FormatDetected::Markdown);
        assert_eq!(result.events[0].title, "アリスの旅立ち");
    }

    #[test]
    fn structured_text_reports_text_format() {
        let result = parse_timeline_response("1. 出会い：港町で二人が出会う\n2. 別れ：嵐の夜");
        assert!(result.success);
        assert_eq!(result.format_detected, FormatDetected::Text);
        assert!(result.warning.is_some());
        assert_eq!(result.events.len(), 2);
    }

    struct Never;

    impl ParseStrategy for Never {
        fn name(&self) -> &'static str {
            "never"
        }

        fn format(&self) -> FormatDetected {
            FormatDetected::Text
        }

        fn extract(&self, _text: &str) -> Result<Vec<ParsedEvent>, ParseError> {
            Err(ParseError::MalformedFragment("always".into()))
        }
    }

    #[test]
    fn custom_cascade_is_used() {
        let parser = ResponseParser::with_strategies(vec![Box::new(Never)]);
        assert_eq!(parser.strategy_names(), vec!["never"]);
        let result = parser.parse(r#"[{"title": "ignored"}]"#);
        assert!(!result.success);
        assert_eq!(result.warning.as_deref(), Some("could not parse"));
    }

    #[test]
    fn empty_cascade_never_succeeds() {
        let parser = ResponseParser::with_strategies(Vec::new());
        assert!(!parser.parse("## 見出し\n本文").success);
    }
}
