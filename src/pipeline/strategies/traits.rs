//! The single capability every parsing strategy implements.
//!
//! A strategy recognizes one reply shape (JSON, vendor markdown, generic
//! markdown, structured text). Strategies share no state, so each can be
//! tested alone and the dispatcher can reorder them freely.

use tracing::debug;

use crate::pipeline::structuring::{FormatDetected, ParseError, ParseResult, ParsedEvent};

pub trait ParseStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Format reported when this strategy wins.
    fn format(&self) -> FormatDetected;

    /// Recover events from cleaned reply text. An empty vector means the
    /// shape was not found; `Err` means a candidate span was malformed.
    fn extract(&self, text: &str) -> Result<Vec<ParsedEvent>, ParseError>;

    /// Run `extract` and fold every failure into "found nothing".
    fn attempt(&self, text: &str) -> Option<ParseResult> {
        match self.extract(text) {
            Ok(events) if !events.is_empty() => Some(ParseResult::parsed(events, self.format())),
            Ok(_) => None,
            Err(e) => {
                debug!(strategy = self.name(), error = %e, "Strategy rejected input");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::EventCategory;

    struct Fixed(Result<Vec<ParsedEvent>, ParseError>);

    impl ParseStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn format(&self) -> FormatDetected {
            FormatDetected::Text
        }

        fn extract(&self, _text: &str) -> Result<Vec<ParsedEvent>, ParseError> {
            self.0.clone()
        }
    }

    fn event() -> ParsedEvent {
        ParsedEvent {
            title: "宴".into(),
            description: String::new(),
            date: None,
            category: EventCategory::Plot,
            chapter_title: None,
            character_names: None,
        }
    }

    #[test]
    fn trait_is_object_safe() {
        fn _assert_strategy(_: &dyn ParseStrategy) {}
    }

    #[test]
    fn attempt_wraps_events() {
        let result = Fixed(Ok(vec![event()])).attempt("x").unwrap();
        assert!(result.success);
        assert_eq!(result.format_detected, FormatDetected::Text);
        assert_eq!(result.events.len(), 1);
    }

    #[test]
    fn attempt_treats_empty_as_no_match() {
        assert!(Fixed(Ok(vec![])).attempt("x").is_none());
    }

    #[test]
    fn attempt_swallows_errors() {
        let strategy = Fixed(Err(ParseError::MalformedFragment("bad".into())));
        assert!(strategy.attempt("x").is_none());
    }
}
