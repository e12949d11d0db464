use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "AI Story Builder";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "story_builder_lib=info"
}

/// Limits applied while normalizing model replies.
///
/// All lengths are counted in chars, not bytes, so Japanese text is capped
/// at the same visible length as ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Cap for `ParsedEvent::title` (ellipsis included).
    pub max_title_chars: usize,
    /// Cap for `ParsedEvent::description` (ellipsis included).
    pub max_description_chars: usize,
    /// Substantive lines kept when a description is built from loose prose.
    pub max_description_lines: usize,
    /// Cap for labelled date values ("時期: ...").
    pub max_date_chars: usize,
    /// Consistency-report lines shorter than this are dropped.
    pub min_report_item_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_title_chars: 100,
            max_description_chars: 300,
            max_description_lines: 3,
            max_date_chars: 50,
            min_report_item_chars: 3,
        }
    }
}
