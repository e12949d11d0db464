//! Vendor-structured markdown.
//!
//! One upstream model family answers timeline prompts like this, whatever
//! schema was requested:
//!
//! ```text
//! #### 導入
//! * **旅立ち** (第1章)
//!     * アリスが村を出る決意をする
//!     * 時期: 序盤
//! #### キャラクターの成長
//! * **師との別れ**
//!     * ...
//! ```
//!
//! Level-4 headings name sections (mapped to a category), bold list items
//! open events, and the lines beneath an item form its description.

use std::sync::LazyLock;

use regex::Regex;

use super::traits::ParseStrategy;
use crate::config::ParserConfig;
use crate::pipeline::structuring::{
    extract_character_names, extract_date, has_list_marker, is_heading, section_category,
    split_chapter_reference, strip_emphasis, strip_list_marker, EventCategory, EventDraft,
    FormatDetected, Normalizer, ParseError, ParsedEvent,
};

static SECTION_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*####\s+(.+?)\s*#*\s*$").expect("valid regex"));

static BOLD_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+・]|\d+[.)])\s*\*\*(.+?)\*\*\s*(.*)$").expect("valid regex")
});

static LEADING_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[（(]([^（）()]+)[）)]\s*(.*)$").expect("valid regex"));

/// Items need a title longer than this...
const MIN_TITLE_CHARS: usize = 2;
/// ...and a description longer than this.
const MIN_DESCRIPTION_CHARS: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct VendorMarkdownStrategy {
    normalizer: Normalizer,
}

impl VendorMarkdownStrategy {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
        }
    }
}

/// Lines under one level-4 heading (or the implicit leading section).
struct Section<'a> {
    category: EventCategory,
    lines: Vec<&'a str>,
}

/// One bold list item and the lines beneath it.
struct Item<'a> {
    title: String,
    trailer: String,
    head_line: &'a str,
    body: Vec<&'a str>,
}

impl ParseStrategy for VendorMarkdownStrategy {
    fn name(&self) -> &'static str {
        "vendor_markdown"
    }

    fn format(&self) -> FormatDetected {
        FormatDetected::Markdown
    }

    fn extract(&self, text: &str) -> Result<Vec<ParsedEvent>, ParseError> {
        let events = split_sections(text)
            .into_iter()
            .flat_map(|section| {
                let category = section.category;
                collect_items(&section.lines)
                    .into_iter()
                    .filter_map(move |item| self.build_event(item, category))
            })
            .collect();
        Ok(events)
    }
}

impl VendorMarkdownStrategy {
    fn build_event(&self, item: Item<'_>, category: EventCategory) -> Option<ParsedEvent> {
        let (mut title, mut chapter_title) = split_chapter_reference(&item.title);
        let mut trailer = item.trailer.as_str();
        if chapter_title.is_none() {
            if let Some(captures) = LEADING_PAREN_RE.captures(trailer) {
                chapter_title = Some(captures[1].trim().to_string());
                trailer = captures.get(2).map_or("", |m| m.as_str());
            }
        }
        title = title.trim_end_matches([':', '：']).trim().to_string();

        let inline = strip_emphasis(trailer.trim_start_matches([':', '：', '-', '–', '—', ' ']));
        let mut parts: Vec<String> = Vec::new();
        if !inline.is_empty() {
            parts.push(inline);
        }
        parts.extend(
            item.body
                .iter()
                .map(|line| strip_emphasis(strip_list_marker(line)))
                .filter(|line| !line.is_empty()),
        );
        let description = parts.join(" ");

        if title.chars().count() <= MIN_TITLE_CHARS
            || description.chars().count() <= MIN_DESCRIPTION_CHARS
        {
            return None;
        }

        let span = std::iter::once(item.head_line)
            .chain(item.body.iter().copied())
            .collect::<Vec<_>>()
            .join("\n");
        let max_date_chars = self.normalizer.config().max_date_chars;

        self.normalizer.finish(EventDraft {
            title,
            description,
            date: extract_date(&span, max_date_chars),
            category: Some(category),
            chapter_title,
            character_names: extract_character_names(&span),
        })
    }
}

/// Split on level-4 headings. Text before the first heading, or the whole
/// text when there are none, forms an implicit `Plot` section.
fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections = vec![Section {
        category: EventCategory::default(),
        lines: Vec::new(),
    }];

    for line in text.lines() {
        if let Some(captures) = SECTION_HEADING_RE.captures(line) {
            sections.push(Section {
                category: section_category(&strip_emphasis(&captures[1])),
                lines: Vec::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            current.lines.push(line);
        }
    }
    sections
}

/// Group a section's lines into bold items. A bold line indented deeper
/// than the open item is detail, not a new item. Any other heading closes
/// the open item, as does a line after a blank that is neither indented
/// under the item nor a list line. Lines outside items are ignored.
fn collect_items<'a>(lines: &[&'a str]) -> Vec<Item<'a>> {
    let mut items: Vec<Item<'a>> = Vec::new();
    let mut open_indent: Option<usize> = None;
    let mut after_blank = false;

    for &line in lines {
        if line.trim().is_empty() {
            after_blank = true;
            continue;
        }
        let indent = indent_width(line);
        let nested = open_indent.is_some_and(|open| indent > open);
        let follows_blank = std::mem::take(&mut after_blank);

        if !nested {
            if let Some(captures) = BOLD_ITEM_RE.captures(line) {
                items.push(Item {
                    title: strip_emphasis(&captures[1]),
                    trailer: captures[2].trim().to_string(),
                    head_line: line,
                    body: Vec::new(),
                });
                open_indent = Some(indent);
                continue;
            }
        }

        if is_heading(line) || (follows_blank && !nested && !has_list_marker(line)) {
            open_indent = None;
        } else if open_indent.is_some() {
            if let Some(item) = items.last_mut() {
                item.body.push(line);
            }
        }
    }
    items
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}
