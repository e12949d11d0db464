//! Shared field extractors.
//!
//! Pure functions over `&str`, reused by every strategy. Each returns `None`
//! (or an empty string for descriptions) when it finds nothing; none of them
//! can fail.

use std::sync::LazyLock;

use regex::Regex;

use super::sanitize::{has_list_marker, is_heading, strip_emphasis, strip_list_marker, truncate_chars};

/// Most candidate names an event may carry.
pub const MAX_CHARACTER_NAMES: usize = 5;

/// A date pattern and the capture group holding the value.
struct DatePattern {
    regex: Regex,
    group: usize,
}

fn date_pattern(pattern: &str, group: usize) -> DatePattern {
    DatePattern {
        regex: Regex::new(pattern).expect("valid regex"),
        group,
    }
}

/// Tried in order; the first match wins.
static DATE_PATTERNS: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    vec![
        // Explicit labels: "時期: 序盤", "Date: spring of 1850"
        date_pattern(
            r"(?i)(?:日付|日時|時期|時間|時代|タイミング|\b(?:date|time|timing|when))\s*[:：]\s*([^\n]+)",
            1,
        ),
        // Calendar forms
        date_pattern(r"\b\d{4}-\d{1,2}-\d{1,2}\b", 0),
        date_pattern(r"[0-9０-９]{1,4}年(?:[0-9０-９]{1,2}月)?(?:[0-9０-９]{1,2}日)?", 0),
        // Chapter markers
        date_pattern(r"第\s*[0-9０-９一二三四五六七八九十百]+\s*[章話幕部]", 0),
        date_pattern(r"(?i)\bchapter\s+\d+\b", 0),
        date_pattern(r"(?i)\bact\s+(?:\d+|[ivx]+)\b", 0),
        // Relative story eras
        date_pattern(r"序盤|中盤|終盤|序章|終章|プロローグ|エピローグ|クライマックス|冒頭|結末", 0),
        date_pattern(
            r"(?i)\b(?:early|mid|middle|late)[- ](?:story|stage|game|act|part|book|chapter)\b",
            0,
        ),
        date_pattern(r"(?i)\b(?:prologue|epilogue|climax)\b", 0),
    ]
});

/// Katakana runs; ー (U+30FC) is Common script so it is listed explicitly.
static KATAKANA_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Katakana}ー]+").expect("valid regex"));

/// Structural katakana words that are never character names.
const NAME_STOPWORDS: &[&str] = &[
    "プロット", "キャラ", "キャラクター", "イベント", "シーン", "ストーリー", "テーマ", "タイトル",
    "カテゴリ", "カテゴリー", "プロローグ", "エピローグ", "エピソード", "ポイント", "ドラマ",
    "バトル", "ヒロイン", "ヒーロー", "ライバル", "ボス", "メイン", "サブ", "パート", "ページ",
    "アクション", "ミステリー", "ファンタジー", "ロマンス", "ターン", "ルート", "エンド", "ラスト",
    "スタート", "トラブル", "ピンチ", "チーム", "グループ", "メンバー", "リーダー", "モンスター",
    "タイムライン", "ドラフト", "アイデア", "アイディア", "プラン", "リスト", "メモ", "サンプル",
];

static TRAILING_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*[（(]([^（）()]+)[）)]\s*$").expect("valid regex"));

/// Find a date or era label in `text`, capped at `max_chars`.
pub fn extract_date(text: &str, max_chars: usize) -> Option<String> {
    let plain = strip_emphasis(text);
    DATE_PATTERNS.iter().find_map(|pattern| {
        let captures = pattern.regex.captures(&plain)?;
        let value = captures.get(pattern.group)?.as_str().trim();
        (!value.is_empty()).then(|| truncate_chars(value, max_chars))
    })
}

/// Candidate character names: katakana runs of 2 to 6 chars, minus
/// structural words, deduplicated in first-seen order.
///
/// Only katakana is considered, which fits the transliterated names of
/// Japanese fiction; names in kanji or other scripts are not detected.
/// Returns `None` for zero candidates and for more than
/// [`MAX_CHARACTER_NAMES`], which indicates prose noise rather than a cast.
pub fn extract_character_names(text: &str) -> Option<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for run in KATAKANA_RUN_RE.find_iter(text) {
        let candidate = run.as_str();
        let len = candidate.chars().count();
        let only_long_vowel = candidate.chars().all(|c| c == 'ー');
        if !(2..=6).contains(&len) || only_long_vowel || NAME_STOPWORDS.contains(&candidate) {
            continue;
        }
        if !names.iter().any(|n| n == candidate) {
            names.push(candidate.to_string());
        }
    }

    if names.is_empty() || names.len() > MAX_CHARACTER_NAMES {
        return None;
    }
    Some(names)
}

/// Build a description from a block of reply text.
///
/// Indented sub-list items are preferred. Without them, the first
/// `max_lines` substantive non-heading lines are used. The result is
/// capped at `max_chars`.
pub fn extract_description(block: &str, max_lines: usize, max_chars: usize) -> String {
    let sub_items: Vec<String> = block
        .lines()
        .filter(|line| line.starts_with([' ', '\t']) && has_list_marker(line))
        .map(|line| strip_emphasis(strip_list_marker(line)))
        .filter(|line| !line.is_empty())
        .collect();

    let parts = if sub_items.is_empty() {
        block
            .lines()
            .filter(|line| !is_heading(line))
            .map(|line| strip_emphasis(strip_list_marker(line)))
            .filter(|line| line.chars().count() >= 2)
            .take(max_lines)
            .collect()
    } else {
        sub_items
    };

    truncate_chars(&parts.join(" "), max_chars)
}

/// Split a trailing parenthetical off a title: `"旅立ち (第1章)"` becomes
/// `("旅立ち", Some("第1章"))`. Titles that are only a parenthetical are
/// left alone.
pub fn split_chapter_reference(title: &str) -> (String, Option<String>) {
    if let Some(captures) = TRAILING_PAREN_RE.captures(title) {
        let head = captures[1].trim();
        let chapter = captures[2].trim();
        if !head.is_empty() && !chapter.is_empty() {
            return (head.to_string(), Some(chapter.to_string()));
        }
    }
    (title.trim().to_string(), None)
}
