// Cleanup of raw model replies before any strategy sees them, plus the small
// text helpers every strategy shares (marker stripping, char-safe truncation).

use std::sync::LazyLock;

use regex::Regex;

/// Marker appended when a field is cut to its cap.
pub const ELLIPSIS: char = '…';

// <|...|> tokens (many chat templates), [INST]/[/INST] and <<SYS>>/<</SYS>> (llama)
static SPECIAL_TOKENS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\|[^|>]+\|>|\[/?INST\]|<</?SYS>>").expect("valid regex")
});

static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+|[・•]\s*|[0-9０-９]+[.)．、）]\s*)").expect("valid regex")
});

/// Prepare a model reply for parsing: drop leaked special tokens and
/// invisible characters, and unify line endings. Returns a new string.
pub fn normalize_input(raw: &str) -> String {
    let without_tokens = SPECIAL_TOKENS_RE.replace_all(raw, "");
    let visible = remove_invisible_chars(&without_tokens);
    visible.replace("\r\n", "\n").replace('\r', "\n")
}

/// Remove zero-width, bidi and BOM characters a model may emit.
/// Preserves standard whitespace (space, newline, tab).
fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if *c == ' ' || *c == '\n' || *c == '\t' || *c == '\r' {
                return true;
            }
            if matches!(
                *c,
                '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
            ) {
                return false;
            }
            !c.is_control()
        })
        .collect()
}

/// Strip a leading bullet (`-`, `*`, `+`, `・`, `•`) or number marker
/// (`1.`, `2)`, `３．`) and surrounding whitespace.
pub fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER_RE.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line.trim(),
    }
}

/// Does the line start with a bullet or number marker?
pub fn has_list_marker(line: &str) -> bool {
    LIST_MARKER_RE.is_match(line)
}

/// Remove markdown bold/underline emphasis markers.
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "").trim().to_string()
}

/// Markdown heading of any level?
pub fn is_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes)
        && trimmed[hashes..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
}

/// Cut `text` to at most `max_chars` chars, ending with [`ELLIPSIS`] when
/// something was removed. Already-short text is returned unchanged, so the
/// operation is idempotent.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(max_chars - 1).collect();
    cut.truncate(cut.trim_end().len());
    cut.push(ELLIPSIS);
    cut
}

/// `Some(trimmed)` unless the text is blank.
pub fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
