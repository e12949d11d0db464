use super::types::EventCategory;

/// A keyword table: categories in priority order, each with the lowercase
/// keywords that vote for it. The first category with any hit wins.
pub type KeywordTable = [(EventCategory, &'static [&'static str])];

/// Per-event inference. Priority: character > world > plot.
pub static EVENT_KEYWORDS: &KeywordTable = &[
    (
        EventCategory::Character,
        &[
            "主人公", "登場人物", "キャラクター", "キャラ", "人物", "出会い", "出会う", "成長",
            "決意", "葛藤", "心情", "感情", "覚醒", "過去", "関係", "友情", "恋", "裏切",
            "character", "protagonist", "growth", "backstory", "motivation", "relationship",
            "meets", "betray",
        ],
    ),
    (
        EventCategory::World,
        &[
            "世界観", "世界", "設定", "歴史", "伝説", "神話", "魔法", "王国", "帝国", "都市",
            "文化", "社会", "組織", "地理", "舞台", "種族", "world", "setting", "lore",
            "history", "legend", "kingdom", "empire", "magic", "culture",
        ],
    ),
    (
        EventCategory::Plot,
        &[
            "事件", "展開", "発生", "対決", "戦い", "転機", "転換", "導入", "結末", "クライマックス",
            "伏線", "plot", "conflict", "battle", "turning point", "climax", "incident",
            "reveal", "twist",
        ],
    ),
];

/// Vendor section headings name story stages, so stage words outrank the
/// character and world terms here.
pub static SECTION_KEYWORDS: &KeywordTable = &[
    (
        EventCategory::Plot,
        &[
            "導入", "序盤", "起承転結", "転換点", "転機", "ターニングポイント", "クライマックス",
            "結末", "展開", "山場", "プロット", "introduction", "inciting", "turning point",
            "climax", "resolution", "rising action", "falling action", "plot",
        ],
    ),
    (
        EventCategory::Character,
        &[
            "キャラクター", "登場人物", "人物", "主人公", "成長", "関係", "character",
            "protagonist", "growth",
        ],
    ),
    (
        EventCategory::World,
        &["世界観", "世界", "設定", "舞台", "歴史", "伝承", "world", "setting", "lore", "history"],
    ),
];

/// Generic table lookup over lowercase text.
pub fn lookup_keyword_table(text: &str, table: &KeywordTable) -> Option<EventCategory> {
    let lower = text.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_keyword(&lower, k)))
        .map(|(category, _)| *category)
}

/// Endings an English keyword may carry and still count as the same word.
const ENGLISH_SUFFIXES: &[&str] = &["", "s", "es", "ed", "al", "ing"];

/// Japanese keywords match as substrings. ASCII keywords must start on a
/// word boundary and end on one, give or take an inflection, so `setting`
/// does not fire inside `upsetting`.
fn contains_keyword(text: &str, keyword: &str) -> bool {
    if !keyword.is_ascii() {
        return text.contains(keyword);
    }
    text.match_indices(keyword).any(|(start, _)| {
        let joined_before = text[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric());
        if joined_before {
            return false;
        }
        let rest = &text[start + keyword.len()..];
        let tail_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        ENGLISH_SUFFIXES.contains(&&rest[..tail_len])
    })
}

/// Infer a category from an event's title and description.
/// Deterministic; defaults to `Plot` when nothing matches.
pub fn infer_category(title: &str, description: &str) -> EventCategory {
    let combined = format!("{title} {description}");
    lookup_keyword_table(&combined, EVENT_KEYWORDS).unwrap_or_default()
}

/// Category for every event under a vendor section heading.
pub fn section_category(section_name: &str) -> EventCategory {
    lookup_keyword_table(section_name, SECTION_KEYWORDS).unwrap_or_default()
}

/// Map an explicit category label from the model to the closed set.
/// Handles English and Japanese spellings; `None` for unknown labels.
pub fn map_category_label(label: &str) -> Option<EventCategory> {
    match label.to_lowercase().trim() {
        // English
        "character" | "characters" | "char" | "person" | "people" | "character_event" => {
            Some(EventCategory::Character)
        }
        "world" | "setting" | "lore" | "worldbuilding" | "world_building" | "world-building" => {
            Some(EventCategory::World)
        }
        "plot" | "story" | "event" | "main" | "main_plot" | "storyline" => Some(EventCategory::Plot),
        "other" | "misc" | "miscellaneous" | "none" => Some(EventCategory::Other),
        // Japanese
        "キャラクター" | "キャラ" | "人物" | "登場人物" => Some(EventCategory::Character),
        "世界" | "世界観" | "設定" | "世界設定" => Some(EventCategory::World),
        "プロット" | "物語" | "ストーリー" | "展開" | "本筋" | "出来事" => Some(EventCategory::Plot),
        "その他" | "他" => Some(EventCategory::Other),
        _ => None,
    }
}
