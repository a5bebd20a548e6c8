//! 分隔符表
//!
//! 每种实体类型一对，互不重复。这张表本身就是存档格式的一部分。

use super::Divider;

pub const BOOK: Divider = Divider::new("~bk~", "~bk*~");
pub const NOTEBOOK: Divider = Divider::new("~nb~", "~nb*~");
pub const NOTEBOOK_ENTRY: Divider = Divider::new("~ne~", "~ne*~");
pub const ITEM: Divider = Divider::new("~it~", "~it*~");
pub const ITEM_STATE: Divider = Divider::new("~is~", "~is*~");
pub const CHAPTER: Divider = Divider::new("~ch~", "~ch*~");
pub const PAGE: Divider = Divider::new("~pg~", "~pg*~");
pub const VISIBILITY: Divider = Divider::new("~vz~", "~vz*~");
pub const CAPTION: Divider = Divider::new("~cp~", "~cp*~");
pub const BALLOON: Divider = Divider::new("~bl~", "~bl*~");
pub const WORD_ART: Divider = Divider::new("~wa~", "~wa*~");
pub const DETAIL_IMAGE: Divider = Divider::new("~di~", "~di*~");
pub const PANEL: Divider = Divider::new("~pn~", "~pn*~");
pub const TOUCH_ZONE: Divider = Divider::new("~tz~", "~tz*~");
pub const NAVIGATION_POINT: Divider = Divider::new("~np~", "~np*~");
pub const INTERACTION: Divider = Divider::new("~ia~", "~ia*~");
pub const ACTION_MENU: Divider = Divider::new("~am~", "~am*~");
pub const MENU_OPTION: Divider = Divider::new("~mo~", "~mo*~");
pub const CONVERSATION: Divider = Divider::new("~cv~", "~cv*~");
pub const CONVERSATION_OPTION: Divider = Divider::new("~co~", "~co*~");
pub const PIN_PUZZLE: Divider = Divider::new("~pin~", "~pin*~");
pub const SYMBOL_PUZZLE: Divider = Divider::new("~sym~", "~sym*~");
pub const NPC: Divider = Divider::new("~npc~", "~npc*~");
pub const SOUND: Divider = Divider::new("~snd~", "~snd*~");

/// 状态表键值对分隔符
pub const STATE_MAP: &str = "~kv~";
/// 谜题符号列表分隔符
pub const SYMBOL_LIST: &str = "~sl~";

/// 所有实体分隔符（用于唯一性校验）
pub const ALL_DIVIDERS: &[Divider] = &[
    BOOK,
    NOTEBOOK,
    NOTEBOOK_ENTRY,
    ITEM,
    ITEM_STATE,
    CHAPTER,
    PAGE,
    VISIBILITY,
    CAPTION,
    BALLOON,
    WORD_ART,
    DETAIL_IMAGE,
    PANEL,
    TOUCH_ZONE,
    NAVIGATION_POINT,
    INTERACTION,
    ACTION_MENU,
    MENU_OPTION,
    CONVERSATION,
    CONVERSATION_OPTION,
    PIN_PUZZLE,
    SYMBOL_PUZZLE,
    NPC,
    SOUND,
];

/// 所有 token，包括非实体分隔符
pub fn all_tokens() -> Vec<&'static str> {
    ALL_DIVIDERS
        .iter()
        .flat_map(|d| [d.field, d.list])
        .chain([STATE_MAP, SYMBOL_LIST])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_unique() {
        let tokens = all_tokens();
        let unique: HashSet<_> = tokens.iter().collect();
        assert_eq!(unique.len(), tokens.len());
    }

    #[test]
    fn test_tokens_are_well_formed() {
        for token in all_tokens() {
            assert!(token.starts_with('~') && token.ends_with('~'), "{token}");
            // 中间不能再出现 ~，否则切分时会被拆成两个 token
            assert_eq!(token.matches('~').count(), 2, "{token}");
            assert!(token.len() > 2, "{token}");
        }
    }
}
