//! # Model 模块
//!
//! 内容图的实体定义：章节、页面以及页面上的各种元素。
//!
//! 每个实体都实现了 [`Record`](crate::codec::Record)，可以直接进出存档。

mod chapter;
mod dialogue;
mod geometry;
mod hotspot;
mod overlay;
mod page;
mod puzzle;
mod visibility;

pub use chapter::Chapter;
pub use dialogue::{ActionMenu, Conversation, ConversationOption, ConversationSwitch, MenuOption, Npc};
pub use geometry::{Color, Point, Rect};
pub use hotspot::{
    Interaction, NavigationPoint, TouchZone, first_interaction, first_navigation_point,
    first_touch_zone,
};
pub use overlay::{
    Balloon, BalloonStyle, Caption, DetailImage, Overlay, Panel, Placement, SLOT_COUNT, Slots,
    WordArt,
};
pub use page::{
    ConversationSlot, PAGE_ID_SEPARATOR, Page, PageType, ResourceTags, SoundDirective, Weather,
    join_page_id, split_page_id,
};
pub use puzzle::{PinPuzzle, PuzzleOutcome, SymbolPuzzle};
pub use visibility::{
    AllConditionsPass, ConditionEvaluator, FnConditions, TargetRange, ViewContext, Visibility,
    VisibilityMode,
};
