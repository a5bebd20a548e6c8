//! # Page
//!
//! 页面是内容图里最丰富的实体。页面只属于一个章节，
//! 对其它页面的引用一律是字符串 id，不持有所有权。

use serde::{Deserialize, Serialize};

use super::dialogue::{ActionMenu, Conversation, Npc};
use super::hotspot::{Interaction, NavigationPoint, TouchZone};
use super::overlay::{Balloon, Caption, DetailImage, Panel, Slots, WordArt};
use super::puzzle::{PinPuzzle, SymbolPuzzle};
use crate::codec::{self, Code, Divider, FieldReader, FieldWriter, Record};

/// 复合页 id 的分隔符：`chapter|page`
pub const PAGE_ID_SEPARATOR: char = '|';

/// 拆分复合 id，没有章节前缀时返回 `None`
pub fn split_page_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(PAGE_ID_SEPARATOR)
}

/// 拼接复合 id
pub fn join_page_id(chapter_id: &str, page_id: &str) -> String {
    format!("{chapter_id}{PAGE_ID_SEPARATOR}{page_id}")
}

/// 页面类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageType {
    #[default]
    FullImage,
    PanelGrid,
    Panorama,
}

impl Code for PageType {
    fn code(&self) -> &'static str {
        match self {
            Self::FullImage => "full",
            Self::PanelGrid => "grid",
            Self::Panorama => "panorama",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "full" => Some(Self::FullImage),
            "grid" => Some(Self::PanelGrid),
            "panorama" => Some(Self::Panorama),
            _ => None,
        }
    }
}

/// 天气效果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Snow,
    Fog,
    Storm,
    Wind,
}

impl Code for Weather {
    fn code(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Fog => "fog",
            Self::Storm => "storm",
            Self::Wind => "wind",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "clear" => Some(Self::Clear),
            "rain" => Some(Self::Rain),
            "snow" => Some(Self::Snow),
            "fog" => Some(Self::Fog),
            "storm" => Some(Self::Storm),
            "wind" => Some(Self::Wind),
            _ => None,
        }
    }
}

/// 当前激活的对话分支
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationSlot {
    #[default]
    None,
    A,
    B,
}

impl Code for ConversationSlot {
    fn code(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::A => "a",
            Self::B => "b",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "none" => Some(Self::None),
            "a" => Some(Self::A),
            "b" => Some(Self::B),
            _ => None,
        }
    }
}

/// 环境音指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundDirective {
    pub path: String,
    pub volume: f32,
    pub looped: bool,
}

impl Default for SoundDirective {
    fn default() -> Self {
        Self {
            path: String::new(),
            volume: 1.0,
            looped: true,
        }
    }
}

impl Record for SoundDirective {
    const DIVIDER: Divider = codec::SOUND;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.path).float(self.volume).bool(self.looped);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            path: input.str(),
            volume: input.float(),
            looped: input.bool(),
        }
    }
}

/// 资源标签三元组，发给资源加载方
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTags {
    pub load: String,
    pub release: String,
    pub prefetch: String,
}

impl ResourceTags {
    pub fn is_empty(&self) -> bool {
        self.load.is_empty() && self.release.is_empty() && self.prefetch.is_empty()
    }
}

/// 页面
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub id: String,
    /// 所属章节，加入章节时写入
    pub chapter_id: String,
    pub page_type: PageType,
    pub title: String,
    pub image: String,
    pub previous_page_id: String,
    pub next_page_id: String,
    pub weather: Weather,
    pub tags: ResourceTags,
    /// 离开临时页时不更新“上一页”指针
    pub ephemeral: bool,
    pub hint: String,
    pub on_load: String,
    pub location_sound: Option<SoundDirective>,
    pub captions: Slots<Caption>,
    pub balloons: Slots<Balloon>,
    pub word_art: Slots<WordArt>,
    pub detail_images: Slots<DetailImage>,
    pub panels: Slots<Panel>,
    pub touch_zones: Vec<TouchZone>,
    pub navigation_points: Vec<NavigationPoint>,
    pub interactions: Vec<Interaction>,
    pub action_menu: Option<ActionMenu>,
    pub conversation_a: Option<Conversation>,
    pub conversation_b: Option<Conversation>,
    pub active_conversation: ConversationSlot,
    pub pin: Option<PinPuzzle>,
    pub symbols: Option<SymbolPuzzle>,
    pub npc: Option<Npc>,
    /// 打开页面时发现的笔记
    pub notebook_entry: String,
}

impl Page {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// `chapter|page` 形式的完整 id；不属于任何章节时就是页 id 本身
    pub fn full_id(&self) -> String {
        if self.chapter_id.is_empty() {
            self.id.clone()
        } else {
            join_page_id(&self.chapter_id, &self.id)
        }
    }

    /// 把链接补全为复合 id，裸 id 视为同章节
    ///
    /// 哨兵 (`@…`) 和含宏的链接原样返回，需要先展开再补全。
    pub fn qualify(&self, link: &str) -> Option<String> {
        let link = link.trim();
        if link.is_empty() {
            None
        } else if link.starts_with('@')
            || link.contains("{{")
            || split_page_id(link).is_some()
            || self.chapter_id.is_empty()
        {
            Some(link.to_string())
        } else {
            Some(join_page_id(&self.chapter_id, link))
        }
    }

    pub fn conversation(&self, slot: ConversationSlot) -> Option<&Conversation> {
        match slot {
            ConversationSlot::None => None,
            ConversationSlot::A => self.conversation_a.as_ref(),
            ConversationSlot::B => self.conversation_b.as_ref(),
        }
    }

    /// 当前激活的对话
    pub fn active(&self) -> Option<&Conversation> {
        self.conversation(self.active_conversation)
    }

    /// 所有指向其它页面的链接（诊断用）
    pub fn links(&self) -> Vec<&str> {
        let mut links = vec![self.previous_page_id.as_str(), self.next_page_id.as_str()];
        links.extend(self.navigation_points.iter().map(|p| p.target_page_id.as_str()));
        links.extend(self.touch_zones.iter().map(|z| z.target_page_id.as_str()));
        if let Some(menu) = &self.action_menu {
            links.extend(menu.options.iter().map(|o| o.target_page_id.as_str()));
        }
        if let Some(pin) = &self.pin {
            links.push(pin.success_page_id.as_str());
        }
        if let Some(symbols) = &self.symbols {
            links.push(symbols.success_page_id.as_str());
        }
        links.retain(|link| !link.trim().is_empty());
        links
    }
}

impl Record for Page {
    const DIVIDER: Divider = codec::PAGE;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.id)
            .str(&self.chapter_id)
            .code(&self.page_type)
            .text(&self.title)
            .str(&self.image)
            .str(&self.previous_page_id)
            .str(&self.next_page_id)
            .code(&self.weather)
            .str(&self.tags.load)
            .str(&self.tags.release)
            .str(&self.tags.prefetch)
            .bool(self.ephemeral)
            .text(&self.hint)
            .text(&self.on_load)
            .optional(self.location_sound.as_ref());
        self.captions.write(out);
        self.balloons.write(out);
        self.word_art.write(out);
        self.detail_images.write(out);
        self.panels.write(out);
        out.list(&self.touch_zones)
            .list(&self.navigation_points)
            .list(&self.interactions)
            .optional(self.action_menu.as_ref())
            .optional(self.conversation_a.as_ref())
            .optional(self.conversation_b.as_ref())
            .code(&self.active_conversation)
            .optional(self.pin.as_ref())
            .optional(self.symbols.as_ref())
            .optional(self.npc.as_ref())
            .str(&self.notebook_entry);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            id: input.str(),
            chapter_id: input.str(),
            page_type: input.code(),
            title: input.text(),
            image: input.str(),
            previous_page_id: input.str(),
            next_page_id: input.str(),
            weather: input.code(),
            tags: ResourceTags {
                load: input.str(),
                release: input.str(),
                prefetch: input.str(),
            },
            ephemeral: input.bool(),
            hint: input.text(),
            on_load: input.text(),
            location_sound: input.optional(),
            captions: Slots::read(input),
            balloons: Slots::read(input),
            word_art: Slots::read(input),
            detail_images: Slots::read(input),
            panels: Slots::read(input),
            touch_zones: input.list(),
            navigation_points: input.list(),
            interactions: input.list(),
            action_menu: input.optional(),
            conversation_a: input.optional(),
            conversation_b: input.optional(),
            active_conversation: input.code(),
            pin: input.optional(),
            symbols: input.optional(),
            npc: input.optional(),
            notebook_entry: input.str(),
        }
    }
}
