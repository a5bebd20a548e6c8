//! # Overlay 模块
//!
//! 页面上按固定槽位摆放的叠加元素：旁白框、对话气泡、拟声字、细节图、分格。
//!
//! 每种元素各有 12 个槽位，槽位下标就是 [`Placement`]。
//! 空槽位是合法状态，表示该位置没有元素。

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::geometry::{Color, Point, Rect};
use super::visibility::{ConditionEvaluator, ViewContext, Visibility};
use crate::codec::{self, Code, Divider, FieldReader, FieldWriter, Record};

/// 每种叠加元素的槽位数
pub const SLOT_COUNT: usize = 12;

/// 叠加元素的摆放位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    /// 页眉条
    Header,
    /// 页脚条
    Footer,
    /// 覆盖整个画面
    FullFrame,
}

impl Placement {
    /// 按槽位顺序排列的全部位置
    pub const ALL: [Placement; SLOT_COUNT] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::MiddleLeft,
        Self::Center,
        Self::MiddleRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
        Self::Header,
        Self::Footer,
        Self::FullFrame,
    ];

    /// 槽位下标
    pub fn index(self) -> usize {
        self as usize
    }

    /// 由槽位下标得到位置，越界返回 `None`
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 从字符串解析位置（便捷方法）
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_str(s).ok()
    }
}

impl FromStr for Placement {
    type Err = ();

    /// 从字符串解析位置（不区分大小写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "topleft" => Ok(Self::TopLeft),
            "topcenter" | "top" => Ok(Self::TopCenter),
            "topright" => Ok(Self::TopRight),
            "middleleft" | "left" => Ok(Self::MiddleLeft),
            "center" | "middle" => Ok(Self::Center),
            "middleright" | "right" => Ok(Self::MiddleRight),
            "bottomleft" => Ok(Self::BottomLeft),
            "bottomcenter" | "bottom" => Ok(Self::BottomCenter),
            "bottomright" => Ok(Self::BottomRight),
            "header" => Ok(Self::Header),
            "footer" => Ok(Self::Footer),
            "fullframe" | "full" => Ok(Self::FullFrame),
            _ => Err(()),
        }
    }
}

/// 带可见性规则的叠加元素
pub trait Overlay {
    fn visibility(&self) -> &Visibility;
}

/// 固定 12 槽位的元素数组
#[derive(Debug, Clone, PartialEq)]
pub struct Slots<T> {
    slots: [Option<T>; SLOT_COUNT],
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<T> Slots<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由任意长度的槽位列表构造，多余的截断，不足的补空
    pub fn from_vec(values: Vec<Option<T>>) -> Self {
        let mut slots = Self::default();
        for (slot, value) in slots.slots.iter_mut().zip(values) {
            *slot = value;
        }
        slots
    }

    pub fn get(&self, placement: Placement) -> Option<&T> {
        self.slots[placement.index()].as_ref()
    }

    /// 按下标取元素，越界返回 `None`
    pub fn get_index(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, placement: Placement) -> Option<&mut T> {
        self.slots[placement.index()].as_mut()
    }

    /// 放入元素，返回被替换的旧元素
    pub fn insert(&mut self, placement: Placement, value: T) -> Option<T> {
        self.slots[placement.index()].replace(value)
    }

    pub fn remove(&mut self, placement: Placement) -> Option<T> {
        self.slots[placement.index()].take()
    }

    /// 已占用的槽位数
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    /// 遍历已占用的槽位
    pub fn iter(&self) -> impl Iterator<Item = (Placement, &T)> {
        Placement::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(placement, slot)| slot.as_ref().map(|v| (placement, v)))
    }

    pub fn as_slice(&self) -> &[Option<T>] {
        &self.slots
    }
}

impl<T: Overlay> Slots<T> {
    /// 12 位布局串，每位表示对应槽位当前是否应显示
    ///
    /// 调用方只用它做变化检测（是否需要重绘 / 重新朗读）。
    pub fn layout<E>(&self, ctx: &ViewContext, eval: &E) -> String
    where
        E: ConditionEvaluator + ?Sized,
    {
        self.slots
            .iter()
            .map(|slot| match slot {
                Some(element) if element.visibility().layout_bit(ctx, eval) => '1',
                _ => '0',
            })
            .collect()
    }

    /// 取指定位置上当前可见的元素
    pub fn visible_at<E>(&self, placement: Placement, ctx: &ViewContext, eval: &E) -> Option<&T>
    where
        E: ConditionEvaluator + ?Sized,
    {
        self.get(placement)
            .filter(|element| element.visibility().is_visible(ctx, eval))
    }

    /// 当前所有可见元素（按槽位顺序）
    pub fn visible<E>(&self, ctx: &ViewContext, eval: &E) -> Vec<(Placement, &T)>
    where
        E: ConditionEvaluator + ?Sized,
    {
        self.iter()
            .filter(|(_, element)| element.visibility().is_visible(ctx, eval))
            .collect()
    }
}

impl<T: Record> Slots<T> {
    pub(crate) fn write(&self, out: &mut FieldWriter) {
        out.slots(&self.slots);
    }

    pub(crate) fn read(input: &mut FieldReader<'_>) -> Self {
        Self::from_vec(input.slots(SLOT_COUNT))
    }
}

/// 旁白框
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Caption {
    pub text: String,
    pub visibility: Visibility,
    pub text_color: Color,
    pub background_color: Color,
    pub offset: Point,
}

impl Caption {
    pub fn new(text: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            text: text.into(),
            visibility,
            text_color: Color::BLACK,
            background_color: Color::WHITE,
            offset: Point::default(),
        }
    }
}

impl Overlay for Caption {
    fn visibility(&self) -> &Visibility {
        &self.visibility
    }
}

impl Record for Caption {
    const DIVIDER: Divider = codec::CAPTION;

    fn write(&self, out: &mut FieldWriter) {
        out.text(&self.text)
            .child(&self.visibility)
            .color(self.text_color)
            .color(self.background_color)
            .point(self.offset);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            text: input.text(),
            visibility: input.child(),
            text_color: input.color(),
            background_color: input.color(),
            offset: input.point(),
        }
    }
}

/// 气泡样式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalloonStyle {
    #[default]
    Speech,
    Thought,
    Shout,
    Whisper,
}

impl Code for BalloonStyle {
    fn code(&self) -> &'static str {
        match self {
            Self::Speech => "speech",
            Self::Thought => "thought",
            Self::Shout => "shout",
            Self::Whisper => "whisper",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "speech" => Some(Self::Speech),
            "thought" => Some(Self::Thought),
            "shout" => Some(Self::Shout),
            "whisper" => Some(Self::Whisper),
            _ => None,
        }
    }
}

/// 对话气泡
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Balloon {
    /// 说话者（空表示无名）
    pub speaker: String,
    pub text: String,
    pub visibility: Visibility,
    pub style: BalloonStyle,
    /// 气泡尾巴指向的位置
    pub tail: Point,
}

impl Balloon {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            visibility,
            ..Default::default()
        }
    }
}

impl Overlay for Balloon {
    fn visibility(&self) -> &Visibility {
        &self.visibility
    }
}

impl Record for Balloon {
    const DIVIDER: Divider = codec::BALLOON;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.speaker)
            .text(&self.text)
            .child(&self.visibility)
            .code(&self.style)
            .point(self.tail);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            speaker: input.str(),
            text: input.text(),
            visibility: input.child(),
            style: input.code(),
            tail: input.point(),
        }
    }
}

/// 拟声字 / 艺术字
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordArt {
    pub text: String,
    pub visibility: Visibility,
    pub color: Color,
    /// 旋转角度（度）
    pub rotation: f32,
    pub scale: f64,
    /// 出现时播放的音效
    pub sound: String,
}

impl Overlay for WordArt {
    fn visibility(&self) -> &Visibility {
        &self.visibility
    }
}

impl Record for WordArt {
    const DIVIDER: Divider = codec::WORD_ART;

    fn write(&self, out: &mut FieldWriter) {
        out.text(&self.text)
            .child(&self.visibility)
            .color(self.color)
            .float(self.rotation)
            .double(self.scale)
            .str(&self.sound);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            text: input.text(),
            visibility: input.child(),
            color: input.color(),
            rotation: input.float(),
            scale: input.double(),
            sound: input.str(),
        }
    }
}

/// 细节图（放大镜头、插入小图）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailImage {
    pub image: String,
    pub visibility: Visibility,
    pub offset: Point,
    pub scale: f64,
}

impl Overlay for DetailImage {
    fn visibility(&self) -> &Visibility {
        &self.visibility
    }
}

impl Record for DetailImage {
    const DIVIDER: Divider = codec::DETAIL_IMAGE;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.image)
            .child(&self.visibility)
            .point(self.offset)
            .double(self.scale);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            image: input.str(),
            visibility: input.child(),
            offset: input.point(),
            scale: input.double(),
        }
    }
}

/// 分格
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    pub image: String,
    pub frame: Rect,
    pub visibility: Visibility,
}

impl Overlay for Panel {
    fn visibility(&self) -> &Visibility {
        &self.visibility
    }
}

impl Record for Panel {
    const DIVIDER: Divider = codec::PANEL;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.image).rect(self.frame).child(&self.visibility);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            image: input.str(),
            frame: input.rect(),
            visibility: input.child(),
        }
    }
}
