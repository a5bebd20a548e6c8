//! 对话相关：行动菜单、对话分支、NPC

use serde::{Deserialize, Serialize};

use super::visibility::ConditionEvaluator;
use crate::codec::{self, Code, Divider, FieldReader, FieldWriter, Record};

/// 菜单选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuOption {
    pub label: String,
    pub condition: String,
    pub action: String,
    /// 非空时选择后跳转
    pub target_page_id: String,
}

impl Record for MenuOption {
    const DIVIDER: Divider = codec::MENU_OPTION;

    fn write(&self, out: &mut FieldWriter) {
        out.text(&self.label)
            .text(&self.condition)
            .text(&self.action)
            .str(&self.target_page_id);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            label: input.text(),
            condition: input.text(),
            action: input.text(),
            target_page_id: input.str(),
        }
    }
}

/// 行动菜单
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionMenu {
    pub title: String,
    pub options: Vec<MenuOption>,
}

impl ActionMenu {
    /// 当前可用的选项（保留原始下标）
    pub fn available<'a, E>(&'a self, eval: &E) -> Vec<(usize, &'a MenuOption)>
    where
        E: ConditionEvaluator + ?Sized,
    {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| eval.check(&option.condition))
            .collect()
    }
}

impl Record for ActionMenu {
    const DIVIDER: Divider = codec::ACTION_MENU;

    fn write(&self, out: &mut FieldWriter) {
        out.text(&self.title).list(&self.options);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            title: input.text(),
            options: input.list(),
        }
    }
}

/// 选择对话选项之后切换到哪个分支
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationSwitch {
    /// 留在当前分支
    #[default]
    Stay,
    SwitchToA,
    SwitchToB,
    /// 结束对话
    End,
}

impl Code for ConversationSwitch {
    fn code(&self) -> &'static str {
        match self {
            Self::Stay => "stay",
            Self::SwitchToA => "a",
            Self::SwitchToB => "b",
            Self::End => "end",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "stay" => Some(Self::Stay),
            "a" => Some(Self::SwitchToA),
            "b" => Some(Self::SwitchToB),
            "end" => Some(Self::End),
            _ => None,
        }
    }
}

/// 对话选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationOption {
    pub text: String,
    /// NPC 的回答
    pub reply: String,
    pub condition: String,
    pub action: String,
    pub then: ConversationSwitch,
}

impl Record for ConversationOption {
    const DIVIDER: Divider = codec::CONVERSATION_OPTION;

    fn write(&self, out: &mut FieldWriter) {
        out.text(&self.text)
            .text(&self.reply)
            .text(&self.condition)
            .text(&self.action)
            .code(&self.then);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            text: input.text(),
            reply: input.text(),
            condition: input.text(),
            action: input.text(),
            then: input.code(),
        }
    }
}

/// 对话分支
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub condition: String,
    pub options: Vec<ConversationOption>,
}

impl Conversation {
    /// 当前可用的选项（保留原始下标）
    pub fn available<'a, E>(&'a self, eval: &E) -> Vec<(usize, &'a ConversationOption)>
    where
        E: ConditionEvaluator + ?Sized,
    {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| eval.check(&option.condition))
            .collect()
    }
}

impl Record for Conversation {
    const DIVIDER: Divider = codec::CONVERSATION;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.id)
            .text(&self.title)
            .text(&self.condition)
            .list(&self.options);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            id: input.str(),
            title: input.text(),
            condition: input.text(),
            options: input.list(),
        }
    }
}

/// NPC 描述
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub image: String,
    /// NPC 出现的条件，不成立时该页的对话不可用
    pub condition: String,
    pub greeting: String,
}

impl Record for Npc {
    const DIVIDER: Divider = codec::NPC;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.id)
            .text(&self.name)
            .str(&self.image)
            .text(&self.condition)
            .text(&self.greeting);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            id: input.str(),
            name: input.text(),
            image: input.str(),
            condition: input.text(),
            greeting: input.text(),
        }
    }
}
