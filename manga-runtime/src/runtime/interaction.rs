//! # Interaction 模块
//!
//! 触发类操作：导航点、交互点、触摸区域、行动菜单、对话、谜题和物品。
//!
//! 命中判定是纯查询（见 [`crate::model`]），这里负责判定之后的副作用：
//! 运行动作脚本、切换页面、修改物品栏。脚本失败只记录日志，不会中断操作。

use tracing::{debug, info, warn};

use crate::command::Command;
use crate::error::RuntimeError;
use crate::history::HistoryEvent;
use crate::model::{
    ConditionEvaluator, ConversationSlot, ConversationSwitch, PinPuzzle, Point, PuzzleOutcome,
    SymbolPuzzle, first_interaction, first_touch_zone,
};
use crate::runtime::MangaRuntime;

/// 命中后要执行的动作
struct Action {
    script: String,
    target: Option<String>,
}

impl MangaRuntime {
    /// 先运行动作脚本，脚本没有切换页面时再跳转到目标页
    fn perform(&mut self, action: Action) {
        let page_before = self.book.current_page_id.clone();
        self.run_script(&action.script);

        let Some(target) = action.target else {
            return;
        };
        if self.book.current_page_id != page_before {
            debug!(target = %target, "动作脚本已切换页面，忽略目标页");
            return;
        }
        // 失败已在 display_page 中记录
        let _ = self.display_page(&target);
    }

    /// 触发当前视角下的导航点，返回是否命中
    pub fn trigger_navigation(&mut self) -> bool {
        let Some(point) = self.navigation_point() else {
            return false;
        };
        let action = Action {
            script: point.action.clone(),
            target: self.resolve_link(&point.target_page_id),
        };
        self.perform(action);
        true
    }

    /// 触发当前视角下的交互点，返回是否命中
    pub fn trigger_interaction(&mut self) -> bool {
        let Some(page) = self.current_page() else {
            return false;
        };
        let Some(interaction) =
            first_interaction(&page.interactions, &self.view, &self.conditions())
        else {
            return false;
        };
        let sound = interaction.sound.clone();
        let action = Action {
            script: interaction.action.clone(),
            target: None,
        };
        debug!(interaction = %interaction.id, "触发交互点");

        if !sound.trim().is_empty() {
            self.commands.push(Command::PlaySound { path: sound });
        }
        self.perform(action);
        true
    }

    /// 触摸屏幕上的一点，返回是否命中触摸区域
    pub fn touch(&mut self, point: Point) -> bool {
        let Some(page) = self.current_page() else {
            return false;
        };
        let Some(zone) = first_touch_zone(&page.touch_zones, point, &self.conditions()) else {
            return false;
        };
        let action = Action {
            script: zone.action.clone(),
            target: self.resolve_link(&zone.target_page_id),
        };
        debug!(zone = %zone.id, "触发触摸区域");
        self.perform(action);
        true
    }

    /// 打开行动菜单，返回当前页是否有菜单
    pub fn open_action_menu(&mut self) -> bool {
        let Some(menu) = self.action_menu() else {
            return false;
        };
        let title = self.engine.expand_macros(&menu.title, &self.book);
        let options = self.available_menu_options();
        self.commands.push(Command::ShowActionMenu { title, options });
        true
    }

    /// 选择行动菜单选项（原始下标）
    pub fn choose_menu_option(&mut self, index: usize) -> Result<(), RuntimeError> {
        let menu = self.action_menu().ok_or(RuntimeError::InvalidOptionIndex { index, max: 0 })?;
        let max = menu.options.len();
        let option = menu
            .options
            .get(index)
            .filter(|option| self.conditions().check(&option.condition))
            .ok_or(RuntimeError::InvalidOptionIndex { index, max })?;

        let action = Action {
            script: option.action.clone(),
            target: self.resolve_link(&option.target_page_id),
        };
        self.perform(action);
        Ok(())
    }

    /// 选择对话选项（原始下标），返回展开后的回复文本
    ///
    /// 选项的 `then` 通过页 id 回查所属页面来切换激活的对话分支。
    pub fn choose_conversation_option(&mut self, index: usize) -> Result<String, RuntimeError> {
        let page_id = self.book.current_page_id.clone();
        let conversation = self
            .current_conversation()
            .ok_or(RuntimeError::InvalidOptionIndex { index, max: 0 })?;
        let max = conversation.options.len();
        let option = conversation
            .options
            .get(index)
            .filter(|option| self.conditions().check(&option.condition))
            .ok_or(RuntimeError::InvalidOptionIndex { index, max })?;

        let reply = self.engine.expand_macros(&option.reply, &self.book);
        let script = option.action.clone();
        let then = option.then;

        self.run_script(&script);

        let slot = match then {
            ConversationSwitch::Stay => None,
            ConversationSwitch::SwitchToA => Some(ConversationSlot::A),
            ConversationSwitch::SwitchToB => Some(ConversationSlot::B),
            ConversationSwitch::End => Some(ConversationSlot::None),
        };
        if let Some(slot) = slot {
            match self.book.get_page_mut(&page_id) {
                Some(page) => page.active_conversation = slot,
                None => warn!(page_id = %page_id, "对话所属页面已不存在，无法切换分支"),
            }
        }
        Ok(reply)
    }

    /// 输入 PIN 码
    pub fn enter_pin(&mut self, code: &str) -> PuzzleOutcome {
        let Some(pin) = self.current_page().and_then(|p| p.pin.clone()) else {
            return PuzzleOutcome::NoPuzzle;
        };
        let expected = self.engine.expand_macros(&pin.code, &self.book);
        let entered = self.engine.expand_macros(code, &self.book);

        let solved = PinPuzzle::matches(&expected, &entered);
        self.finish_puzzle(solved, pin.success_page_id, pin.on_success, pin.on_failure)
    }

    /// 输入符号序列
    pub fn enter_symbols(&mut self, symbols: &[String]) -> PuzzleOutcome {
        let Some(puzzle) = self.current_page().and_then(|p| p.symbols.clone()) else {
            return PuzzleOutcome::NoPuzzle;
        };
        let pattern = self.engine.expand_macros(&puzzle.pattern, &self.book);

        let solved = SymbolPuzzle::matches(&pattern, symbols);
        self.finish_puzzle(
            solved,
            puzzle.success_page_id,
            puzzle.on_success,
            puzzle.on_failure,
        )
    }

    fn finish_puzzle(
        &mut self,
        solved: bool,
        success_page_id: String,
        on_success: String,
        on_failure: String,
    ) -> PuzzleOutcome {
        if !solved {
            debug!(page_id = %self.book.current_page_id, "谜题答案错误");
            self.run_script(&on_failure);
            return PuzzleOutcome::Failed;
        }

        info!(page_id = %self.book.current_page_id, "谜题解开");
        self.history
            .push(HistoryEvent::puzzle_solved(&self.book.current_page_id));
        let target = self.resolve_link(&success_page_id);
        let success_page_id = target.clone().unwrap_or_default();
        self.perform(Action {
            script: on_success,
            target,
        });
        PuzzleOutcome::Solved { success_page_id }
    }

    // ----- 物品 -----

    /// 拾取物品并运行获得钩子
    pub fn take_item(&mut self, id: &str) {
        if self.book.inventory.get_item(id).is_none() {
            debug!(item_id = id, "未知物品，忽略拾取");
            return;
        }
        let hook = self.book.inventory.take(id);
        self.history.push(HistoryEvent::item_taken(id));
        if let Some(hook) = hook {
            self.run_script(&hook);
        }
    }

    /// 把物品丢在当前页并运行失去钩子
    pub fn drop_item(&mut self, id: &str) {
        if self.book.inventory.get_item(id).is_none() {
            debug!(item_id = id, "未知物品，忽略丢弃");
            return;
        }
        let page_id = self.book.current_page_id.clone();
        if page_id.is_empty() {
            warn!(item_id = id, "没有当前页，物品丢在空位置");
        }
        let hook = self.book.inventory.drop_at(id, &page_id);
        self.history.push(HistoryEvent::item_dropped(id, &page_id));
        if let Some(hook) = hook {
            self.run_script(&hook);
        }
    }

    /// 使用物品：只运行使用钩子
    pub fn use_item(&mut self, id: &str) {
        if let Some(hook) = self.book.inventory.use_item(id) {
            self.run_script(&hook);
        }
    }

    /// 当前页的随机奖励，返回得到的物品 id
    pub fn take_random_reward(&mut self) -> Option<String> {
        let page_id = self.book.current_page_id.clone();
        let drop = self.book.inventory.take_random_unassigned(
            &page_id,
            &self.config.reward_flag_suffix,
            &mut self.book.state,
            &mut self.rng,
        )?;

        info!(item_id = %drop.item_id, page_id = %page_id, "获得随机奖励");
        self.history.push(HistoryEvent::item_taken(&drop.item_id));
        if let Some(hook) = &drop.hook {
            self.run_script(hook);
        }
        Some(drop.item_id)
    }

    /// 当前页是否已经发放过随机奖励
    pub fn reward_triggered(&self) -> bool {
        let key = format!(
            "{}{}",
            self.book.current_page_id, self.config.reward_flag_suffix
        );
        self.book.state.get_bool(&key)
    }
}
