//! # Engine 模块
//!
//! 书级编排器 [`MangaRuntime`] 的状态与对外查询。
//!
//! ## 驱动模型
//!
//! ```text
//! 宿主输入 (display_page / set_orientation / trigger_* / resource_event)
//!     -> 修改 Book，运行脚本，处理脚本排队的请求
//!     -> 产生 Command，宿主通过 drain_commands 取走
//! ```
//!
//! 运行时是单线程的唯一所有者，异步回调（资源加载）必须回到同一线程后
//! 再调用 [`MangaRuntime::resource_event`]。

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::book::Book;
use crate::command::Command;
use crate::config::RuntimeConfig;
use crate::history::History;
use crate::model::{
    ActionMenu, Balloon, Caption, ConditionEvaluator, Conversation, DetailImage, Interaction,
    NavigationPoint, Page, Placement, ViewContext, Visibility, WordArt, first_interaction,
    first_navigation_point,
};
use crate::resource::{PendingTransition, ResourceLoader, TicketCounter};
use crate::save::SaveError;
use crate::script::{BookConditions, NullScriptEngine, ScriptBindings, ScriptEngine};

/// 当前页四类叠加元素的布局串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layouts {
    pub captions: String,
    pub balloons: String,
    pub word_art: String,
    pub detail_images: String,
}

/// 书级编排器
///
/// # 使用示例
///
/// ```ignore
/// let mut runtime = MangaRuntime::new(book)
///     .with_engine(my_engine)
///     .with_loader(my_loader);
///
/// runtime.display_page("intro|p1")?;
/// for command in runtime.drain_commands() {
///     // 宿主执行 command...
/// }
/// ```
pub struct MangaRuntime {
    pub(crate) book: Book,
    pub(crate) engine: Box<dyn ScriptEngine>,
    pub(crate) loader: Option<Box<dyn ResourceLoader>>,
    pub(crate) bindings: ScriptBindings,
    pub(crate) commands: Vec<Command>,
    pub(crate) history: History,
    pub(crate) config: RuntimeConfig,
    pub(crate) view: ViewContext,
    pub(crate) tickets: TicketCounter,
    pub(crate) pending: Option<PendingTransition>,
    /// 上次朗读时的说明框 / 气泡布局，`None` 表示本页尚未朗读
    pub(crate) read_captions: Option<String>,
    pub(crate) read_balloons: Option<String>,
    pub(crate) rng: StdRng,
    /// 脚本请求的当前嵌套层数
    pub(crate) depth: usize,
}

impl MangaRuntime {
    /// 使用默认配置、空脚本引擎、无资源加载方创建运行时
    pub fn new(book: Book) -> Self {
        let config = RuntimeConfig::default();
        Self {
            book,
            engine: Box::new(NullScriptEngine),
            loader: None,
            bindings: ScriptBindings::standard(),
            commands: Vec::new(),
            history: History::new().with_max_events(config.history_limit),
            config,
            view: ViewContext::default(),
            tickets: TicketCounter::default(),
            pending: None,
            read_captions: None,
            read_balloons: None,
            rng: StdRng::from_entropy(),
            depth: 0,
        }
    }

    pub fn with_engine(mut self, engine: impl ScriptEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    pub fn with_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.history = History::new().with_max_events(config.history_limit);
        self.config = config;
        self
    }

    /// 固定随机奖励的种子
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn set_engine(&mut self, engine: impl ScriptEngine + 'static) {
        self.engine = Box::new(engine);
    }

    pub fn set_loader(&mut self, loader: impl ResourceLoader + 'static) {
        self.loader = Some(Box::new(loader));
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut Book {
        &mut self.book
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn view(&self) -> &ViewContext {
        &self.view
    }

    /// 宿主可以在这里注册额外的绑定
    pub fn bindings_mut(&mut self) -> &mut ScriptBindings {
        &mut self.bindings
    }

    /// 等待资源回报的票据
    pub fn pending_ticket(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.ticket)
    }

    /// 取走积压的指令
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.book.current_page()
    }

    pub(crate) fn conditions(&self) -> BookConditions<'_> {
        BookConditions::new(self.engine.as_ref(), &self.book)
    }

    /// 对条件求值，空条件为真
    pub fn check_condition(&self, condition: &str) -> bool {
        self.conditions().check(condition)
    }

    // ----- 持久化 -----

    /// 按 `Book::serialize_state_only` 保存
    pub fn save(&self) -> String {
        self.book.save()
    }

    /// 只保存动态状态
    pub fn save_state_only(&self) -> String {
        self.book.snapshot(true).encode()
    }

    /// 读档
    ///
    /// 进行中的页面切换被取消，朗读记录清空。只有主版本不兼容时返回错误，
    /// 此时书保持不变。
    pub fn load(&mut self, blob: &str) -> Result<(), SaveError> {
        self.book.load(blob)?;
        self.pending = None;
        self.read_captions = None;
        self.read_balloons = None;
        Ok(())
    }

    // ----- 查询 -----

    /// 以配置的 `orientation_tolerance` 为半宽构造朝向可见性
    pub fn orientation_visibility(&self, pitch: f64, yaw: f64) -> Visibility {
        Visibility::orientation(pitch, yaw, self.config.orientation_tolerance)
    }

    pub fn visible_captions(&self) -> Vec<(Placement, &Caption)> {
        let eval = self.conditions();
        self.current_page()
            .map(|page| page.captions.visible(&self.view, &eval))
            .unwrap_or_default()
    }

    pub fn visible_balloons(&self) -> Vec<(Placement, &Balloon)> {
        let eval = self.conditions();
        self.current_page()
            .map(|page| page.balloons.visible(&self.view, &eval))
            .unwrap_or_default()
    }

    pub fn visible_word_art(&self) -> Vec<(Placement, &WordArt)> {
        let eval = self.conditions();
        self.current_page()
            .map(|page| page.word_art.visible(&self.view, &eval))
            .unwrap_or_default()
    }

    pub fn visible_detail_images(&self) -> Vec<(Placement, &DetailImage)> {
        let eval = self.conditions();
        self.current_page()
            .map(|page| page.detail_images.visible(&self.view, &eval))
            .unwrap_or_default()
    }

    /// 当前页的布局串；没有当前页时全部为空串
    pub fn layouts(&self) -> Layouts {
        let Some(page) = self.current_page() else {
            return Layouts::default();
        };
        let eval = self.conditions();
        Layouts {
            captions: page.captions.layout(&self.view, &eval),
            balloons: page.balloons.layout(&self.view, &eval),
            word_art: page.word_art.layout(&self.view, &eval),
            detail_images: page.detail_images.layout(&self.view, &eval),
        }
    }

    /// 当前视角下命中的导航点
    pub fn navigation_point(&self) -> Option<&NavigationPoint> {
        let page = self.current_page()?;
        first_navigation_point(&page.navigation_points, &self.view, &self.conditions())
    }

    /// 当前视角下命中的交互点
    pub fn interaction(&self) -> Option<&Interaction> {
        let page = self.current_page()?;
        first_interaction(&page.interactions, &self.view, &self.conditions())
    }

    pub fn action_menu(&self) -> Option<&ActionMenu> {
        self.current_page()?.action_menu.as_ref()
    }

    /// 行动菜单中当前可用的选项：(原始下标, 展开后的文本)
    pub fn available_menu_options(&self) -> Vec<(usize, String)> {
        let Some(menu) = self.action_menu() else {
            return Vec::new();
        };
        menu.available(&self.conditions())
            .into_iter()
            .map(|(index, option)| (index, self.engine.expand_macros(&option.label, &self.book)))
            .collect()
    }

    /// 当前可进行的对话
    ///
    /// 页面有 NPC 时，NPC 的条件和对话自身的条件都要成立。
    pub fn current_conversation(&self) -> Option<&Conversation> {
        let page = self.current_page()?;
        let conversation = page.active()?;
        let eval = self.conditions();
        let npc_present = page
            .npc
            .as_ref()
            .is_none_or(|npc| eval.check(&npc.condition));
        (npc_present && eval.check(&conversation.condition)).then_some(conversation)
    }

    /// 当前对话中可用的选项：(原始下标, 展开后的文本)
    pub fn available_conversation_options(&self) -> Vec<(usize, String)> {
        let Some(conversation) = self.current_conversation() else {
            return Vec::new();
        };
        conversation
            .available(&self.conditions())
            .into_iter()
            .map(|(index, option)| (index, self.engine.expand_macros(&option.text, &self.book)))
            .collect()
    }
}

impl std::fmt::Debug for MangaRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MangaRuntime")
            .field("current_page_id", &self.book.current_page_id)
            .field("pending", &self.pending)
            .field("view", &self.view)
            .field("commands", &self.commands.len())
            .field("has_loader", &self.loader.is_some())
            .finish_non_exhaustive()
    }
}
