//! # Executor 模块
//!
//! 页面切换与脚本执行。
//!
//! ## 页面切换流程
//!
//! 1. 展开宏，处理 `@last` / `@cover` 两个哨兵（页面上的链接随后补全章节）
//! 2. 解析页面，找不到就记录日志并返回错误，状态不变
//! 3. 更新当前页 / 上一页指针（离开临时页时不更新上一页）
//! 4. 固定新页面所在章节并回收可回收章节
//! 5. 用新票据发起资源加载，覆盖任何等待中的切换
//! 6. 资源就绪后完成加载：天气、提示、笔记、加载脚本、环境音、显示、朗读

use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::error::RuntimeError;
use crate::history::HistoryEvent;
use crate::resource::{LoadRequest, PendingTransition, ResourceEvent};
use crate::runtime::MangaRuntime;
use crate::script::{ScriptContext, ScriptRequest};

/// 回到上一页
pub const LAST_PAGE_SENTINEL: &str = "@last";
/// 回到封面
pub const COVER_SENTINEL: &str = "@cover";

impl MangaRuntime {
    /// 切换到指定页面
    pub fn display_page(&mut self, id: &str) -> Result<(), RuntimeError> {
        let (target, _) = self.expand_target(id);

        if target.is_empty() {
            warn!(requested = id, "目标页为空，取消切换");
            return Err(RuntimeError::PageNotFound { page_id: target });
        }
        let Some(page) = self.book.get_page(&target) else {
            warn!(page_id = %target, requested = id, "页面不存在，取消切换");
            return Err(RuntimeError::PageNotFound { page_id: target });
        };
        let page_id = page.full_id();
        let chapter_id = page.chapter_id.clone();
        let tags = page.tags.clone();

        let leaving_ephemeral = self.book.current_page().is_some_and(|p| p.ephemeral);
        if !self.book.current_page_id.is_empty() && !leaving_ephemeral {
            self.book.last_page_id = std::mem::take(&mut self.book.current_page_id);
        }
        self.book.current_page_id = page_id.clone();
        self.book.started_reading = true;
        self.read_captions = None;
        self.read_balloons = None;

        if !chapter_id.is_empty() {
            self.book.graph.pin(&chapter_id);
            self.book.graph.release_purgable_chapters();
        }
        self.history.push(HistoryEvent::page_visited(&page_id));
        info!(page_id = %page_id, "切换页面");

        let ticket = self.tickets.issue();
        if let Some(previous) = self.pending.replace(PendingTransition {
            ticket,
            page_id: page_id.clone(),
        }) {
            debug!(ticket = previous.ticket, page_id = %previous.page_id, "覆盖未完成的切换");
        }
        self.commands.push(Command::PageLoading {
            page_id: page_id.clone(),
            ticket,
            tags: tags.clone(),
        });

        // 释放和预取标签也要交给加载方，只有加载标签需要等待回报
        let wait = !tags.load.trim().is_empty();
        match self.loader.as_mut() {
            Some(loader) if !tags.is_empty() => loader.request(&LoadRequest {
                ticket,
                page_id,
                tags,
            }),
            None if wait => {
                error!(page_id = %page_id, tag = %tags.load, "没有注入资源加载器，直接完成加载");
                self.finish_loading(ticket);
                return Ok(());
            }
            _ => {}
        }
        if !wait {
            self.finish_loading(ticket);
        }
        Ok(())
    }

    /// 展开宏并替换哨兵，第二项表示目标是否来自哨兵
    fn expand_target(&self, id: &str) -> (String, bool) {
        let expanded = self.engine.expand_macros(id, &self.book);
        match expanded.trim() {
            LAST_PAGE_SENTINEL => (self.book.last_page_id.clone(), true),
            COVER_SENTINEL => (self.config.cover_page_id.clone(), true),
            other => (other.to_string(), false),
        }
    }

    /// 把当前页上的链接解析为目标页 id
    ///
    /// 宏和哨兵先处理，剩下的裸 id 才补全为当前页所在章节。
    /// 空链接返回 `None`；展开后为空时返回空串，交给 `display_page` 报错。
    pub(crate) fn resolve_link(&self, link: &str) -> Option<String> {
        let link = link.trim();
        if link.is_empty() {
            return None;
        }
        let (target, from_sentinel) = self.expand_target(link);
        if from_sentinel {
            return Some(target);
        }
        let qualified = match self.current_page() {
            Some(page) => page.qualify(&target).unwrap_or_default(),
            None => target,
        };
        Some(qualified)
    }

    /// 资源加载方的回报
    ///
    /// 只处理最新票据，过期回报直接丢弃。
    pub fn resource_event(&mut self, ticket: u64, event: ResourceEvent) {
        if self.pending_ticket() != Some(ticket) {
            debug!(ticket, "过期的资源回报，忽略");
            return;
        }

        match event {
            ResourceEvent::Started => debug!(ticket, "资源开始加载"),
            ResourceEvent::Succeeded => self.finish_loading(ticket),
            ResourceEvent::Failed(message) => {
                let Some(pending) = self.pending.take() else {
                    return;
                };
                error!(page_id = %pending.page_id, error = %message, "资源加载失败");
                self.commands.push(Command::ResourceLoadFailed {
                    page_id: pending.page_id,
                    message,
                });
            }
        }
    }

    /// 完成加载
    fn finish_loading(&mut self, ticket: u64) {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {}
            _ => return,
        }
        let Some(pending) = self.pending.take() else {
            return;
        };
        let Some(page) = self.book.get_page(&pending.page_id) else {
            warn!(page_id = %pending.page_id, "完成加载时页面已不存在");
            return;
        };
        let weather = page.weather;
        let hint = page.hint.clone();
        let entry = page.notebook_entry.clone();
        let on_load = page.on_load.clone();
        let sound = page.location_sound.clone();

        self.commands.push(Command::SetWeather { weather });
        if self.config.hint_chime && !hint.trim().is_empty() {
            let hint = self.engine.expand_macros(&hint, &self.book);
            self.commands.push(Command::HintAvailable { hint });
        }
        if !entry.is_empty() {
            self.discover_note(&entry);
        }

        self.run_script(&on_load);
        if self.book.current_page_id != pending.page_id || self.pending.is_some() {
            debug!(page_id = %pending.page_id, "加载脚本切换了页面，停止完成当前页");
            return;
        }

        match sound {
            Some(sound) if !sound.path.trim().is_empty() => {
                self.commands.push(Command::StartLocationSound {
                    path: sound.path,
                    volume: sound.volume,
                    looped: sound.looped,
                });
            }
            _ => self.commands.push(Command::StopLocationSound),
        }
        self.commands.push(Command::DisplayPage {
            page_id: pending.page_id,
        });
        self.narrate();
    }

    /// 下一页
    pub fn next_page(&mut self) -> Result<(), RuntimeError> {
        self.follow_link("下一", |page| page.next_page_id.as_str())
    }

    /// 上一页（作者定义的链接，不是阅读历史）
    pub fn previous_page(&mut self) -> Result<(), RuntimeError> {
        self.follow_link("上一", |page| page.previous_page_id.as_str())
    }

    fn follow_link(
        &mut self,
        direction: &'static str,
        link: impl Fn(&crate::model::Page) -> &str,
    ) -> Result<(), RuntimeError> {
        let page = self.current_page().ok_or(RuntimeError::NoCurrentPage)?;
        let page_id = page.full_id();
        let link = link(page).to_string();
        let target = self
            .resolve_link(&link)
            .ok_or(RuntimeError::NoLink { page_id, direction })?;
        self.display_page(&target)
    }

    /// 运行脚本并处理它排队的请求
    ///
    /// 脚本失败只记录日志。请求处理可能再次运行脚本，
    /// 嵌套超过 `max_script_depth` 时剩余请求被丢弃。
    pub(crate) fn run_script(&mut self, script: &str) {
        if script.trim().is_empty() {
            return;
        }
        if self.depth >= self.config.max_script_depth {
            let err = RuntimeError::ScriptDepthExceeded {
                limit: self.config.max_script_depth,
            };
            error!(error = %err, script = script, "脚本未执行");
            return;
        }

        let mut requests = Vec::new();
        {
            let mut ctx = ScriptContext::new(&mut self.book, &self.bindings, &mut requests);
            if let Err(e) = self.engine.run(script, &mut ctx) {
                warn!(error = %e, script = script, "脚本执行失败");
            }
        }

        self.depth += 1;
        for request in requests {
            self.process_request(request);
        }
        self.depth -= 1;
    }

    fn process_request(&mut self, request: ScriptRequest) {
        debug!(?request, "处理脚本请求");
        match request {
            ScriptRequest::DisplayPage(id) => {
                // 失败已在 display_page 中记录
                let _ = self.display_page(&id);
            }
            ScriptRequest::ShowLayer(key) => self.set_layer_key(&key),
            ScriptRequest::TakeItem(id) => self.take_item(&id),
            ScriptRequest::DropItem(id) => self.drop_item(&id),
            ScriptRequest::UseItem(id) => self.use_item(&id),
            ScriptRequest::DiscoverNote(id) => self.discover_note(&id),
        }
    }

    /// 发现笔记，首次发现时记入历史
    pub fn discover_note(&mut self, id: &str) {
        if self.book.notebook.discover(id) {
            info!(entry_id = id, "发现笔记");
            self.history.push(HistoryEvent::note_discovered(id));
        }
    }
}
