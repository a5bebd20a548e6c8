//! # Graph 模块
//!
//! 内容图：章节列表与三种页面来源。
//!
//! | 模式 | 行为 |
//! |------|------|
//! | 内存 | 所有章节在构造时加载，线性查找 |
//! | 外部 | 完全委托给 [`PageSource`]，图本身不保存章节 |
//! | 即时 | 章节未命中时先回收可回收章节，再由 [`ChapterBuilder`] 构建并缓存 |
//!
//! ## 寻址
//!
//! - `chapter|page`：只在指定章节里找，优先级最高
//! - `page`：按顺序扫描所有已加载章节，取第一个
//!
//! ## 固定章节
//!
//! 正在显示的章节由编排层通过 [`ContentGraph::pin`] 固定，
//! 回收时永远不会移除它，即使它被标记为可回收。

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec::Code;
use crate::model::{Chapter, Page, split_page_id};

/// 页面来源模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSourcing {
    #[default]
    InMemory,
    External,
    JustInTime,
}

impl Code for PageSourcing {
    fn code(&self) -> &'static str {
        match self {
            Self::InMemory => "memory",
            Self::External => "external",
            Self::JustInTime => "jit",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "memory" => Some(Self::InMemory),
            "external" => Some(Self::External),
            "jit" => Some(Self::JustInTime),
            _ => None,
        }
    }
}

/// 外部页面来源
pub trait PageSource {
    /// 取页面；`chapter_id` 为 `None` 表示裸 id
    fn page(&mut self, chapter_id: Option<&str>, page_id: &str) -> Option<Page>;

    /// 取整个章节
    fn chapter(&mut self, chapter_id: &str) -> Option<Chapter>;
}

/// 即时模式下的章节构建器
pub trait ChapterBuilder {
    fn build(&mut self, chapter_id: &str) -> Option<Chapter>;
}

impl<F> ChapterBuilder for F
where
    F: FnMut(&str) -> Option<Chapter>,
{
    fn build(&mut self, chapter_id: &str) -> Option<Chapter> {
        self(chapter_id)
    }
}

/// 页面在图中的位置
enum Slot {
    Loaded { chapter: usize, page: usize },
    Fetched(usize),
}

/// 内容图
#[derive(Default)]
pub struct ContentGraph {
    sourcing: PageSourcing,
    chapters: Vec<Chapter>,
    source: Option<Box<dyn PageSource>>,
    builder: Option<Box<dyn ChapterBuilder>>,
    pinned: Option<String>,
    /// 外部模式下最近取到的页面，随回收一起清理
    fetched: Vec<Page>,
}

impl fmt::Debug for ContentGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentGraph")
            .field("sourcing", &self.sourcing)
            .field("chapters", &self.chapter_ids())
            .field("pinned", &self.pinned)
            .field("has_source", &self.source.is_some())
            .field("has_builder", &self.builder.is_some())
            .finish()
    }
}

impl ContentGraph {
    /// 内存模式
    pub fn in_memory(chapters: Vec<Chapter>) -> Self {
        let mut graph = Self::default();
        for chapter in chapters {
            graph.insert_chapter(chapter);
        }
        graph
    }

    /// 外部模式
    pub fn external(source: impl PageSource + 'static) -> Self {
        Self {
            sourcing: PageSourcing::External,
            source: Some(Box::new(source)),
            ..Default::default()
        }
    }

    /// 即时模式
    pub fn just_in_time(builder: impl ChapterBuilder + 'static) -> Self {
        Self {
            sourcing: PageSourcing::JustInTime,
            builder: Some(Box::new(builder)),
            ..Default::default()
        }
    }

    pub fn sourcing(&self) -> PageSourcing {
        self.sourcing
    }

    /// 读档时恢复模式；回调需要宿主重新注入
    pub fn set_sourcing(&mut self, sourcing: PageSourcing) {
        self.sourcing = sourcing;
    }

    pub fn set_source(&mut self, source: impl PageSource + 'static) {
        self.source = Some(Box::new(source));
    }

    pub fn set_builder(&mut self, builder: impl ChapterBuilder + 'static) {
        self.builder = Some(Box::new(builder));
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter_ids(&self) -> Vec<&str> {
        self.chapters.iter().map(|c| c.id.as_str()).collect()
    }

    /// 替换全部已加载章节（读档用）
    pub fn replace_chapters(&mut self, chapters: Vec<Chapter>) {
        self.chapters.clear();
        self.fetched.clear();
        for chapter in chapters {
            self.insert_chapter(chapter);
        }
    }

    pub fn pinned(&self) -> Option<&str> {
        self.pinned.as_deref()
    }

    /// 固定章节，回收时保留
    pub fn pin(&mut self, chapter_id: &str) {
        self.pinned = Some(chapter_id.to_string());
    }

    pub fn unpin(&mut self) {
        self.pinned = None;
    }

    /// 查找或创建章节
    pub fn add_chapter(&mut self, id: &str) -> &mut Chapter {
        match self.chapters.iter().position(|c| c.id == id) {
            Some(index) => &mut self.chapters[index],
            None => {
                self.chapters.push(Chapter::new(id));
                let last = self.chapters.len() - 1;
                &mut self.chapters[last]
            }
        }
    }

    /// 插入章节，同 id 章节被替换
    pub fn insert_chapter(&mut self, mut chapter: Chapter) {
        for page in &mut chapter.pages {
            page.chapter_id = chapter.id.clone();
        }
        match self.chapters.iter_mut().find(|c| c.id == chapter.id) {
            Some(existing) => *existing = chapter,
            None => self.chapters.push(chapter),
        }
    }

    /// 查找或创建页面（章节不存在时一并创建）
    pub fn add_page(&mut self, chapter_id: &str, page_id: &str) -> &mut Page {
        self.add_chapter(chapter_id).add_page(page_id)
    }

    /// 插入页面，同 id 页面被替换
    pub fn insert_page(&mut self, chapter_id: &str, page: Page) {
        self.add_chapter(chapter_id).insert_page(page);
    }

    /// 只查已加载的章节，不触发构建
    pub fn loaded_chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn loaded_chapter_mut(&mut self, id: &str) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|c| c.id == id)
    }

    /// 回收所有可回收章节（固定章节除外），返回被回收的章节 id
    pub fn release_purgable_chapters(&mut self) -> Vec<String> {
        let pinned = self.pinned.clone();
        let is_pinned = |id: &str| pinned.as_deref() == Some(id);

        let mut released = Vec::new();
        self.chapters.retain(|chapter| {
            if chapter.purgable && !is_pinned(&chapter.id) {
                released.push(chapter.id.clone());
                false
            } else {
                true
            }
        });
        self.fetched.retain(|page| is_pinned(&page.chapter_id));

        if !released.is_empty() {
            info!(chapters = ?released, "回收可回收章节");
        }
        released
    }

    /// 取章节
    ///
    /// 即时模式下未命中会先回收，再构建并缓存。
    pub fn chapter(&mut self, id: &str) -> Option<Cow<'_, Chapter>> {
        if let Some(index) = self.ensure_chapter(id) {
            return Some(Cow::Borrowed(&self.chapters[index]));
        }
        if self.sourcing != PageSourcing::External {
            return None;
        }
        let Some(source) = self.source.as_mut() else {
            warn!(chapter_id = id, "外部模式没有注入页面来源");
            return None;
        };
        source.chapter(id).map(Cow::Owned)
    }

    /// 返回已加载（或刚构建）章节的下标
    fn ensure_chapter(&mut self, id: &str) -> Option<usize> {
        if let Some(index) = self.chapters.iter().position(|c| c.id == id) {
            return Some(index);
        }
        if self.sourcing != PageSourcing::JustInTime {
            return None;
        }

        self.release_purgable_chapters();
        let Some(builder) = self.builder.as_mut() else {
            warn!(chapter_id = id, "即时模式没有注入章节构建器");
            return None;
        };
        let Some(mut chapter) = builder.build(id) else {
            debug!(chapter_id = id, "章节构建器没有返回章节");
            return None;
        };
        info!(chapter_id = id, pages = chapter.pages.len(), "即时构建章节");

        chapter.id = id.to_string();
        self.insert_chapter(chapter);
        self.chapters.iter().position(|c| c.id == id)
    }

    fn locate(&mut self, id: &str) -> Option<Slot> {
        let id = id.trim();
        match split_page_id(id) {
            Some((chapter_id, page_id)) => {
                if let Some(chapter) = self.ensure_chapter(chapter_id) {
                    return self.chapters[chapter]
                        .pages
                        .iter()
                        .position(|p| p.id == page_id)
                        .map(|page| Slot::Loaded { chapter, page });
                }
                self.fetch(Some(chapter_id), page_id)
            }
            None => {
                for (chapter, c) in self.chapters.iter().enumerate() {
                    if let Some(page) = c.pages.iter().position(|p| p.id == id) {
                        return Some(Slot::Loaded { chapter, page });
                    }
                }
                self.fetch(None, id)
            }
        }
    }

    fn fetch(&mut self, chapter_id: Option<&str>, page_id: &str) -> Option<Slot> {
        if self.sourcing != PageSourcing::External {
            return None;
        }
        let matches = |p: &Page| {
            p.id == page_id && chapter_id.is_none_or(|c| p.chapter_id == c)
        };
        if let Some(index) = self.fetched.iter().position(matches) {
            return Some(Slot::Fetched(index));
        }

        let Some(source) = self.source.as_mut() else {
            warn!(page_id = page_id, "外部模式没有注入页面来源");
            return None;
        };
        let mut page = source.page(chapter_id, page_id)?;
        if let Some(chapter_id) = chapter_id {
            page.chapter_id = chapter_id.to_string();
        }
        self.fetched.push(page);
        Some(Slot::Fetched(self.fetched.len() - 1))
    }

    /// 解析页 id 并取页面
    pub fn page(&mut self, id: &str) -> Option<&Page> {
        match self.locate(id)? {
            Slot::Loaded { chapter, page } => Some(&self.chapters[chapter].pages[page]),
            Slot::Fetched(index) => Some(&self.fetched[index]),
        }
    }

    pub fn page_mut(&mut self, id: &str) -> Option<&mut Page> {
        match self.locate(id)? {
            Slot::Loaded { chapter, page } => Some(&mut self.chapters[chapter].pages[page]),
            Slot::Fetched(index) => Some(&mut self.fetched[index]),
        }
    }

    /// 只读查找：不构建、不访问外部来源
    pub fn peek_page(&self, id: &str) -> Option<&Page> {
        let id = id.trim();
        let in_chapters = match split_page_id(id) {
            Some((chapter_id, page_id)) => self
                .loaded_chapter(chapter_id)
                .and_then(|c| c.page(page_id)),
            None => self.chapters.iter().find_map(|c| c.page(id)),
        };
        in_chapters.or_else(|| {
            self.fetched.iter().find(|p| match split_page_id(id) {
                Some((chapter_id, page_id)) => p.chapter_id == chapter_id && p.id == page_id,
                None => p.id == id,
            })
        })
    }

    /// 所有已加载页面（按章节顺序）
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.chapters.iter().flat_map(|c| c.pages.iter())
    }
}
