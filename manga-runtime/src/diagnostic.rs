//! # 诊断模块
//!
//! 对整本书做静态检查，不依赖 IO。
//!
//! ## 设计原则
//!
//! - 纯函数 API，只读访问 [`Book`]，不触发即时构建或外部请求
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 以 `@` 开头或含 `{{` 的链接需要脚本引擎展开，这里跳过

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::book::Book;
use crate::graph::PageSourcing;
use crate::inventory::ItemStatus;
use crate::model::{Page, split_page_id};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// 出问题的位置：页面完整 id、章节 id、物品 id 或 `book`
    pub location: String,
    pub message: String,
    pub detail: Option<String>,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            location: location.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, location, message)
    }

    /// 创建警告诊断
    pub fn warn(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, location, message)
    }

    /// 创建信息诊断
    pub fn info(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, location, message)
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.location, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {detail}")?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

/// 资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    PageImage,
    PanelImage,
    DetailImage,
    NpcImage,
    ItemImage,
    Sound,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageImage => write!(f, "页面图"),
            Self::PanelImage => write!(f, "分格图"),
            Self::DetailImage => write!(f, "细节图"),
            Self::NpcImage => write!(f, "NPC"),
            Self::ItemImage => write!(f, "物品图"),
            Self::Sound => write!(f, "音频"),
        }
    }
}

/// 资源引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReference {
    pub resource_type: ResourceType,
    pub path: String,
    /// 引用方（页面完整 id 或物品 id）
    pub owner: String,
}

fn needs_expansion(link: &str) -> bool {
    link.starts_with('@') || link.contains("{{")
}

/// 检查页面链接
fn check_links(book: &Book, page: &Page, result: &mut DiagnosticResult) {
    let location = page.full_id();
    for link in page.links() {
        if needs_expansion(link) {
            continue;
        }
        let Some(target) = page.qualify(link) else {
            continue;
        };
        if book.peek_page(&target).is_some() {
            continue;
        }

        // 目标章节尚未加载时无法判断
        let chapter_loaded = split_page_id(&target)
            .is_none_or(|(chapter, _)| book.graph.loaded_chapter(chapter).is_some());
        if !chapter_loaded && book.sourcing() != PageSourcing::InMemory {
            result.push(
                Diagnostic::info(&location, format!("链接目标 '{target}' 所在章节未加载，跳过检查")),
            );
        } else {
            result.push(
                Diagnostic::error(&location, format!("链接目标 '{target}' 不存在"))
                    .with_detail(link.to_string()),
            );
        }
    }
}

/// 对整本书做静态检查
pub fn analyze_book(book: &Book) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    let mut chapter_ids = HashSet::new();
    for chapter in book.graph.chapters() {
        if !chapter_ids.insert(chapter.id.as_str()) {
            result.push(Diagnostic::error(&chapter.id, "章节 id 重复"));
        }

        let mut page_ids = HashSet::new();
        for page in &chapter.pages {
            if !page_ids.insert(page.id.as_str()) {
                result.push(Diagnostic::error(page.full_id(), "页面 id 在章节内重复"));
            }
            check_links(book, page, &mut result);
        }
    }

    let mut item_ids = HashSet::new();
    for item in book.inventory.items() {
        if !item_ids.insert(item.id.as_str()) {
            result.push(Diagnostic::error(&item.id, "物品 id 重复"));
        }
        let placed = matches!(item.status, ItemStatus::Hidden | ItemStatus::Dropped);
        if placed && book.peek_page(&item.page_id).is_none() {
            result.push(Diagnostic::warn(
                &item.id,
                format!("物品所在页 '{}' 无法解析", item.page_id),
            ));
        }
    }

    for (name, id) in [
        ("当前页", &book.current_page_id),
        ("上一页", &book.last_page_id),
    ] {
        if !id.is_empty() && book.peek_page(id).is_none() {
            result.push(Diagnostic::warn("book", format!("{name} '{id}' 无法解析")));
        }
    }

    if book.graph.chapters().is_empty() && book.sourcing() == PageSourcing::InMemory {
        result.push(Diagnostic::info("book", "书中没有任何章节"));
    }

    result
}

/// 提取所有资源引用
pub fn extract_resource_references(book: &Book) -> Vec<ResourceReference> {
    let mut refs = Vec::new();
    let mut push = |resource_type, path: &str, owner: &str| {
        if !path.trim().is_empty() {
            refs.push(ResourceReference {
                resource_type,
                path: path.to_string(),
                owner: owner.to_string(),
            });
        }
    };

    for page in book.graph.pages() {
        let owner = page.full_id();
        push(ResourceType::PageImage, &page.image, &owner);
        for (_, panel) in page.panels.iter() {
            push(ResourceType::PanelImage, &panel.image, &owner);
        }
        for (_, detail) in page.detail_images.iter() {
            push(ResourceType::DetailImage, &detail.image, &owner);
        }
        for (_, art) in page.word_art.iter() {
            push(ResourceType::Sound, &art.sound, &owner);
        }
        for interaction in &page.interactions {
            push(ResourceType::Sound, &interaction.sound, &owner);
        }
        if let Some(sound) = &page.location_sound {
            push(ResourceType::Sound, &sound.path, &owner);
        }
        if let Some(npc) = &page.npc {
            push(ResourceType::NpcImage, &npc.image, &owner);
        }
    }
    for item in book.inventory.items() {
        push(ResourceType::ItemImage, &item.image, &item.id);
    }

    refs
}
