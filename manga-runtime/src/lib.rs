//! # Manga Runtime
//!
//! 交互式漫画 / 视觉小说的内容引擎核心库。
//!
//! ## 架构概述
//!
//! `manga-runtime` 是纯逻辑核心，除了读取配置文件外不做任何 IO。
//! 渲染、音频、脚本解释和资源下载都是外部协作方：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │── display_page / trigger_* ──────►│
//!   │── resource_event(ticket, ..) ────►│  ScriptEngine  (条件 / 脚本 / 宏)
//!   │◄─────────── drain_commands() ─────│  ResourceLoader (资源标签)
//!   │                                   │
//! ```
//!
//! ## 核心类型
//!
//! - [`MangaRuntime`]：书级编排器
//! - [`Book`]：根聚合（状态、物品栏、笔记本、内容图）
//! - [`ContentGraph`]：章节与页面，支持内存 / 外部 / 即时三种来源
//! - [`Command`]：运行时向宿主发出的通知
//! - [`codec`]：存档使用的分隔符文本格式
//!
//! ## 使用示例
//!
//! ```ignore
//! use manga_runtime::{Book, MangaRuntime, ResourceEvent};
//!
//! let mut runtime = MangaRuntime::new(Book::in_memory(chapters))
//!     .with_engine(engine)
//!     .with_loader(loader);
//!
//! runtime.display_page("intro|p1")?;
//! // 资源加载完成后
//! runtime.resource_event(ticket, ResourceEvent::Succeeded);
//! for command in runtime.drain_commands() {
//!     host.execute(command);
//! }
//!
//! let blob = runtime.save();
//! ```
//!
//! ## 模块结构
//!
//! - [`codec`]：存档编解码
//! - [`model`]：章节、页面及页面元素
//! - [`state`] / [`inventory`] / [`notebook`]：动态状态
//! - [`graph`] / [`book`]：内容图与根聚合
//! - [`script`]：脚本引擎边界与绑定表
//! - [`runtime`]：编排器
//! - [`diagnostic`]：静态检查

pub mod book;
pub mod codec;
pub mod command;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod graph;
pub mod history;
pub mod inventory;
pub mod model;
pub mod notebook;
pub mod resource;
pub mod runtime;
pub mod save;
pub mod script;
pub mod state;

// 重导出核心类型
pub use book::Book;
pub use codec::{Code, Record, decode, encode};
pub use command::Command;
pub use config::{ConfigError, RuntimeConfig};
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, ResourceReference, ResourceType, analyze_book,
    extract_resource_references,
};
pub use error::{MangaError, MangaResult, RuntimeError};
pub use graph::{ChapterBuilder, ContentGraph, PageSource, PageSourcing};
pub use history::{History, HistoryEvent};
pub use inventory::{Inventory, InventoryItem, ItemState, ItemStatus, RewardDrop};
pub use model::*;
pub use notebook::{Notebook, NotebookEntry};
pub use resource::{LoadRequest, ResourceEvent, ResourceLoader};
pub use runtime::{COVER_SENTINEL, LAST_PAGE_SENTINEL, Layouts, MangaRuntime};
pub use save::{SaveBlob, SaveError, SaveVersion, SavedItems};
pub use script::{
    ArgType, BindingError, BindingScope, BookConditions, NullScriptEngine, ScriptBindings,
    ScriptContext, ScriptEngine, ScriptError, ScriptRequest,
};
pub use state::{ScriptValue, StateStore};
