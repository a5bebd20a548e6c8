//! # Runtime 模块
//!
//! 书级编排器，负责页面切换、脚本调度与交互。
//!
//! ## 模块结构
//!
//! - [`engine`]：运行时状态、构造与查询
//! - [`executor`]：页面切换、资源回报与脚本请求
//! - [`interaction`]：导航、菜单、对话、谜题与物品操作
//! - `narration`：视角变化与朗读

pub mod engine;
pub mod executor;
pub mod interaction;
mod narration;

pub use engine::{Layouts, MangaRuntime};
pub use executor::{COVER_SENTINEL, LAST_PAGE_SENTINEL};
