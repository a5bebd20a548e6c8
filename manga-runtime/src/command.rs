//! # Command 模块
//!
//! 运行时向宿主发出的通知。宿主通过
//! [`MangaRuntime::drain_commands`](crate::MangaRuntime::drain_commands) 取走。
//!
//! ## 设计原则
//!
//! - **声明式**：Command 描述"发生了什么 / 要做什么"，不描述"怎么做"
//! - **无返回值**：都是一次性通知，宿主不需要回应
//! - **引擎无关**：只包含 id、路径和基础数值

use serde::{Deserialize, Serialize};

use crate::model::{ResourceTags, Weather};

/// 运行时指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// 开始切换页面，资源正在准备
    PageLoading {
        page_id: String,
        ticket: u64,
        tags: ResourceTags,
    },

    /// 页面已就绪，可以显示
    DisplayPage { page_id: String },

    /// 资源加载失败，页面不会显示
    ResourceLoadFailed { page_id: String, message: String },

    /// 页面有提示
    HintAvailable { hint: String },

    /// 朗读文本
    ReadAloud { lines: Vec<String> },

    /// 播放环境音
    StartLocationSound {
        path: String,
        volume: f32,
        looped: bool,
    },

    /// 停止环境音
    StopLocationSound,

    /// 播放一次性音效
    PlaySound { path: String },

    /// 切换天气效果
    SetWeather { weather: Weather },

    /// 相机朝向变化
    ViewChanged { pitch: f64, yaw: f64 },

    /// 图层可见性键变化
    LayerVisibilityChanged { key: String },

    /// 打开行动菜单
    ShowActionMenu {
        title: String,
        /// (原始下标, 文本)
        options: Vec<(usize, String)>,
    },
}
