//! # Resource 模块
//!
//! 与资源加载方的边界。
//!
//! 运行时在切换页面时发出一个 [`LoadRequest`]，加载方完成后通过
//! [`MangaRuntime::resource_event`](crate::MangaRuntime::resource_event)
//! 回报结果。每个请求带一个递增的票据，只有最新票据的回报会被处理，
//! 旧请求的迟到回调直接丢弃。

use serde::{Deserialize, Serialize};

use crate::model::ResourceTags;

/// 加载请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub ticket: u64,
    /// 目标页完整 id
    pub page_id: String,
    pub tags: ResourceTags,
}

/// 加载方回报的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceEvent {
    /// 开始下载（仅用于日志）
    Started,
    Succeeded,
    Failed(String),
}

/// 资源加载方
pub trait ResourceLoader {
    /// 发起加载；结果稍后通过 `resource_event` 回报
    fn request(&mut self, request: &LoadRequest);
}

/// 等待中的页面切换
///
/// 单槽位：新的切换直接覆盖旧的。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingTransition {
    pub ticket: u64,
    pub page_id: String,
}

/// 票据发放器
#[derive(Debug, Default)]
pub(crate) struct TicketCounter {
    next: u64,
}

impl TicketCounter {
    pub fn issue(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_are_monotonic() {
        let mut counter = TicketCounter::default();
        let a = counter.issue();
        let b = counter.issue();
        assert!(b > a);
        assert_ne!(a, 0);
    }
}
