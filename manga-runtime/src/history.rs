//! # History 模块
//!
//! 阅读历史，用于回看和统计。
//!
//! ## 设计原则
//!
//! - 只记录玩家可感知的关键事件（翻页、拾取、解谜、发现笔记）
//! - 所有数据可序列化
//! - 有上限，超出时丢弃最早的事件

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// 历史事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryEvent {
    /// 打开页面
    PageVisited {
        /// 完整页 id（`chapter|page`）
        page_id: String,
        /// 时间戳（Unix 秒）
        timestamp: u64,
    },

    /// 拾取物品
    ItemTaken { item_id: String, timestamp: u64 },

    /// 丢弃物品
    ItemDropped {
        item_id: String,
        page_id: String,
        timestamp: u64,
    },

    /// 解开谜题
    PuzzleSolved { page_id: String, timestamp: u64 },

    /// 第一次发现笔记
    NoteDiscovered { entry_id: String, timestamp: u64 },
}

impl HistoryEvent {
    /// 获取事件时间戳
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::PageVisited { timestamp, .. }
            | Self::ItemTaken { timestamp, .. }
            | Self::ItemDropped { timestamp, .. }
            | Self::PuzzleSolved { timestamp, .. }
            | Self::NoteDiscovered { timestamp, .. } => *timestamp,
        }
    }

    pub fn page_visited(page_id: impl Into<String>) -> Self {
        Self::PageVisited {
            page_id: page_id.into(),
            timestamp: current_timestamp(),
        }
    }

    pub fn item_taken(item_id: impl Into<String>) -> Self {
        Self::ItemTaken {
            item_id: item_id.into(),
            timestamp: current_timestamp(),
        }
    }

    pub fn item_dropped(item_id: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self::ItemDropped {
            item_id: item_id.into(),
            page_id: page_id.into(),
            timestamp: current_timestamp(),
        }
    }

    pub fn puzzle_solved(page_id: impl Into<String>) -> Self {
        Self::PuzzleSolved {
            page_id: page_id.into(),
            timestamp: current_timestamp(),
        }
    }

    pub fn note_discovered(entry_id: impl Into<String>) -> Self {
        Self::NoteDiscovered {
            entry_id: entry_id.into(),
            timestamp: current_timestamp(),
        }
    }
}

/// 历史记录容器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    events: VecDeque<HistoryEvent>,
    max_events: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            max_events: 500,
        }
    }

    /// 设置最大记录数
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max.max(1);
        self
    }

    /// 添加事件，超过上限时移除最早的
    pub fn push(&mut self, event: HistoryEvent) {
        self.events.push_back(event);
        while self.events.len() > self.max_events {
            self.events.pop_front();
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &HistoryEvent> {
        self.events.iter()
    }

    /// 最近访问的 N 个页面（按时间顺序）
    pub fn recent_pages(&self, count: usize) -> Vec<&str> {
        let mut pages: Vec<&str> = self
            .events
            .iter()
            .rev()
            .filter_map(|e| match e {
                HistoryEvent::PageVisited { page_id, .. } => Some(page_id.as_str()),
                _ => None,
            })
            .take(count)
            .collect();
        pages.reverse();
        pages
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// 获取当前时间戳（Unix 秒）
fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_basic() {
        let mut history = History::new();
        assert!(history.is_empty());

        history.push(HistoryEvent::page_visited("intro|p1"));
        history.push(HistoryEvent::item_taken("lamp"));
        history.push(HistoryEvent::page_visited("intro|p2"));

        assert_eq!(history.len(), 3);
        assert_eq!(history.recent_pages(5), vec!["intro|p1", "intro|p2"]);
        assert_eq!(history.recent_pages(1), vec!["intro|p2"]);
    }

    #[test]
    fn test_history_max_events() {
        let mut history = History::new().with_max_events(5);
        for i in 0..10 {
            history.push(HistoryEvent::page_visited(format!("p{i}")));
        }

        assert_eq!(history.len(), 5);
        assert_eq!(history.recent_pages(1), vec!["p9"]);
        assert!(matches!(
            history.events().next(),
            Some(HistoryEvent::PageVisited { page_id, .. }) if page_id == "p5"
        ));
    }

    #[test]
    fn test_history_serialization() {
        let mut history = History::new();
        history.push(HistoryEvent::item_dropped("lamp", "attic|p1"));
        history.push(HistoryEvent::note_discovered("clue"));

        let json = serde_json::to_string(&history).unwrap();
        let loaded: History = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.events().next(), history.events().next());
    }
}
