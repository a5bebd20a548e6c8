//! # Book
//!
//! 根聚合：阅读进度、游戏状态、笔记本、物品栏和内容图。
//!
//! 每个运行时只有一本书，由 [`MangaRuntime`](crate::MangaRuntime) 持有，
//! 需要的地方显式传入，没有全局单例。

use tracing::{info, warn};

use crate::graph::{ContentGraph, PageSourcing};
use crate::inventory::Inventory;
use crate::model::{Chapter, Page};
use crate::notebook::Notebook;
use crate::save::{SaveBlob, SaveError, SaveVersion, SavedItems};
use crate::state::StateStore;

/// 书
#[derive(Debug, Default)]
pub struct Book {
    pub started_reading: bool,
    pub current_page_id: String,
    pub last_page_id: String,
    pub state: StateStore,
    pub notebook: Notebook,
    pub inventory: Inventory,
    pub graph: ContentGraph,
    /// `save()` 时是否只写动态状态
    pub serialize_state_only: bool,
}

impl Book {
    pub fn new(graph: ContentGraph) -> Self {
        Self {
            graph,
            ..Default::default()
        }
    }

    /// 内存模式的书
    pub fn in_memory(chapters: Vec<Chapter>) -> Self {
        Self::new(ContentGraph::in_memory(chapters))
    }

    pub fn sourcing(&self) -> PageSourcing {
        self.graph.sourcing()
    }

    /// 解析页 id 取页面（可能触发即时构建或外部请求）
    pub fn get_page(&mut self, id: &str) -> Option<&Page> {
        self.graph.page(id)
    }

    pub fn get_page_mut(&mut self, id: &str) -> Option<&mut Page> {
        self.graph.page_mut(id)
    }

    /// 只读查找
    pub fn peek_page(&self, id: &str) -> Option<&Page> {
        self.graph.peek_page(id)
    }

    /// 当前页（只读查找）
    pub fn current_page(&self) -> Option<&Page> {
        if self.current_page_id.is_empty() {
            return None;
        }
        self.graph.peek_page(&self.current_page_id)
    }

    /// 生成存档快照
    pub fn snapshot(&self, state_only: bool) -> SaveBlob {
        let items = if state_only {
            SavedItems::StateOnly(self.inventory.encode_state_only())
        } else {
            SavedItems::Full(self.inventory.items().to_vec())
        };
        SaveBlob {
            version: SaveVersion::current(),
            state_only,
            sourcing: self.graph.sourcing(),
            started_reading: self.started_reading,
            current_page_id: self.current_page_id.clone(),
            last_page_id: self.last_page_id.clone(),
            state: self.state.clone(),
            notebook: self.notebook.clone(),
            items,
            chapters: if state_only {
                Vec::new()
            } else {
                self.graph.chapters().to_vec()
            },
        }
    }

    /// 按 `serialize_state_only` 编码
    pub fn save(&self) -> String {
        self.snapshot(self.serialize_state_only).encode()
    }

    /// 应用存档
    ///
    /// 完整存档替换一切（来源回调保留）；轻量存档只覆盖动态状态，
    /// 物品按 id 合并，章节保持不变。两种情况都会重新固定当前页所在章节。
    pub fn restore(&mut self, blob: SaveBlob) {
        self.started_reading = blob.started_reading;
        self.current_page_id = blob.current_page_id;
        self.last_page_id = blob.last_page_id;
        self.state = blob.state;
        self.notebook = blob.notebook;

        match blob.items {
            SavedItems::Full(items) => self.inventory = Inventory::from_items(items),
            SavedItems::StateOnly(states) => self.inventory.merge_state_only(&states),
        }

        if blob.state_only {
            info!(current = %self.current_page_id, "合并轻量存档");
        } else {
            self.graph.set_sourcing(blob.sourcing);
            self.graph.replace_chapters(blob.chapters);
            info!(
                current = %self.current_page_id,
                chapters = self.graph.chapters().len(),
                "读取完整存档"
            );
        }

        // 旧的固定章节可能已不是当前章节
        let chapter_id = self
            .current_page()
            .map(|p| p.chapter_id.clone())
            .unwrap_or_default();
        if !chapter_id.is_empty() {
            self.graph.pin(&chapter_id);
        }
    }

    /// 解码并应用存档
    pub fn load(&mut self, blob: &str) -> Result<(), SaveError> {
        let blob = SaveBlob::parse(blob).inspect_err(|e| {
            warn!(error = %e, "存档无法读取");
        })?;
        self.restore(blob);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{InventoryItem, ItemStatus};
    use crate::model::{Caption, Placement, Visibility};

    fn sample_book() -> Book {
        let mut intro = Chapter::new("intro").purgable(true);
        let mut p1 = Page::new("p1");
        p1.next_page_id = "mid|p2".to_string();
        p1.captions
            .insert(Placement::TopLeft, Caption::new("很久以前", Visibility::always()));
        intro.insert_page(p1);

        let mut book = Book::in_memory(vec![intro, Chapter::new("mid").with_page(Page::new("p2"))]);
        book.started_reading = true;
        book.current_page_id = "intro|p1".to_string();
        book.state.set_int("visits", 2);
        book.notebook.discover("first");
        book.inventory = Inventory::from_items(vec![
            InventoryItem {
                id: "lamp".to_string(),
                title: "油灯".to_string(),
                on_use: "light()".to_string(),
                ..Default::default()
            }
            .with_quantity(1),
        ]);
        book
    }

    #[test]
    fn test_full_save_round_trip() {
        let book = sample_book();
        let mut restored = Book::default();
        restored.load(&book.save()).unwrap();

        assert_eq!(restored.graph.chapters(), book.graph.chapters());
        assert_eq!(restored.inventory, book.inventory);
        assert_eq!(restored.state, book.state);
        assert_eq!(restored.notebook, book.notebook);
        assert_eq!(restored.current_page_id, "intro|p1");
        assert!(restored.started_reading);
        assert_eq!(
            restored.current_page().map(|p| p.next_page_id.as_str()),
            Some("mid|p2")
        );
    }

    #[test]
    fn test_state_only_merge_keeps_static_content() {
        let mut book = sample_book();
        book.inventory.take("lamp");
        book.state.set_bool("door.open", true);
        book.current_page_id = "mid|p2".to_string();
        book.serialize_state_only = true;
        let blob = book.save();

        let mut fresh = sample_book();
        fresh.load(&blob).unwrap();

        let lamp = fresh.inventory.get_item("lamp").unwrap();
        assert_eq!(lamp.status, ItemStatus::Carried);
        assert_eq!(lamp.title, "油灯");
        assert_eq!(lamp.on_use, "light()");
        assert!(fresh.state.get_bool("door.open"));
        assert_eq!(fresh.current_page_id, "mid|p2");
        assert_eq!(fresh.graph.chapter_ids(), vec!["intro", "mid"]);
    }

    #[test]
    fn test_restore_pins_current_chapter() {
        let blob = sample_book().save();

        let mut restored = Book::default();
        restored.load(&blob).unwrap();
        assert_eq!(restored.graph.pinned(), Some("intro"));

        let mut stale = sample_book();
        stale.graph.pin("mid");
        stale.load(&blob).unwrap();
        assert_eq!(stale.graph.pinned(), Some("intro"));

        // 回收时固定的章节保留
        assert!(stale.graph.release_purgable_chapters().is_empty());
        assert!(stale.current_page().is_some());
    }

    #[test]
    fn test_incompatible_save_leaves_book_untouched() {
        let mut book = sample_book();
        let result = book.load("9.0~bk~0~bk~memory~bk~0~bk~elsewhere");
        assert!(result.is_err());
        assert_eq!(book.current_page_id, "intro|p1");
    }

    #[test]
    fn test_corrupt_fields_degrade_to_defaults() {
        let mut book = Book::default();
        book.load("1.0~bk~0~bk~bogus~bk~maybe~bk~p1").unwrap();
        assert_eq!(book.sourcing(), PageSourcing::InMemory);
        assert!(!book.started_reading);
        assert_eq!(book.current_page_id, "p1");
        assert!(book.graph.chapters().is_empty());
    }
}
