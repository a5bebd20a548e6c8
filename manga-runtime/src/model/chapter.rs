//! 章节：有序的页面列表

use super::page::Page;
use crate::codec::{self, Divider, FieldReader, FieldWriter, Record};

/// 章节
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    /// 即时加载模式下，非当前章节可被回收
    pub purgable: bool,
    pub pages: Vec<Page>,
}

impl Chapter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn purgable(mut self, purgable: bool) -> Self {
        self.purgable = purgable;
        self
    }

    /// 按页 id 线性查找
    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_mut(&mut self, id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    /// 查找或创建页面，已存在时返回原页面
    pub fn add_page(&mut self, id: &str) -> &mut Page {
        match self.pages.iter().position(|p| p.id == id) {
            Some(index) => &mut self.pages[index],
            None => {
                let mut page = Page::new(id);
                page.chapter_id = self.id.clone();
                self.pages.push(page);
                let last = self.pages.len() - 1;
                &mut self.pages[last]
            }
        }
    }

    /// 插入页面，同 id 的页面会被替换（保持原位置）
    pub fn insert_page(&mut self, mut page: Page) {
        page.chapter_id = self.id.clone();
        match self.pages.iter_mut().find(|p| p.id == page.id) {
            Some(existing) => *existing = page,
            None => self.pages.push(page),
        }
    }

    /// 链式构建用
    pub fn with_page(mut self, page: Page) -> Self {
        self.insert_page(page);
        self
    }
}

impl Record for Chapter {
    const DIVIDER: Divider = codec::CHAPTER;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.id)
            .text(&self.title)
            .bool(self.purgable)
            .list(&self.pages);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        let mut chapter = Self {
            id: input.str(),
            title: input.text(),
            purgable: input.bool(),
            pages: input.list(),
        };
        for page in &mut chapter.pages {
            page.chapter_id = chapter.id.clone();
        }
        chapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};

    #[test]
    fn test_add_page_is_find_or_create() {
        let mut chapter = Chapter::new("intro");
        chapter.add_page("p1").title = "first".to_string();
        chapter.add_page("p1");
        chapter.add_page("p2");

        assert_eq!(chapter.pages.len(), 2);
        assert_eq!(chapter.page("p1").map(|p| p.title.as_str()), Some("first"));
        assert_eq!(chapter.pages[0].chapter_id, "intro");
    }

    #[test]
    fn test_insert_page_replaces_in_place() {
        let mut chapter = Chapter::new("c")
            .with_page(Page::new("a"))
            .with_page(Page::new("b"));
        let mut replacement = Page::new("a");
        replacement.title = "new".to_string();
        chapter.insert_page(replacement);

        assert_eq!(chapter.pages.len(), 2);
        assert_eq!(chapter.pages[0].title, "new");
        assert_eq!(chapter.pages[0].chapter_id, "c");
    }

    #[test]
    fn test_chapter_round_trip() {
        let chapter = Chapter::new("mid")
            .purgable(true)
            .with_page(Page::new("p2"))
            .with_page(Page::new("p3"));
        let decoded: Chapter = decode(&encode(&chapter));
        assert_eq!(decoded, chapter);
    }
}
