//! 笔记本：玩家可以发现的笔记集合

use crate::codec::{self, Divider, FieldReader, FieldWriter, Record};

/// 笔记条目
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotebookEntry {
    pub id: String,
    pub title: String,
    pub body: String,
    pub discovered: bool,
}

impl Record for NotebookEntry {
    const DIVIDER: Divider = codec::NOTEBOOK_ENTRY;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.id)
            .text(&self.title)
            .text(&self.body)
            .bool(self.discovered);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            id: input.str(),
            title: input.text(),
            body: input.text(),
            discovered: input.bool(),
        }
    }
}

/// 笔记本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notebook {
    pub entries: Vec<NotebookEntry>,
}

impl Notebook {
    pub fn get(&self, id: &str) -> Option<&NotebookEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// 取条目，不存在时创建一个空条目
    pub fn get_or_create(&mut self, id: &str) -> &mut NotebookEntry {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => &mut self.entries[index],
            None => {
                self.entries.push(NotebookEntry {
                    id: id.to_string(),
                    ..Default::default()
                });
                let last = self.entries.len() - 1;
                &mut self.entries[last]
            }
        }
    }

    /// 标记为已发现，返回是否是第一次发现
    pub fn discover(&mut self, id: &str) -> bool {
        let entry = self.get_or_create(id);
        !std::mem::replace(&mut entry.discovered, true)
    }

    pub fn discovered(&self) -> impl Iterator<Item = &NotebookEntry> {
        self.entries.iter().filter(|e| e.discovered)
    }
}

impl Record for Notebook {
    const DIVIDER: Divider = codec::NOTEBOOK;

    fn write(&self, out: &mut FieldWriter) {
        out.list(&self.entries);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            entries: input.list(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};

    #[test]
    fn test_get_or_create_does_not_duplicate() {
        let mut notebook = Notebook::default();
        notebook.get_or_create("clue").title = "线索".to_string();
        notebook.get_or_create("clue");
        assert_eq!(notebook.entries.len(), 1);
        assert_eq!(notebook.get("clue").map(|e| e.title.as_str()), Some("线索"));
    }

    #[test]
    fn test_discover_reports_first_time_only() {
        let mut notebook = Notebook::default();
        assert!(notebook.discover("clue"));
        assert!(!notebook.discover("clue"));
        assert_eq!(notebook.discovered().count(), 1);
    }

    #[test]
    fn test_notebook_round_trip() {
        let mut notebook = Notebook::default();
        notebook.get_or_create("a").body = "第一行\n第二行".to_string();
        notebook.discover("b");
        assert_eq!(decode::<Notebook>(&encode(&notebook)), notebook);
        assert_eq!(decode::<Notebook>(&encode(&Notebook::default())), Notebook::default());
    }
}
