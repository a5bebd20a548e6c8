//! # Save 模块
//!
//! 存档格式：整本书编码成一个字符串。
//!
//! ## 设计原则
//!
//! - 第一个字段永远是格式版本 `major.minor`
//! - major 不同即不兼容，minor 只追加字段
//! - 轻量存档（state-only）省略章节和物品静态定义，读档时合并而不是替换
//!
//! 字段顺序：
//!
//! ```text
//! version ~bk~ state_only ~bk~ sourcing ~bk~ started ~bk~ current ~bk~ last
//!         ~bk~ state ~bk~ notebook ~bk~ items ~bk~ chapters
//! ```

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::codec::{self, Divider, FieldReader, FieldWriter, Record};
use crate::graph::PageSourcing;
use crate::inventory::{InventoryItem, ItemState};
use crate::model::Chapter;
use crate::notebook::Notebook;
use crate::state::StateStore;

/// 存档格式版本
///
/// 版本号含义：
/// - MAJOR: 不兼容的格式变更
/// - MINOR: 向后兼容的新字段
pub const SAVE_VERSION_MAJOR: u32 = 1;
pub const SAVE_VERSION_MINOR: u32 = 0;

/// 存档版本信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveVersion {
    pub major: u32,
    pub minor: u32,
}

impl SaveVersion {
    /// 当前版本
    pub fn current() -> Self {
        Self {
            major: SAVE_VERSION_MAJOR,
            minor: SAVE_VERSION_MINOR,
        }
    }

    /// 解析 `major.minor`；空串视为当前版本
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Some(Self::current());
        }
        let (major, minor) = text.split_once('.').unwrap_or((text, "0"));
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }

    /// major 必须相同，minor 可以不同
    pub fn is_compatible(&self) -> bool {
        self.major == SAVE_VERSION_MAJOR
    }
}

impl Default for SaveVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// 存档错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    /// 版本不兼容
    #[error("存档版本不兼容: 存档版本 {save_version} vs 当前版本 {current_version}")]
    IncompatibleVersion {
        save_version: String,
        current_version: String,
    },

    /// 文件操作失败
    #[error("文件操作失败: {0}")]
    IoError(String),

    /// 存档不存在
    #[error("存档不存在: {0}")]
    NotFound(String),
}

/// 存档中的物品
#[derive(Debug, Clone, PartialEq)]
pub enum SavedItems {
    Full(Vec<InventoryItem>),
    StateOnly(Vec<ItemState>),
}

impl Default for SavedItems {
    fn default() -> Self {
        Self::Full(Vec::new())
    }
}

/// 解码后的存档
///
/// 由 [`Book::snapshot`](crate::Book::snapshot) 生成，
/// 由 [`Book::restore`](crate::Book::restore) 应用。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveBlob {
    pub version: SaveVersion,
    pub state_only: bool,
    pub sourcing: PageSourcing,
    pub started_reading: bool,
    pub current_page_id: String,
    pub last_page_id: String,
    pub state: StateStore,
    pub notebook: Notebook,
    pub items: SavedItems,
    /// 轻量存档中始终为空
    pub chapters: Vec<Chapter>,
}

impl SaveBlob {
    /// 编码为存档字符串
    pub fn encode(&self) -> String {
        codec::encode(self)
    }

    /// 解码并检查版本
    ///
    /// 只有版本不兼容会报错；其余格式问题按字段回退默认值。
    pub fn parse(blob: &str) -> Result<Self, SaveError> {
        let decoded: Self = codec::decode(blob);
        if !decoded.version.is_compatible() {
            return Err(SaveError::IncompatibleVersion {
                save_version: decoded.version.to_string(),
                current_version: SaveVersion::current().to_string(),
            });
        }
        Ok(decoded)
    }
}

impl Record for SaveBlob {
    const DIVIDER: Divider = codec::BOOK;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.version.to_string())
            .bool(self.state_only)
            .code(&self.sourcing)
            .bool(self.started_reading)
            .str(&self.current_page_id)
            .str(&self.last_page_id)
            .map(self.state.as_map(), codec::STATE_MAP)
            .child(&self.notebook);
        match &self.items {
            SavedItems::Full(items) => out.list(items),
            SavedItems::StateOnly(states) => out.list(states),
        };
        if self.state_only {
            out.list::<Chapter>(&[]);
        } else {
            out.list(&self.chapters);
        }
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        let raw_version = input.str();
        let version = SaveVersion::parse(&raw_version).unwrap_or_else(|| {
            debug!(version = %raw_version, "无法解析存档版本，按不兼容处理");
            SaveVersion {
                major: 0,
                minor: 0,
            }
        });
        let state_only = input.bool();
        let sourcing = input.code();
        let started_reading = input.bool();
        let current_page_id = input.str();
        let last_page_id = input.str();
        let state = StateStore::from_map(input.map(codec::STATE_MAP));
        let notebook = input.child();
        let items = if state_only {
            SavedItems::StateOnly(input.list())
        } else {
            SavedItems::Full(input.list())
        };
        let chapters = input.list();

        Self {
            version,
            state_only,
            sourcing,
            started_reading,
            current_page_id,
            last_page_id,
            state,
            notebook,
            items,
            chapters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_version_compatibility() {
        let current = SaveVersion::current();
        assert!(current.is_compatible());

        let newer_minor = SaveVersion { major: 1, minor: 7 };
        assert!(newer_minor.is_compatible());

        let incompatible = SaveVersion { major: 2, minor: 0 };
        assert!(!incompatible.is_compatible());
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(SaveVersion::parse("1.3"), Some(SaveVersion { major: 1, minor: 3 }));
        assert_eq!(SaveVersion::parse("2"), Some(SaveVersion { major: 2, minor: 0 }));
        assert_eq!(SaveVersion::parse(""), Some(SaveVersion::current()));
        assert_eq!(SaveVersion::parse("x.y"), None);
        assert_eq!(SaveVersion::current().to_string(), "1.0");
    }

    #[test]
    fn test_incompatible_version_error() {
        let blob = SaveBlob {
            version: SaveVersion { major: 99, minor: 0 },
            ..Default::default()
        };
        let result = SaveBlob::parse(&blob.encode());
        assert!(matches!(result, Err(SaveError::IncompatibleVersion { .. })));

        let garbage = SaveBlob::parse("not-a-version~bk~1");
        assert!(matches!(garbage, Err(SaveError::IncompatibleVersion { .. })));
    }

    #[test]
    fn test_empty_blob_is_current_default() {
        let blob = SaveBlob::parse("").unwrap();
        assert_eq!(blob, SaveBlob::default());
    }

    #[test]
    fn test_state_only_blob_drops_chapters() {
        let blob = SaveBlob {
            state_only: true,
            items: SavedItems::StateOnly(vec![ItemState {
                id: "key".to_string(),
                ..Default::default()
            }]),
            chapters: vec![Chapter::new("ignored")],
            ..Default::default()
        };
        let decoded = SaveBlob::parse(&blob.encode()).unwrap();
        assert!(decoded.chapters.is_empty());
        assert_eq!(decoded.items, blob.items);
    }

    #[test]
    fn test_full_blob_round_trip() {
        let mut state = StateStore::new();
        state.set_bool("intro|p1.rewardTriggered", true);
        let blob = SaveBlob {
            sourcing: PageSourcing::JustInTime,
            started_reading: true,
            current_page_id: "mid|p2".to_string(),
            last_page_id: "intro|p1".to_string(),
            state,
            items: SavedItems::Full(vec![InventoryItem::new("lamp").with_quantity(2)]),
            chapters: vec![Chapter::new("mid")],
            ..Default::default()
        };
        assert_eq!(SaveBlob::parse(&blob.encode()).unwrap(), blob);
    }

    #[test]
    fn test_wire_prefix_is_stable() {
        insta::assert_snapshot!(SaveBlob::default().encode(), @"1.0~bk~0~bk~memory~bk~0~bk~~bk~~bk~~bk~0~bk~0~bk~0");
    }
}
