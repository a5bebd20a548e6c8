//! # Slots 模块
//!
//! 存档文件管理，负责存档槽位的读写。
//!
//! ## 文件布局
//!
//! ```text
//! saves/
//! ├── slot_001.save
//! ├── slot_002.save
//! └── ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use manga_runtime::{SaveBlob, SaveError};
use tracing::{debug, info};

/// 最大存档槽位数
pub const MAX_SAVE_SLOTS: u32 = 99;

const SLOT_PREFIX: &str = "slot_";
const SLOT_SUFFIX: &str = ".save";

/// 存档槽位管理器
pub struct SaveSlots {
    saves_dir: PathBuf,
}

impl SaveSlots {
    pub fn new(saves_dir: impl AsRef<Path>) -> Self {
        Self {
            saves_dir: saves_dir.as_ref().to_path_buf(),
        }
    }

    /// 确保存档目录存在
    pub fn ensure_dir(&self) -> Result<(), SaveError> {
        if !self.saves_dir.exists() {
            fs::create_dir_all(&self.saves_dir)
                .map_err(|e| SaveError::IoError(format!("无法创建存档目录: {e}")))?;
        }
        Ok(())
    }

    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.saves_dir
            .join(format!("{SLOT_PREFIX}{slot:03}{SLOT_SUFFIX}"))
    }

    /// 写入存档字符串
    pub fn write(&self, slot: u32, blob: &str) -> Result<(), SaveError> {
        self.ensure_dir()?;
        let path = self.slot_path(slot);
        fs::write(&path, blob)
            .map_err(|e| SaveError::IoError(format!("无法写入存档文件: {e}")))?;
        info!(path = %path.display(), "存档保存成功");
        Ok(())
    }

    /// 读取存档字符串
    pub fn read(&self, slot: u32) -> Result<String, SaveError> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(SaveError::NotFound(path.to_string_lossy().to_string()));
        }
        let blob = fs::read_to_string(&path)
            .map_err(|e| SaveError::IoError(format!("无法读取存档文件: {e}")))?;
        debug!(path = %path.display(), bytes = blob.len(), "读取存档");
        Ok(blob)
    }

    /// 删除存档，不存在时什么都不做
    pub fn delete(&self, slot: u32) -> Result<(), SaveError> {
        let path = self.slot_path(slot);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| SaveError::IoError(format!("无法删除存档文件: {e}")))?;
            info!(path = %path.display(), "存档删除成功");
        }
        Ok(())
    }

    pub fn exists(&self, slot: u32) -> bool {
        self.slot_path(slot).exists()
    }

    /// 列出所有存档（按槽位排序）
    pub fn list(&self) -> Vec<(u32, PathBuf)> {
        let Ok(entries) = fs::read_dir(&self.saves_dir) else {
            return Vec::new();
        };

        let mut saves: Vec<_> = entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                let slot = parse_slot(path.file_name()?.to_str()?)?;
                Some((slot, path))
            })
            .collect();
        saves.sort_by_key(|(slot, _)| *slot);
        saves
    }

    pub fn next_available_slot(&self) -> Option<u32> {
        (1..=MAX_SAVE_SLOTS).find(|&slot| !self.exists(slot))
    }

    /// 存档摘要（只解析头部字段需要的内容）
    pub fn info(&self, slot: u32) -> Option<SlotInfo> {
        let blob = self.read(slot).ok()?;
        let info = match SaveBlob::parse(&blob) {
            Ok(parsed) => SlotInfo {
                slot,
                version: parsed.version.to_string(),
                state_only: parsed.state_only,
                current_page_id: parsed.current_page_id,
                compatible: true,
            },
            Err(SaveError::IncompatibleVersion { save_version, .. }) => SlotInfo {
                slot,
                version: save_version,
                state_only: false,
                current_page_id: String::new(),
                compatible: false,
            },
            Err(_) => return None,
        };
        Some(info)
    }
}

/// 解析 `slot_XXX.save`
fn parse_slot(name: &str) -> Option<u32> {
    name.strip_prefix(SLOT_PREFIX)?
        .strip_suffix(SLOT_SUFFIX)?
        .parse()
        .ok()
}

/// 存档摘要
#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo {
    pub slot: u32,
    pub version: String,
    pub state_only: bool,
    pub current_page_id: String,
    pub compatible: bool,
}
