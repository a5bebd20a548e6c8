//! # Config 模块
//!
//! 运行时配置。
//!
//! ## 配置优先级
//!
//! 1. 宿主代码显式修改（最高）
//! 2. 配置文件 (JSON)
//! 3. 默认值（最低）
//!
//! 配置文件中缺失的字段各自取默认值。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// 运行时配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 封面页 id，`@cover` 跳转到这里
    #[serde(default = "default_cover_page_id")]
    pub cover_page_id: String,

    /// 页面加载和布局变化后是否自动朗读
    #[serde(default)]
    pub auto_read_aloud: bool,

    /// 页面有提示时是否通知宿主
    #[serde(default = "default_hint_chime")]
    pub hint_chime: bool,

    /// 由中心朝向构造目标范围时使用的半宽（度）
    #[serde(default = "default_orientation_tolerance")]
    pub orientation_tolerance: f64,

    /// 脚本请求的最大嵌套层数
    #[serde(default = "default_max_script_depth")]
    pub max_script_depth: usize,

    /// 随机奖励触发标记的状态键后缀
    #[serde(default = "default_reward_flag_suffix")]
    pub reward_flag_suffix: String,

    /// 历史记录上限
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

// 默认值函数
fn default_cover_page_id() -> String {
    "cover".to_string()
}

fn default_hint_chime() -> bool {
    true
}

fn default_orientation_tolerance() -> f64 {
    15.0
}

fn default_max_script_depth() -> usize {
    8
}

fn default_reward_flag_suffix() -> String {
    ".rewardTriggered".to_string()
}

fn default_history_limit() -> usize {
    500
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cover_page_id: default_cover_page_id(),
            auto_read_aloud: false,
            hint_chime: default_hint_chime(),
            orientation_tolerance: default_orientation_tolerance(),
            max_script_depth: default_max_script_depth(),
            reward_flag_suffix: default_reward_flag_suffix(),
            history_limit: default_history_limit(),
        }
    }
}

impl RuntimeConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cover_page_id.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "cover_page_id 不能为空".to_string(),
            ));
        }

        if self.orientation_tolerance.is_nan() || self.orientation_tolerance <= 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "orientation_tolerance 必须为正数，实际为 {}",
                self.orientation_tolerance
            )));
        }

        if self.max_script_depth == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_script_depth 必须大于 0".to_string(),
            ));
        }

        if self.history_limit == 0 {
            return Err(ConfigError::ValidationFailed(
                "history_limit 必须大于 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
