//! # Error 模块
//!
//! 定义 manga-runtime 中使用的错误类型。
//!
//! 查找失败、存档字段损坏、协作方缺失都不是错误：它们被记录日志后按默认值处理。
//! 这里的错误只给愿意知道失败原因的调用方使用。

use thiserror::Error;

use crate::config::ConfigError;
use crate::save::SaveError;
use crate::script::BindingError;

/// 运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 页面未找到
    #[error("页面 '{page_id}' 未找到")]
    PageNotFound { page_id: String },

    /// 当前没有打开任何页面
    #[error("当前没有打开任何页面")]
    NoCurrentPage,

    /// 页面没有对应链接
    #[error("页面 '{page_id}' 没有{direction}页链接")]
    NoLink {
        page_id: String,
        direction: &'static str,
    },

    /// 无效的选项索引
    #[error("无效的选项索引 {index}，有效范围是 0..{max}")]
    InvalidOptionIndex { index: usize, max: usize },

    /// 脚本请求嵌套过深
    #[error("脚本请求嵌套超过 {limit} 层")]
    ScriptDepthExceeded { limit: usize },
}

/// manga-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MangaError {
    /// 运行时错误
    #[error("运行时错误: {0}")]
    Runtime(#[from] RuntimeError),

    /// 脚本绑定错误
    #[error("脚本绑定错误: {0}")]
    Binding(#[from] BindingError),

    /// 存档错误
    #[error("存档错误: {0}")]
    Save(#[from] SaveError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type MangaResult<T> = Result<T, MangaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: MangaError = RuntimeError::PageNotFound {
            page_id: "ghost".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "运行时错误: 页面 'ghost' 未找到");

        let err: MangaError = SaveError::NotFound("slot_001.save".to_string()).into();
        assert!(matches!(err, MangaError::Save(_)));
    }
}
