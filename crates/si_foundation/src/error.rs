// crates/si_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `SiError` 枚举和 `SiResult` 类型别名。插值与评估相关的错误
//! 分别在 `si_interp` 与 `si_eval` 中扩展。
//!
//! # 示例
//!
//! ```
//! use si_foundation::error::{SiError, SiResult};
//!
//! fn check_column(name: &str) -> SiResult<()> {
//!     Err(SiError::missing_column(name))
//! }
//! assert!(check_column("wave_height").is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type SiResult<T> = Result<T, SiError>;

/// 基础层错误类型
#[derive(Error, Debug)]
pub enum SiError {
    /// IO 错误
    #[error("IO error: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 无效输入
    #[error("invalid input: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("size mismatch for {name}: expected {expected}, got {actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 缺少列
    #[error("column not found: {column}")]
    MissingColumn {
        /// 列名
        column: String,
    },

    /// 主键重复
    #[error("duplicate key: {key}")]
    DuplicateKey {
        /// 重复的主键描述
        key: String,
    },

    /// 时长或时间解析失败
    #[error("cannot parse '{input}': {reason}")]
    Parse {
        /// 原始输入
        input: String,
        /// 失败原因
        reason: String,
    },

    /// 序列化错误
    #[error("serialization error: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl SiError {
    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 缺少列
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// 主键重复
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    /// 解析失败
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> SiResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }
}

impl From<std::io::Error> for SiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
