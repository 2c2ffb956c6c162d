// crates/si_interp/src/error.rs

//! 插值错误类型

use si_foundation::SiError;
use thiserror::Error;

/// 插值结果类型
pub type InterpResult<T> = Result<T, InterpError>;

/// 插值错误
#[derive(Debug, Error)]
pub enum InterpError {
    /// 基础层错误（缺列、尺寸不匹配等）
    #[error(transparent)]
    Foundation(#[from] SiError),

    /// 样本不足
    #[error("insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples {
        /// 所需样本数
        required: usize,
        /// 实际样本数
        actual: usize,
    },

    /// 输入包含非有限值
    #[error("non-finite value in column '{column}' at row {row}")]
    NonFinite {
        /// 列名
        column: String,
        /// 行号
        row: usize,
    },

    /// 克里金矩阵奇异
    #[error("kriging system is singular ({n_points} points)")]
    SingularSystem {
        /// 采样点数
        n_points: usize,
    },

    /// 参数无效
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// 参数名
        name: &'static str,
        /// 原因
        reason: String,
    },
}

impl InterpError {
    /// 参数无效
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
