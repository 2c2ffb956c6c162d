// crates/si_eval/src/error.rs

//! 评估引擎错误类型
//!
//! 单个时刻的拟合/预测失败不是错误，而是 `InstantOutcome::Failed`；
//! 这里只包含会中止整次运行的错误。

use si_config::ConfigError;
use si_foundation::SiError;
use si_interp::InterpError;
use thiserror::Error;

/// 评估结果类型
pub type EvalResult<T> = Result<T, EvalError>;

/// 评估错误
#[derive(Debug, Error)]
pub enum EvalError {
    /// 基础层错误
    #[error(transparent)]
    Foundation(#[from] SiError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 插值器构建错误
    #[error("Interpolator error: {0}")]
    Interpolator(#[from] InterpError),

    /// 观测表缺少所需列
    #[error("Column '{column}' is missing from the {table} table")]
    MissingColumn {
        /// 列名
        column: String,
        /// 表名（train/test）
        table: &'static str,
    },

    /// 插值器维度与评估设置不一致
    #[error("Interpolator dimensions {interpolator:?} do not match evaluation dimensions {settings:?}")]
    DimensionMismatch {
        /// 评估设置中的维度
        settings: Vec<String>,
        /// 插值器声明的维度
        interpolator: Vec<String>,
    },

    /// 评估模式与维度不一致
    #[error("Evaluation mode '{mode}' does not match dimensions {dimensions:?}")]
    ModeMismatch {
        /// 评估模式
        mode: String,
        /// 维度
        dimensions: Vec<String>,
    },

    /// 分块执行崩溃
    #[error("Chunk {chunk} failed: {message}")]
    ChunkFailed {
        /// 分块序号
        chunk: usize,
        /// 崩溃信息
        message: String,
    },

    /// 线程池构建失败
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl EvalError {
    /// 缺列错误
    pub fn missing_column(column: impl Into<String>, table: &'static str) -> Self {
        Self::MissingColumn {
            column: column.into(),
            table,
        }
    }
}
