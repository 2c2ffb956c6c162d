// crates/si_config/src/lib.rs

//! SpatialInterp Config Layer (Layer 3)
//!
//! 评估运行配置：从 JSON 加载，并在任何拟合开始之前一次性校验。
//!
//! # 模块概览
//!
//! - [`eval_config`]: `EvalConfig` 及其子配置
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: si_cli        ─> loads EvalConfig
//! Layer 4: si_eval       ─> resolves EvalConfig into engine settings
//! Layer 3: si_config     ─> EvalConfig, ConfigError (本层)
//! Layer 2: si_interp     ─> InterpolatorSpec
//! Layer 1: si_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod eval_config;

// 重导出核心类型
pub use error::ConfigError;
pub use eval_config::{
    AreaConfig, ChunkFailurePolicy, EvalConfig, EvalSetConfig, PartialSubsetConfig, SupportConfig,
};
