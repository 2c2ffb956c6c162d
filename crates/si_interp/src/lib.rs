// crates/si_interp/src/lib.rs

//! 空间插值器
//!
//! 评估引擎把插值器视为黑盒：只要求 `fit(frame, target)` 返回一个
//! 已拟合模型，模型的 `predict(frame)` 按输入行序返回预测值。
//!
//! # 模块
//!
//! - [`frame`]: 行优先的具名数值表
//! - [`traits`]: `Interpolator` / `FittedModel` 契约
//! - [`distance`]: 欧氏距离与大圆距离
//! - [`mean`]: 均值基线
//! - [`idw`]: 反距离加权插值
//! - [`kriging`]: 普通克里金插值
//! - [`builder`]: 由配置构建 `Box<dyn Interpolator>`
//!
//! # 选择指南
//!
//! | 方法 | 计算复杂度 | 光滑性 | 适用场景 |
//! |------|----------|--------|---------|
//! | Mean | O(n) | - | 基线对照 |
//! | IDW | O(n) | 低 | 快速估算、数据密集区域 |
//! | Kriging | O(n³) | 高 | 需要误差估计、地统计数据 |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod distance;
pub mod error;
pub mod frame;
pub mod idw;
pub mod kriging;
pub mod mean;
pub mod traits;

// 重导出核心类型
pub use builder::{build_interpolator, InterpolationMethod, InterpolatorSpec};
pub use distance::DistanceMetric;
pub use error::{InterpError, InterpResult};
pub use frame::Frame;
pub use idw::{IdwConfig, IdwInterpolator};
pub use kriging::{KrigingInterpolator, VariogramModel};
pub use mean::MeanInterpolator;
pub use traits::{has_temporal_dimension, FittedModel, Interpolator, TEMPORAL_DIMENSIONS};
