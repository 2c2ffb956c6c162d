// crates/si_interp/src/idw.rs

//! IDW (Inverse Distance Weighting) 插值
//!
//! 反距离加权插值方法，是最常用的空间插值方法之一。
//!
//! # 算法原理
//!
//! IDW 基于"距离越近，相关性越强"的假设，使用距离的倒数作为权重：
//!
//! $$
//! z(x) = \frac{\sum_{i=1}^{n} w_i \cdot z_i}{\sum_{i=1}^{n} w_i}
//! $$
//!
//! 其中权重 $w_i = \frac{1}{d_i^p}$，$p$ 为距离指数（通常为 2）。
//! 维度数不限，包含 `time_step` 时即为时空 IDW。
//!
//! # 示例
//!
//! ```
//! use si_interp::{Frame, IdwConfig, IdwInterpolator, Interpolator, DistanceMetric};
//!
//! let cols = vec!["x".to_string(), "y".to_string(), "v".to_string()];
//! let train = Frame::from_rows(cols, &[[0.0, 0.0, 0.0], [1.0, 0.0, 1.0]]).unwrap();
//!
//! let idw = IdwInterpolator::new(
//!     vec!["x".to_string(), "y".to_string()],
//!     DistanceMetric::Euclidean,
//!     IdwConfig::default(),
//! );
//! let model = idw.fit(&train, "v").unwrap();
//!
//! let query = Frame::from_rows(vec!["x".to_string(), "y".to_string()], &[[0.5, 0.0]]).unwrap();
//! let z = model.predict(&query).unwrap();
//! assert!((z[0] - 0.5).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::error::{InterpError, InterpResult};
use crate::frame::Frame;
use crate::traits::{extract_coordinates, extract_samples, FittedModel, Interpolator};

/// IDW 插值配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdwConfig {
    /// 距离指数 (p)，通常为 1-3，默认 2
    #[serde(default = "default_power")]
    pub power: f64,
    /// 搜索半径限制，None 表示无限制
    #[serde(default)]
    pub search_radius: Option<f64>,
    /// 最大邻居数限制，None 表示无限制
    #[serde(default)]
    pub max_neighbors: Option<usize>,
    /// 最小邻居数，如果邻居不足则该位置无预测
    #[serde(default = "default_min_neighbors")]
    pub min_neighbors: usize,
    /// 距离容差（小于此值视为在采样点上）
    #[serde(default = "default_tolerance")]
    pub distance_tolerance: f64,
}

fn default_power() -> f64 { 2.0 }
fn default_min_neighbors() -> usize { 1 }
fn default_tolerance() -> f64 { 1e-10 }

impl Default for IdwConfig {
    fn default() -> Self {
        Self {
            power: default_power(),
            search_radius: None,
            max_neighbors: None,
            min_neighbors: default_min_neighbors(),
            distance_tolerance: default_tolerance(),
        }
    }
}

impl IdwConfig {
    /// 设置距离指数
    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    /// 设置搜索半径
    pub fn with_search_radius(mut self, radius: f64) -> Self {
        self.search_radius = Some(radius);
        self
    }

    /// 设置最大邻居数
    pub fn with_max_neighbors(mut self, n: usize) -> Self {
        self.max_neighbors = Some(n);
        self
    }

    /// 设置最小邻居数
    pub fn with_min_neighbors(mut self, n: usize) -> Self {
        self.min_neighbors = n;
        self
    }

    /// 校验参数
    pub fn validate(&self) -> InterpResult<()> {
        if !(self.power.is_finite() && self.power > 0.0) {
            return Err(InterpError::invalid_parameter("power", format!("must be > 0, got {}", self.power)));
        }
        if let Some(r) = self.search_radius {
            if !(r.is_finite() && r > 0.0) {
                return Err(InterpError::invalid_parameter("search_radius", format!("must be > 0, got {}", r)));
            }
        }
        if self.max_neighbors == Some(0) {
            return Err(InterpError::invalid_parameter("max_neighbors", "must be at least 1"));
        }
        Ok(())
    }
}

/// IDW 插值器
#[derive(Debug, Clone)]
pub struct IdwInterpolator {
    dimensions: Vec<String>,
    metric: DistanceMetric,
    config: IdwConfig,
}

impl IdwInterpolator {
    /// 创建 IDW 插值器
    pub fn new(dimensions: Vec<String>, metric: DistanceMetric, config: IdwConfig) -> Self {
        Self {
            dimensions,
            metric,
            config,
        }
    }

    /// 获取配置
    pub fn config(&self) -> &IdwConfig {
        &self.config
    }
}

impl Interpolator for IdwInterpolator {
    fn name(&self) -> &str {
        "idw"
    }

    fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    fn fit(&self, frame: &Frame, target: &str) -> InterpResult<Box<dyn FittedModel>> {
        let (coords, values) = extract_samples(frame, &self.dimensions, target)?;
        if values.is_empty() {
            return Err(InterpError::InsufficientSamples {
                required: 1,
                actual: 0,
            });
        }
        Ok(Box::new(FittedIdw {
            dimensions: self.dimensions.clone(),
            coords,
            values,
            metric: self.metric,
            config: self.config.clone(),
        }))
    }
}

/// 已拟合的 IDW 模型
#[derive(Debug, Clone)]
pub struct FittedIdw {
    dimensions: Vec<String>,
    /// 采样点坐标（行优先展平）
    coords: Vec<f64>,
    /// 采样点值
    values: Vec<f64>,
    metric: DistanceMetric,
    config: IdwConfig,
}

impl FittedIdw {
    /// 在指定点插值
    ///
    /// # 返回
    /// 如果有足够的邻居点，返回 Some(插值结果)；否则返回 None
    pub fn interpolate(&self, point: &[f64]) -> Option<f64> {
        let n_dims = self.dimensions.len();
        if self.values.is_empty() || point.len() != n_dims {
            return None;
        }

        // 计算到所有点的距离
        let mut distances: Vec<(usize, f64)> = self
            .coords
            .chunks_exact(n_dims.max(1))
            .enumerate()
            .map(|(i, p)| (i, self.metric.distance(p, point)))
            .collect();

        // 检查是否恰好在采样点上
        for &(idx, dist) in &distances {
            if dist < self.config.distance_tolerance {
                return Some(self.values[idx]);
            }
        }

        // 应用搜索半径过滤
        if let Some(radius) = self.config.search_radius {
            distances.retain(|&(_, d)| d <= radius);
        }

        // 检查最小邻居数
        if distances.len() < self.config.min_neighbors || distances.is_empty() {
            return None;
        }

        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        if let Some(max_n) = self.config.max_neighbors {
            distances.truncate(max_n);
        }

        let p = self.config.power;
        let mut weight_sum = 0.0;
        let mut value_sum = 0.0;
        for (idx, dist) in distances {
            let weight = 1.0 / dist.powf(p);
            weight_sum += weight;
            value_sum += weight * self.values[idx];
        }

        if weight_sum > 0.0 {
            Some(value_sum / weight_sum)
        } else {
            None
        }
    }
}

impl FittedModel for FittedIdw {
    fn predict(&self, frame: &Frame) -> InterpResult<Vec<f64>> {
        let coords = extract_coordinates(frame, &self.dimensions)?;
        Ok(coords
            .chunks_exact(self.dimensions.len().max(1))
            .map(|p| self.interpolate(p).unwrap_or(f64::NAN))
            .collect())
    }

    fn n_samples(&self) -> usize {
        self.values.len()
    }
}
