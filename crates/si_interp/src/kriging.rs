// crates/si_interp/src/kriging.rs

//! Kriging 插值
//!
//! 普通克里金 (Ordinary Kriging)，提供最优线性无偏估计（BLUE）。
//!
//! # 算法原理
//!
//! 通过求解扩展的 Kriging 系统获得最优权重：
//!
//! $$
//! \begin{bmatrix} \gamma_{11} & \cdots & \gamma_{1n} & 1 \\
//!                 \vdots & \ddots & \vdots & \vdots \\
//!                 \gamma_{n1} & \cdots & \gamma_{nn} & 1 \\
//!                 1 & \cdots & 1 & 0 \end{bmatrix}
//! \begin{bmatrix} w_1 \\ \vdots \\ w_n \\ \mu \end{bmatrix} =
//! \begin{bmatrix} \gamma_{10} \\ \vdots \\ \gamma_{n0} \\ 1 \end{bmatrix}
//! $$
//!
//! 距离由 [`DistanceMetric`] 给出，因此同一实现覆盖平面、球面与时空维度。

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::error::{InterpError, InterpResult};
use crate::frame::Frame;
use crate::traits::{extract_coordinates, extract_samples, FittedModel, Interpolator};

/// 变异函数模型
///
/// 描述空间相关性随距离变化的模型。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum VariogramModel {
    /// 球状模型
    ///
    /// γ(h) = C₀ + C * (1.5h/a - 0.5(h/a)³) 当 h < a
    /// γ(h) = C₀ + C 当 h >= a
    Spherical {
        /// 块金值 (nugget)
        nugget: f64,
        /// 基台值 (sill)，不含块金
        sill: f64,
        /// 变程 (range)
        range: f64,
    },

    /// 指数模型
    ///
    /// γ(h) = C₀ + C * (1 - exp(-3h/a))
    Exponential {
        /// 块金值
        nugget: f64,
        /// 基台值
        sill: f64,
        /// 有效变程
        range: f64,
    },

    /// 高斯模型
    ///
    /// γ(h) = C₀ + C * (1 - exp(-3(h/a)²))
    Gaussian {
        /// 块金值
        nugget: f64,
        /// 基台值
        sill: f64,
        /// 有效变程
        range: f64,
    },

    /// 线性模型
    ///
    /// γ(h) = C₀ + slope * h
    Linear {
        /// 块金值
        nugget: f64,
        /// 斜率
        slope: f64,
    },
}

impl VariogramModel {
    /// 创建球状模型
    pub fn spherical(nugget: f64, sill: f64, range: f64) -> Self {
        Self::Spherical { nugget, sill, range }
    }

    /// 创建指数模型
    pub fn exponential(nugget: f64, sill: f64, range: f64) -> Self {
        Self::Exponential { nugget, sill, range }
    }

    /// 创建高斯模型
    pub fn gaussian(nugget: f64, sill: f64, range: f64) -> Self {
        Self::Gaussian { nugget, sill, range }
    }

    /// 创建线性模型
    pub fn linear(nugget: f64, slope: f64) -> Self {
        Self::Linear { nugget, slope }
    }

    /// 计算半变异函数值 γ(h)
    pub fn gamma(&self, h: f64) -> f64 {
        if h < 1e-10 {
            return 0.0;
        }
        match *self {
            Self::Spherical { nugget, sill, range } => {
                if h >= range {
                    nugget + sill
                } else {
                    let ratio = h / range;
                    nugget + sill * (1.5 * ratio - 0.5 * ratio.powi(3))
                }
            }
            Self::Exponential { nugget, sill, range } => {
                nugget + sill * (1.0 - (-3.0 * h / range).exp())
            }
            Self::Gaussian { nugget, sill, range } => {
                nugget + sill * (1.0 - (-3.0 * (h / range).powi(2)).exp())
            }
            Self::Linear { nugget, slope } => nugget + slope * h,
        }
    }

    /// 校验参数
    pub fn validate(&self) -> InterpResult<()> {
        let (nugget, sill, range) = match *self {
            Self::Spherical { nugget, sill, range }
            | Self::Exponential { nugget, sill, range }
            | Self::Gaussian { nugget, sill, range } => (nugget, sill, Some(range)),
            Self::Linear { nugget, slope } => (nugget, slope, None),
        };
        if !(nugget.is_finite() && nugget >= 0.0) {
            return Err(InterpError::invalid_parameter("nugget", format!("must be >= 0, got {}", nugget)));
        }
        if !(sill.is_finite() && sill > 0.0) {
            return Err(InterpError::invalid_parameter("sill", format!("must be > 0, got {}", sill)));
        }
        if let Some(range) = range {
            if !(range.is_finite() && range > 0.0) {
                return Err(InterpError::invalid_parameter("range", format!("must be > 0, got {}", range)));
            }
        }
        Ok(())
    }
}

impl Default for VariogramModel {
    fn default() -> Self {
        Self::spherical(0.0, 1.0, 100.0)
    }
}

/// Kriging 插值器
#[derive(Debug, Clone)]
pub struct KrigingInterpolator {
    dimensions: Vec<String>,
    metric: DistanceMetric,
    variogram: VariogramModel,
}

impl KrigingInterpolator {
    /// 创建 Kriging 插值器
    pub fn new(dimensions: Vec<String>, metric: DistanceMetric, variogram: VariogramModel) -> Self {
        Self {
            dimensions,
            metric,
            variogram,
        }
    }

    /// 获取变异函数模型
    pub fn variogram(&self) -> &VariogramModel {
        &self.variogram
    }
}

impl Interpolator for KrigingInterpolator {
    fn name(&self) -> &str {
        "kriging"
    }

    fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    fn fit(&self, frame: &Frame, target: &str) -> InterpResult<Box<dyn FittedModel>> {
        let (coords, values) = extract_samples(frame, &self.dimensions, target)?;
        let fitted = FittedKriging::solve(
            self.dimensions.clone(),
            coords,
            values,
            self.metric,
            self.variogram,
        )?;
        Ok(Box::new(fitted))
    }
}

/// 已拟合的 Kriging 模型
///
/// 持有预计算的 Kriging 矩阵逆。
#[derive(Debug, Clone)]
pub struct FittedKriging {
    dimensions: Vec<String>,
    coords: Vec<f64>,
    values: Vec<f64>,
    metric: DistanceMetric,
    variogram: VariogramModel,
    k_inv: DMatrix<f64>,
}

impl FittedKriging {
    fn solve(
        dimensions: Vec<String>,
        coords: Vec<f64>,
        values: Vec<f64>,
        metric: DistanceMetric,
        variogram: VariogramModel,
    ) -> InterpResult<Self> {
        let n = values.len();
        if n == 0 {
            return Err(InterpError::InsufficientSamples {
                required: 1,
                actual: 0,
            });
        }
        let n_dims = dimensions.len().max(1);
        let point = |i: usize| &coords[i * n_dims..(i + 1) * n_dims];

        // 扩展矩阵 (n+1) x (n+1)，最后一行/列为 Lagrange 乘子
        let mut k = DMatrix::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in 0..n {
                k[(i, j)] = variogram.gamma(metric.distance(point(i), point(j)));
            }
            k[(i, n)] = 1.0;
            k[(n, i)] = 1.0;
        }

        let k_inv = match k.try_inverse() {
            Some(inv) => inv,
            None => {
                tracing::warn!(n_points = n, "kriging matrix is singular");
                return Err(InterpError::SingularSystem { n_points: n });
            }
        };

        Ok(Self {
            dimensions,
            coords,
            values,
            metric,
            variogram,
            k_inv,
        })
    }

    /// 插值并返回 Kriging 方差
    ///
    /// σ²_k = Σ wᵢ γ(xᵢ, x₀) + μ
    pub fn interpolate_with_variance(&self, point: &[f64]) -> (f64, f64) {
        let n = self.values.len();
        let n_dims = self.dimensions.len().max(1);

        let mut k0 = DVector::zeros(n + 1);
        for (i, sample) in self.coords.chunks_exact(n_dims).enumerate() {
            k0[i] = self.variogram.gamma(self.metric.distance(sample, point));
        }
        k0[n] = 1.0;

        let weights = &self.k_inv * &k0;
        let value = (0..n).map(|i| weights[i] * self.values[i]).sum();
        let variance = k0.dot(&weights).max(0.0);
        (value, variance)
    }

    /// 在指定点插值
    pub fn interpolate(&self, point: &[f64]) -> f64 {
        self.interpolate_with_variance(point).0
    }
}

impl FittedModel for FittedKriging {
    fn predict(&self, frame: &Frame) -> InterpResult<Vec<f64>> {
        let coords = extract_coordinates(frame, &self.dimensions)?;
        Ok(coords
            .chunks_exact(self.dimensions.len().max(1))
            .map(|p| self.interpolate(p))
            .collect())
    }

    fn n_samples(&self) -> usize {
        self.values.len()
    }
}
