// crates/si_interp/src/mean.rs

//! 均值基线
//!
//! 对任意位置都预测训练目标的算术平均，用作其他插值器的对照。

use crate::error::{InterpError, InterpResult};
use crate::frame::Frame;
use crate::traits::{extract_samples, FittedModel, Interpolator};

/// 均值插值器
#[derive(Debug, Clone)]
pub struct MeanInterpolator {
    dimensions: Vec<String>,
}

impl MeanInterpolator {
    /// 创建均值插值器
    pub fn new(dimensions: Vec<String>) -> Self {
        Self { dimensions }
    }
}

impl Interpolator for MeanInterpolator {
    fn name(&self) -> &str {
        "mean"
    }

    fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    fn fit(&self, frame: &Frame, target: &str) -> InterpResult<Box<dyn FittedModel>> {
        let (_, values) = extract_samples(frame, &self.dimensions, target)?;
        if values.is_empty() {
            return Err(InterpError::InsufficientSamples {
                required: 1,
                actual: 0,
            });
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Ok(Box::new(FittedMean {
            mean,
            n_samples: values.len(),
        }))
    }
}

/// 已拟合的均值模型
#[derive(Debug, Clone)]
pub struct FittedMean {
    mean: f64,
    n_samples: usize,
}

impl FittedMean {
    /// 拟合得到的均值
    pub fn mean(&self) -> f64 {
        self.mean
    }
}

impl FittedModel for FittedMean {
    fn predict(&self, frame: &Frame) -> InterpResult<Vec<f64>> {
        Ok(vec![self.mean; frame.n_rows()])
    }

    fn n_samples(&self) -> usize {
        self.n_samples
    }
}
