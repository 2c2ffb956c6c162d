// crates/si_interp/src/builder.rs

//! 由配置构建插值器
//!
//! 配置形如：
//!
//! ```json
//! { "kind": "idw", "dimensions": ["lon", "lat"], "latlon": true, "power": 2.0 }
//! ```

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::error::{InterpError, InterpResult};
use crate::idw::{IdwConfig, IdwInterpolator};
use crate::kriging::{KrigingInterpolator, VariogramModel};
use crate::mean::MeanInterpolator;
use crate::traits::Interpolator;

/// 插值方法及其参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpolationMethod {
    /// 均值基线
    Mean,
    /// 反距离加权
    Idw(IdwConfig),
    /// 普通克里金
    Kriging {
        /// 变异函数
        #[serde(default)]
        variogram: VariogramModel,
    },
}

/// 插值器描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatorSpec {
    /// 维度列（可包含 `time_step`）
    pub dimensions: Vec<String>,
    /// 前两维是否为经纬度
    #[serde(default)]
    pub latlon: bool,
    /// 方法
    #[serde(flatten)]
    pub method: InterpolationMethod,
}

impl InterpolatorSpec {
    /// 校验描述
    pub fn validate(&self) -> InterpResult<()> {
        if self.dimensions.is_empty() {
            return Err(InterpError::invalid_parameter("dimensions", "at least one dimension is required"));
        }
        if self.latlon && self.dimensions.len() < 2 {
            return Err(InterpError::invalid_parameter(
                "latlon",
                "requires the first two dimensions to be longitude and latitude",
            ));
        }
        match &self.method {
            InterpolationMethod::Mean => Ok(()),
            InterpolationMethod::Idw(cfg) => cfg.validate(),
            InterpolationMethod::Kriging { variogram } => variogram.validate(),
        }
    }
}

/// 构建插值器
pub fn build_interpolator(spec: &InterpolatorSpec) -> InterpResult<Box<dyn Interpolator>> {
    spec.validate()?;
    let dims = spec.dimensions.clone();
    let metric = DistanceMetric::from_latlon(spec.latlon);
    let interp: Box<dyn Interpolator> = match &spec.method {
        InterpolationMethod::Mean => Box::new(MeanInterpolator::new(dims)),
        InterpolationMethod::Idw(cfg) => Box::new(IdwInterpolator::new(dims, metric, cfg.clone())),
        InterpolationMethod::Kriging { variogram } => {
            Box::new(KrigingInterpolator::new(dims, metric, *variogram))
        }
    };
    Ok(interp)
}
