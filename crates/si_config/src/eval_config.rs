// crates/si_config/src/eval_config.rs

//! EvalConfig - 评估运行配置
//!
//! ```json
//! {
//!   "name": "kriging-6h",
//!   "target": "wave_height",
//!   "interpolator": { "kind": "kriging", "dimensions": ["lon", "lat", "time_step"], "latlon": true },
//!   "window": "6h",
//!   "n_jobs": 4,
//!   "eval_frac": 0.25,
//!   "eval_set": {
//!     "locations": ["41001", "41002"],
//!     "area": { "min_lon": -80.0, "max_lon": -60.0, "min_lat": 25.0, "max_lat": 45.0 },
//!     "partial": {
//!       "storm": { "locations": ["41001"], "time": { "start": "2021-01-01T00:00:00Z", "end": "2021-01-03T00:00:00Z" } }
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use si_foundation::{parse_duration, LocationId, TimeRange, Timestamp};
use si_interp::InterpolatorSpec;

use crate::error::ConfigError;

/// 评估运行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// 运行名称
    #[serde(default = "default_name")]
    pub name: String,

    /// 目标列
    pub target: String,

    /// 插值器
    pub interpolator: InterpolatorSpec,

    /// 时间窗口（如 `"6h"`），缺省或 `"0"` 表示不限制
    #[serde(default)]
    pub window: Option<String>,

    /// 并行度，≤1 时顺序执行
    #[serde(default = "default_n_jobs")]
    pub n_jobs: usize,

    /// 评估时刻采样：<1 为比例，>1 为绝对数量，=1 或缺省为全部
    #[serde(default)]
    pub eval_frac: Option<f64>,

    /// 采样随机种子
    #[serde(default)]
    pub seed: u64,

    /// 支撑阈值
    #[serde(default)]
    pub support: SupportConfig,

    /// 分块失败策略
    #[serde(default)]
    pub chunk_failure: ChunkFailurePolicy,

    /// 测试集与部分子集定义
    #[serde(default)]
    pub eval_set: EvalSetConfig,
}

fn default_name() -> String { "evaluation".to_string() }
fn default_n_jobs() -> usize { 1 }

/// 训练支撑阈值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportConfig {
    /// 训练表中每个时刻的最少行数，不足的时刻在评估前被剔除
    #[serde(default = "default_min_instant_rows")]
    pub min_instant_rows: usize,

    /// 锚定时刻的最少行数，不足时跳过该时刻
    #[serde(default = "default_min_slice_rows")]
    pub min_slice_rows: usize,
}

fn default_min_instant_rows() -> usize { 4 }
fn default_min_slice_rows() -> usize { 3 }

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            min_instant_rows: default_min_instant_rows(),
            min_slice_rows: default_min_slice_rows(),
        }
    }
}

/// 分块失败策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkFailurePolicy {
    /// 任一分块崩溃则整个调度失败
    #[default]
    Abort,
    /// 崩溃分块内的所有时刻记为失败，其余分块照常
    Isolate,
}

/// 测试集定义
///
/// 给定 `area` 时，先把观测限制在区域内的站点上再划分。
/// 测试行 = 站点属于 `locations`（为空则不限站点）且时刻落在
/// `time`（缺省则不限时间）内的观测。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EvalSetConfig {
    /// 测试站点
    #[serde(default)]
    pub locations: Vec<String>,

    /// 测试时间区间 `[start, end)`
    #[serde(default)]
    pub time: Option<TimeRange>,

    /// 评估区域，区域外的站点不参与训练与测试
    #[serde(default)]
    pub area: Option<AreaConfig>,

    /// 命名的部分子集
    #[serde(default)]
    pub partial: BTreeMap<String, PartialSubsetConfig>,
}

impl EvalSetConfig {
    /// 测试站点集合
    pub fn location_set(&self) -> BTreeSet<LocationId> {
        self.locations.iter().map(|s| LocationId::new(s.as_str())).collect()
    }

    /// 判断 (时刻, 站点) 是否属于测试集
    pub fn is_test(&self, locations: &BTreeSet<LocationId>, time: Timestamp, location: &LocationId) -> bool {
        let in_locations = locations.is_empty() || locations.contains(location);
        let in_time = self.time.map_or(true, |range| range.contains(time));
        in_locations && in_time
    }
}

/// 经纬度矩形评估区域（边界包含）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaConfig {
    /// 经度列
    #[serde(default = "default_lon_column")]
    pub lon_column: String,
    /// 纬度列
    #[serde(default = "default_lat_column")]
    pub lat_column: String,
    /// 最小经度
    pub min_lon: f64,
    /// 最大经度
    pub max_lon: f64,
    /// 最小纬度
    pub min_lat: f64,
    /// 最大纬度
    pub max_lat: f64,
}

fn default_lon_column() -> String {
    "longitude".to_string()
}

fn default_lat_column() -> String {
    "latitude".to_string()
}

impl AreaConfig {
    /// 点是否落在区域内，非有限坐标视为区域外
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [self.min_lon, self.max_lon, self.min_lat, self.max_lat];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(ConfigError::invalid_value(
                "eval_set.area",
                format!("{:?}", bounds),
                "bounds must be finite",
            ));
        }
        if self.min_lon >= self.max_lon || self.min_lat >= self.max_lat {
            return Err(ConfigError::invalid_value(
                "eval_set.area",
                format!("{:?}", bounds),
                "minimum must be below maximum",
            ));
        }
        if self.lon_column.trim().is_empty() || self.lat_column.trim().is_empty() {
            return Err(ConfigError::Missing("eval_set.area coordinate columns".to_string()));
        }
        Ok(())
    }
}

/// 部分子集定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialSubsetConfig {
    /// 子集站点
    #[serde(default)]
    pub locations: Vec<String>,

    /// 子集时间区间 `[start, end)`
    pub time: TimeRange,
}

impl EvalConfig {
    /// 从 JSON 文件加载并校验
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 字符串加载并校验
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: EvalConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 解析时间窗口
    ///
    /// 缺省或零时长返回 `None`（使用全部历史）。
    pub fn window(&self) -> Result<Option<Duration>, ConfigError> {
        let Some(raw) = self.window.as_deref() else {
            return Ok(None);
        };
        let duration = parse_duration(raw)
            .map_err(|e| ConfigError::invalid_value("window", raw, e.to_string()))?;
        if duration < Duration::zero() {
            return Err(ConfigError::invalid_value("window", raw, "window must not be negative"));
        }
        Ok((duration != Duration::zero()).then_some(duration))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.trim().is_empty() {
            return Err(ConfigError::Missing("target".to_string()));
        }

        self.interpolator.validate().map_err(|e| {
            ConfigError::invalid_value("interpolator", self.interpolator.dimensions.join(","), e.to_string())
        })?;

        if self.interpolator.dimensions.iter().any(|d| d == &self.target) {
            return Err(ConfigError::invalid_value(
                "interpolator.dimensions",
                &self.target,
                "target column cannot also be a dimension",
            ));
        }

        self.window()?;

        if let Some(frac) = self.eval_frac {
            if !(frac.is_finite() && frac > 0.0) {
                return Err(ConfigError::invalid_value("eval_frac", frac, "must be a positive number"));
            }
            if frac > 1.0 && frac.fract() != 0.0 {
                return Err(ConfigError::invalid_value("eval_frac", frac, "must be a whole number of instants when greater than 1"));
            }
        }

        if self.support.min_instant_rows == 0 {
            return Err(ConfigError::invalid_value("support.min_instant_rows", 0, "must be at least 1"));
        }
        if self.support.min_slice_rows == 0 {
            return Err(ConfigError::invalid_value("support.min_slice_rows", 0, "must be at least 1"));
        }

        if self.eval_set.locations.is_empty() && self.eval_set.time.is_none() {
            return Err(ConfigError::Missing("eval_set.locations or eval_set.time".to_string()));
        }
        if let Some(range) = self.eval_set.time {
            check_range("eval_set.time", range)?;
        }
        if let Some(area) = &self.eval_set.area {
            area.validate()?;
        }
        for (name, subset) in &self.eval_set.partial {
            check_range(&format!("eval_set.partial.{}.time", name), subset.time)?;
        }

        Ok(())
    }
}

fn check_range(key: &str, range: TimeRange) -> Result<(), ConfigError> {
    if range.start >= range.end {
        return Err(ConfigError::invalid_value(
            key,
            format!("{} .. {}", range.start, range.end),
            "start must precede end",
        ));
    }
    Ok(())
}
