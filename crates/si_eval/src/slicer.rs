// crates/si_eval/src/slicer.rs

//! 时间窗口切片器
//!
//! 对每个评估时刻 `t` 构建训练与测试子集：
//!
//! - 空间模式：训练行为 `time == t` 的行
//! - 时空模式：训练行为 `time ∈ [t-Δ, t]` 的行（两端包含）；
//!   没有窗口时为所有 `time ≤ t` 的训练行
//!
//! 切片只依赖完整的训练表，与其他时刻的结果无关，
//! 因此不同时刻可以任意顺序、任意线程上构建。

use chrono::Duration;
use serde::{Deserialize, Serialize};
use si_foundation::{LocationId, Timestamp};
use si_interp::{has_temporal_dimension, Frame};

use crate::error::{EvalError, EvalResult};
use crate::table::ObservationTable;

/// 评估模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// 仅使用锚定时刻的训练行
    Spatial,
    /// 使用尾随时间窗口内的训练行
    SpatioTemporal {
        /// 窗口长度，`None` 表示使用全部历史
        window: Option<Duration>,
    },
}

impl EvalMode {
    /// 由维度与窗口解析模式：维度含 `time`/`time_step` 时为时空模式
    pub fn resolve<S: AsRef<str>>(dimensions: &[S], window: Option<Duration>) -> Self {
        if has_temporal_dimension(dimensions) {
            Self::SpatioTemporal { window }
        } else {
            Self::Spatial
        }
    }

    /// 是否为时空模式
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::SpatioTemporal { .. })
    }

    /// 锚定时刻 `t` 的窗口下界（包含），`None` 表示无下界
    ///
    /// 窗口越过可表示的最早时刻时视为无下界。
    pub fn lower_bound(&self, t: Timestamp) -> Option<Timestamp> {
        match *self {
            Self::Spatial => Some(t),
            Self::SpatioTemporal { window } => window.and_then(|w| t.checked_sub_signed(w)),
        }
    }
}

impl std::fmt::Display for EvalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spatial => write!(f, "spatial"),
            Self::SpatioTemporal { window: Some(w) } => {
                write!(f, "spatio-temporal (window {}s)", w.num_seconds())
            }
            Self::SpatioTemporal { window: None } => write!(f, "spatio-temporal (full history)"),
        }
    }
}

/// 维度列的取值来源
///
/// 表中不存在的 `time_step`/`time` 维度由观测时刻派生：
/// `time_step` 为 Unix 纪元以来的小时数，`time` 为秒数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionSource {
    /// 表中的列
    Column(usize),
    /// 纪元以来的小时数
    EpochHours,
    /// 纪元以来的秒数
    EpochSeconds,
}

impl DimensionSource {
    /// 在表中解析维度
    pub fn resolve(table: &ObservationTable, name: &str, table_name: &'static str) -> EvalResult<Self> {
        match (table.column_index(name), name) {
            (Some(idx), _) => Ok(Self::Column(idx)),
            (None, "time_step") => Ok(Self::EpochHours),
            (None, "time") => Ok(Self::EpochSeconds),
            (None, _) => Err(EvalError::missing_column(name, table_name)),
        }
    }

    #[inline]
    fn value(&self, time: Timestamp, row: &[f64]) -> f64 {
        match *self {
            Self::Column(idx) => row[idx],
            Self::EpochHours => time.timestamp_millis() as f64 / 3_600_000.0,
            Self::EpochSeconds => time.timestamp_millis() as f64 / 1_000.0,
        }
    }
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// 训练表中没有该时刻
    NotInTraining,
    /// 锚定时刻训练行数不足
    InsufficientSupport {
        /// 实际行数
        rows: usize,
        /// 所需行数
        required: usize,
    },
    /// 该时刻没有测试行
    NoTestRows,
}

impl SkipReason {
    /// 原因代码（用于计数）
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInTraining => "not_in_training",
            Self::InsufficientSupport { .. } => "insufficient_support",
            Self::NoTestRows => "no_test_rows",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInTraining => write!(f, "instant not present in training data"),
            Self::InsufficientSupport { rows, required } => {
                write!(f, "{} training rows at instant, need {}", rows, required)
            }
            Self::NoTestRows => write!(f, "no test rows at instant"),
        }
    }
}

/// 一个评估时刻的训练/测试切片
#[derive(Debug, Clone)]
pub struct WindowedSlice {
    /// 锚定时刻
    pub time: Timestamp,
    /// 训练表，列为 `dimensions + [target]`
    pub train: Frame,
    /// 测试表，列为 `dimensions`
    pub test: Frame,
    /// 测试行对应的站点（与 `test` 行序一致）
    pub test_locations: Vec<LocationId>,
    /// 实际使用的窗口下界（包含），`None` 表示无下界
    pub window_start: Option<Timestamp>,
}

/// 切片结果
#[derive(Debug, Clone)]
pub enum SliceOutcome {
    /// 可拟合
    Ready(WindowedSlice),
    /// 跳过
    Skip(SkipReason),
}

/// 切片设置
#[derive(Debug, Clone)]
pub struct SliceSettings {
    /// 维度列
    pub dimensions: Vec<String>,
    /// 目标列
    pub target: String,
    /// 评估模式
    pub mode: EvalMode,
    /// 锚定时刻的最少训练行数
    pub min_slice_rows: usize,
}

/// 时间窗口切片器
///
/// 借用训练表与测试表，本身只读，可在线程间共享。
#[derive(Debug)]
pub struct WindowedSlicer<'a> {
    train: &'a ObservationTable,
    test: &'a ObservationTable,
    settings: &'a SliceSettings,
    train_dims: Vec<DimensionSource>,
    test_dims: Vec<DimensionSource>,
    target_idx: usize,
}

impl<'a> WindowedSlicer<'a> {
    /// 创建切片器，缺列时返回错误
    pub fn new(
        train: &'a ObservationTable,
        test: &'a ObservationTable,
        settings: &'a SliceSettings,
    ) -> EvalResult<Self> {
        let resolve = |table: &ObservationTable, name: &'static str| {
            settings
                .dimensions
                .iter()
                .map(|d| DimensionSource::resolve(table, d, name))
                .collect::<EvalResult<Vec<_>>>()
        };
        let train_dims = resolve(train, "train")?;
        let test_dims = resolve(test, "test")?;
        let target_idx = train
            .column_index(&settings.target)
            .ok_or_else(|| EvalError::missing_column(&settings.target, "train"))?;

        Ok(Self {
            train,
            test,
            settings,
            train_dims,
            test_dims,
            target_idx,
        })
    }

    /// 评估模式
    pub fn mode(&self) -> EvalMode {
        self.settings.mode
    }

    /// 构建时刻 `t` 的切片
    pub fn slice(&self, t: Timestamp) -> EvalResult<SliceOutcome> {
        let anchor_rows = self.train.count_at(t);
        if anchor_rows == 0 {
            return Ok(SliceOutcome::Skip(SkipReason::NotInTraining));
        }
        if anchor_rows < self.settings.min_slice_rows {
            return Ok(SliceOutcome::Skip(SkipReason::InsufficientSupport {
                rows: anchor_rows,
                required: self.settings.min_slice_rows,
            }));
        }

        let mut train_cols = self.settings.dimensions.clone();
        train_cols.push(self.settings.target.clone());
        let window_start = self.settings.mode.lower_bound(t);

        let mut train = Frame::new(train_cols);
        let mut row_buf = Vec::with_capacity(self.train_dims.len() + 1);
        for (key, row) in self.train.rows_between(window_start, t) {
            row_buf.clear();
            row_buf.extend(self.train_dims.iter().map(|d| d.value(key.time, row)));
            row_buf.push(row[self.target_idx]);
            train.push_row(&row_buf)?;
        }

        let mut test = Frame::new(self.settings.dimensions.clone());
        let mut test_locations = Vec::new();
        for (key, row) in self.test.rows_at(t) {
            row_buf.clear();
            row_buf.extend(self.test_dims.iter().map(|d| d.value(key.time, row)));
            test.push_row(&row_buf)?;
            test_locations.push(key.location.clone());
        }
        if test_locations.is_empty() {
            return Ok(SliceOutcome::Skip(SkipReason::NoTestRows));
        }

        Ok(SliceOutcome::Ready(WindowedSlice {
            time: t,
            train,
            test,
            test_locations,
            window_start,
        }))
    }
}
