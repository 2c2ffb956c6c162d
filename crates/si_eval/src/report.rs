// crates/si_eval/src/report.rs

//! 运行标识与评估报告

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use si_foundation::{SiError, SiResult, Timestamp};
use uuid::Uuid;

use crate::aggregator::{LocationMetrics, LocationsByTime, PartialMetrics, TimeMetrics};
use crate::evaluator::{FailureReason, InstantOutcome, InstantResult, InstantStatus};
use crate::metrics::MetricSet;
use crate::results::EvaluationTable;
use crate::slicer::SkipReason;

/// 运行ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// 创建新的运行ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// 获取内部UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// 运行信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// 运行ID
    pub id: RunId,
    /// 运行名称
    pub name: String,
    /// 插值器名称
    pub interpolator: String,
    /// 插值维度
    pub dimensions: Vec<String>,
    /// 目标列
    pub target: String,
    /// 评估模式
    pub mode: String,
    /// 并行度
    pub n_jobs: usize,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 结束时间
    pub finished_at: DateTime<Utc>,
}

/// 各终止状态的时刻计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// 完成数
    pub done: usize,
    /// 按原因的跳过数
    pub skipped: BTreeMap<String, usize>,
    /// 按阶段的失败数
    pub failed: BTreeMap<String, usize>,
}

impl OutcomeCounts {
    /// 统计时刻结果
    pub fn from_results(results: &[InstantResult]) -> Self {
        let mut counts = Self::default();
        for r in results {
            match &r.outcome {
                InstantOutcome::Done(_) => counts.done += 1,
                InstantOutcome::Skipped(reason) => {
                    *counts.skipped.entry(reason.code().to_string()).or_insert(0) += 1;
                }
                InstantOutcome::Failed(reason) => {
                    *counts.failed.entry(reason.stage.code().to_string()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// 跳过总数
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    /// 失败总数
    pub fn total_failed(&self) -> usize {
        self.failed.values().sum()
    }
}

/// 运行摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 训练集可用时刻数（支撑过滤后）
    pub num_train_instants: usize,
    /// 测试集时刻数
    pub num_test_instants: usize,
    /// 实际评估的时刻数（采样后）
    pub num_evaluated_instants: usize,
    /// 采样参数
    pub eval_frac: f64,
    /// 训练时刻数 / 训练观测数
    pub prop_train_instants_to_obs: f64,
    /// 评估时刻数（采样后） / 测试观测数
    pub prop_test_instants_to_obs: f64,
    /// 结果表行数
    pub num_evaluated_points: usize,
    /// 调度耗时 (秒)
    pub eval_seconds: f64,
    /// 时刻结果计数
    pub outcomes: OutcomeCounts,
    /// 训练/测试集每个时刻的站点数
    pub locations_by_time: Vec<LocationsByTime>,
}

/// 单个时刻的结果记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantRecord {
    /// 评估时刻
    pub time: Timestamp,
    /// 分块序号
    pub chunk: usize,
    /// 终止状态
    pub status: InstantStatus,
    /// 跳过原因
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<SkipReason>,
    /// 失败原因
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    /// 预测行数
    pub n_predictions: usize,
}

impl From<&InstantResult> for InstantRecord {
    fn from(r: &InstantResult) -> Self {
        let (skip, failure, n_predictions) = match &r.outcome {
            InstantOutcome::Done(frame) => (None, None, frame.len()),
            InstantOutcome::Skipped(reason) => (Some(reason.clone()), None, 0),
            InstantOutcome::Failed(reason) => (None, Some(reason.clone()), 0),
        };
        Self {
            time: r.time,
            chunk: r.chunk,
            status: r.outcome.status(),
            skip,
            failure,
            n_predictions,
        }
    }
}

/// 评估报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// 运行信息
    pub run: RunInfo,
    /// 运行摘要
    pub summary: RunSummary,
    /// 全局指标（结果表为空时为 `None`）
    pub global: Option<MetricSet>,
    /// 按站点指标
    pub by_location: Vec<LocationMetrics>,
    /// 按时刻指标
    pub by_time: Vec<TimeMetrics>,
    /// 部分子集指标
    pub partial: Vec<PartialMetrics>,
    /// 每个时刻的结果（按评估顺序）
    pub instants: Vec<InstantRecord>,
    /// 评估结果表
    pub table: EvaluationTable,
}

impl EvaluationReport {
    /// 写出为格式化 JSON
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> SiResult<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| SiError::serialization(e.to_string()))
    }

    /// 从 JSON 文件读取
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SiResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| SiError::serialization(e.to_string()))
    }
}
