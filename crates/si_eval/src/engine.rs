// crates/si_eval/src/engine.rs

//! 评估引擎
//!
//! 把校验过的配置解析成 [`EngineSettings`]，并驱动完整的评估流程：
//!
//! ```text
//! Split ─> 去除目标缺失行 ─> 训练时刻支撑过滤 ─> 时刻采样
//!       ─> 切片/拟合/预测（分块并行） ─> 与真值连接 ─> 指标聚合 ─> 报告
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use si_config::{ChunkFailurePolicy, EvalConfig, SupportConfig};
use si_foundation::{LocationId, Timestamp};
use si_interp::{build_interpolator, has_temporal_dimension, Interpolator};

use crate::aggregator::{
    global_metrics, metrics_by_location, metrics_by_time, partial_metrics, LocationsByTime,
    PartialSubset,
};
use crate::dispatcher::{ChunkedDispatcher, DispatchSettings};
use crate::error::{EvalError, EvalResult};
use crate::evaluator::InstantEvaluator;
use crate::events::{EvalEvent, EventDispatcher, EventListener};
use crate::report::{EvaluationReport, InstantRecord, OutcomeCounts, RunId, RunInfo, RunSummary};
use crate::results::EvaluationTable;
use crate::sampling::select_instants;
use crate::slicer::{DimensionSource, EvalMode, SliceSettings, WindowedSlicer};
use crate::split::Split;
use crate::table::ObservationTable;

/// 引擎设置（由配置一次性解析）
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// 运行名称
    pub name: String,
    /// 目标列
    pub target: String,
    /// 维度列
    pub dimensions: Vec<String>,
    /// 评估模式
    pub mode: EvalMode,
    /// 并行度
    pub n_jobs: usize,
    /// 时刻采样参数
    pub eval_frac: Option<f64>,
    /// 采样种子
    pub seed: u64,
    /// 支撑阈值
    pub support: SupportConfig,
    /// 分块失败策略
    pub chunk_failure: ChunkFailurePolicy,
    /// 部分子集
    pub partial: Vec<PartialSubset>,
}

impl EngineSettings {
    /// 由配置解析
    pub fn from_config(config: &EvalConfig) -> EvalResult<Self> {
        config.validate()?;
        let window = config.window()?;
        Ok(Self {
            name: config.name.clone(),
            target: config.target.clone(),
            dimensions: config.interpolator.dimensions.clone(),
            mode: EvalMode::resolve(&config.interpolator.dimensions, window),
            n_jobs: config.n_jobs,
            eval_frac: config.eval_frac,
            seed: config.seed,
            support: config.support,
            chunk_failure: config.chunk_failure,
            partial: PartialSubset::from_config(&config.eval_set),
        })
    }

    /// 以默认阈值创建
    pub fn new(name: impl Into<String>, target: impl Into<String>, dimensions: Vec<String>, mode: EvalMode) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            dimensions,
            mode,
            n_jobs: 1,
            eval_frac: None,
            seed: 0,
            support: SupportConfig::default(),
            chunk_failure: ChunkFailurePolicy::default(),
            partial: Vec::new(),
        }
    }

    /// 设置并行度
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// 设置支撑阈值
    pub fn with_support(mut self, support: SupportConfig) -> Self {
        self.support = support;
        self
    }

    /// 设置分块失败策略
    pub fn with_chunk_failure(mut self, policy: ChunkFailurePolicy) -> Self {
        self.chunk_failure = policy;
        self
    }

    /// 设置时刻采样
    pub fn with_sampling(mut self, eval_frac: Option<f64>, seed: u64) -> Self {
        self.eval_frac = eval_frac;
        self.seed = seed;
        self
    }

    /// 设置部分子集
    pub fn with_partial(mut self, partial: Vec<PartialSubset>) -> Self {
        self.partial = partial;
        self
    }
}

/// 评估引擎
pub struct EvaluationEngine {
    settings: EngineSettings,
    interpolator: Box<dyn Interpolator>,
    events: Arc<EventDispatcher>,
}

impl EvaluationEngine {
    /// 创建引擎
    pub fn new(settings: EngineSettings, interpolator: Box<dyn Interpolator>) -> Self {
        Self {
            settings,
            interpolator,
            events: Arc::new(EventDispatcher::new()),
        }
    }

    /// 由配置创建引擎（构建插值器）
    pub fn from_config(config: &EvalConfig) -> EvalResult<Self> {
        let settings = EngineSettings::from_config(config)?;
        let interpolator = build_interpolator(&config.interpolator)?;
        Ok(Self::new(settings, interpolator))
    }

    /// 添加事件监听器
    pub fn with_listener(self, listener: Arc<dyn EventListener>) -> Self {
        self.events.add_listener(listener);
        self
    }

    /// 事件分发器
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// 引擎设置
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// 检查插值器维度、评估模式与所需列，在任何拟合之前失败
    pub fn check_columns(&self, split: &Split) -> EvalResult<()> {
        let dimensions = self.interpolator.dimensions();
        if dimensions != self.settings.dimensions.as_slice() {
            return Err(EvalError::DimensionMismatch {
                settings: self.settings.dimensions.clone(),
                interpolator: dimensions.to_vec(),
            });
        }
        if self.settings.mode.is_temporal() != has_temporal_dimension(dimensions) {
            return Err(EvalError::ModeMismatch {
                mode: self.settings.mode.to_string(),
                dimensions: dimensions.to_vec(),
            });
        }

        for (table, name) in [(&split.train, "train"), (&split.test, "test")] {
            if table.column_index(&self.settings.target).is_none() {
                return Err(EvalError::missing_column(&self.settings.target, name));
            }
            for dim in dimensions {
                DimensionSource::resolve(table, dim, name)?;
            }
        }
        Ok(())
    }

    /// 执行评估
    pub fn run(&self, split: &Split) -> EvalResult<EvaluationReport> {
        self.check_columns(split)?;

        let run_id = RunId::new();
        let started_at = Utc::now();
        let target = self.settings.target.as_str();

        let mut train = split.train.clone();
        let mut test = split.test.clone();
        let dropped_train = train.drop_missing(target)?;
        let dropped_test = test.drop_missing(target)?;
        tracing::debug!(dropped_train, dropped_test, "dropped rows with missing target");

        let train = filter_supported_instants(&train, self.settings.support.min_instant_rows);
        let train_times = train.times();
        let test_times = test.times();
        let instants = select_instants(&test_times, self.settings.eval_frac, self.settings.seed);

        tracing::info!(
            run = %run_id,
            interpolator = self.interpolator.name(),
            mode = %self.settings.mode,
            num_train_instants = train_times.len(),
            num_test_instants = test_times.len(),
            num_evaluated_instants = instants.len(),
            "starting evaluation"
        );

        let dispatch = DispatchSettings {
            n_jobs: self.settings.n_jobs,
            policy: self.settings.chunk_failure,
        };
        self.events.emit(EvalEvent::RunStarted {
            run_id,
            name: self.settings.name.clone(),
            n_instants: instants.len(),
            n_chunks: dispatch.n_chunks(),
        });

        let slice_settings = SliceSettings {
            dimensions: self.settings.dimensions.clone(),
            target: self.settings.target.clone(),
            mode: self.settings.mode,
            min_slice_rows: self.settings.support.min_slice_rows,
        };
        let slicer = WindowedSlicer::new(&train, &test, &slice_settings)?;
        let evaluator = InstantEvaluator::new(self.interpolator.as_ref(), &slicer, target);

        let eval_start = Instant::now();
        let results = ChunkedDispatcher::new(dispatch, &self.events, run_id)
            .dispatch(&instants, |t| evaluator.evaluate(t))?;
        let eval_seconds = eval_start.elapsed().as_secs_f64();

        let table = EvaluationTable::join(&results, &test, target)?;
        let eval_locations: BTreeSet<LocationId> = test.locations();

        let summary = RunSummary {
            num_train_instants: train_times.len(),
            num_test_instants: test_times.len(),
            num_evaluated_instants: instants.len(),
            eval_frac: self.settings.eval_frac.unwrap_or(1.0),
            prop_train_instants_to_obs: ratio(train_times.len(), train.len()),
            prop_test_instants_to_obs: ratio(instants.len(), test.len()),
            num_evaluated_points: table.len(),
            eval_seconds,
            outcomes: OutcomeCounts::from_results(&results),
            locations_by_time: vec![
                LocationsByTime::from_table("train", &train),
                LocationsByTime::from_table("test", &test),
            ],
        };
        log_outcomes(&summary);

        let report = EvaluationReport {
            run: RunInfo {
                id: run_id,
                name: self.settings.name.clone(),
                interpolator: self.interpolator.name().to_string(),
                dimensions: self.settings.dimensions.clone(),
                target: self.settings.target.clone(),
                mode: self.settings.mode.to_string(),
                n_jobs: self.settings.n_jobs,
                started_at,
                finished_at: Utc::now(),
            },
            global: global_metrics(&table),
            by_location: metrics_by_location(&table, &eval_locations),
            by_time: metrics_by_time(&table),
            partial: partial_metrics(&table, &self.settings.partial),
            instants: results.iter().map(InstantRecord::from).collect(),
            summary,
            table,
        };

        self.events.emit(EvalEvent::RunCompleted {
            run_id,
            duration_secs: (report.run.finished_at - started_at).num_milliseconds() as f64 / 1000.0,
            n_points: report.table.len(),
        });
        Ok(report)
    }
}

impl std::fmt::Debug for EvaluationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationEngine")
            .field("settings", &self.settings)
            .field("interpolator", &self.interpolator.name())
            .field("events", &self.events)
            .finish()
    }
}

/// 剔除训练行数少于 `min_rows` 的时刻
pub fn filter_supported_instants(train: &ObservationTable, min_rows: usize) -> ObservationTable {
    let supported: BTreeSet<Timestamp> = train
        .count_by_time()
        .into_iter()
        .filter(|&(_, n)| n >= min_rows)
        .map(|(t, _)| t)
        .collect();
    train.filter(|k, _| supported.contains(&k.time))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn log_outcomes(summary: &RunSummary) {
    let outcomes = &summary.outcomes;
    tracing::info!(
        done = outcomes.done,
        skipped = outcomes.total_skipped(),
        failed = outcomes.total_failed(),
        num_evaluated_points = summary.num_evaluated_points,
        time_to_eval = summary.eval_seconds,
        "evaluation finished"
    );
    if outcomes.total_failed() > 0 {
        tracing::warn!(failed = ?outcomes.failed, "some instants failed");
    }
}
