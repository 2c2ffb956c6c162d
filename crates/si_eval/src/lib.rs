// crates/si_eval/src/lib.rs

//! 时间窗口插值评估引擎
//!
//! 针对留出的观测评估空间/时空插值器：在每个评估时刻只用该时刻
//! （或其尾随窗口内）可用的训练数据拟合，在测试站点上预测，
//! 再把误差聚合为全局、按站点、按时刻与按部分子集的指标。
//!
//! # 模块结构
//!
//! - [`table`]: 以 `(time, location)` 为主键的观测表
//! - [`split`]: 训练/测试划分
//! - [`sampling`]: 评估时刻采样
//! - [`slicer`]: 时间窗口切片器
//! - [`evaluator`]: 单时刻拟合-预测循环
//! - [`dispatcher`]: 分块并行调度
//! - [`events`]: 进度事件
//! - [`metrics`]: 误差指标
//! - [`results`]: 预测与真值连接后的结果表
//! - [`aggregator`]: 分组指标
//! - [`report`]: 运行标识与报告
//! - [`engine`]: 组装上述组件的引擎
//!
//! # 示例
//!
//! ```rust,ignore
//! use si_config::EvalConfig;
//! use si_eval::{EvaluationEngine, LoggingListener, ObservationTable, Split};
//! use std::sync::Arc;
//!
//! let config = EvalConfig::from_json_file("eval.json")?;
//! let table = ObservationTable::from_records(&records)?;
//! let split = Split::from_eval_set(&table, &config.eval_set)?;
//!
//! let engine = EvaluationEngine::from_config(&config)?
//!     .with_listener(Arc::new(LoggingListener::new("eval")));
//! let report = engine.run(&split)?;
//! println!("global rmse: {:?}", report.global.map(|m| m.rmse));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod metrics;
pub mod report;
pub mod results;
pub mod sampling;
pub mod slicer;
pub mod split;
pub mod table;

// 重导出核心类型
pub use aggregator::{LocationMetrics, LocationsByTime, PartialMetrics, PartialSubset, TimeMetrics};
pub use dispatcher::{chunk_ranges, ChunkedDispatcher, DispatchSettings};
pub use engine::{EngineSettings, EvaluationEngine};
pub use error::{EvalError, EvalResult};
pub use evaluator::{
    FailureReason, FailureStage, InstantEvaluator, InstantOutcome, InstantResult, InstantStatus,
    PredictionFrame,
};
pub use events::{EvalEvent, EventDispatcher, EventListener, LoggingListener};
pub use metrics::MetricSet;
pub use report::{EvaluationReport, InstantRecord, OutcomeCounts, RunId, RunInfo, RunSummary};
pub use results::{EvalRow, EvaluationTable};
pub use slicer::{EvalMode, SkipReason, SliceOutcome, SliceSettings, WindowedSlice, WindowedSlicer};
pub use split::{within_area, Split};
pub use table::{ObsKey, ObservationRecord, ObservationTable};
