// crates/si_eval/src/evaluator.rs

//! 单时刻评估器
//!
//! 每个评估时刻经历一次独立的拟合-预测循环：
//!
//! ```text
//! Pending ─┬─> Skipped                (切片无效)
//!          └─> Fitting ─┬─> Failed    (拟合失败)
//!                       └─> Predicting ─┬─> Failed  (预测失败)
//!                                       └─> Done
//! ```
//!
//! 拟合是值语义的，每个时刻都从全新的拟合开始，时刻之间不共享状态。
//! 拟合或预测的错误被捕获、记录为 `warn` 日志，并以
//! [`InstantOutcome::Failed`] 返回，不会中止整次运行。

use serde::{Deserialize, Serialize};
use si_foundation::{LocationId, Timestamp};
use si_interp::Interpolator;

use crate::slicer::{SkipReason, SliceOutcome, WindowedSlicer};

/// 时刻状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstantStatus {
    /// 等待中
    Pending,
    /// 拟合中
    Fitting,
    /// 预测中
    Predicting,
    /// 已完成
    Done,
    /// 已跳过
    Skipped,
    /// 失败
    Failed,
}

impl InstantStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Failed)
    }
}

impl std::fmt::Display for InstantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Fitting => "Fitting",
            Self::Predicting => "Predicting",
            Self::Done => "Done",
            Self::Skipped => "Skipped",
            Self::Failed => "Failed",
        };
        write!(f, "{}", s)
    }
}

/// 失败阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// 切片构建
    Slice,
    /// 拟合
    Fit,
    /// 预测
    Predict,
    /// 工作线程崩溃
    Worker,
}

impl FailureStage {
    /// 阶段代码（用于计数）
    pub fn code(&self) -> &'static str {
        match self {
            Self::Slice => "slice",
            Self::Fit => "fit",
            Self::Predict => "predict",
            Self::Worker => "worker",
        }
    }
}

/// 失败原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    /// 失败阶段
    pub stage: FailureStage,
    /// 错误信息
    pub message: String,
}

/// 单个时刻的预测
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionFrame {
    /// 评估时刻
    pub time: Timestamp,
    /// 预测站点（与 `y_pred` 一一对应）
    pub locations: Vec<LocationId>,
    /// 预测值，无法预测的位置为 `NaN`
    pub y_pred: Vec<f64>,
}

impl PredictionFrame {
    /// 预测行数
    pub fn len(&self) -> usize {
        self.y_pred.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.y_pred.is_empty()
    }
}

/// 单个时刻的评估结果
#[derive(Debug, Clone, PartialEq)]
pub enum InstantOutcome {
    /// 完成
    Done(PredictionFrame),
    /// 跳过
    Skipped(SkipReason),
    /// 失败
    Failed(FailureReason),
}

impl InstantOutcome {
    /// 对应的终止状态
    pub fn status(&self) -> InstantStatus {
        match self {
            Self::Done(_) => InstantStatus::Done,
            Self::Skipped(_) => InstantStatus::Skipped,
            Self::Failed(_) => InstantStatus::Failed,
        }
    }

    /// 预测（仅 `Done`）
    pub fn predictions(&self) -> Option<&PredictionFrame> {
        match self {
            Self::Done(frame) => Some(frame),
            _ => None,
        }
    }

    fn failed(stage: FailureStage, message: impl Into<String>) -> Self {
        Self::Failed(FailureReason {
            stage,
            message: message.into(),
        })
    }
}

/// 带来源信息的时刻结果
#[derive(Debug, Clone, PartialEq)]
pub struct InstantResult {
    /// 评估时刻
    pub time: Timestamp,
    /// 所在分块序号
    pub chunk: usize,
    /// 结果
    pub outcome: InstantOutcome,
}

/// 单时刻评估器
pub struct InstantEvaluator<'a> {
    interpolator: &'a dyn Interpolator,
    slicer: &'a WindowedSlicer<'a>,
    target: &'a str,
}

impl<'a> InstantEvaluator<'a> {
    /// 创建评估器
    pub fn new(interpolator: &'a dyn Interpolator, slicer: &'a WindowedSlicer<'a>, target: &'a str) -> Self {
        Self {
            interpolator,
            slicer,
            target,
        }
    }

    /// 评估一个时刻
    pub fn evaluate(&self, t: Timestamp) -> InstantOutcome {
        let name = self.interpolator.name();

        let slice = match self.slicer.slice(t) {
            Ok(SliceOutcome::Ready(slice)) => slice,
            Ok(SliceOutcome::Skip(reason)) => {
                tracing::debug!(instant = %t, %reason, "instant skipped");
                return InstantOutcome::Skipped(reason);
            }
            Err(e) => {
                tracing::warn!(interpolator = name, instant = %t, error = %e, "failed to build slice");
                return InstantOutcome::failed(FailureStage::Slice, e.to_string());
            }
        };

        tracing::trace!(instant = %t, status = %InstantStatus::Fitting, rows = slice.train.n_rows());
        let model = match self.interpolator.fit(&slice.train, self.target) {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!(interpolator = name, instant = %t, error = %e, "failed to fit interpolator");
                return InstantOutcome::failed(FailureStage::Fit, e.to_string());
            }
        };

        tracing::trace!(instant = %t, status = %InstantStatus::Predicting, rows = slice.test.n_rows());
        let y_pred = match model.predict(&slice.test) {
            Ok(y) => y,
            Err(e) => {
                tracing::warn!(interpolator = name, instant = %t, error = %e, "failed to predict");
                return InstantOutcome::failed(FailureStage::Predict, e.to_string());
            }
        };

        if y_pred.len() != slice.test_locations.len() {
            let message = format!(
                "prediction length {} does not match {} test rows",
                y_pred.len(),
                slice.test_locations.len()
            );
            tracing::warn!(interpolator = name, instant = %t, "{}", message);
            return InstantOutcome::failed(FailureStage::Predict, message);
        }

        tracing::debug!(instant = %t, n_pred = y_pred.len(), n_train = model.n_samples(), "instant done");
        InstantOutcome::Done(PredictionFrame {
            time: t,
            locations: slice.test_locations,
            y_pred,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slicer::{EvalMode, SliceSettings};
    use crate::table::{ObsKey, ObservationTable};
    use chrono::{TimeZone, Utc};
    use si_interp::{FittedModel, Frame, InterpError, InterpResult, MeanInterpolator};

    fn ts(h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2021, 1, 1, h, 0, 0).unwrap()
    }

    fn tables() -> (ObservationTable, ObservationTable) {
        let cols = vec!["x".to_string(), "v".to_string()];
        let mut train = ObservationTable::new(cols.clone());
        let mut test = ObservationTable::new(cols);
        for (i, loc) in ["a", "b", "c"].iter().enumerate() {
            train.insert(ObsKey::new(ts(0), *loc), vec![i as f64, 3.0 * i as f64]).unwrap();
        }
        train.insert(ObsKey::new(ts(1), "a"), vec![0.0, 0.0]).unwrap();
        test.insert(ObsKey::new(ts(0), "z"), vec![1.5, 0.0]).unwrap();
        test.insert(ObsKey::new(ts(0), "y"), vec![0.5, 0.0]).unwrap();
        test.insert(ObsKey::new(ts(1), "z"), vec![1.5, 0.0]).unwrap();
        (train, test)
    }

    fn settings() -> SliceSettings {
        SliceSettings {
            dimensions: vec!["x".to_string()],
            target: "v".to_string(),
            mode: EvalMode::Spatial,
            min_slice_rows: 3,
        }
    }

    struct Broken {
        dims: Vec<String>,
        fail_fit: bool,
    }

    struct ShortModel;

    impl FittedModel for ShortModel {
        fn predict(&self, _frame: &Frame) -> InterpResult<Vec<f64>> {
            Ok(vec![1.0])
        }

        fn n_samples(&self) -> usize {
            0
        }
    }

    impl Interpolator for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn dimensions(&self) -> &[String] {
            &self.dims
        }

        fn fit(&self, _frame: &Frame, _target: &str) -> InterpResult<Box<dyn FittedModel>> {
            if self.fail_fit {
                Err(InterpError::invalid_parameter("fit", "always fails"))
            } else {
                Ok(Box::new(ShortModel))
            }
        }
    }

    #[test]
    fn test_done_with_predictions_in_test_order() {
        let (train, test) = tables();
        let s = settings();
        let slicer = WindowedSlicer::new(&train, &test, &s).unwrap();
        let interp = MeanInterpolator::new(vec!["x".to_string()]);
        let evaluator = InstantEvaluator::new(&interp, &slicer, "v");

        let outcome = evaluator.evaluate(ts(0));
        assert_eq!(outcome.status(), InstantStatus::Done);
        let frame = outcome.predictions().unwrap();
        assert_eq!(frame.locations, vec![LocationId::new("y"), LocationId::new("z")]);
        assert_eq!(frame.y_pred, vec![3.0, 3.0]);
    }

    #[test]
    fn test_skip_is_not_failure() {
        let (train, test) = tables();
        let s = settings();
        let slicer = WindowedSlicer::new(&train, &test, &s).unwrap();
        let interp = MeanInterpolator::new(vec!["x".to_string()]);
        let evaluator = InstantEvaluator::new(&interp, &slicer, "v");

        let outcome = evaluator.evaluate(ts(1));
        assert!(matches!(outcome, InstantOutcome::Skipped(SkipReason::InsufficientSupport { .. })));
        assert!(outcome.status().is_terminal());
    }

    #[test]
    fn test_fit_failure_is_captured() {
        let (train, test) = tables();
        let s = settings();
        let slicer = WindowedSlicer::new(&train, &test, &s).unwrap();
        let interp = Broken { dims: vec!["x".to_string()], fail_fit: true };
        let outcome = InstantEvaluator::new(&interp, &slicer, "v").evaluate(ts(0));
        match outcome {
            InstantOutcome::Failed(reason) => {
                assert_eq!(reason.stage, FailureStage::Fit);
                assert!(reason.message.contains("always fails"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_length_mismatch_is_predict_failure() {
        let (train, test) = tables();
        let s = settings();
        let slicer = WindowedSlicer::new(&train, &test, &s).unwrap();
        let interp = Broken { dims: vec!["x".to_string()], fail_fit: false };
        let outcome = InstantEvaluator::new(&interp, &slicer, "v").evaluate(ts(0));
        assert!(matches!(
            outcome,
            InstantOutcome::Failed(FailureReason { stage: FailureStage::Predict, .. })
        ));
    }

    #[test]
    fn test_status_terminality() {
        assert!(!InstantStatus::Pending.is_terminal());
        assert!(!InstantStatus::Fitting.is_terminal());
        assert!(!InstantStatus::Predicting.is_terminal());
        assert!(InstantStatus::Done.is_terminal());
    }
}
