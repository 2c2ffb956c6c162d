// crates/si_eval/src/results.rs

//! 评估结果表
//!
//! 所有时刻的预测拼接后与测试集真值按 `(time, location)` 连接；
//! 没有真值（缺失或 `NaN`）或预测为 `NaN` 的行被丢弃。

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use si_foundation::{LocationId, SiError, SiResult, Timestamp};

use crate::evaluator::InstantResult;
use crate::metrics::MetricSet;
use crate::table::{ObsKey, ObservationTable};

/// 评估集名称
pub const EVAL_SET: &str = "eval";

/// 结果表中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRow {
    /// 评估时刻
    pub time: Timestamp,
    /// 站点
    pub location_id: LocationId,
    /// 预测值
    pub y_pred: f64,
    /// 真值
    pub y_true: f64,
    /// 所属集合
    pub set: String,
}

/// 评估结果表，按 `(time, location)` 排序且主键唯一
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTable {
    rows: Vec<EvalRow>,
}

impl EvaluationTable {
    /// 把预测与测试真值连接
    ///
    /// 同一主键出现两次预测时返回 `DuplicateKey` 错误。
    pub fn join(results: &[InstantResult], test: &ObservationTable, target: &str) -> SiResult<Self> {
        let target_idx = test.require_column(target)?;

        let mut seen: BTreeSet<ObsKey> = BTreeSet::new();
        let mut joined: BTreeMap<ObsKey, (f64, f64)> = BTreeMap::new();
        for frame in results.iter().filter_map(|r| r.outcome.predictions()) {
            for (location, &y_pred) in frame.locations.iter().zip(&frame.y_pred) {
                let key = ObsKey::new(frame.time, location.clone());
                if !seen.insert(key.clone()) {
                    return Err(SiError::duplicate_key(key.to_string()));
                }
                let Some(y_true) = test.value(&key, target_idx) else {
                    continue;
                };
                if y_true.is_finite() && y_pred.is_finite() {
                    joined.insert(key, (y_pred, y_true));
                }
            }
        }

        let rows = joined
            .into_iter()
            .map(|(key, (y_pred, y_true))| EvalRow {
                time: key.time,
                location_id: key.location,
                y_pred,
                y_true,
                set: EVAL_SET.to_string(),
            })
            .collect();
        Ok(Self { rows })
    }

    /// 所有行
    pub fn rows(&self) -> &[EvalRow] {
        &self.rows
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 对满足条件的行计算指标
    pub fn metrics_where<F>(&self, mut keep: F) -> Option<MetricSet>
    where
        F: FnMut(&EvalRow) -> bool,
    {
        let (y_true, y_pred): (Vec<f64>, Vec<f64>) = self
            .rows
            .iter()
            .filter(|r| keep(r))
            .map(|r| (r.y_true, r.y_pred))
            .unzip();
        MetricSet::compute(&y_true, &y_pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{InstantOutcome, PredictionFrame};
    use crate::slicer::SkipReason;
    use chrono::{TimeZone, Utc};

    fn ts(h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2021, 1, 1, h, 0, 0).unwrap()
    }

    fn test_table() -> ObservationTable {
        let mut t = ObservationTable::new(vec!["v".to_string()]);
        t.insert(ObsKey::new(ts(0), "a"), vec![1.0]).unwrap();
        t.insert(ObsKey::new(ts(0), "b"), vec![f64::NAN]).unwrap();
        t.insert(ObsKey::new(ts(1), "a"), vec![2.0]).unwrap();
        t
    }

    fn done(h: u32, locs: &[&str], preds: &[f64]) -> InstantResult {
        InstantResult {
            time: ts(h),
            chunk: 0,
            outcome: InstantOutcome::Done(PredictionFrame {
                time: ts(h),
                locations: locs.iter().map(|&l| LocationId::new(l)).collect(),
                y_pred: preds.to_vec(),
            }),
        }
    }

    #[test]
    fn test_join_drops_rows_without_truth() {
        let results = vec![
            done(1, &["a"], &[2.5]),
            done(0, &["a", "b", "c"], &[1.5, 1.0, 1.0]),
            InstantResult {
                time: ts(2),
                chunk: 0,
                outcome: InstantOutcome::Skipped(SkipReason::NotInTraining),
            },
        ];
        let table = EvaluationTable::join(&results, &test_table(), "v").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].time, ts(0));
        assert_eq!(table.rows()[0].y_true, 1.0);
        assert_eq!(table.rows()[1].y_pred, 2.5);
        assert!(table.rows().iter().all(|r| r.set == EVAL_SET));
    }

    #[test]
    fn test_join_drops_nan_predictions() {
        let results = vec![done(0, &["a"], &[f64::NAN])];
        let table = EvaluationTable::join(&results, &test_table(), "v").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_join_rejects_duplicate_predictions() {
        let results = vec![done(0, &["a"], &[1.0]), done(0, &["a"], &[1.0])];
        assert!(matches!(
            EvaluationTable::join(&results, &test_table(), "v"),
            Err(SiError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_metrics_where() {
        let results = vec![done(0, &["a"], &[1.5]), done(1, &["a"], &[3.0])];
        let table = EvaluationTable::join(&results, &test_table(), "v").unwrap();
        let all = table.metrics_where(|_| true).unwrap();
        assert_eq!(all.count, 2);
        assert!((all.mae - 0.75).abs() < 1e-12);
        assert!(table.metrics_where(|r| r.time == ts(5)).is_none());
    }
}
