// crates/si_eval/src/aggregator.rs

//! 指标聚合
//!
//! 在评估结果表上计算全局、按站点、按时刻与按部分子集的指标。

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use si_config::EvalSetConfig;
use si_foundation::{LocationId, TimeRange, Timestamp};

use crate::metrics::MetricSet;
use crate::results::{EvalRow, EvaluationTable};
use crate::table::ObservationTable;

/// 单个站点的指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMetrics {
    /// 站点
    pub location_id: LocationId,
    /// 是否属于评估站点集合
    pub is_eval: bool,
    /// 指标
    pub metrics: MetricSet,
}

/// 单个时刻的指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeMetrics {
    /// 评估时刻
    pub time: Timestamp,
    /// 指标
    pub metrics: MetricSet,
}

/// 部分子集定义
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSubset {
    /// 名称
    pub name: String,
    /// 站点集合
    pub locations: BTreeSet<LocationId>,
    /// 时间区间 `[start, end)`
    pub range: TimeRange,
}

impl PartialSubset {
    /// 由评估集配置构建所有部分子集（按名称排序）
    pub fn from_config(eval_set: &EvalSetConfig) -> Vec<Self> {
        eval_set
            .partial
            .iter()
            .map(|(name, cfg)| Self {
                name: name.clone(),
                locations: cfg.locations.iter().map(|l| LocationId::new(l.as_str())).collect(),
                range: cfg.time,
            })
            .collect()
    }

    fn contains(&self, row: &EvalRow) -> bool {
        self.locations.contains(&row.location_id) && self.range.contains(row.time)
    }
}

/// 部分子集的指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialMetrics {
    /// 子集名称
    pub name: String,
    /// 子集站点
    pub locations: Vec<LocationId>,
    /// 起始时刻（包含）
    pub time_start: Timestamp,
    /// 结束时刻（不包含）
    pub time_end: Timestamp,
    /// 命中行数
    pub n_rows: usize,
    /// 指标
    pub metrics: MetricSet,
}

/// 每个时刻的站点数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationsByTime {
    /// 集合名称（train/test）
    pub set: String,
    /// 按时刻排列的站点数
    pub counts: Vec<InstantCount>,
}

/// 某时刻的站点数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantCount {
    /// 时刻
    pub time: Timestamp,
    /// 站点数
    pub locations: usize,
}

impl LocationsByTime {
    /// 统计观测表每个时刻的站点数
    pub fn from_table(set: impl Into<String>, table: &ObservationTable) -> Self {
        Self {
            set: set.into(),
            counts: table
                .count_by_time()
                .into_iter()
                .map(|(time, locations)| InstantCount { time, locations })
                .collect(),
        }
    }
}

/// 全局指标
pub fn global_metrics(table: &EvaluationTable) -> Option<MetricSet> {
    table.metrics_where(|_| true)
}

/// 按站点的指标
pub fn metrics_by_location(
    table: &EvaluationTable,
    eval_locations: &BTreeSet<LocationId>,
) -> Vec<LocationMetrics> {
    let mut groups: BTreeMap<&LocationId, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in table.rows() {
        let entry = groups.entry(&row.location_id).or_default();
        entry.0.push(row.y_true);
        entry.1.push(row.y_pred);
    }

    groups
        .into_iter()
        .filter_map(|(location, (y_true, y_pred))| {
            MetricSet::compute(&y_true, &y_pred).map(|metrics| LocationMetrics {
                location_id: location.clone(),
                is_eval: eval_locations.contains(location),
                metrics,
            })
        })
        .collect()
}

/// 按时刻的指标
pub fn metrics_by_time(table: &EvaluationTable) -> Vec<TimeMetrics> {
    let mut groups: BTreeMap<Timestamp, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in table.rows() {
        let entry = groups.entry(row.time).or_default();
        entry.0.push(row.y_true);
        entry.1.push(row.y_pred);
    }

    groups
        .into_iter()
        .filter_map(|(time, (y_true, y_pred))| {
            MetricSet::compute(&y_true, &y_pred).map(|metrics| TimeMetrics { time, metrics })
        })
        .collect()
}

/// 按部分子集的指标
///
/// 站点集合为空的子集不参与计算；命中少于 2 行的子集被静默跳过。
pub fn partial_metrics(table: &EvaluationTable, subsets: &[PartialSubset]) -> Vec<PartialMetrics> {
    let mut out = Vec::new();
    for subset in subsets.iter().filter(|s| !s.locations.is_empty()) {
        let Some(metrics) = table.metrics_where(|row| subset.contains(row)) else {
            continue;
        };
        if metrics.count < 2 {
            tracing::debug!(subset = %subset.name, rows = metrics.count, "partial subset skipped");
            continue;
        }
        out.push(PartialMetrics {
            name: subset.name.clone(),
            locations: subset.locations.iter().cloned().collect(),
            time_start: subset.range.start,
            time_end: subset.range.end,
            n_rows: metrics.count,
            metrics,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{InstantOutcome, InstantResult, PredictionFrame};
    use crate::table::ObsKey;
    use chrono::{TimeZone, Utc};

    fn ts(h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2021, 1, 1, h, 0, 0).unwrap()
    }

    /// 3 个时刻 × 站点 a/b，误差分别为 +1 (a) 与 -2 (b)
    fn table() -> EvaluationTable {
        let mut truth = ObservationTable::new(vec!["v".to_string()]);
        let mut results = Vec::new();
        for h in 0..3 {
            truth.insert(ObsKey::new(ts(h), "a"), vec![h as f64]).unwrap();
            truth.insert(ObsKey::new(ts(h), "b"), vec![10.0 + h as f64]).unwrap();
            results.push(InstantResult {
                time: ts(h),
                chunk: 0,
                outcome: InstantOutcome::Done(PredictionFrame {
                    time: ts(h),
                    locations: vec!["a".into(), "b".into()],
                    y_pred: vec![h as f64 + 1.0, 8.0 + h as f64],
                }),
            });
        }
        EvaluationTable::join(&results, &truth, "v").unwrap()
    }

    fn subset(name: &str, locs: &[&str], start: u32, end: u32) -> PartialSubset {
        PartialSubset {
            name: name.to_string(),
            locations: locs.iter().map(|&l| LocationId::new(l)).collect(),
            range: TimeRange::new(ts(start), ts(end)).unwrap(),
        }
    }

    #[test]
    fn test_global() {
        let m = global_metrics(&table()).unwrap();
        assert_eq!(m.count, 6);
        assert!((m.bias - (-0.5)).abs() < 1e-12);
        assert!((m.mse - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_by_location_flags_eval() {
        let eval: BTreeSet<LocationId> = [LocationId::new("b")].into_iter().collect();
        let by_loc = metrics_by_location(&table(), &eval);
        assert_eq!(by_loc.len(), 2);
        assert_eq!(by_loc[0].location_id, LocationId::new("a"));
        assert!(!by_loc[0].is_eval);
        assert!((by_loc[0].metrics.bias - 1.0).abs() < 1e-12);
        assert!(by_loc[1].is_eval);
        assert!((by_loc[1].metrics.mae - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_by_time() {
        let by_time = metrics_by_time(&table());
        assert_eq!(by_time.len(), 3);
        assert!(by_time.windows(2).all(|w| w[0].time < w[1].time));
        assert!(by_time.iter().all(|t| t.metrics.count == 2));
    }

    #[test]
    fn test_partial_subsets() {
        let subsets = vec![
            subset("both", &["a", "b"], 0, 1),
            subset("one_row", &["a"], 0, 1),
            subset("empty_locations", &[], 0, 3),
            subset("a_history", &["a"], 0, 3),
        ];
        let partial = partial_metrics(&table(), &subsets);
        let names: Vec<&str> = partial.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["both", "a_history"]);
        assert_eq!(partial[0].n_rows, 2);
        assert_eq!(partial[1].n_rows, 3);
        assert_eq!(partial[1].time_end, ts(3));
    }

    #[test]
    fn test_locations_by_time() {
        let mut t = ObservationTable::new(vec!["v".to_string()]);
        t.insert(ObsKey::new(ts(0), "a"), vec![1.0]).unwrap();
        t.insert(ObsKey::new(ts(0), "b"), vec![1.0]).unwrap();
        t.insert(ObsKey::new(ts(2), "a"), vec![1.0]).unwrap();
        let lbt = LocationsByTime::from_table("train", &t);
        assert_eq!(lbt.set, "train");
        assert_eq!(
            lbt.counts,
            vec![
                InstantCount { time: ts(0), locations: 2 },
                InstantCount { time: ts(2), locations: 1 },
            ]
        );
    }
}
