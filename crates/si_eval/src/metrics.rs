// crates/si_eval/src/metrics.rs

//! 误差指标
//!
//! 所有指标都是对借用数据的纯归约。

use serde::{Deserialize, Serialize};

/// 一组误差指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// 样本数
    pub count: usize,
    /// 均方根误差
    pub rmse: f64,
    /// 均方误差
    pub mse: f64,
    /// 平均绝对误差
    pub mae: f64,
    /// 偏差：mean(pred - true)
    pub bias: f64,
    /// 误差标准差（总体）
    pub error_std: f64,
    /// 绝对误差中位数
    pub median_abs_error: f64,
    /// 绝对误差 90 分位数
    pub p90_abs_error: f64,
    /// 最大绝对误差
    pub max_abs_error: f64,
    /// 决定系数；样本少于 2 个或真值方差为零时为 `None`
    pub r2: Option<f64>,
}

impl MetricSet {
    /// 由成对的真值与预测值计算，空输入返回 `None`
    ///
    /// # Panics
    ///
    /// 两个切片长度不同时 panic。
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Option<Self> {
        assert_eq!(y_true.len(), y_pred.len(), "y_true and y_pred must have equal length");
        let n = y_true.len();
        if n == 0 {
            return None;
        }
        let nf = n as f64;

        let errors: Vec<f64> = y_pred.iter().zip(y_true).map(|(p, t)| p - t).collect();
        let bias = errors.iter().sum::<f64>() / nf;
        let mse = errors.iter().map(|e| e * e).sum::<f64>() / nf;
        let error_var = errors.iter().map(|e| (e - bias).powi(2)).sum::<f64>() / nf;

        let mut abs_errors: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
        abs_errors.sort_by(f64::total_cmp);
        let mae = abs_errors.iter().sum::<f64>() / nf;

        let r2 = if n < 2 {
            None
        } else {
            let mean_true = y_true.iter().sum::<f64>() / nf;
            let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();
            (ss_tot > 0.0).then(|| 1.0 - mse * nf / ss_tot)
        };

        Some(Self {
            count: n,
            rmse: mse.sqrt(),
            mse,
            mae,
            bias,
            error_std: error_var.sqrt(),
            median_abs_error: percentile_sorted(&abs_errors, 0.5),
            p90_abs_error: percentile_sorted(&abs_errors, 0.9),
            max_abs_error: abs_errors[n - 1],
            r2,
        })
    }
}

/// 已排序数据的分位数（线性插值）
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
