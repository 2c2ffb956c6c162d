// crates/si_interp/src/traits.rs

//! 插值器契约
//!
//! 拟合是值语义的：`fit` 不修改插值器本身，而是返回一个新的
//! [`FittedModel`]。同一个插值器因此可以被多个线程共享，
//! 每个评估时刻都从一次全新的拟合开始。

use crate::error::{InterpError, InterpResult};
use crate::frame::Frame;

/// 被识别为时间维度的列名
pub const TEMPORAL_DIMENSIONS: [&str; 2] = ["time", "time_step"];

/// 维度中是否包含时间维
pub fn has_temporal_dimension<S: AsRef<str>>(dimensions: &[S]) -> bool {
    dimensions
        .iter()
        .any(|d| TEMPORAL_DIMENSIONS.contains(&d.as_ref()))
}

/// 插值器
pub trait Interpolator: Send + Sync {
    /// 插值器名称（用于日志）
    fn name(&self) -> &str;

    /// 插值器使用的维度列
    fn dimensions(&self) -> &[String];

    /// 在训练表上拟合
    ///
    /// `frame` 至少包含 [`Interpolator::dimensions`] 与 `target` 列。
    fn fit(&self, frame: &Frame, target: &str) -> InterpResult<Box<dyn FittedModel>>;
}

/// 已拟合模型
pub trait FittedModel: Send {
    /// 按行预测，返回值与输入行一一对应
    ///
    /// 无法给出预测的位置返回 `NaN`。
    fn predict(&self, frame: &Frame) -> InterpResult<Vec<f64>>;

    /// 拟合所用样本数
    fn n_samples(&self) -> usize;
}

/// 从表中提取样本坐标（行优先展平）与目标值
///
/// 任一坐标或目标值非有限时返回错误。
pub(crate) fn extract_samples(
    frame: &Frame,
    dimensions: &[String],
    target: &str,
) -> InterpResult<(Vec<f64>, Vec<f64>)> {
    let coords = extract_coordinates(frame, dimensions)?;
    let t_idx = frame.require_column(target)?;

    let mut values = Vec::with_capacity(frame.n_rows());
    for (row_idx, row) in frame.rows().enumerate() {
        let v = row[t_idx];
        if !v.is_finite() {
            return Err(InterpError::NonFinite {
                column: target.to_string(),
                row: row_idx,
            });
        }
        values.push(v);
    }
    Ok((coords, values))
}

/// 提取坐标（行优先展平）
pub(crate) fn extract_coordinates(frame: &Frame, dimensions: &[String]) -> InterpResult<Vec<f64>> {
    let indices = dimensions
        .iter()
        .map(|d| frame.require_column(d))
        .collect::<Result<Vec<_>, _>>()?;

    let mut coords = Vec::with_capacity(frame.n_rows() * indices.len());
    for (row_idx, row) in frame.rows().enumerate() {
        for (k, &i) in indices.iter().enumerate() {
            let v = row[i];
            if !v.is_finite() {
                return Err(InterpError::NonFinite {
                    column: dimensions[k].clone(),
                    row: row_idx,
                });
            }
            coords.push(v);
        }
    }
    Ok(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporal_detection() {
        assert!(has_temporal_dimension(&["longitude", "latitude", "time_step"]));
        assert!(has_temporal_dimension(&["time"]));
        assert!(!has_temporal_dimension(&["longitude", "latitude"]));
    }

    #[test]
    fn test_extract_samples_rejects_nan() {
        let cols = vec!["x".to_string(), "y".to_string()];
        let frame = Frame::from_rows(cols, &[[0.0, 1.0], [f64::NAN, 2.0]]).unwrap();
        let dims = vec!["x".to_string()];
        let err = extract_samples(&frame, &dims, "y").unwrap_err();
        assert!(matches!(err, InterpError::NonFinite { row: 1, .. }));
    }
}
