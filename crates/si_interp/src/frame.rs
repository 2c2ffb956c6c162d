// crates/si_interp/src/frame.rs

//! 具名数值表
//!
//! 行优先存储的二维 `f64` 表，列名有序。评估引擎用它向插值器
//! 传递训练样本（维度列 + 目标列）与待预测位置（维度列）。

use si_foundation::{SiError, SiResult};

/// 具名数值表
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    data: Vec<f64>,
}

impl Frame {
    /// 创建空表
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            data: Vec::new(),
        }
    }

    /// 创建空表并预留行容量
    pub fn with_capacity(columns: Vec<String>, rows: usize) -> Self {
        let n_cols = columns.len();
        Self {
            columns,
            data: Vec::with_capacity(rows * n_cols),
        }
    }

    /// 由若干行构建
    pub fn from_rows<R: AsRef<[f64]>>(columns: Vec<String>, rows: &[R]) -> SiResult<Self> {
        let mut frame = Self::with_capacity(columns, rows.len());
        for row in rows {
            frame.push_row(row.as_ref())?;
        }
        Ok(frame)
    }

    /// 列名
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        if self.columns.is_empty() {
            0
        } else {
            self.data.len() / self.columns.len()
        }
    }

    /// 是否没有任何行
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    /// 列下标
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 列下标，缺失时报错
    pub fn require_column(&self, name: &str) -> SiResult<usize> {
        self.column_index(name)
            .ok_or_else(|| SiError::missing_column(name))
    }

    /// 追加一行
    pub fn push_row(&mut self, row: &[f64]) -> SiResult<()> {
        SiError::check_size("frame row", self.columns.len(), row.len())?;
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// 第 i 行
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.columns.len();
        &self.data[i * n..(i + 1) * n]
    }

    /// 行迭代器
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.columns.len().max(1))
    }

    /// 复制出某一列
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows().map(|r| r[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_push_and_read() {
        let mut frame = Frame::new(cols(&["x", "y", "z"]));
        frame.push_row(&[1.0, 2.0, 3.0]).unwrap();
        frame.push_row(&[4.0, 5.0, 6.0]).unwrap();

        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(frame.column("y").unwrap(), vec![2.0, 5.0]);
        assert!(frame.column("w").is_none());
    }

    #[test]
    fn test_push_wrong_width() {
        let mut frame = Frame::new(cols(&["x", "y"]));
        assert!(frame.push_row(&[1.0]).is_err());
        assert!(frame.is_empty());
    }

    #[test]
    fn test_require_column() {
        let frame = Frame::from_rows(cols(&["x", "y", "z"]), &[[1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(frame.require_column("z").unwrap(), 2);
        assert!(frame.require_column("missing").is_err());
    }

    #[test]
    fn test_empty_columns() {
        let frame = Frame::new(Vec::new());
        assert_eq!(frame.n_rows(), 0);
        assert_eq!(frame.rows().count(), 0);
    }
}
