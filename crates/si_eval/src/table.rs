// crates/si_eval/src/table.rs

//! 观测表
//!
//! 以 `(time, location)` 为主键、按时间再按站点排序的数值表。
//! 缺失值记为 `NaN`。按时刻的行查询通过有序主键上的范围扫描完成，
//! 不需要额外索引。

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use si_foundation::{LocationId, SiError, SiResult, Timestamp};

/// 观测主键
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObsKey {
    /// 观测时刻
    pub time: Timestamp,
    /// 站点
    pub location: LocationId,
}

impl ObsKey {
    /// 创建主键
    pub fn new(time: Timestamp, location: impl Into<LocationId>) -> Self {
        Self {
            time,
            location: location.into(),
        }
    }

    /// 时刻 `time` 处所有主键的下界
    fn lower_bound(time: Timestamp) -> Self {
        Self {
            time,
            location: LocationId::min_value(),
        }
    }
}

impl std::fmt::Display for ObsKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.time.to_rfc3339(), self.location)
    }
}

/// JSON 交换格式的单条观测
///
/// 缺失值写为 `null`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// 观测时刻
    pub time: Timestamp,
    /// 站点
    pub location_id: LocationId,
    /// 各列数值
    #[serde(default)]
    pub values: BTreeMap<String, Option<f64>>,
}

/// 观测表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    columns: Vec<String>,
    rows: BTreeMap<ObsKey, Vec<f64>>,
}

impl ObservationTable {
    /// 创建空表
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// 从记录构建
    ///
    /// 列集合取所有记录中出现过的列名（按字典序），记录中缺失的列填 `NaN`。
    pub fn from_records(records: &[ObservationRecord]) -> SiResult<Self> {
        let columns: BTreeSet<&String> = records.iter().flat_map(|r| r.values.keys()).collect();
        let columns: Vec<String> = columns.into_iter().cloned().collect();

        let mut table = Self::new(columns);
        for record in records {
            let values = table
                .columns
                .iter()
                .map(|c| record.values.get(c).copied().flatten().unwrap_or(f64::NAN))
                .collect();
            table.insert(ObsKey::new(record.time, record.location_id.clone()), values)?;
        }
        Ok(table)
    }

    /// 导出为记录
    pub fn to_records(&self) -> Vec<ObservationRecord> {
        self.rows
            .iter()
            .map(|(key, values)| ObservationRecord {
                time: key.time,
                location_id: key.location.clone(),
                values: self
                    .columns
                    .iter()
                    .zip(values)
                    .map(|(c, v)| (c.clone(), v.is_finite().then_some(*v)))
                    .collect(),
            })
            .collect()
    }

    /// 列名
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 列索引
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 列索引，不存在时返回错误
    pub fn require_column(&self, name: &str) -> SiResult<usize> {
        self.column_index(name)
            .ok_or_else(|| SiError::missing_column(name))
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 插入一行，主键重复时返回错误
    pub fn insert(&mut self, key: ObsKey, values: Vec<f64>) -> SiResult<()> {
        SiError::check_size("row", self.columns.len(), values.len())?;
        if self.rows.contains_key(&key) {
            return Err(SiError::duplicate_key(key.to_string()));
        }
        self.rows.insert(key, values);
        Ok(())
    }

    /// 按主键取行
    pub fn get(&self, key: &ObsKey) -> Option<&[f64]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// 按主键与列索引取值
    pub fn value(&self, key: &ObsKey, column: usize) -> Option<f64> {
        self.rows.get(key).and_then(|row| row.get(column).copied())
    }

    /// 按主键顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&ObsKey, &[f64])> + '_ {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// 删除指定列缺失（非有限）的行，返回删除的行数
    pub fn drop_missing(&mut self, column: &str) -> SiResult<usize> {
        let idx = self.require_column(column)?;
        let before = self.rows.len();
        self.rows.retain(|_, row| row[idx].is_finite());
        Ok(before - self.rows.len())
    }

    /// 保留满足条件的行
    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&ObsKey, &[f64]) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(k, v)| keep(k, v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// 所有不同的时刻（升序）
    pub fn times(&self) -> Vec<Timestamp> {
        let mut times: Vec<Timestamp> = self.rows.keys().map(|k| k.time).collect();
        times.dedup();
        times
    }

    /// 所有站点
    pub fn locations(&self) -> BTreeSet<LocationId> {
        self.rows.keys().map(|k| k.location.clone()).collect()
    }

    /// 每个时刻的行数
    pub fn count_by_time(&self) -> BTreeMap<Timestamp, usize> {
        let mut counts = BTreeMap::new();
        for key in self.rows.keys() {
            *counts.entry(key.time).or_insert(0) += 1;
        }
        counts
    }

    /// 时刻 `t` 的行数
    pub fn count_at(&self, t: Timestamp) -> usize {
        self.rows_at(t).count()
    }

    /// 时刻 `t` 的所有行（按站点排序）
    pub fn rows_at(&self, t: Timestamp) -> impl Iterator<Item = (&ObsKey, &[f64])> + '_ {
        self.rows
            .range(ObsKey::lower_bound(t)..)
            .take_while(move |(k, _)| k.time == t)
            .map(|(k, v)| (k, v.as_slice()))
    }

    /// 时间落在 `[start, end]`（两端包含）内的行；`start` 为 `None` 时不设下界
    pub fn rows_between(
        &self,
        start: Option<Timestamp>,
        end: Timestamp,
    ) -> impl Iterator<Item = (&ObsKey, &[f64])> + '_ {
        let range = match start {
            Some(start) => self.rows.range(ObsKey::lower_bound(start)..),
            None => self.rows.range::<ObsKey, _>(..),
        };
        range
            .take_while(move |(k, _)| k.time <= end)
            .map(|(k, v)| (k, v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2021, 1, 1, h, 0, 0).unwrap()
    }

    fn sample() -> ObservationTable {
        let mut table = ObservationTable::new(vec!["x".to_string(), "v".to_string()]);
        for (h, loc, v) in [(2, "b", 1.0), (1, "a", 2.0), (1, "b", f64::NAN), (2, "a", 3.0), (3, "c", 4.0)] {
            table.insert(ObsKey::new(ts(h), loc), vec![0.0, v]).unwrap();
        }
        table
    }

    #[test]
    fn test_ordering_and_queries() {
        let table = sample();
        let keys: Vec<String> = table.iter().map(|(k, _)| k.location.to_string()).collect();
        assert_eq!(keys, vec!["a", "b", "a", "b", "c"]);
        assert_eq!(table.times(), vec![ts(1), ts(2), ts(3)]);
        assert_eq!(table.count_at(ts(2)), 2);
        assert_eq!(table.count_at(ts(4)), 0);
        assert_eq!(table.count_by_time()[&ts(1)], 2);
        assert_eq!(table.locations().len(), 3);
    }

    #[test]
    fn test_rows_between_is_inclusive() {
        let table = sample();
        assert_eq!(table.rows_between(Some(ts(2)), ts(3)).count(), 3);
        assert_eq!(table.rows_between(Some(ts(2)), ts(2)).count(), 2);
        assert_eq!(table.rows_between(None, ts(2)).count(), 4);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut table = sample();
        let err = table.insert(ObsKey::new(ts(1), "a"), vec![0.0, 0.0]).unwrap_err();
        assert!(matches!(err, SiError::DuplicateKey { .. }));
        assert!(table.insert(ObsKey::new(ts(1), "z"), vec![0.0]).is_err());
    }

    #[test]
    fn test_drop_missing() {
        let mut table = sample();
        assert_eq!(table.drop_missing("v").unwrap(), 1);
        assert_eq!(table.len(), 4);
        assert!(table.drop_missing("nope").is_err());
    }

    #[test]
    fn test_records_round_trip_keeps_missing() {
        let table = sample();
        let records = table.to_records();
        assert_eq!(records[1].values["v"], None);
        let back = ObservationTable::from_records(&records).unwrap();
        assert_eq!(back.len(), table.len());
        let v = back.require_column("v").unwrap();
        assert!(back.value(&ObsKey::new(ts(1), "b"), v).unwrap().is_nan());
    }

    #[test]
    fn test_from_records_fills_absent_columns() {
        let mut values = BTreeMap::new();
        values.insert("v".to_string(), Some(1.0));
        let records = vec![
            ObservationRecord { time: ts(1), location_id: "a".into(), values },
            ObservationRecord { time: ts(1), location_id: "b".into(), values: BTreeMap::new() },
        ];
        let table = ObservationTable::from_records(&records).unwrap();
        assert_eq!(table.columns(), &["v".to_string()]);
        assert!(table.value(&ObsKey::new(ts(1), "b"), 0).unwrap().is_nan());
    }
}
