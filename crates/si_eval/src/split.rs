// crates/si_eval/src/split.rs

//! 训练/测试划分

use std::collections::BTreeSet;

use si_config::{AreaConfig, EvalSetConfig};
use si_foundation::{LocationId, SiResult};

use crate::table::{ObsKey, ObservationTable};

/// 训练/测试划分
///
/// 两张表不共享任何 `(time, location)` 主键。
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// 训练表
    pub train: ObservationTable,
    /// 测试表
    pub test: ObservationTable,
}

impl Split {
    /// 按主键谓词划分，谓词为真的行进入测试表
    pub fn partition<F>(table: &ObservationTable, is_test: F) -> Self
    where
        F: Fn(&ObsKey) -> bool,
    {
        Self {
            train: table.filter(|k, _| !is_test(k)),
            test: table.filter(|k, _| is_test(k)),
        }
    }

    /// 按评估集定义划分，给定区域时先限制到区域内的站点
    pub fn from_eval_set(table: &ObservationTable, eval_set: &EvalSetConfig) -> SiResult<Self> {
        let locations = eval_set.location_set();
        let split = match &eval_set.area {
            Some(area) => {
                let within = within_area(table, area)?;
                Self::partition(&within, |k| eval_set.is_test(&locations, k.time, &k.location))
            }
            None => Self::partition(table, |k| eval_set.is_test(&locations, k.time, &k.location)),
        };
        Ok(split)
    }
}

/// 保留至少有一行坐标落在区域内的站点的全部观测
pub fn within_area(table: &ObservationTable, area: &AreaConfig) -> SiResult<ObservationTable> {
    let lon = table.require_column(&area.lon_column)?;
    let lat = table.require_column(&area.lat_column)?;

    let inside: BTreeSet<&LocationId> = table
        .iter()
        .filter(|(_, row)| area.contains(row[lon], row[lat]))
        .map(|(k, _)| &k.location)
        .collect();
    let filtered = table.filter(|k, _| inside.contains(&k.location));

    tracing::info!(
        locations = inside.len(),
        rows_before = table.len(),
        rows_after = filtered.len(),
        "filtered observations on eval area"
    );
    Ok(filtered)
}
