// apps/si_cli/src/commands/mod.rs

//! CLI 子命令

pub mod evaluate;
pub mod validate;

use anyhow::{Context, Result};
use si_eval::{ObservationRecord, ObservationTable};
use std::path::Path;

/// 读取 JSON 观测记录 `[{time, location_id, values}, ...]`
pub fn load_observations(path: &Path) -> Result<ObservationTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read observations {}", path.display()))?;
    let records: Vec<ObservationRecord> =
        serde_json::from_str(&content).context("observation file is not valid JSON records")?;
    let table = ObservationTable::from_records(&records).context("invalid observation records")?;
    Ok(table)
}
