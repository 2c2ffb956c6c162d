// apps/si_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 加载并验证配置，打印解析后的评估设置；给定观测文件时同时检查列与评估集划分。

use anyhow::{bail, Context, Result};
use clap::Args;
use si_config::EvalConfig;
use si_eval::{EngineSettings, EvaluationEngine, Split};
use std::path::PathBuf;
use tracing::{info, warn};

use super::load_observations;

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 观测记录文件路径 (JSON)
    #[arg(short, long)]
    pub data: Option<PathBuf>,
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== 配置验证 ===");

    let config = EvalConfig::from_json_file(&args.config)
        .with_context(|| format!("invalid config {}", args.config.display()))?;
    let settings = EngineSettings::from_config(&config).context("config cannot be resolved into evaluation settings")?;
    print_settings(&settings);

    if let Some(data) = &args.data {
        check_data(&config, data)?;
    }

    println!("\n✓ 验证通过");
    Ok(())
}

fn print_settings(settings: &EngineSettings) {
    println!("名称: {}", settings.name);
    println!("目标: {}", settings.target);
    println!("维度: {}", settings.dimensions.join(", "));
    println!("模式: {}", settings.mode);
    println!("并行任务数: {}", settings.n_jobs);
    println!(
        "支撑阈值: 时刻 >= {} 行, 切片 >= {} 行",
        settings.support.min_instant_rows, settings.support.min_slice_rows
    );
    println!("分块失败策略: {:?}", settings.chunk_failure);
    if let Some(frac) = settings.eval_frac {
        println!("抽样: eval_frac={}, seed={}", frac, settings.seed);
    }
    for subset in &settings.partial {
        println!(
            "部分子集 {}: {} 个站点, [{}, {})",
            subset.name,
            subset.locations.len(),
            subset.range.start,
            subset.range.end
        );
    }
}

fn check_data(config: &EvalConfig, path: &PathBuf) -> Result<()> {
    println!("\n检查观测文件: {}", path.display());
    let table = load_observations(path)?;
    let split = Split::from_eval_set(&table, &config.eval_set).context("failed to apply the eval set")?;

    let engine = EvaluationEngine::from_config(config)?;
    engine.check_columns(&split).context("observations do not match the evaluation columns")?;

    println!(
        "  训练 {} 行 / {} 个时刻, 测试 {} 行 / {} 个时刻",
        split.train.len(),
        split.train.times().len(),
        split.test.len(),
        split.test.times().len()
    );
    if split.test.is_empty() {
        bail!("eval set matches no observation rows");
    }
    if split.train.is_empty() {
        bail!("eval set covers every observation, no training rows left");
    }
    let missing: Vec<String> = config
        .eval_set
        .location_set()
        .difference(&split.test.locations())
        .map(|l| l.to_string())
        .collect();
    if !missing.is_empty() {
        warn!("评估站点在观测中不存在: {}", missing.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "target": "v",
        "interpolator": { "kind": "kriging", "dimensions": ["x", "time_step"] },
        "window": "6h",
        "eval_set": { "locations": ["b"] }
    }"#;

    fn write(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// 测试仅验证配置
    #[test]
    fn test_validate_config_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "config.json", CONFIG);
        execute(ValidateArgs { config, data: None }).unwrap();
    }

    /// 测试无效配置被拒绝
    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "config.json", &CONFIG.replace("\"6h\"", "\"6 hours\""));
        assert!(execute(ValidateArgs { config, data: None }).is_err());
    }

    /// 测试观测缺少目标列
    #[test]
    fn test_data_missing_target_column() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "config.json", CONFIG);
        let data = write(
            dir.path(),
            "obs.json",
            r#"[
                {"time": "2021-06-01T00:00:00Z", "location_id": "a", "values": {"x": 0.0, "w": 1.0}},
                {"time": "2021-06-01T00:00:00Z", "location_id": "b", "values": {"x": 1.0, "w": 2.0}}
            ]"#,
        );
        let err = execute(ValidateArgs { config, data: Some(data) }).unwrap_err();
        assert!(format!("{:#}", err).contains("observations do not match the evaluation columns"));
    }

    /// 测试观测与评估集匹配
    #[test]
    fn test_data_matches_eval_set() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "config.json", CONFIG);
        let data = write(
            dir.path(),
            "obs.json",
            r#"[
                {"time": "2021-06-01T00:00:00Z", "location_id": "a", "values": {"x": 0.0, "v": 1.0}},
                {"time": "2021-06-01T00:00:00Z", "location_id": "b", "values": {"x": 1.0, "v": 2.0}},
                {"time": "2021-06-01T01:00:00Z", "location_id": "a", "values": {"x": 0.0, "v": null}}
            ]"#,
        );
        execute(ValidateArgs { config, data: Some(data) }).unwrap();
    }
}
