// apps/si_cli/src/commands/evaluate.rs

//! 评估命令
//!
//! 读取配置与观测记录，按评估集划分训练/测试，运行评估并写出 JSON 报告。

use anyhow::{Context, Result};
use clap::Args;
use si_config::EvalConfig;
use si_eval::{EvaluationEngine, EvaluationReport, LoggingListener, Split};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::load_observations;

/// 评估参数
#[derive(Args)]
pub struct EvaluateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 观测记录文件路径 (JSON)
    #[arg(short, long)]
    pub data: PathBuf,

    /// 报告输出路径
    #[arg(short, long, default_value = "report.json")]
    pub output: PathBuf,

    /// 覆盖配置中的并行任务数
    #[arg(short = 'j', long)]
    pub n_jobs: Option<usize>,

    /// 逐时刻输出进度
    #[arg(long)]
    pub verbose: bool,
}

/// 执行评估命令
pub fn execute(args: EvaluateArgs) -> Result<()> {
    info!("=== 插值评估启动 ===");

    let mut config = EvalConfig::from_json_file(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    if let Some(n_jobs) = args.n_jobs {
        config.n_jobs = n_jobs;
    }

    let report = evaluate(&config, &args)?;
    report
        .to_json_file(&args.output)
        .with_context(|| format!("failed to write report {}", args.output.display()))?;

    print_summary(&report);
    info!("报告已写出: {}", args.output.display());
    Ok(())
}

fn evaluate(config: &EvalConfig, args: &EvaluateArgs) -> Result<EvaluationReport> {
    let table = load_observations(&args.data)?;
    let split = Split::from_eval_set(&table, &config.eval_set).context("failed to apply the eval set")?;
    info!("观测: {} 行, 训练 {} 行, 测试 {} 行", table.len(), split.train.len(), split.test.len());

    let listener = if args.verbose {
        LoggingListener::new(config.name.as_str()).verbose()
    } else {
        LoggingListener::new(config.name.as_str())
    };
    let engine = EvaluationEngine::from_config(config)
        .context("failed to build evaluation engine")?
        .with_listener(Arc::new(listener));

    engine.run(&split).context("evaluation failed")
}

fn print_summary(report: &EvaluationReport) {
    let summary = &report.summary;
    println!("=== 评估结果: {} ===", report.run.name);
    println!("插值器: {} ({})", report.run.interpolator, report.run.mode);
    println!(
        "时刻: 训练 {}, 测试 {}, 评估 {}",
        summary.num_train_instants, summary.num_test_instants, summary.num_evaluated_instants
    );
    println!(
        "完成 {}, 跳过 {}, 失败 {}",
        summary.outcomes.done,
        summary.outcomes.total_skipped(),
        summary.outcomes.total_failed()
    );
    for (reason, count) in &summary.outcomes.skipped {
        println!("  跳过 [{}]: {}", reason, count);
    }
    for (stage, count) in &summary.outcomes.failed {
        println!("  失败 [{}]: {}", stage, count);
    }

    match &report.global {
        Some(m) => println!(
            "全局: n={}, RMSE={:.4}, MAE={:.4}, bias={:.4}",
            m.count, m.rmse, m.mae, m.bias
        ),
        None => println!("全局: 无可评估的点"),
    }
    for partial in &report.partial {
        println!(
            "子集 {}: n={}, RMSE={:.4}",
            partial.name, partial.n_rows, partial.metrics.rmse
        );
    }
}
