// crates/si_eval/tests/example_scenario.rs

//! 五时刻示例场景
//!
//! 训练站点 a/b/c 在 t1–t3、t5 全部有观测，t4 只有 a；
//! 测试站点 d/e/f 在每个时刻都有观测。空间模式下 t4 因支撑不足被跳过，
//! 全局指标只覆盖其余四个时刻。

use chrono::{Duration, TimeZone, Utc};
use si_config::EvalConfig;
use si_eval::{EvalMode, EvaluationEngine, InstantStatus, ObsKey, ObservationTable, SkipReason, Split};
use si_foundation::Timestamp;

fn ts(h: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap() + Duration::hours(h)
}

/// 训练值 a=h, b=h+1, c=h+2，均值 h+1；测试值 d=h+2, e=h, f=h+3
fn observations() -> ObservationTable {
    let mut table = ObservationTable::new(vec!["x".to_string(), "v".to_string()]);
    for h in 1..=5i64 {
        let base = h as f64;
        for (i, loc) in ["a", "b", "c"].iter().enumerate() {
            if h == 4 && i > 0 {
                continue;
            }
            table
                .insert(ObsKey::new(ts(h), *loc), vec![i as f64, base + i as f64])
                .unwrap();
        }
        // t4 的测试真值偏离很大，若被评估会显著拉高误差
        let offset = if h == 4 { 1000.0 } else { 0.0 };
        for (loc, x, v) in [("d", 3.0, base + 2.0), ("e", 4.0, base), ("f", 5.0, base + 3.0)] {
            table
                .insert(ObsKey::new(ts(h), loc), vec![x, v + offset])
                .unwrap();
        }
    }
    table
}

fn config() -> EvalConfig {
    let json = format!(
        r#"{{
            "name": "five-instants",
            "target": "v",
            "interpolator": {{ "kind": "mean", "dimensions": ["x"] }},
            "n_jobs": 2,
            "support": {{ "min_instant_rows": 1, "min_slice_rows": 3 }},
            "eval_set": {{
                "locations": ["d", "e", "f"],
                "partial": {{
                    "late": {{ "locations": ["d", "e"], "time": {{ "start": "{t4}", "end": "{t6}" }} }},
                    "early_d": {{ "locations": ["d"], "time": {{ "start": "{t1}", "end": "{t2}" }} }}
                }}
            }}
        }}"#,
        t1 = ts(1).to_rfc3339(),
        t2 = ts(2).to_rfc3339(),
        t4 = ts(4).to_rfc3339(),
        t6 = ts(6).to_rfc3339(),
    );
    EvalConfig::from_json_str(&json).unwrap()
}

/// 测试 t4 被跳过且不进入任何指标
#[test]
fn test_sparse_instant_is_skipped() {
    let config = config();
    let split = Split::from_eval_set(&observations(), &config.eval_set).unwrap();
    assert_eq!(split.train.len(), 13);
    assert_eq!(split.test.len(), 15);

    let engine = EvaluationEngine::from_config(&config).unwrap();
    assert_eq!(engine.settings().mode, EvalMode::Spatial);
    let report = engine.run(&split).unwrap();

    let statuses: Vec<InstantStatus> = report.instants.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            InstantStatus::Done,
            InstantStatus::Done,
            InstantStatus::Done,
            InstantStatus::Skipped,
            InstantStatus::Done,
        ]
    );
    assert_eq!(
        report.instants[3].skip,
        Some(SkipReason::InsufficientSupport { rows: 1, required: 3 })
    );
    assert!(report.instants.iter().filter(|r| r.status == InstantStatus::Done).all(|r| r.n_predictions == 3));

    assert_eq!(report.table.len(), 12);
    assert!(report.table.rows().iter().all(|r| r.time != ts(4)));
}

/// 测试全局与分组指标
#[test]
fn test_metrics_cover_evaluated_instants_only() {
    let config = config();
    let split = Split::from_eval_set(&observations(), &config.eval_set).unwrap();
    let report = EvaluationEngine::from_config(&config).unwrap().run(&split).unwrap();

    // 每个时刻误差为 -1, +1, -2
    let global = report.global.as_ref().unwrap();
    assert_eq!(global.count, 12);
    assert!((global.rmse - 2.0f64.sqrt()).abs() < 1e-12);
    assert!((global.mae - 4.0 / 3.0).abs() < 1e-12);
    assert!((global.max_abs_error - 2.0).abs() < 1e-12);

    assert_eq!(report.by_location.len(), 3);
    assert!(report.by_location.iter().all(|m| m.is_eval && m.metrics.count == 4));
    let f = report.by_location.iter().find(|m| m.location_id.as_str() == "f").unwrap();
    assert!((f.metrics.rmse - 2.0).abs() < 1e-12);

    assert_eq!(report.by_time.len(), 4);
    assert!(report.by_time.iter().all(|m| (m.metrics.mse - 2.0).abs() < 1e-12));

    // early_d 只有一行，被跳过
    assert_eq!(report.partial.len(), 1);
    assert_eq!(report.partial[0].name, "late");
    assert_eq!(report.partial[0].n_rows, 2);
    assert!((report.partial[0].metrics.rmse - 1.0).abs() < 1e-12);
}

/// 测试运行摘要
#[test]
fn test_summary_counts() {
    let config = config();
    let split = Split::from_eval_set(&observations(), &config.eval_set).unwrap();
    let report = EvaluationEngine::from_config(&config).unwrap().run(&split).unwrap();

    let summary = &report.summary;
    assert_eq!(summary.num_train_instants, 5);
    assert_eq!(summary.num_test_instants, 5);
    assert_eq!(summary.num_evaluated_instants, 5);
    assert_eq!(summary.num_evaluated_points, 12);
    assert_eq!(summary.outcomes.done, 4);
    assert_eq!(summary.outcomes.skipped["insufficient_support"], 1);
    assert_eq!(summary.outcomes.total_failed(), 0);
    assert!((summary.prop_test_instants_to_obs - 5.0 / 15.0).abs() < 1e-12);

    let train_counts = &summary.locations_by_time[0];
    assert_eq!(train_counts.set, "train");
    let t4 = train_counts.counts.iter().find(|c| c.time == ts(4)).unwrap();
    assert_eq!(t4.locations, 1);

    assert_eq!(report.run.name, "five-instants");
    assert_eq!(report.run.interpolator, "mean");
    assert_eq!(report.run.n_jobs, 2);
}
