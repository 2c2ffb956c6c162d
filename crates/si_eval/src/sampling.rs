// crates/si_eval/src/sampling.rs

//! 评估时刻采样
//!
//! `eval_frac` < 1 按比例抽取，> 1 按绝对数量抽取，= 1 或缺省时全部评估。
//! 抽样使用显式种子的 `StdRng`，抽中的时刻重新按升序排列。

use rand::prelude::*;
use rand::rngs::StdRng;
use si_foundation::Timestamp;

/// 根据 `eval_frac` 计算抽样数量（不超过总数）
pub fn sample_size(total: usize, eval_frac: Option<f64>) -> usize {
    match eval_frac {
        Some(frac) if frac < 1.0 => ((frac * total as f64).round() as usize).min(total),
        Some(frac) if frac > 1.0 => (frac as usize).min(total),
        _ => total,
    }
}

/// 抽取评估时刻
pub fn select_instants(instants: &[Timestamp], eval_frac: Option<f64>, seed: u64) -> Vec<Timestamp> {
    let n = sample_size(instants.len(), eval_frac);
    if n == instants.len() {
        return instants.to_vec();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut chosen: Vec<Timestamp> = instants.choose_multiple(&mut rng, n).copied().collect();
    chosen.sort();
    tracing::info!(
        selected = n,
        total = instants.len(),
        seed,
        "sampled a subset of evaluation instants"
    );
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn instants(n: i64) -> Vec<Timestamp> {
        let t0 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| t0 + Duration::hours(i)).collect()
    }

    #[test]
    fn test_sample_size_modes() {
        assert_eq!(sample_size(10, None), 10);
        assert_eq!(sample_size(10, Some(1.0)), 10);
        assert_eq!(sample_size(10, Some(0.25)), 3);
        assert_eq!(sample_size(10, Some(4.0)), 4);
        assert_eq!(sample_size(10, Some(40.0)), 10);
    }

    #[test]
    fn test_selection_is_sorted_and_seeded() {
        let all = instants(50);
        let a = select_instants(&all, Some(0.2), 42);
        let b = select_instants(&all, Some(0.2), 42);
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
        assert!(a.iter().all(|t| all.contains(t)));
    }

    #[test]
    fn test_full_selection_keeps_order() {
        let all = instants(5);
        assert_eq!(select_instants(&all, None, 0), all);
    }
}
