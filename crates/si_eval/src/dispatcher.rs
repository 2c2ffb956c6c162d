// crates/si_eval/src/dispatcher.rs

//! 分块并行调度器
//!
//! - `n_jobs ≤ 1`：所有时刻在当前线程上按序评估（分块 0）
//! - `n_jobs > 1`：时刻被切成恰好 `n_jobs` 个连续分块，大小相差至多 1，
//!   较大的分块在前（时刻少于分块数时会出现空分块）；每个分块在专用
//!   rayon 线程池的一个任务中顺序执行，结果按分块顺序收集后展平
//!
//! 展平后的顺序与顺序执行完全一致。
//!
//! 分块内部的崩溃（panic）按 [`ChunkFailurePolicy`] 处理：`Abort`
//! 使整次调度失败；`Isolate` 把该分块的所有时刻记为 `Worker` 阶段失败。

use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use si_config::ChunkFailurePolicy;
use si_foundation::Timestamp;

use crate::error::{EvalError, EvalResult};
use crate::evaluator::{FailureReason, FailureStage, InstantOutcome, InstantResult};
use crate::events::{EvalEvent, EventDispatcher};
use crate::report::RunId;

/// 调度设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// 并行度，≤1 时顺序执行
    pub n_jobs: usize,
    /// 分块失败策略
    pub policy: ChunkFailurePolicy,
}

impl DispatchSettings {
    /// 分块数
    pub fn n_chunks(&self) -> usize {
        self.n_jobs.max(1)
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            n_jobs: 1,
            policy: ChunkFailurePolicy::Abort,
        }
    }
}

/// 把 `len` 个元素切成 `n_chunks` 个连续区间
///
/// 前 `len % n_chunks` 个区间多分一个元素。
pub fn chunk_ranges(len: usize, n_chunks: usize) -> Vec<Range<usize>> {
    let n_chunks = n_chunks.max(1);
    let base = len / n_chunks;
    let extra = len % n_chunks;

    let mut ranges = Vec::with_capacity(n_chunks);
    let mut start = 0;
    for i in 0..n_chunks {
        let size = base + usize::from(i < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// 分块并行调度器
pub struct ChunkedDispatcher<'a> {
    settings: DispatchSettings,
    events: &'a EventDispatcher,
    run_id: RunId,
}

impl<'a> ChunkedDispatcher<'a> {
    /// 创建调度器
    pub fn new(settings: DispatchSettings, events: &'a EventDispatcher, run_id: RunId) -> Self {
        Self {
            settings,
            events,
            run_id,
        }
    }

    /// 对所有时刻执行 `evaluate`，结果顺序与 `instants` 一致
    pub fn dispatch<F>(&self, instants: &[Timestamp], evaluate: F) -> EvalResult<Vec<InstantResult>>
    where
        F: Fn(Timestamp) -> InstantOutcome + Sync,
    {
        let finished = AtomicUsize::new(0);
        let total = instants.len();

        let chunk_results: Vec<Result<Vec<InstantResult>, String>> = if self.settings.n_jobs <= 1 {
            vec![self.run_chunk(0, instants, &evaluate, &finished, total)]
        } else {
            let ranges = chunk_ranges(instants.len(), self.settings.n_jobs);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.settings.n_jobs)
                .thread_name(|i| format!("si-eval-{}", i))
                .build()
                .map_err(|e| EvalError::ThreadPool(e.to_string()))?;

            tracing::info!(
                n_jobs = self.settings.n_jobs,
                n_instants = total,
                "evaluating chunks in parallel"
            );
            pool.install(|| {
                ranges
                    .par_iter()
                    .enumerate()
                    .map(|(chunk, range)| {
                        self.run_chunk(chunk, &instants[range.clone()], &evaluate, &finished, total)
                    })
                    .collect()
            })
        };

        let ranges = chunk_ranges(instants.len(), self.settings.n_chunks());
        let mut results = Vec::with_capacity(total);
        for (chunk, (result, range)) in chunk_results.into_iter().zip(ranges).enumerate() {
            match result {
                Ok(chunk_results) => results.extend(chunk_results),
                Err(message) => match self.settings.policy {
                    ChunkFailurePolicy::Abort => {
                        return Err(EvalError::ChunkFailed { chunk, message });
                    }
                    ChunkFailurePolicy::Isolate => {
                        results.extend(instants[range].iter().map(|&time| InstantResult {
                            time,
                            chunk,
                            outcome: InstantOutcome::Failed(FailureReason {
                                stage: FailureStage::Worker,
                                message: message.clone(),
                            }),
                        }));
                    }
                },
            }
        }
        Ok(results)
    }

    /// 顺序执行一个分块，捕获崩溃
    fn run_chunk<F>(
        &self,
        chunk: usize,
        instants: &[Timestamp],
        evaluate: &F,
        finished: &AtomicUsize,
        total: usize,
    ) -> Result<Vec<InstantResult>, String>
    where
        F: Fn(Timestamp) -> InstantOutcome + Sync,
    {
        let start = Instant::now();
        self.events.emit(EvalEvent::ChunkStarted {
            run_id: self.run_id,
            chunk,
            n_instants: instants.len(),
        });

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            instants
                .iter()
                .map(|&time| {
                    let outcome = evaluate(time);
                    let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
                    self.events.emit(EvalEvent::InstantFinished {
                        run_id: self.run_id,
                        chunk,
                        time,
                        status: outcome.status(),
                        finished: done,
                        total,
                    });
                    InstantResult { time, chunk, outcome }
                })
                .collect::<Vec<_>>()
        }));

        match outcome {
            Ok(results) => {
                self.events.emit(EvalEvent::ChunkCompleted {
                    run_id: self.run_id,
                    chunk,
                    duration_secs: start.elapsed().as_secs_f64(),
                });
                Ok(results)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(chunk, error = %message, "evaluation chunk panicked");
                self.events.emit(EvalEvent::ChunkFailed {
                    run_id: self.run_id,
                    chunk,
                    error: message.clone(),
                });
                Err(message)
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
