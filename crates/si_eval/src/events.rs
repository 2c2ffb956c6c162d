// crates/si_eval/src/events.rs

//! 事件系统模块
//!
//! 评估运行的进度事件与分发机制。事件只用于观察进度，
//! 不参与结果的正确性。

use parking_lot::RwLock;
use std::sync::Arc;

use crate::report::RunId;
use si_foundation::Timestamp;

use crate::evaluator::InstantStatus;

/// 评估事件
#[derive(Debug, Clone)]
pub enum EvalEvent {
    /// 运行已开始
    RunStarted {
        /// 运行ID
        run_id: RunId,
        /// 运行名称
        name: String,
        /// 待评估时刻数
        n_instants: usize,
        /// 分块数
        n_chunks: usize,
    },
    /// 分块已开始
    ChunkStarted {
        /// 运行ID
        run_id: RunId,
        /// 分块序号
        chunk: usize,
        /// 分块内时刻数
        n_instants: usize,
    },
    /// 时刻已完成（任一终止状态）
    InstantFinished {
        /// 运行ID
        run_id: RunId,
        /// 分块序号
        chunk: usize,
        /// 评估时刻
        time: Timestamp,
        /// 终止状态
        status: InstantStatus,
        /// 全局已完成数
        finished: usize,
        /// 全局总数
        total: usize,
    },
    /// 分块已完成
    ChunkCompleted {
        /// 运行ID
        run_id: RunId,
        /// 分块序号
        chunk: usize,
        /// 运行时长 (秒)
        duration_secs: f64,
    },
    /// 分块崩溃
    ChunkFailed {
        /// 运行ID
        run_id: RunId,
        /// 分块序号
        chunk: usize,
        /// 错误信息
        error: String,
    },
    /// 运行已完成
    RunCompleted {
        /// 运行ID
        run_id: RunId,
        /// 运行时长 (秒)
        duration_secs: f64,
        /// 评估点数
        n_points: usize,
    },
}

impl EvalEvent {
    /// 获取事件对应的运行ID
    pub fn run_id(&self) -> RunId {
        match self {
            Self::RunStarted { run_id, .. } => *run_id,
            Self::ChunkStarted { run_id, .. } => *run_id,
            Self::InstantFinished { run_id, .. } => *run_id,
            Self::ChunkCompleted { run_id, .. } => *run_id,
            Self::ChunkFailed { run_id, .. } => *run_id,
            Self::RunCompleted { run_id, .. } => *run_id,
        }
    }

    /// 获取事件名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "RunStarted",
            Self::ChunkStarted { .. } => "ChunkStarted",
            Self::InstantFinished { .. } => "InstantFinished",
            Self::ChunkCompleted { .. } => "ChunkCompleted",
            Self::ChunkFailed { .. } => "ChunkFailed",
            Self::RunCompleted { .. } => "RunCompleted",
        }
    }
}

/// 事件监听器
///
/// 事件在工作线程上同步分发，实现应当轻量。
pub trait EventListener: Send + Sync {
    /// 处理事件
    fn on_event(&self, event: &EvalEvent);
}

impl<F> EventListener for F
where
    F: Fn(&EvalEvent) + Send + Sync,
{
    fn on_event(&self, event: &EvalEvent) {
        self(event);
    }
}

/// 日志事件监听器
pub struct LoggingListener {
    /// 日志前缀
    prefix: String,
    /// 是否输出每个时刻
    verbose: bool,
}

impl LoggingListener {
    /// 创建日志监听器
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            verbose: false,
        }
    }

    /// 设置详细模式
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl EventListener for LoggingListener {
    fn on_event(&self, event: &EvalEvent) {
        let msg = match event {
            EvalEvent::RunStarted {
                run_id,
                name,
                n_instants,
                n_chunks,
            } => format!(
                "Run '{}' (id={}) started: {} instants in {} chunk(s)",
                name, run_id, n_instants, n_chunks
            ),
            EvalEvent::ChunkStarted {
                chunk, n_instants, ..
            } => format!("Chunk {} started ({} instants)", chunk, n_instants),
            EvalEvent::ChunkCompleted {
                chunk,
                duration_secs,
                ..
            } => format!("Chunk {} completed in {:.2}s", chunk, duration_secs),
            EvalEvent::ChunkFailed { chunk, error, .. } => {
                tracing::warn!("{}: Chunk {} failed: {}", self.prefix, chunk, error);
                return;
            }
            EvalEvent::RunCompleted {
                run_id,
                duration_secs,
                n_points,
            } => format!(
                "Run {} completed in {:.2}s ({} evaluated points)",
                run_id, duration_secs, n_points
            ),
            EvalEvent::InstantFinished {
                time,
                status,
                finished,
                total,
                ..
            } if self.verbose => format!(
                "Instant {} {} ({}/{})",
                time.to_rfc3339(),
                status,
                finished,
                total
            ),
            EvalEvent::InstantFinished { .. } => return,
        };

        tracing::info!("{}: {}", self.prefix, msg);
    }
}

/// 事件分发器
///
/// 由引擎持有，调度器的各工作线程共享同一个实例。
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventDispatcher {
    /// 创建空的分发器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加监听器
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        self.listeners.write().push(listener);
    }

    /// 分发事件
    pub fn emit(&self, event: EvalEvent) {
        tracing::trace!(run = %event.run_id(), "emitting {}", event.name());
        for listener in self.listeners.read().iter() {
            listener.on_event(&event);
        }
    }

    /// 监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
