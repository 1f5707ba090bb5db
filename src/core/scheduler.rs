//! 任务调度系统
//!
//! 后台异步任务（重生定时器、摄像头请求）跑在 tokio 运行时上，
//! 结果通过 crossbeam 通道交回主线程，主线程每帧排空一次。
//!
//! ## 功能特性
//!
//! - `TaskRuntime`：后台运行时，持有 tokio 运行时
//! - `RespawnScheduler`：可取消的周期性重生定时器

use crate::core::error::{TendrilsError, TendrilsResult};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// 后台任务运行时
///
/// 只运行定时器和摄像头请求，从不直接触碰主线程状态。
pub struct TaskRuntime {
    runtime: tokio::runtime::Runtime,
    worker_count: usize,
}

impl TaskRuntime {
    /// 创建运行时
    ///
    /// # 参数
    /// - `worker_threads`: 工作线程数量，0 按 1 处理
    pub fn new(worker_threads: usize) -> TendrilsResult<Self> {
        let workers = worker_threads.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("tendrils-worker")
            .enable_all()
            .build()
            .map_err(|e| TendrilsError::Init(format!("Failed to create tokio runtime: {e}")))?;

        Ok(Self {
            runtime,
            worker_count: workers,
        })
    }

    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

/// 定时器的一次触发
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespawnTick {
    pub generation: u64,
}

/// 周期性重生定时器
///
/// 每 `interval_ms` 毫秒触发一次摄像头重生。`set(0)` 停用；
/// `set(n)` 总是先取消正在运行的定时器，即使间隔没有变化。
/// 任意时刻最多只有一个定时器在运行。
pub struct RespawnScheduler {
    runtime: Handle,
    interval_ms: u32,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    tick_tx: Sender<RespawnTick>,
    tick_rx: Receiver<RespawnTick>,
}

impl RespawnScheduler {
    pub fn new(runtime: Handle) -> Self {
        let (tick_tx, tick_rx) = unbounded();
        Self {
            runtime,
            interval_ms: 0,
            generation: 0,
            timer: None,
            tick_tx,
            tick_rx,
        }
    }

    /// 设置重生周期（毫秒），0 表示停用
    pub fn set(&mut self, interval_ms: u32) {
        self.cancel();
        self.generation += 1;
        self.interval_ms = interval_ms;

        if interval_ms == 0 {
            tracing::debug!(target: "tendrils::scheduler", "Respawn timer disabled");
            return;
        }

        let period = Duration::from_millis(u64::from(interval_ms));
        let generation = self.generation;
        let tx = self.tick_tx.clone();

        self.timer = Some(self.runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(RespawnTick { generation }).is_err() {
                    break;
                }
            }
        }));

        tracing::debug!(
            target: "tendrils::scheduler",
            interval_ms,
            generation,
            "Respawn timer started"
        );
    }

    /// 排空通道，返回当前代次到期的触发次数
    ///
    /// 取消之前排队的旧代次触发会被丢弃。
    pub fn drain_due(&self) -> usize {
        self.tick_rx
            .try_iter()
            .filter(|tick| tick.generation == self.generation)
            .count()
    }

    /// 正在运行的定时器数量（0 或 1）
    pub fn active_timers(&self) -> usize {
        match &self.timer {
            Some(handle) if !handle.is_finished() => 1,
            _ => 0,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

impl Drop for RespawnScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for RespawnScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespawnScheduler")
            .field("interval_ms", &self.interval_ms)
            .field("generation", &self.generation)
            .field("active_timers", &self.active_timers())
            .finish()
    }
}
