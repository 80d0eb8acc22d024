//! 单个任务的处理流程
//!
//! 处理顺序为：检查取消信号、可选的处理延迟、装货、卸货。
//! 每个挂起点都与取消信号和单任务超时竞争，信号优先。

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fleet_core::{CancelCause, DispatchError, SignalListener, Task, TaskOutcome};
use futures::FutureExt;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error};

use crate::options::DispatchOptions;

/// 处理一个任务直到终态
///
/// 装货失败时不会调用卸货；被取消的任务直接丢弃，其内部状态不再有意义。
pub async fn process_task<T: Task>(
    mut task: T,
    listener: &SignalListener,
    options: &DispatchOptions,
) -> TaskOutcome<T> {
    let task_id = task.id().to_string();

    if let Some(cause) = listener.cause() {
        debug!(task_id = %task_id, cause = %cause, "取消信号已触发，跳过任务");
        return TaskOutcome::Cancelled(cause);
    }

    let task_deadline = options.task_timeout.map(|timeout| Instant::now() + timeout);

    if !options.processing_delay.is_zero() {
        if let Err(cause) = race(sleep(options.processing_delay), listener, task_deadline).await {
            debug!(task_id = %task_id, cause = %cause, "处理延迟期间任务被取消");
            return TaskOutcome::Cancelled(cause);
        }
    }

    let loaded = race(task.load_cargo(), listener, task_deadline).await;
    match loaded {
        Err(cause) => {
            debug!(task_id = %task_id, cause = %cause, "装货期间任务被取消");
            return TaskOutcome::Cancelled(cause);
        }
        Ok(Err(e)) => return TaskOutcome::Failure(DispatchError::load_failure(task_id, e)),
        Ok(Ok(())) => {}
    }

    let unloaded = race(task.unload_cargo(), listener, task_deadline).await;
    match unloaded {
        Err(cause) => {
            debug!(task_id = %task_id, cause = %cause, "卸货期间任务被取消");
            TaskOutcome::Cancelled(cause)
        }
        Ok(Err(e)) => TaskOutcome::Failure(DispatchError::unload_failure(task_id, e)),
        Ok(Ok(())) => TaskOutcome::Success(task),
    }
}

/// 与 [`process_task`] 相同，但把任务内部的panic转换为 `TaskPanicked` 失败
pub async fn process_task_guarded<T: Task>(
    task: T,
    listener: &SignalListener,
    options: &DispatchOptions,
) -> TaskOutcome<T> {
    let task_id = task.id().to_string();
    match AssertUnwindSafe(process_task(task, listener, options))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(task_id = %task_id, "任务处理过程中发生panic: {message}");
            TaskOutcome::Failure(DispatchError::panicked(task_id, message))
        }
    }
}

async fn race<F: Future>(
    step: F,
    listener: &SignalListener,
    task_deadline: Option<Instant>,
) -> Result<F::Output, CancelCause> {
    let timeout = async move {
        match task_deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        cause = listener.triggered() => Err(cause),
        _ = timeout => Err(CancelCause::TaskTimeout),
        output = step => Ok(output),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知panic".to_string()
    }
}

/// 正在处理中的任务数量，同时记录观察到的峰值
#[derive(Debug, Clone, Default)]
pub struct InFlightGauge {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl InFlightGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计数加一，返回的guard被丢弃时计数减一
    pub fn enter(&self) -> InFlightGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard {
            current: Arc::clone(&self.current),
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    current: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}
