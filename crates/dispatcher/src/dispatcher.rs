use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fleet_core::{
    CancellationSignal, DispatchError, DispatchReport, DispatchResult, FailurePolicy,
    SignalListener, Task, TaskOutcome, TaskRecord,
};
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::options::DispatchOptions;
use crate::processor::{process_task_guarded, InFlightGauge};
use crate::progress::{notify, DispatchEvent, ProgressSink};
use crate::request::DispatchRequest;

/// 有界并发分发器
///
/// 每次 [`Dispatcher::dispatch`] 调用都会创建独立的任务队列、结果channel和worker池，
/// 分发器本身可以被多次复用。
#[derive(Clone, Default)]
pub struct Dispatcher {
    options: DispatchOptions,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("options", &self.options)
            .field("has_progress_sink", &self.sink.is_some())
            .finish()
    }
}

/// 使用默认选项（收集全部失败）执行一次分发
pub async fn dispatch<T: Task>(
    tasks: Vec<T>,
    max_concurrency: i32,
    signal: &CancellationSignal,
) -> DispatchResult<DispatchReport<T>> {
    Dispatcher::default()
        .dispatch(DispatchRequest::new(tasks, max_concurrency).with_signal(signal.clone()))
        .await
}

impl Dispatcher {
    pub fn new(options: DispatchOptions) -> Self {
        Self {
            options,
            sink: None,
        }
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.options.failure_policy
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// 执行一次分发并等待所有任务到达终态
    ///
    /// 只有参数无效时返回错误；单个任务的失败、取消和panic都记录在报告中。
    pub async fn dispatch<T: Task>(
        &self,
        request: DispatchRequest<T>,
    ) -> DispatchResult<DispatchReport<T>> {
        let (tasks, max_concurrency, signal, operator) = request.into_parts();
        let max_concurrency = validate_concurrency(max_concurrency)?;
        let policy = self.options.failure_policy;
        let dispatch_id = Uuid::new_v4();

        if tasks.is_empty() {
            debug!(dispatch_id = %dispatch_id, "没有需要分发的任务");
            return Ok(DispatchReport::empty(dispatch_id, policy, max_concurrency));
        }
        let task_ids = validate_task_ids(&tasks)?;

        let span = info_span!(
            "dispatch",
            dispatch_id = %dispatch_id,
            policy = %policy,
            max_concurrency,
            operator = operator.as_deref().unwrap_or("-"),
        );

        async move {
            let report = self
                .run(dispatch_id, tasks, task_ids, max_concurrency, signal.listener())
                .await;
            let summary = report.summary();
            info!(
                total = summary.total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                cancelled = summary.cancelled,
                not_attempted = summary.not_attempted,
                peak_in_flight = summary.peak_in_flight,
                "分发完成"
            );
            self.emit(DispatchEvent::Finished { summary });
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn run<T: Task>(
        &self,
        dispatch_id: Uuid,
        tasks: Vec<T>,
        task_ids: Vec<String>,
        max_concurrency: usize,
        listener: SignalListener,
    ) -> DispatchReport<T> {
        let started_at = Utc::now();
        let total = tasks.len();
        let workers = max_concurrency.min(total);
        let policy = self.options.failure_policy;

        info!(total, workers, "开始分发任务");
        self.emit(DispatchEvent::Started {
            dispatch_id,
            total,
            policy,
            workers,
        });

        let (results, mut receiver) = mpsc::unbounded_channel();
        let gauge = InFlightGauge::new();
        let shared = Arc::new(WorkerShared {
            queue: Mutex::new(tasks.into_iter().enumerate().collect()),
            results,
            listener,
            options: self.options.clone(),
            halt: AtomicBool::new(false),
            gauge: gauge.clone(),
            sink: self.sink.clone(),
        });

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let shared = Arc::clone(&shared);
                tokio::spawn(worker_loop(worker_id, shared).in_current_span())
            })
            .collect();
        drop(shared);

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                error!("worker异常退出: {e}");
            }
        }

        let mut slots: Vec<Option<TaskOutcome<T>>> = (0..total).map(|_| None).collect();
        let mut first_failure = None;
        while let Ok(completed) = receiver.try_recv() {
            if first_failure.is_none() && completed.outcome.is_failure() {
                first_failure = Some(completed.index);
            }
            debug_assert!(slots[completed.index].is_none());
            slots[completed.index] = Some(completed.outcome);
        }

        let records = task_ids
            .into_iter()
            .zip(slots)
            .enumerate()
            .map(|(index, (task_id, slot))| {
                let outcome = slot.unwrap_or_else(|| {
                    error!(task_id = %task_id, "任务没有返回结果");
                    TaskOutcome::Failure(DispatchError::panicked(
                        task_id.clone(),
                        "worker异常退出，任务没有返回结果",
                    ))
                });
                TaskRecord::new(index, task_id, outcome)
            })
            .collect::<Vec<_>>();

        if first_failure.is_none() {
            first_failure = records.iter().position(|record| record.outcome.is_failure());
        }

        DispatchReport {
            dispatch_id,
            policy,
            max_concurrency,
            records,
            first_failure,
            peak_in_flight: gauge.peak(),
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn emit(&self, event: DispatchEvent) {
        if let Some(sink) = &self.sink {
            notify(sink.as_ref(), &event);
        }
    }
}

fn validate_concurrency(max_concurrency: i32) -> DispatchResult<usize> {
    if max_concurrency < 1 {
        return Err(DispatchError::invalid_configuration(format!(
            "最大并发数必须大于等于1，实际为 {max_concurrency}"
        )));
    }
    Ok(max_concurrency as usize)
}

fn validate_task_ids<T: Task>(tasks: &[T]) -> DispatchResult<Vec<String>> {
    let mut seen = HashSet::with_capacity(tasks.len());
    let mut ids = Vec::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id()) {
            return Err(DispatchError::invalid_configuration(format!(
                "任务ID重复: {}",
                task.id()
            )));
        }
        ids.push(task.id().to_string());
    }
    Ok(ids)
}

struct Completed<T> {
    index: usize,
    outcome: TaskOutcome<T>,
}

struct WorkerShared<T> {
    queue: Mutex<VecDeque<(usize, T)>>,
    results: mpsc::UnboundedSender<Completed<T>>,
    listener: SignalListener,
    options: DispatchOptions,
    /// 快速失败模式下置位后不再启动新任务
    halt: AtomicBool,
    gauge: InFlightGauge,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl<T: Task> WorkerShared<T> {
    fn emit(&self, event: DispatchEvent) {
        if let Some(sink) = &self.sink {
            notify(sink.as_ref(), &event);
        }
    }

    fn trip_fail_fast(&self, task_id: &str) {
        if self.options.failure_policy == FailurePolicy::FailFast
            && !self.halt.swap(true, Ordering::SeqCst)
        {
            warn!(task_id = %task_id, "快速失败已触发，停止启动新任务");
        }
    }

    fn complete(&self, index: usize, task_id: String, outcome: TaskOutcome<T>, elapsed: Duration) {
        let event = match &outcome {
            TaskOutcome::Success(_) => DispatchEvent::TaskSucceeded {
                task_id,
                elapsed,
            },
            TaskOutcome::Failure(e) => DispatchEvent::TaskFailed {
                task_id,
                kind: e.kind(),
                message: e.to_string(),
            },
            TaskOutcome::Cancelled(cause) => DispatchEvent::TaskCancelled {
                task_id,
                cause: *cause,
            },
            TaskOutcome::NotAttempted => DispatchEvent::TaskSkipped { task_id },
        };
        self.emit(event);

        if self.results.send(Completed { index, outcome }).is_err() {
            error!("结果channel已关闭");
        }
    }
}

async fn worker_loop<T: Task>(worker_id: usize, shared: Arc<WorkerShared<T>>) {
    debug!(worker_id, "worker启动");
    loop {
        let next = shared.queue.lock().await.pop_front();
        let Some((index, task)) = next else {
            break;
        };
        let task_id = task.id().to_string();

        if let Some(cause) = shared.listener.cause() {
            shared.complete(index, task_id, TaskOutcome::Cancelled(cause), Duration::ZERO);
            continue;
        }
        if shared.halt.load(Ordering::SeqCst) {
            shared.complete(index, task_id, TaskOutcome::NotAttempted, Duration::ZERO);
            continue;
        }

        shared.emit(DispatchEvent::TaskStarted {
            task_id: task_id.clone(),
            worker_id,
        });
        let started = Instant::now();
        let outcome = {
            let _in_flight = shared.gauge.enter();
            process_task_guarded(task, &shared.listener, &shared.options).await
        };

        match &outcome {
            TaskOutcome::Failure(e) if e.is_task_failure() => {
                warn!(task_id = %task_id, worker_id, "任务处理失败: {e}");
                shared.trip_fail_fast(&task_id);
            }
            TaskOutcome::Cancelled(cause) => {
                info!(task_id = %task_id, worker_id, cause = %cause, "任务已取消");
            }
            _ => debug!(task_id = %task_id, worker_id, "任务处理完成"),
        }
        shared.complete(index, task_id, outcome, started.elapsed());
    }
    debug!(worker_id, "worker退出");
}
