use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use fleet_core::{CancelCause, DispatchSummary, FailureKind, FailurePolicy};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 分发过程中向调用方报告的进度事件
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    Started {
        dispatch_id: Uuid,
        total: usize,
        policy: FailurePolicy,
        workers: usize,
    },
    TaskStarted {
        task_id: String,
        worker_id: usize,
    },
    TaskSucceeded {
        task_id: String,
        elapsed: Duration,
    },
    TaskFailed {
        task_id: String,
        kind: FailureKind,
        message: String,
    },
    TaskCancelled {
        task_id: String,
        cause: CancelCause,
    },
    /// 快速失败模式下未启动的任务
    TaskSkipped {
        task_id: String,
    },
    Finished {
        summary: DispatchSummary,
    },
}

impl DispatchEvent {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            DispatchEvent::TaskStarted { task_id, .. }
            | DispatchEvent::TaskSucceeded { task_id, .. }
            | DispatchEvent::TaskFailed { task_id, .. }
            | DispatchEvent::TaskCancelled { task_id, .. }
            | DispatchEvent::TaskSkipped { task_id } => Some(task_id),
            DispatchEvent::Started { .. } | DispatchEvent::Finished { .. } => None,
        }
    }

    /// 任务是否已到达终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DispatchEvent::TaskSucceeded { .. }
                | DispatchEvent::TaskFailed { .. }
                | DispatchEvent::TaskCancelled { .. }
                | DispatchEvent::TaskSkipped { .. }
        )
    }
}

/// 进度事件接收方
///
/// 由worker直接调用，实现必须快速返回且不能阻塞。
#[cfg_attr(test, mockall::automock)]
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &DispatchEvent);
}

/// 通知接收方，接收方内部的panic只记录日志，不会影响worker
pub(crate) fn notify(sink: &dyn ProgressSink, event: &DispatchEvent) {
    if panic::catch_unwind(AssertUnwindSafe(|| sink.on_event(event))).is_err() {
        error!(task_id = event.task_id().unwrap_or("-"), "进度接收方处理事件时发生panic");
    }
}

/// 把进度事件写入tracing日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn on_event(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::Started {
                dispatch_id,
                total,
                policy,
                workers,
            } => info!(
                dispatch_id = %dispatch_id,
                total,
                policy = %policy,
                workers,
                "分发开始"
            ),
            DispatchEvent::TaskStarted { task_id, worker_id } => {
                info!(task_id = %task_id, worker_id, "Start processing truck")
            }
            DispatchEvent::TaskSucceeded { task_id, elapsed } => info!(
                task_id = %task_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "Finish processing truck"
            ),
            DispatchEvent::TaskFailed {
                task_id,
                kind,
                message,
            } => warn!(task_id = %task_id, kind = ?kind, "任务处理失败: {message}"),
            DispatchEvent::TaskCancelled { task_id, cause } => {
                warn!(task_id = %task_id, cause = %cause, "任务已取消")
            }
            DispatchEvent::TaskSkipped { task_id } => {
                info!(task_id = %task_id, "快速失败已触发，任务未启动")
            }
            DispatchEvent::Finished { summary } => info!(
                dispatch_id = %summary.dispatch_id,
                succeeded = summary.succeeded,
                failed = summary.failed,
                cancelled = summary.cancelled,
                not_attempted = summary.not_attempted,
                elapsed_ms = summary.elapsed_ms,
                "分发结束"
            ),
        }
    }
}

/// 把进度事件转发到无界channel，接收端关闭后事件被丢弃
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    sender: mpsc::UnboundedSender<DispatchEvent>,
}

impl ChannelProgressSink {
    pub fn new(sender: mpsc::UnboundedSender<DispatchEvent>) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DispatchEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn on_event(&self, event: &DispatchEvent) {
        let _ = self.sender.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_task_id() {
        let event = DispatchEvent::TaskSkipped {
            task_id: "NT1".to_string(),
        };
        assert_eq!(event.task_id(), Some("NT1"));
        assert!(event.is_terminal());

        let event = DispatchEvent::Started {
            dispatch_id: Uuid::new_v4(),
            total: 3,
            policy: FailurePolicy::CollectAll,
            workers: 2,
        };
        assert_eq!(event.task_id(), None);
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_channel_sink_forwards_events() {
        let (sink, mut receiver) = ChannelProgressSink::channel();
        sink.on_event(&DispatchEvent::TaskStarted {
            task_id: "ET1".to_string(),
            worker_id: 0,
        });

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.task_id(), Some("ET1"));
    }

    #[test]
    fn test_notify_contains_sink_panic() {
        struct ExplodingSink;

        impl ProgressSink for ExplodingSink {
            fn on_event(&self, _event: &DispatchEvent) {
                panic!("sink exploded");
            }
        }

        notify(
            &ExplodingSink,
            &DispatchEvent::TaskSkipped {
                task_id: "NT1".to_string(),
            },
        );
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (sink, receiver) = ChannelProgressSink::channel();
        drop(receiver);
        sink.on_event(&DispatchEvent::TaskSkipped {
            task_id: "NT2".to_string(),
        });
    }
}
