use serde::{Deserialize, Serialize};

use fleet_errors::{CancelCause, DispatchError, FailureKind};

/// 单个任务的最终结果
#[derive(Debug)]
pub enum TaskOutcome<T> {
    /// 装货和卸货都成功，携带处理后的任务
    Success(T),
    /// 装货或卸货失败
    Failure(DispatchError),
    /// 取消信号先于任务完成触发
    Cancelled(CancelCause),
    /// 快速失败模式下，任务尚未开始就被跳过
    NotAttempted,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
    #[serde(rename = "NOT_ATTEMPTED")]
    NotAttempted,
}

impl<T> TaskOutcome<T> {
    pub fn status(&self) -> OutcomeStatus {
        match self {
            TaskOutcome::Success(_) => OutcomeStatus::Succeeded,
            TaskOutcome::Failure(_) => OutcomeStatus::Failed,
            TaskOutcome::Cancelled(_) => OutcomeStatus::Cancelled,
            TaskOutcome::NotAttempted => OutcomeStatus::NotAttempted,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failure(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskOutcome::Cancelled(_))
    }

    pub fn is_not_attempted(&self) -> bool {
        matches!(self, TaskOutcome::NotAttempted)
    }

    pub fn as_success(&self) -> Option<&T> {
        match self {
            TaskOutcome::Success(task) => Some(task),
            _ => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            TaskOutcome::Success(task) => Some(task),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&DispatchError> {
        match self {
            TaskOutcome::Failure(error) => Some(error),
            _ => None,
        }
    }

    pub fn cancel_cause(&self) -> Option<CancelCause> {
        match self {
            TaskOutcome::Cancelled(cause) => Some(*cause),
            _ => None,
        }
    }

    /// 失败类别，成功和未执行的任务没有类别
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            TaskOutcome::Failure(error) => Some(error.kind()),
            TaskOutcome::Cancelled(_) => Some(FailureKind::Cancelled),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            TaskOutcome::Success(_) => None,
            TaskOutcome::Failure(error) => Some(error.to_string()),
            TaskOutcome::Cancelled(cause) => Some(cause.to_string()),
            TaskOutcome::NotAttempted => Some("快速失败模式下任务未执行".to_string()),
        }
    }
}

/// 分发结果中的一条记录，`index` 为任务的提交顺序
#[derive(Debug)]
pub struct TaskRecord<T> {
    pub index: usize,
    pub task_id: String,
    pub outcome: TaskOutcome<T>,
}

impl<T> TaskRecord<T> {
    pub fn new(index: usize, task_id: String, outcome: TaskOutcome<T>) -> Self {
        Self {
            index,
            task_id,
            outcome,
        }
    }
}
