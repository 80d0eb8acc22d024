use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 任务自身装卸货操作返回的错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CargoError {
    #[error("车辆未找到: {id}")]
    NotFound { id: String },
    #[error("车辆操作未实现: {id}")]
    NotImplemented { id: String },
    #[error("装卸操作被拒绝: {0}")]
    Rejected(String),
}

impl CargoError {
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }
    pub fn not_implemented<S: Into<String>>(id: S) -> Self {
        Self::NotImplemented { id: id.into() }
    }
    pub fn rejected<S: Into<String>>(msg: S) -> Self {
        Self::Rejected(msg.into())
    }
}

/// 任务被取消的原因
///
/// 取消不属于 [`DispatchError`]，由任务结果中的取消分支携带。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelCause {
    /// 调用方手动触发了取消信号
    Signal,
    /// 整体分发的截止时间已到
    Deadline,
    /// 单个任务处理超时
    TaskTimeout,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CancelCause::Signal => "取消信号已触发",
            CancelCause::Deadline => "分发截止时间已到",
            CancelCause::TaskTimeout => "任务处理超时",
        };
        f.write_str(text)
    }
}

/// 失败类别，供调用方按类别决定后续策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Load,
    Unload,
    Cancelled,
    Panicked,
    InvalidConfiguration,
    Configuration,
}

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("error loading cargo: {source}")]
    LoadFailure {
        task_id: String,
        #[source]
        source: CargoError,
    },
    #[error("error unloading cargo: {source}")]
    UnloadFailure {
        task_id: String,
        #[source]
        source: CargoError,
    },
    #[error("任务处理过程中发生panic: {task_id} - {message}")]
    TaskPanicked { task_id: String, message: String },
    #[error("无效的分发参数: {0}")]
    InvalidConfiguration(String),
    #[error("配置错误: {0}")]
    Configuration(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn load_failure<S: Into<String>>(task_id: S, source: CargoError) -> Self {
        Self::LoadFailure {
            task_id: task_id.into(),
            source,
        }
    }
    pub fn unload_failure<S: Into<String>>(task_id: S, source: CargoError) -> Self {
        Self::UnloadFailure {
            task_id: task_id.into(),
            source,
        }
    }
    pub fn panicked<S: Into<String>, M: Into<String>>(task_id: S, message: M) -> Self {
        Self::TaskPanicked {
            task_id: task_id.into(),
            message: message.into(),
        }
    }
    pub fn invalid_configuration<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::LoadFailure { .. } => FailureKind::Load,
            DispatchError::UnloadFailure { .. } => FailureKind::Unload,
            DispatchError::TaskPanicked { .. } => FailureKind::Panicked,
            DispatchError::InvalidConfiguration(_) => FailureKind::InvalidConfiguration,
            DispatchError::Configuration(_) => FailureKind::Configuration,
        }
    }
    /// 返回与错误关联的任务ID，分发级别的错误没有任务ID
    pub fn task_id(&self) -> Option<&str> {
        match self {
            DispatchError::LoadFailure { task_id, .. }
            | DispatchError::UnloadFailure { task_id, .. }
            | DispatchError::TaskPanicked { task_id, .. } => Some(task_id),
            DispatchError::InvalidConfiguration(_) | DispatchError::Configuration(_) => None,
        }
    }
    /// 任务级失败只记录在对应任务的结果中，不会中断整个分发
    pub fn is_task_failure(&self) -> bool {
        matches!(
            self,
            DispatchError::LoadFailure { .. }
                | DispatchError::UnloadFailure { .. }
                | DispatchError::TaskPanicked { .. }
        )
    }
}
