use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fleet_errors::FailureKind;

use super::{FailurePolicy, OutcomeStatus, TaskOutcome, TaskRecord};

/// 一次分发的完整结果
///
/// `records` 按任务提交顺序排列，每个提交的任务恰好对应一条记录。
#[derive(Debug)]
pub struct DispatchReport<T> {
    pub dispatch_id: Uuid,
    pub policy: FailurePolicy,
    pub max_concurrency: usize,
    pub records: Vec<TaskRecord<T>>,
    /// 最先观察到的任务失败在 `records` 中的下标
    pub first_failure: Option<usize>,
    pub peak_in_flight: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<T> DispatchReport<T> {
    /// 没有任何任务时的空结果
    pub fn empty(dispatch_id: Uuid, policy: FailurePolicy, max_concurrency: usize) -> Self {
        let now = Utc::now();
        Self {
            dispatch_id,
            policy,
            max_concurrency,
            records: Vec::new(),
            first_failure: None,
            peak_in_flight: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskRecord<T>> {
        self.records.iter().find(|record| record.task_id == task_id)
    }

    pub fn outcome(&self, task_id: &str) -> Option<&TaskOutcome<T>> {
        self.get(task_id).map(|record| &record.outcome)
    }

    pub fn first_failure(&self) -> Option<&TaskRecord<T>> {
        self.first_failure.and_then(|index| self.records.get(index))
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome.status() == status)
            .count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.records.iter().all(|record| record.outcome.is_success())
    }

    /// 成功处理后的任务，按提交顺序返回
    pub fn successes(&self) -> impl Iterator<Item = &T> {
        self.records
            .iter()
            .filter_map(|record| record.outcome.as_success())
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn into_records(self) -> Vec<TaskRecord<T>> {
        self.records
    }

    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            dispatch_id: self.dispatch_id,
            policy: self.policy,
            max_concurrency: self.max_concurrency,
            total: self.len(),
            succeeded: self.count(OutcomeStatus::Succeeded),
            failed: self.count(OutcomeStatus::Failed),
            cancelled: self.count(OutcomeStatus::Cancelled),
            not_attempted: self.count(OutcomeStatus::NotAttempted),
            peak_in_flight: self.peak_in_flight,
            elapsed_ms: self.elapsed_ms(),
            first_failure: self.first_failure().map(|record| record.task_id.clone()),
            tasks: self
                .records
                .iter()
                .map(|record| TaskSummary {
                    task_id: record.task_id.clone(),
                    status: record.outcome.status(),
                    kind: record.outcome.failure_kind(),
                    message: record.outcome.message(),
                })
                .collect(),
        }
    }
}

/// 可序列化的分发摘要，用于日志和命令行输出
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchSummary {
    pub dispatch_id: Uuid,
    pub policy: FailurePolicy,
    pub max_concurrency: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub not_attempted: usize,
    pub peak_in_flight: usize,
    pub elapsed_ms: i64,
    pub first_failure: Option<String>,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSummary {
    pub task_id: String,
    pub status: OutcomeStatus,
    pub kind: Option<FailureKind>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_errors::{CancelCause, CargoError, DispatchError};

    fn sample_report() -> DispatchReport<i32> {
        let mut report = DispatchReport::empty(Uuid::new_v4(), FailurePolicy::FailFast, 2);
        report.records = vec![
            TaskRecord::new(0, "A".to_string(), TaskOutcome::Success(1)),
            TaskRecord::new(
                1,
                "B".to_string(),
                TaskOutcome::Failure(DispatchError::unload_failure(
                    "B",
                    CargoError::rejected("stuck"),
                )),
            ),
            TaskRecord::new(2, "C".to_string(), TaskOutcome::Cancelled(CancelCause::Signal)),
            TaskRecord::new(3, "D".to_string(), TaskOutcome::NotAttempted),
        ];
        report.first_failure = Some(1);
        report.peak_in_flight = 2;
        report
    }

    #[test]
    fn test_empty_report() {
        let report: DispatchReport<i32> =
            DispatchReport::empty(Uuid::new_v4(), FailurePolicy::CollectAll, 4);
        assert!(report.is_empty());
        assert!(report.all_succeeded());
        assert!(report.first_failure().is_none());
        assert_eq!(report.elapsed_ms(), 0);
    }

    #[test]
    fn test_lookup_and_counts() {
        let report = sample_report();

        assert_eq!(report.len(), 4);
        assert_eq!(report.get("C").map(|r| r.index), Some(2));
        assert!(report.get("Z").is_none());
        assert_eq!(report.count(OutcomeStatus::Succeeded), 1);
        assert_eq!(report.count(OutcomeStatus::NotAttempted), 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.successes().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(report.first_failure().map(|r| r.task_id.as_str()), Some("B"));
    }

    #[test]
    fn test_summary() {
        let summary = sample_report().summary();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.not_attempted, 1);
        assert_eq!(summary.first_failure.as_deref(), Some("B"));
        assert_eq!(summary.tasks[1].kind, Some(FailureKind::Unload));
        assert_eq!(summary.tasks[0].message, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["policy"], "fail-fast");
        assert_eq!(json["tasks"][3]["status"], "NOT_ATTEMPTED");
    }
}
