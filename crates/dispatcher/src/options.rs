use std::time::Duration;

use fleet_core::FailurePolicy;

/// 分发器的运行选项，对同一个分发器的所有分发生效
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOptions {
    pub failure_policy: FailurePolicy,
    /// 每个任务装货前的模拟处理延迟，期间会响应取消信号
    pub processing_delay: Duration,
    /// 单个任务从开始处理起允许的最长时间
    pub task_timeout: Option<Duration>,
}

impl DispatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_processing_delay(mut self, processing_delay: Duration) -> Self {
        self.processing_delay = processing_delay;
        self
    }

    pub fn with_task_timeout(mut self, task_timeout: Duration) -> Self {
        self.task_timeout = Some(task_timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DispatchOptions::new();
        assert_eq!(options.failure_policy, FailurePolicy::CollectAll);
        assert!(options.processing_delay.is_zero());
        assert!(options.task_timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let options = DispatchOptions::new()
            .with_failure_policy(FailurePolicy::FailFast)
            .with_processing_delay(Duration::from_millis(5))
            .with_task_timeout(Duration::from_secs(2));
        assert_eq!(options.failure_policy, FailurePolicy::FailFast);
        assert_eq!(options.processing_delay, Duration::from_millis(5));
        assert_eq!(options.task_timeout, Some(Duration::from_secs(2)));
    }
}
