use std::time::Duration;

use fleet_core::FailurePolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub max_concurrency: i32,
    pub failure_policy: FailurePolicy,
    /// 每个任务开始装货前的模拟延迟（毫秒）
    pub processing_delay_ms: u64,
    pub task_timeout_ms: Option<u64>,
    /// 整体分发的截止时间（毫秒），从分发开始计算
    pub deadline_ms: Option<u64>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 2,
            failure_policy: FailurePolicy::CollectAll,
            processing_delay_ms: 1000,
            task_timeout_ms: None,
            deadline_ms: None,
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_concurrency <= 0 {
            return Err(anyhow::anyhow!("最大并发数必须大于0"));
        }

        if self.task_timeout_ms == Some(0) {
            return Err(anyhow::anyhow!("任务超时时间必须大于0"));
        }

        if self.deadline_ms == Some(0) {
            return Err(anyhow::anyhow!("分发截止时间必须大于0"));
        }

        Ok(())
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DispatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.failure_policy, FailurePolicy::CollectAll);
        assert_eq!(config.processing_delay(), Duration::from_secs(1));
        assert!(config.task_timeout().is_none());
    }

    #[test]
    fn test_rejects_non_positive_concurrency() {
        for max_concurrency in [0, -3] {
            let config = DispatcherConfig {
                max_concurrency,
                ..DispatcherConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert_eq!(err.to_string(), "最大并发数必须大于0");
        }
    }

    #[test]
    fn test_rejects_zero_timeouts() {
        let config = DispatcherConfig {
            task_timeout_ms: Some(0),
            ..DispatcherConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DispatcherConfig {
            deadline_ms: Some(0),
            ..DispatcherConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
