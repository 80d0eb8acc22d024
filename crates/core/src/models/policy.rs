use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fleet_errors::DispatchError;

/// 失败聚合策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// 所有任务都执行到终态，调用方拿到完整的结果序列
    #[default]
    CollectAll,
    /// 首个失败出现后不再启动新任务，已在执行的任务正常结束
    FailFast,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::CollectAll => "collect-all",
            FailurePolicy::FailFast => "fail-fast",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = DispatchError;

    fn from_str(policy: &str) -> Result<Self, Self::Err> {
        match policy.to_lowercase().replace('_', "-").as_str() {
            "collect-all" => Ok(FailurePolicy::CollectAll),
            "fail-fast" => Ok(FailurePolicy::FailFast),
            _ => Err(DispatchError::config_error(format!(
                "无效的失败策略: {policy}"
            ))),
        }
    }
}
