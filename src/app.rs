use std::sync::Arc;

use anyhow::{Context, Result};
use fleet_config::{AppConfig, DispatcherConfig, FleetConfig, TruckKind};
use fleet_core::{CancellationSignal, DispatchReport, FailurePolicy, LogFormat, LogLevel};
use fleet_dispatcher::{DispatchOptions, DispatchRequest, Dispatcher, ProgressSink};
use fleet_domain::Truck;
use tracing::info;

/// 命令行对配置的覆盖，未指定的字段保留配置文件中的值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub max_concurrency: Option<i32>,
    pub failure_policy: Option<FailurePolicy>,
    pub deadline_ms: Option<u64>,
    pub task_timeout_ms: Option<u64>,
    pub processing_delay_ms: Option<u64>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
}

impl CliOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(max_concurrency) = self.max_concurrency {
            config.dispatcher.max_concurrency = max_concurrency;
        }
        if let Some(policy) = self.failure_policy {
            config.dispatcher.failure_policy = policy;
        }
        if let Some(deadline_ms) = self.deadline_ms {
            config.dispatcher.deadline_ms = Some(deadline_ms);
        }
        if let Some(task_timeout_ms) = self.task_timeout_ms {
            config.dispatcher.task_timeout_ms = Some(task_timeout_ms);
        }
        if let Some(processing_delay_ms) = self.processing_delay_ms {
            config.dispatcher.processing_delay_ms = processing_delay_ms;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

pub fn dispatch_options(config: &DispatcherConfig) -> DispatchOptions {
    let options = DispatchOptions::new()
        .with_failure_policy(config.failure_policy)
        .with_processing_delay(config.processing_delay());
    match config.task_timeout() {
        Some(timeout) => options.with_task_timeout(timeout),
        None => options,
    }
}

/// 按配置顺序创建车队
pub fn build_fleet(config: &FleetConfig) -> Vec<Truck> {
    config
        .trucks
        .iter()
        .map(|spec| match spec.kind {
            TruckKind::Normal => Truck::normal(spec.id.as_str(), spec.cargo),
            TruckKind::Electric => {
                Truck::electric(spec.id.as_str(), spec.cargo, spec.battery.unwrap_or_default())
            }
        })
        .collect()
}

/// 车队分发应用
pub struct FleetApp {
    config: AppConfig,
    dispatcher: Dispatcher,
}

impl FleetApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let dispatcher = Dispatcher::new(dispatch_options(&config.dispatcher));
        Ok(Self { config, dispatcher })
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.dispatcher = self.dispatcher.with_progress_sink(sink);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 创建本次运行的取消信号，配置了截止时间时从现在开始计时
    pub fn new_signal(&self) -> CancellationSignal {
        match self.config.dispatcher.deadline() {
            Some(deadline) => CancellationSignal::with_timeout(deadline),
            None => CancellationSignal::new(),
        }
    }

    pub async fn run(
        &self,
        signal: CancellationSignal,
        operator: Option<String>,
    ) -> Result<DispatchReport<Truck>> {
        let fleet = build_fleet(&self.config.fleet);
        info!(
            trucks = fleet.len(),
            max_concurrency = self.config.dispatcher.max_concurrency,
            policy = %self.dispatcher.failure_policy(),
            "开始处理车队"
        );

        let mut request = DispatchRequest::new(fleet, self.config.dispatcher.max_concurrency)
            .with_signal(signal);
        if let Some(operator) = operator {
            request = request.with_operator(operator);
        }

        self.dispatcher
            .dispatch(request)
            .await
            .context("车队分发失败")
    }
}
