use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use fleet_config::AppConfig;
use fleet_core::{init_logging, DispatchSummary, FailurePolicy, LogFormat, LogLevel, Task};
use fleet_dispatch::app::{CliOverrides, FleetApp};
use fleet_dispatch::shutdown::forward_shutdown_signal;
use fleet_dispatcher::TracingProgressSink;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    // 加载配置并应用命令行覆盖
    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let mut config = AppConfig::load(config_path).with_context(|| match config_path {
        Some(path) => format!("加载配置文件失败: {path}"),
        None => "加载配置失败".to_string(),
    })?;
    parse_overrides(&matches)?.apply(&mut config);
    config.validate()?;

    if matches.get_flag("print-config") {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    // 初始化日志系统
    init_logging(&config.logging).context("初始化日志系统失败")?;
    info!("启动车队分发程序");

    let json_output = matches.get_flag("json");
    let operator = matches.get_one::<String>("operator").cloned();
    let mut app = FleetApp::new(config)?;
    if !json_output {
        app = app.with_progress_sink(Arc::new(TracingProgressSink));
    }

    let signal = app.new_signal();
    let shutdown_forwarder = forward_shutdown_signal(signal.clone());
    let report = app.run(signal, operator).await?;
    shutdown_forwarder.abort();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    } else {
        for truck in report.successes() {
            info!(
                truck_id = truck.id(),
                cargo = truck.cargo(),
                battery = ?truck.battery(),
                "车辆处理完成"
            );
        }
        if let Some(record) = report.first_failure() {
            warn!(
                task_id = %record.task_id,
                "首个失败: {}",
                record.outcome.message().unwrap_or_default()
            );
        }
    }

    let summary = report.summary();
    if summary.succeeded == summary.total {
        info!("{}", finish_message(&summary));
    } else {
        warn!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            not_attempted = summary.not_attempted,
            "{}",
            finish_message(&summary)
        );
    }
    Ok(())
}

fn finish_message(summary: &DispatchSummary) -> &'static str {
    if summary.succeeded == summary.total {
        "All trucks processed"
    } else {
        "车队处理结束，部分车辆未成功"
    }
}

fn build_cli() -> Command {
    Command::new("fleet-dispatch")
        .version("1.0.0")
        .about("有界并发车队任务分发")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径"),
        )
        .arg(
            Arg::new("max-concurrency")
                .short('n')
                .long("max-concurrency")
                .value_name("N")
                .help("最大并发数")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i32)),
        )
        .arg(
            Arg::new("policy")
                .short('p')
                .long("policy")
                .value_name("POLICY")
                .help("失败处理策略")
                .value_parser(["collect-all", "fail-fast"]),
        )
        .arg(
            Arg::new("deadline-ms")
                .long("deadline-ms")
                .value_name("MS")
                .help("整体分发截止时间（毫秒）")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("task-timeout-ms")
                .long("task-timeout-ms")
                .value_name("MS")
                .help("单个任务超时时间（毫秒）")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("delay-ms")
                .long("delay-ms")
                .value_name("MS")
                .help("每个任务的模拟处理延迟（毫秒）")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("operator")
                .long("operator")
                .value_name("NAME")
                .help("操作者标识，仅用于日志"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty", "compact"]),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("以JSON格式输出分发摘要")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .help("打印合并后的配置并退出")
                .action(ArgAction::SetTrue),
        )
}

fn parse_overrides(matches: &ArgMatches) -> Result<CliOverrides> {
    Ok(CliOverrides {
        max_concurrency: matches.get_one::<i32>("max-concurrency").copied(),
        failure_policy: matches
            .get_one::<String>("policy")
            .map(|policy| policy.parse::<FailurePolicy>())
            .transpose()?,
        deadline_ms: matches.get_one::<u64>("deadline-ms").copied(),
        task_timeout_ms: matches.get_one::<u64>("task-timeout-ms").copied(),
        processing_delay_ms: matches.get_one::<u64>("delay-ms").copied(),
        log_level: matches
            .get_one::<String>("log-level")
            .map(|level| level.parse::<LogLevel>())
            .transpose()?,
        log_format: matches
            .get_one::<String>("log-format")
            .map(|format| format.parse::<LogFormat>())
            .transpose()?,
    })
}
