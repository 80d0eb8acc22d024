pub mod log_config;
pub mod log_level;

pub use log_config::{LogFormat, LoggingConfig};
pub use log_level::LogLevel;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fleet_errors::{DispatchError, DispatchResult};

/// 初始化日志系统
///
/// `RUST_LOG` 存在时优先使用，否则使用配置中的日志级别。
/// 重复初始化返回配置错误而不是panic。
pub fn init_logging(config: &LoggingConfig) -> DispatchResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_thread_ids(config.include_thread_id),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_thread_ids(config.include_thread_id),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_thread_ids(config.include_thread_id),
            )
            .try_init(),
    };

    result.map_err(|e| DispatchError::config_error(format!("初始化日志系统失败: {e}")))?;

    info!(
        logging.format = ?config.format,
        logging.level = config.level.as_filter(),
        logging.location = config.include_location,
        "Structured logging initialized"
    );

    Ok(())
}
