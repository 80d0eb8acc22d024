//! 有界并发任务分发器
//!
//! 将一组任务分配给固定大小的worker池处理，遵守共享的取消信号，
//! 并按失败聚合策略把每个任务的结果汇总给调用方。

pub mod dispatcher;
pub mod options;
pub mod processor;
pub mod progress;
pub mod request;

pub use dispatcher::{dispatch, Dispatcher};
pub use options::DispatchOptions;
pub use processor::InFlightGauge;
pub use progress::{ChannelProgressSink, DispatchEvent, ProgressSink, TracingProgressSink};
pub use request::DispatchRequest;
