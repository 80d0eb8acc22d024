pub mod logging;
pub mod models;
pub mod signal;
pub mod traits;

pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
pub use models::{
    DispatchReport, DispatchSummary, FailurePolicy, OutcomeStatus, TaskOutcome, TaskRecord,
    TaskSummary,
};
pub use signal::{CancellationSignal, SignalListener};
pub use traits::Task;

pub use fleet_errors::{CancelCause, CargoError, DispatchError, DispatchResult, FailureKind};
