pub mod outcome;
pub mod policy;
pub mod report;

pub use outcome::{OutcomeStatus, TaskOutcome, TaskRecord};
pub use policy::FailurePolicy;
pub use report::{DispatchReport, DispatchSummary, TaskSummary};
