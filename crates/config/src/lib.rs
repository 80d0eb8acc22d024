pub mod models;

pub use models::{AppConfig, DispatcherConfig, FleetConfig, TruckKind, TruckSpec};
