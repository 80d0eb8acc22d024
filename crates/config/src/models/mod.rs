pub mod app_config;
pub mod dispatcher;
pub mod fleet;

pub use app_config::AppConfig;
pub use dispatcher::DispatcherConfig;
pub use fleet::{FleetConfig, TruckKind, TruckSpec};
