pub mod trucks;

pub use trucks::{ElectricTruck, NormalTruck, Truck};
