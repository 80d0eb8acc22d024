//! 车队中的两种内置车辆
//!
//! - [`NormalTruck`]：普通货车，只有货物计数
//! - [`ElectricTruck`]：电动货车，除货物外还有电池电量
//!
//! 混合车队使用 [`Truck`] 枚举统一表示。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fleet_core::{CargoError, Task};

/// 每次装货增加的货物量
pub const LOAD_CARGO_UNITS: i32 = 10;
/// 电动货车装货时增加的电量
pub const LOAD_BATTERY_GAIN: f64 = 10.0;
/// 电动货车卸货时消耗的电量
pub const UNLOAD_BATTERY_DRAIN: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalTruck {
    id: String,
    cargo: i32,
}

impl NormalTruck {
    pub fn new<S: Into<String>>(id: S, cargo: i32) -> Self {
        Self {
            id: id.into(),
            cargo,
        }
    }

    pub fn cargo(&self) -> i32 {
        self.cargo
    }
}

#[async_trait]
impl Task for NormalTruck {
    fn id(&self) -> &str {
        &self.id
    }

    async fn load_cargo(&mut self) -> Result<(), CargoError> {
        self.cargo += LOAD_CARGO_UNITS;
        debug!(truck_id = %self.id, cargo = self.cargo, "普通货车装货完成");
        Ok(())
    }

    async fn unload_cargo(&mut self) -> Result<(), CargoError> {
        self.cargo = 0;
        debug!(truck_id = %self.id, "普通货车卸货完成");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricTruck {
    id: String,
    cargo: i32,
    battery: f64,
}

impl ElectricTruck {
    pub fn new<S: Into<String>>(id: S, cargo: i32, battery: f64) -> Self {
        Self {
            id: id.into(),
            cargo,
            battery,
        }
    }

    pub fn cargo(&self) -> i32 {
        self.cargo
    }

    pub fn battery(&self) -> f64 {
        self.battery
    }
}

#[async_trait]
impl Task for ElectricTruck {
    fn id(&self) -> &str {
        &self.id
    }

    async fn load_cargo(&mut self) -> Result<(), CargoError> {
        self.cargo += LOAD_CARGO_UNITS;
        self.battery += LOAD_BATTERY_GAIN;
        debug!(
            truck_id = %self.id,
            cargo = self.cargo,
            battery = self.battery,
            "电动货车装货完成"
        );
        Ok(())
    }

    async fn unload_cargo(&mut self) -> Result<(), CargoError> {
        self.cargo = 0;
        self.battery -= UNLOAD_BATTERY_DRAIN;
        debug!(truck_id = %self.id, battery = self.battery, "电动货车卸货完成");
        Ok(())
    }
}

/// 混合车队中的车辆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Truck {
    Normal(NormalTruck),
    Electric(ElectricTruck),
}

impl Truck {
    pub fn normal<S: Into<String>>(id: S, cargo: i32) -> Self {
        Truck::Normal(NormalTruck::new(id, cargo))
    }

    pub fn electric<S: Into<String>>(id: S, cargo: i32, battery: f64) -> Self {
        Truck::Electric(ElectricTruck::new(id, cargo, battery))
    }

    pub fn cargo(&self) -> i32 {
        match self {
            Truck::Normal(truck) => truck.cargo(),
            Truck::Electric(truck) => truck.cargo(),
        }
    }

    /// 普通货车没有电池
    pub fn battery(&self) -> Option<f64> {
        match self {
            Truck::Normal(_) => None,
            Truck::Electric(truck) => Some(truck.battery()),
        }
    }
}

impl From<NormalTruck> for Truck {
    fn from(truck: NormalTruck) -> Self {
        Truck::Normal(truck)
    }
}

impl From<ElectricTruck> for Truck {
    fn from(truck: ElectricTruck) -> Self {
        Truck::Electric(truck)
    }
}

#[async_trait]
impl Task for Truck {
    fn id(&self) -> &str {
        match self {
            Truck::Normal(truck) => truck.id(),
            Truck::Electric(truck) => truck.id(),
        }
    }

    async fn load_cargo(&mut self) -> Result<(), CargoError> {
        match self {
            Truck::Normal(truck) => truck.load_cargo().await,
            Truck::Electric(truck) => truck.load_cargo().await,
        }
    }

    async fn unload_cargo(&mut self) -> Result<(), CargoError> {
        match self {
            Truck::Normal(truck) => truck.unload_cargo().await,
            Truck::Electric(truck) => truck.unload_cargo().await,
        }
    }
}
