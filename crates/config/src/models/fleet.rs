use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruckKind {
    Normal,
    Electric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckSpec {
    pub id: String,
    pub kind: TruckKind,
    #[serde(default)]
    pub cargo: i32,
    /// 只有电动货车使用
    #[serde(default)]
    pub battery: Option<f64>,
}

impl TruckSpec {
    pub fn normal(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: TruckKind::Normal,
            cargo: 0,
            battery: None,
        }
    }

    pub fn electric(id: &str, battery: f64) -> Self {
        Self {
            id: id.to_string(),
            kind: TruckKind::Electric,
            cargo: 0,
            battery: Some(battery),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub trucks: Vec<TruckSpec>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            trucks: vec![
                TruckSpec::normal("NT1"),
                TruckSpec::electric("ET1", 100.0),
                TruckSpec::normal("NT2"),
                TruckSpec::electric("ET2", 50.0),
            ],
        }
    }
}

impl FleetConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for truck in &self.trucks {
            if truck.id.trim().is_empty() {
                return Err(anyhow::anyhow!("车辆ID不能为空"));
            }
            if !seen.insert(truck.id.as_str()) {
                return Err(anyhow::anyhow!("车辆ID重复: {}", truck.id));
            }
            if truck.kind == TruckKind::Normal && truck.battery.is_some() {
                return Err(anyhow::anyhow!("普通货车不能配置电池: {}", truck.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fleet() {
        let fleet = FleetConfig::default();
        let ids: Vec<_> = fleet.trucks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["NT1", "ET1", "NT2", "ET2"]);
        assert_eq!(fleet.trucks[1].battery, Some(100.0));
        assert!(fleet.validate().is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let fleet = FleetConfig {
            trucks: vec![TruckSpec::normal("NT1"), TruckSpec::electric("NT1", 10.0)],
        };
        let err = fleet.validate().unwrap_err();
        assert_eq!(err.to_string(), "车辆ID重复: NT1");
    }

    #[test]
    fn test_blank_id_rejected() {
        let fleet = FleetConfig {
            trucks: vec![TruckSpec::normal("  ")],
        };
        assert!(fleet.validate().is_err());
    }

    #[test]
    fn test_battery_on_normal_truck_rejected() {
        let mut truck = TruckSpec::normal("NT1");
        truck.battery = Some(20.0);
        let fleet = FleetConfig {
            trucks: vec![truck],
        };
        assert!(fleet.validate().is_err());
    }

    #[test]
    fn test_empty_fleet_is_valid() {
        let fleet = FleetConfig { trucks: vec![] };
        assert!(fleet.validate().is_ok());
    }
}
