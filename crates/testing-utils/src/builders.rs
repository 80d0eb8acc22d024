//! Test data builders for creating fleets
//!
//! This module provides builder patterns for creating truck fleets with
//! sensible defaults and easy customization.

use fleet_domain::Truck;

/// Builder for creating test fleets
#[derive(Debug, Default)]
pub struct FleetBuilder {
    trucks: Vec<Truck>,
}

impl FleetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normal(mut self, id: &str) -> Self {
        self.trucks.push(Truck::normal(id, 0));
        self
    }

    pub fn electric(mut self, id: &str, battery: f64) -> Self {
        self.trucks.push(Truck::electric(id, 0, battery));
        self
    }

    pub fn build(self) -> Vec<Truck> {
        self.trucks
    }
}

/// The four-truck scenario: NT1, ET1 (battery 100), NT2, ET2 (battery 50)
pub fn sample_fleet() -> Vec<Truck> {
    FleetBuilder::new()
        .normal("NT1")
        .electric("ET1", 100.0)
        .normal("NT2")
        .electric("ET2", 50.0)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::Task;

    #[test]
    fn test_sample_fleet() {
        let fleet = sample_fleet();
        let ids: Vec<&str> = fleet.iter().map(|truck| truck.id()).collect();
        assert_eq!(ids, vec!["NT1", "ET1", "NT2", "ET2"]);
        assert_eq!(fleet[1].battery(), Some(100.0));
        assert_eq!(fleet[0].battery(), None);
    }
}
