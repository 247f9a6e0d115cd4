//! The levelized cost of storage.
//!
//! Unlike the LCOE appraisal there is no year-by-year recurrence here: storage cost is a
//! closed-form ratio of lifetime cost to lifetime energy throughput.
use crate::finance::round_dp;
use crate::input::deserialise_proportion;
use crate::units::{Dimensionless, Money, MoneyPerEnergy};
use anyhow::{Result, ensure};
use serde::Deserialize;

/// The parameter set for a battery storage system.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageParameters {
    /// Capital cost per unit of power capacity
    pub capital_cost: Money,
    /// Annual O&M cost as a fraction of capital cost, per hour of storage duration
    pub om_fraction: Dimensionless,
    /// Storage duration in hours
    pub storage_duration_hours: f64,
    /// Round-trip efficiency
    #[serde(deserialize_with = "deserialise_proportion")]
    pub roundtrip_efficiency: Dimensionless,
    /// Usable depth of discharge
    #[serde(deserialize_with = "deserialise_proportion")]
    pub depth_of_discharge: Dimensionless,
    /// Charge/discharge cycles per year
    pub cycles_per_year: f64,
    /// Total cycle life of the cells
    pub cycle_life: f64,
}

impl StorageParameters {
    /// The reference parameter set for a 4-hour battery system.
    pub fn reference() -> Self {
        Self {
            capital_cost: Money(20000.0),
            om_fraction: Dimensionless(0.01),
            storage_duration_hours: 4.0,
            roundtrip_efficiency: Dimensionless(0.97),
            depth_of_discharge: Dimensionless(0.8),
            cycles_per_year: 730.0,
            cycle_life: 4000.0,
        }
    }

    /// Validate the parameter set after reading it in.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.capital_cost.is_finite() && self.capital_cost >= Money(0.0),
            "capital_cost cannot be negative"
        );
        ensure!(
            self.om_fraction.is_finite() && self.om_fraction >= Dimensionless(0.0),
            "om_fraction cannot be negative"
        );
        for (name, value) in [
            ("storage_duration_hours", self.storage_duration_hours),
            ("cycles_per_year", self.cycles_per_year),
            ("cycle_life", self.cycle_life),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} cannot be negative"
            );
        }

        Ok(())
    }
}

/// Calculate the levelized cost of storage, rounded to 2 decimal places.
///
/// Fails if the lifetime energy throughput is zero, since a cost per unit of throughput is
/// undefined; callers must treat that as invalid input rather than free storage.
pub fn calculate_lcos(params: &StorageParameters) -> Result<MoneyPerEnergy> {
    let om_cost =
        params.capital_cost * params.om_fraction * Dimensionless(params.storage_duration_hours);
    let total_energy_throughput = params.cycles_per_year
        * params.depth_of_discharge.value()
        * params.roundtrip_efficiency.value()
        * params.cycle_life;
    ensure!(
        total_energy_throughput > 0.0,
        "Storage has zero lifetime energy throughput; cannot compute LCOS"
    );

    let lcos = (params.capital_cost + om_cost).value() / total_energy_throughput;
    Ok(MoneyPerEnergy(round_dp(lcos, 2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[test]
    fn test_calculate_lcos_reference() {
        // om_cost = 20000 * 0.01 * 4 = 800
        // throughput = 730 * 0.8 * 0.97 * 4000 = 2,265,920
        // lcos = 20800 / 2,265,920 = 0.00918..., which reports as 0.01
        let lcos = calculate_lcos(&StorageParameters::reference()).unwrap();
        assert_approx_eq!(f64, lcos.value(), 0.01);
    }

    #[test]
    fn test_calculate_lcos_unrounded_scale() {
        // Same ratio at a scale where two decimal places carry the value
        let mut params = StorageParameters::reference();
        params.capital_cost = Money(2_000_000.0);
        let lcos = calculate_lcos(&params).unwrap();
        assert_approx_eq!(f64, lcos.value(), 0.92);
    }

    #[rstest]
    #[case(0.0, 4000.0)] // no cycles per year
    #[case(730.0, 0.0)] // no cycle life
    fn test_zero_throughput_is_an_error(#[case] cycles_per_year: f64, #[case] cycle_life: f64) {
        let mut params = StorageParameters::reference();
        params.cycles_per_year = cycles_per_year;
        params.cycle_life = cycle_life;
        assert!(calculate_lcos(&params).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(StorageParameters::reference().validate().is_ok());

        let mut params = StorageParameters::reference();
        params.cycle_life = -1.0;
        assert!(params.validate().is_err());

        let mut params = StorageParameters::reference();
        params.capital_cost = Money(f64::NAN);
        assert!(params.validate().is_err());
    }
}
