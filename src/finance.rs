//! General functions related to project finance.
//!
//! Capital structure and depreciation-rate derivation shared by the per-year schedules.
use crate::technology::TechnologyParameters;
use crate::units::{Dimensionless, Money};
use serde::Serialize;

pub mod debt;
pub mod lcoe;
pub mod lcos;
pub mod working_capital;

/// Annual depreciation charges on both capex bases.
///
/// During the first `n1_years` the accelerated charge applies; afterwards the remaining
/// depreciable value is written off in equal amounts over the remaining plant life.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepreciationCharges {
    /// Annual charge during the first n1 years, on gross capex
    pub first_n1_gross: Money,
    /// Annual charge after the first n1 years, on gross capex
    pub after_n1_gross: Money,
    /// Annual charge during the first n1 years, on net capex
    pub first_n1_net: Money,
    /// Annual charge after the first n1 years, on net capex
    pub after_n1_net: Money,
}

/// Capital structure for one technology, computed once per appraisal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapitalMetrics {
    /// Total capital cost before subsidy
    pub gross_capital_cost: Money,
    /// Total capital cost after subsidy
    pub net_capital_cost: Money,
    /// Equity amount (net capital cost times equity fraction)
    pub equity: Money,
    /// Debt amount (net capital cost minus equity)
    pub debt: Money,
    /// Derived annual depreciation charges
    pub depreciation: DepreciationCharges,
}

impl CapitalMetrics {
    /// Derive the capital structure from a technology's parameters.
    pub fn from_parameters(params: &TechnologyParameters) -> Self {
        let gross_capital_cost = params.unit_capital_cost * params.plant_size;
        let net_capital_cost =
            (params.unit_capital_cost - params.capital_subsidy) * params.plant_size;
        let equity = net_capital_cost * params.equity_fraction;
        let debt = net_capital_cost - equity;

        let (first_n1_gross, after_n1_gross) = depreciation_split(gross_capital_cost, params);
        let (first_n1_net, after_n1_net) = depreciation_split(net_capital_cost, params);

        Self {
            gross_capital_cost,
            net_capital_cost,
            equity,
            debt,
            depreciation: DepreciationCharges {
                first_n1_gross,
                after_n1_gross,
                first_n1_net,
                after_n1_net,
            },
        }
    }

    /// The gross-basis depreciation charge for the given 1-based year.
    pub fn depreciation_gross(&self, year: u32, n1_years: u32) -> Money {
        if year <= n1_years {
            self.depreciation.first_n1_gross
        } else {
            self.depreciation.after_n1_gross
        }
    }

    /// The net-basis depreciation charge for the given 1-based year.
    pub fn depreciation_net(&self, year: u32, n1_years: u32) -> Money {
        if year <= n1_years {
            self.depreciation.first_n1_net
        } else {
            self.depreciation.after_n1_net
        }
    }
}

/// Split a capex base into accelerated and remaining-life annual depreciation charges.
///
/// If the accelerated window covers the whole plant life, the asset is treated as fully
/// depreciated within it and no further charge applies.
fn depreciation_split(capex: Money, params: &TechnologyParameters) -> (Money, Money) {
    let depreciable = capex * params.depreciable_fraction;
    let first_n1 = depreciable * params.accelerated_depreciation_rate;
    let after_n1 = if params.n1_years < params.plant_life {
        let remaining = depreciable - first_n1 * Dimensionless(params.n1_years as f64);
        remaining / Dimensionless((params.plant_life - params.n1_years) as f64)
    } else {
        Money(0.0)
    };

    (first_n1, after_n1)
}

/// The discount factor for the given 1-based year.
pub fn discount_factor(discount_rate: Dimensionless, year: u32) -> Dimensionless {
    Dimensionless(1.0) / (Dimensionless(1.0) + discount_rate).powi(year as i32 - 1)
}

/// Round to the given number of decimal places, for reporting.
///
/// Internal recurrences must accumulate unrounded values; rounding is applied only when a figure
/// is placed in an output record.
pub fn round_dp(value: f64, dp: i32) -> f64 {
    let scale = 10f64.powi(dp);
    (value * scale).round() / scale
}

/// Round a monetary figure to 2 decimal places, for reporting.
pub fn round2(value: Money) -> Money {
    Money(round_dp(value.value(), 2))
}
