//! Per-technology parameter sets for the techno-financial appraisal.
//!
//! Every rate here is a decimal fraction, not a percentage; the ingestion layer is responsible
//! for dividing user-facing percentages by 100 before they reach these structs.
use crate::input::deserialise_proportion;
use crate::units::{Capacity, Dimensionless, MoneyPerCapacity};
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_string_enum::DeserializeLabeledStringEnum;
use std::fmt;

/// A generation technology appraised by the financial engine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum Technology {
    /// Solar PV
    Solar,
    /// Onshore wind
    Wind,
}

/// How annual generation degrades over the plant's life.
///
/// The source model compounds degradation for solar and applies none to wind (wind losses are
/// assumed to be captured in its CUF). This is an explicit policy so the asymmetry is visible in
/// the model file rather than buried in a code path.
#[derive(Debug, Clone, Copy, PartialEq, DeserializeLabeledStringEnum)]
pub enum DegradationPolicy {
    /// Generation in year y is scaled by (1 - annual_degradation)^(y - 1)
    #[string = "compounding"]
    Compounding,
    /// No degradation is applied
    #[string = "none"]
    None,
}

/// The full parameter set for one technology.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TechnologyParameters {
    /// Unit capital cost per unit of nameplate capacity
    pub unit_capital_cost: MoneyPerCapacity,
    /// Capital subsidy per unit of nameplate capacity
    #[serde(default = "default_capital_subsidy")]
    pub capital_subsidy: MoneyPerCapacity,
    /// Nameplate plant size (may be overridden by the capacity optimiser)
    pub plant_size: Capacity,
    /// Project life of the plant in years
    pub plant_life: u32,
    /// Capacity utilisation factor
    #[serde(deserialize_with = "deserialise_proportion")]
    pub cuf: Dimensionless,
    /// Fraction of gross generation consumed by auxiliaries
    #[serde(deserialize_with = "deserialise_proportion")]
    pub auxiliary_consumption: Dimensionless,
    /// Discount rate used for present-value aggregation
    pub discount_rate: Dimensionless,
    /// Fraction of net capital cost funded by equity
    #[serde(deserialize_with = "deserialise_proportion")]
    pub equity_fraction: Dimensionless,
    /// Return-on-equity rate, charged on the equity amount every year
    pub return_on_equity: Dimensionless,
    /// Loan tenure in years
    pub loan_tenure: u32,
    /// Years during which no principal is repaid
    #[serde(default = "default_moratorium")]
    pub moratorium: u32,
    /// Interest rate on the term loan
    pub loan_interest_rate: Dimensionless,
    /// First-year O&M cost as a fraction of gross capital cost
    pub om_first_year_fraction: Dimensionless,
    /// Annual growth rate of O&M cost
    pub om_growth_rate: Dimensionless,
    /// Insurance cost as a fraction of the depreciated asset value
    pub insurance_fraction: Dimensionless,
    /// Months of O&M cost held as working capital
    pub wc_om_months: f64,
    /// Months of total cash cost held as receivables working capital
    pub wc_receivables_months: f64,
    /// Interest rate on working capital
    pub wc_interest_rate: Dimensionless,
    /// Years during which the accelerated depreciation rate applies
    pub n1_years: u32,
    /// Accelerated depreciation rate applied during the first n1 years
    pub accelerated_depreciation_rate: Dimensionless,
    /// Fraction of capital cost subject to depreciation
    #[serde(deserialize_with = "deserialise_proportion")]
    pub depreciable_fraction: Dimensionless,
    /// Annual generation degradation rate
    pub annual_degradation: Dimensionless,
    /// Fraction of time the grid can accept generated power
    #[serde(deserialize_with = "deserialise_proportion")]
    pub grid_availability: Dimensionless,
    /// Whether degradation compounds over the plant life
    pub degradation: DegradationPolicy,
}

fn default_capital_subsidy() -> MoneyPerCapacity {
    MoneyPerCapacity(0.0)
}

fn default_moratorium() -> u32 {
    1
}

impl TechnologyParameters {
    /// The reference parameter set for a 1 MW solar PV plant.
    pub fn reference_solar() -> Self {
        Self {
            unit_capital_cost: MoneyPerCapacity(33500.0),
            capital_subsidy: MoneyPerCapacity(0.0),
            plant_size: Capacity(1000.0),
            plant_life: 25,
            cuf: Dimensionless(0.19),
            auxiliary_consumption: Dimensionless(0.0),
            discount_rate: Dimensionless(0.0953),
            equity_fraction: Dimensionless(0.30),
            return_on_equity: Dimensionless(0.176),
            loan_tenure: 10,
            moratorium: 1,
            loan_interest_rate: Dimensionless(0.1055),
            om_first_year_fraction: Dimensionless(0.014),
            om_growth_rate: Dimensionless(0.0572),
            insurance_fraction: Dimensionless(0.0035),
            wc_om_months: 1.0,
            wc_receivables_months: 2.0,
            wc_interest_rate: Dimensionless(0.1155),
            n1_years: 25,
            accelerated_depreciation_rate: Dimensionless(0.036),
            depreciable_fraction: Dimensionless(0.95),
            annual_degradation: Dimensionless(0.02),
            grid_availability: Dimensionless(0.95),
            degradation: DegradationPolicy::Compounding,
        }
    }

    /// The reference parameter set for a 1 MW onshore wind plant.
    pub fn reference_wind() -> Self {
        Self {
            unit_capital_cost: MoneyPerCapacity(52500.0),
            capital_subsidy: MoneyPerCapacity(0.0),
            plant_size: Capacity(1000.0),
            plant_life: 25,
            cuf: Dimensionless(0.2915),
            auxiliary_consumption: Dimensionless(0.0),
            discount_rate: Dimensionless(0.0953),
            equity_fraction: Dimensionless(0.30),
            return_on_equity: Dimensionless(0.176),
            loan_tenure: 10,
            moratorium: 1,
            loan_interest_rate: Dimensionless(0.1055),
            om_first_year_fraction: Dimensionless(0.00968),
            om_growth_rate: Dimensionless(0.0572),
            insurance_fraction: Dimensionless(0.0064),
            wc_om_months: 1.0,
            wc_receivables_months: 2.0,
            wc_interest_rate: Dimensionless(0.1155),
            n1_years: 25,
            accelerated_depreciation_rate: Dimensionless(0.036),
            depreciable_fraction: Dimensionless(0.85),
            annual_degradation: Dimensionless(0.0),
            grid_availability: Dimensionless(0.95),
            degradation: DegradationPolicy::None,
        }
    }

    /// The reference parameter set for the given technology.
    pub fn reference(technology: Technology) -> Self {
        match technology {
            Technology::Solar => Self::reference_solar(),
            Technology::Wind => Self::reference_wind(),
        }
    }

    /// Validate the parameter set after reading it in.
    ///
    /// Inconsistencies which the recurrences guard against anyway (n1 years covering the whole
    /// plant life, a loan that never leaves its moratorium) are warnings rather than errors, as
    /// they usually indicate a data-entry mistake upstream.
    pub fn validate(&self, technology: Technology) -> Result<()> {
        ensure!(
            self.plant_life > 0,
            "plant_life must be a positive number of years"
        );
        ensure!(
            self.plant_size.is_finite() && self.plant_size > Capacity(0.0),
            "plant_size must be a finite number greater than zero"
        );
        ensure!(
            self.unit_capital_cost.is_finite() && self.unit_capital_cost >= MoneyPerCapacity(0.0),
            "unit_capital_cost cannot be negative"
        );
        ensure!(
            self.capital_subsidy >= MoneyPerCapacity(0.0)
                && self.capital_subsidy <= self.unit_capital_cost,
            "capital_subsidy must be between zero and unit_capital_cost"
        );

        for (name, rate) in [
            ("discount_rate", self.discount_rate),
            ("return_on_equity", self.return_on_equity),
            ("loan_interest_rate", self.loan_interest_rate),
            ("om_first_year_fraction", self.om_first_year_fraction),
            ("om_growth_rate", self.om_growth_rate),
            ("insurance_fraction", self.insurance_fraction),
            ("wc_interest_rate", self.wc_interest_rate),
            ("accelerated_depreciation_rate", self.accelerated_depreciation_rate),
            ("annual_degradation", self.annual_degradation),
        ] {
            ensure!(
                rate.is_finite() && rate >= Dimensionless(0.0),
                "{name} must be a finite rate of at least zero"
            );
        }

        for (name, months) in [
            ("wc_om_months", self.wc_om_months),
            ("wc_receivables_months", self.wc_receivables_months),
        ] {
            ensure!(
                months.is_finite() && (0.0..=12.0).contains(&months),
                "{name} must be between 0 and 12"
            );
        }

        if self.n1_years >= self.plant_life {
            warn!(
                "{technology}: n1_years ({}) covers the whole plant life ({}); \
                no depreciation will be charged after the accelerated window",
                self.n1_years, self.plant_life
            );
        }
        if self.loan_tenure <= self.moratorium {
            warn!(
                "{technology}: loan_tenure ({}) does not exceed the moratorium ({}); \
                no principal will ever be repaid",
                self.loan_tenure, self.moratorium
            );
        }

        Ok(())
    }

    /// The generation scaling factor for the given 1-based year.
    pub fn degradation_factor(&self, year: u32) -> Dimensionless {
        match self.degradation {
            DegradationPolicy::Compounding => {
                (Dimensionless(1.0) - self.annual_degradation).powi(year as i32 - 1)
            }
            DegradationPolicy::None => Dimensionless(1.0),
        }
    }
}

/// Validate a parameter set, attaching the technology name to any error.
pub fn validate_for_technology(
    params: &TechnologyParameters,
    technology: Technology,
) -> Result<()> {
    params
        .validate(technology)
        .with_context(|| format!("Invalid parameters for {technology}"))
}

impl fmt::Display for DegradationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Compounding => write!(f, "compounding"),
            Self::None => write!(f, "none"),
        }
    }
}
