//! The discounted-cash-flow appraisal which produces the levelized cost of energy.
//!
//! The appraisal is a single forward pass over the plant life. Each year depends only on the
//! prior year's closing debt balance and closing asset value; totals are accumulated unrounded
//! and rounding is applied only to the reported records.
use crate::finance::debt::{self, DebtYear, compute_debt_schedule};
use crate::finance::working_capital::{
    AnnualCashCosts, WorkingCapitalPolicy, WorkingCapitalYear, compute_working_capital,
    working_capital_for_year,
};
use crate::finance::{CapitalMetrics, discount_factor, round_dp, round2};
use crate::technology::{Technology, TechnologyParameters};
use crate::units::{Dimensionless, Energy, HOURS_PER_YEAR, Money, MoneyPerEnergy};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::Serialize;

/// One year of the per-technology cost breakdown, rounded for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlyRecord {
    /// 1-based year
    pub year: u32,
    /// Gross energy generated
    pub gross_generation: Energy,
    /// Energy available after auxiliary consumption
    pub net_generation: Energy,
    /// O&M cost
    pub om_cost: Money,
    /// Insurance on the depreciated asset value
    pub insurance: Money,
    /// Depreciation charge on the gross capex basis
    pub depreciation_gross: Money,
    /// Depreciation charge on the net capex basis
    pub depreciation_net: Money,
    /// Interest on term debt
    pub interest_on_debt: Money,
    /// Interest on working capital
    pub interest_on_working_capital: Money,
    /// Return-on-equity cost
    pub roe_cost: Money,
    /// Total annual cost
    pub total_cost: Money,
    /// Cost per unit of net energy (4 decimal places)
    pub cost_per_unit: MoneyPerEnergy,
    /// Discount factor for this year (6 decimal places)
    pub discount_factor: Dimensionless,
    /// Present value of the total cost
    pub discounted_cost: Money,
    /// Present value of the net generation
    pub discounted_generation: Energy,
}

/// One year of the asset-value schedule.
///
/// The reported value is the opening (pre-depreciation) balance for the year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssetValueYear {
    /// 1-based year
    pub year: u32,
    /// Asset value at the start of the year
    pub asset_value: Money,
}

/// The complete appraisal for one technology.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyAppraisal {
    /// The appraised technology
    pub technology: Technology,
    /// Levelized cost of energy (4 decimal places)
    pub lcoe: MoneyPerEnergy,
    /// Capital structure and depreciation rates
    pub capital: CapitalMetrics,
    /// Per-year cost breakdown
    pub years: Vec<YearlyRecord>,
    /// Debt amortisation schedule
    pub debt_schedule: Vec<DebtYear>,
    /// Working-capital schedule
    pub working_capital: Vec<WorkingCapitalYear>,
    /// Asset-value schedule
    pub asset_values: Vec<AssetValueYear>,
}

/// Appraise every technology in the parameter table.
///
/// Each technology is appraised independently; the result preserves the table's ordering.
pub fn calculate_lcoe(
    parameters: &IndexMap<Technology, TechnologyParameters>,
) -> Result<IndexMap<Technology, TechnologyAppraisal>> {
    parameters
        .iter()
        .map(|(&technology, params)| {
            let appraisal = appraise_technology(technology, params)?;
            Ok((technology, appraisal))
        })
        .collect()
}

/// Run the discounted-cash-flow appraisal for a single technology.
///
/// Fails if the discounted net generation over the plant life is not positive, since a cost per
/// unit of energy is undefined without generation; callers should treat that as invalid input
/// rather than a zero-cost plant.
pub fn appraise_technology(
    technology: Technology,
    params: &TechnologyParameters,
) -> Result<TechnologyAppraisal> {
    let capital = CapitalMetrics::from_parameters(params);
    let wc_policy = WorkingCapitalPolicy::from(params);
    let loan_amount = capital.debt;
    let instalment = debt::instalment(loan_amount, params.loan_tenure, params.moratorium);

    let mut years = Vec::with_capacity(params.plant_life as usize);
    let mut annual_costs = Vec::with_capacity(params.plant_life as usize);
    let mut depreciation_charges = Vec::with_capacity(params.plant_life as usize);

    // Running state: opening debt balance and opening (pre-depreciation) asset value
    let mut debt_balance = loan_amount;
    let mut asset_value = capital.gross_capital_cost;

    let mut total_discounted_cost = Money(0.0);
    let mut total_discounted_generation = Energy(0.0);

    for year in 1..=params.plant_life {
        let gross_generation = params.plant_size
            * HOURS_PER_YEAR
            * params.cuf
            * params.grid_availability
            * params.degradation_factor(year);
        let net_generation =
            gross_generation * (Dimensionless(1.0) - params.auxiliary_consumption);

        let om_cost = capital.gross_capital_cost
            * params.om_first_year_fraction
            * (Dimensionless(1.0) + params.om_growth_rate).powi(year as i32 - 1);

        let depreciation_gross = capital.depreciation_gross(year, params.n1_years);
        let depreciation_net = capital.depreciation_net(year, params.n1_years);

        // Insurance is charged on the asset value before this year's depreciation is applied
        let insurance = asset_value * params.insurance_fraction;
        asset_value = (asset_value - depreciation_gross).max(Money(0.0));

        let interest_on_debt = debt_balance * params.loan_interest_rate;
        let repayment = if year > params.moratorium && debt_balance > debt::BALANCE_FLOOR {
            instalment
        } else {
            Money(0.0)
        };
        debt_balance = (debt_balance - repayment).max(Money(0.0));

        let roe_cost = capital.equity * params.return_on_equity;

        let cash_costs = AnnualCashCosts {
            om: om_cost,
            insurance,
            depreciation: depreciation_gross,
            debt_interest: interest_on_debt,
            roe: roe_cost,
        };
        let working_capital = working_capital_for_year(&cash_costs, &wc_policy);
        let wc_interest = working_capital.total_interest();

        let total_cost =
            om_cost + insurance + depreciation_gross + interest_on_debt + wc_interest + roe_cost;
        let cost_per_unit = if net_generation > Energy(0.0) {
            total_cost / net_generation
        } else {
            MoneyPerEnergy(0.0)
        };

        let factor = discount_factor(params.discount_rate, year);
        total_discounted_cost += total_cost * factor;
        total_discounted_generation += net_generation * factor;

        years.push(YearlyRecord {
            year,
            gross_generation: Energy(round_dp(gross_generation.value(), 2)),
            net_generation: Energy(round_dp(net_generation.value(), 2)),
            om_cost: round2(om_cost),
            insurance: round2(insurance),
            depreciation_gross: round2(depreciation_gross),
            depreciation_net: round2(depreciation_net),
            interest_on_debt: round2(interest_on_debt),
            interest_on_working_capital: round2(wc_interest),
            roe_cost: round2(roe_cost),
            total_cost: round2(total_cost),
            cost_per_unit: MoneyPerEnergy(round_dp(cost_per_unit.value(), 4)),
            discount_factor: Dimensionless(round_dp(factor.value(), 6)),
            discounted_cost: round2(total_cost * factor),
            discounted_generation: Energy(round_dp((net_generation * factor).value(), 2)),
        });
        annual_costs.push(cash_costs);
        depreciation_charges.push(depreciation_gross);
    }

    ensure!(
        total_discounted_generation > Energy(0.0),
        "{technology}: discounted net generation over the plant life is zero; \
        cannot compute a cost per unit of energy"
    );
    let lcoe = total_discounted_cost / total_discounted_generation;

    Ok(TechnologyAppraisal {
        technology,
        lcoe: MoneyPerEnergy(round_dp(lcoe.value(), 4)),
        capital,
        debt_schedule: compute_debt_schedule(
            capital.net_capital_cost,
            params.equity_fraction,
            params.loan_interest_rate,
            params.loan_tenure,
            params.plant_life,
            params.moratorium,
        ),
        working_capital: compute_working_capital(&annual_costs, &wc_policy),
        asset_values: compute_asset_depreciation(
            capital.gross_capital_cost,
            &depreciation_charges,
        ),
        years,
    })
}

/// Restate the running asset value as a reporting schedule.
///
/// Each year's reported value is the opening (pre-depreciation) balance; the terminal value
/// after the final year is not reported as a separate row. The schedule covers one year per
/// entry in `depreciation_by_year`.
pub fn compute_asset_depreciation(
    gross_capex: Money,
    depreciation_by_year: &[Money],
) -> Vec<AssetValueYear> {
    let mut asset_value = gross_capex;
    depreciation_by_year
        .iter()
        .enumerate()
        .map(|(index, &depreciation)| {
            let record = AssetValueYear {
                year: index as u32 + 1,
                asset_value: round2(asset_value),
            };
            asset_value = (asset_value - depreciation).max(Money(0.0));
            record
        })
        .collect()
}
