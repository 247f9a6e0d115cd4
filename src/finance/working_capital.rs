//! The year-by-year working-capital schedule.
//!
//! Working capital is sized as a fraction of a year of operating cost (O&M component) and of
//! total cash cost (receivables component). The receivables base includes the interest on the
//! O&M component computed in the same year; the dependency is sequential, not circular.
use crate::finance::round2;
use crate::technology::TechnologyParameters;
use crate::units::{Dimensionless, Money};
use serde::Serialize;

/// The working-capital sizing policy for one technology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingCapitalPolicy {
    /// Months of O&M cost held as working capital
    pub om_months: f64,
    /// Months of total cash cost held as receivables
    pub receivables_months: f64,
    /// Interest rate charged on working capital
    pub interest_rate: Dimensionless,
}

impl From<&TechnologyParameters> for WorkingCapitalPolicy {
    fn from(params: &TechnologyParameters) -> Self {
        Self {
            om_months: params.wc_om_months,
            receivables_months: params.wc_receivables_months,
            interest_rate: params.wc_interest_rate,
        }
    }
}

/// The annual cash costs from which a year's working capital is sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualCashCosts {
    /// O&M cost for the year
    pub om: Money,
    /// Insurance cost for the year
    pub insurance: Money,
    /// Depreciation charge for the year
    pub depreciation: Money,
    /// Interest on term debt for the year
    pub debt_interest: Money,
    /// Return-on-equity cost for the year
    pub roe: Money,
}

/// A single year's working capital, unrounded for use inside the appraisal loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingCapital {
    /// Working capital held against O&M cost
    pub om_wcap: Money,
    /// Interest on the O&M component
    pub interest_on_om: Money,
    /// Working capital held against receivables
    pub receivables_wcap: Money,
    /// Interest on the receivables component
    pub interest_on_receivables: Money,
}

impl WorkingCapital {
    /// Total working capital held
    pub fn total(&self) -> Money {
        self.om_wcap + self.receivables_wcap
    }

    /// Total interest paid on working capital
    pub fn total_interest(&self) -> Money {
        self.interest_on_om + self.interest_on_receivables
    }
}

/// One year of the working-capital schedule, rounded for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkingCapitalYear {
    /// 1-based year
    pub year: u32,
    /// Working capital held against O&M cost
    pub om_wcap: Money,
    /// Interest on the O&M component
    pub interest_on_om_wcap: Money,
    /// Working capital held against receivables
    pub receivables_wcap: Money,
    /// Interest on the receivables component
    pub interest_on_receivables_wcap: Money,
    /// Sum of both components
    pub total_working_capital: Money,
    /// Sum of interest on both components
    pub interest_on_working_capital: Money,
}

/// Size one year's working capital from that year's cash costs.
pub fn working_capital_for_year(
    costs: &AnnualCashCosts,
    policy: &WorkingCapitalPolicy,
) -> WorkingCapital {
    let om_wcap = if policy.om_months > 0.0 {
        costs.om * Dimensionless(policy.om_months / 12.0)
    } else {
        Money(0.0)
    };
    let interest_on_om = om_wcap * policy.interest_rate;

    // The receivables base is the full annual cash cost, including the O&M working-capital
    // interest just computed
    let receivables_wcap = if policy.receivables_months > 0.0 {
        let total_cash_cost = costs.om
            + costs.insurance
            + costs.depreciation
            + costs.debt_interest
            + costs.roe
            + interest_on_om;
        total_cash_cost * Dimensionless(policy.receivables_months / 12.0)
    } else {
        Money(0.0)
    };
    let interest_on_receivables = receivables_wcap * policy.interest_rate;

    WorkingCapital {
        om_wcap,
        interest_on_om,
        receivables_wcap,
        interest_on_receivables,
    }
}

/// Compute the full working-capital schedule from per-year cash costs.
pub fn compute_working_capital(
    annual_costs: &[AnnualCashCosts],
    policy: &WorkingCapitalPolicy,
) -> Vec<WorkingCapitalYear> {
    annual_costs
        .iter()
        .enumerate()
        .map(|(index, costs)| {
            let wc = working_capital_for_year(costs, policy);
            WorkingCapitalYear {
                year: index as u32 + 1,
                om_wcap: round2(wc.om_wcap),
                interest_on_om_wcap: round2(wc.interest_on_om),
                receivables_wcap: round2(wc.receivables_wcap),
                interest_on_receivables_wcap: round2(wc.interest_on_receivables),
                total_working_capital: round2(wc.total()),
                interest_on_working_capital: round2(wc.total_interest()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn costs() -> AnnualCashCosts {
        AnnualCashCosts {
            om: Money(120_000.0),
            insurance: Money(30_000.0),
            depreciation: Money(50_000.0),
            debt_interest: Money(70_000.0),
            roe: Money(40_000.0),
        }
    }

    #[test]
    fn test_working_capital_for_year() {
        let policy = WorkingCapitalPolicy {
            om_months: 1.0,
            receivables_months: 2.0,
            interest_rate: Dimensionless(0.12),
        };
        let wc = working_capital_for_year(&costs(), &policy);

        // One month of O&M: 120,000 / 12 = 10,000
        assert_approx_eq!(f64, wc.om_wcap.value(), 10_000.0);
        assert_approx_eq!(f64, wc.interest_on_om.value(), 1_200.0);

        // Two months of total cash cost including the O&M WC interest:
        // (120,000 + 30,000 + 50,000 + 70,000 + 40,000 + 1,200) * 2/12
        assert_approx_eq!(f64, wc.receivables_wcap.value(), 311_200.0 / 6.0);
        assert_approx_eq!(f64, wc.interest_on_receivables.value(), 311_200.0 / 6.0 * 0.12);

        assert_approx_eq!(f64, wc.total().value(), 10_000.0 + 311_200.0 / 6.0);
        assert_approx_eq!(
            f64,
            wc.total_interest().value(),
            (wc.interest_on_om + wc.interest_on_receivables).value()
        );
    }

    #[rstest]
    #[case(0.0, 2.0)] // no O&M working capital
    #[case(1.0, 0.0)] // no receivables working capital
    #[case(0.0, 0.0)] // neither
    fn test_zero_months(#[case] om_months: f64, #[case] receivables_months: f64) {
        let policy = WorkingCapitalPolicy {
            om_months,
            receivables_months,
            interest_rate: Dimensionless(0.12),
        };
        let wc = working_capital_for_year(&costs(), &policy);

        if om_months <= 0.0 {
            assert_eq!(wc.om_wcap, Money(0.0));
            assert_eq!(wc.interest_on_om, Money(0.0));
        }
        if receivables_months <= 0.0 {
            assert_eq!(wc.receivables_wcap, Money(0.0));
            assert_eq!(wc.interest_on_receivables, Money(0.0));
        }
    }

    #[test]
    fn test_compute_working_capital() {
        let policy = WorkingCapitalPolicy {
            om_months: 1.0,
            receivables_months: 2.0,
            interest_rate: Dimensionless(0.12),
        };
        let schedule = compute_working_capital(&[costs(), costs()], &policy);

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].year, 1);
        assert_eq!(schedule[1].year, 2);
        assert_approx_eq!(f64, schedule[0].om_wcap.value(), 10_000.0);
        assert_approx_eq!(f64, schedule[0].receivables_wcap.value(), 51_866.67);
        assert_approx_eq!(
            f64,
            schedule[0].total_working_capital.value(),
            61_866.67
        );
    }
}
