//! The year-by-year term-debt amortisation schedule.
use crate::finance::round2;
use crate::units::{Dimensionless, Money};
use serde::Serialize;

/// Opening balances below this are treated as fully repaid, so residual rounding dust does not
/// trigger another repayment instalment.
pub(crate) const BALANCE_FLOOR: Money = Money(0.001);

/// The equal principal instalment for the amortisation window `(moratorium, loan_tenure]`.
pub(crate) fn instalment(loan_amount: Money, loan_tenure: u32, moratorium: u32) -> Money {
    if loan_tenure > moratorium {
        loan_amount / Dimensionless((loan_tenure - moratorium) as f64)
    } else {
        Money(0.0)
    }
}

/// One year of the debt amortisation schedule. Monetary figures are rounded to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DebtYear {
    /// 1-based year
    pub year: u32,
    /// Debt balance at the start of the year
    pub opening_balance: Money,
    /// Principal repaid during the year
    pub repayment: Money,
    /// Debt balance at the end of the year
    pub closing_balance: Money,
    /// Interest accrued on the opening balance
    pub interest: Money,
    /// Interest plus principal repayment
    pub total_debt_service: Money,
}

/// Compute the debt amortisation schedule over the plant life.
///
/// The loan principal is `net_capex * (1 - equity_fraction)`, repaid in equal instalments during
/// the window `(moratorium, loan_tenure]`. Interest accrues on the opening balance throughout,
/// including the moratorium. If the loan matures before the end of plant life, the balance simply
/// stops changing. A tenure that does not exceed the moratorium means no principal is ever
/// repaid; the caller is warned about that case at parameter validation.
pub fn compute_debt_schedule(
    net_capex: Money,
    equity_fraction: Dimensionless,
    interest_rate: Dimensionless,
    loan_tenure: u32,
    plant_life: u32,
    moratorium: u32,
) -> Vec<DebtYear> {
    let loan_amount = net_capex * (Dimensionless(1.0) - equity_fraction);
    let instalment = instalment(loan_amount, loan_tenure, moratorium);

    let mut schedule = Vec::with_capacity(plant_life as usize);
    let mut opening_balance = loan_amount;
    for year in 1..=plant_life {
        let interest = opening_balance * interest_rate;
        let repayment = if year > moratorium && opening_balance > BALANCE_FLOOR {
            instalment
        } else {
            Money(0.0)
        };
        let closing_balance = (opening_balance - repayment).max(Money(0.0));

        schedule.push(DebtYear {
            year,
            opening_balance: round2(opening_balance),
            repayment: round2(repayment),
            closing_balance: round2(closing_balance),
            interest: round2(interest),
            total_debt_service: round2(interest + repayment),
        });

        opening_balance = closing_balance;
    }

    schedule
}
