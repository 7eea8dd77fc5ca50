use super::tables::{CPP_RATES, EI_RATES, federal_brackets, provincial_brackets};
use super::types::{BracketSlice, Province, TaxBracket, TaxBreakdown};

/// Walks a progressive schedule from the bottom, filling each bracket before the
/// next. Stops as soon as the income is used up, so only touched brackets appear.
pub fn bracket_walk(taxable_income: f64, brackets: &[TaxBracket]) -> Vec<BracketSlice> {
    let mut slices = Vec::new();
    let mut remaining = taxable_income;
    for bracket in brackets {
        if remaining <= 0.0 {
            break;
        }
        let taxed = bracket.absorb(remaining);
        slices.push(BracketSlice {
            min: bracket.min,
            max: bracket.max,
            rate: bracket.rate,
            taxed,
            tax: taxed * bracket.rate,
        });
        remaining -= taxed;
    }
    slices
}

fn schedule_tax(taxable_income: f64, brackets: &[TaxBracket]) -> f64 {
    bracket_walk(taxable_income, brackets)
        .iter()
        .map(|slice| slice.tax)
        .sum()
}

fn bracket_rate(income: f64, brackets: &[TaxBracket]) -> f64 {
    brackets
        .iter()
        .find(|bracket| bracket.contains(income))
        .map(|bracket| bracket.rate)
        .unwrap_or(0.0)
}

/// True when the inputs describe something we can tax; everything else degrades to zero.
fn is_taxable(income: f64, province: Option<Province>) -> bool {
    province.is_some() && income.is_finite() && income > 0.0
}

/// Combined federal + provincial rate on the next dollar of `income`.
pub fn marginal_rate(income: f64, province: Option<Province>) -> f64 {
    if !is_taxable(income, province) {
        return 0.0;
    }
    bracket_rate(income, federal_brackets()) + bracket_rate(income, provincial_brackets(province))
}

/// `(federal, provincial)` income tax on `income - deductions`, floored at zero taxable.
pub fn income_tax(income: f64, province: Option<Province>, deductions: f64) -> (f64, f64) {
    if !is_taxable(income, province) {
        return (0.0, 0.0);
    }
    let taxable_income = (income - deductions.max(0.0)).max(0.0);
    (
        schedule_tax(taxable_income, federal_brackets()),
        schedule_tax(taxable_income, provincial_brackets(province)),
    )
}

/// Income tax divided by gross income. Deductions shrink the numerator only.
pub fn effective_rate(income: f64, province: Option<Province>, deductions: f64) -> f64 {
    if !is_taxable(income, province) {
        return 0.0;
    }
    let (federal, provincial) = income_tax(income, province, deductions);
    (federal + provincial) / income
}

pub fn cpp_contribution(income: f64) -> f64 {
    let pensionable = income.max(0.0).min(CPP_RATES.max_pensionable_earnings);
    let contributory = (pensionable - CPP_RATES.basic_exemption).max(0.0);
    (contributory * CPP_RATES.rate).min(CPP_RATES.max_contribution)
}

pub fn ei_premium(income: f64) -> f64 {
    let insurable = income.max(0.0).min(EI_RATES.max_insurable_earnings);
    (insurable * EI_RATES.rate).min(EI_RATES.max_premium)
}

/// Full payroll picture. CPP and EI always use gross income; only the income tax
/// legs see `deductions`.
pub fn tax_breakdown(income: f64, province: Option<Province>, deductions: f64) -> TaxBreakdown {
    if !is_taxable(income, province) {
        return TaxBreakdown::zero(income);
    }

    let (federal_tax, provincial_tax) = income_tax(income, province, deductions);
    let cpp = cpp_contribution(income);
    let ei = ei_premium(income);
    let total_deductions = federal_tax + provincial_tax + cpp + ei;

    TaxBreakdown {
        federal_tax,
        provincial_tax,
        cpp,
        ei,
        total_deductions,
        net_income: income - total_deductions,
    }
}

/// Immediate refund estimate for a deductible contribution.
pub fn tax_savings(contribution: f64, marginal_rate: f64) -> f64 {
    contribution.max(0.0) * marginal_rate
}
