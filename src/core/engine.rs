use tracing::debug;

use super::optimizer::optimize_contributions;
use super::room::compute_rooms;
use super::tables::RESP;
use super::tax::{effective_rate, marginal_rate, tax_breakdown, tax_savings};
use super::types::{PlanReport, UserFinancialProfile};

/// CESG earned by contributing `recommended` on top of `prior_current_year` this
/// year: 20% of contributions up to the per-beneficiary annual grant cap.
pub fn cesg_grant(prior_current_year: f64, recommended: f64, num_beneficiaries: u32) -> f64 {
    if num_beneficiaries == 0 {
        return 0.0;
    }
    let grant_cap = f64::from(num_beneficiaries) * RESP.cesg_max_annual_grant;
    let grant_on = |contributed: f64| (contributed.max(0.0) * RESP.cesg_match_rate).min(grant_cap);

    let prior = prior_current_year.max(0.0);
    (grant_on(prior + recommended.max(0.0)) - grant_on(prior)).max(0.0)
}

/// Full recomputation for one input snapshot: rooms, then the split of the lump
/// sum, then the tax picture with and without the recommended deductions.
pub fn run_plan(profile: &UserFinancialProfile) -> PlanReport {
    let rooms = compute_rooms(profile);
    let allocation = optimize_contributions(profile, &rooms);
    let rate = marginal_rate(profile.income, profile.province);

    let existing_deductions =
        profile.rrsp_current_year_contributions.max(0.0) + profile.rrsp_employer_match.max(0.0);
    let recommended_deductions = allocation.rrsp + allocation.fhsa;
    let deductions = existing_deductions + recommended_deductions;

    let baseline_breakdown = tax_breakdown(profile.income, profile.province, existing_deductions);
    let breakdown = tax_breakdown(profile.income, profile.province, deductions);

    let unallocated = if profile.lump_sum > 0.0 {
        (profile.lump_sum - allocation.total_allocated).max(0.0)
    } else {
        0.0
    };

    debug!(
        province = ?profile.province,
        marginal_rate = rate,
        allocated = allocation.total_allocated,
        unallocated,
        "computed contribution plan"
    );

    PlanReport {
        province: profile.province,
        income: profile.income,
        lump_sum: profile.lump_sum,
        rooms,
        unallocated,
        marginal_rate: rate,
        effective_rate: effective_rate(profile.income, profile.province, deductions),
        deductions,
        tax_savings: tax_savings(recommended_deductions, rate),
        resp_grant: cesg_grant(
            profile.resp_current_year_contributions,
            allocation.resp,
            profile.num_beneficiaries,
        ),
        baseline_breakdown,
        breakdown,
        allocation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AllocationPlan, Province, TaxBreakdown};
    use proptest::prelude::{any, prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_profile() -> UserFinancialProfile {
        UserFinancialProfile {
            age: 35,
            province: Some(Province::ON),
            income: 80_000.0,
            prior_year_income: 75_000.0,
            lump_sum: 20_000.0,
            is_first_time_buyer: true,
            num_beneficiaries: 1,
            ..UserFinancialProfile::default()
        }
    }

    #[test]
    fn cesg_grant_is_capped_per_beneficiary() {
        assert_approx(cesg_grant(0.0, 2_500.0, 1), 500.0);
        assert_approx(cesg_grant(0.0, 10_000.0, 1), 500.0);
        assert_approx(cesg_grant(0.0, 1_000.0, 2), 200.0);
        assert_approx(cesg_grant(2_000.0, 2_500.0, 1), 100.0);
        assert_approx(cesg_grant(3_000.0, 2_500.0, 1), 0.0);
        assert_approx(cesg_grant(0.0, 2_500.0, 0), 0.0);
    }

    #[test]
    fn plan_walks_fhsa_rrsp_resp_then_tfsa() {
        let report = run_plan(&sample_profile());

        assert_approx(report.marginal_rate, 0.2965);
        assert_approx(report.rooms.fhsa, 8_000.0);
        assert_approx(report.rooms.rrsp, 13_500.0);
        assert_approx(report.allocation.fhsa, 8_000.0);
        assert_approx(report.allocation.rrsp, 12_000.0);
        assert_approx(report.allocation.resp, 0.0);
        assert_approx(report.allocation.total_allocated, 20_000.0);
        assert_approx(report.unallocated, 0.0);
        assert_approx(report.deductions, 20_000.0);
        assert_approx(report.tax_savings, 20_000.0 * 0.2965);
    }

    #[test]
    fn recommended_deductions_lower_income_tax_only() {
        let report = run_plan(&sample_profile());
        let base = report.baseline_breakdown;
        let after = report.breakdown;
        assert!(after.federal_tax < base.federal_tax);
        assert!(after.provincial_tax < base.provincial_tax);
        assert_approx(after.cpp, base.cpp);
        assert_approx(after.ei, base.ei);
        assert!(after.net_income > base.net_income);
        assert_eq!(
            report.baseline_breakdown,
            tax_breakdown(80_000.0, Some(Province::ON), 0.0)
        );
    }

    #[test]
    fn existing_rrsp_contributions_count_as_baseline_deductions() {
        let mut profile = sample_profile();
        profile.lump_sum = 0.0;
        profile.rrsp_current_year_contributions = 4_000.0;
        profile.rrsp_employer_match = 1_000.0;

        let report = run_plan(&profile);
        assert_approx(report.deductions, 5_000.0);
        assert_eq!(report.baseline_breakdown, report.breakdown);
        assert_eq!(report.allocation, AllocationPlan::default());
        assert_approx(report.unallocated, 0.0);
        assert_approx(
            report.effective_rate,
            effective_rate(80_000.0, Some(Province::ON), 5_000.0),
        );
    }

    #[test]
    fn resp_grant_follows_recommended_resp_amount() {
        let mut profile = sample_profile();
        profile.is_first_time_buyer = false;
        profile.income = 40_000.0;
        profile.lump_sum = 3_000.0;
        profile.num_beneficiaries = 1;

        let report = run_plan(&profile);
        assert_approx(report.allocation.resp, 2_500.0);
        assert_approx(report.resp_grant, 500.0);
    }

    #[test]
    fn unknown_province_reports_zero_tax_and_no_allocation() {
        let mut profile = sample_profile();
        profile.province = None;

        let report = run_plan(&profile);
        assert_eq!(report.allocation, AllocationPlan::default());
        assert_eq!(report.marginal_rate, 0.0);
        assert_eq!(report.effective_rate, 0.0);
        assert_eq!(report.breakdown, TaxBreakdown::zero(80_000.0));
        assert_approx(report.unallocated, 20_000.0);
        assert!(report.rooms.tfsa > 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_plan_is_pure_and_consistent(
            age in 0u32..90,
            province_idx in 0usize..14,
            income in -5_000i32..400_000,
            lump_sum in -1_000i32..150_000,
            buyer in any::<bool>(),
            beneficiaries in 0u32..4,
            rrsp_used in 0u32..20_000,
        ) {
            let profile = UserFinancialProfile {
                age,
                province: Province::ALL.get(province_idx).copied(),
                income: income as f64,
                prior_year_income: income.max(0) as f64,
                lump_sum: lump_sum as f64,
                is_first_time_buyer: buyer,
                num_beneficiaries: beneficiaries,
                rrsp_current_year_contributions: rrsp_used as f64,
                ..UserFinancialProfile::default()
            };
            let report = run_plan(&profile);
            prop_assert_eq!(&report, &run_plan(&profile));

            let a = &report.allocation;
            prop_assert!(a.total_allocated <= profile.lump_sum.max(0.0) + EPS);
            prop_assert!(a.fhsa <= report.rooms.fhsa + EPS);
            prop_assert!(a.rrsp <= report.rooms.rrsp + EPS);
            prop_assert!(a.tfsa <= report.rooms.tfsa + EPS);
            prop_assert!(a.resp <= report.rooms.resp + EPS);
            prop_assert!(report.breakdown.net_income + EPS >= report.baseline_breakdown.net_income);
            prop_assert!(report.tax_savings >= 0.0 && report.resp_grant >= 0.0);
        }
    }
}
