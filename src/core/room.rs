use super::tables::{FHSA, RESP, RRSP, TAX_YEAR, TFSA};
use super::types::{RoomSnapshot, UserFinancialProfile};

fn non_negative(amount: f64) -> f64 {
    if amount.is_finite() { amount.max(0.0) } else { 0.0 }
}

/// Cumulative TFSA room: every published annual cap from the later of the first
/// TFSA year and the year the holder turned 18, less everything ever contributed.
pub fn tfsa_room(age: u32, total_contributions: f64) -> f64 {
    if age < TFSA.min_age {
        return 0.0;
    }
    let adult_years = i64::from(age - TFSA.min_age);
    let start_year = i64::from(TFSA.first_year()).max(i64::from(TAX_YEAR) - adult_years);

    let accrued: f64 = TFSA
        .historical_limits
        .iter()
        .filter(|&&(year, _)| i64::from(year) >= start_year && year <= TAX_YEAR)
        .map(|&(_, cap)| cap)
        .sum();

    non_negative(accrued - total_contributions.max(0.0))
}

pub fn fhsa_room(
    age: u32,
    is_first_time_buyer: bool,
    current_year_contributions: f64,
    lifetime_contributions: f64,
    unused_room_from_previous_years: f64,
) -> f64 {
    if age < FHSA.min_age || !is_first_time_buyer {
        return 0.0;
    }
    let remaining_lifetime = (FHSA.lifetime_limit - lifetime_contributions.max(0.0)).max(0.0);
    let carry_forward = FHSA
        .max_carry_forward
        .min(unused_room_from_previous_years.max(0.0));
    let annual_with_carry = FHSA.annual_limit + carry_forward;

    non_negative(remaining_lifetime.min(annual_with_carry - current_year_contributions.max(0.0)))
}

/// New room is 18% of prior-year earned income up to the annual ceiling. Any
/// employer-matched amount must already be folded into `current_year_contributions`.
pub fn rrsp_room(
    age: u32,
    prior_year_income: f64,
    current_year_contributions: f64,
    carry_forward_room: f64,
) -> f64 {
    if age < RRSP.min_age {
        return 0.0;
    }
    let new_room = (prior_year_income.max(0.0) * RRSP.percentage_of_income)
        .min(RRSP.max_annual_limit);

    non_negative(new_room + carry_forward_room.max(0.0) - current_year_contributions.max(0.0))
}

/// RESP has no annual cap here; the per-beneficiary lifetime limit is the only bound.
pub fn resp_room(age: u32, num_beneficiaries: u32, lifetime_contributions: f64) -> f64 {
    if age < RESP.min_age || num_beneficiaries == 0 {
        return 0.0;
    }
    let lifetime_limit = f64::from(num_beneficiaries) * RESP.lifetime_limit_per_beneficiary;
    non_negative(lifetime_limit - lifetime_contributions.max(0.0))
}

pub fn compute_rooms(profile: &UserFinancialProfile) -> RoomSnapshot {
    let rrsp_contributions = profile.rrsp_current_year_contributions + profile.rrsp_employer_match;

    RoomSnapshot {
        tfsa: tfsa_room(profile.age, profile.tfsa_total_contributions),
        fhsa: fhsa_room(
            profile.age,
            profile.is_first_time_buyer,
            profile.fhsa_current_year_contributions,
            profile.fhsa_lifetime_contributions,
            profile.fhsa_unused_room,
        ),
        rrsp: rrsp_room(
            profile.age,
            profile.prior_year_income,
            rrsp_contributions,
            profile.rrsp_carry_forward,
        ),
        resp: resp_room(
            profile.age,
            profile.num_beneficiaries,
            profile.resp_lifetime_contributions,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{any, prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn tfsa_room_for_35_year_old_spans_whole_history() {
        assert_approx(tfsa_room(35, 0.0), 102_000.0);
    }

    #[test]
    fn tfsa_room_starts_at_eighteenth_birthday() {
        assert_approx(tfsa_room(18, 0.0), 7_000.0);
        assert_approx(tfsa_room(20, 0.0), 6_500.0 + 7_000.0 + 7_000.0);
        assert_approx(tfsa_room(17, 0.0), 0.0);
        assert_approx(tfsa_room(0, 0.0), 0.0);
    }

    #[test]
    fn tfsa_room_subtracts_contributions_and_floors_at_zero() {
        assert_approx(tfsa_room(35, 40_000.0), 62_000.0);
        assert_approx(tfsa_room(35, 150_000.0), 0.0);
        assert_approx(tfsa_room(u32::MAX, 0.0), 102_000.0);
    }

    #[test]
    fn fhsa_room_caps_carry_forward() {
        assert_approx(fhsa_room(30, true, 0.0, 0.0, 10_000.0), 16_000.0);
        assert_approx(fhsa_room(30, true, 0.0, 0.0, 3_000.0), 11_000.0);
    }

    #[test]
    fn fhsa_room_requires_adult_first_time_buyer() {
        assert_approx(fhsa_room(30, false, 0.0, 0.0, 8_000.0), 0.0);
        assert_approx(fhsa_room(17, true, 0.0, 0.0, 8_000.0), 0.0);
    }

    #[test]
    fn fhsa_room_is_bounded_by_remaining_lifetime() {
        assert_approx(fhsa_room(40, true, 0.0, 35_000.0, 8_000.0), 5_000.0);
        assert_approx(fhsa_room(40, true, 0.0, 45_000.0, 8_000.0), 0.0);
        assert_approx(fhsa_room(40, true, 9_000.0, 9_000.0, 8_000.0), 7_000.0);
        assert_approx(fhsa_room(40, true, 20_000.0, 20_000.0, 8_000.0), 0.0);
    }

    #[test]
    fn rrsp_room_is_eighteen_percent_up_to_ceiling() {
        assert_approx(rrsp_room(40, 100_000.0, 0.0, 0.0), 18_000.0);
        assert_approx(rrsp_room(40, 500_000.0, 0.0, 0.0), 30_780.0);
        assert_approx(rrsp_room(40, 100_000.0, 5_000.0, 12_000.0), 25_000.0);
        assert_approx(rrsp_room(40, 10_000.0, 5_000.0, 0.0), 0.0);
        assert_approx(rrsp_room(16, 100_000.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn resp_room_is_lifetime_limit_per_beneficiary() {
        assert_approx(resp_room(35, 2, 0.0), 100_000.0);
        assert_approx(resp_room(35, 2, 30_000.0), 70_000.0);
        assert_approx(resp_room(35, 1, 60_000.0), 0.0);
        assert_approx(resp_room(35, 0, 0.0), 0.0);
        assert_approx(resp_room(17, 3, 0.0), 0.0);
    }

    #[test]
    fn negative_contributions_count_as_nothing_used() {
        assert_approx(tfsa_room(35, -50_000.0), 102_000.0);
        assert_approx(rrsp_room(40, 100_000.0, -20_000.0, 0.0), 18_000.0);
        assert_approx(fhsa_room(30, true, -20_000.0, 0.0, 0.0), 8_000.0);
        assert_approx(fhsa_room(30, true, 0.0, -20_000.0, 8_000.0), 16_000.0);
        assert_approx(resp_room(30, 1, -9_000.0), 50_000.0);
    }

    #[test]
    fn compute_rooms_folds_employer_match_into_rrsp_usage() {
        let profile = UserFinancialProfile {
            age: 35,
            prior_year_income: 100_000.0,
            rrsp_current_year_contributions: 3_000.0,
            rrsp_employer_match: 2_000.0,
            rrsp_carry_forward: 1_000.0,
            ..UserFinancialProfile::default()
        };
        assert_approx(compute_rooms(&profile).rrsp, 18_000.0 + 1_000.0 - 5_000.0);
    }

    #[test]
    fn compute_rooms_uses_lifetime_resp_contributions() {
        let profile = UserFinancialProfile {
            age: 35,
            num_beneficiaries: 1,
            resp_current_year_contributions: 1_000.0,
            resp_lifetime_contributions: 20_000.0,
            ..UserFinancialProfile::default()
        };
        assert_approx(compute_rooms(&profile).resp, 30_000.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(128))]

        #[test]
        fn prop_rooms_are_never_negative_and_repeatable(
            age in 0u32..110,
            buyer in any::<bool>(),
            beneficiaries in 0u32..6,
            income in 0u32..400_000,
            tfsa_used in 0u32..200_000,
            fhsa_current in 0u32..20_000,
            fhsa_lifetime in 0u32..60_000,
            fhsa_unused in 0u32..20_000,
            rrsp_current in 0u32..60_000,
            rrsp_carry in 0u32..100_000,
            resp_lifetime in 0u32..300_000,
        ) {
            let profile = UserFinancialProfile {
                age,
                prior_year_income: income as f64,
                is_first_time_buyer: buyer,
                num_beneficiaries: beneficiaries,
                tfsa_total_contributions: tfsa_used as f64,
                fhsa_current_year_contributions: fhsa_current as f64,
                fhsa_lifetime_contributions: fhsa_lifetime as f64,
                fhsa_unused_room: fhsa_unused as f64,
                rrsp_current_year_contributions: rrsp_current as f64,
                rrsp_carry_forward: rrsp_carry as f64,
                resp_lifetime_contributions: resp_lifetime as f64,
                ..UserFinancialProfile::default()
            };
            let rooms = compute_rooms(&profile);
            prop_assert!(rooms.tfsa >= 0.0 && rooms.fhsa >= 0.0);
            prop_assert!(rooms.rrsp >= 0.0 && rooms.resp >= 0.0);
            prop_assert!(rooms.fhsa <= FHSA.annual_limit + FHSA.max_carry_forward);
            prop_assert_eq!(rooms, compute_rooms(&profile));
        }

        #[test]
        fn prop_negative_contributions_never_exceed_statutory_caps(
            age in 18u32..80,
            beneficiaries in 1u32..4,
            income in 0u32..400_000,
            tfsa_used in -500_000i32..=0,
            fhsa_current in -50_000i32..=0,
            fhsa_lifetime in -50_000i32..=0,
            rrsp_current in -100_000i32..=0,
            resp_lifetime in -500_000i32..=0,
        ) {
            let history: f64 = TFSA.historical_limits.iter().map(|&(_, cap)| cap).sum();
            let income = income as f64;

            prop_assert!(tfsa_room(age, tfsa_used as f64) <= history + EPS);
            prop_assert!(
                fhsa_room(age, true, fhsa_current as f64, fhsa_lifetime as f64, 0.0)
                    <= FHSA.annual_limit + EPS
            );
            prop_assert!(
                fhsa_room(age, true, fhsa_current as f64, fhsa_lifetime as f64, 50_000.0)
                    <= FHSA.annual_limit + FHSA.max_carry_forward + EPS
            );
            prop_assert!(
                rrsp_room(age, income, rrsp_current as f64, 0.0)
                    <= (income * RRSP.percentage_of_income).min(RRSP.max_annual_limit) + EPS
            );
            prop_assert!(
                resp_room(age, beneficiaries, resp_lifetime as f64)
                    <= f64::from(beneficiaries) * RESP.lifetime_limit_per_beneficiary + EPS
            );
        }
    }
}
