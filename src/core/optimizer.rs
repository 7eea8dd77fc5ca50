use tracing::trace;

use super::tables::RESP;
use super::tax::marginal_rate;
use super::types::{
    AccountType, AllocationPlan, FundingStep, Priority, RoomSnapshot, UserFinancialProfile,
};

/// RRSP is preferred over RESP/TFSA only above this combined marginal rate.
pub const HIGH_RATE_THRESHOLD: f64 = 0.25;
/// Lower edge of the band where RRSP still beats TFSA once RESP grants are secured.
pub const MODERATE_RATE_FLOOR: f64 = 0.15;

/// Contribution that captures the full CESG match for every beneficiary, limited
/// by what is available.
pub fn optimal_resp_contribution(num_beneficiaries: u32, available_funds: f64) -> f64 {
    if num_beneficiaries == 0 {
        return 0.0;
    }
    let grant_optimal = f64::from(num_beneficiaries) * RESP.cesg_max_annual_match;
    grant_optimal.min(available_funds.max(0.0))
}

/// Shared state of one waterfall pass.
struct Waterfall<'a> {
    rooms: &'a RoomSnapshot,
    remaining: f64,
    plan: AllocationPlan,
}

impl<'a> Waterfall<'a> {
    fn new(lump_sum: f64, rooms: &'a RoomSnapshot) -> Self {
        Self {
            rooms,
            remaining: lump_sum,
            plan: AllocationPlan::default(),
        }
    }

    /// Room on `account` not yet claimed by an earlier step.
    fn open_room(&self, account: AccountType) -> f64 {
        (self.rooms.get(account) - self.plan.get(account)).max(0.0)
    }

    /// Moves up to `cap` into `account`, never beyond its open room or the funds left.
    fn fund(&mut self, priority: Priority, account: AccountType, cap: f64) {
        if self.remaining <= 0.0 {
            return;
        }
        let amount = cap.min(self.open_room(account)).min(self.remaining);
        if amount <= 0.0 {
            return;
        }
        self.remaining -= amount;
        self.plan.credit(account, amount);
        self.plan.steps.push(FundingStep {
            priority,
            account,
            amount,
        });
        trace!(?priority, ?account, amount, remaining = self.remaining, "funded step");
    }

    fn fill(&mut self, priority: Priority, account: AccountType) {
        self.fund(priority, account, f64::INFINITY);
    }
}

/// Splits `lump_sum` across the four accounts in a fixed priority order:
///
/// 1. FHSA, for first-time buyers.
/// 2. RRSP, when the marginal rate is above 25%.
/// 3. RESP, up to the grant-matching amount per beneficiary.
/// 4. RRSP, when the marginal rate is between 15% and 25% inclusive.
/// 5. TFSA.
/// 6. Whatever RRSP room is left.
/// 7. Whatever RESP room is left.
///
/// Each step only sees the room earlier steps left behind. A non-positive or
/// non-finite lump sum yields an empty plan.
pub fn allocate(
    lump_sum: f64,
    rooms: &RoomSnapshot,
    marginal_rate: f64,
    is_first_time_buyer: bool,
    num_beneficiaries: u32,
) -> AllocationPlan {
    if !lump_sum.is_finite() || lump_sum <= 0.0 {
        return AllocationPlan::default();
    }

    let mut waterfall = Waterfall::new(lump_sum, rooms);

    if is_first_time_buyer {
        waterfall.fill(Priority::FirstHome, AccountType::Fhsa);
    }

    if marginal_rate > HIGH_RATE_THRESHOLD {
        waterfall.fill(Priority::HighRateRrsp, AccountType::Rrsp);
    }

    if num_beneficiaries > 0 {
        let grant_target = optimal_resp_contribution(num_beneficiaries, waterfall.remaining);
        waterfall.fund(Priority::RespGrant, AccountType::Resp, grant_target);
    }

    if (MODERATE_RATE_FLOOR..=HIGH_RATE_THRESHOLD).contains(&marginal_rate) {
        waterfall.fill(Priority::ModerateRateRrsp, AccountType::Rrsp);
    }

    waterfall.fill(Priority::Tfsa, AccountType::Tfsa);
    waterfall.fill(Priority::RrspRemainder, AccountType::Rrsp);
    waterfall.fill(Priority::RespRemainder, AccountType::Resp);

    waterfall.plan
}

/// Runs [`allocate`] for a profile, failing closed to an empty plan when the
/// province is unset or there is no income or nothing to invest.
pub fn optimize_contributions(
    profile: &UserFinancialProfile,
    rooms: &RoomSnapshot,
) -> AllocationPlan {
    let fundable = profile.province.is_some() && profile.income > 0.0 && profile.lump_sum > 0.0;
    if !fundable {
        return AllocationPlan::default();
    }
    let rate = marginal_rate(profile.income, profile.province);
    allocate(
        profile.lump_sum,
        rooms,
        rate,
        profile.is_first_time_buyer,
        profile.num_beneficiaries,
    )
}
