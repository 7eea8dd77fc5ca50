mod engine;
mod optimizer;
mod room;
pub mod tables;
mod tax;
mod types;

pub use engine::{cesg_grant, run_plan};
pub use optimizer::{
    HIGH_RATE_THRESHOLD, MODERATE_RATE_FLOOR, allocate, optimal_resp_contribution,
    optimize_contributions,
};
pub use room::{compute_rooms, fhsa_room, resp_room, rrsp_room, tfsa_room};
pub use tables::{federal_brackets, provincial_brackets};
pub use tax::{
    bracket_walk, cpp_contribution, effective_rate, ei_premium, income_tax, marginal_rate,
    tax_breakdown, tax_savings,
};
pub use types::{
    AccountType, AllocationPlan, BracketSlice, FundingStep, PlanReport, Priority, Province,
    RoomSnapshot, TaxBracket, TaxBreakdown, UserFinancialProfile,
};
