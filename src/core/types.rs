use std::fmt;

use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Province {
    AB,
    BC,
    MB,
    NB,
    NL,
    NT,
    NS,
    NU,
    ON,
    PE,
    QC,
    SK,
    YT,
}

impl Province {
    pub const ALL: [Province; 13] = [
        Province::AB,
        Province::BC,
        Province::MB,
        Province::NB,
        Province::NL,
        Province::NT,
        Province::NS,
        Province::NU,
        Province::ON,
        Province::PE,
        Province::QC,
        Province::SK,
        Province::YT,
    ];

    /// Parses a two-letter province/territory code, ignoring case and surrounding
    /// whitespace. Anything unrecognized (including an empty string) is `None`.
    pub fn from_code(code: &str) -> Option<Province> {
        let code = code.trim();
        Province::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(code))
    }

    pub fn code(self) -> &'static str {
        match self {
            Province::AB => "AB",
            Province::BC => "BC",
            Province::MB => "MB",
            Province::NB => "NB",
            Province::NL => "NL",
            Province::NT => "NT",
            Province::NS => "NS",
            Province::NU => "NU",
            Province::ON => "ON",
            Province::PE => "PE",
            Province::QC => "QC",
            Province::SK => "SK",
            Province::YT => "YT",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Province::AB => "Alberta",
            Province::BC => "British Columbia",
            Province::MB => "Manitoba",
            Province::NB => "New Brunswick",
            Province::NL => "Newfoundland and Labrador",
            Province::NT => "Northwest Territories",
            Province::NS => "Nova Scotia",
            Province::NU => "Nunavut",
            Province::ON => "Ontario",
            Province::PE => "Prince Edward Island",
            Province::QC => "Quebec",
            Province::SK => "Saskatchewan",
            Province::YT => "Yukon",
        }
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Tfsa,
    Fhsa,
    Rrsp,
    Resp,
}

/// One contiguous range of a progressive schedule. `max: None` marks the open-ended
/// top bracket.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct TaxBracket {
    pub min: f64,
    pub max: Option<f64>,
    pub rate: f64,
}

impl TaxBracket {
    pub fn contains(&self, income: f64) -> bool {
        income > self.min && self.max.is_none_or(|max| income <= max)
    }

    /// Amount of `remaining` income this bracket absorbs.
    pub fn absorb(&self, remaining: f64) -> f64 {
        match self.max {
            Some(max) => remaining.min(max - self.min),
            None => remaining,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSlice {
    pub min: f64,
    pub max: Option<f64>,
    pub rate: f64,
    pub taxed: f64,
    pub tax: f64,
}

/// Everything the engine needs for one calculation. Owned by the caller and never
/// retained between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFinancialProfile {
    pub age: u32,
    pub province: Option<Province>,
    pub income: f64,
    pub prior_year_income: f64,
    pub lump_sum: f64,
    pub is_first_time_buyer: bool,
    pub num_beneficiaries: u32,
    pub tfsa_total_contributions: f64,
    pub fhsa_current_year_contributions: f64,
    pub fhsa_lifetime_contributions: f64,
    pub fhsa_unused_room: f64,
    pub rrsp_current_year_contributions: f64,
    pub rrsp_employer_match: f64,
    pub rrsp_carry_forward: f64,
    pub resp_current_year_contributions: f64,
    pub resp_lifetime_contributions: f64,
}

impl Default for UserFinancialProfile {
    fn default() -> Self {
        Self {
            age: 18,
            province: None,
            income: 0.0,
            prior_year_income: 0.0,
            lump_sum: 0.0,
            is_first_time_buyer: false,
            num_beneficiaries: 0,
            tfsa_total_contributions: 0.0,
            fhsa_current_year_contributions: 0.0,
            fhsa_lifetime_contributions: 0.0,
            fhsa_unused_room: 0.0,
            rrsp_current_year_contributions: 0.0,
            rrsp_employer_match: 0.0,
            rrsp_carry_forward: 0.0,
            resp_current_year_contributions: 0.0,
            resp_lifetime_contributions: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub tfsa: f64,
    pub fhsa: f64,
    pub rrsp: f64,
    pub resp: f64,
}

impl RoomSnapshot {
    pub fn get(&self, account: AccountType) -> f64 {
        match account {
            AccountType::Tfsa => self.tfsa,
            AccountType::Fhsa => self.fhsa,
            AccountType::Rrsp => self.rrsp,
            AccountType::Resp => self.resp,
        }
    }
}

/// Position of a waterfall step, in execution order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    FirstHome,
    HighRateRrsp,
    RespGrant,
    ModerateRateRrsp,
    Tfsa,
    RrspRemainder,
    RespRemainder,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingStep {
    pub priority: Priority,
    pub account: AccountType,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    pub tfsa: f64,
    pub fhsa: f64,
    pub rrsp: f64,
    pub resp: f64,
    pub total_allocated: f64,
    pub steps: Vec<FundingStep>,
}

impl AllocationPlan {
    pub fn get(&self, account: AccountType) -> f64 {
        match account {
            AccountType::Tfsa => self.tfsa,
            AccountType::Fhsa => self.fhsa,
            AccountType::Rrsp => self.rrsp,
            AccountType::Resp => self.resp,
        }
    }

    pub(crate) fn credit(&mut self, account: AccountType, amount: f64) {
        let slot = match account {
            AccountType::Tfsa => &mut self.tfsa,
            AccountType::Fhsa => &mut self.fhsa,
            AccountType::Rrsp => &mut self.rrsp,
            AccountType::Resp => &mut self.resp,
        };
        *slot += amount;
        self.total_allocated += amount;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub federal_tax: f64,
    pub provincial_tax: f64,
    pub cpp: f64,
    pub ei: f64,
    pub total_deductions: f64,
    pub net_income: f64,
}

impl TaxBreakdown {
    pub fn zero(income: f64) -> Self {
        Self {
            net_income: income,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub province: Option<Province>,
    pub income: f64,
    pub lump_sum: f64,
    pub rooms: RoomSnapshot,
    pub allocation: AllocationPlan,
    pub unallocated: f64,
    pub marginal_rate: f64,
    pub effective_rate: f64,
    pub deductions: f64,
    pub tax_savings: f64,
    pub resp_grant: f64,
    pub baseline_breakdown: TaxBreakdown,
    pub breakdown: TaxBreakdown,
}
