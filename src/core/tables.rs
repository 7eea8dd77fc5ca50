//! 2025 federal and provincial/territorial bracket schedules, payroll deduction
//! parameters and registered account limits.

use super::types::{Province, TaxBracket};

pub const TAX_YEAR: i32 = 2025;

/// Minimum age for opening or accruing room in any registered account.
pub const ADULT_AGE: u32 = 18;

const fn bracket(min: f64, max: f64, rate: f64) -> TaxBracket {
    TaxBracket {
        min,
        max: Some(max),
        rate,
    }
}

const fn top(min: f64, rate: f64) -> TaxBracket {
    TaxBracket {
        min,
        max: None,
        rate,
    }
}

pub const FEDERAL_BRACKETS: [TaxBracket; 5] = [
    bracket(0.0, 57_375.0, 0.14),
    bracket(57_375.0, 114_750.0, 0.205),
    bracket(114_750.0, 177_882.0, 0.26),
    bracket(177_882.0, 253_414.0, 0.29),
    top(253_414.0, 0.33),
];

// AB and MB first-bracket rates are prorated for 2025.
const AB_BRACKETS: [TaxBracket; 6] = [
    bracket(0.0, 60_000.0, 0.06),
    bracket(60_000.0, 151_234.0, 0.10),
    bracket(151_234.0, 181_481.0, 0.12),
    bracket(181_481.0, 241_974.0, 0.13),
    bracket(241_974.0, 362_961.0, 0.14),
    top(362_961.0, 0.15),
];

const BC_BRACKETS: [TaxBracket; 7] = [
    bracket(0.0, 47_937.0, 0.0506),
    bracket(47_937.0, 95_875.0, 0.077),
    bracket(95_875.0, 110_076.0, 0.105),
    bracket(110_076.0, 133_664.0, 0.1229),
    bracket(133_664.0, 181_232.0, 0.147),
    bracket(181_232.0, 252_752.0, 0.168),
    top(252_752.0, 0.205),
];

const MB_BRACKETS: [TaxBracket; 3] = [
    bracket(0.0, 46_513.0, 0.108),
    bracket(46_513.0, 98_796.0, 0.1275),
    top(98_796.0, 0.174),
];

const NB_BRACKETS: [TaxBracket; 4] = [
    bracket(0.0, 49_958.0, 0.094),
    bracket(49_958.0, 99_916.0, 0.14),
    bracket(99_916.0, 185_064.0, 0.16),
    top(185_064.0, 0.195),
];

const NL_BRACKETS: [TaxBracket; 5] = [
    bracket(0.0, 43_198.0, 0.087),
    bracket(43_198.0, 86_395.0, 0.145),
    bracket(86_395.0, 154_244.0, 0.158),
    bracket(154_244.0, 215_943.0, 0.173),
    top(215_943.0, 0.183),
];

const NT_BRACKETS: [TaxBracket; 4] = [
    bracket(0.0, 50_877.0, 0.059),
    bracket(50_877.0, 101_754.0, 0.086),
    bracket(101_754.0, 165_429.0, 0.122),
    top(165_429.0, 0.1405),
];

const NS_BRACKETS: [TaxBracket; 5] = [
    bracket(0.0, 29_590.0, 0.0879),
    bracket(29_590.0, 59_180.0, 0.1495),
    bracket(59_180.0, 93_000.0, 0.1667),
    bracket(93_000.0, 150_000.0, 0.175),
    top(150_000.0, 0.21),
];

const NU_BRACKETS: [TaxBracket; 4] = [
    bracket(0.0, 50_877.0, 0.04),
    bracket(50_877.0, 101_754.0, 0.07),
    bracket(101_754.0, 165_429.0, 0.09),
    top(165_429.0, 0.115),
];

const ON_BRACKETS: [TaxBracket; 5] = [
    bracket(0.0, 51_446.0, 0.0505),
    bracket(51_446.0, 102_894.0, 0.0915),
    bracket(102_894.0, 150_000.0, 0.1116),
    bracket(150_000.0, 220_000.0, 0.1216),
    top(220_000.0, 0.1316),
];

const PE_BRACKETS: [TaxBracket; 4] = [
    bracket(0.0, 32_656.0, 0.098),
    bracket(32_656.0, 65_312.0, 0.138),
    bracket(65_312.0, 105_000.0, 0.167),
    top(105_000.0, 0.18),
];

// Quebec administers its own income tax; these are its provincial rates.
const QC_BRACKETS: [TaxBracket; 4] = [
    bracket(0.0, 51_480.0, 0.14),
    bracket(51_480.0, 102_975.0, 0.19),
    bracket(102_975.0, 123_395.0, 0.24),
    top(123_395.0, 0.2575),
];

const SK_BRACKETS: [TaxBracket; 3] = [
    bracket(0.0, 52_057.0, 0.105),
    bracket(52_057.0, 148_734.0, 0.125),
    top(148_734.0, 0.145),
];

const YT_BRACKETS: [TaxBracket; 5] = [
    bracket(0.0, 50_877.0, 0.064),
    bracket(50_877.0, 101_754.0, 0.09),
    bracket(101_754.0, 165_429.0, 0.109),
    bracket(165_429.0, 500_000.0, 0.128),
    top(500_000.0, 0.15),
];

pub fn federal_brackets() -> &'static [TaxBracket] {
    &FEDERAL_BRACKETS
}

/// Bracket table for `province`; empty when the province is unset or unknown.
pub fn provincial_brackets(province: Option<Province>) -> &'static [TaxBracket] {
    let Some(province) = province else {
        return &[];
    };
    match province {
        Province::AB => &AB_BRACKETS,
        Province::BC => &BC_BRACKETS,
        Province::MB => &MB_BRACKETS,
        Province::NB => &NB_BRACKETS,
        Province::NL => &NL_BRACKETS,
        Province::NT => &NT_BRACKETS,
        Province::NS => &NS_BRACKETS,
        Province::NU => &NU_BRACKETS,
        Province::ON => &ON_BRACKETS,
        Province::PE => &PE_BRACKETS,
        Province::QC => &QC_BRACKETS,
        Province::SK => &SK_BRACKETS,
        Province::YT => &YT_BRACKETS,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CppRates {
    pub rate: f64,
    pub max_pensionable_earnings: f64,
    pub basic_exemption: f64,
    pub max_contribution: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct EiRates {
    pub rate: f64,
    pub max_insurable_earnings: f64,
    pub max_premium: f64,
}

pub const CPP_RATES: CppRates = CppRates {
    rate: 0.0595,
    max_pensionable_earnings: 71_300.0,
    basic_exemption: 3_500.0,
    max_contribution: 4_034.10,
};

pub const EI_RATES: EiRates = EiRates {
    rate: 0.0164,
    max_insurable_earnings: 65_700.0,
    max_premium: 1_077.48,
};

#[derive(Debug, Clone, Copy)]
pub struct TfsaLimits {
    pub annual_limit: f64,
    pub min_age: u32,
    /// `(year, cap)` pairs in ascending year order, starting with the first TFSA year.
    pub historical_limits: &'static [(i32, f64)],
}

impl TfsaLimits {
    pub fn first_year(&self) -> i32 {
        self.historical_limits
            .first()
            .map(|&(year, _)| year)
            .unwrap_or(TAX_YEAR)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FhsaLimits {
    pub annual_limit: f64,
    pub lifetime_limit: f64,
    pub max_carry_forward: f64,
    pub min_age: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RrspLimits {
    pub percentage_of_income: f64,
    pub max_annual_limit: f64,
    pub min_age: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RespLimits {
    pub lifetime_limit_per_beneficiary: f64,
    pub cesg_match_rate: f64,
    /// Contribution per beneficiary per year that attracts the full CESG match.
    pub cesg_max_annual_match: f64,
    pub cesg_max_annual_grant: f64,
    pub min_age: u32,
}

pub const TFSA: TfsaLimits = TfsaLimits {
    annual_limit: 7_000.0,
    min_age: ADULT_AGE,
    historical_limits: &[
        (2009, 5_000.0),
        (2010, 5_000.0),
        (2011, 5_000.0),
        (2012, 5_000.0),
        (2013, 5_500.0),
        (2014, 5_500.0),
        (2015, 10_000.0),
        (2016, 5_500.0),
        (2017, 5_500.0),
        (2018, 5_500.0),
        (2019, 6_000.0),
        (2020, 6_000.0),
        (2021, 6_000.0),
        (2022, 6_000.0),
        (2023, 6_500.0),
        (2024, 7_000.0),
        (2025, 7_000.0),
    ],
};

pub const FHSA: FhsaLimits = FhsaLimits {
    annual_limit: 8_000.0,
    lifetime_limit: 40_000.0,
    max_carry_forward: 8_000.0,
    min_age: ADULT_AGE,
};

pub const RRSP: RrspLimits = RrspLimits {
    percentage_of_income: 0.18,
    max_annual_limit: 30_780.0,
    min_age: ADULT_AGE,
};

pub const RESP: RespLimits = RespLimits {
    lifetime_limit_per_beneficiary: 50_000.0,
    cesg_match_rate: 0.20,
    cesg_max_annual_match: 2_500.0,
    cesg_max_annual_grant: 500.0,
    min_age: ADULT_AGE,
};
