use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{PlanReport, Province, UserFinancialProfile, run_plan};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    province: Option<String>,
    income: Option<f64>,
    #[serde(alias = "amountToMove")]
    lump_sum: Option<f64>,
    #[serde(alias = "isFirstTimeBuyer")]
    first_time_buyer: Option<bool>,
    age: Option<i64>,
    #[serde(alias = "income2024")]
    prior_year_income: Option<f64>,
    #[serde(alias = "numChildren")]
    num_beneficiaries: Option<i64>,

    tfsa_total_contributions: Option<f64>,

    #[serde(alias = "fhsaContributions")]
    fhsa_current_year_contributions: Option<f64>,
    fhsa_lifetime_contributions: Option<f64>,
    #[serde(alias = "fhsaPreviousUnusedRoom")]
    fhsa_unused_room: Option<f64>,

    #[serde(alias = "rrspContributions")]
    rrsp_current_year_contributions: Option<f64>,
    #[serde(alias = "companyMatch")]
    rrsp_employer_match: Option<f64>,
    rrsp_carry_forward: Option<f64>,

    #[serde(alias = "respContributions")]
    resp_current_year_contributions: Option<f64>,
    resp_lifetime_contributions: Option<f64>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "registered_savings",
    about = "Splits a lump sum across TFSA, FHSA, RRSP and RESP and reports the 2025 tax impact"
)]
struct Cli {
    #[arg(
        long,
        default_value = "",
        help = "Province or territory code, e.g. ON; unknown codes produce an empty plan"
    )]
    province: String,
    #[arg(long, default_value_t = 0.0, help = "Current-year employment income")]
    income: f64,
    #[arg(long, default_value_t = 0.0, help = "Savings available to contribute")]
    lump_sum: f64,
    #[arg(long, help = "Eligible for the First Home Savings Account")]
    first_time_buyer: bool,
    #[arg(long, default_value_t = 18)]
    age: i64,
    #[arg(long, help = "Prior-year earned income for RRSP room; defaults to --income")]
    prior_year_income: Option<f64>,
    #[arg(long, default_value_t = 0, help = "Number of RESP beneficiaries")]
    num_beneficiaries: i64,
    #[arg(long, default_value_t = 0.0, help = "All TFSA contributions ever made")]
    tfsa_total_contributions: f64,
    #[arg(long, default_value_t = 0.0)]
    fhsa_current_year_contributions: f64,
    #[arg(long, default_value_t = 0.0)]
    fhsa_lifetime_contributions: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Unused FHSA room from previous years; at most 8000 carries forward"
    )]
    fhsa_unused_room: f64,
    #[arg(long, default_value_t = 0.0)]
    rrsp_current_year_contributions: f64,
    #[arg(long, default_value_t = 0.0, help = "Employer-matched RRSP contributions this year")]
    rrsp_employer_match: f64,
    #[arg(long, default_value_t = 0.0, help = "Unused RRSP room carried forward")]
    rrsp_carry_forward: f64,
    #[arg(long, default_value_t = 0.0)]
    resp_current_year_contributions: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "All RESP contributions ever made, including this year"
    )]
    resp_lifetime_contributions: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ProvinceEntry {
    code: &'static str,
    name: &'static str,
}

fn build_profile(cli: Cli) -> Result<UserFinancialProfile, String> {
    for (name, value) in [("--income", cli.income), ("--lump-sum", cli.lump_sum)] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }

    if let Some(prior) = cli.prior_year_income {
        if !prior.is_finite() || prior < 0.0 {
            return Err("--prior-year-income must be >= 0".to_string());
        }
    }

    for (name, value) in [
        ("--tfsa-total-contributions", cli.tfsa_total_contributions),
        (
            "--fhsa-current-year-contributions",
            cli.fhsa_current_year_contributions,
        ),
        ("--fhsa-lifetime-contributions", cli.fhsa_lifetime_contributions),
        ("--fhsa-unused-room", cli.fhsa_unused_room),
        (
            "--rrsp-current-year-contributions",
            cli.rrsp_current_year_contributions,
        ),
        ("--rrsp-employer-match", cli.rrsp_employer_match),
        ("--rrsp-carry-forward", cli.rrsp_carry_forward),
        (
            "--resp-current-year-contributions",
            cli.resp_current_year_contributions,
        ),
        ("--resp-lifetime-contributions", cli.resp_lifetime_contributions),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if cli.fhsa_current_year_contributions > cli.fhsa_lifetime_contributions {
        return Err(
            "--fhsa-current-year-contributions cannot exceed --fhsa-lifetime-contributions"
                .to_string(),
        );
    }

    if cli.resp_current_year_contributions > cli.resp_lifetime_contributions {
        return Err(
            "--resp-current-year-contributions cannot exceed --resp-lifetime-contributions"
                .to_string(),
        );
    }

    let province = Province::from_code(&cli.province);
    if province.is_none() && !cli.province.trim().is_empty() {
        warn!(code = %cli.province, "unrecognized province code; tax and allocation fall back to zero");
    }

    Ok(UserFinancialProfile {
        age: clamp_count(cli.age),
        province,
        income: cli.income,
        prior_year_income: cli.prior_year_income.unwrap_or(cli.income.max(0.0)),
        lump_sum: cli.lump_sum,
        is_first_time_buyer: cli.first_time_buyer,
        num_beneficiaries: clamp_count(cli.num_beneficiaries),
        tfsa_total_contributions: cli.tfsa_total_contributions,
        fhsa_current_year_contributions: cli.fhsa_current_year_contributions,
        fhsa_lifetime_contributions: cli.fhsa_lifetime_contributions,
        fhsa_unused_room: cli.fhsa_unused_room,
        rrsp_current_year_contributions: cli.rrsp_current_year_contributions,
        rrsp_employer_match: cli.rrsp_employer_match,
        rrsp_carry_forward: cli.rrsp_carry_forward,
        resp_current_year_contributions: cli.resp_current_year_contributions,
        resp_lifetime_contributions: cli.resp_lifetime_contributions,
    })
}

/// Negative ages and counts are treated as zero rather than rejected.
fn clamp_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Parses command-line flags and renders one plan as pretty JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let profile = build_profile(cli)?;
    let report = run_plan(&profile);
    serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to render plan: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/provinces", get(provinces_handler))
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "registered savings API listening");
    info!("Local access: http://127.0.0.1:{port}/api/plan");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn provinces_handler() -> Response {
    let provinces: Vec<ProvinceEntry> = Province::ALL
        .into_iter()
        .map(|p| ProvinceEntry {
            code: p.code(),
            name: p.name(),
        })
        .collect();
    json_response(StatusCode::OK, provinces)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_handler_impl(payload: PlanPayload) -> Response {
    let profile = match profile_from_payload(payload) {
        Ok(profile) => profile,
        Err(msg) => {
            warn!(error = %msg, "rejected plan request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    let report: PlanReport = run_plan(&profile);
    json_response(StatusCode::OK, report)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn profile_from_json(json: &str) -> Result<UserFinancialProfile, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    profile_from_payload(payload)
}

fn profile_from_payload(payload: PlanPayload) -> Result<UserFinancialProfile, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.province {
        cli.province = v;
    }
    if let Some(v) = payload.income {
        cli.income = v;
    }
    if let Some(v) = payload.lump_sum {
        cli.lump_sum = v;
    }
    if let Some(v) = payload.first_time_buyer {
        cli.first_time_buyer = v;
    }
    if let Some(v) = payload.age {
        cli.age = v;
    }
    if payload.prior_year_income.is_some() {
        cli.prior_year_income = payload.prior_year_income;
    }
    if let Some(v) = payload.num_beneficiaries {
        cli.num_beneficiaries = v;
    }

    if let Some(v) = payload.tfsa_total_contributions {
        cli.tfsa_total_contributions = v;
    }

    if let Some(v) = payload.fhsa_current_year_contributions {
        cli.fhsa_current_year_contributions = v;
    }
    if let Some(v) = payload.fhsa_lifetime_contributions {
        cli.fhsa_lifetime_contributions = v;
    }
    if let Some(v) = payload.fhsa_unused_room {
        cli.fhsa_unused_room = v;
    }

    if let Some(v) = payload.rrsp_current_year_contributions {
        cli.rrsp_current_year_contributions = v;
    }
    if let Some(v) = payload.rrsp_employer_match {
        cli.rrsp_employer_match = v;
    }
    if let Some(v) = payload.rrsp_carry_forward {
        cli.rrsp_carry_forward = v;
    }

    if let Some(v) = payload.resp_current_year_contributions {
        cli.resp_current_year_contributions = v;
    }
    if let Some(v) = payload.resp_lifetime_contributions {
        cli.resp_lifetime_contributions = v;
    }

    build_profile(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        province: String::new(),
        income: 0.0,
        lump_sum: 0.0,
        first_time_buyer: false,
        age: 18,
        prior_year_income: None,
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
