use chrono::Datelike;
use clap::{Args, Parser, Subcommand};

use crate::api::validate_profile;
use crate::config::{DEFAULT_LOG_FILTER, START_YEAR_RANGE, ServerConfig};
use crate::core::{ContributionSolveConfig, FireProfile, simulate, solve_required_contribution};

#[derive(Parser, Debug)]
#[command(
    name = "fire-projection",
    about = "Deterministic FIRE projection engine (HTTP API + one-shot CLI)"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "FIRE_LOG",
        default_value = DEFAULT_LOG_FILTER,
        help = "tracing filter used when RUST_LOG is unset"
    )]
    pub log_filter: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the projection API over HTTP.
    Serve(ServerConfig),
    /// Print the year-by-year projection for a profile as JSON.
    Project(ProfileArgs),
    /// Print the monthly contribution needed to reach FIRE by --target-retirement-age.
    Solve(ProfileArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long)]
    current_age: u32,
    #[arg(long, default_value_t = 0.0)]
    current_savings: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_contribution: f64,
    #[arg(long)]
    monthly_expenses: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual return in percent, e.g. 7"
    )]
    expected_return: f64,
    #[arg(long, default_value_t = 2.5, help = "Annual inflation in percent")]
    inflation: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Safe withdrawal rate in percent, e.g. 4"
    )]
    safe_withdrawal_rate: f64,
    #[arg(long)]
    target_retirement_age: Option<u32>,
    #[arg(long, help = "Target corpus; derived from expenses when omitted")]
    fire_number: Option<f64>,
    #[arg(
        long,
        help = "Year-over-year growth of the monthly contribution in percent (e.g. pay rises)"
    )]
    contribution_increase: Option<f64>,
    #[arg(
        long,
        value_parser = clap::value_parser!(i32).range(START_YEAR_RANGE),
        help = "Calendar year of the first row; defaults to the current year"
    )]
    start_year: Option<i32>,
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

impl ProfileArgs {
    fn start_year(&self) -> i32 {
        self.start_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }
}

pub fn build_profile(args: &ProfileArgs) -> Result<FireProfile, String> {
    let profile = FireProfile {
        current_age: args.current_age,
        current_savings: args.current_savings,
        monthly_contribution: args.monthly_contribution,
        monthly_expenses: args.monthly_expenses,
        expected_return_rate: args.expected_return / 100.0,
        inflation_rate: args.inflation / 100.0,
        safe_withdrawal_rate: args.safe_withdrawal_rate / 100.0,
        target_retirement_age: args.target_retirement_age,
        fire_number: args.fire_number,
        annual_contribution_increase_rate: args.contribution_increase.map(|rate| rate / 100.0),
    };
    validate_profile(&profile).map_err(|e| e.to_string())?;
    Ok(profile)
}

pub fn run_project(args: &ProfileArgs) -> Result<String, String> {
    let profile = build_profile(args)?;
    let projection = simulate(&profile, args.start_year());
    to_json(&projection, args.pretty)
}

pub fn run_solve(args: &ProfileArgs) -> Result<String, String> {
    let profile = build_profile(args)?;
    let Some(target_age) = profile.target_retirement_age else {
        return Err("--target-retirement-age is required for solve".to_string());
    };
    let result = solve_required_contribution(
        &profile,
        ContributionSolveConfig::for_target_age(target_age),
        args.start_year(),
    )
    .map_err(|e| e.to_string())?;
    to_json(&result, args.pretty)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(|e| format!("failed to serialize output: {e}"))
}
