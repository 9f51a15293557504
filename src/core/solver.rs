use serde::Serialize;
use thiserror::Error;

use super::{FireProfile, simulate};

#[derive(Debug, Clone, Copy)]
pub struct ContributionSolveConfig {
    pub target_fire_age: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl ContributionSolveConfig {
    pub fn for_target_age(target_fire_age: u32) -> Self {
        Self {
            target_fire_age,
            search_min: 0.0,
            search_max: 1_000_000.0,
            tolerance: 0.01,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_monthly_contribution: f64,
    pub fire_age: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSolveResult {
    pub target_fire_age: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub solved_monthly_contribution: Option<f64>,
    pub achieved_fire_age: Option<u32>,
    pub iterations: Vec<ContributionSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
    #[error("targetRetirementAge must be >= currentAge")]
    TargetBeforeCurrentAge,
    #[error("search bounds must be finite and >= 0")]
    InvalidBounds,
    #[error("searchMax must be greater than searchMin")]
    EmptyRange,
    #[error("tolerance must be > 0")]
    InvalidTolerance,
    #[error("maxIterations must be > 0")]
    NoIterations,
}

/// Finds the smallest monthly contribution that reaches FIRE no later than
/// `config.target_fire_age`.
///
/// Corpus is increasing in the contribution for any return above -100%, so the
/// "reached in time" predicate is monotone and bisection applies.
pub fn solve_required_contribution(
    profile: &FireProfile,
    config: ContributionSolveConfig,
    start_year: i32,
) -> Result<ContributionSolveResult, SolveError> {
    validate_config(profile, config)?;

    let low_eval = evaluate_candidate(profile, config, config.search_min, start_year);
    let high_eval = evaluate_candidate(profile, config, config.search_max, start_year);

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let mut solved_monthly_contribution = None;
    let mut converged = false;
    let feasible;
    let message;

    if low_eval.on_time {
        solved_monthly_contribution = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already reaches FIRE by the target age at the lower bound.".to_string();
    } else if !high_eval.on_time {
        feasible = false;
        message = "No contribution within the search bounds reaches FIRE by the target age."
            .to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let eval = evaluate_candidate(profile, config, mid, start_year);
            iterations.push(ContributionSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_monthly_contribution: mid,
                fire_age: eval.fire_age,
            });

            if eval.on_time {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_monthly_contribution = Some(hi);
        feasible = true;
        message = if converged {
            "Solved required monthly contribution.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        };
    }

    let achieved_fire_age = solved_monthly_contribution
        .and_then(|value| evaluate_candidate(profile, config, value, start_year).fire_age);

    Ok(ContributionSolveResult {
        target_fire_age: config.target_fire_age,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        solved_monthly_contribution,
        achieved_fire_age,
        iterations,
        converged,
        feasible,
        message,
    })
}

#[derive(Debug, Clone, Copy)]
struct CandidateEval {
    fire_age: Option<u32>,
    on_time: bool,
}

fn evaluate_candidate(
    base_profile: &FireProfile,
    config: ContributionSolveConfig,
    monthly_contribution: f64,
    start_year: i32,
) -> CandidateEval {
    let mut profile = base_profile.clone();
    profile.monthly_contribution = monthly_contribution.max(0.0);

    let fire_age = simulate(&profile, start_year).fire_age;
    CandidateEval {
        fire_age,
        on_time: fire_age.is_some_and(|age| age <= config.target_fire_age),
    }
}

fn validate_config(profile: &FireProfile, config: ContributionSolveConfig) -> Result<(), SolveError> {
    if config.target_fire_age < profile.current_age {
        return Err(SolveError::TargetBeforeCurrentAge);
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() || config.search_min < 0.0
    {
        return Err(SolveError::InvalidBounds);
    }
    if config.search_max <= config.search_min {
        return Err(SolveError::EmptyRange);
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::InvalidTolerance);
    }
    if config.max_iterations == 0 {
        return Err(SolveError::NoIterations);
    }
    Ok(())
}
