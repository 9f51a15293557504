mod engine;
mod solver;
mod types;

pub use engine::{FireTarget, HORIZON_AGE, resolve_fire_target, simulate};
pub use solver::{
    ContributionSolveConfig, ContributionSolveIteration, ContributionSolveResult, SolveError,
    solve_required_contribution,
};
pub use types::{FireProfile, FireProjection, YearlyProjection};
