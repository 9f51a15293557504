use serde::{Deserialize, Serialize};

/// A saver's financial profile. Rates are plain fractions (0.07 = 7%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireProfile {
    pub current_age: u32,
    pub current_savings: f64,
    pub monthly_contribution: f64,
    pub monthly_expenses: f64,
    pub expected_return_rate: f64,
    pub inflation_rate: f64,
    pub safe_withdrawal_rate: f64,
    #[serde(default)]
    pub target_retirement_age: Option<u32>,
    /// Target corpus. Absent or zero means "derive from expenses".
    #[serde(default)]
    pub fire_number: Option<f64>,
    #[serde(default)]
    pub annual_contribution_increase_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyProjection {
    pub age: u32,
    pub year: i32,
    pub total_savings: f64,
    pub total_contributions: f64,
    pub total_growth: f64,
    /// Inflation-adjusted target for this year; `None` when unreachable.
    pub fire_number: Option<f64>,
    pub annual_contribution: f64,
    pub fire_milestone: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireProjection {
    pub current_age: u32,
    pub fire_age: Option<u32>,
    pub years_to_fire: Option<u32>,
    pub fire_number: Option<f64>,
    pub current_savings: f64,
    pub projected_savings_at_fire: Option<f64>,
    pub yearly_projections: Vec<YearlyProjection>,
    pub fire_achievable: bool,
}

impl FireProjection {
    /// The year FIRE is first reached, if any.
    pub fn milestone(&self) -> Option<&YearlyProjection> {
        self.yearly_projections.iter().find(|y| y.fire_milestone)
    }
}
