use thiserror::Error;

use crate::core::{FireProfile, HORIZON_AGE};

#[derive(Debug, Error, PartialEq)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Rejects profiles the projection engine is not meant to see.
pub fn validate_profile(profile: &FireProfile) -> Result<(), ValidationError> {
    if profile.current_age > HORIZON_AGE {
        return Err(ValidationError::new(format!(
            "currentAge must be <= {HORIZON_AGE}"
        )));
    }

    for (name, amount) in [
        ("currentSavings", Some(profile.current_savings)),
        ("monthlyContribution", Some(profile.monthly_contribution)),
        ("monthlyExpenses", Some(profile.monthly_expenses)),
        ("fireNumber", profile.fire_number),
    ] {
        if let Some(amount) = amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ValidationError::new(format!("{name} must be >= 0")));
            }
        }
    }

    for (name, rate) in [
        ("expectedReturnRate", Some(profile.expected_return_rate)),
        ("inflationRate", Some(profile.inflation_rate)),
        (
            "annualContributionIncreaseRate",
            profile.annual_contribution_increase_rate,
        ),
    ] {
        if let Some(rate) = rate {
            if !rate.is_finite() || rate <= -1.0 || rate > 1.0 {
                return Err(ValidationError::new(format!(
                    "{name} must be a fraction in (-1, 1]"
                )));
            }
        }
    }

    if !(0.0..=1.0).contains(&profile.safe_withdrawal_rate) {
        return Err(ValidationError::new(
            "safeWithdrawalRate must be between 0 and 1",
        ));
    }

    if let Some(target) = profile.target_retirement_age {
        if target < profile.current_age {
            return Err(ValidationError::new(
                "targetRetirementAge must be >= currentAge",
            ));
        }
    }

    Ok(())
}
