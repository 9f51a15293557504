use super::types::{FireProfile, FireProjection, YearlyProjection};

/// Last simulated age. The series never extends past it.
pub const HORIZON_AGE: u32 = 100;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Year-0 target corpus, resolved once before the simulation starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireTarget {
    Corpus(f64),
    /// No finite corpus can be derived (non-positive withdrawal rate).
    Unreachable,
}

impl FireTarget {
    pub fn amount(self) -> Option<f64> {
        match self {
            FireTarget::Corpus(amount) => Some(amount),
            FireTarget::Unreachable => None,
        }
    }

    fn is_met_by(self, corpus: f64) -> bool {
        match self {
            FireTarget::Corpus(amount) => corpus >= amount,
            FireTarget::Unreachable => false,
        }
    }

    fn inflate(self, inflation_rate: f64) -> Self {
        match self {
            FireTarget::Corpus(amount) => {
                let next = amount * (1.0 + inflation_rate);
                if next.is_finite() {
                    FireTarget::Corpus(next)
                } else {
                    FireTarget::Unreachable
                }
            }
            FireTarget::Unreachable => FireTarget::Unreachable,
        }
    }
}

/// An explicit positive `fire_number` wins; otherwise the target is annual
/// expenses divided by the safe withdrawal rate.
pub fn resolve_fire_target(profile: &FireProfile) -> FireTarget {
    if let Some(amount) = profile.fire_number.filter(|n| *n > 0.0) {
        return FireTarget::Corpus(amount);
    }

    if profile.safe_withdrawal_rate.is_nan() || profile.safe_withdrawal_rate <= 0.0 {
        return FireTarget::Unreachable;
    }

    let annual_expenses = profile.monthly_expenses * MONTHS_PER_YEAR;
    let derived = annual_expenses / profile.safe_withdrawal_rate;
    if derived.is_finite() {
        FireTarget::Corpus(derived)
    } else {
        FireTarget::Unreachable
    }
}

#[derive(Debug)]
struct SimulationState {
    age: u32,
    year: i32,
    corpus: f64,
    cumulative_contributions: f64,
    cumulative_growth: f64,
    annual_contribution: f64,
    target: FireTarget,
}

impl SimulationState {
    fn new(profile: &FireProfile, target: FireTarget, start_year: i32) -> Self {
        Self {
            age: profile.current_age,
            year: start_year,
            corpus: profile.current_savings,
            cumulative_contributions: 0.0,
            cumulative_growth: 0.0,
            annual_contribution: profile.monthly_contribution * MONTHS_PER_YEAR,
            target,
        }
    }

    fn snapshot(&self, fire_milestone: bool) -> YearlyProjection {
        YearlyProjection {
            age: self.age,
            year: self.year,
            total_savings: self.corpus,
            total_contributions: self.cumulative_contributions,
            total_growth: self.cumulative_growth,
            fire_number: self.target.amount(),
            annual_contribution: self.annual_contribution,
            fire_milestone,
        }
    }

    // End-of-year contribution timing: growth is measured on the opening balance.
    fn advance(&mut self, profile: &FireProfile) {
        let growth = self.corpus * profile.expected_return_rate;
        self.corpus += growth + self.annual_contribution;
        self.cumulative_contributions += self.annual_contribution;
        self.cumulative_growth += growth;
        self.target = self.target.inflate(profile.inflation_rate);
        if let Some(rate) = profile.annual_contribution_increase_rate {
            self.annual_contribution *= 1.0 + rate;
        }
        self.age += 1;
        self.year = self.year.saturating_add(1);
    }
}

/// Simulates the profile year by year from `current_age` to [`HORIZON_AGE`].
///
/// Row 0 is the profile's initial state, dated `start_year`. The simulation
/// keeps running after the first crossing so the series always covers the
/// full horizon; only that first crossing carries `fire_milestone`.
pub fn simulate(profile: &FireProfile, start_year: i32) -> FireProjection {
    let target = resolve_fire_target(profile);
    let last_age = HORIZON_AGE.max(profile.current_age);
    let year_count = (last_age - profile.current_age + 1) as usize;

    let mut state = SimulationState::new(profile, target, start_year);
    let mut yearly_projections = Vec::with_capacity(year_count);
    let mut reached = false;

    loop {
        let milestone = !reached && state.target.is_met_by(state.corpus);
        reached |= milestone;
        yearly_projections.push(state.snapshot(milestone));

        if state.age >= last_age {
            break;
        }
        state.advance(profile);
    }

    build_projection(profile, target, yearly_projections)
}

fn build_projection(
    profile: &FireProfile,
    target: FireTarget,
    yearly_projections: Vec<YearlyProjection>,
) -> FireProjection {
    let mut projection = FireProjection {
        current_age: profile.current_age,
        fire_age: None,
        years_to_fire: None,
        fire_number: target.amount(),
        current_savings: profile.current_savings,
        projected_savings_at_fire: None,
        yearly_projections,
        fire_achievable: false,
    };

    if let Some((age, savings)) = projection.milestone().map(|y| (y.age, y.total_savings)) {
        projection.fire_age = Some(age);
        projection.years_to_fire = Some(age - profile.current_age);
        projection.projected_savings_at_fire = Some(savings);
        projection.fire_achievable = true;
    }
    projection
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;
    const START_YEAR: i32 = 2025;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_rel(actual: f64, expected: f64, rel: f64) {
        let tol = rel * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_profile() -> FireProfile {
        FireProfile {
            current_age: 30,
            current_savings: 25_000.0,
            monthly_contribution: 600.0,
            monthly_expenses: 1_500.0,
            expected_return_rate: 0.07,
            inflation_rate: 0.025,
            safe_withdrawal_rate: 0.04,
            target_retirement_age: None,
            fire_number: Some(450_000.0),
            annual_contribution_increase_rate: None,
        }
    }

    #[test]
    fn first_row_reflects_initial_state() {
        let projection = simulate(&sample_profile(), START_YEAR);
        let first = &projection.yearly_projections[0];

        assert_eq!(first.age, 30);
        assert_eq!(first.year, START_YEAR);
        assert_approx(first.total_savings, 25_000.0);
        assert_approx(first.total_contributions, 0.0);
        assert_approx(first.total_growth, 0.0);
        assert_eq!(first.fire_number, Some(450_000.0));
        assert_approx(first.annual_contribution, 7_200.0);
        assert!(!first.fire_milestone);
    }

    #[test]
    fn second_row_applies_growth_then_contribution() {
        let projection = simulate(&sample_profile(), START_YEAR);
        let second = &projection.yearly_projections[1];

        assert_eq!(second.age, 31);
        assert_eq!(second.year, START_YEAR + 1);
        assert_approx(second.total_savings, 25_000.0 * 1.07 + 7_200.0);
        assert_approx(second.total_contributions, 7_200.0);
        assert_approx(second.total_growth, 1_750.0);
        assert_approx(second.fire_number.unwrap_or_default(), 450_000.0 * 1.025);
    }

    #[test]
    fn reference_scenario_reaches_fire_at_62() {
        let projection = simulate(&sample_profile(), START_YEAR);

        assert!(projection.fire_achievable);
        assert_eq!(projection.fire_age, Some(62));
        assert_eq!(projection.years_to_fire, Some(32));
        assert_eq!(projection.fire_number, Some(450_000.0));
        assert_approx_rel(
            projection.projected_savings_at_fire.unwrap_or_default(),
            1_011_452.480_645_380_8,
            1e-9,
        );
        assert_eq!(projection.yearly_projections.len(), 71);
    }

    #[test]
    fn simulation_continues_past_milestone_to_horizon() {
        let projection = simulate(&sample_profile(), START_YEAR);
        let last = projection.yearly_projections.last().expect("non-empty series");

        assert_eq!(last.age, HORIZON_AGE);
        assert_eq!(last.year, START_YEAR + 70);
        assert_eq!(
            projection
                .yearly_projections
                .iter()
                .filter(|y| y.fire_milestone)
                .count(),
            1
        );
    }

    #[test]
    fn contribution_escalation_brings_fire_forward() {
        let mut profile = sample_profile();
        profile.annual_contribution_increase_rate = Some(0.03);
        let projection = simulate(&profile, START_YEAR);

        assert_eq!(projection.fire_age, Some(58));
        assert_approx(
            projection.yearly_projections[2].annual_contribution,
            7_200.0 * 1.03 * 1.03,
        );
    }

    #[test]
    fn derives_fire_number_from_expenses_when_unset() {
        let mut profile = sample_profile();
        profile.fire_number = None;
        profile.monthly_expenses = 1_000.0;
        profile.safe_withdrawal_rate = 0.04;

        assert_eq!(resolve_fire_target(&profile), FireTarget::Corpus(300_000.0));
        let projection = simulate(&profile, START_YEAR);
        assert_eq!(projection.fire_number, Some(300_000.0));
    }

    #[test]
    fn zero_fire_number_is_treated_as_unset() {
        let mut profile = sample_profile();
        profile.fire_number = Some(0.0);
        profile.monthly_expenses = 1_000.0;

        assert_eq!(resolve_fire_target(&profile), FireTarget::Corpus(300_000.0));
    }

    #[test]
    fn explicit_fire_number_is_used_even_with_zero_withdrawal_rate() {
        let mut profile = sample_profile();
        profile.safe_withdrawal_rate = 0.0;

        assert_eq!(resolve_fire_target(&profile), FireTarget::Corpus(450_000.0));
    }

    #[test]
    fn zero_withdrawal_rate_without_fire_number_is_unreachable() {
        let mut profile = sample_profile();
        profile.fire_number = None;
        profile.safe_withdrawal_rate = 0.0;

        let projection = simulate(&profile, START_YEAR);

        assert_eq!(resolve_fire_target(&profile), FireTarget::Unreachable);
        assert!(!projection.fire_achievable);
        assert_eq!(projection.fire_age, None);
        assert_eq!(projection.years_to_fire, None);
        assert_eq!(projection.projected_savings_at_fire, None);
        assert_eq!(projection.fire_number, None);
        assert_eq!(projection.yearly_projections.len(), 71);
        assert!(
            projection
                .yearly_projections
                .iter()
                .all(|y| y.fire_number.is_none() && !y.fire_milestone)
        );
    }

    #[test]
    fn no_savings_no_growth_never_reaches_fire() {
        let mut profile = sample_profile();
        profile.current_savings = 0.0;
        profile.monthly_contribution = 0.0;
        profile.expected_return_rate = 0.0;
        profile.fire_number = Some(1.0);

        let projection = simulate(&profile, START_YEAR);

        assert!(!projection.fire_achievable);
        assert_eq!(projection.fire_age, None);
        assert_eq!(projection.projected_savings_at_fire, None);
        assert!(
            projection
                .yearly_projections
                .iter()
                .all(|y| y.total_savings == 0.0)
        );
    }

    #[test]
    fn flat_savings_reach_target_after_exact_number_of_years() {
        let profile = FireProfile {
            current_age: 30,
            current_savings: 0.0,
            monthly_contribution: 1_000.0,
            monthly_expenses: 1_000.0,
            expected_return_rate: 0.0,
            inflation_rate: 0.0,
            safe_withdrawal_rate: 0.04,
            target_retirement_age: None,
            fire_number: None,
            annual_contribution_increase_rate: None,
        };

        let projection = simulate(&profile, START_YEAR);

        assert_eq!(projection.fire_age, Some(55));
        assert_eq!(projection.years_to_fire, Some(25));
        assert_approx(projection.projected_savings_at_fire.unwrap_or_default(), 300_000.0);
    }

    #[test]
    fn zero_expenses_reach_fire_immediately() {
        let mut profile = sample_profile();
        profile.fire_number = None;
        profile.monthly_expenses = 0.0;

        let projection = simulate(&profile, START_YEAR);

        assert_eq!(projection.fire_age, Some(30));
        assert_eq!(projection.years_to_fire, Some(0));
        assert!(projection.yearly_projections[0].fire_milestone);
    }

    #[test]
    fn age_at_horizon_yields_single_row() {
        let mut profile = sample_profile();
        profile.current_age = HORIZON_AGE;
        assert_eq!(simulate(&profile, START_YEAR).yearly_projections.len(), 1);

        profile.current_age = HORIZON_AGE + 5;
        let projection = simulate(&profile, START_YEAR);
        assert_eq!(projection.yearly_projections.len(), 1);
        assert_eq!(projection.yearly_projections[0].age, HORIZON_AGE + 5);
    }

    #[test]
    fn start_year_near_max_saturates_instead_of_overflowing() {
        let projection = simulate(&sample_profile(), i32::MAX - 10);
        let years: Vec<i32> = projection.yearly_projections.iter().map(|y| y.year).collect();

        assert_eq!(years.len(), 71);
        assert_eq!(years[0], i32::MAX - 10);
        assert_eq!(years[10], i32::MAX);
        assert_eq!(years.last().copied(), Some(i32::MAX));
    }

    #[test]
    fn projection_serializes_with_wire_field_names() {
        let mut profile = sample_profile();
        profile.fire_number = None;
        profile.safe_withdrawal_rate = 0.0;
        let json = serde_json::to_string(&simulate(&profile, START_YEAR))
            .expect("projection should serialize");

        assert!(json.contains("\"fireAge\":null"));
        assert!(json.contains("\"yearsToFire\":null"));
        assert!(json.contains("\"projectedSavingsAtFire\":null"));
        assert!(json.contains("\"fireAchievable\":false"));
        assert!(json.contains("\"yearlyProjections\""));
        assert!(json.contains("\"totalSavings\""));
        assert!(json.contains("\"fireMilestone\""));
        assert!(!json.contains("Infinity"));
        assert!(!json.contains("NaN"));
    }

    #[test]
    fn profile_deserializes_from_wire_field_names() {
        let json = r#"{
          "currentAge": 30,
          "currentSavings": 25000,
          "monthlyContribution": 600,
          "monthlyExpenses": 1500,
          "expectedReturnRate": 0.07,
          "inflationRate": 0.025,
          "safeWithdrawalRate": 0.04,
          "targetRetirementAge": 55,
          "fireNumber": 450000,
          "annualContributionIncreaseRate": null
        }"#;
        let profile: FireProfile = serde_json::from_str(json).expect("profile should parse");

        assert_eq!(profile, {
            let mut expected = sample_profile();
            expected.target_retirement_age = Some(55);
            expected
        });
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_series_spans_current_age_to_horizon(
            current_age in 0u32..=100,
            savings in 0u32..2_000_000,
            monthly in 0u32..20_000,
            expenses in 0u32..20_000,
            return_bp in -500i32..1500,
            inflation_bp in -200i32..800,
            swr_bp in 0u32..1000,
        ) {
            let profile = FireProfile {
                current_age,
                current_savings: savings as f64,
                monthly_contribution: monthly as f64,
                monthly_expenses: expenses as f64,
                expected_return_rate: return_bp as f64 / 10_000.0,
                inflation_rate: inflation_bp as f64 / 10_000.0,
                safe_withdrawal_rate: swr_bp as f64 / 10_000.0,
                target_retirement_age: None,
                fire_number: None,
                annual_contribution_increase_rate: None,
            };
            let projection = simulate(&profile, START_YEAR);

            prop_assert_eq!(
                projection.yearly_projections.len(),
                (HORIZON_AGE - current_age + 1) as usize
            );
            for (offset, row) in projection.yearly_projections.iter().enumerate() {
                prop_assert_eq!(row.age, current_age + offset as u32);
                prop_assert_eq!(row.year, START_YEAR + offset as i32);
            }
        }

        #[test]
        fn prop_corpus_is_non_decreasing_with_non_negative_inputs(
            current_age in 0u32..=100,
            savings in 0u32..2_000_000,
            monthly in 0u32..20_000,
            return_bp in 0i32..1500,
            increase_bp in proptest::option::of(-500i32..1000),
        ) {
            let mut profile = sample_profile();
            profile.current_age = current_age;
            profile.current_savings = savings as f64;
            profile.monthly_contribution = monthly as f64;
            profile.expected_return_rate = return_bp as f64 / 10_000.0;
            profile.annual_contribution_increase_rate = increase_bp.map(|bp| bp as f64 / 10_000.0);

            let projection = simulate(&profile, START_YEAR);
            for pair in projection.yearly_projections.windows(2) {
                prop_assert!(pair[1].total_savings >= pair[0].total_savings);
            }
        }

        #[test]
        fn prop_milestone_is_first_crossing_and_matches_summary(
            current_age in 0u32..=100,
            savings in 0u32..2_000_000,
            monthly in 0u32..20_000,
            return_bp in -500i32..1500,
            inflation_bp in 0i32..800,
            fire_number in 1u32..5_000_000,
        ) {
            let mut profile = sample_profile();
            profile.current_age = current_age;
            profile.current_savings = savings as f64;
            profile.monthly_contribution = monthly as f64;
            profile.expected_return_rate = return_bp as f64 / 10_000.0;
            profile.inflation_rate = inflation_bp as f64 / 10_000.0;
            profile.fire_number = Some(fire_number as f64);

            let projection = simulate(&profile, START_YEAR);
            let milestones = projection
                .yearly_projections
                .iter()
                .filter(|y| y.fire_milestone)
                .count();
            prop_assert!(milestones <= 1);
            prop_assert_eq!(projection.fire_achievable, milestones == 1);

            match projection.milestone() {
                Some(row) => {
                    prop_assert_eq!(projection.fire_age, Some(row.age));
                    prop_assert_eq!(projection.years_to_fire, Some(row.age - current_age));
                    prop_assert_eq!(projection.projected_savings_at_fire, Some(row.total_savings));
                    for earlier in projection.yearly_projections.iter().take_while(|y| y.age < row.age) {
                        let target = earlier.fire_number.unwrap_or(f64::INFINITY);
                        prop_assert!(earlier.total_savings < target);
                    }
                }
                None => {
                    prop_assert_eq!(projection.fire_age, None);
                    prop_assert_eq!(projection.years_to_fire, None);
                    prop_assert_eq!(projection.projected_savings_at_fire, None);
                }
            }
        }

        #[test]
        fn prop_savings_decompose_into_principal_contributions_and_growth(
            savings in 0u32..2_000_000,
            monthly in 0u32..20_000,
            return_bp in -500i32..1500,
            increase_bp in proptest::option::of(0i32..800),
        ) {
            let mut profile = sample_profile();
            profile.current_savings = savings as f64;
            profile.monthly_contribution = monthly as f64;
            profile.expected_return_rate = return_bp as f64 / 10_000.0;
            profile.annual_contribution_increase_rate = increase_bp.map(|bp| bp as f64 / 10_000.0);

            let projection = simulate(&profile, START_YEAR);
            for row in &projection.yearly_projections {
                let recomposed = profile.current_savings + row.total_contributions + row.total_growth;
                let tol = 1e-9 * row.total_savings.abs().max(1.0);
                prop_assert!((recomposed - row.total_savings).abs() <= tol);
            }
        }

        #[test]
        fn prop_simulation_is_deterministic(
            current_age in 0u32..=100,
            savings in 0u32..2_000_000,
            monthly in 0u32..20_000,
            return_bp in -500i32..1500,
        ) {
            let mut profile = sample_profile();
            profile.current_age = current_age;
            profile.current_savings = savings as f64;
            profile.monthly_contribution = monthly as f64;
            profile.expected_return_rate = return_bp as f64 / 10_000.0;

            let first = serde_json::to_string(&simulate(&profile, START_YEAR)).expect("serialize");
            let second = serde_json::to_string(&simulate(&profile, START_YEAR)).expect("serialize");
            prop_assert_eq!(first, second);
        }
    }
}
