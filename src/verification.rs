//! Sanity checks of the continuous model.
//!
//! 1. The rates of change sum to zero (total population is conserved).
//! 2. With no transmission (`beta = 0`) nobody new gets infected.
//! 3. With no recovery (`gamma = 0`) nobody recovers and infections only accumulate.
//! 4. With nobody initially infected no epidemic can start.
//!
//! A failure of the first check means the rate equations themselves are broken, so it is an
//! assertion rather than an error. The other three produce trajectories that are handed to the
//! renderer; [`VerificationScenario::expected_behaviour_holds`] tells whether each trajectory has
//! the expected shape.
use log::{info, warn};

use crate::continuous::{solve_differential_equations, Trajectory};
use crate::error::SirError;
use crate::model::{
    calculate_beta, evaluate_derivative_with_diagnostics, DerivativeDiagnostics, PopulationState,
};
use crate::numeric::{is_non_decreasing, is_non_increasing};
use crate::parameters::ContinuousParameters;

/// Relative to the population size, the slack allowed for solver error in shape checks.
pub const SHAPE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationKind {
    ZeroInfectionRate,
    ZeroRecoveryRate,
    ZeroInitialInfection,
}

/// A trajectory produced under degenerate parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationScenario {
    pub kind: VerificationKind,
    pub title: String,
    pub beta: f64,
    pub gamma: f64,
    pub initial: PopulationState,
    pub trajectory: Trajectory,
}

impl VerificationScenario {
    /// Checks the trajectory against the behaviour expected for this scenario.
    #[must_use]
    pub fn expected_behaviour_holds(&self, population: f64) -> bool {
        let tolerance = population * SHAPE_TOLERANCE;
        let states = &self.trajectory.states;
        match self.kind {
            VerificationKind::ZeroInfectionRate => {
                let still_sick = self.initial.infected + self.initial.recovered;
                states
                    .iter()
                    .all(|s| s.susceptible == self.initial.susceptible)
                    && states
                        .iter()
                        .all(|s| (s.infected + s.recovered - still_sick).abs() <= tolerance)
                    && is_non_increasing(&self.trajectory.infected(), tolerance)
            }
            VerificationKind::ZeroRecoveryRate => {
                states
                    .iter()
                    .all(|s| s.recovered == self.initial.recovered)
                    && is_non_increasing(&self.trajectory.susceptible(), tolerance)
                    && is_non_decreasing(&self.trajectory.infected(), tolerance)
            }
            VerificationKind::ZeroInitialInfection => states.iter().all(|s| {
                s.infected == 0.0 && s.susceptible == self.initial.susceptible
            }),
        }
    }
}

/// Results of all four checks.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub rate_of_increase: DerivativeDiagnostics,
    pub scenarios: Vec<VerificationScenario>,
}

fn candidate_ro(parameters: &ContinuousParameters, index: usize) -> Result<f64, SirError> {
    parameters
        .ro_values
        .get(index)
        .or(parameters.ro_values.first())
        .copied()
        .ok_or_else(|| {
            SirError::InvalidParameter(
                "ro_values must name at least one reproduction number".to_string(),
            )
        })
}

/// Evaluates the rates once at `t = 0` with the second candidate reproduction number (the
/// median, 2.0, by default).
///
/// # Errors
///
/// Returns `SirError::InvalidParameter` if no reproduction numbers are configured.
///
/// # Panics
///
/// Panics if the rate of increase does not truncate to zero.
pub fn verify_rate_of_increase(
    parameters: &ContinuousParameters,
) -> Result<DerivativeDiagnostics, SirError> {
    let beta = calculate_beta(candidate_ro(parameters, 1)?, parameters.gamma);
    let diagnostics = evaluate_derivative_with_diagnostics(
        &parameters.initial_state(),
        0.0,
        beta,
        parameters.gamma,
        parameters.population,
    );
    assert_eq!(
        diagnostics.rate_of_increase.trunc(),
        0.0,
        "rates of change no longer sum to zero: {diagnostics:?}"
    );
    Ok(diagnostics)
}

fn build_scenario(
    kind: VerificationKind,
    title: String,
    initial: PopulationState,
    beta: f64,
    gamma: f64,
    parameters: &ContinuousParameters,
) -> Result<VerificationScenario, SirError> {
    let trajectory = solve_differential_equations(&initial, beta, gamma, parameters)?;
    Ok(VerificationScenario {
        kind,
        title,
        beta,
        gamma,
        initial,
        trajectory,
    })
}

/// Integrates with the transmission rate forced to zero.
///
/// # Errors
///
/// Returns `SirError::SolverError` if the integration fails.
pub fn zero_infection_rate_scenario(
    parameters: &ContinuousParameters,
) -> Result<VerificationScenario, SirError> {
    let beta = 0.0;
    build_scenario(
        VerificationKind::ZeroInfectionRate,
        format!("SIR MODEL VERIFICATION 2 - RATE OF INFECTION: {beta:?}"),
        parameters.initial_state(),
        beta,
        parameters.gamma,
        parameters,
    )
}

/// Integrates with the recovery rate forced to zero. Beta is derived from the first candidate
/// reproduction number (3.28 by default) and the configured recovery rate.
///
/// # Errors
///
/// Returns an `SirError` if no reproduction numbers are configured or the integration fails.
pub fn zero_recovery_rate_scenario(
    parameters: &ContinuousParameters,
) -> Result<VerificationScenario, SirError> {
    let gamma = 0.0;
    let beta = calculate_beta(candidate_ro(parameters, 0)?, parameters.gamma);
    build_scenario(
        VerificationKind::ZeroRecoveryRate,
        format!("SIR MODEL VERIFICATION 3 - RATE OF RECOVERY: {gamma:?}"),
        parameters.initial_state(),
        beta,
        gamma,
        parameters,
    )
}

/// Integrates with nobody initially infected.
///
/// # Errors
///
/// Returns an `SirError` if no reproduction numbers are configured or the integration fails.
pub fn zero_initial_infection_scenario(
    parameters: &ContinuousParameters,
) -> Result<VerificationScenario, SirError> {
    let initial = PopulationState {
        infected: 0.0,
        ..parameters.initial_state()
    };
    let beta = calculate_beta(candidate_ro(parameters, 0)?, parameters.gamma);
    build_scenario(
        VerificationKind::ZeroInitialInfection,
        "SIR MODEL VERIFICATION 4 - INITIAL INFECTED POPULATION AS: 0".to_string(),
        initial,
        beta,
        parameters.gamma,
        parameters,
    )
}

/// Runs the four checks in order.
///
/// # Errors
///
/// Returns an `SirError` if any integration fails.
///
/// # Panics
///
/// Panics if the conservation check fails.
pub fn run_verifications(
    parameters: &ContinuousParameters,
) -> Result<VerificationReport, SirError> {
    let rate_of_increase = verify_rate_of_increase(parameters)?;
    let scenarios = vec![
        zero_infection_rate_scenario(parameters)?,
        zero_recovery_rate_scenario(parameters)?,
        zero_initial_infection_scenario(parameters)?,
    ];
    for scenario in &scenarios {
        if scenario.expected_behaviour_holds(parameters.population) {
            info!("{}: behaves as expected", scenario.title);
        } else {
            warn!("{}: unexpected trajectory shape", scenario.title);
        }
    }
    Ok(VerificationReport {
        rate_of_increase,
        scenarios,
    })
}
