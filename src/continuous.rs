//! Continuous-time SIR model: the rate equations integrated over a fixed time grid, once per
//! candidate reproduction number.
use log::{debug, info};

use crate::error::SirError;
use crate::integrate::odeint_with_stats;
use crate::model::{calculate_beta, evaluate_derivative, PopulationState};
use crate::parameters::ContinuousParameters;

/// Population states sampled on a time grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub states: Vec<PopulationState>,
}

/// One grid point of a [`Trajectory`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub state: PopulationState,
}

impl Trajectory {
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = TrajectoryPoint> + '_ {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(time, state)| TrajectoryPoint {
                time: *time,
                state: *state,
            })
    }

    #[must_use]
    pub fn susceptible(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.susceptible).collect()
    }

    #[must_use]
    pub fn infected(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.infected).collect()
    }

    #[must_use]
    pub fn recovered(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.recovered).collect()
    }

    /// The grid point with the most people infected.
    #[must_use]
    pub fn peak_infection(&self) -> Option<TrajectoryPoint> {
        self.points()
            .max_by(|a, b| a.state.infected.total_cmp(&b.state.infected))
    }
}

/// Outcome of one run of the R0 sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioTrajectory {
    pub ro: f64,
    pub beta: f64,
    pub trajectory: Trajectory,
}

impl ScenarioTrajectory {
    #[must_use]
    pub fn title(&self) -> String {
        format!("SIR MODEL - REPRODUCTION NUMBER Ro: {}", self.ro)
    }
}

/// Integrates the SIR equations from `initial` over the configured time grid.
///
/// # Errors
///
/// Returns `SirError::SolverError` if the integration fails.
pub fn solve_differential_equations(
    initial: &PopulationState,
    beta: f64,
    gamma: f64,
    parameters: &ContinuousParameters,
) -> Result<Trajectory, SirError> {
    let population = parameters.population;
    let times = parameters.time_grid();
    let (rows, stats) = odeint_with_stats(
        |t, y| {
            evaluate_derivative(&PopulationState::from_slice(y), t, beta, gamma, population)
                .to_vec()
        },
        &initial.to_vec(),
        &times,
        &parameters.solver_options(),
    )?;
    debug!(
        "Solved beta = {beta}, gamma = {gamma} in {} steps ({} evaluations)",
        stats.steps, stats.nfev
    );

    let states: Vec<PopulationState> = rows
        .iter()
        .map(|row| PopulationState::from_slice(row))
        .collect();
    debug!("SOLUTION: {:?}", states.last());
    Ok(Trajectory { times, states })
}

/// Runs the continuous model once per reproduction number in `parameters.ro_values`, in order.
///
/// # Errors
///
/// Returns `SirError::SolverError` if any integration fails.
pub fn run_model(parameters: &ContinuousParameters) -> Result<Vec<ScenarioTrajectory>, SirError> {
    let initial = parameters.initial_state();
    parameters
        .ro_values
        .iter()
        .map(|&ro| {
            let beta = calculate_beta(ro, parameters.gamma);
            let trajectory =
                solve_differential_equations(&initial, beta, parameters.gamma, parameters)?;
            if let Some(peak) = trajectory.peak_infection() {
                info!(
                    "Ro {ro}: infections peak at {:.0} on day {:.1}",
                    peak.state.infected, peak.time
                );
            }
            Ok(ScenarioTrajectory {
                ro,
                beta,
                trajectory,
            })
        })
        .collect()
}
