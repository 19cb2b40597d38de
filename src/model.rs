//! The SIR rate equations shared by the continuous and discrete models.
//!
//! A population of fixed size `N` is split into three compartments. Susceptible people become
//! infected at rate `beta * S * I / N` and infected people recover at rate `gamma * I`:
//!
//! ```text
//! dS/dt = -(beta * S * I) / N
//! dI/dt =  (beta * S * I) / N - gamma * I
//! dR/dt =  gamma * I
//! ```
//!
//! The three terms cancel exactly, so the total population is conserved by construction.
use log::{debug, info, trace};

/// The three SIR compartments. Used both for population counts and for their rates of change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PopulationState {
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
}

impl PopulationState {
    #[must_use]
    pub fn new(susceptible: f64, infected: f64, recovered: f64) -> Self {
        PopulationState {
            susceptible,
            infected,
            recovered,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.susceptible, self.infected, self.recovered]
    }

    /// Builds a state from an `[S, I, R]` slice as produced by the ODE solver.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold exactly three compartments.
    #[must_use]
    pub fn from_slice(values: &[f64]) -> Self {
        match values {
            [susceptible, infected, recovered] => {
                PopulationState::new(*susceptible, *infected, *recovered)
            }
            _ => panic!(
                "an SIR state has three compartments, got {}",
                values.len()
            ),
        }
    }
}

/// The derivative triple together with its sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativeDiagnostics {
    pub derivatives: PopulationState,
    /// `dS/dt + dI/dt + dR/dt`; zero under exact arithmetic.
    pub rate_of_increase: f64,
}

/// Derives the transmission rate from a basic reproduction number and a recovery rate.
#[must_use]
pub fn calculate_beta(ro: f64, gamma: f64) -> f64 {
    let beta = ro * gamma;
    debug!("BETA: {beta}");
    beta
}

/// Raw rate expressions. Kept in one place so every caller composes the terms identically.
#[inline]
pub(crate) fn rates(
    susceptible: f64,
    infected: f64,
    beta: f64,
    gamma: f64,
    population: f64,
) -> (f64, f64, f64) {
    let ds_dt = -(beta * susceptible * infected) / population;
    let di_dt = ((beta * susceptible * infected) / population) - (gamma * infected);
    let dr_dt = gamma * infected;
    (ds_dt, di_dt, dr_dt)
}

/// Instantaneous rates of change of `state`. The system is autonomous; `time` only appears in
/// the log output.
#[must_use]
pub fn evaluate_derivative(
    state: &PopulationState,
    time: f64,
    beta: f64,
    gamma: f64,
    population: f64,
) -> PopulationState {
    let (ds_dt, di_dt, dr_dt) = rates(
        state.susceptible,
        state.infected,
        beta,
        gamma,
        population,
    );
    let derivatives = PopulationState::new(ds_dt, di_dt, dr_dt);
    trace!("TIME(t): {time}");
    trace!("[susceptible, infected, recovered]: {state:?}");
    trace!("Derivatives of [susceptible, infected, recovered]: {derivatives:?}");
    derivatives
}

/// Same as [`evaluate_derivative`], also reporting the rate of increase of the total
/// population.
#[must_use]
pub fn evaluate_derivative_with_diagnostics(
    state: &PopulationState,
    time: f64,
    beta: f64,
    gamma: f64,
    population: f64,
) -> DerivativeDiagnostics {
    let derivatives = evaluate_derivative(state, time, beta, gamma, population);
    let rate_of_increase = derivatives.susceptible + derivatives.infected + derivatives.recovered;
    info!("RATE of Increase: ds_dt + di_dt + dr_dt = {rate_of_increase}");
    DerivativeDiagnostics {
        derivatives,
        rate_of_increase,
    }
}
