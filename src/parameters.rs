//! Immutable run configuration.
//!
//! Every field has a default reproducing the United States outbreak study: a population of
//! 329,968,629 (2019 estimate), one initial case, a 21 day infectious period and the candidate
//! reproduction numbers 3.28 (cumulative estimate from a research letter), 2.0 (median) and
//! 1.95 (WHO). A JSON file may override any subset of them.
use std::fs;
use std::path::Path;

use log::info;
use serde_derive::{Deserialize, Serialize};

use crate::error::SirError;
use crate::integrate::{linspace, SolverOptions, DEFAULT_TOLERANCE};
use crate::model::PopulationState;

/// US population estimate, 2019.
pub const POPULATION_NUMBER: f64 = 329_968_629.0;

fn default_population() -> f64 {
    POPULATION_NUMBER
}

fn default_ro_values() -> Vec<f64> {
    vec![3.28, 2.0, 1.95]
}

fn default_initial_infected() -> f64 {
    1.0
}

/// Parameters of the continuous-time model and its R0 sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContinuousParameters {
    pub population: f64,
    /// Recovery rate, the inverse of the mean infectious period.
    pub gamma: f64,
    pub ro_values: Vec<f64>,
    pub initial_infected: f64,
    pub initial_recovered: f64,
    pub t_start: f64,
    pub t_end: f64,
    pub t_points: usize,
    pub rtol: f64,
    pub atol: f64,
}

impl Default for ContinuousParameters {
    fn default() -> Self {
        ContinuousParameters {
            population: default_population(),
            gamma: 1.0 / 21.0,
            ro_values: default_ro_values(),
            initial_infected: default_initial_infected(),
            initial_recovered: 0.0,
            t_start: 0.0,
            t_end: 500.0,
            t_points: 100,
            rtol: DEFAULT_TOLERANCE,
            atol: DEFAULT_TOLERANCE,
        }
    }
}

impl ContinuousParameters {
    /// Everyone not initially infected or recovered starts out susceptible.
    #[must_use]
    pub fn initial_state(&self) -> PopulationState {
        PopulationState::new(
            self.population - self.initial_infected - self.initial_recovered,
            self.initial_infected,
            self.initial_recovered,
        )
    }

    #[must_use]
    pub fn time_grid(&self) -> Vec<f64> {
        linspace(self.t_start, self.t_end, self.t_points)
    }

    #[must_use]
    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            rtol: self.rtol,
            atol: self.atol,
            ..SolverOptions::default()
        }
    }

    fn validate(&self) -> Result<(), SirError> {
        check_population(self.population, self.initial_infected, self.initial_recovered)?;
        check_rate("gamma", self.gamma)?;
        if self.ro_values.is_empty() {
            return Err(SirError::InvalidParameter(
                "ro_values must name at least one reproduction number".to_string(),
            ));
        }
        for ro in &self.ro_values {
            check_rate("ro_values", *ro)?;
        }
        if self.t_points < 2 {
            return Err(SirError::InvalidParameter(format!(
                "t_points must be at least 2, got {}",
                self.t_points
            )));
        }
        if !(self.t_end > self.t_start) {
            return Err(SirError::InvalidParameter(format!(
                "t_end ({}) must be greater than t_start ({})",
                self.t_end, self.t_start
            )));
        }
        if !(self.rtol > 0.0) || !(self.atol > 0.0) {
            return Err(SirError::InvalidParameter(
                "solver tolerances must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters of the discrete-time (Euler) model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscreteParameters {
    pub population: f64,
    /// Coefficient of infection.
    pub beta: f64,
    /// Transition rate from infected to recovered.
    pub gamma: f64,
    /// Days from the first case. The model records `days - 1` steps.
    pub days: usize,
    pub initial_infected: f64,
    pub initial_recovered: f64,
}

impl Default for DiscreteParameters {
    fn default() -> Self {
        DiscreteParameters {
            population: default_population(),
            beta: 2.0,
            gamma: 0.5,
            days: 100,
            initial_infected: default_initial_infected(),
            initial_recovered: 0.0,
        }
    }
}

impl DiscreteParameters {
    #[must_use]
    pub fn initial_state(&self) -> PopulationState {
        PopulationState::new(
            self.population - self.initial_infected - self.initial_recovered,
            self.initial_infected,
            self.initial_recovered,
        )
    }

    fn validate(&self) -> Result<(), SirError> {
        check_population(self.population, self.initial_infected, self.initial_recovered)?;
        check_rate("beta", self.beta)?;
        check_rate("gamma", self.gamma)
    }
}

/// Complete configuration of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    pub continuous: ContinuousParameters,
    pub discrete: DiscreteParameters,
}

impl Parameters {
    /// Reads parameters from a JSON file. Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an `SirError` if the file cannot be read, is not valid JSON, or holds
    /// invalid values.
    pub fn load_from_json(file_path: &Path) -> Result<Parameters, SirError> {
        info!("Loading parameters from: {}", file_path.display());
        let contents = fs::read_to_string(file_path)?;
        Parameters::from_json_str(&contents)
    }

    /// # Errors
    ///
    /// Returns an `SirError` if `json` does not parse or holds invalid values.
    pub fn from_json_str(json: &str) -> Result<Parameters, SirError> {
        let parameters: Parameters = serde_json::from_str(json)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// # Errors
    ///
    /// Returns `SirError::InvalidParameter` describing the first invalid value.
    pub fn validate(&self) -> Result<(), SirError> {
        self.continuous.validate()?;
        self.discrete.validate()
    }
}

fn check_rate(name: &str, value: f64) -> Result<(), SirError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SirError::InvalidParameter(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}

fn check_population(population: f64, infected: f64, recovered: f64) -> Result<(), SirError> {
    if !(population > 0.0) || !population.is_finite() {
        return Err(SirError::InvalidParameter(format!(
            "population must be positive and finite, got {population}"
        )));
    }
    check_rate("initial_infected", infected)?;
    check_rate("initial_recovered", recovered)?;
    if infected + recovered > population {
        return Err(SirError::InvalidParameter(format!(
            "initial infected ({infected}) and recovered ({recovered}) exceed the population ({population})"
        )));
    }
    Ok(())
}
