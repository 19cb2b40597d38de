//! Discrete-time SIR model. The rate equations are applied as one forward-Euler update per
//! day, with a step size of one day.
//!
//! Recorded compartment values are passed through `abs()`. With large step sizes the explicit
//! scheme overshoots and a compartment can go negative; the absolute value hides this in the
//! recorded sequences while the running totals keep the signed values.
use log::debug;

use crate::model::{rates, PopulationState};
use crate::parameters::DiscreteParameters;

/// Output of [`run_discrete_model`]. The three sequences hold one entry per simulated day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscreteModelResult {
    pub susceptible: Vec<f64>,
    pub infected: Vec<f64>,
    pub recovered: Vec<f64>,
    /// `ds + di + dr` of the last step only. `None` if no step ran.
    pub final_rate_of_increase: Option<f64>,
    /// Signed `S + I + R` after the last step only. `None` if no step ran.
    pub final_population: Option<f64>,
}

impl DiscreteModelResult {
    /// Number of recorded days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.susceptible.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.susceptible.is_empty()
    }
}

/// Runs the Euler model from `initial` for days `1..parameters.days`.
#[must_use]
pub fn run_discrete_model(
    initial: &PopulationState,
    parameters: &DiscreteParameters,
) -> DiscreteModelResult {
    let steps = parameters.days.saturating_sub(1);
    let mut result = DiscreteModelResult {
        susceptible: Vec::with_capacity(steps),
        infected: Vec::with_capacity(steps),
        recovered: Vec::with_capacity(steps),
        ..DiscreteModelResult::default()
    };

    let PopulationState {
        mut susceptible,
        mut infected,
        mut recovered,
    } = *initial;

    for day in 1..parameters.days {
        let (ds_dt, di_dt, dr_dt) = rates(
            susceptible,
            infected,
            parameters.beta,
            parameters.gamma,
            parameters.population,
        );

        susceptible += ds_dt;
        infected += di_dt;
        recovered += dr_dt;

        result.susceptible.push(susceptible.abs());
        result.infected.push(infected.abs());
        result.recovered.push(recovered.abs());

        result.final_rate_of_increase = Some(ds_dt + di_dt + dr_dt);
        result.final_population = Some(susceptible + infected + recovered);
        debug!(
            "Day {day}: Susceptible: {susceptible}, Infected: {infected}, Recovered: {recovered}"
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;

    fn default_run() -> DiscreteModelResult {
        let parameters = DiscreteParameters::default();
        run_discrete_model(&parameters.initial_state(), &parameters)
    }

    #[test]
    fn records_one_value_per_day_after_the_first() {
        let result = default_run();
        assert_eq!(result.len(), 99);
        assert_eq!(result.infected.len(), 99);
        assert_eq!(result.recovered.len(), 99);
    }

    #[test]
    fn first_step_is_a_single_euler_update() {
        let result = default_run();
        let population = 329_968_629.0;
        let infection = 2.0 * 329_968_628.0 / population;
        assert_almost_eq!(result.susceptible[0], 329_968_628.0 - infection, 1e-6);
        assert_almost_eq!(result.infected[0], 1.0 + infection - 0.5, 1e-9);
        assert_almost_eq!(result.recovered[0], 0.5, 1e-12);
    }

    #[test]
    fn recorded_values_are_never_negative() {
        let result = default_run();
        for values in [&result.susceptible, &result.infected, &result.recovered] {
            assert!(values.iter().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn overshoot_is_masked_by_absolute_value() {
        // With beta = 2 the daily step overshoots and drives the running susceptible count
        // below zero. The population still sums to N, so recovered must exceed it.
        let result = default_run();
        let population = 329_968_629.0;
        let last = result.len() - 1;
        assert!(result.recovered[last] > population);
        let signed_total =
            result.recovered[last] + result.infected[last] - result.susceptible[last];
        assert!((signed_total - population).abs() < 1.0);
    }

    #[test]
    fn final_fields_describe_the_last_step() {
        let result = default_run();
        let rate = result.final_rate_of_increase.unwrap();
        let total = result.final_population.unwrap();
        assert!(rate.abs() < 1e-3);
        assert!((total - 329_968_629.0).abs() < 1e-3);
    }

    #[test]
    fn no_steps_for_a_single_day() {
        let parameters = DiscreteParameters {
            days: 1,
            ..DiscreteParameters::default()
        };
        let result = run_discrete_model(&parameters.initial_state(), &parameters);
        assert!(result.is_empty());
        assert_eq!(result.final_rate_of_increase, None);
        assert_eq!(result.final_population, None);

        let parameters = DiscreteParameters {
            days: 0,
            ..DiscreteParameters::default()
        };
        assert!(run_discrete_model(&parameters.initial_state(), &parameters).is_empty());
    }

    #[test]
    fn no_infection_without_infected() {
        let parameters = DiscreteParameters {
            initial_infected: 0.0,
            days: 10,
            ..DiscreteParameters::default()
        };
        let result = run_discrete_model(&parameters.initial_state(), &parameters);
        assert!(result.infected.iter().all(|v| *v == 0.0));
        assert!(result.susceptible.iter().all(|v| *v == parameters.population));
        assert_eq!(result.final_rate_of_increase, Some(0.0));
    }

    #[test]
    fn mild_rates_keep_the_recorded_population() {
        let parameters = DiscreteParameters {
            population: 1000.0,
            beta: 0.3,
            gamma: 0.1,
            days: 200,
            initial_infected: 10.0,
            initial_recovered: 0.0,
        };
        let result = run_discrete_model(&parameters.initial_state(), &parameters);
        // Nothing goes negative here, so the recorded values are the signed ones.
        for i in 0..result.len() {
            let total = result.susceptible[i] + result.infected[i] + result.recovered[i];
            assert_almost_eq!(total, 1000.0, 1e-9);
        }
    }
}
