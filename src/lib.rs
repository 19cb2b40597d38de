//! Comparative runs of the SIR epidemic model under different basic reproduction numbers
//!
//! The population is split into three compartments, susceptible (S), infected (I) and
//! recovered (R), of constant total size `N`. Two formulations are provided:
//! * A continuous-time model whose rate equations are integrated with an adaptive
//!   Runge-Kutta solver ([`integrate::odeint`]). It is run once per basic reproduction
//!   number `R0`, with the transmission rate derived as `beta = R0 * gamma`.
//! * A discrete-time model that advances the same rates with one forward Euler step per day.
//!
//! A set of verification runs checks that the continuous model conserves the population and
//! behaves sensibly when one of its rates or the initial infection is zero.
//!
//! Every trajectory is handed to a [`report::Renderer`] as a chart; the bundled
//! [`report::CsvRenderer`] writes one CSV file per chart. The `sir-ro` binary wires all of this
//! to a command line (see [`runner::BaseArgs`]).
pub mod continuous;
pub mod discrete;
pub mod error;
pub mod integrate;
pub mod log;
pub mod model;
pub mod numeric;
pub mod parameters;
pub mod report;
pub mod runner;
pub mod verification;

mod macros;

pub use continuous::{run_model, solve_differential_equations, ScenarioTrajectory, Trajectory};
pub use discrete::{run_discrete_model, DiscreteModelResult};
pub use error::SirError;
pub use model::{
    calculate_beta, evaluate_derivative, evaluate_derivative_with_diagnostics,
    DerivativeDiagnostics, PopulationState,
};
pub use parameters::{ContinuousParameters, DiscreteParameters, Parameters};
pub use runner::{run_with_args, BaseArgs};
