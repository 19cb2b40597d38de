use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Args, Command, FromArgMatches as _, ValueEnum};
use log::{info, LevelFilter};

use crate::continuous::{run_model, ScenarioTrajectory};
use crate::discrete::{run_discrete_model, DiscreteModelResult};
use crate::error::SirError;
use crate::log::set_log_level;
use crate::parameters::Parameters;
use crate::report::{discrete_chart, trajectory_chart, CsvRenderer, Renderer};
use crate::verification::{run_verifications, VerificationReport};

/// Which models a run executes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ModelSelection {
    /// The R0 sweep of the continuous model
    Continuous,
    /// The daily Euler model
    Discrete,
    /// The sanity checks of the continuous model
    Verify,
    #[default]
    All,
}

impl ModelSelection {
    fn includes(self, other: ModelSelection) -> bool {
        self == ModelSelection::All || self == other
    }
}

/// Default cli arguments for the `sir-ro` runner
#[derive(Args, Debug, Clone, Default)]
pub struct BaseArgs {
    /// Optional path for a JSON parameters file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Optional path for chart output. Defaults to the current directory
    #[arg(short, long, default_value = "")]
    pub output_dir: String,

    /// Prefix for chart file names
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Replace chart files that already exist
    #[arg(short, long, default_value_t = false)]
    pub force_overwrite: bool,

    /// Enable logging at the given level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "")]
    pub log_level: String,

    /// Models to run
    #[arg(short, long, value_enum, default_value_t = ModelSelection::All)]
    pub model: ModelSelection,
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub scenarios: Vec<ScenarioTrajectory>,
    pub discrete: Option<DiscreteModelResult>,
    pub verification: Option<VerificationReport>,
    /// Chart files in the order they were written
    pub written: Vec<PathBuf>,
}

fn create_cli() -> Command {
    let cli = Command::new("sir-ro")
        .about("Compares SIR epidemics under different basic reproduction numbers");
    BaseArgs::augment_args(cli)
}

/// Parses the command line and runs the selected models.
///
/// # Errors
/// Returns an error if argument parsing or any of the model runs fails
#[allow(clippy::missing_errors_doc)]
pub fn run_with_args() -> Result<RunSummary, Box<dyn std::error::Error>> {
    let cli = create_cli();
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(&base_args_matches)?)
}

fn parse_log_level(level: &str) -> Result<LevelFilter, SirError> {
    LevelFilter::from_str(level).map_err(|_| {
        SirError::InvalidParameter(format!(
            "unknown log level {level:?}; expected one of off, error, warn, info, debug, trace"
        ))
    })
}

/// Runs the models selected in `args`, writing one CSV chart per trajectory.
///
/// # Errors
/// Returns an `SirError` if the parameters are invalid, an integration fails, or a chart
/// cannot be written.
///
/// # Panics
/// Panics if the conservation check of the verification run fails.
pub fn run_with_args_internal(args: &BaseArgs) -> Result<RunSummary, SirError> {
    if !args.log_level.is_empty() {
        set_log_level(parse_log_level(&args.log_level)?);
    }

    // Optionally read parameters from a file
    let parameters = if args.config.is_empty() {
        Parameters::default()
    } else {
        println!("Loading parameters from: {}", args.config);
        Parameters::load_from_json(Path::new(&args.config))?
    };

    let output_dir = if args.output_dir.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(&args.output_dir)
    };
    let mut renderer = CsvRenderer::new(output_dir)
        .file_prefix(args.prefix.clone())
        .overwrite(args.force_overwrite);

    let mut summary = RunSummary::default();

    if args.model.includes(ModelSelection::Continuous) {
        summary.scenarios = run_model(&parameters.continuous)?;
        for scenario in &summary.scenarios {
            renderer.render(&scenario.title(), &trajectory_chart(&scenario.trajectory))?;
            if let Some(peak) = scenario.trajectory.peak_infection() {
                println!(
                    "Ro {}: peak of {:.0} infected at t = {:.1}",
                    scenario.ro, peak.state.infected, peak.time
                );
            }
        }
    }

    if args.model.includes(ModelSelection::Discrete) {
        let discrete = &parameters.discrete;
        let result = run_discrete_model(&discrete.initial_state(), discrete);
        let title = format!(
            "SIR MODEL BASIC gamma: {:.2}, beta: {}",
            discrete.gamma, discrete.beta
        );
        renderer.render(&title, &discrete_chart(&result))?;
        match (result.final_rate_of_increase, result.final_population) {
            (Some(rate), Some(population)) => {
                info!(
                    "Discrete model: final rate of increase {rate}, final population {population}"
                );
            }
            _ => info!("Discrete model: no days were simulated"),
        }
        summary.discrete = Some(result);
    }

    if args.model.includes(ModelSelection::Verify) {
        let report = run_verifications(&parameters.continuous)?;
        println!(
            "Rate of increase at t = 0: {}",
            report.rate_of_increase.rate_of_increase
        );
        for scenario in &report.scenarios {
            renderer.render(&scenario.title, &trajectory_chart(&scenario.trajectory))?;
        }
        summary.verification = Some(report);
    }

    summary.written = renderer.written().to_vec();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args_in(dir: &Path) -> BaseArgs {
        BaseArgs {
            output_dir: dir.to_string_lossy().into_owned(),
            ..BaseArgs::default()
        }
    }

    #[test]
    fn test_run_everything() {
        let temp_dir = tempdir().unwrap();
        let summary = run_with_args_internal(&args_in(temp_dir.path())).unwrap();

        assert_eq!(summary.scenarios.len(), 3);
        assert_eq!(summary.discrete.as_ref().map(DiscreteModelResult::len), Some(99));
        assert_eq!(summary.verification.as_ref().unwrap().scenarios.len(), 3);
        assert_eq!(summary.written.len(), 7);
        for path in &summary.written {
            assert!(path.exists(), "{} was not written", path.display());
        }
        assert!(temp_dir
            .path()
            .join("sir_model_reproduction_number_ro_3_28.csv")
            .exists());
        assert!(temp_dir
            .path()
            .join("sir_model_basic_gamma_0_50_beta_2.csv")
            .exists());
    }

    #[test]
    fn test_run_single_model() {
        let temp_dir = tempdir().unwrap();
        let args = BaseArgs {
            model: ModelSelection::Discrete,
            prefix: "basic_".to_string(),
            ..args_in(temp_dir.path())
        };
        let summary = run_with_args_internal(&args).unwrap();
        assert!(summary.scenarios.is_empty());
        assert!(summary.verification.is_none());
        assert_eq!(
            summary.written,
            vec![temp_dir
                .path()
                .join("basic_sir_model_basic_gamma_0_50_beta_2.csv")]
        );
    }

    #[test]
    fn test_rerun_needs_force_overwrite() {
        let temp_dir = tempdir().unwrap();
        let args = BaseArgs {
            model: ModelSelection::Verify,
            ..args_in(temp_dir.path())
        };
        run_with_args_internal(&args).unwrap();
        let result = run_with_args_internal(&args);
        assert!(matches!(result, Err(SirError::ReportError(_))));

        let args = BaseArgs {
            force_overwrite: true,
            ..args
        };
        assert!(run_with_args_internal(&args).is_ok());
    }

    #[test]
    fn test_run_with_config_path() {
        let temp_dir = tempdir().unwrap();
        let args = BaseArgs {
            config: "tests/data/parameters.json".to_string(),
            model: ModelSelection::Continuous,
            ..args_in(temp_dir.path())
        };
        let summary = run_with_args_internal(&args).unwrap();
        let ros: Vec<f64> = summary.scenarios.iter().map(|s| s.ro).collect();
        assert_eq!(ros, vec![2.5, 1.5]);
        assert_eq!(summary.scenarios[0].trajectory.len(), 50);
    }

    #[test]
    fn test_missing_config_file() {
        let args = BaseArgs {
            config: "tests/data/does_not_exist.json".to_string(),
            ..BaseArgs::default()
        };
        let result = run_with_args_internal(&args);
        assert!(matches!(result, Err(SirError::IoError(_))));
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("info").unwrap(), LevelFilter::Info);
        assert_eq!(parse_log_level("TRACE").unwrap(), LevelFilter::Trace);
        assert!(matches!(
            parse_log_level("loud"),
            Err(SirError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_model_selection() {
        assert!(ModelSelection::All.includes(ModelSelection::Verify));
        assert!(ModelSelection::Discrete.includes(ModelSelection::Discrete));
        assert!(!ModelSelection::Discrete.includes(ModelSelection::Continuous));
    }
}
