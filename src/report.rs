//! Hands model output to a renderer.
//!
//! A [`Chart`] is a set of named series sharing one x axis, plus a title. The bundled
//! [`CsvRenderer`] writes every chart it receives to its own CSV file, one column per series,
//! so that the data can be plotted by any external tool.
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::info;

use crate::continuous::Trajectory;
use crate::discrete::DiscreteModelResult;
use crate::error::SirError;

/// A named sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Series {
            label: label.into(),
            values,
        }
    }
}

/// Several series plotted against a shared x axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub x_label: String,
    pub x: Vec<f64>,
    pub series: Vec<Series>,
}

/// Compartment trajectories of the continuous model against time.
#[must_use]
pub fn trajectory_chart(trajectory: &Trajectory) -> Chart {
    Chart {
        x_label: "TIME".to_string(),
        x: trajectory.times.clone(),
        series: vec![
            Series::new("Susceptible", trajectory.susceptible()),
            Series::new("Infected", trajectory.infected()),
            Series::new("Recovered", trajectory.recovered()),
        ],
    }
}

/// Recorded compartments of the discrete model against the day number, starting at day 1.
#[must_use]
pub fn discrete_chart(result: &DiscreteModelResult) -> Chart {
    #[allow(clippy::cast_precision_loss)]
    let days = (1..=result.len()).map(|day| day as f64).collect();
    Chart {
        x_label: "DAYS".to_string(),
        x: days,
        series: vec![
            Series::new("infected", result.infected.clone()),
            Series::new("susceptible", result.susceptible.clone()),
            Series::new("recovered", result.recovered.clone()),
        ],
    }
}

/// Receives charts for display. Rendering never feeds back into the models.
pub trait Renderer {
    /// # Errors
    ///
    /// Returns an `SirError` if the chart could not be rendered.
    fn render(&mut self, title: &str, chart: &Chart) -> Result<(), SirError>;
}

/// Turns a chart title into a file name stem: lower case ASCII alphanumerics separated by
/// single underscores.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Writes each chart to `{directory}/{file_prefix}{slug}.csv`.
#[derive(Debug, Clone)]
pub struct CsvRenderer {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub overwrite: bool,
    written: Vec<PathBuf>,
}

impl CsvRenderer {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        CsvRenderer {
            directory: directory.into(),
            file_prefix: String::new(),
            overwrite: false,
            written: Vec::new(),
        }
    }

    #[must_use]
    pub fn file_prefix(mut self, file_prefix: impl Into<String>) -> Self {
        self.file_prefix = file_prefix.into();
        self
    }

    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Files written so far, in order.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    #[must_use]
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}.csv", self.file_prefix, slugify(title)))
    }
}

// Checks that the path is valid. Creates all parent directories if they do not exist and
// refuses to clobber an existing file unless `overwrite` is set.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, SirError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            if !overwrite && path.exists() {
                return Err(SirError::ReportError(format!(
                    "{} already exists; pass --force-overwrite to replace it",
                    path.display()
                )));
            }
            Ok(File::create(path)?)
        }
        _ => Err(SirError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

impl Renderer for CsvRenderer {
    fn render(&mut self, title: &str, chart: &Chart) -> Result<(), SirError> {
        if let Some(series) = chart.series.iter().find(|s| s.values.len() != chart.x.len()) {
            return Err(SirError::ReportError(format!(
                "series {} has {} values for {} x values",
                series.label,
                series.values.len(),
                chart.x.len()
            )));
        }

        let path = self.path_for(title);
        let file = generate_validate_filepath(&path, self.overwrite)?;
        let mut writer = Writer::from_writer(file);

        let mut header = vec![chart.x_label.clone()];
        header.extend(chart.series.iter().map(|s| s.label.clone()));
        writer.write_record(&header)?;

        for (i, x) in chart.x.iter().enumerate() {
            let mut row = vec![x.to_string()];
            row.extend(chart.series.iter().map(|s| s.values[i].to_string()));
            writer.write_record(&row)?;
        }
        writer.flush()?;

        info!("{title}: wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PopulationState;
    use tempfile::tempdir;

    fn sample_trajectory() -> Trajectory {
        Trajectory {
            times: vec![0.0, 1.0],
            states: vec![
                PopulationState::new(9.0, 1.0, 0.0),
                PopulationState::new(8.0, 1.5, 0.5),
            ],
        }
    }

    #[test]
    fn slugify_titles() {
        assert_eq!(
            slugify("SIR MODEL - REPRODUCTION NUMBER Ro: 3.28"),
            "sir_model_reproduction_number_ro_3_28"
        );
        assert_eq!(slugify("  gamma: 0.50, beta: 2\n"), "gamma_0_50_beta_2");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn trajectory_chart_has_three_series() {
        let chart = trajectory_chart(&sample_trajectory());
        assert_eq!(chart.x_label, "TIME");
        let labels: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Susceptible", "Infected", "Recovered"]);
        assert_eq!(chart.series[1].values, vec![1.0, 1.5]);
    }

    #[test]
    fn discrete_chart_counts_days_from_one() {
        let result = DiscreteModelResult {
            susceptible: vec![3.0, 2.0],
            infected: vec![1.0, 1.0],
            recovered: vec![0.0, 1.0],
            final_rate_of_increase: Some(0.0),
            final_population: Some(4.0),
        };
        let chart = discrete_chart(&result);
        assert_eq!(chart.x, vec![1.0, 2.0]);
        assert_eq!(chart.x_label, "DAYS");
    }

    #[test]
    fn csv_renderer_writes_header_and_rows() {
        let temp_dir = tempdir().unwrap();
        let mut renderer = CsvRenderer::new(temp_dir.path().join("charts")).file_prefix("run_");
        renderer
            .render("SIR MODEL", &trajectory_chart(&sample_trajectory()))
            .unwrap();

        let path = temp_dir.path().join("charts").join("run_sir_model.csv");
        assert_eq!(renderer.written(), &[path.clone()]);

        let mut reader = csv::Reader::from_path(path).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, vec!["TIME", "Susceptible", "Infected", "Recovered"]);
        let rows: Vec<Vec<f64>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|v| v.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows, vec![vec![0.0, 9.0, 1.0, 0.0], vec![1.0, 8.0, 1.5, 0.5]]);
    }

    #[test]
    fn existing_file_is_not_overwritten_by_default() {
        let temp_dir = tempdir().unwrap();
        let chart = trajectory_chart(&sample_trajectory());
        let mut renderer = CsvRenderer::new(temp_dir.path());
        renderer.render("chart", &chart).unwrap();
        let result = renderer.render("chart", &chart);
        assert!(matches!(result, Err(SirError::ReportError(_))));

        let mut renderer = CsvRenderer::new(temp_dir.path()).overwrite(true);
        assert!(renderer.render("chart", &chart).is_ok());
    }

    #[test]
    fn mismatched_series_are_rejected() {
        let temp_dir = tempdir().unwrap();
        let chart = Chart {
            x_label: "TIME".to_string(),
            x: vec![0.0, 1.0],
            series: vec![Series::new("Infected", vec![1.0])],
        };
        let mut renderer = CsvRenderer::new(temp_dir.path());
        let result = renderer.render("broken", &chart);
        assert!(matches!(result, Err(SirError::ReportError(_))));
        assert!(!temp_dir.path().join("broken.csv").exists());
    }

    #[test]
    #[should_panic(expected = "Report output files must be CSVs at this time")]
    fn only_csvs_allowed() {
        let temp_dir = tempdir().unwrap();
        let res = generate_validate_filepath(&temp_dir.path().join("chart.tsv"), false);
        match res {
            Ok(_) => panic!("Other file types beyond CSV are not allowed (yet)"),
            Err(SirError::ReportError(error_message)) => panic!("{}", error_message),
            Err(_) => panic!("Unexpected error"),
        }
    }
}
