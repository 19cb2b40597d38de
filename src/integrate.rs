//! Adaptive-step integration of ordinary differential equations over a fixed time grid.
//!
//! [`odeint`] advances an explicit Dormand-Prince RK5(4) pair with error-controlled step sizes
//! and returns the state at every point of the requested grid. Steps are clamped so that each
//! grid point is landed on exactly; no interpolation is involved.
use log::{debug, trace};

use crate::error::SirError;

/// Relative and absolute tolerance used when none is given. Matches `odeint`'s long-standing
/// default of roughly `sqrt(f64::EPSILON)`.
pub const DEFAULT_TOLERANCE: f64 = 1.490_12e-8;

// Step-size control constants.
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

const N_STAGES: usize = 6;
const ERROR_ESTIMATOR_ORDER: f64 = 4.0;

// Dormand-Prince 5(4) Butcher tableau.
static C: [f64; N_STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

static A: [&[f64]; N_STAGES] = [
    &[],
    &[1.0 / 5.0],
    &[3.0 / 40.0, 9.0 / 40.0],
    &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
    &[
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
    ],
    &[
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ],
];

static B: [f64; N_STAGES] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

static E: [f64; N_STAGES + 1] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

/// Tolerances and step bounds for [`odeint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub rtol: f64,
    pub atol: f64,
    /// Size of the very first step. Chosen automatically when `None`.
    pub first_step: Option<f64>,
    pub max_step: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            rtol: DEFAULT_TOLERANCE,
            atol: DEFAULT_TOLERANCE,
            first_step: None,
            max_step: f64::INFINITY,
        }
    }
}

impl SolverOptions {
    fn validate(&self) -> Result<(), SirError> {
        if !(self.rtol > 0.0) || !self.rtol.is_finite() {
            return Err(SirError::SolverError(format!(
                "rtol must be positive and finite, got {}",
                self.rtol
            )));
        }
        if !(self.atol >= 0.0) || !self.atol.is_finite() {
            return Err(SirError::SolverError(format!(
                "atol must be non-negative and finite, got {}",
                self.atol
            )));
        }
        if !(self.max_step > 0.0) {
            return Err(SirError::SolverError(format!(
                "max_step must be positive, got {}",
                self.max_step
            )));
        }
        if let Some(first_step) = self.first_step {
            if !(first_step > 0.0) || !first_step.is_finite() {
                return Err(SirError::SolverError(format!(
                    "first_step must be positive and finite, got {first_step}"
                )));
            }
        }
        Ok(())
    }
}

/// Work counters from a single [`odeint_with_stats`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolverStats {
    /// Number of right-hand side evaluations.
    pub nfev: usize,
    /// Accepted steps.
    pub steps: usize,
    /// Rejected step attempts.
    pub rejected: usize,
}

fn rms_norm(x: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = x.len();
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = x.map(|v| v * v).sum();
    #[allow(clippy::cast_precision_loss)]
    let n = n as f64;
    (sum_sq / n).sqrt()
}

/// Smallest step that still moves `t`.
fn min_step_at(t: f64) -> f64 {
    let spacing = if t == 0.0 {
        f64::MIN_POSITIVE
    } else {
        t.abs() * f64::EPSILON
    };
    10.0 * spacing
}

fn evaluate<F>(
    fun: &mut F,
    t: f64,
    y: &[f64],
    stats: &mut SolverStats,
) -> Result<Vec<f64>, SirError>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    let f = fun(t, y);
    stats.nfev += 1;
    if f.len() != y.len() {
        return Err(SirError::SolverError(format!(
            "derivative returned {} components for a state of {}",
            f.len(),
            y.len()
        )));
    }
    Ok(f)
}

/// Initial step heuristic from Hairer, Nørsett & Wanner, "Solving Ordinary Differential
/// Equations I", section II.4.
#[allow(clippy::too_many_arguments)]
fn select_initial_step<F>(
    fun: &mut F,
    t0: f64,
    y0: &[f64],
    f0: &[f64],
    direction: f64,
    interval_length: f64,
    options: &SolverOptions,
    stats: &mut SolverStats,
) -> Result<f64, SirError>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    if y0.is_empty() {
        return Ok(interval_length);
    }

    let scale: Vec<f64> = y0
        .iter()
        .map(|y| options.atol + y.abs() * options.rtol)
        .collect();
    let d0 = rms_norm(y0.iter().zip(&scale).map(|(y, s)| y / s));
    let d1 = rms_norm(f0.iter().zip(&scale).map(|(f, s)| f / s));

    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };
    let h0 = h0.min(interval_length);

    let y1: Vec<f64> = y0
        .iter()
        .zip(f0)
        .map(|(y, f)| y + h0 * direction * f)
        .collect();
    let f1 = evaluate(fun, t0 + h0 * direction, &y1, stats)?;
    let d2 = rms_norm(
        f1.iter()
            .zip(f0)
            .zip(&scale)
            .map(|((f1, f0), s)| (f1 - f0) / s),
    ) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / (ERROR_ESTIMATOR_ORDER + 1.0))
    };

    Ok((100.0 * h0)
        .min(h1)
        .min(interval_length)
        .min(options.max_step))
}

/// Stepper state carried across grid points.
struct DormandPrince {
    t: f64,
    y: Vec<f64>,
    f: Vec<f64>,
    h_abs: f64,
    direction: f64,
    k: Vec<Vec<f64>>,
    stats: SolverStats,
}

impl DormandPrince {
    fn new<F>(
        fun: &mut F,
        t0: f64,
        y0: &[f64],
        t_final: f64,
        options: &SolverOptions,
    ) -> Result<Self, SirError>
    where
        F: FnMut(f64, &[f64]) -> Vec<f64>,
    {
        let mut stats = SolverStats::default();
        let direction = if t_final >= t0 { 1.0 } else { -1.0 };
        let f0 = evaluate(fun, t0, y0, &mut stats)?;
        let h_abs = match options.first_step {
            Some(first_step) => first_step.min(options.max_step),
            None => select_initial_step(
                fun,
                t0,
                y0,
                &f0,
                direction,
                (t_final - t0).abs(),
                options,
                &mut stats,
            )?,
        };
        debug!("Initial step size: {h_abs}");

        Ok(DormandPrince {
            t: t0,
            y: y0.to_vec(),
            f: f0,
            h_abs,
            direction,
            k: vec![vec![0.0; y0.len()]; N_STAGES + 1],
            stats,
        })
    }

    /// One explicit Runge-Kutta step of size `h`. Fills `self.k` and returns `(y_new, f_new)`.
    fn rk_step<F>(&mut self, fun: &mut F, h: f64) -> Result<(Vec<f64>, Vec<f64>), SirError>
    where
        F: FnMut(f64, &[f64]) -> Vec<f64>,
    {
        let n = self.y.len();
        self.k[0].clone_from(&self.f);

        for s in 1..N_STAGES {
            let mut y_stage = self.y.clone();
            for (j, &a_sj) in A[s].iter().enumerate() {
                if a_sj != 0.0 {
                    for i in 0..n {
                        y_stage[i] += h * a_sj * self.k[j][i];
                    }
                }
            }
            self.k[s] = evaluate(fun, self.t + C[s] * h, &y_stage, &mut self.stats)?;
        }

        let mut y_new = self.y.clone();
        for (s, &b_s) in B.iter().enumerate() {
            if b_s != 0.0 {
                for i in 0..n {
                    y_new[i] += h * b_s * self.k[s][i];
                }
            }
        }

        let f_new = evaluate(fun, self.t + h, &y_new, &mut self.stats)?;
        self.k[N_STAGES].clone_from(&f_new);
        Ok((y_new, f_new))
    }

    fn error_norm(&self, y_new: &[f64], h: f64, options: &SolverOptions) -> f64 {
        let n = self.y.len();
        rms_norm((0..n).map(|i| {
            let error: f64 = E
                .iter()
                .zip(&self.k)
                .map(|(e_s, k_s)| e_s * k_s[i])
                .sum::<f64>()
                * h;
            let scale = options.atol + self.y[i].abs().max(y_new[i].abs()) * options.rtol;
            error / scale
        }))
    }

    /// Takes one accepted step towards `t_bound`, never stepping past it.
    fn step<F>(
        &mut self,
        fun: &mut F,
        t_bound: f64,
        options: &SolverOptions,
    ) -> Result<(), SirError>
    where
        F: FnMut(f64, &[f64]) -> Vec<f64>,
    {
        let t = self.t;
        let min_step = min_step_at(t);
        let proposed = self.h_abs.min(options.max_step).max(min_step);
        let mut h_abs = proposed;
        let error_exponent = -1.0 / (ERROR_ESTIMATOR_ORDER + 1.0);
        let mut step_rejected = false;

        loop {
            if h_abs < min_step {
                return Err(SirError::SolverError(format!(
                    "required step size fell below {min_step:e} at t = {t}"
                )));
            }

            let mut t_new = t + h_abs * self.direction;
            let clamped = self.direction * (t_new - t_bound) >= 0.0;
            if clamped {
                t_new = t_bound;
            }
            let h = t_new - t;
            h_abs = h.abs();

            let (y_new, f_new) = self.rk_step(fun, h)?;
            if y_new.iter().any(|v| !v.is_finite()) {
                return Err(SirError::SolverError(format!(
                    "state became non-finite between t = {t} and t = {t_new}"
                )));
            }

            let err_norm = self.error_norm(&y_new, h, options);
            if err_norm < 1.0 {
                let mut factor = if err_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    MAX_FACTOR.min(SAFETY * err_norm.powf(error_exponent))
                };
                if step_rejected {
                    factor = factor.min(1.0);
                }

                let mut next_h_abs = h_abs * factor;
                // A step shortened only to land on a grid point says nothing about the
                // step size the solution supports.
                if clamped && !step_rejected {
                    next_h_abs = next_h_abs.max(proposed);
                }

                trace!("Accepted step t = {t} -> {t_new}, error norm {err_norm:e}");
                self.t = t_new;
                self.y = y_new;
                self.f = f_new;
                self.h_abs = next_h_abs;
                self.stats.steps += 1;
                return Ok(());
            }

            h_abs *= MIN_FACTOR.max(SAFETY * err_norm.powf(error_exponent));
            step_rejected = true;
            self.stats.rejected += 1;
        }
    }

    fn advance_to<F>(
        &mut self,
        fun: &mut F,
        t_target: f64,
        options: &SolverOptions,
    ) -> Result<(), SirError>
    where
        F: FnMut(f64, &[f64]) -> Vec<f64>,
    {
        while self.direction * (t_target - self.t) > 0.0 {
            self.step(fun, t_target, options)?;
        }
        Ok(())
    }
}

fn validate_grid(y0: &[f64], t_grid: &[f64]) -> Result<(), SirError> {
    if t_grid.is_empty() {
        return Err(SirError::SolverError(
            "time grid must contain at least one point".to_string(),
        ));
    }
    if t_grid.iter().any(|t| !t.is_finite()) {
        return Err(SirError::SolverError(
            "time grid must only contain finite values".to_string(),
        ));
    }
    if y0.iter().any(|y| !y.is_finite()) {
        return Err(SirError::SolverError(
            "initial state must only contain finite values".to_string(),
        ));
    }
    let increasing = t_grid.windows(2).all(|w| w[1] > w[0]);
    let decreasing = t_grid.windows(2).all(|w| w[1] < w[0]);
    if !(increasing || decreasing) {
        return Err(SirError::SolverError(
            "time grid must be strictly monotonic".to_string(),
        ));
    }
    Ok(())
}

/// Integrates `dy/dt = fun(t, y)` from `y(t_grid[0]) = y0` and returns one row per grid point.
/// The first row is `y0` itself.
///
/// # Errors
///
/// Returns `SirError::SolverError` if the grid is empty or not strictly monotonic, the
/// tolerances are invalid, the state becomes non-finite, or the step size underflows.
pub fn odeint<F>(
    fun: F,
    y0: &[f64],
    t_grid: &[f64],
    options: &SolverOptions,
) -> Result<Vec<Vec<f64>>, SirError>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    odeint_with_stats(fun, y0, t_grid, options).map(|(rows, _)| rows)
}

/// Same as [`odeint`], also returning the work counters.
///
/// # Errors
///
/// See [`odeint`].
pub fn odeint_with_stats<F>(
    mut fun: F,
    y0: &[f64],
    t_grid: &[f64],
    options: &SolverOptions,
) -> Result<(Vec<Vec<f64>>, SolverStats), SirError>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    options.validate()?;
    validate_grid(y0, t_grid)?;

    let mut rows = Vec::with_capacity(t_grid.len());
    rows.push(y0.to_vec());
    if t_grid.len() == 1 {
        return Ok((rows, SolverStats::default()));
    }

    let t_final = t_grid[t_grid.len() - 1];
    let mut solver = DormandPrince::new(&mut fun, t_grid[0], y0, t_final, options)?;
    for &t_target in &t_grid[1..] {
        solver.advance_to(&mut fun, t_target, options)?;
        rows.push(solver.y.clone());
    }

    debug!(
        "Integrated {} grid points: {} steps, {} rejected, {} evaluations",
        t_grid.len(),
        solver.stats.steps,
        solver.stats.rejected,
        solver.stats.nfev
    );
    Ok((rows, solver.stats))
}

/// `count` evenly spaced points over `[start, stop]`, both endpoints included.
#[must_use]
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            #[allow(clippy::cast_precision_loss)]
            let step = (stop - start) / (count - 1) as f64;
            #[allow(clippy::cast_precision_loss)]
            let mut grid: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
            // Land exactly on the endpoint despite rounding.
            grid[count - 1] = stop;
            grid
        }
    }
}
