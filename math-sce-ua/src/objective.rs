//! Objective-function collaborators.
//!
//! The optimizer only needs `parameters -> fitness`. A calibration couples a
//! [`Simulator`] (any deterministic model producing a discharge series) with an
//! observed series through [`NashSutcliffeObjective`], which scores `1 - NSE`.

use ndarray::Array1;

use crate::EvaluationError;

/// A function to minimize over the parameter box.
///
/// Implementations must be deterministic in `x` for the convergence tests to
/// mean anything; any internal simulation state has to be rebuilt per call.
pub trait Objective {
    /// Evaluates the objective at `x`.
    ///
    /// A returned `Ok` value must be finite; the driver treats non-finite
    /// values the same as an `Err`.
    fn evaluate(&self, x: &Array1<f64>) -> Result<f64, EvaluationError>;
}

impl<F> Objective for F
where
    F: Fn(&Array1<f64>) -> f64,
{
    fn evaluate(&self, x: &Array1<f64>) -> Result<f64, EvaluationError> {
        let value = self(x);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvaluationError::NonFinite { value })
        }
    }
}

/// A deterministic model mapping parameters to a simulated series.
pub trait Simulator {
    /// Runs the model with `params` and returns the simulated series.
    fn simulate(&self, params: &Array1<f64>) -> Result<Array1<f64>, EvaluationError>;
}

/// Simulator backed by a closure.
pub struct FnSimulator<F>(pub F);

impl<F> Simulator for FnSimulator<F>
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>, EvaluationError>,
{
    fn simulate(&self, params: &Array1<f64>) -> Result<Array1<f64>, EvaluationError> {
        (self.0)(params)
    }
}

/// Nash-Sutcliffe efficiency of `simulated` against `observed`.
///
/// `NSE = 1 - sum((o - s)^2) / sum((o - mean(o))^2)`; 1 is a perfect fit,
/// 0 is no better than the observed mean.
pub fn nash_sutcliffe(observed: &Array1<f64>, simulated: &Array1<f64>) -> Result<f64, EvaluationError> {
    if simulated.is_empty() {
        return Err(EvaluationError::MissingOutput);
    }
    if observed.len() != simulated.len() {
        return Err(EvaluationError::LengthMismatch {
            observed: observed.len(),
            simulated: simulated.len(),
        });
    }
    let mean = observed.sum() / observed.len() as f64;
    let mut sse = 0.0;
    let mut sst = 0.0;
    for (&o, &s) in observed.iter().zip(simulated.iter()) {
        sse += (o - s) * (o - s);
        sst += (o - mean) * (o - mean);
    }
    if sst == 0.0 {
        return Err(EvaluationError::ConstantObservations);
    }
    let nse = 1.0 - sse / sst;
    if nse.is_finite() {
        Ok(nse)
    } else {
        Err(EvaluationError::NonFinite { value: nse })
    }
}

/// Calibration objective `1 - NSE(observed, simulator(x))`.
pub struct NashSutcliffeObjective<S> {
    simulator: S,
    observed: Array1<f64>,
}

impl<S: Simulator> NashSutcliffeObjective<S> {
    /// Couples a simulator with the observed series it should reproduce.
    pub fn new(simulator: S, observed: Array1<f64>) -> Self {
        Self {
            simulator,
            observed,
        }
    }

    /// The observed series.
    pub fn observed(&self) -> &Array1<f64> {
        &self.observed
    }

    /// The wrapped simulator.
    pub fn simulator(&self) -> &S {
        &self.simulator
    }
}

impl<S: Simulator> Objective for NashSutcliffeObjective<S> {
    fn evaluate(&self, x: &Array1<f64>) -> Result<f64, EvaluationError> {
        let simulated = self.simulator.simulate(x)?;
        nash_sutcliffe(&self.observed, &simulated).map(|nse| 1.0 - nse)
    }
}

/// Counts objective calls and filters out unusable results.
///
/// Every call increments `nfev`, failed ones also increment `nfail`.
pub(crate) struct Evaluator<'a, O: ?Sized> {
    objective: &'a O,
    pub nfev: usize,
    pub nfail: usize,
}

impl<'a, O: Objective + ?Sized> Evaluator<'a, O> {
    pub(crate) fn new(objective: &'a O) -> Self {
        Self {
            objective,
            nfev: 0,
            nfail: 0,
        }
    }

    /// Evaluates `x`; `None` means the point must not be accepted anywhere.
    pub(crate) fn evaluate(&mut self, x: &Array1<f64>) -> Option<f64> {
        self.nfev += 1;
        match self.objective.evaluate(x) {
            Ok(f) if f.is_finite() => Some(f),
            Ok(value) => {
                self.record_failure(x, &EvaluationError::NonFinite { value });
                None
            }
            Err(err) => {
                self.record_failure(x, &err);
                None
            }
        }
    }

    /// Same as [`evaluate`](Self::evaluate) but hands back the failure.
    pub(crate) fn try_evaluate(&mut self, x: &Array1<f64>) -> Result<f64, EvaluationError> {
        self.nfev += 1;
        let result = match self.objective.evaluate(x) {
            Ok(f) if f.is_finite() => Ok(f),
            Ok(value) => Err(EvaluationError::NonFinite { value }),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.record_failure(x, err);
        }
        result
    }

    fn record_failure(&mut self, x: &Array1<f64>, err: &EvaluationError) {
        self.nfail += 1;
        log::debug!(
            "evaluation {} failed at {:?}: {}",
            self.nfev,
            x.as_slice().unwrap_or(&[]),
            err
        );
    }
}
