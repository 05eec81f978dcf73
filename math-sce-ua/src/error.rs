//! Error types for the SCE-UA optimizer.
//!
//! Two families are kept apart: [`SCEError`] covers fatal problems detected
//! before (or while setting up) a run, [`EvaluationError`] covers a single
//! objective call that could not produce a usable fitness. The latter never
//! aborts a run; the driver counts it and moves on.

use thiserror::Error;

/// Fatal errors raised while configuring or initializing an SCE-UA run.
#[derive(Debug, Error)]
pub enum SCEError {
    /// The parameter space has no dimensions.
    #[error("parameter space is empty (nopt must be >= 1)")]
    EmptyParameterSpace,

    /// Lower and upper bounds have different lengths.
    #[error("bounds mismatch: lower has {lower_len} elements, upper has {upper_len}")]
    BoundsMismatch {
        /// Length of the lower bounds array
        lower_len: usize,
        /// Length of the upper bounds array
        upper_len: usize,
    },

    /// A lower bound is not strictly below its upper bound, or is not finite.
    #[error("invalid bounds for parameter {index} ({name}): lower ({lower}) must be < upper ({upper})")]
    InvalidBounds {
        /// Index of the invalid bound pair
        index: usize,
        /// Name of the parameter
        name: String,
        /// The lower bound value
        lower: f64,
        /// The upper bound value
        upper: f64,
    },

    /// A complex-layout or convergence setting is out of range.
    #[error("invalid setting {name} = {value}: {reason}")]
    InvalidSetting {
        /// Name of the offending setting
        name: &'static str,
        /// The rejected value
        value: usize,
        /// Why it was rejected
        reason: &'static str,
    },

    /// A convergence threshold is negative or not finite.
    #[error("invalid threshold {name} = {value}: {reason}")]
    InvalidThreshold {
        /// Name of the offending threshold
        name: &'static str,
        /// The rejected value
        value: f64,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Initial guess has the wrong dimension.
    #[error("initial guess dimension mismatch: expected {expected}, got {got}")]
    InitialGuessDimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        got: usize,
    },

    /// Could not find an initial point with a usable objective value.
    #[error("population slot {slot} could not be initialized after {attempts} evaluations: {last_error}")]
    InitializationFailed {
        /// Population slot that stayed empty
        slot: usize,
        /// Number of evaluations spent on it
        attempts: usize,
        /// The last evaluation failure
        last_error: EvaluationError,
    },

    /// Reading or parsing a calibration file failed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for SCE-UA operations.
pub type Result<T> = std::result::Result<T, SCEError>;

impl SCEError {
    /// Returns `true` if this is a bounds-related error.
    ///
    /// This includes `EmptyParameterSpace`, `BoundsMismatch` and `InvalidBounds`.
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            SCEError::EmptyParameterSpace
                | SCEError::BoundsMismatch { .. }
                | SCEError::InvalidBounds { .. }
        )
    }

    /// Returns `true` if this is a configuration-related error.
    ///
    /// This includes `InvalidSetting`, `InvalidThreshold`,
    /// `InitialGuessDimensionMismatch` and `Config`.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SCEError::InvalidSetting { .. }
                | SCEError::InvalidThreshold { .. }
                | SCEError::InitialGuessDimensionMismatch { .. }
                | SCEError::Config(_)
        )
    }
}

/// Recoverable failure of a single objective evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The objective returned NaN or an infinity.
    #[error("objective returned a non-finite value ({value})")]
    NonFinite {
        /// The value that was returned
        value: f64,
    },

    /// The simulator produced no output.
    #[error("simulator produced no output")]
    MissingOutput,

    /// Simulated and observed series differ in length.
    #[error("series length mismatch: observed has {observed}, simulated has {simulated}")]
    LengthMismatch {
        /// Length of the observed series
        observed: usize,
        /// Length of the simulated series
        simulated: usize,
    },

    /// Observed series has zero variance, so NSE is undefined.
    #[error("observed series is constant; Nash-Sutcliffe efficiency is undefined")]
    ConstantObservations,

    /// Any other failure reported by a simulator.
    #[error("simulation failed: {0}")]
    Simulation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SCEError::BoundsMismatch {
            lower_len: 3,
            upper_len: 5,
        };
        assert_eq!(
            err.to_string(),
            "bounds mismatch: lower has 3 elements, upper has 5"
        );

        let err = SCEError::InvalidSetting {
            name: "nps",
            value: 1,
            reason: "a simplex needs at least 2 points",
        };
        assert_eq!(
            err.to_string(),
            "invalid setting nps = 1: a simplex needs at least 2 points"
        );
    }

    #[test]
    fn test_is_bounds_error() {
        let bounds_err = SCEError::InvalidBounds {
            index: 0,
            name: "x1".into(),
            lower: 2.0,
            upper: 2.0,
        };
        let config_err = SCEError::InvalidSetting {
            name: "ngs",
            value: 0,
            reason: "must be >= 1",
        };

        assert!(bounds_err.is_bounds_error());
        assert!(SCEError::EmptyParameterSpace.is_bounds_error());
        assert!(!config_err.is_bounds_error());
    }

    #[test]
    fn test_is_config_error() {
        let config_err = SCEError::InitialGuessDimensionMismatch {
            expected: 3,
            got: 2,
        };
        let init_err = SCEError::InitializationFailed {
            slot: 4,
            attempts: 10,
            last_error: EvaluationError::MissingOutput,
        };

        assert!(config_err.is_config_error());
        let threshold_err = SCEError::InvalidThreshold {
            name: "pcento",
            value: f64::NAN,
            reason: "must be finite and >= 0",
        };
        assert!(threshold_err.is_config_error());
        assert!(!threshold_err.is_bounds_error());
        assert_eq!(
            threshold_err.to_string(),
            "invalid threshold pcento = NaN: must be finite and >= 0"
        );
        assert!(SCEError::Config("bad json".into()).is_config_error());
        assert!(!init_err.is_config_error());
        assert!(!init_err.is_bounds_error());
    }

    #[test]
    fn test_evaluation_error_display() {
        let err = EvaluationError::LengthMismatch {
            observed: 10,
            simulated: 9,
        };
        assert_eq!(
            err.to_string(),
            "series length mismatch: observed has 10, simulated has 9"
        );
        assert_eq!(
            EvaluationError::NonFinite { value: f64::NAN }.to_string(),
            "objective returned a non-finite value (NaN)"
        );
    }
}
