use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{Result, SCEError};

/// One calibrated parameter: its name, starting value and search interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name (used in reports).
    pub name: String,
    /// Initial value, injected into the population when
    /// `include_initial_guess` is set.
    pub initial: f64,
    /// Lower bound `bl`.
    pub lower: f64,
    /// Upper bound `bu`.
    pub upper: f64,
}

impl ParameterSpec {
    /// Creates a parameter description.
    pub fn new(name: impl Into<String>, initial: f64, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            initial,
            lower,
            upper,
        }
    }
}

/// Validated, box-shaped search space with `nopt` dimensions.
///
/// Every point the optimizer accepts lies inside this box, bounds included.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    names: Vec<String>,
    initial: Array1<f64>,
    lower: Array1<f64>,
    upper: Array1<f64>,
    bound: Array1<f64>,
}

impl ParameterSpace {
    /// Builds a space from parameter descriptions.
    ///
    /// # Errors
    ///
    /// Returns `SCEError::EmptyParameterSpace` for an empty slice and
    /// `SCEError::InvalidBounds` if any `lower >= upper` or a bound is not finite.
    pub fn new(specs: &[ParameterSpec]) -> Result<Self> {
        if specs.is_empty() {
            return Err(SCEError::EmptyParameterSpace);
        }
        for (index, p) in specs.iter().enumerate() {
            if !(p.lower.is_finite() && p.upper.is_finite() && p.lower < p.upper) {
                return Err(SCEError::InvalidBounds {
                    index,
                    name: p.name.clone(),
                    lower: p.lower,
                    upper: p.upper,
                });
            }
        }
        let names = specs.iter().map(|p| p.name.clone()).collect();
        let initial = specs.iter().map(|p| p.initial).collect::<Array1<f64>>();
        let lower = specs.iter().map(|p| p.lower).collect::<Array1<f64>>();
        let upper = specs.iter().map(|p| p.upper).collect::<Array1<f64>>();
        let bound = &upper - &lower;
        Ok(Self {
            names,
            initial,
            lower,
            upper,
            bound,
        })
    }

    /// Builds a space from `(lower, upper)` pairs.
    ///
    /// Parameters are named `x1..xn` and start at the interval midpoint.
    pub fn from_bounds(bounds: &[(f64, f64)]) -> Result<Self> {
        let specs: Vec<ParameterSpec> = bounds
            .iter()
            .enumerate()
            .map(|(i, &(lo, hi))| ParameterSpec::new(format!("x{}", i + 1), 0.5 * (lo + hi), lo, hi))
            .collect();
        Self::new(&specs)
    }

    /// Builds a space from separate lower/upper arrays.
    ///
    /// # Errors
    ///
    /// Returns `SCEError::BoundsMismatch` if the arrays differ in length.
    pub fn from_arrays(lower: &Array1<f64>, upper: &Array1<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(SCEError::BoundsMismatch {
                lower_len: lower.len(),
                upper_len: upper.len(),
            });
        }
        let pairs: Vec<(f64, f64)> = lower.iter().copied().zip(upper.iter().copied()).collect();
        Self::from_bounds(&pairs)
    }

    /// Replaces the initial values.
    ///
    /// # Errors
    ///
    /// Returns `SCEError::InitialGuessDimensionMismatch` on a length mismatch.
    pub fn with_initial(mut self, initial: Array1<f64>) -> Result<Self> {
        if initial.len() != self.nopt() {
            return Err(SCEError::InitialGuessDimensionMismatch {
                expected: self.nopt(),
                got: initial.len(),
            });
        }
        self.initial = initial;
        Ok(self)
    }

    /// Number of dimensions.
    pub fn nopt(&self) -> usize {
        self.lower.len()
    }

    /// Parameter names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Initial values.
    pub fn initial(&self) -> &Array1<f64> {
        &self.initial
    }

    /// Lower bounds `bl`.
    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    /// Upper bounds `bu`.
    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// Bound widths `bu - bl`.
    pub fn bound(&self) -> &Array1<f64> {
        &self.bound
    }

    /// True iff every coordinate lies inside its interval (inclusive).
    ///
    /// NaN coordinates are never feasible.
    pub fn is_feasible(&self, x: &Array1<f64>) -> bool {
        x.len() == self.nopt()
            && x
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }

    /// Projects `x` onto the box coordinate-wise.
    pub fn clamp(&self, x: &mut Array1<f64>) {
        for j in 0..x.len() {
            let v = x[j];
            x[j] = if v.is_nan() {
                0.5 * (self.lower[j] + self.upper[j])
            } else {
                v.clamp(self.lower[j], self.upper[j])
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_bounds_defaults() {
        let space = ParameterSpace::from_bounds(&[(-5.0, 5.0), (0.0, 2.0)]).unwrap();
        assert_eq!(space.nopt(), 2);
        assert_eq!(space.names(), &["x1".to_string(), "x2".to_string()]);
        assert_eq!(space.initial(), &array![0.0, 1.0]);
        assert_eq!(space.bound(), &array![10.0, 2.0]);
    }

    #[test]
    fn test_rejects_degenerate_and_inverted_bounds() {
        let err = ParameterSpace::from_bounds(&[(0.0, 1.0), (3.0, 3.0)]).unwrap_err();
        assert!(matches!(err, SCEError::InvalidBounds { index: 1, .. }));

        let err = ParameterSpace::from_bounds(&[(2.0, -2.0)]).unwrap_err();
        assert!(err.is_bounds_error());

        let err = ParameterSpace::from_bounds(&[(f64::NEG_INFINITY, 0.0)]).unwrap_err();
        assert!(err.is_bounds_error());

        assert!(matches!(
            ParameterSpace::new(&[]).unwrap_err(),
            SCEError::EmptyParameterSpace
        ));
    }

    #[test]
    fn test_from_arrays_mismatch() {
        let err = ParameterSpace::from_arrays(&array![0.0, 0.0], &array![1.0]).unwrap_err();
        assert!(matches!(
            err,
            SCEError::BoundsMismatch {
                lower_len: 2,
                upper_len: 1
            }
        ));
    }

    #[test]
    fn test_feasibility_is_inclusive() {
        let space = ParameterSpace::from_bounds(&[(-1.0, 1.0), (0.0, 4.0)]).unwrap();
        assert!(space.is_feasible(&array![-1.0, 4.0]));
        assert!(space.is_feasible(&array![0.3, 2.0]));
        assert!(!space.is_feasible(&array![1.0 + 1e-12, 2.0]));
        assert!(!space.is_feasible(&array![f64::NAN, 2.0]));
        assert!(!space.is_feasible(&array![0.0]));
    }

    #[test]
    fn test_clamp_projects_onto_box() {
        let space = ParameterSpace::from_bounds(&[(-1.0, 1.0), (0.0, 4.0)]).unwrap();
        let mut x = array![-3.0, 9.0];
        space.clamp(&mut x);
        assert_eq!(x, array![-1.0, 4.0]);
        assert!(space.is_feasible(&x));
    }

    #[test]
    fn test_with_initial_checks_length() {
        let space = ParameterSpace::from_bounds(&[(-1.0, 1.0)]).unwrap();
        assert!(space.clone().with_initial(array![0.5]).is_ok());
        let err = space.with_initial(array![0.5, 0.5]).unwrap_err();
        assert!(err.is_config_error());
    }
}
