use ndarray::{Array1, Axis};
use std::fmt;

use crate::population::PointSet;

/// Guard against `ln(0)` when a dimension has collapsed completely.
const DELTA: f64 = 1e-20;

/// Per-dimension Gaussian spread used before the first loop.
pub const INITIAL_SPREAD: f64 = 0.1;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminationReason {
    /// The evaluation budget was used up.
    MaxEvaluations {
        /// The budget
        maxn: usize,
    },
    /// The best value stopped improving.
    Plateau {
        /// Window length in loops
        kstop: usize,
        /// Threshold on the relative change
        pcento: f64,
    },
    /// The population shrank into a tiny region of the parameter space.
    SpaceCollapse {
        /// Threshold on the normalized geometric range
        peps: f64,
    },
    /// A user callback asked to stop.
    Callback,
}

impl TerminationReason {
    /// True for the two convergence criteria.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            TerminationReason::Plateau { .. } | TerminationReason::SpaceCollapse { .. }
        )
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::MaxEvaluations { maxn } => {
                write!(f, "search stopped: evaluation budget of {} trials exhausted", maxn)
            }
            TerminationReason::Plateau { kstop, pcento } => write!(
                f,
                "converged on objective value: best value changed by less than {} over the last {} loops",
                pcento, kstop
            ),
            TerminationReason::SpaceCollapse { peps } => write!(
                f,
                "converged in parameter space: normalized population range below {}",
                peps
            ),
            TerminationReason::Callback => write!(f, "stopped by callback"),
        }
    }
}

/// Per-dimension statistics of a population.
#[derive(Debug, Clone)]
pub struct PopulationSpread {
    /// Largest coordinate per dimension.
    pub xmax: Array1<f64>,
    /// Smallest coordinate per dimension.
    pub xmin: Array1<f64>,
    /// Mean coordinate per dimension.
    pub xmean: Array1<f64>,
    /// Standard deviation divided by the bound width.
    pub xnstd: Array1<f64>,
    /// Geometric mean of `(max - min) / bound` over dimensions.
    pub gnrng: f64,
}

/// Computes the spread of `population` relative to the bound widths.
pub fn population_spread(population: &PointSet, bound: &Array1<f64>) -> PopulationSpread {
    let pts = &population.points;
    let nopt = pts.ncols();
    let npt = pts.nrows() as f64;
    let xmax = pts.fold_axis(Axis(0), f64::NEG_INFINITY, |&a, &b| a.max(b));
    let xmin = pts.fold_axis(Axis(0), f64::INFINITY, |&a, &b| a.min(b));
    let xmean = pts.sum_axis(Axis(0)) / npt;
    let mut xnstd = Array1::<f64>::zeros(nopt);
    let mut gsum = 0.0;
    for j in 0..nopt {
        let col = pts.column(j);
        let sum2 = col.iter().map(|v| v * v).sum::<f64>();
        let var = (sum2 / npt - xmean[j] * xmean[j]).max(0.0);
        xnstd[j] = var.sqrt() / bound[j];
        gsum += (DELTA + (xmax[j] - xmin[j]) / bound[j]).ln();
    }
    let gnrng = (gsum / nopt as f64).exp();
    PopulationSpread {
        xmax,
        xmin,
        xmean,
        xnstd,
        gnrng,
    }
}

/// Stopping rules checked after every shuffle loop.
///
/// The run continues while `nfev < maxn`, the plateau ratio exceeds `pcento`
/// and the geometric range exceeds `peps`. Any one failing stops it.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceMonitor {
    /// Evaluation budget.
    pub maxn: usize,
    /// Plateau window in loops.
    pub kstop: usize,
    /// Plateau threshold.
    pub pcento: f64,
    /// Space-collapse threshold.
    pub peps: f64,
}

impl ConvergenceMonitor {
    /// Checks the three criteria in order budget, plateau, collapse.
    pub fn check(&self, nfev: usize, ratio: Option<f64>, gnrng: f64) -> Option<TerminationReason> {
        if nfev >= self.maxn {
            return Some(TerminationReason::MaxEvaluations { maxn: self.maxn });
        }
        if ratio.is_some_and(|r| r < self.pcento) {
            return Some(TerminationReason::Plateau {
                kstop: self.kstop,
                pcento: self.pcento,
            });
        }
        if gnrng < self.peps {
            return Some(TerminationReason::SpaceCollapse { peps: self.peps });
        }
        None
    }

    /// True when the evaluation budget is used up.
    pub fn budget_exhausted(&self, nfev: usize) -> bool {
        nfev >= self.maxn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn monitor() -> ConvergenceMonitor {
        ConvergenceMonitor {
            maxn: 100,
            kstop: 5,
            pcento: 0.1,
            peps: 0.001,
        }
    }

    #[test]
    fn test_spread_statistics() {
        let pop = PointSet {
            points: array![[0.0, 1.0], [2.0, 1.0], [4.0, 1.0], [6.0, 1.0]],
            fitness: array![0.0, 1.0, 2.0, 3.0],
        };
        let bound = array![10.0, 2.0];
        let s = population_spread(&pop, &bound);
        assert_eq!(s.xmax, array![6.0, 1.0]);
        assert_eq!(s.xmin, array![0.0, 1.0]);
        assert_eq!(s.xmean, array![3.0, 1.0]);
        // population std of 0,2,4,6 is sqrt(5)
        assert!((s.xnstd[0] - 5f64.sqrt() / 10.0).abs() < 1e-12);
        assert!(s.xnstd[1].abs() < 1e-12);
        // second dimension collapsed: geometric mean of 0.6 and 1e-20
        let expected = ((0.6f64 + DELTA).ln() + DELTA.ln()) / 2.0;
        assert!((s.gnrng - expected.exp()).abs() < 1e-15);
        assert!(s.gnrng < 1e-9);
    }

    #[test]
    fn test_full_spread_is_one() {
        let pop = PointSet {
            points: array![[-5.0, 0.0], [5.0, 1.0]],
            fitness: array![0.0, 0.0],
        };
        let s = population_spread(&pop, &array![10.0, 1.0]);
        assert!((s.gnrng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_check_precedence() {
        let m = monitor();
        assert_eq!(m.check(10, None, 0.5), None);
        assert_eq!(m.check(10, Some(0.5), 0.5), None);
        assert_eq!(
            m.check(100, Some(0.0), 0.0),
            Some(TerminationReason::MaxEvaluations { maxn: 100 })
        );
        assert_eq!(
            m.check(10, Some(0.05), 0.0),
            Some(TerminationReason::Plateau {
                kstop: 5,
                pcento: 0.1
            })
        );
        assert_eq!(
            m.check(10, Some(0.5), 0.0001),
            Some(TerminationReason::SpaceCollapse { peps: 0.001 })
        );
        assert!(m.budget_exhausted(100));
        assert!(!m.budget_exhausted(99));
    }

    #[test]
    fn test_reasons_have_distinct_messages() {
        let reasons = [
            TerminationReason::MaxEvaluations { maxn: 50 },
            TerminationReason::Plateau {
                kstop: 15,
                pcento: 0.1,
            },
            TerminationReason::SpaceCollapse { peps: 0.001 },
            TerminationReason::Callback,
        ];
        let messages: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
        for i in 0..messages.len() {
            for j in (i + 1)..messages.len() {
                assert_ne!(messages[i], messages[j]);
            }
        }
        assert!(messages[0].contains("50"));
        assert!(reasons[1].is_converged());
        assert!(reasons[2].is_converged());
        assert!(!reasons[0].is_converged());
        assert!(!reasons[3].is_converged());
    }
}
