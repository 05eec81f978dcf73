//! Shuffled Complex Evolution (SCE-UA) optimization library.
//!
//! This crate provides a Rust implementation of the SCE-UA global optimizer
//! (Duan, Sorooshian and Gupta), built to calibrate the free parameters of a
//! deterministic rainfall-runoff simulator by minimizing `1 - NSE` over a
//! bounded parameter box. Any objective implementing [`Objective`] (including
//! plain closures) can be minimized.
//!
//! # Features
//!
//! - Stride partitioning of a ranked population into complexes
//! - Competitive complex evolution with reflection, contraction and mutation
//! - Bounded rejection sampling inside the parameter box
//! - Budget, plateau and parameter-space-collapse stopping rules
//! - Reproducible parallel complex evolution
//! - Nash-Sutcliffe calibration objective over a pluggable simulator
//!
//! # Example
//!
//! ```rust
//! use math_audio_sce_ua::{shuffled_complex_evolution, SCEConfigBuilder};
//!
//! // Minimize the sphere function: f(x) = sum(x_i^2)
//! let bounds = vec![(-5.0, 5.0), (-5.0, 5.0)];
//! let config = SCEConfigBuilder::new()
//!     .maxn(3000)
//!     .seed(42)
//!     .build()
//!     .expect("invalid config");
//!
//! let result = shuffled_complex_evolution(
//!     &|x: &ndarray::Array1<f64>| x.iter().map(|&xi| xi * xi).sum::<f64>(),
//!     &bounds,
//!     config,
//! ).expect("optimization should succeed");
//!
//! assert!(result.fun < 1e-3);
//! ```
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod error;
pub use error::{EvaluationError, Result, SCEError};

use std::fmt;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Parameter names, bounds and the feasibility check.
pub mod parameter_space;
/// Uniform sampling inside the parameter box.
pub(crate) mod sample_uniform;
/// Bounded Gaussian sampling around a center point.
pub(crate) mod sample_normal;
/// Fitness-ranked point sets (population, complexes, simplexes).
pub mod population;
/// Stride partitioning of the population into complexes.
pub(crate) mod partition;
/// Rank-biased selection of simplex parents.
pub(crate) mod select_parents;
/// Population initialization.
pub(crate) mod init_population;
/// Objective and simulator contracts, Nash-Sutcliffe efficiency.
pub mod objective;
/// Configuration, builder and calibration files.
pub mod config;
/// Per-loop run history.
pub mod history;
/// Stopping rules and population spread.
pub mod convergence;
/// Competitive complex evolution.
pub mod cce;
/// Parallel complex evolution.
pub mod parallel_eval;
/// Convenience entry points.
pub mod shuffled_complex_evolution;
/// Benchmark objectives with known minima.
pub mod function_registry;

pub use cce::{CceStats, SimplexStep};
pub use config::{CalibrationConfig, ComplexLayout, SCEConfig, SCEConfigBuilder};
pub use convergence::{ConvergenceMonitor, PopulationSpread, TerminationReason, population_spread};
pub use history::{LoopRecord, RunHistory};
pub use objective::{FnSimulator, NashSutcliffeObjective, Objective, Simulator, nash_sutcliffe};
pub use parallel_eval::ParallelConfig;
pub use parameter_space::{ParameterSpace, ParameterSpec};
pub use population::{PointSet, Population};
pub use shuffled_complex_evolution::{calibrate, shuffled_complex_evolution};

use cce::{EvolutionContext, cce};
use convergence::INITIAL_SPREAD;
use init_population::init_population;
use objective::Evaluator;
use parallel_eval::evolve_complexes_parallel;
use partition::{partition, shuffle};


/// Callback invoked after each shuffle loop; may stop the run.
pub type CallbackFn = Box<dyn FnMut(&SCEIntermediate) -> CallbackAction>;

/// Result/report of an SCE-UA run.
///
/// Contains the best point, the termination reason and the per-loop trace.
#[derive(Clone)]
pub struct SCEReport {
    /// The best parameter vector found.
    pub x: Array1<f64>,
    /// The objective value at `x`.
    pub fun: f64,
    /// Whether the run converged (plateau or parameter-space collapse).
    pub success: bool,
    /// Why the run stopped.
    pub reason: TerminationReason,
    /// Human-readable status message.
    pub message: String,
    /// Number of shuffle loops performed.
    pub nloop: usize,
    /// Number of objective evaluations performed.
    pub nfev: usize,
    /// Number of evaluations that failed and were discarded.
    pub nfail: usize,
    /// Branch counters of the simplex steps.
    pub stats: CceStats,
    /// Incumbent trace, one record per loop (loop 0 is the initial population).
    pub history: RunHistory,
    /// Final population matrix (npt x nopt), ranked.
    pub population: Array2<f64>,
    /// Fitness values for each population member.
    pub population_fitness: Array1<f64>,
}

impl fmt::Debug for SCEReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SCEReport")
            .field("x", &format!("len={}", self.x.len()))
            .field("fun", &self.fun)
            .field("success", &self.success)
            .field("reason", &self.reason)
            .field("message", &self.message)
            .field("nloop", &self.nloop)
            .field("nfev", &self.nfev)
            .field("nfail", &self.nfail)
            .field("stats", &self.stats)
            .field("history", &format!("len={}", self.history.len()))
            .field(
                "population",
                &format!("{}x{}", self.population.nrows(), self.population.ncols()),
            )
            .finish()
    }
}

/// Information passed to the callback after each shuffle loop.
pub struct SCEIntermediate {
    /// Current best parameter vector.
    pub x: Array1<f64>,
    /// Current best objective value.
    pub fun: f64,
    /// Shuffle loop just completed.
    pub nloop: usize,
    /// Objective evaluations so far.
    pub nfev: usize,
    /// Plateau ratio (None until `kstop` loops have run).
    pub ratio: Option<f64>,
    /// Normalized geometric range of the population.
    pub gnrng: f64,
}

/// Action returned by callback to control optimization flow.
pub enum CallbackAction {
    /// Continue optimization.
    Continue,
    /// Stop optimization early.
    Stop,
}

/// SCE-UA optimizer.
///
/// Use [`ShuffledComplexEvolution::new`] to create an instance, configure
/// with [`config_mut`](Self::config_mut), then call [`solve`](Self::solve).
pub struct ShuffledComplexEvolution<'a, O>
where
    O: Objective + Sync + ?Sized,
{
    objective: &'a O,
    space: ParameterSpace,
    config: SCEConfig,
}

impl<'a, O> ShuffledComplexEvolution<'a, O>
where
    O: Objective + Sync + ?Sized,
{
    /// Creates an optimizer for `objective` over `space` with the default
    /// configuration.
    pub fn new(objective: &'a O, space: ParameterSpace) -> Self {
        Self {
            objective,
            space,
            config: SCEConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: SCEConfig) -> Self {
        self.config = config;
        self
    }

    /// Mutable access to configuration
    pub fn config_mut(&mut self) -> &mut SCEConfig {
        &mut self.config
    }

    /// The parameter space being searched.
    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    /// Runs the optimization with a generator built from `config.seed`
    /// (or seeded from the OS when unset).
    ///
    /// # Errors
    ///
    /// See [`solve_with_rng`](Self::solve_with_rng).
    pub fn solve(&mut self) -> Result<SCEReport> {
        let mut rng: StdRng = match self.config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => {
                let mut thread_rng = rand::rng();
                StdRng::from_rng(&mut thread_rng)
            }
        };
        self.solve_with_rng(&mut rng)
    }

    /// Runs the optimization drawing every random number from `rng`.
    ///
    /// # Errors
    ///
    /// `SCEError::InvalidSetting` for an inconsistent configuration and
    /// `SCEError::InitializationFailed` when the initial population cannot be
    /// evaluated. Evaluation failures after initialization are not errors;
    /// they are counted in [`SCEReport::nfail`].
    pub fn solve_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<SCEReport> {
        let layout = self.config.layout(self.space.nopt())?;
        if self.config.max_sample_attempts == 0 {
            return Err(SCEError::InvalidSetting {
                name: "max_sample_attempts",
                value: 0,
                reason: "must be >= 1",
            });
        }
        let max_attempts = self.config.max_sample_attempts;
        let monitor = ConvergenceMonitor {
            maxn: self.config.maxn,
            kstop: self.config.kstop,
            pcento: self.config.pcento,
            peps: self.config.peps,
        };

        // Configure global rayon thread pool once if requested
        if self.config.parallel.enabled {
            if let Some(n) = self.config.parallel.num_threads {
                // Ignore error if global pool already set
                let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
            }
        }

        log::info!(
            "SCE-UA start: nopt={} ngs={} npg={} nps={} alpha={} beta={} npt={} maxn={}",
            layout.nopt,
            layout.ngs,
            layout.npg,
            layout.nps,
            layout.alpha,
            layout.beta,
            layout.npt,
            monitor.maxn
        );
        if self.config.disp {
            eprintln!(
                "SCE Init: {} dimensions, {} complexes of {} points, population={}, maxn={}",
                layout.nopt, layout.ngs, layout.npg, layout.npt, monitor.maxn
            );
            eprintln!(
                "  Simplex: nps={}, alpha={}, beta={}",
                layout.nps, layout.alpha, layout.beta
            );
            eprintln!(
                "  Stopping: kstop={}, pcento={:.2e}, peps={:.2e}",
                monitor.kstop, monitor.pcento, monitor.peps
            );
        }

        let mut eval = Evaluator::new(self.objective);
        let mut population = init_population(
            &self.space,
            &layout,
            self.config.include_initial_guess,
            max_attempts,
            &mut eval,
            rng,
        )?;

        let bound = self.space.bound().clone();
        let spread = population_spread(&population, &bound);
        let mut history = RunHistory::with_capacity(monitor.maxn / (layout.ngs * layout.beta) + 1);
        let (best_x, best_f) = population.best();
        history.push(LoopRecord {
            nloop: 0,
            nfev: eval.nfev,
            x: best_x,
            fun: best_f,
            ratio: None,
            gnrng: spread.gnrng,
        });
        if self.config.disp {
            eprintln!(
                "SCE loop {:4}  nfev={:6}  best_f={:.6e}  gnrng={:.3e}",
                0, eval.nfev, best_f, spread.gnrng
            );
        }

        let mut xnstd = Array1::from_elem(layout.nopt, INITIAL_SPREAD);
        let mut stats = CceStats::default();
        let mut nloop = 0;

        let reason = if monitor.budget_exhausted(eval.nfev) {
            TerminationReason::MaxEvaluations { maxn: monitor.maxn }
        } else {
            loop {
                nloop += 1;
                let ctx = EvolutionContext::new(&self.space, layout, &xnstd, max_attempts);

                if self.config.parallel.enabled {
                    let seeds: Vec<u64> = (0..layout.ngs).map(|_| rng.random::<u64>()).collect();
                    let outcomes = evolve_complexes_parallel(&population, &ctx, self.objective, &seeds);
                    for (k, outcome) in outcomes.iter().enumerate() {
                        shuffle(&mut population, k, layout.ngs, &outcome.complex);
                        eval.nfev += outcome.nfev;
                        eval.nfail += outcome.nfail;
                        stats.merge(&outcome.stats);
                    }
                } else {
                    let mut complex = PointSet::zeros(layout.npg, layout.nopt);
                    for k in 0..layout.ngs {
                        if monitor.budget_exhausted(eval.nfev) {
                            log::debug!(
                                "loop {}: budget reached before complex {}, skipping the rest",
                                nloop,
                                k
                            );
                            break;
                        }
                        partition(&population, k, layout.ngs, &mut complex);
                        let complex_stats = cce(&mut complex, &ctx, &mut eval, rng);
                        stats.merge(&complex_stats);
                        shuffle(&mut population, k, layout.ngs, &complex);
                    }
                }

                population.rank_points();
                let spread = population_spread(&population, &bound);
                let (best_x, best_f) = population.best();
                let ratio = history.plateau_ratio_with(best_f, monitor.kstop);
                xnstd = spread.xnstd;

                log::debug!(
                    "loop {}: nfev={} best_f={:.6e} ratio={:?} gnrng={:.3e}",
                    nloop,
                    eval.nfev,
                    best_f,
                    ratio,
                    spread.gnrng
                );
                if self.config.disp {
                    match ratio {
                        Some(r) => eprintln!(
                            "SCE loop {:4}  nfev={:6}  best_f={:.6e}  ratio={:.3e}  gnrng={:.3e}",
                            nloop, eval.nfev, best_f, r, spread.gnrng
                        ),
                        None => eprintln!(
                            "SCE loop {:4}  nfev={:6}  best_f={:.6e}  gnrng={:.3e}",
                            nloop, eval.nfev, best_f, spread.gnrng
                        ),
                    }
                }

                history.push(LoopRecord {
                    nloop,
                    nfev: eval.nfev,
                    x: best_x.clone(),
                    fun: best_f,
                    ratio,
                    gnrng: spread.gnrng,
                });

                let mut stop = monitor.check(eval.nfev, ratio, spread.gnrng);
                if let Some(ref mut cb) = self.config.callback {
                    let intermediate = SCEIntermediate {
                        x: best_x,
                        fun: best_f,
                        nloop,
                        nfev: eval.nfev,
                        ratio,
                        gnrng: spread.gnrng,
                    };
                    if let CallbackAction::Stop = cb(&intermediate) {
                        stop = stop.or(Some(TerminationReason::Callback));
                    }
                }
                if let Some(reason) = stop {
                    break reason;
                }
            }
        };

        let message = reason.to_string();
        log::info!(
            "SCE-UA finished after {} loops and {} evaluations ({} failed): {}",
            nloop,
            eval.nfev,
            eval.nfail,
            message
        );
        if self.config.disp {
            eprintln!("SCE finished: {}", message);
        }
        if stats.clamped_draws > 0 {
            log::warn!(
                "{} Gaussian draws were clamped to the bounds after {} rejected attempts",
                stats.clamped_draws,
                max_attempts
            );
        }

        let (x, fun) = population.best();
        Ok(SCEReport {
            x,
            fun,
            success: reason.is_converged(),
            reason,
            message,
            nloop,
            nfev: eval.nfev,
            nfail: eval.nfail,
            stats,
            history,
            population: population.points,
            population_fitness: population.fitness,
        })
    }
}
