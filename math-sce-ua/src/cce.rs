//! Competitive Complex Evolution: the inner loop run on each complex.

use ndarray::{Array1, Axis, s};
use rand::Rng;

use crate::config::ComplexLayout;
use crate::objective::{Evaluator, Objective};
use crate::parameter_space::ParameterSpace;
use crate::population::PointSet;
use crate::sample_normal::sample_normal;
use crate::select_parents::select_parents;

/// Read-only inputs shared by every simplex step of one shuffle loop.
pub(crate) struct EvolutionContext<'s> {
    pub space: &'s ParameterSpace,
    pub layout: ComplexLayout,
    /// Standard deviation per dimension for Gaussian draws.
    pub spread: Array1<f64>,
    pub max_sample_attempts: usize,
}

impl<'s> EvolutionContext<'s> {
    /// `xnstd` is the population spread normalized by the bound widths; it is
    /// used as the Gaussian standard deviation without rescaling.
    pub(crate) fn new(
        space: &'s ParameterSpace,
        layout: ComplexLayout,
        xnstd: &Array1<f64>,
        max_sample_attempts: usize,
    ) -> Self {
        Self {
            space,
            layout,
            spread: xnstd.clone(),
            max_sample_attempts,
        }
    }
}

/// Which branch of a simplex step produced the new worst-slot point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexStep {
    /// The reflected point improved on the worst point.
    Reflection,
    /// The contracted point improved on the worst point.
    Contraction,
    /// A Gaussian point around the best replaced the worst one.
    Mutation,
    /// Every candidate failed to evaluate; the simplex is unchanged.
    MutationFailed,
}

/// Counters for the branches taken while evolving complexes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CceStats {
    /// Accepted reflections.
    pub reflections: usize,
    /// Accepted contractions.
    pub contractions: usize,
    /// Accepted mutations.
    pub mutations: usize,
    /// Mutations whose evaluation failed.
    pub failed_mutations: usize,
    /// Gaussian draws that fell back to clamping.
    pub clamped_draws: usize,
}

impl CceStats {
    pub(crate) fn record(&mut self, step: SimplexStep) {
        match step {
            SimplexStep::Reflection => self.reflections += 1,
            SimplexStep::Contraction => self.contractions += 1,
            SimplexStep::Mutation => self.mutations += 1,
            SimplexStep::MutationFailed => self.failed_mutations += 1,
        }
    }

    pub(crate) fn merge(&mut self, other: &CceStats) {
        self.reflections += other.reflections;
        self.contractions += other.contractions;
        self.mutations += other.mutations;
        self.failed_mutations += other.failed_mutations;
        self.clamped_draws += other.clamped_draws;
    }
}

fn gaussian_around<R: Rng + ?Sized>(
    center: &Array1<f64>,
    ctx: &EvolutionContext<'_>,
    stats: &mut CceStats,
    rng: &mut R,
) -> Array1<f64> {
    let draw = sample_normal(center, &ctx.spread, ctx.space, ctx.max_sample_attempts, rng);
    if draw.clamped {
        stats.clamped_draws += 1;
    } else if draw.attempts > 1 {
        log::trace!("Gaussian draw accepted after {} attempts", draw.attempts);
    }
    draw.point
}

/// One reflection / contraction / mutation step on a ranked simplex.
///
/// The worst point is replaced by the first candidate that improves on it,
/// or unconditionally by the mutation candidate. Candidates whose evaluation
/// fails are never accepted. The simplex is re-ranked before returning.
pub(crate) fn evolve_simplex<O, R>(
    simplex: &mut PointSet,
    ctx: &EvolutionContext<'_>,
    eval: &mut Evaluator<'_, O>,
    stats: &mut CceStats,
    rng: &mut R,
) -> SimplexStep
where
    O: Objective + ?Sized,
    R: Rng + ?Sized,
{
    let nps = simplex.len();
    let worst = nps - 1;
    let sb = simplex.point(0).to_owned();
    let sw = simplex.point(worst).to_owned();
    let fw = simplex.fitness[worst];

    // centroid of every point but the worst
    let ce = simplex.points.slice(s![..worst, ..]).sum_axis(Axis(0)) / worst as f64;

    let mut reflected = &ce * 2.0 - &sw;
    if !ctx.space.is_feasible(&reflected) {
        reflected = gaussian_around(&sb, ctx, stats, rng);
    }
    let step = match eval.evaluate(&reflected) {
        Some(f) if f < fw => {
            simplex.set(worst, reflected.view(), f);
            SimplexStep::Reflection
        }
        _ => {
            let contracted = (&ce + &sw) * 0.5;
            match eval.evaluate(&contracted) {
                Some(f) if f < fw => {
                    simplex.set(worst, contracted.view(), f);
                    SimplexStep::Contraction
                }
                _ => {
                    let mutated = gaussian_around(&sb, ctx, stats, rng);
                    match eval.evaluate(&mutated) {
                        Some(f) => {
                            simplex.set(worst, mutated.view(), f);
                            SimplexStep::Mutation
                        }
                        None => SimplexStep::MutationFailed,
                    }
                }
            }
        }
    };
    stats.record(step);
    simplex.rank_points();
    step
}

/// Evolves one ranked complex for `beta` simplex selections.
///
/// Each selection draws `nps` parents, runs `alpha` simplex steps on them,
/// writes them back to the slots they came from and re-ranks the complex.
pub(crate) fn cce<O, R>(
    complex: &mut PointSet,
    ctx: &EvolutionContext<'_>,
    eval: &mut Evaluator<'_, O>,
    rng: &mut R,
) -> CceStats
where
    O: Objective + ?Sized,
    R: Rng + ?Sized,
{
    let layout = ctx.layout;
    let mut stats = CceStats::default();
    let mut simplex = PointSet::zeros(layout.nps, layout.nopt);
    for _ in 0..layout.beta {
        let lcs = select_parents(layout.npg, layout.nps, rng);
        for (i, &k) in lcs.iter().enumerate() {
            simplex.copy_from(i, complex, k);
        }
        for _ in 0..layout.alpha {
            evolve_simplex(&mut simplex, ctx, eval, &mut stats, rng);
        }
        for (i, &k) in lcs.iter().enumerate() {
            complex.copy_from(k, &simplex, i);
        }
        complex.rank_points();
    }
    stats
}
