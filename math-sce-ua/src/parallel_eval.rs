use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cce::{CceStats, EvolutionContext, cce};
use crate::objective::{Evaluator, Objective};
use crate::partition::partition;
use crate::population::PointSet;

/// Parallel complex evolution configuration
///
/// With `enabled`, every complex of a loop is evolved before the budget is
/// checked again, so a run may exceed `maxn` by up to `ngs * 3 * alpha * beta`
/// evaluations instead of one complex's worth in sequential mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Evolve the complexes of a shuffle loop concurrently
    pub enabled: bool,
    /// Number of threads to use (None = use rayon default)
    pub num_threads: Option<usize>,
}

/// A complex after its CCE pass, with the work it cost.
pub(crate) struct ComplexOutcome {
    pub complex: PointSet,
    pub nfev: usize,
    pub nfail: usize,
    pub stats: CceStats,
}

/// Evolves every complex of `population` concurrently.
///
/// Complex `k` is partitioned into a private copy and driven by its own
/// generator seeded with `seeds[k]`, so the outcome does not depend on
/// thread scheduling. Outcomes are returned in complex order; the caller
/// shuffles them back.
pub(crate) fn evolve_complexes_parallel<O>(
    population: &PointSet,
    ctx: &EvolutionContext<'_>,
    objective: &O,
    seeds: &[u64],
) -> Vec<ComplexOutcome>
where
    O: Objective + Sync + ?Sized,
{
    let layout = ctx.layout;
    // Always use global thread pool (configured once in solver)
    seeds
        .par_iter()
        .enumerate()
        .map(|(k, &seed)| {
            let mut complex = PointSet::zeros(layout.npg, layout.nopt);
            partition(population, k, layout.ngs, &mut complex);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut eval = Evaluator::new(objective);
            let stats = cce(&mut complex, ctx, &mut eval, &mut rng);
            ComplexOutcome {
                complex,
                nfev: eval.nfev,
                nfail: eval.nfail,
                stats,
            }
        })
        .collect()
}
