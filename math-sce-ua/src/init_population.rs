use rand::Rng;

use crate::config::ComplexLayout;
use crate::objective::{Evaluator, Objective};
use crate::parameter_space::ParameterSpace;
use crate::population::PointSet;
use crate::sample_uniform::sample_uniform;
use crate::{Result, SCEError};

/// Samples and evaluates the initial population, ranked by fitness.
///
/// Slot 0 holds the configured initial values when `include_initial_guess`
/// is set. A slot whose evaluation fails is resampled uniformly, up to
/// `max_attempts` evaluations per slot.
///
/// # Errors
///
/// `SCEError::InitializationFailed` when a slot never yields a usable value.
pub(crate) fn init_population<O, R>(
    space: &ParameterSpace,
    layout: &ComplexLayout,
    include_initial_guess: bool,
    max_attempts: usize,
    eval: &mut Evaluator<'_, O>,
    rng: &mut R,
) -> Result<PointSet>
where
    O: Objective + ?Sized,
    R: Rng + ?Sized,
{
    let max_attempts = max_attempts.max(1);
    let mut candidates = Vec::with_capacity(layout.npt);
    for _ in 0..layout.npt {
        candidates.push(sample_uniform(space, max_attempts, rng));
    }
    if include_initial_guess {
        candidates[0] = space.initial().clone();
    }

    let mut pop = PointSet::zeros(layout.npt, layout.nopt);
    for (slot, mut x) in candidates.into_iter().enumerate() {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match eval.try_evaluate(&x) {
                Ok(f) => {
                    pop.set(slot, x.view(), f);
                    break;
                }
                Err(last_error) if attempts >= max_attempts => {
                    return Err(SCEError::InitializationFailed {
                        slot,
                        attempts,
                        last_error,
                    });
                }
                Err(_) => x = sample_uniform(space, max_attempts, rng),
            }
        }
    }
    pop.rank_points();
    Ok(pop)
}
