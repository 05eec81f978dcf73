use ndarray::Array1;
use rand::Rng;

use crate::parameter_space::ParameterSpace;

/// Draws a point uniformly inside the parameter box.
///
/// A draw of `bl + u * (bu - bl)` with `u` in `[0, 1)` is feasible by
/// construction, so the feasibility check only guards against rounding.
/// After `max_attempts` infeasible draws the last one is clamped.
pub(crate) fn sample_uniform<R: Rng + ?Sized>(
    space: &ParameterSpace,
    max_attempts: usize,
    rng: &mut R,
) -> Array1<f64> {
    let n = space.nopt();
    let lower = space.lower();
    let bound = space.bound();
    let mut x = Array1::<f64>::zeros(n);
    for _ in 0..max_attempts.max(1) {
        for j in 0..n {
            let u: f64 = rng.random::<f64>();
            x[j] = lower[j] + u * bound[j];
        }
        if space.is_feasible(&x) {
            return x;
        }
    }
    space.clamp(&mut x);
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_uniform_samples_cover_box() {
        let space = ParameterSpace::from_bounds(&[(-5.0, 5.0), (100.0, 101.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut lo_half = 0;
        for _ in 0..1000 {
            let x = sample_uniform(&space, 10, &mut rng);
            assert!(space.is_feasible(&x));
            if x[0] < 0.0 {
                lo_half += 1;
            }
        }
        // roughly half of the draws land in each half of the first interval
        assert!((400..600).contains(&lo_half), "lo_half={}", lo_half);
    }

    #[test]
    fn test_uniform_is_reproducible() {
        let space = ParameterSpace::from_bounds(&[(0.0, 1.0); 3]).unwrap();
        let a = sample_uniform(&space, 10, &mut StdRng::seed_from_u64(42));
        let b = sample_uniform(&space, 10, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
