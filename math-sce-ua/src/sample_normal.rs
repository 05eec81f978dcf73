use ndarray::Array1;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::parameter_space::ParameterSpace;

/// Result of a bounded Gaussian rejection sampling.
#[derive(Debug, Clone)]
pub(crate) struct NormalDraw {
    /// The accepted point, always inside the box.
    pub point: Array1<f64>,
    /// Number of vectors drawn.
    pub attempts: usize,
    /// True when every draw was rejected and the last one was clamped.
    pub clamped: bool,
}

/// Draws `center + stddev * N(0, 1)` coordinate-wise until the whole vector
/// is feasible.
///
/// Infeasible vectors are rejected as a whole. After `max_attempts` rejected
/// vectors the last draw is clamped onto the box.
pub(crate) fn sample_normal<R: Rng + ?Sized>(
    center: &Array1<f64>,
    stddev: &Array1<f64>,
    space: &ParameterSpace,
    max_attempts: usize,
    rng: &mut R,
) -> NormalDraw {
    let n = space.nopt();
    let mut x = Array1::<f64>::zeros(n);
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        for j in 0..n {
            let z: f64 = rng.sample(StandardNormal);
            x[j] = center[j] + stddev[j] * z;
        }
        if space.is_feasible(&x) {
            return NormalDraw {
                point: x,
                attempts: attempt,
                clamped: false,
            };
        }
    }
    log::warn!(
        "Gaussian sampling rejected {} draws around {:?}; clamping last draw to bounds",
        max_attempts,
        center.as_slice().unwrap_or(&[])
    );
    space.clamp(&mut x);
    NormalDraw {
        point: x,
        attempts: max_attempts,
        clamped: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_small_spread_stays_near_center() {
        let space = ParameterSpace::from_bounds(&[(-5.0, 5.0), (-5.0, 5.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let center = array![1.0, -2.0];
        let stddev = array![0.01, 0.01];
        for _ in 0..200 {
            let draw = sample_normal(&center, &stddev, &space, 100, &mut rng);
            assert!(!draw.clamped);
            assert!(space.is_feasible(&draw.point));
            assert!((draw.point[0] - 1.0).abs() < 0.1);
            assert!((draw.point[1] + 2.0).abs() < 0.1);
        }
    }

    #[test]
    fn test_rejection_redraws_whole_vector() {
        // Center on the lower edge: about half the draws fall outside per dimension.
        let space = ParameterSpace::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let center = array![0.0, 0.0];
        let stddev = array![0.1, 0.1];
        let mut retried = false;
        for _ in 0..100 {
            let draw = sample_normal(&center, &stddev, &space, 1000, &mut rng);
            assert!(space.is_feasible(&draw.point));
            retried |= draw.attempts > 1;
        }
        assert!(retried);
    }

    #[test]
    fn test_pathological_spread_falls_back_to_clamp() {
        let space = ParameterSpace::from_bounds(&[(0.0, 1e-9); 4]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let center = array![0.0, 0.0, 0.0, 0.0];
        let stddev = array![1e6, 1e6, 1e6, 1e6];
        let draw = sample_normal(&center, &stddev, &space, 25, &mut rng);
        assert!(draw.clamped);
        assert_eq!(draw.attempts, 25);
        assert!(space.is_feasible(&draw.point));
    }
}
