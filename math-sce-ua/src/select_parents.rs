use rand::Rng;
use std::cmp::Ordering;

/// Picks `nps` distinct slots out of a ranked complex of `npg` points.
///
/// Slot `i` gets weight `npg - i` and the key `u^(1/w)` with `u ~ U[0,1)`;
/// the `nps` largest keys win. This is weighted sampling without replacement
/// with a trapezoidal preference for better-ranked points. The returned
/// indices are ascending, so the simplex inherits the complex's ranking.
pub(crate) fn select_parents<R: Rng + ?Sized>(npg: usize, nps: usize, rng: &mut R) -> Vec<usize> {
    debug_assert!(nps <= npg);
    let mut keyed: Vec<(usize, f64)> = (0..npg)
        .map(|i| {
            let w = (npg - i) as f64;
            let u: f64 = rng.random::<f64>();
            (i, u.powf(1.0 / w))
        })
        .collect();
    keyed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    let mut lcs: Vec<usize> = keyed.into_iter().take(nps).map(|(i, _)| i).collect();
    lcs.sort_unstable();
    lcs
}
