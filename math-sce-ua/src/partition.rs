use crate::population::PointSet;

/// Population row holding slot `slot` of complex `complex_id`.
///
/// With the population ranked, complex `k` receives ranks `k, k+ngs, k+2*ngs, ...`
/// so every complex spans the whole fitness range.
#[inline]
pub(crate) fn population_index(complex_id: usize, ngs: usize, slot: usize) -> usize {
    complex_id + ngs * slot
}

/// Copies complex `complex_id` out of the population into `complex`.
///
/// `complex` must already have `npg` rows.
pub(crate) fn partition(population: &PointSet, complex_id: usize, ngs: usize, complex: &mut PointSet) {
    for slot in 0..complex.len() {
        let index = population_index(complex_id, ngs, slot);
        complex.copy_from(slot, population, index);
    }
}

/// Writes `complex` back to the population rows it was partitioned from.
pub(crate) fn shuffle(population: &mut PointSet, complex_id: usize, ngs: usize, complex: &PointSet) {
    for slot in 0..complex.len() {
        let index = population_index(complex_id, ngs, slot);
        population.copy_from(index, complex, slot);
    }
}
