// src/weighted.rs
//
// Weighted random selection over configuration-provided distributions.
// Weights are relative: they need not sum to 1.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

/// Pick one item from `(item, weight)` pairs.
///
/// Returns `None` when the slice is empty or no weight is usable
/// (all zero, negative or non-finite).
pub fn choose<'a, T, R: Rng + ?Sized>(items: &'a [(T, f64)], rng: &mut R) -> Option<&'a T> {
    let idx = choose_index(items.iter().map(|(_, w)| *w), rng)?;
    Some(&items[idx].0)
}

/// Pick an index according to `weights`.
pub fn choose_index<I, R>(weights: I, rng: &mut R) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
    R: Rng + ?Sized,
{
    let weights: Vec<f64> = weights.into_iter().collect();
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return None;
    }
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(dist.sample(rng))
}
