//! Distance combinators for building adapter distance functions.
//!
//! Adapters usually score a construct by scoring a few of its parts (a loop's
//! condition, its body, the names it declares) and folding the sub-scores
//! together with fixed weights. These helpers keep those formulas short.

use core::hash::Hash;

use rapidhash::RapidHashSet as HashSet;

use crate::lcs::longest_common_subsequence;

/// Clamp a distance into `[0, 1]`. NaN counts as maximally distant.
#[inline]
pub fn clamp_unit(d: f64) -> f64 {
    if d.is_nan() { 1.0 } else { d.clamp(0.0, 1.0) }
}

/// Distance between two sequences: `1 - 2·|LCS| / (|old| + |new|)`.
///
/// Two empty sequences are identical.
pub fn sequence_distance<T: PartialEq>(old: &[T], new: &[T]) -> f64 {
    sequence_distance_by(old, new, |a, b| a == b)
}

/// Like [`sequence_distance`] with a custom equality.
pub fn sequence_distance_by<A, B>(old: &[A], new: &[B], mut eq: impl FnMut(&A, &B) -> bool) -> f64 {
    let total = old.len() + new.len();
    if total == 0 {
        return 0.0;
    }
    let common = longest_common_subsequence(old.len(), new.len(), |i, j| eq(&old[i], &new[j])).len();
    1.0 - (2 * common) as f64 / total as f64
}

/// Dice distance between two sets: `1 - 2·|old ∩ new| / (|old| + |new|)`.
///
/// Used for "how many locally declared names survived the edit". Duplicates
/// are collapsed; two empty sets are identical.
pub fn set_distance<T: Eq + Hash>(
    old: impl IntoIterator<Item = T>,
    new: impl IntoIterator<Item = T>,
) -> f64 {
    let old: HashSet<T> = old.into_iter().collect();
    let new: HashSet<T> = new.into_iter().collect();
    let total = old.len() + new.len();
    if total == 0 {
        return 0.0;
    }
    let common = old.iter().filter(|item| new.contains(*item)).count();
    1.0 - (2 * common) as f64 / total as f64
}

/// Weighted mean of `(weight, distance)` terms, clamped into `[0, 1]`.
///
/// Weights need not sum to one. A zero total weight yields 0.
pub fn weighted(terms: &[(f64, f64)]) -> f64 {
    let total: f64 = terms.iter().map(|(w, _)| w.max(0.0)).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let sum: f64 = terms
        .iter()
        .map(|(w, d)| w.max(0.0) * clamp_unit(*d))
        .sum();
    clamp_unit(sum / total)
}

/// Fold two distances, giving `a` the weight `weight_a` and `b` the rest.
pub fn combine(a: f64, b: f64, weight_a: f64) -> f64 {
    let weight_a = clamp_unit(weight_a);
    weighted(&[(weight_a, a), (1.0 - weight_a, b)])
}
