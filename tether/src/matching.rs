//! Label-driven node matching.
//!
//! Matching runs top-down from the two virtual roots, which are paired
//! unconditionally. For every matched pair:
//! 1. The labeled children of both sides are bucketed by label; only
//!    same-label nodes are ever candidates.
//! 2. Within a bucket, a longest common subsequence over value-equal nodes
//!    pairs runs of unchanged nodes in order, without computing distances.
//! 3. Leftovers are paired greedily by lowest distance, ties broken by the
//!    smallest positional displacement.
//! 4. Every new non-leaf pair is descended into.
//!
//! Tied-to-ancestor labels are only ever matched as children of a matched
//! pair. An optional cross-parent pass then pairs leftover untied nodes that
//! moved under a different parent. Every pair it makes, and every pair below
//! one, must be within the distance threshold: value equality alone is not
//! enough there, since containers without tokens of their own are all equal.

use core::fmt;
use core::hash::Hash;

use rapidhash::RapidHashMap as HashMap;

use crate::comparer::TreeComparer;
use crate::error::MatchError;
use crate::label::Label;
use crate::lcs::longest_common_subsequence;
use crate::view::TreeView;
use crate::{debug, trace};

/// A bidirectional, injective mapping between old-tree and new-tree nodes.
#[derive(Debug, Clone)]
pub struct Matching<N> {
    old_to_new: HashMap<N, N>,
    new_to_old: HashMap<N, N>,
    /// All pairs in the order they were matched
    pairs: Vec<(N, N)>,
}

impl<N: Copy + Eq + Hash + fmt::Debug> Default for Matching<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy + Eq + Hash + fmt::Debug> Matching<N> {
    /// Create a new empty matching.
    pub fn new() -> Self {
        Self {
            old_to_new: HashMap::default(),
            new_to_old: HashMap::default(),
            pairs: Vec::new(),
        }
    }

    /// Add a match between two nodes.
    ///
    /// # Panics
    ///
    /// Panics if either node is already matched.
    pub fn add(&mut self, old: N, new: N) {
        assert!(
            !self.contains_old(old),
            "{old:?} is already matched to {:?}",
            self.old_to_new.get(&old)
        );
        assert!(
            !self.contains_new(new),
            "{new:?} is already matched to {:?}",
            self.new_to_old.get(&new)
        );
        self.old_to_new.insert(old, new);
        self.new_to_old.insert(new, old);
        self.pairs.push((old, new));
    }

    /// Check if an old-tree node is matched.
    #[inline]
    pub fn contains_old(&self, old: N) -> bool {
        self.old_to_new.contains_key(&old)
    }

    /// Check if a new-tree node is matched.
    #[inline]
    pub fn contains_new(&self, new: N) -> bool {
        self.new_to_old.contains_key(&new)
    }

    /// Counterpart of an old-tree node.
    #[inline]
    pub fn get_new(&self, old: N) -> Option<N> {
        self.old_to_new.get(&old).copied()
    }

    /// Counterpart of a new-tree node.
    #[inline]
    pub fn get_old(&self, new: N) -> Option<N> {
        self.new_to_old.get(&new).copied()
    }

    /// All matched pairs, in matching order.
    pub fn pairs(&self) -> impl Iterator<Item = (N, N)> + '_ {
        self.pairs.iter().copied()
    }

    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no matches.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Configuration for the matching algorithm.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Maximum distance for pairing nodes that ended up under parents which
    /// are not matched to each other. `None` disables the cross-parent pass,
    /// leaving a purely top-down matching.
    pub cross_parent_threshold: Option<f64>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            cross_parent_threshold: Some(0.5),
        }
    }
}

impl MatchingConfig {
    /// Top-down matching only.
    pub fn top_down() -> Self {
        Self {
            cross_parent_threshold: None,
        }
    }
}

/// Counters describing how a matching was reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Pairs found by the value-equality LCS pass.
    pub lcs_matches: usize,
    /// Pairs found by distance ranking.
    pub residual_matches: usize,
    /// Buckets that needed distance ranking at all.
    pub residual_passes: usize,
    /// Pairs found by the cross-parent pass (LCS or ranked).
    pub cross_parent_matches: usize,
    /// Distance evaluations requested from the adapter.
    pub distance_calls: usize,
}

/// The result of matching an old tree against a new tree.
pub struct Match<C: TreeComparer> {
    view: TreeView<C>,
    matching: Matching<C::Node>,
    stats: MatchStats,
}

impl<C: TreeComparer> fmt::Debug for Match<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("old_root", &self.view.old_root())
            .field("new_root", &self.view.new_root())
            .field("matching", &self.matching)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<C: TreeComparer> Match<C> {
    /// The labeled view the matching was computed over.
    pub fn view(&self) -> &TreeView<C> {
        &self.view
    }

    /// The node correspondence.
    pub fn matching(&self) -> &Matching<C::Node> {
        &self.matching
    }

    /// Counters describing the run.
    pub fn stats(&self) -> MatchStats {
        self.stats
    }

    /// Root of the old tree.
    pub fn old_root(&self) -> C::Node {
        self.view.old_root()
    }

    /// Root of the new tree.
    pub fn new_root(&self) -> C::Node {
        self.view.new_root()
    }

    /// Counterpart of an old node, if it survived the edit.
    pub fn map_old_to_new(&self, old: C::Node) -> Option<C::Node> {
        self.matching.get_new(old)
    }

    /// Counterpart of a new node, if it existed before the edit.
    pub fn map_new_to_old(&self, new: C::Node) -> Option<C::Node> {
        self.matching.get_old(new)
    }

    /// Check the correspondence invariants: injectivity, label preservation
    /// outside the root pair, and ancestor consistency of tied labels.
    pub fn verify(&self) -> Result<(), MatchError> {
        let view = &self.view;
        if self.matching.old_to_new.len() != self.matching.len()
            || self.matching.new_to_old.len() != self.matching.len()
        {
            let node = self
                .matching
                .pairs()
                .find(|&(old, new)| {
                    self.matching.get_new(old) != Some(new)
                        || self.matching.get_old(new) != Some(old)
                })
                .map_or_else(|| "<unknown>".to_string(), |(old, _)| view.describe(old));
            return Err(MatchError::NotInjective { node });
        }

        for (old, new) in self.matching.pairs() {
            if self.matching.get_new(old) != Some(new) {
                return Err(MatchError::NotInjective {
                    node: view.describe(old),
                });
            }
            if self.matching.get_old(new) != Some(old) {
                return Err(MatchError::NotInjective {
                    node: view.describe(new),
                });
            }
            if old == view.old_root() && new == view.new_root() {
                continue;
            }

            let label = view.label(old);
            if label != view.label(new) {
                return Err(MatchError::LabelMismatch {
                    old: view.describe(old),
                    new: view.describe(new),
                });
            }
            if view.tied_to_ancestor(label) {
                let old_parent = view.parent(old);
                let new_parent = view.parent(new);
                let consistent = match (old_parent, new_parent) {
                    (Some(op), Some(np)) => self.matching.get_new(op) == Some(np),
                    _ => false,
                };
                if !consistent {
                    return Err(MatchError::DetachedFromAncestor {
                        old: view.describe(old),
                        new: view.describe(new),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Match the tree below `old_root` against the tree below `new_root`.
///
/// The roots are paired regardless of their labels.
pub fn compute_match<C: TreeComparer>(
    comparer: C,
    old_root: C::Node,
    new_root: C::Node,
    config: &MatchingConfig,
) -> Match<C> {
    match compute_match_cancellable(comparer, old_root, new_root, config, || false) {
        Ok(result) => result,
        Err(err) => unreachable!("matching without cancellation failed: {err}"),
    }
}

/// Like [`compute_match`], checking `is_cancelled` once per matched pair
/// visited.
pub fn compute_match_cancellable<C: TreeComparer>(
    comparer: C,
    old_root: C::Node,
    new_root: C::Node,
    config: &MatchingConfig,
    is_cancelled: impl Fn() -> bool,
) -> Result<Match<C>, MatchError> {
    let view = TreeView::new(comparer, old_root, new_root);
    debug!(
        old_root = ?old_root,
        new_root = ?new_root,
        "compute_match start"
    );

    let mut matcher = Matcher {
        view: &view,
        matching: Matching::new(),
        stats: MatchStats::default(),
    };

    matcher.matching.add(old_root, new_root);
    matcher.descend(vec![(old_root, new_root)], None, &is_cancelled)?;
    debug!(matched = matcher.matching.len(), "after top-down phase");

    if let Some(threshold) = config.cross_parent_threshold {
        matcher.cross_parent_phase(threshold, &is_cancelled)?;
        debug!(matched = matcher.matching.len(), "after cross-parent phase");
    }

    let Matcher {
        matching, mut stats, ..
    } = matcher;
    stats.distance_calls = view.distance_calls();
    debug!(?stats, "compute_match done");

    Ok(Match {
        view,
        matching,
        stats,
    })
}

/// One residual candidate pair within a bucket.
struct Candidate {
    distance: f64,
    displacement: usize,
    old: usize,
    new: usize,
}

/// Same-label candidates from both sides, in source order.
struct Bucket<N> {
    label: Label,
    old: Vec<N>,
    new: Vec<N>,
}

struct Matcher<'v, C: TreeComparer> {
    view: &'v TreeView<C>,
    matching: Matching<C::Node>,
    stats: MatchStats,
}

impl<C: TreeComparer> Matcher<'_, C> {
    /// Top-down descent from the given matched pairs, with an explicit stack.
    /// With a `limit`, no pair further apart than the limit is made.
    fn descend(
        &mut self,
        start: Vec<(C::Node, C::Node)>,
        limit: Option<f64>,
        is_cancelled: &impl Fn() -> bool,
    ) -> Result<(), MatchError> {
        let mut stack = start;
        while let Some((old, new)) = stack.pop() {
            if is_cancelled() {
                debug!(matched = self.matching.len(), "matching cancelled");
                return Err(MatchError::Cancelled);
            }

            let old_children: Vec<C::Node> = self
                .view
                .children(old)
                .into_iter()
                .filter(|&child| !self.matching.contains_old(child))
                .collect();
            let new_children: Vec<C::Node> = self
                .view
                .children(new)
                .into_iter()
                .filter(|&child| !self.matching.contains_new(child))
                .collect();
            trace!(
                old = ?old,
                new = ?new,
                old_children = old_children.len(),
                new_children = new_children.len(),
                "descend"
            );

            for bucket in self.buckets(&old_children, &new_children) {
                let tied = self.view.tied_to_ancestor(bucket.label);
                for (o, n) in self.match_bucket(&bucket, limit) {
                    debug_assert!(
                        !tied || (self.view.parent(o) == Some(old) && self.view.parent(n) == Some(new)),
                        "tied pair outside its ancestor pair"
                    );
                    self.matching.add(o, n);
                    if !self.view.is_leaf(bucket.label) {
                        stack.push((o, n));
                    }
                }
            }
        }
        Ok(())
    }

    /// Pair leftover untied nodes anywhere under the roots, then descend into
    /// the new pairs under the same threshold.
    ///
    /// One pass is enough: every leftover pair of a bucket was rejected as too
    /// distant, and descending only consumes leftovers.
    fn cross_parent_phase(
        &mut self,
        threshold: f64,
        is_cancelled: &impl Fn() -> bool,
    ) -> Result<(), MatchError> {
        let old_orphans = self.orphans(self.view.old_root(), |m, n| m.contains_old(n));
        let new_orphans = self.orphans(self.view.new_root(), |m, n| m.contains_new(n));
        if old_orphans.is_empty() || new_orphans.is_empty() {
            return Ok(());
        }

        let mut fresh = Vec::new();
        for bucket in self.buckets(&old_orphans, &new_orphans) {
            for (o, n) in self.match_bucket(&bucket, Some(threshold)) {
                trace!(old = ?o, new = ?n, "cross-parent match");
                self.matching.add(o, n);
                self.stats.cross_parent_matches += 1;
                if !self.view.is_leaf(bucket.label) {
                    fresh.push((o, n));
                }
            }
        }
        self.descend(fresh, Some(threshold), is_cancelled)
    }

    /// Unmatched, untied labeled nodes under `root`, in pre-order.
    fn orphans(
        &self,
        root: C::Node,
        is_matched: impl Fn(&Matching<C::Node>, C::Node) -> bool,
    ) -> Vec<C::Node> {
        self.view
            .descendants(root)
            .into_iter()
            .filter(|&node| {
                !is_matched(&self.matching, node)
                    && !self.view.tied_to_ancestor(self.view.label(node))
            })
            .collect()
    }

    /// Partition both sides by label, in label order. Labels present on one
    /// side only are dropped: they cannot match.
    fn buckets(&self, old: &[C::Node], new: &[C::Node]) -> Vec<Bucket<C::Node>> {
        let mut by_label: HashMap<Label, Bucket<C::Node>> = HashMap::default();
        for &node in old {
            let label = self.view.label(node);
            by_label
                .entry(label)
                .or_insert_with(|| Bucket {
                    label,
                    old: Vec::new(),
                    new: Vec::new(),
                })
                .old
                .push(node);
        }
        for &node in new {
            let label = self.view.label(node);
            if let Some(bucket) = by_label.get_mut(&label) {
                bucket.new.push(node);
            }
        }

        let mut buckets: Vec<Bucket<C::Node>> = by_label
            .into_values()
            .filter(|bucket| !bucket.new.is_empty())
            .collect();
        buckets.sort_by_key(|bucket| bucket.label);
        buckets
    }

    /// Match one bucket: LCS over value-equal nodes, then greedy lowest
    /// distance over the rest. With a `limit`, any pair further apart than
    /// the limit is rejected, value-equal or not.
    fn match_bucket(
        &mut self,
        bucket: &Bucket<C::Node>,
        limit: Option<f64>,
    ) -> Vec<(C::Node, C::Node)> {
        let (old, new) = (&bucket.old, &bucket.new);
        let view = self.view;

        let mut used_old = vec![false; old.len()];
        let mut used_new = vec![false; new.len()];
        let mut pairs = Vec::new();

        for (i, j) in longest_common_subsequence(old.len(), new.len(), |i, j| {
            view.values_equal(old[i], new[j])
                && limit.is_none_or(|max| view.distance(old[i], new[j]) <= max)
        }) {
            trace!(old = ?old[i], new = ?new[j], "lcs match");
            used_old[i] = true;
            used_new[j] = true;
            pairs.push((old[i], new[j]));
        }
        self.stats.lcs_matches += pairs.len();

        let rest_old: Vec<usize> = (0..old.len()).filter(|&i| !used_old[i]).collect();
        let rest_new: Vec<usize> = (0..new.len()).filter(|&j| !used_new[j]).collect();
        if rest_old.is_empty() || rest_new.is_empty() {
            return pairs;
        }

        self.stats.residual_passes += 1;
        let mut candidates = Vec::with_capacity(rest_old.len() * rest_new.len());
        for &i in &rest_old {
            for &j in &rest_new {
                let distance = view.distance(old[i], new[j]);
                if limit.is_some_and(|max| distance > max) {
                    trace!(old = ?old[i], new = ?new[j], distance, "rejected: too distant");
                    continue;
                }
                candidates.push(Candidate {
                    distance,
                    displacement: i.abs_diff(j),
                    old: i,
                    new: j,
                });
            }
        }

        candidates.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.displacement.cmp(&b.displacement))
                .then(a.old.cmp(&b.old))
                .then(a.new.cmp(&b.new))
        });

        for candidate in candidates {
            if used_old[candidate.old] || used_new[candidate.new] {
                continue;
            }
            used_old[candidate.old] = true;
            used_new[candidate.new] = true;
            trace!(
                old = ?old[candidate.old],
                new = ?new[candidate.new],
                distance = candidate.distance,
                "residual match"
            );
            pairs.push((old[candidate.old], new[candidate.new]));
            self.stats.residual_matches += 1;
        }
        pairs
    }
}
