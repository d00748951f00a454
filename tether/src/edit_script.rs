//! Edit script generation from a node matching.
//!
//! Classifies every labeled node of both trees and emits the edits that turn
//! the old tree into the new one:
//! 1. UPDATE: matched pairs whose own values differ
//! 2. INSERT: new nodes without a counterpart (pre-order)
//! 3. MOVE: matched nodes whose parents are not matched to each other
//! 4. REORDER: matched siblings whose relative order changed
//! 5. DELETE: old nodes without a counterpart (post-order)

use core::fmt;
use core::hash::Hash;

use rapidhash::RapidHashMap as HashMap;

use crate::comparer::TreeComparer;
use crate::lcs::longest_common_subsequence;
use crate::matching::{Match, Matching};
use crate::simplify::condense_edits;
use crate::{debug, trace};

/// What happened to a node between the old and the new tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Matched, and nothing changed anywhere inside.
    Unchanged,
    /// Matched, but the values differ, either of the pair itself or
    /// somewhere below it.
    Updated,
    /// Only present in the new tree.
    Inserted,
    /// Only present in the old tree.
    Deleted,
}

/// An edit operation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Edit<N> {
    /// A matched pair whose values differ.
    Update {
        /// The node in the old tree
        old: N,
        /// Its counterpart in the new tree
        new: N,
    },

    /// A new node without counterpart.
    Insert {
        /// The inserted node
        new: N,
        /// Its labeled parent in the new tree
        parent: Option<N>,
    },

    /// An old node without counterpart.
    Delete {
        /// The deleted node
        old: N,
        /// Its labeled parent in the old tree
        parent: Option<N>,
    },

    /// A matched node that now lives under a parent its old parent was not
    /// matched to.
    Move {
        /// The node in the old tree
        old: N,
        /// Its counterpart in the new tree
        new: N,
        /// The new labeled parent
        new_parent: N,
    },

    /// A matched node that kept its parent but changed its order relative to
    /// its matched siblings.
    Reorder {
        /// The node in the old tree
        old: N,
        /// Its counterpart in the new tree
        new: N,
    },
}

impl<N: fmt::Debug> fmt::Display for Edit<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Update { old, new } => write!(f, "Update({old:?} → {new:?})"),
            Edit::Insert { new, parent } => match parent {
                Some(parent) => write!(f, "Insert({new:?} under {parent:?})"),
                None => write!(f, "Insert({new:?})"),
            },
            Edit::Delete { old, parent } => match parent {
                Some(parent) => write!(f, "Delete({old:?} from {parent:?})"),
                None => write!(f, "Delete({old:?})"),
            },
            Edit::Move {
                old,
                new,
                new_parent,
            } => write!(f, "Move({old:?} → {new:?} under {new_parent:?})"),
            Edit::Reorder { old, new } => write!(f, "Reorder({old:?} → {new:?})"),
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for Edit<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse Display implementation for Debug
        fmt::Display::fmt(self, f)
    }
}

/// Number of edits of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditCounts {
    /// Update edits
    pub updates: usize,
    /// Insert edits
    pub inserts: usize,
    /// Delete edits
    pub deletes: usize,
    /// Move edits
    pub moves: usize,
    /// Reorder edits
    pub reorders: usize,
}

impl EditCounts {
    /// Total number of edits.
    pub fn total(&self) -> usize {
        self.updates + self.inserts + self.deletes + self.moves + self.reorders
    }

    /// Tally a sequence of edits.
    pub fn from_edits<'a, N: 'a>(edits: impl IntoIterator<Item = &'a Edit<N>>) -> Self {
        let mut counts = Self::default();
        for edit in edits {
            match edit {
                Edit::Update { .. } => counts.updates += 1,
                Edit::Insert { .. } => counts.inserts += 1,
                Edit::Delete { .. } => counts.deletes += 1,
                Edit::Move { .. } => counts.moves += 1,
                Edit::Reorder { .. } => counts.reorders += 1,
            }
        }
        counts
    }
}

/// Classified edits between two trees, plus the correspondence they were
/// derived from.
#[derive(Debug, Clone)]
pub struct EditScript<N> {
    edits: Vec<Edit<N>>,
    matching: Matching<N>,
    old_classes: HashMap<N, Classification>,
    new_classes: HashMap<N, Classification>,
    old_parents: HashMap<N, N>,
    new_parents: HashMap<N, N>,
    /// Old nodes whose whole labeled subtree came through untouched
    unchanged_subtrees: HashMap<N, bool>,
}

impl<N: Copy + Eq + Hash + fmt::Debug> EditScript<N> {
    /// All edits, in generation order.
    pub fn edits(&self) -> &[Edit<N>] {
        &self.edits
    }

    /// Consume the script, keeping only the edits.
    pub fn into_edits(self) -> Vec<Edit<N>> {
        self.edits
    }

    /// The correspondence the script was derived from.
    pub fn matching(&self) -> &Matching<N> {
        &self.matching
    }

    /// Classification of an old-tree node, `None` for nodes outside the
    /// matched region.
    pub fn classify_old(&self, old: N) -> Option<Classification> {
        self.old_classes.get(&old).copied()
    }

    /// Classification of a new-tree node, `None` for nodes outside the
    /// matched region.
    pub fn classify_new(&self, new: N) -> Option<Classification> {
        self.new_classes.get(&new).copied()
    }

    /// Counterpart of an old node.
    pub fn map_old_to_new(&self, old: N) -> Option<N> {
        self.matching.get_new(old)
    }

    /// Counterpart of a new node.
    pub fn map_new_to_old(&self, new: N) -> Option<N> {
        self.matching.get_old(new)
    }

    /// Whether nothing changed anywhere inside this old node: its values are
    /// equal, every labeled descendant is unchanged, and nothing was inserted
    /// below its counterpart. Same as classifying it [`Classification::Unchanged`].
    pub fn is_subtree_unchanged(&self, old: N) -> bool {
        self.unchanged_subtrees.get(&old).copied().unwrap_or(false)
    }

    /// Number of edits of each kind.
    pub fn counts(&self) -> EditCounts {
        EditCounts::from_edits(&self.edits)
    }

    /// The edits with nested inserts and deletes folded into their topmost
    /// inserted or deleted ancestor.
    pub fn condensed(&self) -> Vec<Edit<N>> {
        condense_edits(
            self.edits.clone(),
            |old| self.old_parents.get(&old).copied(),
            |new| self.new_parents.get(&new).copied(),
        )
    }
}

impl<C: TreeComparer> Match<C> {
    /// Build the edit script for this matching.
    pub fn edit_script(&self) -> EditScript<C::Node> {
        generate_edit_script(self)
    }
}

/// Wrapper for collecting edit operations with automatic tracing.
struct Edits<N> {
    inner: Vec<Edit<N>>,
}

impl<N: fmt::Debug> Edits<N> {
    fn new() -> Self {
        Self { inner: Vec::new() }
    }

    fn push(&mut self, edit: Edit<N>) {
        debug!(%edit, "emit");
        self.inner.push(edit);
    }

    fn into_inner(self) -> Vec<Edit<N>> {
        self.inner
    }
}

/// Generate the edit script for a matching.
pub fn generate_edit_script<C: TreeComparer>(m: &Match<C>) -> EditScript<C::Node> {
    let view = m.view();
    let matching = m.matching();
    let (old_root, new_root) = (m.old_root(), m.new_root());
    trace!(matched_pairs = matching.len(), "generate_edit_script start");

    // Pre-order node lists and labeled parent tables for both sides.
    let old_nodes = with_root(old_root, view.descendants(old_root));
    let new_nodes = with_root(new_root, view.descendants(new_root));
    let mut old_parents: HashMap<C::Node, C::Node> = HashMap::default();
    let mut new_parents: HashMap<C::Node, C::Node> = HashMap::default();
    let mut old_children: HashMap<C::Node, Vec<C::Node>> = HashMap::default();
    let mut new_children: HashMap<C::Node, Vec<C::Node>> = HashMap::default();
    for &node in &old_nodes {
        let children = view.children(node);
        for &child in &children {
            old_parents.insert(child, node);
        }
        old_children.insert(node, children);
    }
    for &node in &new_nodes {
        let children = view.children(node);
        for &child in &children {
            new_parents.insert(child, node);
        }
        new_children.insert(node, children);
    }

    let mut edits = Edits::new();
    let mut old_classes: HashMap<C::Node, Classification> = HashMap::default();
    let mut new_classes: HashMap<C::Node, Classification> = HashMap::default();

    // Phase 1: UPDATE - matched pairs with different values. Only the pair
    // itself is compared; changes further down get edits of their own.
    let mut equal_values: HashMap<C::Node, bool> = HashMap::default();
    for (old, new) in matching.pairs() {
        let equal = view.values_equal(old, new);
        if !equal {
            edits.push(Edit::Update { old, new });
        }
        equal_values.insert(old, equal);
    }

    // Phase 2: INSERT - new nodes without counterpart, parents first
    for &new in &new_nodes {
        if !matching.contains_new(new) {
            new_classes.insert(new, Classification::Inserted);
            edits.push(Edit::Insert {
                new,
                parent: new_parents.get(&new).copied(),
            });
        }
    }

    // Phase 3: MOVE - parent pair no longer matched to each other
    for (old, new) in matching.pairs() {
        let (Some(&old_parent), Some(&new_parent)) = (old_parents.get(&old), new_parents.get(&new))
        else {
            continue;
        };
        if matching.get_new(old_parent) != Some(new_parent) {
            edits.push(Edit::Move {
                old,
                new,
                new_parent,
            });
        }
    }

    // Phase 4: REORDER - same parents, matched siblings out of order
    for &old_parent in &old_nodes {
        let Some(new_parent) = matching.get_new(old_parent) else {
            continue;
        };
        let kept_old: Vec<C::Node> = old_children[&old_parent]
            .iter()
            .copied()
            .filter(|&child| {
                matching
                    .get_new(child)
                    .is_some_and(|n| new_parents.get(&n) == Some(&new_parent))
            })
            .collect();
        let kept_new: Vec<C::Node> = new_children
            .get(&new_parent)
            .map(|children| {
                children
                    .iter()
                    .copied()
                    .filter(|&child| {
                        matching
                            .get_old(child)
                            .is_some_and(|o| old_parents.get(&o) == Some(&old_parent))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if kept_old.len() < 2 {
            continue;
        }

        let in_order = longest_common_subsequence(kept_old.len(), kept_new.len(), |i, j| {
            matching.get_new(kept_old[i]) == Some(kept_new[j])
        });
        if in_order.len() == kept_old.len() {
            continue;
        }
        let mut stays = vec![false; kept_old.len()];
        for (i, _) in in_order {
            stays[i] = true;
        }
        for (i, &old) in kept_old.iter().enumerate() {
            if !stays[i]
                && let Some(new) = matching.get_new(old)
            {
                edits.push(Edit::Reorder { old, new });
            }
        }
    }

    // Phase 5: DELETE - old nodes without counterpart, children first
    for &old in old_nodes.iter().rev() {
        if !matching.contains_old(old) {
            old_classes.insert(old, Classification::Deleted);
            edits.push(Edit::Delete {
                old,
                parent: old_parents.get(&old).copied(),
            });
        }
    }

    // Subtree summary, children before parents. A matched pair is unchanged
    // only if nothing below it changed either.
    let mut unchanged_subtrees: HashMap<C::Node, bool> = HashMap::default();
    for &old in old_nodes.iter().rev() {
        let Some(new) = matching.get_new(old) else {
            unchanged_subtrees.insert(old, false);
            continue;
        };
        let own = equal_values.get(&old).copied().unwrap_or(false);
        let old_kids = &old_children[&old];
        let new_kids = new_children.get(&new).map(Vec::as_slice).unwrap_or_default();
        let kids = old_kids.len() == new_kids.len()
            && old_kids.iter().zip(new_kids).all(|(&o, &n)| {
                matching.get_new(o) == Some(n)
                    && unchanged_subtrees.get(&o).copied().unwrap_or(false)
            });
        let unchanged = own && kids;
        unchanged_subtrees.insert(old, unchanged);

        let class = if unchanged {
            Classification::Unchanged
        } else {
            Classification::Updated
        };
        old_classes.insert(old, class);
        new_classes.insert(new, class);
    }

    let edits = edits.into_inner();
    debug!(total_edits = edits.len(), "generate_edit_script done");

    EditScript {
        edits,
        matching: matching.clone(),
        old_classes,
        new_classes,
        old_parents,
        new_parents,
        unchanged_subtrees,
    }
}

fn with_root<N>(root: N, descendants: Vec<N>) -> Vec<N> {
    let mut nodes = Vec::with_capacity(descendants.len() + 1);
    nodes.push(root);
    nodes.extend(descendants);
    nodes
}
