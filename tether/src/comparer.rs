//! The language adapter contract.
//!
//! Everything language-specific lives behind [`TreeComparer`]: how nodes are
//! classified, how the raw syntax is walked, which subtrees are opaque, and how
//! similar two same-labeled nodes are. The engine never looks inside a node.

use core::fmt;
use core::hash::Hash;

use crate::label::{Label, LabelTable};

/// Adapter between a concrete syntax tree and the matching engine.
///
/// Nodes are opaque handles into caller-owned trees. A node of the old tree
/// and a node of the new tree must never compare equal, so handles usually
/// carry the identity of their tree alongside the node index.
pub trait TreeComparer {
    /// Handle to a node of either tree.
    type Node: Copy + Eq + Hash + fmt::Debug;

    /// The label table every [`label`](Self::label) result indexes into.
    fn labels(&self) -> &LabelTable;

    /// Classify a node. Must be a pure function of the node.
    fn label(&self, node: Self::Node) -> Label;

    /// Raw syntactic children of a node, in source order, labeled or not.
    fn children(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    /// Raw syntactic parent of a node.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Whether the subtree below this node is matched separately (closures,
    /// local functions). Traversal never enters an opaque node unless it is
    /// the root being matched.
    fn is_opaque(&self, _node: Self::Node) -> bool {
        false
    }

    /// Trivia-insensitive equality of two same-labeled nodes, including their
    /// unlabeled sub-nodes and ignoring their labeled ones.
    fn values_equal(&self, old: Self::Node, new: Self::Node) -> bool;

    /// Dissimilarity of two same-labeled nodes in `[0, 1]`; 0 means "treat as
    /// unchanged". Only used to rank candidates.
    fn distance(&self, old: Self::Node, new: Self::Node) -> f64;

    /// Short description of a node for diagnostics.
    fn describe(&self, node: Self::Node) -> String {
        format!("{node:?}")
    }
}

impl<C: TreeComparer + ?Sized> TreeComparer for &C {
    type Node = C::Node;

    fn labels(&self) -> &LabelTable {
        (**self).labels()
    }

    fn label(&self, node: Self::Node) -> Label {
        (**self).label(node)
    }

    fn children(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_ {
        (**self).children(node)
    }

    fn parent(&self, node: Self::Node) -> Option<Self::Node> {
        (**self).parent(node)
    }

    fn is_opaque(&self, node: Self::Node) -> bool {
        (**self).is_opaque(node)
    }

    fn values_equal(&self, old: Self::Node, new: Self::Node) -> bool {
        (**self).values_equal(old, new)
    }

    fn distance(&self, old: Self::Node, new: Self::Node) -> f64 {
        (**self).distance(old, new)
    }

    fn describe(&self, node: Self::Node) -> String {
        (**self).describe(node)
    }
}
