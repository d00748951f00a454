//! Labeled view over a pair of syntax trees.
//!
//! The matcher only ever sees labeled nodes. [`TreeView`] walks the raw syntax
//! through the adapter and looks through unlabeled nodes, so that for example a
//! lambda embedded deep inside an expression statement still shows up as a
//! child of that statement.

use core::cell::{Cell, RefCell};

use rapidhash::RapidHashMap as HashMap;

use crate::comparer::TreeComparer;
use crate::distance::clamp_unit;
use crate::label::{Label, LabelTable};

/// Adapter-driven traversal restricted to labeled nodes, rooted at an
/// `(old_root, new_root)` pair.
pub struct TreeView<C: TreeComparer> {
    comparer: C,
    old_root: C::Node,
    new_root: C::Node,
    labels: RefCell<HashMap<C::Node, Label>>,
    distance_calls: Cell<usize>,
}

impl<C: TreeComparer> TreeView<C> {
    /// Create a view over the two roots.
    ///
    /// # Panics
    ///
    /// Panics if both roots are the same node.
    pub fn new(comparer: C, old_root: C::Node, new_root: C::Node) -> Self {
        assert_ne!(
            old_root, new_root,
            "old and new roots must be distinct nodes"
        );
        Self {
            comparer,
            old_root,
            new_root,
            labels: RefCell::new(HashMap::default()),
            distance_calls: Cell::new(0),
        }
    }

    /// The underlying adapter.
    pub fn comparer(&self) -> &C {
        &self.comparer
    }

    /// The adapter's label table.
    pub fn label_table(&self) -> &LabelTable {
        self.comparer.labels()
    }

    /// Root of the old tree.
    pub fn old_root(&self) -> C::Node {
        self.old_root
    }

    /// Root of the new tree.
    pub fn new_root(&self) -> C::Node {
        self.new_root
    }

    /// Whether `node` is one of the two virtual roots.
    #[inline]
    pub fn is_root(&self, node: C::Node) -> bool {
        node == self.old_root || node == self.new_root
    }

    /// Label of a node.
    ///
    /// Labels are memoized for the lifetime of the view.
    ///
    /// # Panics
    ///
    /// Panics if the adapter classifies the same node differently across calls,
    /// or returns a label outside its own table.
    pub fn label(&self, node: C::Node) -> Label {
        let label = self.comparer.label(node);
        assert!(
            self.label_table().contains(label),
            "adapter returned {label:?} for {}, outside its label table",
            self.comparer.describe(node)
        );
        let mut memo = self.labels.borrow_mut();
        let first = *memo.entry(node).or_insert(label);
        assert_eq!(
            first,
            label,
            "adapter classified {} inconsistently",
            self.comparer.describe(node)
        );
        label
    }

    /// Whether `label` cannot contain labeled nodes.
    pub fn is_leaf(&self, label: Label) -> bool {
        self.label_table().is_leaf(label)
    }

    /// Whether `label` is tied to its ancestor.
    pub fn tied_to_ancestor(&self, label: Label) -> bool {
        self.label_table().tied_to_ancestor(label)
    }

    /// Labeled children of a node, in source order.
    ///
    /// Unlabeled children are looked through. Opaque nodes are never entered,
    /// except a root, whose contents are exactly what is being matched. Leaf
    /// labels have no children.
    pub fn children(&self, node: C::Node) -> Vec<C::Node> {
        let mut out = Vec::new();
        if !self.is_root(node) && (self.comparer.is_opaque(node) || self.is_leaf(self.label(node)))
        {
            return out;
        }

        // Depth-first over raw children; pushed in reverse to keep source order.
        let mut stack: Vec<C::Node> = self.raw_children_rev(node);
        while let Some(child) = stack.pop() {
            if !self.label(child).is_ignored() {
                out.push(child);
            } else if !self.comparer.is_opaque(child) {
                stack.extend(self.raw_children_rev(child));
            }
        }
        out
    }

    /// All labeled descendants of a node in pre-order, excluding the node.
    pub fn descendants(&self, node: C::Node) -> Vec<C::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<C::Node> = self.children(node);
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Nearest labeled ancestor of a node. A root is the ancestor of every
    /// labeled node below it, whatever its own label; roots have no parent.
    pub fn parent(&self, node: C::Node) -> Option<C::Node> {
        if self.is_root(node) {
            return None;
        }
        let mut current = self.comparer.parent(node)?;
        loop {
            if self.is_root(current) || !self.label(current).is_ignored() {
                return Some(current);
            }
            current = self.comparer.parent(current)?;
        }
    }

    /// Value equality of two nodes, see [`TreeComparer::values_equal`].
    pub fn values_equal(&self, old: C::Node, new: C::Node) -> bool {
        self.comparer.values_equal(old, new)
    }

    /// Distance of two same-labeled nodes, clamped into `[0, 1]`.
    ///
    /// # Panics
    ///
    /// Panics if the adapter returns a non-finite distance.
    pub fn distance(&self, old: C::Node, new: C::Node) -> f64 {
        self.distance_calls.set(self.distance_calls.get() + 1);
        let d = self.comparer.distance(old, new);
        assert!(
            d.is_finite(),
            "adapter returned non-finite distance {d} for {} / {}",
            self.comparer.describe(old),
            self.comparer.describe(new)
        );
        clamp_unit(d)
    }

    /// Number of [`distance`](Self::distance) calls made through this view.
    pub fn distance_calls(&self) -> usize {
        self.distance_calls.get()
    }

    /// Diagnostic description of a node.
    pub fn describe(&self, node: C::Node) -> String {
        self.comparer.describe(node)
    }

    fn raw_children_rev(&self, node: C::Node) -> Vec<C::Node> {
        let mut children: Vec<C::Node> = self.comparer.children(node).collect();
        children.reverse();
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_tree::{TestComparer, TestNode, TestTree, panic_message};
    use facet_testhelpers::test;

    /// Breaks the adapter contract on demand.
    struct Misbehaving<'t> {
        inner: TestComparer<'t>,
        label_calls: Cell<u16>,
        /// Labels every call differently instead of asking `inner`
        flip_labels: bool,
        /// Label returned for every node, if any
        fixed_label: Option<Label>,
        /// Distance returned for every pair, if any
        fixed_distance: Option<f64>,
    }

    impl<'t> Misbehaving<'t> {
        fn new() -> Self {
            Self {
                inner: TestComparer::new(),
                label_calls: Cell::new(0),
                flip_labels: false,
                fixed_label: None,
                fixed_distance: None,
            }
        }
    }

    impl<'t> TreeComparer for Misbehaving<'t> {
        type Node = TestNode<'t>;

        fn labels(&self) -> &LabelTable {
            self.inner.labels()
        }

        fn label(&self, node: Self::Node) -> Label {
            if self.flip_labels {
                let calls = self.label_calls.get();
                self.label_calls.set(calls + 1);
                return Label::new(calls % 2);
            }
            self.fixed_label.unwrap_or_else(|| self.inner.label(node))
        }

        fn children(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_ {
            self.inner.children(node)
        }

        fn parent(&self, node: Self::Node) -> Option<Self::Node> {
            self.inner.parent(node)
        }

        fn values_equal(&self, old: Self::Node, new: Self::Node) -> bool {
            self.inner.values_equal(old, new)
        }

        fn distance(&self, old: Self::Node, new: Self::Node) -> f64 {
            self.fixed_distance
                .unwrap_or_else(|| self.inner.distance(old, new))
        }
    }

    #[test]
    fn test_children_look_through_unlabeled_nodes() {
        // body -> [stmt, expr(ignored) -> [lambda, expr(ignored) -> [stmt]]]
        let mut tree = TestTree::new("body", "");
        let root = tree.root();
        let first = tree.add(root, "stmt", "a");
        let expr = tree.add(root, "expr", "x");
        let lambda = tree.add(expr, "lambda", "");
        let inner = tree.add(expr, "expr", "y");
        let second = tree.add(inner, "stmt", "b");
        let other = TestTree::new("body", "");

        let comparer = TestComparer::new();
        let view = TreeView::new(&comparer, tree.node(root), other.node(other.root()));

        let children = view.children(tree.node(root));
        assert_eq!(
            children,
            vec![tree.node(first), tree.node(lambda), tree.node(second)]
        );
        assert_eq!(view.parent(tree.node(second)), Some(tree.node(root)));
    }

    #[test]
    fn test_opaque_nodes_are_not_entered() {
        let mut tree = TestTree::new("body", "");
        let root = tree.root();
        let lambda = tree.add(root, "lambda", "");
        let inside = tree.add(lambda, "stmt", "a");
        let other = TestTree::new("body", "");

        let comparer = TestComparer::new();
        let view = TreeView::new(&comparer, tree.node(root), other.node(other.root()));
        assert!(view.children(tree.node(lambda)).is_empty());
        assert_eq!(view.descendants(tree.node(root)), vec![tree.node(lambda)]);

        // Rooted at the lambda itself, its body is visible.
        let inner_view = TreeView::new(&comparer, tree.node(lambda), other.node(other.root()));
        assert_eq!(inner_view.children(tree.node(lambda)), vec![tree.node(inside)]);
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let mut tree = TestTree::new("body", "");
        let root = tree.root();
        let block = tree.add(root, "block", "");
        let a = tree.add(block, "stmt", "a");
        let b = tree.add(root, "stmt", "b");
        let other = TestTree::new("body", "");

        let comparer = TestComparer::new();
        let view = TreeView::new(&comparer, tree.node(root), other.node(other.root()));
        assert_eq!(
            view.descendants(tree.node(root)),
            vec![tree.node(block), tree.node(a), tree.node(b)]
        );
        assert_eq!(view.parent(tree.node(a)), Some(tree.node(block)));
        assert_eq!(view.parent(tree.node(root)), None);
    }

    #[test]
    fn test_distance_is_clamped_and_counted() {
        let mut old = TestTree::new("body", "");
        let a = old.add(old.root(), "stmt", "a b");
        let mut new = TestTree::new("body", "");
        let b = new.add(new.root(), "stmt", "c d");

        let comparer = TestComparer::new();
        let view = TreeView::new(&comparer, old.node(old.root()), new.node(new.root()));
        let d = view.distance(old.node(a), new.node(b));
        assert!((0.0..=1.0).contains(&d));
        assert_eq!(view.distance_calls(), 1);
    }

    #[test]
    fn test_inconsistent_label_panics() {
        let mut old = TestTree::new("body", "");
        let stmt = old.add(old.root(), "stmt", "a");
        let new = TestTree::new("body", "");

        let comparer = Misbehaving {
            flip_labels: true,
            ..Misbehaving::new()
        };
        let view = TreeView::new(&comparer, old.node(old.root()), new.node(new.root()));
        let message = panic_message(|| {
            view.label(old.node(stmt));
            view.label(old.node(stmt));
        });
        assert!(message.contains("inconsistently"), "{message}");
    }

    #[test]
    fn test_label_outside_table_panics() {
        let mut old = TestTree::new("body", "");
        let stmt = old.add(old.root(), "stmt", "a");
        let new = TestTree::new("body", "");

        let comparer = Misbehaving {
            fixed_label: Some(Label::new(1000)),
            ..Misbehaving::new()
        };
        let view = TreeView::new(&comparer, old.node(old.root()), new.node(new.root()));
        let message = panic_message(|| {
            view.label(old.node(stmt));
        });
        assert!(message.contains("outside its label table"), "{message}");
    }

    #[test]
    fn test_non_finite_distance_panics() {
        let mut old = TestTree::new("body", "");
        let a = old.add(old.root(), "stmt", "a");
        let mut new = TestTree::new("body", "");
        let b = new.add(new.root(), "stmt", "b");

        for bad in [f64::NAN, f64::INFINITY] {
            let comparer = Misbehaving {
                fixed_distance: Some(bad),
                ..Misbehaving::new()
            };
            let view = TreeView::new(&comparer, old.node(old.root()), new.node(new.root()));
            let message = panic_message(|| {
                view.distance(old.node(a), new.node(b));
            });
            assert!(message.contains("non-finite distance"), "{message}");
        }
    }

    #[test]
    fn test_out_of_range_distance_is_clamped() {
        let mut old = TestTree::new("body", "");
        let a = old.add(old.root(), "stmt", "a");
        let mut new = TestTree::new("body", "");
        let b = new.add(new.root(), "stmt", "b");

        let comparer = Misbehaving {
            fixed_distance: Some(3.5),
            ..Misbehaving::new()
        };
        let view = TreeView::new(&comparer, old.node(old.root()), new.node(new.root()));
        assert_eq!(view.distance(old.node(a), new.node(b)), 1.0);
    }
}
