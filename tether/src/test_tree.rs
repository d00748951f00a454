//! Minimal labeled tree used by the engine's unit tests.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use indextree::{Arena, NodeId};

use crate::comparer::TreeComparer;
use crate::distance::sequence_distance;
use crate::label::{Label, LabelInfo, LabelTable};

pub(crate) struct TestTree {
    arena: Arena<(&'static str, String)>,
    root: NodeId,
}

impl TestTree {
    pub(crate) fn new(kind: &'static str, text: &str) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node((kind, text.to_string()));
        Self { arena, root }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn add(&mut self, parent: NodeId, kind: &'static str, text: &str) -> NodeId {
        let id = self.arena.new_node((kind, text.to_string()));
        parent.append(id, &mut self.arena);
        id
    }

    pub(crate) fn node(&self, id: NodeId) -> TestNode<'_> {
        TestNode { tree: self, id }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct TestNode<'t> {
    tree: &'t TestTree,
    id: NodeId,
}

impl TestNode<'_> {
    fn kind(&self) -> &'static str {
        self.tree.arena[self.id].get().0
    }

    fn text(&self) -> &str {
        &self.tree.arena[self.id].get().1
    }
}

impl PartialEq for TestNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for TestNode<'_> {}

impl Hash for TestNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.tree as *const TestTree).hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for TestNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}({})", self.kind(), usize::from(self.id), self.text())
    }
}

const LABELS: [(&str, LabelInfo); 9] = [
    ("body", LabelInfo::node("body")),
    ("block", LabelInfo::node("block")),
    ("stmt", LabelInfo::leaf("stmt")),
    ("if", LabelInfo::node("if")),
    ("else", LabelInfo::node("else").tied()),
    ("while", LabelInfo::node("while")),
    ("for", LabelInfo::node("for")),
    ("catch", LabelInfo::node("catch")),
    ("decl", LabelInfo::leaf("decl").tied()),
];

pub(crate) struct TestComparer<'t> {
    table: LabelTable,
    _trees: PhantomData<&'t TestTree>,
}

impl TestComparer<'_> {
    pub(crate) fn new() -> Self {
        let mut entries: Vec<LabelInfo> = LABELS.iter().map(|(_, info)| *info).collect();
        entries.push(LabelInfo::leaf("lambda"));
        Self {
            table: LabelTable::new(entries),
            _trees: PhantomData,
        }
    }

    /// Tokens of every node below `node`, labeled or not, outside closures.
    fn subtree_tokens<'t>(&self, node: TestNode<'t>, out: &mut Vec<&'t str>) {
        out.extend(node.tree.arena[node.id].get().1.split_whitespace());
        if node.kind() == "lambda" {
            return;
        }
        for child in node.id.children(&node.tree.arena) {
            let child = TestNode {
                tree: node.tree,
                id: child,
            };
            self.subtree_tokens(child, out);
        }
    }

    fn value_tokens<'t>(&self, node: TestNode<'t>, out: &mut Vec<&'t str>) {
        out.extend(node.tree.arena[node.id].get().1.split_whitespace());
        for child in node.id.children(&node.tree.arena) {
            let child = TestNode {
                tree: node.tree,
                id: child,
            };
            if self.label(child).is_ignored() {
                self.value_tokens(child, out);
            }
        }
    }
}

impl<'t> TreeComparer for TestComparer<'t> {
    type Node = TestNode<'t>;

    fn labels(&self) -> &LabelTable {
        &self.table
    }

    fn label(&self, node: Self::Node) -> Label {
        let kind = node.kind();
        if kind == "lambda" {
            return Label::new(LABELS.len() as u16);
        }
        LABELS
            .iter()
            .position(|(name, _)| *name == kind)
            .map_or(Label::IGNORED, |i| Label::new(i as u16))
    }

    fn children(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_ {
        node.id
            .children(&node.tree.arena)
            .map(move |id| TestNode {
                tree: node.tree,
                id,
            })
    }

    fn parent(&self, node: Self::Node) -> Option<Self::Node> {
        node.tree.arena[node.id].parent().map(|id| TestNode {
            tree: node.tree,
            id,
        })
    }

    fn is_opaque(&self, node: Self::Node) -> bool {
        node.kind() == "lambda"
    }

    fn values_equal(&self, old: Self::Node, new: Self::Node) -> bool {
        let mut a = Vec::new();
        let mut b = Vec::new();
        self.value_tokens(old, &mut a);
        self.value_tokens(new, &mut b);
        old.kind() == new.kind() && a == b
    }

    /// Leaves compare their own tokens, containers the tokens of their whole
    /// subtree, so two blocks with unrelated contents are far apart.
    fn distance(&self, old: Self::Node, new: Self::Node) -> f64 {
        let mut a = Vec::new();
        let mut b = Vec::new();
        if self.table.is_leaf(self.label(old)) {
            self.value_tokens(old, &mut a);
            self.value_tokens(new, &mut b);
        } else {
            self.subtree_tokens(old, &mut a);
            self.subtree_tokens(new, &mut b);
        }
        sequence_distance(&a, &b)
    }
}

/// Run `f`, which must panic, and return its panic message.
pub(crate) fn panic_message(f: impl FnOnce()) -> String {
    let payload = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(()) => panic!("expected a panic"),
        Err(payload) => payload,
    };
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_default()
}
