//! Syntactic labels and the per-label lookup table.
//!
//! Labels are small dense integers handed out by a language adapter. Only nodes
//! with the same label are ever candidates for matching, so the label is the
//! primary pruning key of the whole engine.

use core::fmt;

/// Adapter-assigned syntactic category of a node.
///
/// Labels are dense indices into a [`LabelTable`], starting at 0. The
/// distinguished [`Label::IGNORED`] marks nodes without structural identity of
/// their own: traversal steps over them, but still visits their labeled
/// descendants.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u16);

impl Label {
    /// Label of nodes that are transparently skipped during traversal.
    pub const IGNORED: Label = Label(u16::MAX);

    /// Create a label from its dense index.
    ///
    /// # Panics
    ///
    /// Panics if `index` collides with [`Label::IGNORED`].
    pub const fn new(index: u16) -> Self {
        assert!(index != u16::MAX, "label index collides with Label::IGNORED");
        Label(index)
    }

    /// The dense index of this label.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the ignored label.
    #[inline]
    pub const fn is_ignored(self) -> bool {
        self.0 == u16::MAX
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ignored() {
            write!(f, "Label(ignored)")
        } else {
            write!(f, "Label({})", self.0)
        }
    }
}

/// Static facts about one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelInfo {
    /// Human readable name, used in logs and diagnostics.
    pub name: &'static str,
    /// Nodes with this label cannot contain other labeled nodes.
    pub is_leaf: bool,
    /// Nodes with this label only match together with their nearest labeled
    /// ancestor.
    pub tied_to_ancestor: bool,
}

impl LabelInfo {
    /// An ordinary, non-leaf, untied label.
    pub const fn node(name: &'static str) -> Self {
        Self {
            name,
            is_leaf: false,
            tied_to_ancestor: false,
        }
    }

    /// A label whose nodes never contain labeled descendants.
    pub const fn leaf(name: &'static str) -> Self {
        Self {
            name,
            is_leaf: true,
            tied_to_ancestor: false,
        }
    }

    /// Mark the label as tied to its ancestor.
    pub const fn tied(mut self) -> Self {
        self.tied_to_ancestor = true;
        self
    }
}

/// Read-only lookup table of per-label flags, built once from the adapter's
/// fixed label enumeration. Entry `i` describes `Label::new(i)`.
#[derive(Debug, Clone)]
pub struct LabelTable {
    entries: Vec<LabelInfo>,
}

impl LabelTable {
    /// Build a table from the label descriptions, in index order.
    ///
    /// # Panics
    ///
    /// Panics if there are more labels than fit a `u16` index.
    pub fn new(entries: impl IntoIterator<Item = LabelInfo>) -> Self {
        let entries: Vec<LabelInfo> = entries.into_iter().collect();
        assert!(
            entries.len() < usize::from(u16::MAX),
            "too many labels: {}",
            entries.len()
        );
        Self { entries }
    }

    /// Number of labels, not counting [`Label::IGNORED`].
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no labels at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `label` is [`Label::IGNORED`] or an index of this table.
    pub fn contains(&self, label: Label) -> bool {
        label.is_ignored() || label.index() < self.entries.len()
    }

    /// Whether nodes with this label cannot contain labeled nodes.
    ///
    /// The ignored label is never a leaf: traversal always looks through it.
    pub fn is_leaf(&self, label: Label) -> bool {
        !label.is_ignored() && self.info(label).is_leaf
    }

    /// Whether nodes with this label are tied to their labeled ancestor.
    pub fn tied_to_ancestor(&self, label: Label) -> bool {
        !label.is_ignored() && self.info(label).tied_to_ancestor
    }

    /// Name of the label, `"ignored"` for [`Label::IGNORED`].
    pub fn name(&self, label: Label) -> &'static str {
        if label.is_ignored() {
            "ignored"
        } else {
            self.info(label).name
        }
    }

    /// Iterate all labels of the table in index order.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        (0..self.entries.len()).map(|i| Label(i as u16))
    }

    fn info(&self, label: Label) -> &LabelInfo {
        match self.entries.get(label.index()) {
            Some(info) => info,
            None => panic!(
                "{label:?} is outside the label table ({} labels)",
                self.entries.len()
            ),
        }
    }
}
