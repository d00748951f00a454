//! Body-level diffing: the matching driver and active statement remapping.
//!
//! A method body is matched in *regions*. The outermost region is the body
//! itself; every pair of lambdas or local functions matched inside a region
//! becomes a region of its own, rooted at that pair. Regions discovered by the
//! same wave are independent and are matched in parallel.

use rayon::prelude::*;
use tether::{
    Classification, Edit, EditCounts, EditScript, MatchError, MatchStats, MatchingConfig,
    TreeComparer, compute_match_cancellable,
};

use crate::comparer::StatementComparer;
use crate::syntax::{SyntaxRef, SyntaxTree};
use crate::{debug, trace};

type NodePair<'t> = (SyntaxRef<'t>, SyntaxRef<'t>);

/// Result of matching one region.
#[derive(Debug, Clone)]
pub struct RegionDiff<'t> {
    old_root: SyntaxRef<'t>,
    new_root: SyntaxRef<'t>,
    depth: usize,
    script: EditScript<SyntaxRef<'t>>,
    stats: MatchStats,
}

impl<'t> RegionDiff<'t> {
    pub fn old_root(&self) -> SyntaxRef<'t> {
        self.old_root
    }

    pub fn new_root(&self) -> SyntaxRef<'t> {
        self.new_root
    }

    /// Closure nesting depth, 0 for the outermost region.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn script(&self) -> &EditScript<SyntaxRef<'t>> {
        &self.script
    }

    pub fn stats(&self) -> MatchStats {
        self.stats
    }

    /// Whether nothing changed in this region.
    pub fn is_unchanged(&self) -> bool {
        self.script.is_subtree_unchanged(self.old_root)
    }

    /// Edits of this region. A nested region does not repeat the update of
    /// its root pair, which its enclosing region already reports.
    pub fn edits(&self) -> impl Iterator<Item = &Edit<SyntaxRef<'t>>> + '_ {
        self.script.edits().iter().filter(move |edit| {
            !(self.depth > 0
                && matches!(edit, Edit::Update { old, .. } if *old == self.old_root))
        })
    }
}

/// Where an active statement lands after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveStatementMapping<'t> {
    /// The statement survived and has this counterpart.
    Exact(SyntaxRef<'t>),
    /// The statement was deleted; `ancestor` is its nearest surviving
    /// ancestor in the old tree and `new` the counterpart of that ancestor.
    Ancestor {
        ancestor: SyntaxRef<'t>,
        new: SyntaxRef<'t>,
    },
    /// Nothing above the statement survived inside the diffed regions.
    Unmapped,
}

impl<'t> ActiveStatementMapping<'t> {
    /// The new-tree node execution resumes at, if any.
    pub fn new_node(&self) -> Option<SyntaxRef<'t>> {
        match *self {
            ActiveStatementMapping::Exact(new) | ActiveStatementMapping::Ancestor { new, .. } => {
                Some(new)
            }
            ActiveStatementMapping::Unmapped => None,
        }
    }
}

/// Matching of a whole body, closures included.
#[derive(Debug, Clone)]
pub struct BodyDiff<'t> {
    regions: Vec<RegionDiff<'t>>,
}

impl<'t> BodyDiff<'t> {
    /// Regions in discovery order: the outermost first, then closures by
    /// nesting depth.
    pub fn regions(&self) -> &[RegionDiff<'t>] {
        &self.regions
    }

    /// The outermost region.
    pub fn root(&self) -> &RegionDiff<'t> {
        &self.regions[0]
    }

    /// All edits, region by region.
    pub fn edits(&self) -> impl Iterator<Item = &Edit<SyntaxRef<'t>>> + '_ {
        self.regions.iter().flat_map(|region| region.edits())
    }

    pub fn counts(&self) -> EditCounts {
        EditCounts::from_edits(self.edits())
    }

    pub fn has_changes(&self) -> bool {
        self.edits().next().is_some()
    }

    /// Counterpart of an old node, searching every region.
    pub fn map_old_to_new(&self, old: SyntaxRef<'t>) -> Option<SyntaxRef<'t>> {
        self.regions
            .iter()
            .find_map(|region| region.script.map_old_to_new(old))
    }

    /// Counterpart of a new node, searching every region.
    pub fn map_new_to_old(&self, new: SyntaxRef<'t>) -> Option<SyntaxRef<'t>> {
        self.regions
            .iter()
            .find_map(|region| region.script.map_new_to_old(new))
    }

    /// Classification of an old node; `None` for unlabeled nodes and nodes
    /// outside the diffed regions.
    ///
    /// A closure is classified by its own region. A node is only unchanged if
    /// no closure below it changed either.
    pub fn classify_old(&self, old: SyntaxRef<'t>) -> Option<Classification> {
        let class = self
            .regions
            .iter()
            .rev()
            .find_map(|region| region.script.classify_old(old))?;
        Some(self.with_closures(class, old, RegionDiff::old_root))
    }

    pub fn classify_new(&self, new: SyntaxRef<'t>) -> Option<Classification> {
        let class = self
            .regions
            .iter()
            .rev()
            .find_map(|region| region.script.classify_new(new))?;
        Some(self.with_closures(class, new, RegionDiff::new_root))
    }

    fn with_closures(
        &self,
        class: Classification,
        node: SyntaxRef<'t>,
        root_of: impl Fn(&RegionDiff<'t>) -> SyntaxRef<'t>,
    ) -> Classification {
        if class != Classification::Unchanged {
            return class;
        }
        let changed_below = self
            .regions
            .iter()
            .skip(1)
            .any(|region| !region.is_unchanged() && is_below(root_of(region), node));
        if changed_below {
            Classification::Updated
        } else {
            class
        }
    }

    /// Carry an active statement of the old body over to the new body.
    ///
    /// A surviving statement maps to its counterpart. A deleted one maps to
    /// the counterpart of its nearest surviving ancestor.
    pub fn remap_active_statement(&self, old: SyntaxRef<'t>) -> ActiveStatementMapping<'t> {
        if let Some(new) = self.map_old_to_new(old) {
            return ActiveStatementMapping::Exact(new);
        }
        let mut current = old.parent();
        while let Some(ancestor) = current {
            if let Some(new) = self.map_old_to_new(ancestor) {
                trace!(?old, ?ancestor, ?new, "active statement falls back to ancestor");
                return ActiveStatementMapping::Ancestor { ancestor, new };
            }
            current = ancestor.parent();
        }
        ActiveStatementMapping::Unmapped
    }
}

/// Whether `node` lies strictly inside `ancestor`.
fn is_below(node: SyntaxRef<'_>, ancestor: SyntaxRef<'_>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        current = parent.parent();
    }
    false
}

/// Match the old version of a body against the new one.
pub fn diff_bodies<'t>(
    old: &'t SyntaxTree,
    new: &'t SyntaxTree,
    config: &MatchingConfig,
) -> BodyDiff<'t> {
    match diff_bodies_cancellable(old, new, config, || false) {
        Ok(diff) => diff,
        Err(err) => unreachable!("diffing without cancellation failed: {err}"),
    }
}

/// Like [`diff_bodies`], giving up with [`MatchError::Cancelled`] once
/// `is_cancelled` returns true.
pub fn diff_bodies_cancellable<'t>(
    old: &'t SyntaxTree,
    new: &'t SyntaxTree,
    config: &MatchingConfig,
    is_cancelled: impl Fn() -> bool + Sync,
) -> Result<BodyDiff<'t>, MatchError> {
    diff_regions(old.root_ref(), new.root_ref(), config, &is_cancelled)
}

/// Match an edited statement against its counterpart, closures included.
///
/// The two statements must come from different trees.
pub fn diff_statements<'t>(
    old: SyntaxRef<'t>,
    new: SyntaxRef<'t>,
    config: &MatchingConfig,
) -> BodyDiff<'t> {
    match diff_regions(old, new, config, &|| false) {
        Ok(diff) => diff,
        Err(err) => unreachable!("diffing without cancellation failed: {err}"),
    }
}

fn diff_regions<'t>(
    old_root: SyntaxRef<'t>,
    new_root: SyntaxRef<'t>,
    config: &MatchingConfig,
    is_cancelled: &(impl Fn() -> bool + Sync),
) -> Result<BodyDiff<'t>, MatchError> {
    let mut regions = Vec::new();
    let mut wave: Vec<NodePair<'t>> = vec![(old_root, new_root)];
    let mut depth = 0;

    while !wave.is_empty() {
        debug!(depth, regions = wave.len(), "matching region wave");
        let results = wave
            .par_iter()
            .map(|&(old, new)| diff_region(old, new, depth, config, is_cancelled))
            .collect::<Result<Vec<_>, _>>()?;

        wave = Vec::new();
        for (region, nested) in results {
            regions.push(region);
            wave.extend(nested);
        }
        depth += 1;
    }

    debug!(regions = regions.len(), "body diff done");
    Ok(BodyDiff { regions })
}

fn diff_region<'t>(
    old_root: SyntaxRef<'t>,
    new_root: SyntaxRef<'t>,
    depth: usize,
    config: &MatchingConfig,
    is_cancelled: &(impl Fn() -> bool + Sync),
) -> Result<(RegionDiff<'t>, Vec<NodePair<'t>>), MatchError> {
    let m = compute_match_cancellable(
        StatementComparer::new(),
        old_root,
        new_root,
        config,
        is_cancelled,
    )?;
    debug_assert_eq!(m.verify(), Ok(()));

    let comparer = m.view().comparer();
    let nested: Vec<NodePair<'t>> = m
        .matching()
        .pairs()
        .filter(|&(old, new)| {
            old != old_root && comparer.is_opaque(old) && comparer.is_opaque(new)
        })
        .collect();
    trace!(?old_root, nested = nested.len(), "region matched");

    let region = RegionDiff {
        old_root,
        new_root,
        depth,
        script: m.edit_script(),
        stats: m.stats(),
    };
    Ok((region, nested))
}
