//! Edit script condensation.
//!
//! Consolidates redundant operations:
//! - When a subtree is inserted, don't report individual descendant inserts
//! - When a subtree is deleted, don't report individual descendant deletes

use core::hash::Hash;

use rapidhash::RapidHashSet as HashSet;

use crate::edit_script::Edit;
use crate::{debug, trace};

/// Drop inserts whose parent is inserted and deletes whose parent is deleted.
///
/// Updates, moves and reorders are always kept: they describe matched nodes,
/// which stay meaningful whatever happens around them.
pub fn condense_edits<N: Copy + Eq + Hash>(
    edits: Vec<Edit<N>>,
    old_parent: impl Fn(N) -> Option<N>,
    new_parent: impl Fn(N) -> Option<N>,
) -> Vec<Edit<N>> {
    let mut inserted: HashSet<N> = HashSet::default();
    let mut deleted: HashSet<N> = HashSet::default();
    for edit in &edits {
        match edit {
            Edit::Insert { new, .. } => {
                inserted.insert(*new);
            }
            Edit::Delete { old, .. } => {
                deleted.insert(*old);
            }
            Edit::Update { .. } | Edit::Move { .. } | Edit::Reorder { .. } => {}
        }
    }
    debug!(
        inserted = inserted.len(),
        deleted = deleted.len(),
        "condense_edits start"
    );

    let result: Vec<Edit<N>> = edits
        .into_iter()
        .filter(|edit| {
            let dominated = match edit {
                Edit::Insert { new, .. } => new_parent(*new).is_some_and(|p| inserted.contains(&p)),
                Edit::Delete { old, .. } => old_parent(*old).is_some_and(|p| deleted.contains(&p)),
                Edit::Update { .. } | Edit::Move { .. } | Edit::Reorder { .. } => false,
            };
            if dominated {
                trace!("condense: dropping dominated edit");
            }
            !dominated
        })
        .collect();

    debug!(after = result.len(), "condense_edits done");
    result
}
