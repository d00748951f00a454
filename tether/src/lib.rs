//! # Tether
//!
//! Label-driven syntax tree matching for edit-and-continue tooling.
//!
//! Given the syntax tree of a method body before and after a source edit,
//! tether computes which nodes of the old tree correspond to which nodes of the
//! new tree, and classifies every node as unchanged, updated, inserted or
//! deleted. Callers use the correspondence to carry runtime state tied to
//! statements (breakpoints, active frames) across the edit.
//!
//! ## Algorithm Overview
//!
//! Matching is top-down from a pair of virtual roots, driven by a pluggable
//! [`TreeComparer`] that labels nodes and scores their similarity:
//!
//! 1. **Label buckets**: children of a matched pair are partitioned by label;
//!    only same-label nodes are candidates
//! 2. **LCS pass**: runs of value-equal nodes are paired in order
//! 3. **Residual pass**: leftovers are paired greedily by lowest distance
//! 4. **Descent**: every new non-leaf pair is matched the same way
//! 5. **Cross-parent pass** (optional): leftover nodes that moved under a
//!    different parent are paired when similar enough
//!
//! Labels marked *tied to ancestor* only match together with their parent.
//! Opaque nodes (closures) are matched as leaves; their bodies are matched by
//! a separate invocation rooted at the pair.
//!
//! ## Usage
//!
//! ```ignore
//! use tether::{MatchingConfig, compute_match};
//!
//! let m = compute_match(&comparer, old_root, new_root, &MatchingConfig::default());
//! let script = m.edit_script();
//! for edit in script.edits() {
//!     println!("{edit}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

mod comparer;
/// Distance combinators for adapters
pub mod distance;
mod edit_script;
mod error;
mod label;
/// Longest common subsequence
pub mod lcs;
/// Label-driven node matching
pub mod matching;
mod simplify;
mod view;

#[cfg(test)]
mod test_tree;

pub use comparer::TreeComparer;
pub use edit_script::{Classification, Edit, EditCounts, EditScript, generate_edit_script};
pub use error::MatchError;
pub use label::{Label, LabelInfo, LabelTable};
pub use matching::*;
pub use simplify::condense_edits;
pub use view::TreeView;

/// Match two trees and build the edit script in one go.
///
/// This is the main entry point when only the classification is needed. Use
/// [`compute_match`] to keep the [`Match`] around, for example to call
/// [`Match::verify`].
pub fn diff_trees<C: TreeComparer>(
    comparer: C,
    old_root: C::Node,
    new_root: C::Node,
    config: &MatchingConfig,
) -> EditScript<C::Node> {
    compute_match(comparer, old_root, new_root, config).edit_script()
}
