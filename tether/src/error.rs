use facet::Facet;

/// Errors reported by matching.
///
/// Adapter contract violations seen while matching panic instead: a matching
/// built on inconsistent input is not worth returning.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum MatchError {
    /// matching was cancelled
    Cancelled,

    /// node {node} is mapped to more than one counterpart
    NotInjective {
        /// Description of the offending node
        node: String,
    },

    /// matched pair {old} / {new} has different labels
    LabelMismatch {
        /// Description of the old node
        old: String,
        /// Description of the new node
        new: String,
    },

    /// tied node {old} is matched to {new} but their labeled ancestors are not matched to each other
    DetachedFromAncestor {
        /// Description of the tied old node
        old: String,
        /// Description of its counterpart
        new: String,
    },
}
