//! Edit-and-continue statement matching for C-like method bodies, built on
//! tether.
//!
//! encore provides:
//! - **Syntax trees**: a statement-level syntax model, described with
//!   [`Syntax`] and frozen into an arena-backed [`SyntaxTree`]
//! - **Statement comparer**: labels, equality and similarity of statements
//!   for the tether matching engine
//! - **Body diffing**: matching of a whole body, lambdas included, and
//!   remapping of active statements onto the new body
//!
//! # Example
//!
//! ```rust
//! use encore::{ActiveStatementMapping, MatchingConfig, Syntax, SyntaxKind, SyntaxTree, diff_bodies};
//!
//! let old = SyntaxTree::build(Syntax::method_body([
//!     Syntax::statement("A()"),
//!     Syntax::statement("B()"),
//! ]))
//! .unwrap();
//! let new = SyntaxTree::build(Syntax::method_body([
//!     Syntax::statement("A()"),
//!     Syntax::statement("Log()"),
//!     Syntax::statement("B()"),
//! ]))
//! .unwrap();
//!
//! let diff = diff_bodies(&old, &new, &MatchingConfig::default());
//! assert_eq!(diff.counts().inserts, 1);
//!
//! // a thread stopped at `B()` resumes at the same statement in the new body
//! let b = old.find(SyntaxKind::ExpressionStatement, "B()").unwrap();
//! let expected = new.find(SyntaxKind::ExpressionStatement, "B()").unwrap();
//! assert_eq!(diff.remap_active_statement(b), ActiveStatementMapping::Exact(expected));
//! ```

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

pub mod comparer;
pub mod diff;
pub mod syntax;

pub use comparer::{StatementComparer, StatementLabel};
pub use diff::{
    ActiveStatementMapping, BodyDiff, RegionDiff, diff_bodies, diff_bodies_cancellable,
    diff_statements,
};
pub use syntax::{BuildError, Syntax, SyntaxKind, SyntaxRef, SyntaxTree};

// Re-export the engine types that appear in this crate's API
pub use tether::{self, Classification, Edit, EditCounts, MatchError, MatchingConfig};
