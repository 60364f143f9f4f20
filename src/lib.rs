//! Nested compensating transactions for multi-step remote operations.
//!
//! This crate makes a sequence of remote API calls behave atomically even
//! though the remote side has no transactions of its own: each step
//! registers a commit action and a compensating rollback action, and if any
//! step fails, every already-completed step is undone in reverse order
//! (LIFO) and the whole operation is reported as a single failure.
//!
//! Transactions nest: a node is either a leaf with actions or a composite
//! of child transactions, and composites unwind their completed children
//! before propagating. [`Transaction::invert`] turns a tree into its own
//! undo operation, so "delete" workflows get the same unwind protection as
//! "create" workflows.
//!
//! ```
//! use txn_tree::new_transaction;
//!
//! let mut tx = new_transaction::<&'static str, _>(|t| {
//!     t.subtransaction_with(|t| {
//!         t.on_commit(|| Ok(()))
//!             .on_rollback(|| Ok(()));
//!     });
//!     t.subtransaction_with(|t| {
//!         t.on_commit(|| Ok(()));
//!     });
//! })?;
//!
//! tx.commit()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod error;
mod transaction;

pub use builder::{TransactionBuilder, new_transaction};
pub use error::{BuildError, Cause, TransactionError};
pub use transaction::{Action, Transaction};
