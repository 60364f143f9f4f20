use std::fmt;

use tracing::{debug, warn};

use crate::error::{Cause, TransactionError};

/// A zero-argument fallible operation performing one unit of remote work.
///
/// `FnMut` because a tree may be committed and later rolled back, so an
/// action can run once per operation. No `Send` bound: execution is
/// strictly single-threaded and synchronous.
pub type Action<E> = Box<dyn FnMut() -> Result<(), E>>;

/// A unit of compensatable work.
///
/// Either a leaf holding a commit action and/or a compensating rollback
/// action, or a composite holding an ordered sequence of child
/// transactions. Built via [`new_transaction`](crate::new_transaction);
/// the two shapes are a tagged variant, so a node mixing its own actions
/// with children cannot be constructed.
///
/// Children are owned exclusively: appending a subtransaction moves it
/// into the parent, so no other holder can observe [`invert`] reshaping
/// the tree.
///
/// [`invert`]: Transaction::invert
pub struct Transaction<E> {
    pub(crate) kind: Kind<E>,
}

pub(crate) enum Kind<E> {
    Leaf {
        commit: Option<Action<E>>,
        rollback: Option<Action<E>>,
    },
    Composite(Vec<Transaction<E>>),
}

impl<E> Transaction<E> {
    /// Execute the transaction's forward effects.
    ///
    /// A leaf invokes its commit action (success if none is set). A
    /// composite commits its children strictly left-to-right; on the first
    /// child failure the already-completed children are rolled back
    /// most-recent-first, and no later child is attempted.
    ///
    /// If a compensating rollback itself fails, unwinding stops immediately
    /// and the children committed before it are left in their committed
    /// state. This partial inconsistency is deliberate: the returned error
    /// carries both the originating failure and the compensation failure.
    ///
    /// # Errors
    ///
    /// Returns a [`TransactionError`] with `commit_error` set to the
    /// originating failure and, if unwinding was cut short, `rollback_error`
    /// set to the compensation failure.
    pub fn commit(&mut self) -> Result<(), TransactionError<E>> {
        match &mut self.kind {
            Kind::Leaf { commit, .. } => match commit.as_mut() {
                Some(action) => {
                    action().map_err(|e| TransactionError::from_commit(Cause::Action(e)))
                }
                None => Ok(()),
            },
            Kind::Composite(children) => Self::commit_children(children),
        }
    }

    fn commit_children(children: &mut [Transaction<E>]) -> Result<(), TransactionError<E>> {
        let mut completed = 0;
        while completed < children.len() {
            match children[completed].commit() {
                Ok(()) => completed += 1,
                Err(cause) => {
                    debug!(completed, "subtransaction commit failed, unwinding");
                    for position in (0..completed).rev() {
                        if let Err(secondary) = children[position].rollback() {
                            warn!(
                                still_committed = position,
                                "unwind halted by rollback failure, leaving earlier subtransactions committed"
                            );
                            return Err(TransactionError::from_unwind(
                                Cause::Nested(Box::new(cause)),
                                Cause::Nested(Box::new(secondary)),
                            ));
                        }
                    }
                    return Err(TransactionError::from_commit(Cause::Nested(Box::new(
                        cause,
                    ))));
                }
            }
        }
        Ok(())
    }

    /// Undo the transaction's effects, best-effort.
    ///
    /// A leaf invokes its rollback action (success if none is set). A
    /// composite rolls its children back in reverse append order and stops
    /// at the first failure, leaving earlier-added children un-rolled-back.
    ///
    /// Unlike commit-triggered unwinding, standalone rollback offers no
    /// self-protection. Callers wanting a safely composable undo should
    /// [`invert`](Transaction::invert) the tree and commit it instead.
    ///
    /// # Errors
    ///
    /// Returns a [`TransactionError`] with `rollback_error` set to the
    /// first compensation failure encountered.
    pub fn rollback(&mut self) -> Result<(), TransactionError<E>> {
        match &mut self.kind {
            Kind::Leaf { rollback, .. } => match rollback.as_mut() {
                Some(action) => {
                    action().map_err(|e| TransactionError::from_rollback(Cause::Action(e)))
                }
                None => Ok(()),
            },
            Kind::Composite(children) => {
                for (position, child) in children.iter_mut().enumerate().rev() {
                    if let Err(cause) = child.rollback() {
                        debug!(position, "rollback halted by subtransaction failure");
                        return Err(TransactionError::from_rollback(Cause::Nested(Box::new(
                            cause,
                        ))));
                    }
                }
                Ok(())
            }
        }
    }

    /// Swap the commit/rollback roles and reverse child order, recursively.
    ///
    /// The inverted tree's [`commit`](Transaction::commit) performs exactly
    /// the side effects the original's rollback would have, but with full
    /// unwind protection. Inverting twice restores the original structure.
    #[must_use]
    pub fn invert(self) -> Self {
        let kind = match self.kind {
            Kind::Leaf { commit, rollback } => Kind::Leaf {
                commit: rollback,
                rollback: commit,
            },
            Kind::Composite(children) => Kind::Composite(
                children.into_iter().rev().map(Transaction::invert).collect(),
            ),
        };
        Self { kind }
    }
}

impl<E> fmt::Debug for Transaction<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Leaf { commit, rollback } => f
                .debug_struct("Leaf")
                .field("commit", &commit.is_some())
                .field("rollback", &rollback.is_some())
                .finish(),
            Kind::Composite(children) => {
                f.debug_tuple("Composite").field(children).finish()
            }
        }
    }
}
