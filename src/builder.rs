use std::mem;

use crate::error::BuildError;
use crate::transaction::{Action, Kind, Transaction};

/// Build a transaction node by running `build` against a fresh builder.
///
/// The closure registers the node's actions or appends subtransactions;
/// construction is eager and depth-first, so every child is fully built
/// before it is appended. A closure that registers nothing seals to an
/// inert leaf whose commit and rollback both succeed.
///
/// # Errors
///
/// Returns [`BuildError::MixedNode`] if the closure registered both leaf
/// actions and subtransactions on the same node (at any depth).
pub fn new_transaction<E, F>(build: F) -> Result<Transaction<E>, BuildError>
where
    F: FnOnce(&mut TransactionBuilder<E>),
{
    let mut builder = TransactionBuilder::new();
    build(&mut builder);
    builder.seal()
}

/// Builder for a single transaction node.
///
/// A node is either a leaf (actions set via [`on_commit`] / [`on_rollback`])
/// or a composite (children appended via [`subtransaction`] /
/// [`subtransaction_with`]). Mixing the two on one node poisons the builder
/// and surfaces as an error when the node is sealed.
///
/// [`on_commit`]: TransactionBuilder::on_commit
/// [`on_rollback`]: TransactionBuilder::on_rollback
/// [`subtransaction`]: TransactionBuilder::subtransaction
/// [`subtransaction_with`]: TransactionBuilder::subtransaction_with
pub struct TransactionBuilder<E> {
    state: State<E>,
}

enum State<E> {
    Empty,
    Leaf {
        commit: Option<Action<E>>,
        rollback: Option<Action<E>>,
    },
    Composite(Vec<Transaction<E>>),
    Poisoned(BuildError),
}

impl<E> TransactionBuilder<E> {
    fn new() -> Self {
        Self {
            state: State::Empty,
        }
    }

    /// Set the node's commit action. A later call replaces an earlier one.
    pub fn on_commit(&mut self, action: impl FnMut() -> Result<(), E> + 'static) -> &mut Self {
        let action: Action<E> = Box::new(action);
        self.state = match mem::replace(&mut self.state, State::Empty) {
            State::Empty => State::Leaf {
                commit: Some(action),
                rollback: None,
            },
            State::Leaf { rollback, .. } => State::Leaf {
                commit: Some(action),
                rollback,
            },
            State::Composite(_) => State::Poisoned(BuildError::MixedNode),
            poisoned @ State::Poisoned(_) => poisoned,
        };
        self
    }

    /// Set the node's compensating rollback action. A later call replaces
    /// an earlier one.
    pub fn on_rollback(&mut self, action: impl FnMut() -> Result<(), E> + 'static) -> &mut Self {
        let action: Action<E> = Box::new(action);
        self.state = match mem::replace(&mut self.state, State::Empty) {
            State::Empty => State::Leaf {
                commit: None,
                rollback: Some(action),
            },
            State::Leaf { commit, .. } => State::Leaf {
                commit,
                rollback: Some(action),
            },
            State::Composite(_) => State::Poisoned(BuildError::MixedNode),
            poisoned @ State::Poisoned(_) => poisoned,
        };
        self
    }

    /// Append an already-built node as the next child, taking ownership.
    pub fn subtransaction(&mut self, child: Transaction<E>) -> &mut Self {
        self.state = match mem::replace(&mut self.state, State::Empty) {
            State::Empty => State::Composite(vec![child]),
            State::Composite(mut children) => {
                children.push(child);
                State::Composite(children)
            }
            State::Leaf { .. } => State::Poisoned(BuildError::MixedNode),
            poisoned @ State::Poisoned(_) => poisoned,
        };
        self
    }

    /// Build a child node via the same construction rule and append it.
    pub fn subtransaction_with<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut TransactionBuilder<E>),
    {
        match new_transaction(build) {
            Ok(child) => self.subtransaction(child),
            Err(error) => {
                if !matches!(self.state, State::Poisoned(_)) {
                    self.state = State::Poisoned(error);
                }
                self
            }
        }
    }

    fn seal(self) -> Result<Transaction<E>, BuildError> {
        let kind = match self.state {
            State::Empty => Kind::Leaf {
                commit: None,
                rollback: None,
            },
            State::Leaf { commit, rollback } => Kind::Leaf { commit, rollback },
            State::Composite(children) => Kind::Composite(children),
            State::Poisoned(error) => return Err(error),
        };
        Ok(Transaction { kind })
    }
}
