use std::error::Error;
use std::fmt;

/// Error from sealing a malformed transaction node.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    /// The builder received both leaf actions and subtransactions.
    #[error("a transaction node cannot combine its own actions with subtransactions")]
    MixedNode,
}

/// One cause carried by a [`TransactionError`].
///
/// A leaf wraps its action's own error; a composite wraps the aggregate
/// error of the failing child, exactly one level deep. Deeply nested trees
/// therefore produce chains of nested `TransactionError`s.
#[derive(Debug)]
pub enum Cause<E> {
    /// A leaf action's own error.
    Action(E),
    /// The aggregate error of a nested transaction.
    Nested(Box<TransactionError<E>>),
}

impl<E: fmt::Display> fmt::Display for Cause<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Action(error) => error.fmt(f),
            Cause::Nested(error) => error.fmt(f),
        }
    }
}

impl<E> Error for Cause<E>
where
    E: fmt::Debug + fmt::Display + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Cause::Action(_) => None,
            Cause::Nested(error) => Some(error.as_ref()),
        }
    }
}

/// Aggregate failure of a transaction.
///
/// Carries the failure that triggered unwinding (or the direct leaf
/// failure) and, when compensation itself failed, the secondary failure
/// encountered while unwinding. At least one of the two causes is present.
#[derive(Debug)]
pub struct TransactionError<E> {
    /// The failure that triggered unwinding, or the direct leaf-commit
    /// failure. `None` for standalone rollback failures.
    pub commit_error: Option<Cause<E>>,
    /// A failure encountered while compensating.
    pub rollback_error: Option<Cause<E>>,
}

impl<E> TransactionError<E> {
    pub(crate) fn from_commit(cause: Cause<E>) -> Self {
        Self {
            commit_error: Some(cause),
            rollback_error: None,
        }
    }

    pub(crate) fn from_rollback(cause: Cause<E>) -> Self {
        Self {
            commit_error: None,
            rollback_error: Some(cause),
        }
    }

    pub(crate) fn from_unwind(commit: Cause<E>, rollback: Cause<E>) -> Self {
        Self {
            commit_error: Some(commit),
            rollback_error: Some(rollback),
        }
    }
}

impl<E: fmt::Display> fmt::Display for TransactionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A cause that renders an empty message contributes no text but
        // remains a structural cause.
        let commit = self
            .commit_error
            .as_ref()
            .map(|cause| cause.to_string())
            .filter(|message| !message.is_empty());
        let rollback = self
            .rollback_error
            .as_ref()
            .map(|cause| cause.to_string())
            .filter(|message| !message.is_empty());

        match (commit, rollback) {
            (Some(commit), Some(rollback)) => {
                write!(
                    f,
                    "commit failed with: {commit}; rollback failed with: {rollback}"
                )
            }
            (Some(commit), None) => write!(f, "commit failed with: {commit}"),
            (None, Some(rollback)) => write!(f, "rollback failed with: {rollback}"),
            (None, None) => Ok(()),
        }
    }
}

impl<E> Error for TransactionError<E>
where
    E: fmt::Debug + fmt::Display + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.commit_error
            .as_ref()
            .or_else(|| self.rollback_error.as_ref())
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct TestError(String);

    #[derive(Debug)]
    struct SilentError;

    impl fmt::Display for SilentError {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Ok(())
        }
    }

    #[test]
    fn commit_only_message() {
        let error =
            TransactionError::from_commit(Cause::Action(TestError("boom".to_string())));

        assert_eq!(error.to_string(), "commit failed with: boom");
    }

    #[test]
    fn rollback_only_message() {
        let error =
            TransactionError::from_rollback(Cause::Action(TestError("undo boom".to_string())));

        assert_eq!(error.to_string(), "rollback failed with: undo boom");
    }

    #[test]
    fn both_causes_join_with_separator() {
        let error = TransactionError::from_unwind(
            Cause::Action(TestError("boom".to_string())),
            Cause::Action(TestError("undo boom".to_string())),
        );

        assert_eq!(
            error.to_string(),
            "commit failed with: boom; rollback failed with: undo boom"
        );
    }

    #[test]
    fn empty_message_is_structural_but_not_textual() {
        let error = TransactionError::from_unwind(
            Cause::Action(SilentError),
            Cause::Action(SilentError),
        );

        assert_eq!(error.to_string(), "");
        assert!(error.commit_error.is_some());
        assert!(error.rollback_error.is_some());
    }

    #[test]
    fn nested_cause_renders_inner_message() {
        let inner =
            TransactionError::from_commit(Cause::Action(TestError("deep".to_string())));
        let outer = TransactionError::from_commit(Cause::Nested(Box::new(inner)));

        assert_eq!(
            outer.to_string(),
            "commit failed with: commit failed with: deep"
        );
    }

    #[test]
    fn source_chain_reaches_nested_error() {
        let inner =
            TransactionError::from_commit(Cause::Action(TestError("deep".to_string())));
        let outer = TransactionError::from_commit(Cause::Nested(Box::new(inner)));

        let cause = Error::source(&outer).expect("outer has a cause");
        assert!(Error::source(cause).is_some(), "nested cause chains further");
    }
}
