use std::io;

use thiserror::Error;

/// Errors reported by chart-of-accounts operations.
///
/// Every fallible operation returns one of these kinds so callers can tell
/// the outcomes apart; nothing is swallowed or retried internally. Mutating
/// operations that fail leave the forest exactly as it was.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChartError {
    /// The account number is already present in the forest.
    #[error("account {0} already exists")]
    DuplicateAccount(u32),

    /// The numbering scheme yields no parent or root slot for the number,
    /// or the required parent account is not in the forest.
    #[error("account {0} has no valid place in the chart hierarchy")]
    InvalidHierarchyPlacement(u32),

    /// No account with this number exists.
    #[error("account {0} not found")]
    AccountNotFound(u32),

    /// The transaction index is outside the account's current sequence.
    #[error("transaction index {index} out of range (account holds {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// A persisted file cannot be rebuilt into a valid forest; the load is
    /// abandoned as a whole.
    #[error("corrupt persisted state at line {line}: {reason}")]
    CorruptPersistedState { line: usize, reason: String },

    /// A zero-amount transaction has no balance effect and is rejected.
    #[error("transaction amount must be non-zero")]
    ZeroAmount,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_account() {
        assert_eq!(
            ChartError::DuplicateAccount(1100).to_string(),
            "account 1100 already exists"
        );
        assert_eq!(
            ChartError::AccountNotFound(4000).to_string(),
            "account 4000 not found"
        );
    }

    #[test]
    fn display_reports_index_bounds() {
        let err = ChartError::IndexOutOfRange { index: 3, count: 2 };
        assert_eq!(
            err.to_string(),
            "transaction index 3 out of range (account holds 2)"
        );
    }

    #[test]
    fn display_carries_the_corrupt_line() {
        let err = ChartError::CorruptPersistedState {
            line: 7,
            reason: "invalid balance 'ten'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt persisted state at line 7: invalid balance 'ten'"
        );
    }
}
