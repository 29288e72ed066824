use std::fmt;

use rust_decimal::Decimal;

use crate::error::ChartError;

/// Debit/credit designation of a transaction.
///
/// Whether a side raises or lowers a balance is not decided here; that is
/// the forest's sign-convention policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    /// Single-letter code used in the transaction log.
    pub fn code(&self) -> char {
        match self {
            Side::Debit => 'D',
            Side::Credit => 'C',
        }
    }

    /// Inverse of [`Side::code`], case-insensitive.
    pub fn from_code(code: char) -> Option<Side> {
        match code.to_ascii_uppercase() {
            'D' => Some(Side::Debit),
            'C' => Some(Side::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single debit or credit recorded against an account.
///
/// Immutable once constructed; deleting one removes it from its account's
/// sequence and reverses its balance effect, it is never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    amount: Decimal,
    side: Side,
}

impl Transaction {
    /// Builds a transaction. The amount is signed and must be non-zero: a
    /// zero transaction moves no balance and cannot be reversed
    /// meaningfully.
    pub fn new(amount: Decimal, side: Side) -> Result<Transaction, ChartError> {
        if amount.is_zero() {
            return Err(ChartError::ZeroAmount);
        }
        Ok(Transaction { amount, side })
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn side(&self) -> Side {
        self.side
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.side)
    }
}
