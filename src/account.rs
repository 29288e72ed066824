use rust_decimal::Decimal;

use crate::error::ChartError;
use crate::transaction::{Side, Transaction};

/// Account categories of a standard chart, read from the leading decimal
/// digit of the account number: 1 assets, 2 liabilities, 3 equity,
/// 4 revenue, 5 and up the expense families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountKind {
    pub fn from_number(number: u32) -> AccountKind {
        let mut leading = number;
        while leading >= 10 {
            leading /= 10;
        }
        match leading {
            1 => AccountKind::Asset,
            2 => AccountKind::Liability,
            3 => AccountKind::Equity,
            4 => AccountKind::Revenue,
            _ => AccountKind::Expense,
        }
    }

    /// The side on which accounts of this kind grow: assets and expenses
    /// are debit-normal, liabilities, equity and revenue credit-normal.
    pub fn normal_side(&self) -> Side {
        match self {
            AccountKind::Asset | AccountKind::Expense => Side::Debit,
            AccountKind::Liability | AccountKind::Equity | AccountKind::Revenue => Side::Credit,
        }
    }
}

/// Maps a transaction's side to the sign of its balance effect.
///
/// Chosen once per forest and applied uniformly; removal uses the same
/// mapping, so reversing a transaction always undoes exactly what applying
/// it did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignConvention {
    /// Debits add and credits subtract on every account.
    #[default]
    DebitPositive,
    /// A transaction on the account's normal side adds, the opposite side
    /// subtracts; the account's kind comes from its leading digit.
    NormalBalance,
}

impl SignConvention {
    /// The signed balance delta `txn` causes on account `number`.
    pub fn signed_amount(&self, number: u32, txn: &Transaction) -> Decimal {
        let grows_on = match self {
            SignConvention::DebitPositive => Side::Debit,
            SignConvention::NormalBalance => AccountKind::from_number(number).normal_side(),
        };
        if txn.side() == grows_on {
            txn.amount()
        } else {
            -txn.amount()
        }
    }
}

/// One account record: number, description, running balance and the
/// append-ordered transaction history behind that balance.
///
/// The balance is only reachable through [`Account::apply_transaction`] and
/// [`Account::remove_transaction`], which keep it and the transaction
/// sequence in step as a single observable update.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    number: u32,
    description: String,
    balance: Decimal,
    transactions: Vec<Transaction>,
}

impl Account {
    pub fn new(number: u32, description: impl Into<String>, balance: Decimal) -> Account {
        Account {
            number,
            description: description.into(),
            balance,
            transactions: Vec::new(),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Transactions in application order, addressable by index from 0.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Appends `txn` and moves the balance by its signed amount.
    pub fn apply_transaction(&mut self, txn: Transaction, convention: SignConvention) {
        self.balance += convention.signed_amount(self.number, &txn);
        self.transactions.push(txn);
    }

    /// Removes the transaction at `index` and reverses its balance effect.
    /// Fails with `IndexOutOfRange` without touching anything when `index`
    /// is not a current position.
    pub fn remove_transaction(
        &mut self,
        index: usize,
        convention: SignConvention,
    ) -> Result<Transaction, ChartError> {
        if index >= self.transactions.len() {
            return Err(ChartError::IndexOutOfRange {
                index,
                count: self.transactions.len(),
            });
        }
        let txn = self.transactions.remove(index);
        self.balance -= convention.signed_amount(self.number, &txn);
        Ok(txn)
    }

    /// Reattaches a transaction read back from the log without moving the
    /// balance: the chart file already stores the post-transaction balance.
    pub(crate) fn restore_transaction(&mut self, txn: Transaction) {
        self.transactions.push(txn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn debit(amount: Decimal) -> Transaction {
        Transaction::new(amount, Side::Debit).unwrap()
    }

    fn credit(amount: Decimal) -> Transaction {
        Transaction::new(amount, Side::Credit).unwrap()
    }

    #[test]
    fn kind_follows_the_leading_digit() {
        assert_eq!(AccountKind::from_number(1100), AccountKind::Asset);
        assert_eq!(AccountKind::from_number(2300), AccountKind::Liability);
        assert_eq!(AccountKind::from_number(3000), AccountKind::Equity);
        assert_eq!(AccountKind::from_number(4010), AccountKind::Revenue);
        assert_eq!(AccountKind::from_number(5000), AccountKind::Expense);
        assert_eq!(AccountKind::from_number(6200), AccountKind::Expense);
    }

    #[test]
    fn apply_and_remove_restore_the_balance() {
        let mut account = Account::new(1100, "Cash", dec!(100));
        account.apply_transaction(debit(dec!(500)), SignConvention::DebitPositive);
        account.apply_transaction(credit(dec!(120)), SignConvention::DebitPositive);
        assert_eq!(account.balance(), dec!(480));
        assert_eq!(account.transactions().len(), 2);

        account
            .remove_transaction(1, SignConvention::DebitPositive)
            .unwrap();
        assert_eq!(account.balance(), dec!(600));
        account
            .remove_transaction(0, SignConvention::DebitPositive)
            .unwrap();
        assert_eq!(account.balance(), dec!(100));
        assert!(account.transactions().is_empty());
    }

    #[test]
    fn remove_out_of_range_leaves_the_account_alone() {
        let mut account = Account::new(1100, "Cash", dec!(0));
        account.apply_transaction(debit(dec!(10)), SignConvention::DebitPositive);

        let err = account
            .remove_transaction(1, SignConvention::DebitPositive)
            .unwrap_err();
        assert!(matches!(
            err,
            ChartError::IndexOutOfRange { index: 1, count: 1 }
        ));
        assert_eq!(account.balance(), dec!(10));
        assert_eq!(account.transactions().len(), 1);
    }

    #[test]
    fn normal_balance_grows_liabilities_on_credit() {
        let mut liability = Account::new(2100, "Accounts Payable", dec!(0));
        liability.apply_transaction(credit(dec!(250)), SignConvention::NormalBalance);
        assert_eq!(liability.balance(), dec!(250));
        liability.apply_transaction(debit(dec!(100)), SignConvention::NormalBalance);
        assert_eq!(liability.balance(), dec!(150));

        // same sequence under the uniform convention moves the other way
        let mut uniform = Account::new(2100, "Accounts Payable", dec!(0));
        uniform.apply_transaction(credit(dec!(250)), SignConvention::DebitPositive);
        assert_eq!(uniform.balance(), dec!(-250));
    }

    #[test]
    fn restore_does_not_move_the_balance() {
        let mut account = Account::new(1100, "Cash", dec!(500));
        account.restore_transaction(debit(dec!(500)));
        assert_eq!(account.balance(), dec!(500));
        assert_eq!(account.transactions().len(), 1);
    }
}
