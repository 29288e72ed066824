use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::account::{Account, SignConvention};
use crate::error::ChartError;
use crate::node::{Node, NodeId};
use crate::numbering::{DecimalScheme, NumberingScheme, Placement};
use crate::transaction::Transaction;

/// The chart-of-accounts engine: an arena of nodes, the ordered root list
/// and a number index covering every node, plus the two policies every
/// operation consults (attachment rule and sign convention).
///
/// The index and the topology are kept mutually consistent by routing all
/// structural change through [`Forest::add_account`]; failed operations
/// leave the forest exactly as it was.
#[derive(Debug, Clone)]
pub struct Forest<S = DecimalScheme> {
    pub(crate) nodes: Vec<Node>,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) index: HashMap<u32, NodeId>,
    pub(crate) scheme: S,
    pub(crate) convention: SignConvention,
}

impl Forest<DecimalScheme> {
    /// Empty forest with the default policies: four-digit positional
    /// numbering and debits-add.
    pub fn new() -> Forest<DecimalScheme> {
        Forest::with_policies(DecimalScheme::default(), SignConvention::default())
    }
}

impl Default for Forest<DecimalScheme> {
    fn default() -> Forest<DecimalScheme> {
        Forest::new()
    }
}

impl<S> Forest<S> {
    pub fn with_policies(scheme: S, convention: SignConvention) -> Forest<S> {
        Forest {
            nodes: Vec::new(),
            roots: Vec::new(),
            index: HashMap::new(),
            scheme,
            convention,
        }
    }

    pub fn convention(&self) -> SignConvention {
        self.convention
    }

    /// Number of accounts in the forest.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root handles in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.iter().copied()
    }

    /// Arena access for traversal. `id` must come from this forest.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// O(1) lookup through the number index; absence is not an error.
    pub fn find_account(&self, number: u32) -> Option<&Node> {
        self.index.get(&number).map(|&id| &self.nodes[id.0])
    }

    /// Applies `txn` to the account's history and balance under the
    /// forest's sign convention.
    pub fn add_transaction(&mut self, number: u32, txn: Transaction) -> Result<(), ChartError> {
        let id = self.lookup(number)?;
        debug!(number, amount = %txn.amount(), side = %txn.side(), "applying transaction");
        let convention = self.convention;
        self.nodes[id.0].account_mut().apply_transaction(txn, convention);
        Ok(())
    }

    /// Removes the transaction at `index` from the account's history and
    /// reverses its balance effect. Balance is untouched on any failure.
    pub fn delete_transaction(&mut self, number: u32, index: usize) -> Result<(), ChartError> {
        let id = self.lookup(number)?;
        let convention = self.convention;
        self.nodes[id.0]
            .account_mut()
            .remove_transaction(index, convention)?;
        debug!(number, index, "deleted transaction");
        Ok(())
    }

    pub(crate) fn lookup(&self, number: u32) -> Result<NodeId, ChartError> {
        self.index
            .get(&number)
            .copied()
            .ok_or(ChartError::AccountNotFound(number))
    }

    /// Arena insert plus index and topology bookkeeping, the one place a
    /// node ever enters the forest. Callers have already validated the
    /// number and resolved the parent.
    pub(crate) fn attach(&mut self, account: Account, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.insert(account.number(), id);
        self.nodes.push(Node::new(account, parent));
        match parent {
            Some(parent_id) => self.nodes[parent_id.0].add_child(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Reattaches a logged transaction without a balance effect; the chart
    /// file already stores post-transaction balances.
    pub(crate) fn restore_transaction(
        &mut self,
        number: u32,
        txn: Transaction,
    ) -> Result<(), ChartError> {
        let id = self.lookup(number)?;
        self.nodes[id.0].account_mut().restore_transaction(txn);
        Ok(())
    }

    fn fmt_subtree(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let node = &self.nodes[id.0];
        let account = node.account();
        writeln!(
            f,
            "{:indent$}{} {} {:.2}",
            "",
            account.number(),
            account.description(),
            account.balance(),
            indent = depth * 2
        )?;
        for child in node.children() {
            self.fmt_subtree(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl<S: NumberingScheme> Forest<S> {
    /// Creates the account and attaches it where the numbering scheme says
    /// it belongs. `DuplicateAccount` if the number is taken,
    /// `InvalidHierarchyPlacement` if the scheme rejects the number or the
    /// parent it names is absent; the forest is untouched on either.
    pub fn add_account(
        &mut self,
        number: u32,
        description: impl Into<String>,
        initial_balance: Decimal,
    ) -> Result<(), ChartError> {
        if self.index.contains_key(&number) {
            return Err(ChartError::DuplicateAccount(number));
        }
        let parent = match self.scheme.placement(number) {
            None => return Err(ChartError::InvalidHierarchyPlacement(number)),
            Some(Placement::Root) => None,
            Some(Placement::Under(parent_number)) => match self.index.get(&parent_number) {
                Some(&id) => Some(id),
                None => return Err(ChartError::InvalidHierarchyPlacement(number)),
            },
        };
        self.attach(Account::new(number, description, initial_balance), parent);
        debug!(number, "added account");
        Ok(())
    }

    /// [`Forest::add_account`], then a whole-file rewrite of the chart.
    /// `Ok(false)` means the account is in the forest but the file write
    /// failed; in-memory state stays authoritative either way.
    pub fn add_account_with_file(
        &mut self,
        number: u32,
        description: impl Into<String>,
        initial_balance: Decimal,
        path: impl AsRef<Path>,
    ) -> Result<bool, ChartError> {
        self.add_account(number, description, initial_balance)?;
        match self.save_to_file(path) {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!(number, error = %err, "account added but chart not saved");
                Ok(false)
            }
        }
    }
}

/// The whole chart, every root and its subtree depth-first in insertion
/// order, indented two spaces per level, balances at two decimal places.
impl<S> fmt::Display for Forest<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &root in &self.roots {
            self.fmt_subtree(f, root, 0)?;
        }
        Ok(())
    }
}
