use crate::account::Account;

/// Handle to a node inside a forest's arena. Only meaningful for the
/// forest that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// One forest entry: an account plus its structural links. Children are
/// held in insertion order, which is also display and report order; the
/// parent link is a handle, never an owning reference, so ownership runs
/// root-to-leaf through the arena alone.
#[derive(Debug, Clone)]
pub struct Node {
    account: Account,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(account: Account, parent: Option<NodeId>) -> Node {
        Node {
            account,
            parent,
            children: Vec::new(),
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub(crate) fn account_mut(&mut self) -> &mut Account {
        &mut self.account
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child handles in insertion order. Uniqueness of account numbers is
    /// the forest's concern; this layer only keeps the sequence.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().copied()
    }

    pub(crate) fn add_child(&mut self, id: NodeId) {
        self.children.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn children_keep_insertion_order() {
        let mut node = Node::new(Account::new(1000, "Assets", dec!(0)), None);
        node.add_child(NodeId(3));
        node.add_child(NodeId(1));
        node.add_child(NodeId(2));
        let order: Vec<NodeId> = node.children().collect();
        assert_eq!(order, vec![NodeId(3), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn roots_have_no_parent() {
        let root = Node::new(Account::new(1000, "Assets", dec!(0)), None);
        assert_eq!(root.parent(), None);
        let child = Node::new(Account::new(1100, "Cash", dec!(0)), Some(NodeId(0)));
        assert_eq!(child.parent(), Some(NodeId(0)));
    }
}
