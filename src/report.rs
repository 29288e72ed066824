use std::io::{self, Write};

use crate::error::ChartError;
use crate::forest::Forest;
use crate::node::NodeId;

impl<S> Forest<S> {
    /// Writes the whole chart (the [`std::fmt::Display`] form) to `writer`.
    pub fn write_chart<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(writer, "{}", self)
    }

    pub fn chart(&self) -> String {
        self.to_string()
    }

    /// Writes the subtree rooted at `number` depth-first in child insertion
    /// order: each account's number, description and balance at two decimal
    /// places, followed by its transactions with their indices, everything
    /// indented two spaces per level below the subtree root.
    pub fn write_report<W: Write>(&self, number: u32, writer: &mut W) -> Result<(), ChartError> {
        let id = self.lookup(number)?;
        self.write_report_node(writer, id, 0)?;
        Ok(())
    }

    /// [`Forest::write_report`] into a fresh `String`.
    pub fn report(&self, number: u32) -> Result<String, ChartError> {
        let mut out = Vec::new();
        self.write_report(number, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn write_report_node<W: Write>(
        &self,
        writer: &mut W,
        id: NodeId,
        depth: usize,
    ) -> io::Result<()> {
        let node = self.node(id);
        let account = node.account();
        writeln!(
            writer,
            "{:indent$}{} {} {:.2}",
            "",
            account.number(),
            account.description(),
            account.balance(),
            indent = depth * 2
        )?;
        for (index, txn) in account.transactions().iter().enumerate() {
            writeln!(
                writer,
                "{:indent$}{}: {}",
                "",
                index,
                txn,
                indent = (depth + 1) * 2
            )?;
        }
        for child in node.children() {
            self.write_report_node(writer, child, depth + 1)?;
        }
        Ok(())
    }
}
