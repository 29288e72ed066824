pub mod account;
pub mod error;
pub mod forest;
pub mod node;
pub mod numbering;
pub mod transaction;

mod report;
mod storage;

pub use account::{Account, AccountKind, SignConvention};
pub use error::ChartError;
pub use forest::Forest;
pub use node::{Node, NodeId};
pub use numbering::{DecimalScheme, NumberingScheme, Placement, PrefixScheme};
pub use storage::transaction_filename;
pub use transaction::{Side, Transaction};
