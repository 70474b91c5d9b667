mod lock;
mod tx;
mod wait_for_graph;

pub use lock::{Lock, PageLock, Permission};
pub use tx::{Transaction, TransactionID};
pub use wait_for_graph::WaitForGraph;
