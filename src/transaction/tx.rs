use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{common::Database, types::SmallResult};

pub type TransactionID = u32;

static TRANSACTION_ID: AtomicU32 = AtomicU32::new(1);

/// A transaction handle. Each active transaction is driven by a
/// single thread.
#[derive(Eq, PartialEq, Clone)]
pub struct Transaction {
    // increase monotonically by 1
    id: TransactionID,
}

impl Transaction {
    pub fn new() -> Self {
        let id = TRANSACTION_ID.fetch_add(1, Ordering::Relaxed);
        Self { id }
    }

    /// Flush every page this transaction dirtied to disk, then
    /// release all of its locks.
    pub fn commit(&self, db: &Database) -> SmallResult {
        db.mut_buffer_pool().transaction_complete(db, self, true)
    }

    /// Discard every page this transaction dirtied, then release all
    /// of its locks. Also the required recovery after a lock request
    /// fails with `TransactionAborted`.
    pub fn abort(&self, db: &Database) -> SmallResult {
        db.mut_buffer_pool().transaction_complete(db, self, false)
    }

    pub fn get_id(&self) -> TransactionID {
        self.id
    }
}

impl std::hash::Hash for Transaction {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tx_{}", self.id)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
