use std::collections::{HashMap, HashSet};

use crate::storage::page_id::HeapPageID;

use super::TransactionID;

/// Global waits-for bookkeeping over transactions and page locks.
///
/// Nodes are transactions and locks (a lock is identified by its page
/// id). Edges:
///
/// - `tid -> lock`: the transaction has a pending wait on the lock,
///   recorded with the requested mode.
/// - `lock -> holder`: the lock is currently held by the transaction,
///   recorded with the held mode.
///
/// All mutations happen under one mutex owned by the buffer pool, so
/// `wait` / `acquire` / `release` are atomic with respect to each
/// other.
pub struct WaitForGraph {
    // pending waits: tid -> (lock -> requested in write mode)
    waits: HashMap<TransactionID, HashMap<HeapPageID, bool>>,

    // current holders: lock -> (tid -> held in write mode)
    holds: HashMap<HeapPageID, HashMap<TransactionID, bool>>,
}

impl WaitForGraph {
    pub fn new() -> Self {
        Self {
            waits: HashMap::new(),
            holds: HashMap::new(),
        }
    }

    /// Record that `tid` is about to wait on `lock`, then check
    /// whether that wait closes a cycle. Returns true iff it would, in
    /// which case the pending edge is removed again and the caller
    /// must abort instead of blocking.
    pub fn wait(&mut self, tid: TransactionID, lock: HeapPageID, write: bool) -> bool {
        self.waits
            .entry(tid)
            .or_insert_with(HashMap::new)
            .insert(lock, write);

        let mut visited = HashSet::new();
        if self.reaches(tid, tid, &mut visited) {
            self.remove_wait(tid, lock);
            return true;
        }

        false
    }

    /// Clear the pending wait and record the granted hold. An upgrade
    /// overwrites the read-mode hold with a write-mode one.
    pub fn acquire(&mut self, tid: TransactionID, lock: HeapPageID, write: bool) {
        self.remove_wait(tid, lock);
        self.holds
            .entry(lock)
            .or_insert_with(HashMap::new)
            .insert(tid, write);
    }

    pub fn release(&mut self, tid: TransactionID, lock: HeapPageID) {
        if let Some(holders) = self.holds.get_mut(&lock) {
            holders.remove(&tid);
            if holders.is_empty() {
                self.holds.remove(&lock);
            }
        }
    }

    fn remove_wait(&mut self, tid: TransactionID, lock: HeapPageID) {
        if let Some(pending) = self.waits.get_mut(&tid) {
            pending.remove(&lock);
            if pending.is_empty() {
                self.waits.remove(&tid);
            }
        }
    }

    /// DFS from `tid` over pending-wait and held-by edges, looking for
    /// a path back to `start`.
    ///
    /// A read wait is not blocked by existing readers, so those edges
    /// are skipped. A holder that is itself waiting to upgrade the
    /// same lock counts as a writer, otherwise two concurrent
    /// upgraders would never see their cycle.
    fn reaches(&self, tid: TransactionID, start: TransactionID, visited: &mut HashSet<TransactionID>) -> bool {
        let pending = match self.waits.get(&tid) {
            Some(pending) => pending,
            None => return false,
        };

        for (&lock, &wait_write) in pending {
            let holders = match self.holds.get(&lock) {
                Some(holders) => holders,
                None => continue,
            };

            for (&holder, &held_write) in holders {
                if holder == tid {
                    continue;
                }

                let effective_write = held_write || self.pending_write(holder, lock);
                if !wait_write && !effective_write {
                    continue;
                }

                if holder == start {
                    return true;
                }
                if visited.insert(holder) && self.reaches(holder, start, visited) {
                    return true;
                }
            }
        }

        false
    }

    fn pending_write(&self, tid: TransactionID, lock: HeapPageID) -> bool {
        self.waits
            .get(&tid)
            .and_then(|pending| pending.get(&lock))
            .copied()
            .unwrap_or(false)
    }
}
