use std::{
    collections::HashSet,
    sync::{Condvar, Mutex},
};

use log::debug;

use crate::{
    error::SmallError, storage::page_id::HeapPageID, types::SmallResult,
};

use super::{TransactionID, WaitForGraph};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    pub fn to_lock(&self) -> Lock {
        match self {
            Permission::ReadOnly => Lock::SLock,
            Permission::ReadWrite => Lock::XLock,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Lock {
    SLock,
    XLock,
}

struct LockState {
    readers: HashSet<TransactionID>,
    writer: Option<TransactionID>,

    // the upgrade token: at most one transaction may be promoting its
    // read lock to a write lock at any time
    upgrading: Option<TransactionID>,
}

/// Per-page reader/writer lock with upgrade.
///
/// Blocking happens on the condvar; before every block the caller
/// registers its wait in the shared waits-for graph and fails with
/// `TransactionAborted` instead of blocking when the wait would close
/// a cycle.
pub struct PageLock {
    pid: HeapPageID,
    state: Mutex<LockState>,
    cond: Condvar,
}

impl PageLock {
    pub fn new(pid: HeapPageID) -> Self {
        Self {
            pid,
            state: Mutex::new(LockState {
                readers: HashSet::new(),
                writer: None,
                upgrading: None,
            }),
            cond: Condvar::new(),
        }
    }

    pub fn lock_read(&self, tid: TransactionID, graph: &Mutex<WaitForGraph>) -> SmallResult {
        let mut state = self.state.lock().unwrap();
        loop {
            // idempotent re-acquisition, a writer already reads
            if state.readers.contains(&tid) || state.writer == Some(tid) {
                return Ok(());
            }

            if state.writer.is_none() {
                state.readers.insert(tid);
                graph.lock().unwrap().acquire(tid, self.pid, false);
                return Ok(());
            }

            if graph.lock().unwrap().wait(tid, self.pid, false) {
                debug!("deadlock averted: tx_{} read wait on {}", tid, self.pid);
                return Err(SmallError::TransactionAborted);
            }
            state = self.cond.wait(state).unwrap();
        }
    }

    pub fn lock_write(&self, tid: TransactionID, graph: &Mutex<WaitForGraph>) -> SmallResult {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.writer == Some(tid) {
                return Ok(());
            }

            // a read holder asking for write is an upgrade
            if state.readers.contains(&tid) {
                drop(state);
                return self.upgrade(tid, graph);
            }

            if state.writer.is_none() && state.readers.is_empty() {
                state.writer = Some(tid);
                graph.lock().unwrap().acquire(tid, self.pid, true);
                return Ok(());
            }

            if graph.lock().unwrap().wait(tid, self.pid, true) {
                debug!("deadlock averted: tx_{} write wait on {}", tid, self.pid);
                return Err(SmallError::TransactionAborted);
            }
            state = self.cond.wait(state).unwrap();
        }
    }

    /// Promote a held read lock to a write lock. The sole reader
    /// succeeds without blocking; under contention the upgrade token
    /// serializes concurrent upgraders, and the waits-for graph sees
    /// an upgrade-pending holder as a writer so that two simultaneous
    /// upgrades abort one of the two.
    pub fn upgrade(&self, tid: TransactionID, graph: &Mutex<WaitForGraph>) -> SmallResult {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.writer == Some(tid) {
                return Ok(());
            }

            if !state.readers.contains(&tid) {
                return Err(SmallError::db("upgrade without a read lock"));
            }

            if state.upgrading.is_none() {
                state.upgrading = Some(tid);
            }

            if state.upgrading == Some(tid) && state.writer.is_none() && state.readers.len() == 1 {
                // sole remaining reader, take the exclusive phase
                state.readers.remove(&tid);
                state.writer = Some(tid);
                state.upgrading = None;
                graph.lock().unwrap().acquire(tid, self.pid, true);
                self.cond.notify_all();
                return Ok(());
            }

            if graph.lock().unwrap().wait(tid, self.pid, true) {
                debug!("deadlock averted: tx_{} upgrade wait on {}", tid, self.pid);
                if state.upgrading == Some(tid) {
                    state.upgrading = None;
                    self.cond.notify_all();
                }
                return Err(SmallError::TransactionAborted);
            }
            state = self.cond.wait(state).unwrap();
        }
    }

    /// Release whatever this transaction holds on the page.
    pub fn unlock(&self, tid: TransactionID, graph: &Mutex<WaitForGraph>) {
        let mut state = self.state.lock().unwrap();

        let mut released = false;
        if state.writer == Some(tid) {
            state.writer = None;
            released = true;
        }
        if state.readers.remove(&tid) {
            released = true;
        }
        if state.upgrading == Some(tid) {
            state.upgrading = None;
        }

        if released {
            graph.lock().unwrap().release(tid, self.pid);
        }
        self.cond.notify_all();
    }

    /// The mode this transaction currently holds, if any.
    pub fn held_by(&self, tid: TransactionID) -> Option<Lock> {
        let state = self.state.lock().unwrap();
        if state.writer == Some(tid) {
            Some(Lock::XLock)
        } else if state.readers.contains(&tid) {
            Some(Lock::SLock)
        } else {
            None
        }
    }
}
