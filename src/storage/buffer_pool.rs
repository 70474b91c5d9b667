use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, RwLock,
    },
};

use log::debug;

use crate::{
    common::Database,
    error::SmallError,
    storage::{heap_page::HeapPage, page_id::HeapPageID, tuple::Tuple},
    transaction::{Lock, PageLock, Permission, Transaction, TransactionID, WaitForGraph},
    types::{Pod, ResultPod, SmallResult},
    utils::HandyRwLock,
};

pub const DEFAULT_PAGE_SIZE: usize = 4096;
static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

pub const DEFAULT_PAGES: usize = 50;

/// The bounded page cache. All page access goes through `get_page`,
/// which acquires the per-page lock on behalf of the requesting
/// transaction before the page is handed out.
///
/// Eviction is NO-STEAL (a dirty page never leaves the cache, so an
/// uncommitted write never reaches disk) and commit is FORCE (every
/// dirty page is flushed before the commit returns). Abort is
/// therefore a pure in-memory discard.
pub struct BufferPool {
    buffer: HashMap<HeapPageID, Pod<HeapPage>>,

    // pages leave the cache in the order they entered it
    arrival: VecDeque<HeapPageID>,

    // per-page locks, created lazily
    locks: HashMap<HeapPageID, Arc<PageLock>>,

    // the mode each transaction currently holds on each page, used
    // for idempotent re-acquisition and upgrade
    holdings: HashMap<(TransactionID, HeapPageID), Lock>,

    wait_for_graph: Arc<Mutex<WaitForGraph>>,

    capacity: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self {
            buffer: HashMap::new(),
            arrival: VecDeque::new(),
            locks: HashMap::new(),
            holdings: HashMap::new(),
            wait_for_graph: Arc::new(Mutex::new(WaitForGraph::new())),
            capacity: DEFAULT_PAGES,
        }
    }

    pub fn get_page_size() -> usize {
        PAGE_SIZE.load(Ordering::Relaxed)
    }

    /// Test hook. The page size is process-wide, do not vary it
    /// per-file.
    pub fn set_page_size(page_size: usize) {
        PAGE_SIZE.store(page_size, Ordering::Relaxed);
    }

    pub fn get_capacity(&self) -> usize {
        self.capacity
    }

    /// Test hook.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn pages_count(&self) -> usize {
        self.buffer.len()
    }

    /// Reset the in-memory state, used for tests mostly.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.arrival.clear();
        self.locks.clear();
        self.holdings.clear();
        *self.wait_for_graph.lock().unwrap() = WaitForGraph::new();
    }

    /// Retrieve the specified page with the associated permissions,
    /// loading it from disk if necessary. May block until the page
    /// lock is grantable; fails with `TransactionAborted` instead of
    /// blocking when the wait would deadlock.
    ///
    /// The lock is requested before the buffer pool itself is
    /// touched: the pool requires exclusive access for most of its
    /// operations, so blocking on a page lock while holding the pool
    /// would stall every other transaction.
    pub fn get_page(
        db: &Database,
        tx: &Transaction,
        perm: Permission,
        pid: &HeapPageID,
    ) -> ResultPod<HeapPage> {
        let tid = tx.get_id();

        // step 1: look up the lock and the transaction's current
        // holding on this page
        let (lock, graph, holding) = {
            let mut pool = db.mut_buffer_pool();
            let lock = pool
                .locks
                .entry(*pid)
                .or_insert_with(|| Arc::new(PageLock::new(*pid)))
                .clone();
            let graph = Arc::clone(&pool.wait_for_graph);
            let holding = pool.holdings.get(&(tid, *pid)).copied();
            (lock, graph, holding)
        };

        // step 2: acquire or upgrade, outside the pool guard
        match (holding, perm) {
            (None, Permission::ReadOnly) => lock.lock_read(tid, &graph)?,
            (None, Permission::ReadWrite) => lock.lock_write(tid, &graph)?,
            (Some(Lock::SLock), Permission::ReadWrite) => lock.upgrade(tid, &graph)?,
            // already holds write, or holds read and reads again
            _ => {}
        }

        // step 3: record the holding and fetch the page
        let mut pool = db.mut_buffer_pool();
        let entry = pool
            .holdings
            .entry((tid, *pid))
            .or_insert_with(|| perm.to_lock());
        if perm == Permission::ReadWrite {
            *entry = Lock::XLock;
        }
        pool.fetch_page(db, pid)
    }

    fn fetch_page(&mut self, db: &Database, pid: &HeapPageID) -> ResultPod<HeapPage> {
        if !self.buffer.contains_key(pid) {
            if self.buffer.len() >= self.capacity {
                self.evict_page()?;
            }

            let table_rc = db
                .catalog()
                .get_table(&pid.get_table_id())
                .ok_or_else(|| SmallError::db("table not found in the catalog"))?;
            let page = table_rc.rl().read_page(pid)?;

            self.buffer.insert(*pid, Arc::new(RwLock::new(page)));
            self.arrival.push_back(*pid);
            debug!("page loaded from disk, pid: {}", pid);
        }

        Ok(Arc::clone(self.buffer.get(pid).unwrap()))
    }

    /// Evict the first clean page in arrival order. NO-STEAL: dirty
    /// pages stay put, and a cache made of nothing but dirty pages is
    /// an error.
    fn evict_page(&mut self) -> SmallResult {
        for i in 0..self.arrival.len() {
            let pid = self.arrival[i];
            let dirty = self
                .buffer
                .get(&pid)
                .map(|p| p.rl().is_dirty())
                .unwrap_or(false);
            if !dirty {
                self.arrival.remove(i);
                self.buffer.remove(&pid);
                debug!("page evicted, pid: {}", pid);
                return Ok(());
            }
        }

        Err(SmallError::db("all pages dirty"))
    }

    /// Add a tuple to the specified table on behalf of the
    /// transaction. Acquires a write lock on the page the tuple lands
    /// on and marks it dirty.
    pub fn insert_tuple(
        db: &Database,
        tx: &Transaction,
        table_id: u32,
        t: &Tuple,
    ) -> SmallResult {
        let table_rc = db
            .catalog()
            .get_table(&table_id)
            .ok_or_else(|| SmallError::db("table not found in the catalog"))?;

        let dirtied = table_rc.rl().insert_tuple(db, tx, t)?;
        for page_rc in dirtied {
            page_rc.wl().set_dirty(tx.get_id());
        }
        Ok(())
    }

    /// Remove the tuple named by its record id, marking the page
    /// dirty.
    pub fn delete_tuple(db: &Database, tx: &Transaction, t: &Tuple) -> SmallResult {
        let rid = t
            .get_record_id()
            .ok_or_else(|| SmallError::db("tuple has no record id"))?;

        let table_rc = db
            .catalog()
            .get_table(&rid.get_pid().get_table_id())
            .ok_or_else(|| SmallError::db("table not found in the catalog"))?;

        let page_rc = table_rc.rl().delete_tuple(db, tx, t)?;
        page_rc.wl().set_dirty(tx.get_id());
        Ok(())
    }

    /// Commit or abort the transaction.
    ///
    /// Commit flushes every page the transaction wrote (FORCE) and
    /// releases all of its locks. Abort discards the cached copies of
    /// those pages instead, the on-disk bytes were never touched
    /// (NO-STEAL).
    pub fn transaction_complete(
        &mut self,
        db: &Database,
        tx: &Transaction,
        commit: bool,
    ) -> SmallResult {
        let tid = tx.get_id();

        let mut held_pids = Vec::new();
        let mut write_pids = Vec::new();
        for (&(t, pid), &mode) in self.holdings.iter() {
            if t == tid {
                held_pids.push(pid);
                if mode == Lock::XLock {
                    write_pids.push(pid);
                }
            }
        }

        if commit {
            for pid in &write_pids {
                self.flush_page(db, pid)?;
            }
        } else {
            for pid in &write_pids {
                self.discard_page(pid);
            }
        }

        // strict 2PL: every lock is released here and nowhere else
        for pid in &held_pids {
            if let Some(lock) = self.locks.get(pid) {
                lock.unlock(tid, &self.wait_for_graph);
            }
            self.holdings.remove(&(tid, *pid));
        }

        debug!(
            "{} finished, commit: {}, pages released: {}",
            tx,
            commit,
            held_pids.len()
        );
        Ok(())
    }

    /// Write the page to disk if it is cached and dirty, then clear
    /// the dirty bit.
    pub fn flush_page(&mut self, db: &Database, pid: &HeapPageID) -> SmallResult {
        let page_rc = match self.buffer.get(pid) {
            Some(p) => Arc::clone(p),
            None => return Ok(()),
        };

        let mut page = page_rc.wl();
        if !page.is_dirty() {
            return Ok(());
        }

        let table_rc = db
            .catalog()
            .get_table(&pid.get_table_id())
            .ok_or_else(|| SmallError::db("table not found in the catalog"))?;
        table_rc.rl().write_page(&page)?;
        page.set_clean();
        Ok(())
    }

    pub fn flush_all_pages(&mut self, db: &Database) -> SmallResult {
        let pids: Vec<HeapPageID> = self.buffer.keys().copied().collect();
        for pid in pids {
            self.flush_page(db, &pid)?;
        }
        Ok(())
    }

    /// Drop the cached copy without flushing.
    pub fn discard_page(&mut self, pid: &HeapPageID) {
        self.buffer.remove(pid);
        self.arrival.retain(|p| p != pid);
    }

    /// The mode the transaction holds on the page, if any. Used by
    /// tests.
    pub fn holds_lock(&self, tx: &Transaction, pid: &HeapPageID) -> Option<Lock> {
        self.holdings.get(&(tx.get_id(), *pid)).copied()
    }
}
