use std::{
    collections::hash_map::DefaultHasher,
    fs::{self, OpenOptions},
    hash::{Hash, Hasher},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
    sync::{Arc, Mutex},
};

use log::debug;

use crate::{
    common::Database,
    error::SmallError,
    storage::{
        buffer_pool::BufferPool,
        heap_page::HeapPage,
        page_id::HeapPageID,
        schema::Schema,
        tuple::Tuple,
    },
    transaction::{Permission, Transaction},
    types::{Pod, ResultPod, SmallResult},
    utils::HandyRwLock,
};

/// An unordered table stored as a sequence of pages in a regular
/// file. Page `n` lives at byte offset `n * page_size`; the file
/// length is always a multiple of the page size.
pub struct HeapFile {
    file: Mutex<fs::File>,
    table_id: u32,
    schema: Schema,
}

impl HeapFile {
    /// Open (or create) the backing file. The table id is a stable
    /// hash of the absolute path, so reopening the same file yields
    /// the same table.
    pub fn new<P: AsRef<Path>>(file_path: P, schema: Schema) -> Result<Self, SmallError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&file_path)?;

        let absolute = fs::canonicalize(&file_path)?;
        let mut hasher = DefaultHasher::new();
        absolute.hash(&mut hasher);
        let table_id = hasher.finish() as u32;

        Ok(Self {
            file: Mutex::new(file),
            table_id,
            schema,
        })
    }

    pub fn get_id(&self) -> u32 {
        self.table_id
    }

    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_pages(&self) -> usize {
        let file = self.file.lock().unwrap();
        let len = file.metadata().map(|m| m.len()).unwrap_or(0);
        len as usize / BufferPool::get_page_size()
    }

    /// Read one page worth of bytes from the matching offset. Fails
    /// when the offset is past the end of the file or the read comes
    /// up short.
    pub fn read_page(&self, pid: &HeapPageID) -> Result<HeapPage, SmallError> {
        let page_size = BufferPool::get_page_size();
        let offset = pid.get_page_index() as u64 * page_size as u64;

        let mut buf: Vec<u8> = vec![0; page_size];
        {
            let mut file = self.file.lock().unwrap();
            let len = file.metadata()?.len();
            if offset + page_size as u64 > len {
                return Err(SmallError::io("page offset past the end of the file"));
            }

            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf)
                .map_err(|_| SmallError::io("short page read"))?;
        }

        HeapPage::new(pid, &buf, &self.schema)
    }

    /// Write the page at the matching offset, extending the file when
    /// the page is new.
    pub fn write_page(&self, page: &HeapPage) -> SmallResult {
        let page_size = BufferPool::get_page_size();
        let offset = page.get_pid().get_page_index() as u64 * page_size as u64;
        let data = page.get_page_data();

        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&data)?;
        file.flush()?;
        Ok(())
    }

    /// Insert into the first page with a free slot, probing pages in
    /// order under a write lock. When every page is full a fresh
    /// empty page is appended to disk (making it visible to
    /// `num_pages`), then filled through the buffer pool. Returns the
    /// pages dirtied by the operation.
    pub fn insert_tuple(
        &self,
        db: &Database,
        tx: &Transaction,
        t: &Tuple,
    ) -> Result<Vec<Pod<HeapPage>>, SmallError> {
        loop {
            for i in 0..self.num_pages() {
                let pid = HeapPageID::new(self.table_id, i as u32);
                let page_rc = BufferPool::get_page(db, tx, Permission::ReadWrite, &pid)?;

                // the dirty bit is set under the same guard that
                // mutates the page, a page must never look clean to
                // the evictor while it carries unflushed changes
                let mut page = page_rc.wl();
                if page.empty_slots_count() > 0 {
                    page.insert_tuple(t)?;
                    page.set_dirty(tx.get_id());
                    drop(page);
                    return Ok(vec![page_rc]);
                }
            }

            // every page is full, claim a fresh one
            let pid = self.append_empty_page()?;
            debug!("new page appended, pid: {}", pid);

            let page_rc = BufferPool::get_page(db, tx, Permission::ReadWrite, &pid)?;
            let mut page = page_rc.wl();
            if page.empty_slots_count() > 0 {
                page.insert_tuple(t)?;
                page.set_dirty(tx.get_id());
                drop(page);
                return Ok(vec![page_rc]);
            }
            // another transaction filled the fresh page before we
            // locked it, go around again
        }
    }

    /// Extend the file by one zeroed page under the file mutex, so
    /// concurrent appenders claim distinct page indexes and never
    /// clobber an existing page.
    fn append_empty_page(&self) -> Result<HeapPageID, SmallError> {
        let page_size = BufferPool::get_page_size();

        let mut file = self.file.lock().unwrap();
        let len = file.metadata()?.len();
        file.seek(SeekFrom::Start(len))?;
        file.write_all(&vec![0; page_size])?;
        file.flush()?;

        Ok(HeapPageID::new(
            self.table_id,
            (len as usize / page_size) as u32,
        ))
    }

    /// Remove the tuple named by its record id from this file.
    pub fn delete_tuple(
        &self,
        db: &Database,
        tx: &Transaction,
        t: &Tuple,
    ) -> ResultPod<HeapPage> {
        let rid = t
            .get_record_id()
            .ok_or_else(|| SmallError::db("tuple has no record id"))?;
        if rid.get_pid().get_table_id() != self.table_id {
            return Err(SmallError::db("tuple belongs to another table"));
        }

        let page_rc = BufferPool::get_page(db, tx, Permission::ReadWrite, &rid.get_pid())?;
        {
            let mut page = page_rc.wl();
            page.delete_tuple(&rid)?;
            page.set_dirty(tx.get_id());
        }
        Ok(page_rc)
    }
}

/// Page-at-a-time scan over a heap file, reading every page through
/// the buffer pool with read permission.
///
/// The iterator is restartable (`rewind` returns to page 0) but not
/// safe against concurrent structural change: it re-reads the page
/// count at each page boundary and reflects whatever the buffer pool
/// returns at the time of access.
pub struct HeapFileIterator {
    db: Arc<Database>,
    tx: Transaction,
    table_id: u32,

    page_index: u32,
    rows: Vec<Tuple>,
    cursor: usize,
    started: bool,
}

impl HeapFileIterator {
    pub fn new(db: &Arc<Database>, tx: &Transaction, table_id: u32) -> Self {
        Self {
            db: Arc::clone(db),
            tx: tx.clone(),
            table_id,
            page_index: 0,
            rows: Vec::new(),
            cursor: 0,
            started: false,
        }
    }

    pub fn rewind(&mut self) -> SmallResult {
        self.page_index = 0;
        self.rows.clear();
        self.cursor = 0;
        self.started = false;
        Ok(())
    }

    pub fn try_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        if !self.started {
            self.started = true;
            if self.num_pages()? > 0 {
                self.load_page(0)?;
            }
        }

        loop {
            if self.cursor < self.rows.len() {
                let t = self.rows[self.cursor].clone();
                self.cursor += 1;
                return Ok(Some(t));
            }

            let next = self.page_index + 1;
            if next as usize >= self.num_pages()? {
                return Ok(None);
            }
            self.load_page(next)?;
        }
    }

    fn num_pages(&self) -> Result<usize, SmallError> {
        let table_rc = self
            .db
            .catalog()
            .get_table(&self.table_id)
            .ok_or_else(|| SmallError::db("table not found in the catalog"))?;
        let n = table_rc.rl().num_pages();
        Ok(n)
    }

    fn load_page(&mut self, index: u32) -> SmallResult {
        let pid = HeapPageID::new(self.table_id, index);
        let page_rc = BufferPool::get_page(&self.db, &self.tx, Permission::ReadOnly, &pid)?;

        self.rows = page_rc.rl().iter().cloned().collect();
        self.cursor = 0;
        self.page_index = index;
        Ok(())
    }
}
