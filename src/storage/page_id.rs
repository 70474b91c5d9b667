use std::fmt;

/// Identity of a heap page, used as the cache key and as the unit of
/// locking.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct HeapPageID {
    pub table_id: u32,
    pub page_index: u32,
}

impl HeapPageID {
    pub fn new(table_id: u32, page_index: u32) -> Self {
        Self {
            table_id,
            page_index,
        }
    }

    pub fn get_table_id(&self) -> u32 {
        self.table_id
    }

    pub fn get_page_index(&self) -> u32 {
        self.page_index
    }
}

impl fmt::Display for HeapPageID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "page_{}_{}", self.table_id, self.page_index)
    }
}

impl fmt::Debug for HeapPageID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Physical location of a tuple: page plus slot number. Becomes
/// meaningless once the tuple is deleted.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub pid: HeapPageID,
    pub slot: usize,
}

impl RecordId {
    pub fn new(pid: HeapPageID, slot: usize) -> Self {
        Self { pid, slot }
    }

    pub fn get_pid(&self) -> HeapPageID {
        self.pid
    }

    pub fn get_slot(&self) -> usize {
        self.slot
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.pid, self.slot)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
