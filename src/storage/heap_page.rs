use bit_vec::BitVec;

use crate::{
    error::SmallError,
    storage::{
        buffer_pool::BufferPool,
        page_id::{HeapPageID, RecordId},
        schema::Schema,
        tuple::Tuple,
    },
    transaction::TransactionID,
    types::SmallResult,
    utils::{SmallReader, SmallWriter},
};

/// A slotted page: a header bitmap of `slot_count` bits followed by
/// `slot_count` fixed-size tuple slots, zero padded to the page size.
///
/// On disk the header uses little-bit ordering: slot `i` maps to bit
/// `i % 8` of byte `i / 8`. (`BitVec::from_bytes` is big-bit, so the
/// conversion is explicit in both directions.)
pub struct HeapPage {
    pid: HeapPageID,
    schema: Schema,

    pub slot_count: usize,

    // indicate slots' status: true means occupied, false means empty
    header: BitVec<u32>,

    // all tuples (unused slots hold an empty placeholder)
    tuples: Vec<Tuple>,

    dirtier: Option<TransactionID>,
}

impl HeapPage {
    pub fn new(pid: &HeapPageID, bytes: &[u8], schema: &Schema) -> Result<Self, SmallError> {
        let page_size = BufferPool::get_page_size();
        if bytes.len() != page_size {
            return Err(SmallError::db("page buffer has wrong size"));
        }

        let slot_count = Self::calculate_slots_count(schema);
        let header_size = Self::header_size(slot_count);
        let tuple_size = schema.get_size();

        let mut header = BitVec::from_elem(slot_count, false);
        for i in 0..slot_count {
            if bytes[i / 8] >> (i % 8) & 1 == 1 {
                header.set(i, true);
            }
        }

        // only used slots are parsed, unused slot bytes are unspecified
        let mut tuples = Vec::with_capacity(slot_count);
        for i in 0..slot_count {
            if header[i] {
                let start = header_size + i * tuple_size;
                let mut reader = SmallReader::new(&bytes[start..start + tuple_size]);
                let mut t = Tuple::read_from(&mut reader, schema)?;
                t.set_record_id(Some(RecordId::new(*pid, i)));
                tuples.push(t);
            } else {
                tuples.push(Tuple::placeholder());
            }
        }

        Ok(Self {
            pid: *pid,
            schema: schema.clone(),
            slot_count,
            header,
            tuples,
            dirtier: None,
        })
    }

    pub fn empty_page_data() -> Vec<u8> {
        vec![0; BufferPool::get_page_size()]
    }

    /// Maximum number of tuples this page can hold: each slot costs
    /// its tuple bytes plus one header bit.
    pub fn calculate_slots_count(schema: &Schema) -> usize {
        let bits_per_tuple_including_header = schema.get_size() * 8 + 1;
        BufferPool::get_page_size() * 8 / bits_per_tuple_including_header
    }

    fn header_size(slot_count: usize) -> usize {
        (slot_count + 7) / 8
    }

    pub fn get_pid(&self) -> HeapPageID {
        self.pid
    }

    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_slot_used(&self, i: usize) -> bool {
        i < self.slot_count && self.header[i]
    }

    pub fn empty_slots_count(&self) -> usize {
        self.header.iter().filter(|used| !used).count()
    }

    /// Insert into the lowest free slot and stamp the tuple's record
    /// id. Fails when the page is full or the tuple does not match
    /// the page schema.
    pub fn insert_tuple(&mut self, t: &Tuple) -> SmallResult {
        if !t.matches_schema(&self.schema) {
            return Err(SmallError::db("tuple does not match the page schema"));
        }

        for i in 0..self.slot_count {
            if !self.header[i] {
                let mut t = t.clone();
                t.set_record_id(Some(RecordId::new(self.pid, i)));
                self.header.set(i, true);
                self.tuples[i] = t;
                return Ok(());
            }
        }

        Err(SmallError::db("no empty slot on the page"))
    }

    /// Clear the slot named by the record id. The slot bytes are not
    /// zeroed, readers skip unused slots.
    pub fn delete_tuple(&mut self, rid: &RecordId) -> SmallResult {
        if rid.get_pid() != self.pid {
            return Err(SmallError::db("record id names another page"));
        }

        let slot = rid.get_slot();
        if slot >= self.slot_count || !self.header[slot] {
            return Err(SmallError::db("tuple is not present on the page"));
        }

        self.header.set(slot, false);
        self.tuples[slot] = Tuple::placeholder();
        Ok(())
    }

    /// Serialize back to exactly one page worth of bytes.
    pub fn get_page_data(&self) -> Vec<u8> {
        let tuple_size = self.schema.get_size();
        let mut writer = SmallWriter::new();

        let mut header_bytes = vec![0u8; Self::header_size(self.slot_count)];
        for i in 0..self.slot_count {
            if self.header[i] {
                header_bytes[i / 8] |= 1 << (i % 8);
            }
        }
        writer.write_bytes(&header_bytes);

        for i in 0..self.slot_count {
            if self.header[i] {
                writer.write(&self.tuples[i]);
            } else {
                writer.write_bytes(&vec![0; tuple_size]);
            }
        }

        writer.to_padded_bytes(BufferPool::get_page_size())
    }

    /// Iterate used slots in slot order.
    pub fn iter(&self) -> HeapPageIterator {
        HeapPageIterator {
            page: self,
            slot: 0,
        }
    }

    pub fn set_dirty(&mut self, tid: TransactionID) {
        self.dirtier = Some(tid);
    }

    pub fn set_clean(&mut self) {
        self.dirtier = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirtier.is_some()
    }

    pub fn get_dirtier(&self) -> Option<TransactionID> {
        self.dirtier
    }
}

pub struct HeapPageIterator<'a> {
    page: &'a HeapPage,
    slot: usize,
}

impl<'a> Iterator for HeapPageIterator<'a> {
    type Item = &'a Tuple;

    fn next(&mut self) -> Option<Self::Item> {
        while self.slot < self.page.slot_count {
            let i = self.slot;
            self.slot += 1;
            if self.page.header[i] {
                return Some(&self.page.tuples[i]);
            }
        }
        None
    }
}
