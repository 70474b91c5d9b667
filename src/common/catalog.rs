use std::collections::HashMap;

use crate::{
    storage::{heap_file::HeapFile, schema::Schema},
    types::Pod,
    utils::HandyRwLock,
};

pub type TableRC = Pod<HeapFile>;

/// Registry from table id to the backing heap file. The catalog is
/// reconstructed in-process, nothing about it is persisted.
pub struct Catalog {
    tables: HashMap<u32, TableRC>,
    names: HashMap<u32, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Register the table under the given name. A table with the same
    /// id (same backing file) is replaced.
    pub fn add_table(&mut self, table_rc: TableRC, name: &str) {
        let table_id = table_rc.rl().get_id();
        self.tables.insert(table_id, table_rc);
        self.names.insert(table_id, name.to_string());
    }

    pub fn get_table(&self, table_id: &u32) -> Option<TableRC> {
        self.tables.get(table_id).cloned()
    }

    pub fn get_table_name(&self, table_id: &u32) -> Option<String> {
        self.names.get(table_id).cloned()
    }

    pub fn get_schema(&self, table_id: &u32) -> Option<Schema> {
        self.tables
            .get(table_id)
            .map(|t| t.rl().get_schema().clone())
    }

    pub fn table_ids(&self) -> Vec<u32> {
        self.tables.keys().copied().collect()
    }
}
