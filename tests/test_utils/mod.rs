use std::sync::{Arc, RwLock};

use rand::Rng;
use tempfile::TempDir;

use small_rows::{
    common::TableRC,
    storage::buffer_pool::DEFAULT_PAGE_SIZE,
    utils::{self, HandyRwLock},
    BufferPool, Database, HeapFile, OpIterator, Schema, SeqScan, Transaction, Tuple,
    small_int_schema,
};

/// # Conduct the initialization
///
/// - Setting up log configurations.
/// - Reset page size.
pub fn setup() {
    utils::init_log();
    BufferPool::set_page_size(DEFAULT_PAGE_SIZE);
}

pub fn new_empty_table(
    db: &Arc<Database>,
    dir: &TempDir,
    name: &str,
    columns: usize,
) -> TableRC {
    let schema = small_int_schema(columns, "c");
    new_empty_table_with_schema(db, dir, name, &schema)
}

pub fn new_empty_table_with_schema(
    db: &Arc<Database>,
    dir: &TempDir,
    name: &str,
    schema: &Schema,
) -> TableRC {
    let path = dir.path().join(format!("{}.db", name));
    let table = HeapFile::new(&path, schema.clone()).unwrap();
    let table_rc = Arc::new(RwLock::new(table));
    db.add_table(Arc::clone(&table_rc), name);
    table_rc
}

/// Create a table with a given number of rows and columns, filled
/// with random data. Every column of a row carries the same value;
/// the inserted values are returned through `cells`.
pub fn new_random_table(
    db: &Arc<Database>,
    dir: &TempDir,
    name: &str,
    columns: usize,
    rows: usize,
    cells: &mut Vec<i32>,
) -> TableRC {
    let table_rc = new_empty_table(db, dir, name, columns);
    let table_id = table_rc.rl().get_id();

    let mut rng = rand::thread_rng();
    let tx = Transaction::new();
    for _ in 0..rows {
        let value = rng.gen_range(-100000, 100000);
        cells.push(value);
        let tuple = Tuple::new_int_tuple(value, columns);
        BufferPool::insert_tuple(db, &tx, table_id, &tuple).unwrap();
    }
    tx.commit(db).unwrap();

    table_rc
}

pub fn insert_rows(db: &Arc<Database>, table_id: u32, values: &[i32], columns: usize) {
    let tx = Transaction::new();
    for &v in values {
        let tuple = Tuple::new_int_tuple(v, columns);
        BufferPool::insert_tuple(db, &tx, table_id, &tuple).unwrap();
    }
    tx.commit(db).unwrap();
}

/// Scan the whole table under the given transaction and return every
/// tuple.
pub fn scan_all(db: &Arc<Database>, tx: &Transaction, table_id: u32) -> Vec<Tuple> {
    let mut scan = SeqScan::new(db, tx, table_id, "t").unwrap();
    scan.open().unwrap();

    let mut rows = Vec::new();
    while scan.has_next().unwrap() {
        rows.push(scan.next().unwrap());
    }
    scan.close().unwrap();
    rows
}

/// First-column values of a full scan, sorted. Handy for multiset
/// comparison.
pub fn scan_values(db: &Arc<Database>, tx: &Transaction, table_id: u32) -> Vec<i32> {
    let mut values: Vec<i32> = scan_all(db, tx, table_id)
        .iter()
        .map(|t| t.get_cell(0).get_int32().unwrap())
        .collect();
    values.sort();
    values
}
