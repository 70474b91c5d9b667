mod test_utils;

use small_rows::{
    optimizer::TableStats, utils::HandyRwLock, BufferPool, Cell, Database, Op, Transaction,
    Tuple,
};
use tempfile::TempDir;

use crate::test_utils::{new_empty_table, setup};

#[test]
fn test_table_stats_estimates() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let table_rc = new_empty_table(&db, &dir, "table", 1);
    let table_id = table_rc.rl().get_id();

    let tx = Transaction::new();
    for v in 1..=100 {
        BufferPool::insert_tuple(&db, &tx, table_id, &Tuple::new_int_tuple(v, 1)).unwrap();
    }
    tx.commit(&db).unwrap();

    let io_cost = 17;
    let stats = TableStats::new(&db, table_id, io_cost).unwrap();

    assert_eq!(stats.get_num_tuples(), 100);
    let pages = table_rc.rl().num_pages();
    assert_eq!(stats.estimate_scan_cost(), (pages * io_cost) as f64);

    let sel = stats
        .estimate_selectivity(0, Op::GreaterThan, &Cell::Int32(50))
        .unwrap();
    assert!((sel - 0.50).abs() < 0.01);
    assert_eq!(stats.estimate_cardinality(sel), 50);

    let sel = stats
        .estimate_selectivity(0, Op::Equals, &Cell::Int32(50))
        .unwrap();
    assert!((sel - 0.01).abs() < 0.005);

    assert_eq!(
        stats
            .estimate_selectivity(0, Op::GreaterThan, &Cell::Int32(200))
            .unwrap(),
        0.0
    );
    assert_eq!(
        stats
            .estimate_selectivity(0, Op::LessThan, &Cell::Int32(0))
            .unwrap(),
        0.0
    );
}

#[test]
fn test_table_stats_empty_table() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let table_rc = new_empty_table(&db, &dir, "empty", 2);
    let table_id = table_rc.rl().get_id();

    let stats = TableStats::new(&db, table_id, 1).unwrap();
    assert_eq!(stats.get_num_tuples(), 0);
    assert_eq!(stats.estimate_scan_cost(), 0.0);
    assert_eq!(stats.estimate_cardinality(0.5), 0);
}

#[test]
fn test_table_stats_type_mismatch() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let table_rc = new_empty_table(&db, &dir, "table", 1);
    let table_id = table_rc.rl().get_id();

    let tx = Transaction::new();
    BufferPool::insert_tuple(&db, &tx, table_id, &Tuple::new_int_tuple(1, 1)).unwrap();
    tx.commit(&db).unwrap();

    let stats = TableStats::new(&db, table_id, 1).unwrap();
    assert!(stats
        .estimate_selectivity(0, Op::Equals, &Cell::String("x".to_string()))
        .is_err());
}
