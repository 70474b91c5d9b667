mod test_utils;

use small_rows::{
    utils::HandyRwLock, Aggregate, AggregateOp, BufferPool, Cell, Database, Delete, FieldItem,
    Filter, Insert, Join, JoinPredicate, Op, OpIterator, Predicate, Schema, SeqScan,
    SmallError, Transaction, Tuple, TupleIterator, Type,
};
use tempfile::TempDir;

use crate::test_utils::{
    insert_rows, new_empty_table, new_empty_table_with_schema, new_random_table, scan_values,
    setup,
};

fn drain(op: &mut dyn OpIterator) -> Vec<Tuple> {
    let mut rows = Vec::new();
    while op.has_next().unwrap() {
        rows.push(op.next().unwrap());
    }
    rows
}

#[test]
fn test_filter() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let mut cells = Vec::new();
    let table_rc = new_random_table(&db, &dir, "table", 2, 1000, &mut cells);
    let table_id = table_rc.rl().get_id();

    let tx = Transaction::new();
    let scan = SeqScan::new(&db, &tx, table_id, "t").unwrap();
    let predicate = Predicate::new(0, Op::GreaterThan, &Cell::Int32(0));
    let mut filter = Filter::new(predicate, Box::new(scan));

    filter.open().unwrap();
    let got: Vec<i32> = drain(&mut filter)
        .iter()
        .map(|t| t.get_cell(0).get_int32().unwrap())
        .collect();
    filter.close().unwrap();
    tx.commit(&db).unwrap();

    let mut expected: Vec<i32> = cells.iter().copied().filter(|&v| v > 0).collect();
    expected.sort();
    let mut got_sorted = got;
    got_sorted.sort();
    assert_eq!(got_sorted, expected);
}

#[test]
fn test_join() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();

    let left_rc = new_empty_table(&db, &dir, "left", 2);
    let right_rc = new_empty_table(&db, &dir, "right", 2);
    let left_id = left_rc.rl().get_id();
    let right_id = right_rc.rl().get_id();

    insert_rows(&db, left_id, &[1, 2, 3, 4], 2);
    insert_rows(&db, right_id, &[3, 4, 5], 2);

    let tx = Transaction::new();
    let outer = SeqScan::new(&db, &tx, left_id, "l").unwrap();
    let inner = SeqScan::new(&db, &tx, right_id, "r").unwrap();
    let mut join = Join::new(
        JoinPredicate::new(0, Op::Equals, 0),
        Box::new(outer),
        Box::new(inner),
    );

    assert_eq!(join.get_schema().fields_count(), 4);

    join.open().unwrap();
    let mut got: Vec<(i32, i32)> = drain(&mut join)
        .iter()
        .map(|t| {
            (
                t.get_cell(0).get_int32().unwrap(),
                t.get_cell(2).get_int32().unwrap(),
            )
        })
        .collect();
    join.close().unwrap();
    tx.commit(&db).unwrap();

    got.sort();
    assert_eq!(got, vec![(3, 3), (4, 4)]);
}

#[test]
fn test_aggregate_avg_grouped() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let schema = Schema::new(vec![
        FieldItem::new("g", Type::Int32),
        FieldItem::new("a", Type::Int32),
    ]);
    let table_rc = new_empty_table_with_schema(&db, &dir, "table", &schema);
    let table_id = table_rc.rl().get_id();

    let tx = Transaction::new();
    for (g, a) in &[(1, 10), (1, 30), (2, 20)] {
        let tuple = Tuple::new_from_cells(&[Cell::Int32(*g), Cell::Int32(*a)]);
        BufferPool::insert_tuple(&db, &tx, table_id, &tuple).unwrap();
    }
    tx.commit(&db).unwrap();

    let tx = Transaction::new();
    let scan = SeqScan::new(&db, &tx, table_id, "t").unwrap();
    let mut agg = Aggregate::new(Box::new(scan), 1, Some(0), AggregateOp::Avg).unwrap();

    agg.open().unwrap();
    let got: Vec<(i32, i32)> = drain(&mut agg)
        .iter()
        .map(|t| {
            (
                t.get_cell(0).get_int32().unwrap(),
                t.get_cell(1).get_int32().unwrap(),
            )
        })
        .collect();
    agg.close().unwrap();
    tx.commit(&db).unwrap();

    assert_eq!(got, vec![(1, 20), (2, 20)]);
}

#[test]
fn test_aggregate_no_grouping() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let table_rc = new_empty_table(&db, &dir, "table", 1);
    let table_id = table_rc.rl().get_id();
    insert_rows(&db, table_id, &[5, 1, 9, 3], 1);

    let cases = [
        (AggregateOp::Min, 1),
        (AggregateOp::Max, 9),
        (AggregateOp::Sum, 18),
        (AggregateOp::Avg, 4),
        (AggregateOp::Count, 4),
    ];

    for &(op, expected) in &cases {
        let tx = Transaction::new();
        let scan = SeqScan::new(&db, &tx, table_id, "t").unwrap();
        let mut agg = Aggregate::new(Box::new(scan), 0, None, op).unwrap();

        agg.open().unwrap();
        let rows = drain(&mut agg);
        agg.close().unwrap();
        tx.commit(&db).unwrap();

        assert_eq!(rows.len(), 1, "op: {:?}", op);
        assert_eq!(rows[0].get_cell(0).get_int32().unwrap(), expected, "op: {:?}", op);
    }
}

#[test]
fn test_aggregate_string_count_only() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let schema = Schema::new(vec![
        FieldItem::new("name", Type::String),
        FieldItem::new("n", Type::Int32),
    ]);
    let table_rc = new_empty_table_with_schema(&db, &dir, "table", &schema);
    let table_id = table_rc.rl().get_id();

    let tx = Transaction::new();
    for (name, n) in &[("a", 1), ("a", 2), ("b", 3)] {
        let tuple =
            Tuple::new_from_cells(&[Cell::String(name.to_string()), Cell::Int32(*n)]);
        BufferPool::insert_tuple(&db, &tx, table_id, &tuple).unwrap();
    }
    tx.commit(&db).unwrap();

    // count grouped by the string column
    let tx = Transaction::new();
    let scan = SeqScan::new(&db, &tx, table_id, "t").unwrap();
    let mut agg = Aggregate::new(Box::new(scan), 0, Some(0), AggregateOp::Count).unwrap();
    agg.open().unwrap();
    let got: Vec<(String, i32)> = drain(&mut agg)
        .iter()
        .map(|t| {
            (
                t.get_cell(0).get_string().unwrap(),
                t.get_cell(1).get_int32().unwrap(),
            )
        })
        .collect();
    agg.close().unwrap();

    assert_eq!(got, vec![("a".to_string(), 2), ("b".to_string(), 1)]);

    // any other aggregate over a string column is rejected
    let scan = SeqScan::new(&db, &tx, table_id, "t").unwrap();
    assert!(Aggregate::new(Box::new(scan), 0, None, AggregateOp::Min).is_err());
    tx.commit(&db).unwrap();
}

#[test]
fn test_insert_operator() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let table_rc = new_empty_table(&db, &dir, "table", 1);
    let table_id = table_rc.rl().get_id();
    let schema = table_rc.rl().get_schema().clone();

    let rows: Vec<Tuple> = vec![
        Tuple::new_int_tuple(7, 1),
        Tuple::new_int_tuple(8, 1),
        Tuple::new_int_tuple(9, 1),
    ];
    let source = TupleIterator::new(&schema, rows);

    let tx = Transaction::new();
    let mut insert = Insert::new(&db, &tx, table_id, Box::new(source)).unwrap();
    insert.open().unwrap();

    let result = drain(&mut insert);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].get_cell(0).get_int32().unwrap(), 3);

    // single shot: a second fetch yields end-of-stream
    assert!(!insert.has_next().unwrap());
    insert.close().unwrap();
    tx.commit(&db).unwrap();

    let tx = Transaction::new();
    assert_eq!(scan_values(&db, &tx, table_id), vec![7, 8, 9]);
    tx.commit(&db).unwrap();
}

#[test]
fn test_delete_operator() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let table_rc = new_empty_table(&db, &dir, "table", 1);
    let table_id = table_rc.rl().get_id();
    insert_rows(&db, table_id, &[1, 2, 3, 4, 5], 1);

    // delete everything greater than 2
    let tx = Transaction::new();
    let scan = SeqScan::new(&db, &tx, table_id, "t").unwrap();
    let filter = Filter::new(
        Predicate::new(0, Op::GreaterThan, &Cell::Int32(2)),
        Box::new(scan),
    );
    let mut delete = Delete::new(&db, &tx, Box::new(filter));

    delete.open().unwrap();
    let result = drain(&mut delete);
    delete.close().unwrap();
    tx.commit(&db).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].get_cell(0).get_int32().unwrap(), 3);

    let tx = Transaction::new();
    assert_eq!(scan_values(&db, &tx, table_id), vec![1, 2]);
    tx.commit(&db).unwrap();
}

#[test]
fn test_iterator_contract() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let table_rc = new_empty_table(&db, &dir, "table", 1);
    let table_id = table_rc.rl().get_id();
    insert_rows(&db, table_id, &[1], 1);

    let tx = Transaction::new();
    let mut scan = SeqScan::new(&db, &tx, table_id, "t").unwrap();

    // has_next before open is an error
    assert!(scan.has_next().is_err());

    scan.open().unwrap();
    assert!(scan.has_next().unwrap());
    scan.next().unwrap();
    assert!(!scan.has_next().unwrap());

    // next past the end
    assert_eq!(scan.next().err(), Some(SmallError::NoSuchElement));

    // rewind restarts
    scan.rewind().unwrap();
    assert!(scan.has_next().unwrap());

    scan.close().unwrap();
    assert!(scan.has_next().is_err());
    tx.commit(&db).unwrap();
}

#[test]
fn test_scan_alias_prefixes_schema() {
    setup();

    let db = Database::new();
    let dir = TempDir::new().unwrap();
    let table_rc = new_empty_table(&db, &dir, "table", 2);
    let table_id = table_rc.rl().get_id();

    let tx = Transaction::new();
    let scan = SeqScan::new(&db, &tx, table_id, "alias").unwrap();
    let schema = scan.get_schema();
    assert_eq!(schema.field_index("alias.c-0"), Some(0));
    assert_eq!(schema.field_index("alias.c-1"), Some(1));
    tx.commit(&db).unwrap();
}
