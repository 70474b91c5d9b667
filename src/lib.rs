pub mod common;
pub mod error;
pub mod execution;
pub mod optimizer;
pub mod storage;
pub mod transaction;
pub mod types;
pub mod utils;

pub use common::{Catalog, Database};
pub use error::SmallError;
pub use execution::{
    Aggregate, AggregateOp, Delete, Filter, Insert, Join, JoinPredicate, Op, OpIterator,
    Predicate, SeqScan, TupleIterator,
};
pub use storage::buffer_pool::BufferPool;
pub use storage::heap_file::{HeapFile, HeapFileIterator};
pub use storage::heap_page::HeapPage;
pub use storage::page_id::{HeapPageID, RecordId};
pub use storage::schema::{small_int_schema, FieldItem, Schema, Type};
pub use storage::tuple::{Cell, Tuple};
pub use transaction::{Lock, Permission, Transaction};
