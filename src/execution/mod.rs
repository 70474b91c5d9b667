mod aggregate;
mod delete;
mod filter;
mod insert;
mod join;
mod predicate;
mod seq_scan;
mod tuple_iterator;

pub use aggregate::{Aggregate, AggregateOp};
pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use join::Join;
pub use predicate::{JoinPredicate, Op, Predicate};
pub use seq_scan::SeqScan;
pub use tuple_iterator::TupleIterator;

use crate::{error::SmallError, storage::schema::Schema, storage::tuple::Tuple, types::SmallResult};

/// Lifecycle of a pull operator.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OpState {
    Closed,
    Open,
    Exhausted,
}

/// The pull-iterator contract shared by every operator.
///
/// `open` is required before `has_next`; `next` after `has_next`
/// returned false fails with `NoSuchElement`. `rewind` restarts an
/// open operator from the first tuple.
pub trait OpIterator {
    fn open(&mut self) -> SmallResult;

    fn has_next(&mut self) -> Result<bool, SmallError>;

    fn next(&mut self) -> Result<Tuple, SmallError>;

    fn rewind(&mut self) -> SmallResult;

    fn close(&mut self) -> SmallResult;

    fn get_schema(&self) -> &Schema;
}
