use std::sync::Arc;

use crate::{
    common::Database,
    error::SmallError,
    execution::{OpIterator, OpState},
    storage::{
        buffer_pool::BufferPool,
        schema::{FieldItem, Schema, Type},
        tuple::{Cell, Tuple},
    },
    transaction::Transaction,
    types::SmallResult,
};

/// Single-shot operator: drains the child, routing every tuple into
/// the table through the buffer pool, then emits one row holding the
/// number of inserted tuples.
pub struct Insert {
    db: Arc<Database>,
    tx: Transaction,
    table_id: u32,
    child: Box<dyn OpIterator>,
    schema: Schema,

    done: bool,
    state: OpState,
    peek: Option<Tuple>,
}

impl Insert {
    pub fn new(
        db: &Arc<Database>,
        tx: &Transaction,
        table_id: u32,
        child: Box<dyn OpIterator>,
    ) -> Result<Self, SmallError> {
        let table_schema = db
            .catalog()
            .get_schema(&table_id)
            .ok_or_else(|| SmallError::db("table not found in the catalog"))?;
        if child.get_schema() != &table_schema {
            return Err(SmallError::db("child schema does not match the table"));
        }

        Ok(Self {
            db: Arc::clone(db),
            tx: tx.clone(),
            table_id,
            child,
            schema: Schema::new(vec![FieldItem::new("count", Type::Int32)]),
            done: false,
            state: OpState::Closed,
            peek: None,
        })
    }

    fn produce(&mut self) -> Result<Option<Tuple>, SmallError> {
        if self.done {
            return Ok(None);
        }

        let mut count = 0;
        while self.child.has_next()? {
            let t = self.child.next()?;
            BufferPool::insert_tuple(&self.db, &self.tx, self.table_id, &t)?;
            count += 1;
        }
        self.done = true;
        Ok(Some(Tuple::new_from_cells(&[Cell::Int32(count)])))
    }
}

impl OpIterator for Insert {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;
        self.done = false;
        self.state = OpState::Open;
        self.peek = None;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        match self.state {
            OpState::Closed => Err(SmallError::db("operator is not open")),
            OpState::Exhausted => Ok(false),
            OpState::Open => {
                if self.peek.is_none() {
                    self.peek = self.produce()?;
                    if self.peek.is_none() {
                        self.state = OpState::Exhausted;
                    }
                }
                Ok(self.peek.is_some())
            }
        }
    }

    fn next(&mut self) -> Result<Tuple, SmallError> {
        if self.has_next()? {
            Ok(self.peek.take().unwrap())
        } else {
            Err(SmallError::NoSuchElement)
        }
    }

    fn rewind(&mut self) -> SmallResult {
        if self.state == OpState::Closed {
            return Err(SmallError::db("operator is not open"));
        }
        self.child.rewind()?;
        self.done = false;
        self.state = OpState::Open;
        self.peek = None;
        Ok(())
    }

    fn close(&mut self) -> SmallResult {
        self.child.close()?;
        self.state = OpState::Closed;
        self.peek = None;
        Ok(())
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
