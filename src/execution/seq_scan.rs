use std::sync::Arc;

use crate::{
    common::Database,
    error::SmallError,
    execution::{OpIterator, OpState},
    storage::{heap_file::HeapFileIterator, schema::Schema, tuple::Tuple},
    transaction::Transaction,
    types::SmallResult,
};

/// Sequential scan over one table. Field names in the scan's schema
/// are prefixed with the table alias, the way they would appear in a
/// query plan.
pub struct SeqScan {
    table_alias: String,
    schema: Schema,

    iter: HeapFileIterator,
    state: OpState,
    peek: Option<Tuple>,
}

impl SeqScan {
    pub fn new(
        db: &Arc<Database>,
        tx: &Transaction,
        table_id: u32,
        table_alias: &str,
    ) -> Result<Self, SmallError> {
        let base = db
            .catalog()
            .get_schema(&table_id)
            .ok_or_else(|| SmallError::db("table not found in the catalog"))?;

        let mut schema = base;
        for field in schema.fields.iter_mut() {
            field.field_name = format!("{}.{}", table_alias, field.field_name);
        }

        Ok(Self {
            table_alias: table_alias.to_string(),
            schema,
            iter: HeapFileIterator::new(db, tx, table_id),
            state: OpState::Closed,
            peek: None,
        })
    }

    pub fn get_table_alias(&self) -> &str {
        &self.table_alias
    }

    fn produce(&mut self) -> Result<Option<Tuple>, SmallError> {
        self.iter.try_next()
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> SmallResult {
        self.iter.rewind()?;
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
        self.iter.rewind()?;
        self.state = OpState::Open;
        self.peek = None;
        Ok(())
    }

    fn close(&mut self) -> SmallResult {
        self.state = OpState::Closed;
        self.peek = None;
        Ok(())
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
