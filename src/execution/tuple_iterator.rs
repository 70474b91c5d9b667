use crate::{
    error::SmallError,
    execution::{OpIterator, OpState},
    storage::{schema::Schema, tuple::Tuple},
    types::SmallResult,
};

/// Leaf operator over an in-memory list of tuples. Feeds mutation
/// operators and tests.
pub struct TupleIterator {
    schema: Schema,
    tuples: Vec<Tuple>,

    cursor: usize,
    state: OpState,
}

impl TupleIterator {
    pub fn new(schema: &Schema, tuples: Vec<Tuple>) -> Self {
        Self {
            schema: schema.clone(),
            tuples,
            cursor: 0,
            state: OpState::Closed,
        }
    }
}

impl OpIterator for TupleIterator {
    fn open(&mut self) -> SmallResult {
        self.cursor = 0;
        self.state = OpState::Open;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        match self.state {
            OpState::Closed => Err(SmallError::db("operator is not open")),
            OpState::Exhausted => Ok(false),
            OpState::Open => {
                if self.cursor >= self.tuples.len() {
                    self.state = OpState::Exhausted;
                    return Ok(false);
                }
                Ok(true)
            }
        }
    }

    fn next(&mut self) -> Result<Tuple, SmallError> {
        if self.has_next()? {
            let t = self.tuples[self.cursor].clone();
            self.cursor += 1;
            Ok(t)
        } else {
            Err(SmallError::NoSuchElement)
        }
    }

    fn rewind(&mut self) -> SmallResult {
        if self.state == OpState::Closed {
            return Err(SmallError::db("operator is not open"));
        }
        self.cursor = 0;
        self.state = OpState::Open;
        Ok(())
    }

    fn close(&mut self) -> SmallResult {
        self.state = OpState::Closed;
        self.cursor = 0;
        Ok(())
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
