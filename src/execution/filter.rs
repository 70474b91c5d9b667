use crate::{
    error::SmallError,
    execution::{OpIterator, OpState, Predicate},
    storage::{schema::Schema, tuple::Tuple},
    types::SmallResult,
};

/// Propagates the child's tuples that satisfy the predicate.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,

    state: OpState,
    peek: Option<Tuple>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        Self {
            predicate,
            child,
            state: OpState::Closed,
            peek: None,
        }
    }

    fn produce(&mut self) -> Result<Option<Tuple>, SmallError> {
        while self.child.has_next()? {
            let t = self.child.next()?;
            if self.predicate.matches(&t) {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;
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
        self.child.get_schema()
    }
}
