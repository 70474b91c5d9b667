use crate::{
    error::SmallError,
    execution::{JoinPredicate, OpIterator, OpState},
    storage::{schema::Schema, tuple::Tuple},
    types::SmallResult,
};

/// Nested-loops join. For every outer tuple the inner child is
/// rewound and fully scanned; matching pairs are emitted as
/// concatenated tuples over the merged schema.
pub struct Join {
    predicate: JoinPredicate,
    outer: Box<dyn OpIterator>,
    inner: Box<dyn OpIterator>,
    schema: Schema,

    cur_outer: Option<Tuple>,
    state: OpState,
    peek: Option<Tuple>,
}

impl Join {
    pub fn new(
        predicate: JoinPredicate,
        outer: Box<dyn OpIterator>,
        inner: Box<dyn OpIterator>,
    ) -> Self {
        let schema = Schema::merge(outer.get_schema(), inner.get_schema());
        Self {
            predicate,
            outer,
            inner,
            schema,
            cur_outer: None,
            state: OpState::Closed,
            peek: None,
        }
    }

    fn produce(&mut self) -> Result<Option<Tuple>, SmallError> {
        loop {
            if self.cur_outer.is_none() {
                if !self.outer.has_next()? {
                    return Ok(None);
                }
                self.cur_outer = Some(self.outer.next()?);
                self.inner.rewind()?;
            }

            let outer = self.cur_outer.clone().unwrap();
            while self.inner.has_next()? {
                let inner = self.inner.next()?;
                if self.predicate.matches(&outer, &inner) {
                    return Ok(Some(Tuple::merge(&outer, &inner)));
                }
            }

            // inner exhausted, move to the next outer tuple
            self.cur_outer = None;
        }
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> SmallResult {
        self.outer.open()?;
        self.inner.open()?;
        self.cur_outer = None;
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
        self.outer.rewind()?;
        self.inner.rewind()?;
        self.cur_outer = None;
        self.state = OpState::Open;
        self.peek = None;
        Ok(())
    }

    fn close(&mut self) -> SmallResult {
        self.outer.close()?;
        self.inner.close()?;
        self.cur_outer = None;
        self.state = OpState::Closed;
        self.peek = None;
        Ok(())
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
