use std::{collections::HashMap, fmt};

use itertools::Itertools;

use crate::{
    error::SmallError,
    execution::{OpIterator, OpState},
    storage::{
        schema::{FieldItem, Schema, Type},
        tuple::{Cell, Tuple},
    },
    types::SmallResult,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        };
        write!(f, "{}", name)
    }
}

/// Accumulates aggregate values for one group. An enum rather than a
/// trait since the variant set is closed.
#[derive(Clone)]
enum Accumulator {
    Min(Option<i32>),
    Max(Option<i32>),
    Sum(i64),
    Avg { sum: i64, count: i64 },
    Count(i64),
}

impl Accumulator {
    fn new(op: AggregateOp) -> Self {
        match op {
            AggregateOp::Min => Accumulator::Min(None),
            AggregateOp::Max => Accumulator::Max(None),
            AggregateOp::Sum => Accumulator::Sum(0),
            AggregateOp::Avg => Accumulator::Avg { sum: 0, count: 0 },
            AggregateOp::Count => Accumulator::Count(0),
        }
    }

    fn add(&mut self, cell: &Cell) -> SmallResult {
        match self {
            Accumulator::Min(min) => {
                let v = cell.get_int32()?;
                *min = Some(min.map_or(v, |m| m.min(v)));
            }
            Accumulator::Max(max) => {
                let v = cell.get_int32()?;
                *max = Some(max.map_or(v, |m| m.max(v)));
            }
            Accumulator::Sum(sum) => {
                *sum += cell.get_int32()? as i64;
            }
            Accumulator::Avg { sum, count } => {
                *sum += cell.get_int32()? as i64;
                *count += 1;
            }
            Accumulator::Count(count) => {
                *count += 1;
            }
        }
        Ok(())
    }

    fn value(&self) -> i32 {
        match self {
            Accumulator::Min(min) => min.unwrap_or(0),
            Accumulator::Max(max) => max.unwrap_or(0),
            Accumulator::Sum(sum) => *sum as i32,
            // integer average, truncated
            Accumulator::Avg { sum, count } => {
                if *count == 0 {
                    0
                } else {
                    (*sum / *count) as i32
                }
            }
            Accumulator::Count(count) => *count as i32,
        }
    }
}

/// Group-by aggregation. The child is fully drained on `open`, the
/// resulting groups are then emitted in sorted group order so that
/// the output is deterministic.
///
/// Int32 columns support every operator; string columns support
/// `count` only.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    agg_field: usize,
    gb_field: Option<usize>,
    op: AggregateOp,
    schema: Schema,

    results: Vec<Tuple>,
    cursor: usize,
    state: OpState,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn OpIterator>,
        agg_field: usize,
        gb_field: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self, SmallError> {
        let child_schema = child.get_schema();

        let agg_item = child_schema.get_field(agg_field);
        if agg_item.field_type == Type::String && op != AggregateOp::Count {
            return Err(SmallError::db("string fields only support count"));
        }

        let agg_name = format!("{}({})", op, agg_item.field_name);
        let mut fields = Vec::new();
        if let Some(gb) = gb_field {
            fields.push(child_schema.get_field(gb).clone());
        }
        fields.push(FieldItem::new(&agg_name, Type::Int32));
        let schema = Schema::new(fields);

        Ok(Self {
            child,
            agg_field,
            gb_field,
            op,
            schema,
            results: Vec::new(),
            cursor: 0,
            state: OpState::Closed,
        })
    }

    fn aggregate_child(&mut self) -> SmallResult {
        let mut groups: HashMap<Option<Cell>, Accumulator> = HashMap::new();

        while self.child.has_next()? {
            let t = self.child.next()?;
            let key = self.gb_field.map(|gb| t.get_cell(gb));
            let acc = groups
                .entry(key)
                .or_insert_with(|| Accumulator::new(self.op));
            acc.add(&t.get_cell(self.agg_field))?;
        }

        self.results = groups
            .into_iter()
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .map(|(key, acc)| {
                let mut cells = Vec::new();
                if let Some(group) = key {
                    cells.push(group);
                }
                cells.push(Cell::Int32(acc.value()));
                Tuple::new_from_cells(&cells)
            })
            .collect();
        Ok(())
    }

    fn produce(&mut self) -> Option<Tuple> {
        if self.cursor < self.results.len() {
            let t = self.results[self.cursor].clone();
            self.cursor += 1;
            Some(t)
        } else {
            None
        }
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;
        self.aggregate_child()?;
        self.cursor = 0;
        self.state = OpState::Open;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        match self.state {
            OpState::Closed => Err(SmallError::db("operator is not open")),
            OpState::Exhausted => Ok(false),
            OpState::Open => {
                if self.cursor >= self.results.len() {
                    self.state = OpState::Exhausted;
                    return Ok(false);
                }
                Ok(true)
            }
        }
    }

    fn next(&mut self) -> Result<Tuple, SmallError> {
        if self.has_next()? {
            Ok(self.produce().unwrap())
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
        self.child.close()?;
        self.results.clear();
        self.cursor = 0;
        self.state = OpState::Closed;
        Ok(())
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
