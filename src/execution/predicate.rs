use std::fmt;

use crate::storage::tuple::{Cell, Tuple};

/// The six comparison operators.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Op {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
}

impl Op {
    pub fn compare(&self, a: &Cell, b: &Cell) -> bool {
        match self {
            Op::Equals => a == b,
            Op::NotEquals => a != b,
            Op::GreaterThan => a > b,
            Op::GreaterThanOrEq => a >= b,
            Op::LessThan => a < b,
            Op::LessThanOrEq => a <= b,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            Op::Equals => "=",
            Op::NotEquals => "<>",
            Op::GreaterThan => ">",
            Op::GreaterThanOrEq => ">=",
            Op::LessThan => "<",
            Op::LessThanOrEq => "<=",
        };
        write!(f, "{}", symbol)
    }
}

/// Compares one field of a tuple against a constant.
#[derive(Clone)]
pub struct Predicate {
    pub field_index: usize,
    pub op: Op,
    pub cell: Cell,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, cell: &Cell) -> Self {
        Self {
            field_index,
            op,
            cell: cell.clone(),
        }
    }

    pub fn matches(&self, tuple: &Tuple) -> bool {
        self.op.compare(&tuple.get_cell(self.field_index), &self.cell)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "field[{}] {} {}",
            self.field_index, self.op, self.cell
        )
    }
}

/// Compares a field of one tuple against a field of another, used by
/// joins.
#[derive(Clone)]
pub struct JoinPredicate {
    pub field1: usize,
    pub op: Op,
    pub field2: usize,
}

impl JoinPredicate {
    pub fn new(field1: usize, op: Op, field2: usize) -> Self {
        Self { field1, op, field2 }
    }

    pub fn matches(&self, a: &Tuple, b: &Tuple) -> bool {
        self.op.compare(&a.get_cell(self.field1), &b.get_cell(self.field2))
    }
}
