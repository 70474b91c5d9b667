use std::fmt;

use crate::{
    error::SmallError,
    storage::schema::{Type, MAX_STRING_LEN},
    utils::{Encodeable, SmallReader},
};

/// A tagged field value. The variant set is closed, matches are
/// exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Int32(i32),
    String(String),
}

impl Cell {
    pub fn get_type(&self) -> Type {
        match self {
            Cell::Int32(_) => Type::Int32,
            Cell::String(_) => Type::String,
        }
    }

    pub fn get_int32(&self) -> Result<i32, SmallError> {
        match self {
            Cell::Int32(v) => Ok(*v),
            _ => Err(SmallError::db("cell is not an int32")),
        }
    }

    pub fn get_string(&self) -> Result<String, SmallError> {
        match self {
            Cell::String(v) => Ok(v.clone()),
            _ => Err(SmallError::db("cell is not a string")),
        }
    }

    pub fn read_from(reader: &mut SmallReader, t: Type) -> Result<Self, SmallError> {
        match t {
            Type::Int32 => Ok(Cell::Int32(reader.read_i32()?)),
            Type::String => {
                let len = reader.read_u32()? as usize;
                let payload = reader.read_exact(MAX_STRING_LEN)?;
                if len > MAX_STRING_LEN {
                    return Err(SmallError::db("string length prefix out of range"));
                }
                let s = String::from_utf8(payload[..len].to_vec())
                    .map_err(|_| SmallError::db("string field is not valid utf-8"))?;
                Ok(Cell::String(s))
            }
        }
    }
}

impl Encodeable for Cell {
    fn encode(&self) -> Vec<u8> {
        match self {
            Cell::Int32(v) => v.to_be_bytes().to_vec(),
            Cell::String(v) => {
                let payload = v.as_bytes();
                // values longer than the slot are truncated
                let len = payload.len().min(MAX_STRING_LEN);
                let mut buf = Vec::with_capacity(4 + MAX_STRING_LEN);
                buf.extend_from_slice(&(len as u32).to_be_bytes());
                buf.extend_from_slice(&payload[..len]);
                buf.resize(4 + MAX_STRING_LEN, 0);
                buf
            }
        }
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Cell::Int32(a), Cell::Int32(b)) => a.partial_cmp(b),
            (Cell::String(a), Cell::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.partial_cmp(other)
            .expect("cells of different types are not comparable")
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Int32(v) => write!(f, "{}", v),
            Cell::String(v) => write!(f, "{:?}", v),
        }
    }
}
