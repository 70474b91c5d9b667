use std::{error::Error, fmt, io};

use backtrace::Backtrace;

/// Error kinds are distinguished by how the caller recovers:
///
/// - `Io`: disk read/write failure, propagated as-is.
/// - `Db`: semantic error (full buffer pool, malformed tuple, missing
///   field, delete of an absent tuple).
/// - `TransactionAborted`: raised on a would-be deadlock, the only
///   recovery is aborting the transaction.
/// - `NoSuchElement`: iterator misuse, never expected in callers that
///   check `has_next`.
#[derive(Debug, Clone, PartialEq)]
pub enum SmallError {
    Io(String),
    Db(String),
    TransactionAborted,
    NoSuchElement,
}

impl SmallError {
    pub fn io(msg: &str) -> SmallError {
        SmallError::Io(msg.to_string())
    }

    pub fn db(msg: &str) -> SmallError {
        SmallError::Db(msg.to_string())
    }

    pub fn show_backtrace(&self) {
        let bt = Backtrace::new();
        eprintln!("{}\n{:?}", self, bt);
    }
}

impl fmt::Display for SmallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SmallError::Io(msg) => write!(f, "io error: {}", msg),
            SmallError::Db(msg) => write!(f, "db error: {}", msg),
            SmallError::TransactionAborted => {
                write!(f, "transaction aborted")
            }
            SmallError::NoSuchElement => write!(f, "no such element"),
        }
    }
}

impl Error for SmallError {}

impl From<io::Error> for SmallError {
    fn from(e: io::Error) -> Self {
        SmallError::Io(e.to_string())
    }
}
