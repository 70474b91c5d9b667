mod catalog;
mod database;

pub use catalog::{Catalog, TableRC};
pub use database::Database;
