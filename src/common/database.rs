use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    common::{Catalog, TableRC},
    storage::buffer_pool::BufferPool,
    types::Pod,
    utils::HandyRwLock,
};

/// We collect all shared state here.
///
/// The handle is explicit: operators, files and tests receive (a
/// clone of) an `Arc<Database>` at construction and every test can
/// instantiate its own isolated instance.
pub struct Database {
    catalog: Pod<Catalog>,
    buffer_pool: Pod<BufferPool>,
}

impl Database {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            catalog: Arc::new(RwLock::new(Catalog::new())),
            buffer_pool: Arc::new(RwLock::new(BufferPool::new())),
        })
    }

    pub fn catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.rl()
    }

    pub fn mut_catalog(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.wl()
    }

    pub fn buffer_pool(&self) -> RwLockReadGuard<'_, BufferPool> {
        self.buffer_pool.rl()
    }

    pub fn mut_buffer_pool(&self) -> RwLockWriteGuard<'_, BufferPool> {
        self.buffer_pool.wl()
    }

    pub fn add_table(&self, table_rc: TableRC, name: &str) {
        self.mut_catalog().add_table(table_rc, name);
    }
}
