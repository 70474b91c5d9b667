use std::sync::Arc;

use crate::{
    common::Database,
    error::SmallError,
    execution::Op,
    optimizer::{IntHistogram, StringHistogram},
    storage::{
        heap_file::HeapFileIterator,
        schema::Type,
        tuple::Cell,
    },
    transaction::Transaction,
    utils::HandyRwLock,
};

pub const NUM_HIST_BINS: usize = 100;

/// Per-field histogram, a closed tagged set like the field types
/// themselves.
enum FieldHistogram {
    Int32(IntHistogram),
    String(StringHistogram),
}

/// Per-table statistics for selectivity and scan-cost estimation.
///
/// Construction is two-pass: the first scan collects tuple count and
/// the min/max of every int field, the second fills the per-field
/// histograms. Callers own their instances, there is no global stats
/// registry.
pub struct TableStats {
    io_cost_per_page: usize,
    num_tuples: usize,
    num_pages: usize,
    histograms: Vec<FieldHistogram>,
}

impl TableStats {
    pub fn new(
        db: &Arc<Database>,
        table_id: u32,
        io_cost_per_page: usize,
    ) -> Result<Self, SmallError> {
        let (schema, num_pages) = {
            let catalog = db.catalog();
            let table_rc = catalog
                .get_table(&table_id)
                .ok_or_else(|| SmallError::db("table not found in the catalog"))?;
            let table = table_rc.rl();
            (table.get_schema().clone(), table.num_pages())
        };

        let tx = Transaction::new();
        let fields_count = schema.fields_count();

        // pass 1: tuple count and per-field min/max (int fields only)
        let mut mins = vec![i32::max_value(); fields_count];
        let mut maxs = vec![i32::min_value(); fields_count];
        let mut num_tuples = 0;

        let mut iter = HeapFileIterator::new(db, &tx, table_id);
        while let Some(t) = iter.try_next()? {
            num_tuples += 1;
            for i in 0..fields_count {
                if let Cell::Int32(v) = t.get_cell(i) {
                    mins[i] = mins[i].min(v);
                    maxs[i] = maxs[i].max(v);
                }
            }
        }

        // pass 2: build and fill the histograms
        let mut histograms: Vec<FieldHistogram> = schema
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| match field.field_type {
                Type::Int32 => {
                    let (min, max) = if mins[i] <= maxs[i] {
                        (mins[i], maxs[i])
                    } else {
                        // empty table
                        (0, 0)
                    };
                    FieldHistogram::Int32(IntHistogram::new(NUM_HIST_BINS, min, max))
                }
                Type::String => FieldHistogram::String(StringHistogram::new(NUM_HIST_BINS)),
            })
            .collect();

        iter.rewind()?;
        while let Some(t) = iter.try_next()? {
            for (i, histogram) in histograms.iter_mut().enumerate() {
                match (histogram, t.get_cell(i)) {
                    (FieldHistogram::Int32(h), Cell::Int32(v)) => h.add_value(v),
                    (FieldHistogram::String(h), Cell::String(s)) => h.add_value(&s),
                    _ => {}
                }
            }
        }

        tx.commit(db)?;

        Ok(Self {
            io_cost_per_page,
            num_tuples,
            num_pages,
            histograms,
        })
    }

    /// Cost of a full sequential scan of the table.
    pub fn estimate_scan_cost(&self) -> f64 {
        (self.num_pages * self.io_cost_per_page) as f64
    }

    /// Expected result size of a predicate with the given
    /// selectivity.
    pub fn estimate_cardinality(&self, selectivity: f64) -> usize {
        (self.num_tuples as f64 * selectivity).round() as usize
    }

    pub fn estimate_selectivity(
        &self,
        field: usize,
        op: Op,
        constant: &Cell,
    ) -> Result<f64, SmallError> {
        match (&self.histograms[field], constant) {
            (FieldHistogram::Int32(h), Cell::Int32(v)) => Ok(h.estimate_selectivity(op, *v)),
            (FieldHistogram::String(h), Cell::String(s)) => Ok(h.estimate_selectivity(op, s)),
            _ => Err(SmallError::db("constant type does not match the field")),
        }
    }

    pub fn get_num_tuples(&self) -> usize {
        self.num_tuples
    }
}
