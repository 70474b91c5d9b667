use std::fmt;

use crate::{
    error::SmallError,
    storage::{page_id::RecordId, schema::Schema, tuple::Cell},
    utils::{Encodeable, SmallReader, SmallWriter},
};

/// A row valued according to a schema, plus the physical location of
/// the row once it has been placed on a page.
#[derive(Clone)]
pub struct Tuple {
    cells: Vec<Cell>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new_from_cells(cells: &[Cell]) -> Self {
        Self {
            cells: cells.to_vec(),
            record_id: None,
        }
    }

    /// Placeholder for an unused page slot.
    pub(crate) fn placeholder() -> Self {
        Self {
            cells: Vec::new(),
            record_id: None,
        }
    }

    pub fn read_from(reader: &mut SmallReader, schema: &Schema) -> Result<Self, SmallError> {
        let mut cells: Vec<Cell> = Vec::with_capacity(schema.fields_count());
        for field in &schema.fields {
            cells.push(Cell::read_from(reader, field.field_type)?);
        }
        Ok(Tuple {
            cells,
            record_id: None,
        })
    }

    /// Row of `width` int columns, all set to `value`. Test helper.
    pub fn new_int_tuple(value: i32, width: usize) -> Self {
        let cells = vec![Cell::Int32(value); width];
        Tuple {
            cells,
            record_id: None,
        }
    }

    pub fn get_cell(&self, i: usize) -> Cell {
        self.cells[i].clone()
    }

    pub fn get_cells(&self) -> Vec<Cell> {
        self.cells.clone()
    }

    pub fn fields_count(&self) -> usize {
        self.cells.len()
    }

    pub fn get_record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }

    /// Concatenation of two rows, used by joins. The result has no
    /// physical location.
    pub fn merge(a: &Tuple, b: &Tuple) -> Tuple {
        let mut cells = a.cells.clone();
        cells.extend(b.cells.clone());
        Tuple {
            cells,
            record_id: None,
        }
    }

    /// Check that the row matches the schema, field by field.
    pub fn matches_schema(&self, schema: &Schema) -> bool {
        self.cells.len() == schema.fields_count()
            && self
                .cells
                .iter()
                .zip(&schema.fields)
                .all(|(c, f)| c.get_type() == f.field_type)
    }
}

impl Encodeable for Tuple {
    fn encode(&self) -> Vec<u8> {
        let mut writer = SmallWriter::new();
        for cell in &self.cells {
            writer.write(cell);
        }
        writer.to_bytes()
    }
}

/// Equality is on cell values only; the record id is a physical
/// attribute, not part of the value.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let content: Vec<String> = self.cells.iter().map(|c| format!("{}", c)).collect();
        write!(f, "{{{}}}", content.join(", "))
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
