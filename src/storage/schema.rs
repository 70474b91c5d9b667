use std::fmt;

/// Maximum byte length of the payload of a string field. Strings are
/// stored as a 4-byte big-endian length prefix followed by exactly
/// this many bytes, zero padded after the logical length.
pub const MAX_STRING_LEN: usize = 128;

/// The closed set of field types.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Type {
    Int32,
    String,
}

impl Type {
    /// Get the on-disk size of the type in bytes.
    pub fn size(&self) -> usize {
        match self {
            Type::Int32 => 4,
            Type::String => 4 + MAX_STRING_LEN,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct FieldItem {
    pub field_name: String,
    pub field_type: Type,
}

impl FieldItem {
    pub fn new(field_name: &str, field_type: Type) -> FieldItem {
        FieldItem {
            field_name: field_name.to_string(),
            field_type,
        }
    }
}

/// An ordered, non-empty sequence of typed fields.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub fields: Vec<FieldItem>,
}

impl Schema {
    pub fn new(fields: Vec<FieldItem>) -> Schema {
        Schema { fields }
    }

    pub fn merge(schema1: &Schema, schema2: &Schema) -> Schema {
        let mut fields = schema1.fields.clone();
        fields.extend(schema2.fields.clone());
        Schema { fields }
    }

    /// Get tuple size in bytes.
    pub fn get_size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.size()).sum()
    }

    pub fn get_field(&self, i: usize) -> &FieldItem {
        &self.fields[i]
    }

    pub fn fields_count(&self) -> usize {
        self.fields.len()
    }

    /// Index of the first field with the given name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.field_name == name)
    }
}

/// Two schemas are equal iff their type sequences are equal, field
/// names are not significant.
impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let content: Vec<String> = self
            .fields
            .iter()
            .map(|item| format!("{}({:?})", item.field_name, item.field_type))
            .collect();
        write!(f, "[{}]", content.join(", "))
    }
}

pub fn small_int_schema(width: usize, name_prefix: &str) -> Schema {
    let mut fields: Vec<FieldItem> = Vec::new();
    for i in 0..width {
        let field = FieldItem {
            field_name: format!("{}-{}", name_prefix, i),
            field_type: Type::Int32,
        };
        fields.push(field);
    }

    Schema { fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_equality_ignores_names() {
        let a = small_int_schema(3, "a");
        let b = small_int_schema(3, "b");
        assert_eq!(a, b);

        let c = small_int_schema(2, "a");
        assert_ne!(a, c);

        let d = Schema::new(vec![
            FieldItem::new("x", Type::Int32),
            FieldItem::new("y", Type::String),
        ]);
        assert_ne!(a, d);
    }

    #[test]
    fn test_merge() {
        let a = small_int_schema(2, "a");
        let b = Schema::new(vec![FieldItem::new("s", Type::String)]);
        let merged = Schema::merge(&a, &b);
        assert_eq!(merged.fields_count(), 3);
        assert_eq!(merged.get_size(), 4 + 4 + 4 + MAX_STRING_LEN);
    }

    #[test]
    fn test_field_index_first_match() {
        let schema = Schema::new(vec![
            FieldItem::new("x", Type::Int32),
            FieldItem::new("dup", Type::Int32),
            FieldItem::new("dup", Type::String),
        ]);
        assert_eq!(schema.field_index("dup"), Some(1));
        assert_eq!(schema.field_index("missing"), None);
    }
}
