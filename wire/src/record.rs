use crate::value::Value;

/// One field of a record: the key, the index into the owning type's kind
/// palette, and the value itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub kind_index: u32,
    pub value: Value,
}

/// A named aggregate of fields. Receivers construct records in wire order
/// and never mutate them afterwards; lookups go by key so the sender's
/// declaration order never matters to a reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    fields: Vec<Field>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Record {
            name: name.into(),
            fields: vec![],
        }
    }

    pub fn with_field(
        mut self,
        key: impl Into<String>,
        kind_index: u32,
        value: Value,
    ) -> Self {
        self.push(key, kind_index, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, kind_index: u32, value: Value) {
        self.fields.push(Field {
            key: key.into(),
            kind_index,
            value,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }
}
