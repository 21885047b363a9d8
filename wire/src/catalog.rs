use std::collections::HashMap;

use crate::builtin;
use crate::error::{Error, Result};
use crate::kind::FieldKind;

/// A declared field: its key and the index into the type's kind palette.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind_index: u32,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind_index: u32) -> Self {
        FieldSpec {
            name: name.into(),
            kind_index,
        }
    }
}

/// Describes one registered record type: the ordered kind palette the wire
/// kind index points into, and the ordered field declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub(crate) name: String,
    pub(crate) kinds: Vec<FieldKind>,
    pub(crate) fields: Vec<FieldSpec>,
}

impl TypeDescriptor {
    pub fn new(
        name: impl Into<String>,
        kinds: Vec<FieldKind>,
        fields: Vec<FieldSpec>,
    ) -> Result<Self> {
        let name = name.into();
        for field in &fields {
            if field.kind_index as usize >= kinds.len() {
                return Err(Error::ErrUndeclaredKind {
                    name,
                    index: field.kind_index,
                });
            }
        }
        Ok(TypeDescriptor {
            name,
            kinds,
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kinds(&self) -> &[FieldKind] {
        &self.kinds
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Resolves a wire kind index against the palette.
    pub fn kind_of(&self, index: u32) -> Result<FieldKind> {
        self.kinds
            .get(index as usize)
            .copied()
            .ok_or(Error::ErrKindOutOfRange {
                index,
                len: self.kinds.len(),
            })
    }

    /// The palette index a declared field carries on the wire.
    pub fn index_of(&self, field: &str) -> Result<u32> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.kind_index)
            .ok_or_else(|| Error::ErrMissingField(field.to_owned()))
    }
}

/// Registry mapping type name to descriptor. Both peers must install the
/// same catalog before communicating; it is read-only afterwards.
#[derive(Debug, Default)]
pub struct Catalog {
    types: HashMap<String, TypeDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// A catalog with every built-in record type installed.
    pub fn with_builtin_types() -> Self {
        let mut catalog = Catalog::new();
        for descriptor in builtin::descriptors() {
            // Built-in names are distinct, so registration cannot collide.
            let _ = catalog.register(descriptor);
        }
        catalog
    }

    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        if self.types.contains_key(descriptor.name()) {
            return Err(Error::ErrDuplicateType(descriptor.name().to_owned()));
        }
        self.types
            .insert(descriptor.name().to_owned(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&TypeDescriptor> {
        self.types
            .get(name)
            .ok_or_else(|| Error::ErrUnknownType(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}
