//! Statically declared field graphs for searchable entities.
//!
//! Every searchable entity exposes one [`EntityDescriptor`] listing the fields a
//! client may reference in a filter path. Scalar fields map to a column and a
//! [`SemanticType`]; object and collection fields point at another descriptor
//! together with the columns that join the two tables.

use std::fmt;

/// Semantic type of a leaf field, used to select a search strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Text,
    Integer,
    Real,
    Boolean,
    /// Stored as integer nanoseconds since the Unix epoch
    Timestamp,
    Uuid,
    /// Closed set of text values, identified by name
    Enum(&'static str),
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SemanticType::Text => write!(f, "text"),
            SemanticType::Integer => write!(f, "integer"),
            SemanticType::Real => write!(f, "real"),
            SemanticType::Boolean => write!(f, "boolean"),
            SemanticType::Timestamp => write!(f, "timestamp"),
            SemanticType::Uuid => write!(f, "uuid"),
            SemanticType::Enum(name) => write!(f, "enum {}", name),
        }
    }
}

/// Columns linking a parent row to related rows.
///
/// `local` lives on the parent table, `remote` on the related table; related
/// rows are those where `remote = local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    pub local: &'static str,
    pub remote: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar {
        column: &'static str,
        semantic_type: SemanticType,
    },
    /// At most one related row
    Object {
        entity: &'static EntityDescriptor,
        join: Join,
    },
    /// Any number of related rows
    Collection {
        entity: &'static EntityDescriptor,
        join: Join,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn scalar(name: &'static str, column: &'static str, semantic_type: SemanticType) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar {
                column,
                semantic_type,
            },
        }
    }

    pub const fn object(name: &'static str, entity: &'static EntityDescriptor, join: Join) -> Self {
        Self {
            name,
            kind: FieldKind::Object { entity, join },
        }
    }

    pub const fn collection(
        name: &'static str,
        entity: &'static EntityDescriptor,
        join: Join,
    ) -> Self {
        Self {
            name,
            kind: FieldKind::Collection { entity, join },
        }
    }

    pub fn semantic_type(&self) -> Option<SemanticType> {
        match self.kind {
            FieldKind::Scalar { semantic_type, .. } => Some(semantic_type),
            FieldKind::Object { .. } | FieldKind::Collection { .. } => None,
        }
    }

    pub fn nested(&self) -> Option<&'static EntityDescriptor> {
        match self.kind {
            FieldKind::Scalar { .. } => None,
            FieldKind::Object { entity, .. } | FieldKind::Collection { entity, .. } => Some(entity),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, FieldKind::Collection { .. })
    }
}

pub struct EntityDescriptor {
    pub name: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().find(|field| field.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter()
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("table", &self.table)
            .field(
                "fields",
                &self.fields.iter().map(|field| field.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// Descriptors are statics, so identity is the address. Comparing field lists
// structurally would recurse forever through back references.
impl PartialEq for EntityDescriptor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for EntityDescriptor {}

/// A type that can be the root of a search
pub trait Entity {
    fn descriptor() -> &'static EntityDescriptor;
}
