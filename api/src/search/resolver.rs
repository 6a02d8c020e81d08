use super::error::SearchError;
use super::schema::{EntityDescriptor, FieldKind, Join, SemanticType};
use regex::Regex;
use std::sync::OnceLock;

/// Longest dotted path accepted in a filter
pub const MAX_PATH_SEGMENTS: usize = 8;

static SEGMENT_REGEX: OnceLock<Regex> = OnceLock::new();

fn segment_regex() -> &'static Regex {
    SEGMENT_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// One relation step of a resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub field: &'static str,
    pub table: &'static str,
    pub join: Join,
    pub cardinality: Cardinality,
}

/// Backend reference to a scalar column, reached from the root through `hops`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub path: String,
    pub hops: Vec<Hop>,
    pub column: &'static str,
    pub semantic_type: SemanticType,
}

impl FieldRef {
    /// True when the path crosses a collection, i.e. the leaf is existentially quantified
    pub fn is_quantified(&self) -> bool {
        self.hops
            .iter()
            .any(|hop| hop.cardinality == Cardinality::Many)
    }
}

/// Backend reference to an object or collection field itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRef {
    pub path: String,
    pub hops: Vec<Hop>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    Leaf(FieldRef),
    Relation(RelationRef),
}

/// Walk a dotted member path against the field graph of `root`.
///
/// Scalars end the walk, objects descend, collections descend with "any
/// element" semantics. Only one collection may appear on a path.
pub fn resolve(member: &str, root: &'static EntityDescriptor) -> Result<ResolvedPath, SearchError> {
    let segments = split_path(member)?;

    let mut entity = root;
    let mut hops: Vec<Hop> = Vec::new();
    let last = segments.len() - 1;

    for (idx, segment) in segments.iter().enumerate() {
        let field = entity
            .field(segment)
            .ok_or_else(|| SearchError::FieldNotFound {
                member: member.to_string(),
                segment: segment.to_string(),
                entity: entity.name,
            })?;

        match field.kind {
            FieldKind::Scalar {
                column,
                semantic_type,
            } => {
                if idx != last {
                    return Err(SearchError::InvalidPath {
                        member: member.to_string(),
                        reason: format!("'{}' is a scalar field and has no members", segment),
                    });
                }
                return Ok(ResolvedPath::Leaf(FieldRef {
                    path: member.to_string(),
                    hops,
                    column,
                    semantic_type,
                }));
            }
            FieldKind::Object { entity: nested, join } => {
                hops.push(Hop {
                    field: field.name,
                    table: nested.table,
                    join,
                    cardinality: Cardinality::One,
                });
                entity = nested;
            }
            FieldKind::Collection { entity: nested, join } => {
                if hops.iter().any(|hop| hop.cardinality == Cardinality::Many) {
                    return Err(SearchError::NestedCollection {
                        member: member.to_string(),
                        segment: segment.to_string(),
                    });
                }
                hops.push(Hop {
                    field: field.name,
                    table: nested.table,
                    join,
                    cardinality: Cardinality::Many,
                });
                entity = nested;
            }
        }
    }

    Ok(ResolvedPath::Relation(RelationRef {
        path: member.to_string(),
        hops,
    }))
}

fn split_path(member: &str) -> Result<Vec<&str>, SearchError> {
    if member.trim().is_empty() {
        return Err(SearchError::InvalidPath {
            member: member.to_string(),
            reason: "path cannot be empty".to_string(),
        });
    }

    let segments: Vec<&str> = member.split('.').collect();
    if segments.len() > MAX_PATH_SEGMENTS {
        return Err(SearchError::InvalidPath {
            member: member.to_string(),
            reason: format!(
                "path has {} segments (max {})",
                segments.len(),
                MAX_PATH_SEGMENTS
            ),
        });
    }
    if let Some(bad) = segments.iter().find(|s| !segment_regex().is_match(s)) {
        return Err(SearchError::InvalidPath {
            member: member.to_string(),
            reason: format!("'{}' is not a valid field name", bad),
        });
    }

    Ok(segments)
}
