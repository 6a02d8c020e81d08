use super::builder::SqlValue;
use super::resolver::{FieldRef, RelationRef};
use super::types::Combinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            // null-safe, so "not equal" also matches rows where the field is unset
            CompareOp::Ne => "IS NOT",
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// Condition applied to one resolved column
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(CompareOp, SqlValue),
    In(Vec<SqlValue>),
    /// Literal substring; wildcards in the needle are escaped when rendered
    Contains(String),
    IsSet,
    IsNotSet,
    /// Inclusive on both ends
    Between(SqlValue, SqlValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafPredicate {
    pub field: FieldRef,
    pub condition: Condition,
}

/// Backend-evaluable boolean condition produced by the compiler
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    Leaf(LeafPredicate),
    /// Whether at least one related row exists
    Related { relation: RelationRef, present: bool },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn leaf(field: FieldRef, condition: Condition) -> Self {
        Predicate::Leaf(LeafPredicate { field, condition })
    }

    /// Fold `items` left to right with `combinator`.
    ///
    /// An empty list is `True`, a single item is returned unchanged. `True`
    /// is the identity of AND and absorbs OR.
    pub fn fold(combinator: Combinator, items: Vec<Predicate>) -> Self {
        let mut items = match combinator {
            Combinator::And => items.into_iter().filter(|p| !p.is_true()).collect(),
            Combinator::Or if items.iter().any(Predicate::is_true) => return Predicate::True,
            Combinator::Or => items,
        };
        match items.len() {
            0 => Predicate::True,
            1 => items.remove(0),
            _ => match combinator {
                Combinator::And => Predicate::And(items),
                Combinator::Or => Predicate::Or(items),
            },
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Predicate::True)
    }

    /// Number of leaf and relation conditions in the tree
    pub fn condition_count(&self) -> usize {
        match self {
            Predicate::True => 0,
            Predicate::Leaf(_) | Predicate::Related { .. } => 1,
            Predicate::And(items) | Predicate::Or(items) => {
                items.iter().map(Predicate::condition_count).sum()
            }
        }
    }
}
