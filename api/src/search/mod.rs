//! Search predicate compiler: JSON filter expressions in, SQL predicates out.

mod builder;
mod compiler;
mod error;
mod predicate;
mod registry;
mod resolver;
mod schema;
mod strategy;
mod types;
mod wire;

pub use builder::{build_sql, SqlFragment, SqlValue, ROOT_ALIAS};
pub use compiler::PredicateCompiler;
pub use error::SearchError;
pub use predicate::{CompareOp, Condition, LeafPredicate, Predicate};
pub use registry::{StrategyRegistry, StrategyRegistryBuilder};
pub use resolver::{resolve, Cardinality, FieldRef, Hop, RelationRef, ResolvedPath, MAX_PATH_SEGMENTS};
pub use schema::{Entity, EntityDescriptor, FieldDescriptor, FieldKind, Join, SemanticType};
pub use strategy::{
    check_value_count, BooleanStrategy, EnumStrategy, IntegerStrategy, RealStrategy, Strategy,
    TextStrategy, TimestampStrategy, UuidStrategy,
};
pub use types::{
    AndLogicalSearchOperator, Combinator, FilteringSearchOperator, OrLogicalSearchOperator,
    Search, SearchFilterOperator, SearchOperator,
};
pub use wire::{
    decode_search_json, decode_search_param, decode_search_value, encode_search_param,
    MAX_SEARCH_PARAM_LEN,
};

#[cfg(test)]
mod tests;
