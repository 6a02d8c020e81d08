use super::error::SearchError;
use super::predicate::Predicate;
use super::registry::StrategyRegistry;
use super::resolver::{resolve, ResolvedPath};
use super::schema::{Entity, EntityDescriptor};
use super::types::{Combinator, FilteringSearchOperator, Search, SearchFilterOperator, SearchOperator};
use std::sync::Arc;

/// Compiles search expression trees into backend predicates.
///
/// Pure and synchronous; the registry is shared read-only, so one compiler
/// can serve any number of concurrent requests.
#[derive(Clone)]
pub struct PredicateCompiler {
    registry: Arc<StrategyRegistry>,
}

impl PredicateCompiler {
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn compile<T: Entity>(&self, search: &Search<T>) -> Result<Predicate, SearchError> {
        self.compile_filters(&search.filters, T::descriptor(), Combinator::And)
    }

    /// Compile one tree level and fold the results with `combinator`.
    ///
    /// Logical children are compiled with their own connective, so
    /// `AND(a, OR(b, c), d)` becomes `a AND (b OR c) AND d`.
    pub fn compile_filters<T>(
        &self,
        filters: &[SearchOperator<T>],
        root: &'static EntityDescriptor,
        combinator: Combinator,
    ) -> Result<Predicate, SearchError> {
        let mut compiled = Vec::with_capacity(filters.len());
        for filter in filters {
            let predicate = match filter {
                SearchOperator::Filtering(leaf) => self.compile_leaf(leaf, root)?,
                SearchOperator::Or(group) => self.compile_filters(&group.or, root, Combinator::Or)?,
                SearchOperator::And(group) => {
                    self.compile_filters(&group.and, root, Combinator::And)?
                }
            };
            compiled.push(predicate);
        }

        Ok(Predicate::fold(combinator, compiled))
    }

    fn compile_leaf(
        &self,
        filter: &FilteringSearchOperator,
        root: &'static EntityDescriptor,
    ) -> Result<Predicate, SearchError> {
        let predicate = match resolve(&filter.member, root)? {
            ResolvedPath::Leaf(field) => {
                let strategy = self.registry.get(field.semantic_type, &filter.member)?;
                strategy.build(filter, field)?
            }
            ResolvedPath::Relation(relation) => match filter.operator {
                SearchFilterOperator::Set => Predicate::Related {
                    relation,
                    present: true,
                },
                SearchFilterOperator::NotSet => Predicate::Related {
                    relation,
                    present: false,
                },
                operator => {
                    return Err(SearchError::InvalidPath {
                        member: filter.member.clone(),
                        reason: format!(
                            "'{}' is a relation; only 'set' and 'notSet' apply to it, got '{}'",
                            filter.member, operator
                        ),
                    })
                }
            },
        };

        tracing::debug!(
            member = %filter.member,
            operator = %filter.operator,
            values = filter.values.len(),
            "compiled search filter"
        );
        Ok(predicate)
    }
}
