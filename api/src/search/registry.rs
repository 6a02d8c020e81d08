use super::error::SearchError;
use super::schema::{EntityDescriptor, FieldKind, SemanticType};
use super::strategy::Strategy;
use std::collections::{HashMap, HashSet};

/// Closed mapping from leaf type to the strategy that compiles filters on it.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<SemanticType, Box<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    pub fn get(&self, leaf_type: SemanticType, member: &str) -> Result<&dyn Strategy, SearchError> {
        self.strategies
            .get(&leaf_type)
            .map(|strategy| strategy.as_ref())
            .ok_or_else(|| SearchError::UnregisteredType {
                member: member.to_string(),
                leaf_type,
            })
    }

    pub fn contains(&self, leaf_type: SemanticType) -> bool {
        self.strategies.contains_key(&leaf_type)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Check every leaf reachable from `root` has a strategy.
    ///
    /// Meant to run at startup so a missing registration fails the deploy
    /// rather than the first request that touches the field.
    pub fn validate_entity(&self, root: &'static EntityDescriptor) -> Result<(), SearchError> {
        let mut visited: HashSet<*const EntityDescriptor> = HashSet::new();
        let mut pending: Vec<(&'static EntityDescriptor, String)> = vec![(root, String::new())];

        while let Some((entity, prefix)) = pending.pop() {
            if !visited.insert(entity as *const EntityDescriptor) {
                continue;
            }
            for field in entity.fields() {
                let path = if prefix.is_empty() {
                    field.name.to_string()
                } else {
                    format!("{}.{}", prefix, field.name)
                };
                match field.kind {
                    FieldKind::Scalar { semantic_type, .. } => {
                        self.get(semantic_type, &path)?;
                    }
                    FieldKind::Object { entity: nested, .. }
                    | FieldKind::Collection { entity: nested, .. } => {
                        pending.push((nested, path));
                    }
                }
            }
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct StrategyRegistryBuilder {
    strategies: HashMap<SemanticType, Box<dyn Strategy>>,
}

impl StrategyRegistryBuilder {
    /// Register a strategy for its leaf type; a later registration for the same type wins
    pub fn register(mut self, strategy: impl Strategy + 'static) -> Self {
        let leaf_type = strategy.leaf_type();
        if self
            .strategies
            .insert(leaf_type, Box::new(strategy))
            .is_some()
        {
            tracing::warn!("Search strategy for {} registered twice", leaf_type);
        }
        self
    }

    pub fn build(self) -> StrategyRegistry {
        tracing::debug!("Search strategy registry built with {} types", self.strategies.len());
        StrategyRegistry {
            strategies: self.strategies,
        }
    }
}
