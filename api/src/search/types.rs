//! Wire model for the search filter expression tree
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum SearchFilterOperator {
    #[serde(rename = "eq")]
    #[strum(serialize = "eq")]
    Equals,
    #[serde(rename = "notEquals")]
    #[strum(serialize = "notEquals")]
    NotEquals,
    #[serde(rename = "in")]
    #[strum(serialize = "in")]
    In,
    #[serde(rename = "gt")]
    #[strum(serialize = "gt")]
    GreaterThan,
    #[serde(rename = "gte")]
    #[strum(serialize = "gte")]
    GreaterThanEquals,
    #[serde(rename = "lt")]
    #[strum(serialize = "lt")]
    LessThan,
    #[serde(rename = "lte")]
    #[strum(serialize = "lte")]
    LessThanEquals,
    #[serde(rename = "contains")]
    #[strum(serialize = "contains")]
    Contains,
    #[serde(rename = "set")]
    #[strum(serialize = "set")]
    Set,
    #[serde(rename = "notSet")]
    #[strum(serialize = "notSet")]
    NotSet,
    #[serde(rename = "between")]
    #[strum(serialize = "between")]
    Between,
}

impl SearchFilterOperator {
    /// Presence checks carry no operand
    pub fn ignores_values(self) -> bool {
        matches!(self, Self::Set | Self::NotSet)
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterThanEquals | Self::LessThan | Self::LessThanEquals
        )
    }
}

/// One node of a search expression for entity `T`.
///
/// The variant is deduced from the keys present in the JSON object
/// (`member`, `or` or `and`); there is no explicit discriminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, bound = "")]
pub enum SearchOperator<T> {
    Filtering(FilteringSearchOperator),
    Or(OrLogicalSearchOperator<T>),
    And(AndLogicalSearchOperator<T>),
}

impl<'de, T> Deserialize<'de> for SearchOperator<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let (is_filter, is_or, is_and) = match value.as_object() {
            Some(object) => (
                object.contains_key("member"),
                object.contains_key("or"),
                object.contains_key("and"),
            ),
            None => return Err(de::Error::custom("search operator must be a JSON object")),
        };

        let variant = if is_filter {
            serde_json::from_value(value).map(SearchOperator::Filtering)
        } else if is_or {
            serde_json::from_value(value).map(SearchOperator::Or)
        } else if is_and {
            serde_json::from_value(value).map(SearchOperator::And)
        } else {
            return Err(de::Error::custom(
                "search operator must contain one of `member`, `or` or `and`",
            ));
        };

        variant.map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilteringSearchOperator {
    pub member: String,
    pub operator: SearchFilterOperator,
    #[serde(default)]
    pub values: Vec<String>,
}

impl FilteringSearchOperator {
    pub fn new(
        member: impl Into<String>,
        operator: SearchFilterOperator,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            member: member.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, bound = "")]
pub struct OrLogicalSearchOperator<T> {
    pub or: Vec<SearchOperator<T>>,
    #[serde(skip)]
    entity: PhantomData<fn() -> T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, bound = "")]
pub struct AndLogicalSearchOperator<T> {
    pub and: Vec<SearchOperator<T>>,
    #[serde(skip)]
    entity: PhantomData<fn() -> T>,
}

impl<T> SearchOperator<T> {
    pub fn filter(
        member: impl Into<String>,
        operator: SearchFilterOperator,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::Filtering(FilteringSearchOperator::new(member, operator, values))
    }

    pub fn or(children: Vec<SearchOperator<T>>) -> Self {
        Self::Or(OrLogicalSearchOperator {
            or: children,
            entity: PhantomData,
        })
    }

    pub fn and(children: Vec<SearchOperator<T>>) -> Self {
        Self::And(AndLogicalSearchOperator {
            and: children,
            entity: PhantomData,
        })
    }
}

/// Root envelope; an empty `filters` list matches everything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, bound = "")]
pub struct Search<T> {
    #[serde(default)]
    pub filters: Vec<SearchOperator<T>>,
}

impl<T> Search<T> {
    pub fn new(filters: Vec<SearchOperator<T>>) -> Self {
        Self { filters }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<T> Default for Search<T> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
        }
    }
}

/// Connective used to fold sibling predicates at one tree level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Combinator {
    #[strum(serialize = "AND")]
    And,
    #[strum(serialize = "OR")]
    Or,
}
