use super::builder::SqlValue;
use super::error::SearchError;
use super::predicate::{CompareOp, Condition, Predicate};
use super::resolver::FieldRef;
use super::schema::SemanticType;
use super::types::{FilteringSearchOperator, SearchFilterOperator};
use chrono::DateTime;
use uuid::Uuid;

/// Per-leaf-type translation of one filter into a predicate.
///
/// Implementations declare which operators they accept and how a raw wire
/// value becomes a typed bind value; the operator semantics themselves are
/// shared by [`Strategy::build`].
pub trait Strategy: Send + Sync {
    fn leaf_type(&self) -> SemanticType;

    fn supports(&self, operator: SearchFilterOperator) -> bool;

    fn convert(&self, member: &str, raw: &str) -> Result<SqlValue, SearchError>;

    fn build(
        &self,
        filter: &FilteringSearchOperator,
        field: FieldRef,
    ) -> Result<Predicate, SearchError> {
        use SearchFilterOperator as Op;

        if !self.supports(filter.operator) {
            return Err(SearchError::UnsupportedOperator {
                member: filter.member.clone(),
                operator: filter.operator,
                leaf_type: self.leaf_type(),
            });
        }
        check_value_count(filter)?;

        let member = filter.member.as_str();
        let first = || self.convert(member, &filter.values[0]);
        let condition = match filter.operator {
            Op::Equals => Condition::Compare(CompareOp::Eq, first()?),
            Op::NotEquals => Condition::Compare(CompareOp::Ne, first()?),
            Op::GreaterThan => Condition::Compare(CompareOp::Gt, first()?),
            Op::GreaterThanEquals => Condition::Compare(CompareOp::Gte, first()?),
            Op::LessThan => Condition::Compare(CompareOp::Lt, first()?),
            Op::LessThanEquals => Condition::Compare(CompareOp::Lte, first()?),
            Op::In => Condition::In(
                filter
                    .values
                    .iter()
                    .map(|raw| self.convert(member, raw))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Op::Contains => Condition::Contains(filter.values[0].clone()),
            Op::Set => Condition::IsSet,
            Op::NotSet => Condition::IsNotSet,
            Op::Between => Condition::Between(
                self.convert(member, &filter.values[0])?,
                self.convert(member, &filter.values[1])?,
            ),
        };

        Ok(Predicate::leaf(field, condition))
    }
}

/// Validate the number of values an operator needs.
///
/// `set`/`notSet` ignore values, `between` takes exactly two, everything else
/// needs at least one and reads the first.
pub fn check_value_count(filter: &FilteringSearchOperator) -> Result<(), SearchError> {
    let actual = filter.values.len();
    let (ok, expected) = match filter.operator {
        SearchFilterOperator::Set | SearchFilterOperator::NotSet => (true, "no values"),
        SearchFilterOperator::Between => (actual == 2, "exactly 2 values"),
        SearchFilterOperator::In => (actual >= 1, "at least 1 value"),
        _ => (actual >= 1, "a value"),
    };

    if ok {
        Ok(())
    } else {
        Err(SearchError::InvalidValueCount {
            member: filter.member.clone(),
            operator: filter.operator,
            expected,
            actual,
        })
    }
}

fn invalid(member: &str, raw: &str, expected: impl Into<String>) -> SearchError {
    SearchError::InvalidValue {
        member: member.to_string(),
        value: raw.to_string(),
        expected: expected.into(),
    }
}

/// Free text. Ordering is lexicographic, `contains` uses LIKE (ASCII case-insensitive in SQLite).
pub struct TextStrategy;

impl Strategy for TextStrategy {
    fn leaf_type(&self) -> SemanticType {
        SemanticType::Text
    }

    fn supports(&self, _operator: SearchFilterOperator) -> bool {
        true
    }

    fn convert(&self, _member: &str, raw: &str) -> Result<SqlValue, SearchError> {
        Ok(SqlValue::String(raw.to_string()))
    }
}

pub struct IntegerStrategy;

impl Strategy for IntegerStrategy {
    fn leaf_type(&self) -> SemanticType {
        SemanticType::Integer
    }

    fn supports(&self, operator: SearchFilterOperator) -> bool {
        operator != SearchFilterOperator::Contains
    }

    fn convert(&self, member: &str, raw: &str) -> Result<SqlValue, SearchError> {
        raw.trim()
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|_| invalid(member, raw, "integer"))
    }
}

pub struct RealStrategy;

impl Strategy for RealStrategy {
    fn leaf_type(&self) -> SemanticType {
        SemanticType::Real
    }

    fn supports(&self, operator: SearchFilterOperator) -> bool {
        operator != SearchFilterOperator::Contains
    }

    fn convert(&self, member: &str, raw: &str) -> Result<SqlValue, SearchError> {
        match raw.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(SqlValue::Float(f)),
            _ => Err(invalid(member, raw, "number")),
        }
    }
}

pub struct BooleanStrategy;

impl Strategy for BooleanStrategy {
    fn leaf_type(&self) -> SemanticType {
        SemanticType::Boolean
    }

    fn supports(&self, operator: SearchFilterOperator) -> bool {
        use SearchFilterOperator as Op;
        matches!(
            operator,
            Op::Equals | Op::NotEquals | Op::In | Op::Set | Op::NotSet
        )
    }

    fn convert(&self, member: &str, raw: &str) -> Result<SqlValue, SearchError> {
        if raw.trim().eq_ignore_ascii_case("true") {
            Ok(SqlValue::Bool(true))
        } else if raw.trim().eq_ignore_ascii_case("false") {
            Ok(SqlValue::Bool(false))
        } else {
            Err(invalid(member, raw, "boolean (true or false)"))
        }
    }
}

/// Accepts RFC 3339 timestamps or raw nanoseconds since the epoch
pub struct TimestampStrategy;

impl Strategy for TimestampStrategy {
    fn leaf_type(&self) -> SemanticType {
        SemanticType::Timestamp
    }

    fn supports(&self, operator: SearchFilterOperator) -> bool {
        operator != SearchFilterOperator::Contains
    }

    fn convert(&self, member: &str, raw: &str) -> Result<SqlValue, SearchError> {
        let raw_trimmed = raw.trim();
        if let Ok(ns) = raw_trimmed.parse::<i64>() {
            return Ok(SqlValue::Integer(ns));
        }
        DateTime::parse_from_rfc3339(raw_trimmed)
            .ok()
            .and_then(|dt| dt.timestamp_nanos_opt())
            .map(SqlValue::Integer)
            .ok_or_else(|| invalid(member, raw, "RFC 3339 timestamp"))
    }
}

/// Identifiers are stored in lowercase hyphenated form
pub struct UuidStrategy;

impl Strategy for UuidStrategy {
    fn leaf_type(&self) -> SemanticType {
        SemanticType::Uuid
    }

    fn supports(&self, operator: SearchFilterOperator) -> bool {
        use SearchFilterOperator as Op;
        matches!(
            operator,
            Op::Equals | Op::NotEquals | Op::In | Op::Set | Op::NotSet
        )
    }

    fn convert(&self, member: &str, raw: &str) -> Result<SqlValue, SearchError> {
        Uuid::parse_str(raw.trim())
            .map(|id| SqlValue::String(id.hyphenated().to_string()))
            .map_err(|_| invalid(member, raw, "UUID"))
    }
}

/// Closed set of text values; anything outside `variants` is rejected
pub struct EnumStrategy {
    name: &'static str,
    variants: &'static [&'static str],
}

impl EnumStrategy {
    pub fn new(name: &'static str, variants: &'static [&'static str]) -> Self {
        Self { name, variants }
    }
}

impl Strategy for EnumStrategy {
    fn leaf_type(&self) -> SemanticType {
        SemanticType::Enum(self.name)
    }

    fn supports(&self, operator: SearchFilterOperator) -> bool {
        use SearchFilterOperator as Op;
        matches!(
            operator,
            Op::Equals | Op::NotEquals | Op::In | Op::Set | Op::NotSet
        )
    }

    fn convert(&self, member: &str, raw: &str) -> Result<SqlValue, SearchError> {
        self.variants
            .iter()
            .find(|variant| **variant == raw)
            .map(|variant| SqlValue::String(variant.to_string()))
            .ok_or_else(|| {
                invalid(
                    member,
                    raw,
                    format!("{} (one of: {})", self.name, self.variants.join(", ")),
                )
            })
    }
}
