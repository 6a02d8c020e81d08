use super::predicate::{Condition, LeafPredicate, Predicate};
use super::resolver::{Cardinality, Hop};
use serde::Serialize;

/// Alias of the root entity's table in the generated SQL
pub const ROOT_ALIAS: &str = "t0";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

/// Parameterised SQL condition; `binds` match the `?` placeholders in order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

/// Render a predicate as a `WHERE` condition over `ROOT_ALIAS`
pub fn build_sql(predicate: &Predicate) -> SqlFragment {
    let mut writer = SqlWriter::default();
    writer.write_predicate(predicate);
    SqlFragment {
        sql: writer.sql,
        binds: writer.binds,
    }
}

#[derive(Default)]
struct SqlWriter {
    sql: String,
    binds: Vec<SqlValue>,
    next_alias: usize,
}

impl SqlWriter {
    fn write_predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::True => self.sql.push_str("1 = 1"),
            Predicate::Leaf(leaf) => self.write_leaf(leaf),
            Predicate::Related { relation, present } => {
                if !*present {
                    self.sql.push_str("NOT ");
                }
                // every hop must exist, the last one included
                let chain = self.join_chain(&relation.hops, JoinMode::Inner);
                self.sql.push_str(&format!(
                    "EXISTS (SELECT 1 FROM {} WHERE {})",
                    chain.from, chain.correlation
                ));
            }
            Predicate::And(items) => self.write_group(items, " AND "),
            Predicate::Or(items) => self.write_group(items, " OR "),
        }
    }

    fn write_group(&mut self, items: &[Predicate], connective: &str) {
        self.sql.push('(');
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.sql.push_str(connective);
            }
            self.write_predicate(item);
        }
        self.sql.push(')');
    }

    fn write_leaf(&mut self, leaf: &LeafPredicate) {
        let field = &leaf.field;
        if field.hops.is_empty() {
            let column = format!("{}.{}", ROOT_ALIAS, field.column);
            self.write_condition(&column, &leaf.condition);
            return;
        }

        let chain = self.join_chain(&field.hops, JoinMode::OptionalObjects);
        let column = format!("{}.{}", chain.leaf_alias, field.column);
        if field.is_quantified() {
            self.sql.push_str(&format!(
                "EXISTS (SELECT 1 FROM {} WHERE {} AND ",
                chain.from, chain.correlation
            ));
            self.write_condition(&column, &leaf.condition);
            self.sql.push(')');
        } else {
            // Many-to-one chain: at most one row, NULL when the object is absent
            let scalar = format!(
                "(SELECT {} FROM {} WHERE {})",
                column, chain.from, chain.correlation
            );
            self.write_condition(&scalar, &leaf.condition);
        }
    }

    fn write_condition(&mut self, expr: &str, condition: &Condition) {
        match condition {
            Condition::Compare(op, value) => {
                self.sql.push_str(&format!("{} {} ?", expr, op.as_sql()));
                self.binds.push(value.clone());
            }
            Condition::In(values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                self.sql
                    .push_str(&format!("{} IN ({})", expr, placeholders));
                self.binds.extend(values.iter().cloned());
            }
            Condition::Contains(needle) => {
                self.sql
                    .push_str(&format!("{} LIKE ? ESCAPE '\\'", expr));
                self.binds
                    .push(SqlValue::String(format!("%{}%", escape_like(needle))));
            }
            Condition::IsSet => self.sql.push_str(&format!("{} IS NOT NULL", expr)),
            Condition::IsNotSet => self.sql.push_str(&format!("{} IS NULL", expr)),
            Condition::Between(low, high) => {
                self.sql.push_str(&format!("{} BETWEEN ? AND ?", expr));
                self.binds.push(low.clone());
                self.binds.push(high.clone());
            }
        }
    }

    fn join_chain(&mut self, hops: &[Hop], mode: JoinMode) -> JoinChain {
        let mut from = String::new();
        let mut correlation = String::new();
        let mut parent = ROOT_ALIAS.to_string();

        for (idx, hop) in hops.iter().enumerate() {
            self.next_alias += 1;
            let alias = format!("t{}", self.next_alias);
            if idx == 0 {
                from.push_str(&format!("{} {}", hop.table, alias));
                correlation = format!("{}.{} = {}.{}", alias, hop.join.remote, parent, hop.join.local);
            } else {
                let join_kind = match (hop.cardinality, mode) {
                    (Cardinality::One, JoinMode::OptionalObjects) => "LEFT JOIN",
                    _ => "JOIN",
                };
                from.push_str(&format!(
                    " {} {} {} ON {}.{} = {}.{}",
                    join_kind, hop.table, alias, alias, hop.join.remote, parent, hop.join.local
                ));
            }
            parent = alias;
        }

        JoinChain {
            from,
            correlation,
            leaf_alias: parent,
        }
    }
}

/// How hops after the first are joined inside a subquery
#[derive(Clone, Copy)]
enum JoinMode {
    /// Absent objects keep the row, so leaf columns read as NULL
    OptionalObjects,
    /// Rows without the full chain are dropped
    Inner,
}

struct JoinChain {
    from: String,
    correlation: String,
    leaf_alias: String,
}

/// Escape LIKE wildcards so the needle matches literally (escape char `\`)
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
