//! # Pure SQL construction
//!
//! Every statement the engine issues is assembled here: a table name, column/value assignments and
//! typed filters go in, parameterized SQL text plus an ordered parameter list come out. Nothing in
//! this module performs I/O, so the placeholder bookkeeping is testable without a database.
//!
//! Placeholders are `$n` and strictly sequential across the whole statement: in a SELECT the filter
//! placeholders are numbered before LIMIT/OFFSET, and in an UPDATE the SET placeholders are numbered
//! before the WHERE placeholders, with the parameter list concatenated in the same order.
//!
//! Identifiers (table and column names, raw predicates) are trusted static strings supplied by the
//! repository code, never user input. Values always travel as bound parameters.

#[cfg(feature = "sqlite")]
mod exec;

use chrono::{DateTime, Utc};
use rwd_common::{Millime, Points};
use thiserror::Error;

use crate::db_types::{BillingCycle, OrderStatusType, SubscriptionStatus, TierLevel};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryBuildError {
    #[error("IN filter on column '{0}' has no values")]
    EmptyInList(&'static str),
    #[error("Statement on table '{0}' has nothing to insert or update")]
    NoAssignments(&'static str),
}

//--------------------------------------      SqlValue        --------------------------------------------------------
/// A value destined for a bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<Millime> for SqlValue {
    fn from(v: Millime) -> Self {
        SqlValue::Int(v.value())
    }
}

impl From<Points> for SqlValue {
    fn from(v: Points) -> Self {
        SqlValue::Int(v.value())
    }
}

impl From<TierLevel> for SqlValue {
    fn from(v: TierLevel) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<OrderStatusType> for SqlValue {
    fn from(v: OrderStatusType) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<BillingCycle> for SqlValue {
    fn from(v: BillingCycle) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<SubscriptionStatus> for SqlValue {
    fn from(v: SubscriptionStatus) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl<T> From<Option<T>> for SqlValue
where T: Into<SqlValue>
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

//--------------------------------------       Filter         --------------------------------------------------------
/// A typed filter predicate. The tagged variants replace the runtime shape-sniffing a dynamically
/// typed caller would do: a scalar is an equality test, a list is a membership test, and a missing
/// value is an explicit `IS NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(SqlValue),
    /// Inclusive upper bound.
    Lte(SqlValue),
    In(Vec<SqlValue>),
    IsNull,
}

#[derive(Debug, Clone)]
enum Predicate {
    On(&'static str, Filter),
    /// A trusted, pre-formed predicate with no bound values (e.g. a time-window comparison).
    Raw(&'static str),
}

#[derive(Debug, Clone)]
enum Assign {
    Bind(&'static str, SqlValue),
    /// An expression containing `{}` where the placeholder must land, e.g. `points = points + {}`.
    Expr(&'static str, SqlValue),
    /// A trusted, pre-formed assignment with no bound value, e.g. `updated_at = CURRENT_TIMESTAMP`.
    Raw(&'static str),
}

//--------------------------------------     BuiltQuery       --------------------------------------------------------
/// The result of building: statement text with `$n` placeholders, and the parameters in placeholder
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub text: String,
    pub params: Vec<SqlValue>,
}

fn push_filters(
    sql: &mut String,
    params: &mut Vec<SqlValue>,
    predicates: &[Predicate],
    next: &mut usize,
) -> Result<(), QueryBuildError> {
    if predicates.is_empty() {
        return Ok(());
    }
    sql.push_str(" WHERE ");
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        match predicate {
            Predicate::On(column, Filter::Eq(value)) => {
                sql.push_str(&format!("{column} = ${next}"));
                params.push(value.clone());
                *next += 1;
            },
            Predicate::On(column, Filter::Lte(value)) => {
                sql.push_str(&format!("{column} <= ${next}"));
                params.push(value.clone());
                *next += 1;
            },
            Predicate::On(column, Filter::In(values)) => {
                if values.is_empty() {
                    return Err(QueryBuildError::EmptyInList(column));
                }
                let placeholders = values
                    .iter()
                    .enumerate()
                    .map(|(k, _)| format!("${}", *next + k))
                    .collect::<Vec<_>>()
                    .join(", ");
                sql.push_str(&format!("{column} IN ({placeholders})"));
                params.extend(values.iter().cloned());
                *next += values.len();
            },
            Predicate::On(column, Filter::IsNull) => {
                sql.push_str(&format!("{column} IS NULL"));
            },
            Predicate::Raw(expr) => sql.push_str(expr),
        }
    }
    Ok(())
}

//--------------------------------------     SelectQuery      --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: &'static str,
    columns: Vec<&'static str>,
    predicates: Vec<Predicate>,
    order_by: Option<&'static str>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectQuery {
    pub fn new(table: &'static str) -> Self {
        Self { table, columns: Vec::new(), predicates: Vec::new(), order_by: None, limit: None, offset: None }
    }

    /// Restricts the projection. The default is `*`.
    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn filter(mut self, column: &'static str, filter: Filter) -> Self {
        self.predicates.push(Predicate::On(column, filter));
        self
    }

    pub fn filter_eq<V: Into<SqlValue>>(self, column: &'static str, value: V) -> Self {
        self.filter(column, Filter::Eq(value.into()))
    }

    pub fn filter_raw(mut self, predicate: &'static str) -> Self {
        self.predicates.push(Predicate::Raw(predicate));
        self
    }

    pub fn order_by(mut self, expr: &'static str) -> Self {
        self.order_by = Some(expr);
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn build(self) -> Result<BuiltQuery, QueryBuildError> {
        let projection = if self.columns.is_empty() { "*".to_string() } else { self.columns.join(", ") };
        let mut text = format!("SELECT {projection} FROM {}", self.table);
        let mut params = Vec::new();
        let mut next = 1usize;
        push_filters(&mut text, &mut params, &self.predicates, &mut next)?;
        if let Some(expr) = self.order_by {
            text.push_str(&format!(" ORDER BY {expr}"));
        }
        if let Some(limit) = self.limit {
            text.push_str(&format!(" LIMIT ${next}"));
            params.push(SqlValue::Int(limit));
            next += 1;
        }
        if let Some(offset) = self.offset {
            text.push_str(&format!(" OFFSET ${next}"));
            params.push(SqlValue::Int(offset));
        }
        Ok(BuiltQuery { text, params })
    }
}

//--------------------------------------     InsertQuery      --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct InsertQuery {
    table: &'static str,
    values: Vec<(&'static str, SqlValue)>,
    returning: bool,
}

impl InsertQuery {
    pub fn new(table: &'static str) -> Self {
        Self { table, values: Vec::new(), returning: false }
    }

    pub fn value<V: Into<SqlValue>>(mut self, column: &'static str, value: V) -> Self {
        self.values.push((column, value.into()));
        self
    }

    pub fn returning_all(mut self) -> Self {
        self.returning = true;
        self
    }

    pub fn build(self) -> Result<BuiltQuery, QueryBuildError> {
        if self.values.is_empty() {
            return Err(QueryBuildError::NoAssignments(self.table));
        }
        let columns = self.values.iter().map(|(c, _)| *c).collect::<Vec<_>>().join(", ");
        let placeholders = (1..=self.values.len()).map(|n| format!("${n}")).collect::<Vec<_>>().join(", ");
        let mut text = format!("INSERT INTO {} ({columns}) VALUES ({placeholders})", self.table);
        if self.returning {
            text.push_str(" RETURNING *");
        }
        let params = self.values.into_iter().map(|(_, v)| v).collect();
        Ok(BuiltQuery { text, params })
    }
}

//--------------------------------------     UpdateQuery      --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    table: &'static str,
    assignments: Vec<Assign>,
    predicates: Vec<Predicate>,
    returning: bool,
}

impl UpdateQuery {
    pub fn new(table: &'static str) -> Self {
        Self { table, assignments: Vec::new(), predicates: Vec::new(), returning: false }
    }

    pub fn set<V: Into<SqlValue>>(mut self, column: &'static str, value: V) -> Self {
        self.assignments.push(Assign::Bind(column, value.into()));
        self
    }

    /// An assignment whose right-hand side is an expression over the existing value. The `{}` marker
    /// is replaced with the placeholder, e.g. `set_expr("points = points + {}", delta)`.
    pub fn set_expr<V: Into<SqlValue>>(mut self, expr: &'static str, value: V) -> Self {
        self.assignments.push(Assign::Expr(expr, value.into()));
        self
    }

    pub fn set_raw(mut self, expr: &'static str) -> Self {
        self.assignments.push(Assign::Raw(expr));
        self
    }

    /// Stamps `updated_at` with the database clock.
    pub fn touch(self) -> Self {
        self.set_raw("updated_at = CURRENT_TIMESTAMP")
    }

    pub fn filter(mut self, column: &'static str, filter: Filter) -> Self {
        self.predicates.push(Predicate::On(column, filter));
        self
    }

    pub fn filter_eq<V: Into<SqlValue>>(self, column: &'static str, value: V) -> Self {
        self.filter(column, Filter::Eq(value.into()))
    }

    pub fn filter_raw(mut self, predicate: &'static str) -> Self {
        self.predicates.push(Predicate::Raw(predicate));
        self
    }

    pub fn returning_all(mut self) -> Self {
        self.returning = true;
        self
    }

    pub fn build(self) -> Result<BuiltQuery, QueryBuildError> {
        if self.assignments.is_empty() {
            return Err(QueryBuildError::NoAssignments(self.table));
        }
        let mut text = format!("UPDATE {} SET ", self.table);
        let mut params = Vec::new();
        let mut next = 1usize;
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                text.push_str(", ");
            }
            match assignment {
                Assign::Bind(column, value) => {
                    text.push_str(&format!("{column} = ${next}"));
                    params.push(value.clone());
                    next += 1;
                },
                Assign::Expr(expr, value) => {
                    text.push_str(&expr.replace("{}", &format!("${next}")));
                    params.push(value.clone());
                    next += 1;
                },
                Assign::Raw(expr) => text.push_str(expr),
            }
        }
        push_filters(&mut text, &mut params, &self.predicates, &mut next)?;
        if self.returning {
            text.push_str(" RETURNING *");
        }
        Ok(BuiltQuery { text, params })
    }
}

//--------------------------------------     DeleteQuery      --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    table: &'static str,
    predicates: Vec<Predicate>,
    returning: bool,
}

impl DeleteQuery {
    pub fn new(table: &'static str) -> Self {
        Self { table, predicates: Vec::new(), returning: false }
    }

    pub fn filter(mut self, column: &'static str, filter: Filter) -> Self {
        self.predicates.push(Predicate::On(column, filter));
        self
    }

    pub fn filter_eq<V: Into<SqlValue>>(self, column: &'static str, value: V) -> Self {
        self.filter(column, Filter::Eq(value.into()))
    }

    pub fn returning_all(mut self) -> Self {
        self.returning = true;
        self
    }

    pub fn build(self) -> Result<BuiltQuery, QueryBuildError> {
        let mut text = format!("DELETE FROM {}", self.table);
        let mut params = Vec::new();
        let mut next = 1usize;
        push_filters(&mut text, &mut params, &self.predicates, &mut next)?;
        if self.returning {
            text.push_str(" RETURNING *");
        }
        Ok(BuiltQuery { text, params })
    }
}
