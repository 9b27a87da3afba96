//! Parameterized SQL query building
//!
//! One builder instance is bound to a single dialect. Values always travel as
//! bound parameters; the only raw text embedded in SQL is identifiers, which
//! reach the builder after registry allow-list validation.

use crate::cursor::Cursor;
use crate::filter::{Condition, ConditionValue, Operator, SortField, escape_like_pattern};
use crate::schema::Collection;
use crate::sql::dialect::Dialect;
use crate::types::Value;

/// Hard ceiling on page size, applied even when the configuration allows more
pub const HARD_LIMIT_CAP: i64 = 1000;

/// Aggregation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// Whether the function aggregates over a specific field
    pub fn requires_field(&self) -> bool {
        !matches!(self, Self::Count)
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Inputs for a list SELECT
#[derive(Debug)]
pub struct SelectParams<'a> {
    /// Projected physical columns; `None` selects `*`
    pub fields: Option<&'a [String]>,
    pub conditions: &'a [Condition],
    pub sort: &'a [SortField],
    pub cursor: Option<&'a Cursor>,
    pub search: Option<&'a str>,
    pub limit: i64,
}

impl Default for SelectParams<'_> {
    fn default() -> Self {
        Self {
            fields: None,
            conditions: &[],
            sort: &[],
            cursor: None,
            search: None,
            limit: 100,
        }
    }
}

/// Dialect-bound SQL generator
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    // ========================================================================
    // SELECT
    // ========================================================================

    /// Build a list SELECT: filters, search, keyset cursor, sort, limit
    pub fn select(&self, collection: &Collection, params: &SelectParams<'_>) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        let mut args: Vec<Value> = Vec::new();

        match params.fields {
            Some(fields) if !fields.is_empty() => {
                let cols: Vec<String> =
                    fields.iter().map(|f| self.dialect.quote(f)).collect();
                sql.push_str(&cols.join(", "));
            }
            _ => sql.push('*'),
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.dialect.quote(&collection.name));

        let mut clauses: Vec<String> = Vec::new();
        if let Some(term) = params.search {
            if let Some(clause) = self.search_clause(collection, term, &mut args) {
                clauses.push(clause);
            }
        }
        for cond in params.conditions {
            clauses.push(self.condition_clause(cond, &mut args));
        }
        if let Some(cursor) = params.cursor {
            clauses.push(self.keyset_clause(cursor, params.sort, &mut args));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(&self.order_by(params.sort));

        // One row beyond the cap is allowed so callers can peek for more data
        sql.push_str(" LIMIT ");
        sql.push_str(&self.push_arg(Value::Int(params.limit.min(HARD_LIMIT_CAP + 1)), &mut args));

        (sql, args)
    }

    // ========================================================================
    // COUNT and aggregates
    // ========================================================================

    /// Build the total count for a filtered list (cursor never applies)
    pub fn count(
        &self,
        collection: &Collection,
        conditions: &[Condition],
        search: Option<&str>,
    ) -> (String, Vec<Value>) {
        let mut sql = format!(
            "SELECT COUNT(*) FROM {}",
            self.dialect.quote(&collection.name)
        );
        let mut args: Vec<Value> = Vec::new();

        let mut clauses: Vec<String> = Vec::new();
        if let Some(term) = search {
            if let Some(clause) = self.search_clause(collection, term, &mut args) {
                clauses.push(clause);
            }
        }
        for cond in conditions {
            clauses.push(self.condition_clause(cond, &mut args));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        (sql, args)
    }

    /// Build an aggregate query; `field` is `None` only for count
    pub fn aggregate(
        &self,
        collection: &Collection,
        func: AggregateFunc,
        field: Option<&str>,
        conditions: &[Condition],
    ) -> (String, Vec<Value>) {
        let target = match field {
            Some(f) => self.dialect.quote(f),
            None => "*".to_string(),
        };

        let mut sql = format!(
            "SELECT {}({target}) FROM {}",
            func.sql(),
            self.dialect.quote(&collection.name)
        );
        let mut args: Vec<Value> = Vec::new();

        let clauses: Vec<String> = conditions
            .iter()
            .map(|c| self.condition_clause(c, &mut args))
            .collect();

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        (sql, args)
    }

    // ========================================================================
    // INSERT / UPDATE / DELETE
    // ========================================================================

    /// Build an INSERT for validated physical columns
    pub fn insert(
        &self,
        table: &str,
        columns: &[String],
        values: Vec<Value>,
    ) -> (String, Vec<Value>) {
        let cols: Vec<String> = columns.iter().map(|c| self.dialect.quote(c)).collect();
        let mut args: Vec<Value> = Vec::new();
        let placeholders: Vec<String> = values
            .into_iter()
            .map(|v| {
                // NULL is rendered as the SQL literal so drivers never have to
                // guess the type of an absent value
                if v.is_null() {
                    "NULL".to_string()
                } else {
                    self.push_arg(v, &mut args)
                }
            })
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.dialect.quote(table),
            cols.join(", "),
            placeholders.join(", ")
        );

        (sql, args)
    }

    /// Build an UPDATE of validated columns for one record, addressed by ulid
    pub fn update(
        &self,
        table: &str,
        assignments: Vec<(String, Value)>,
        id: &str,
    ) -> (String, Vec<Value>) {
        let mut args: Vec<Value> = Vec::new();
        let sets: Vec<String> = assignments
            .into_iter()
            .map(|(col, v)| {
                if v.is_null() {
                    format!("{} = NULL", self.dialect.quote(&col))
                } else {
                    let placeholder = self.push_arg(v, &mut args);
                    format!("{} = {placeholder}", self.dialect.quote(&col))
                }
            })
            .collect();

        let id_placeholder = self.push_arg(Value::Text(id.to_string()), &mut args);
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {id_placeholder}",
            self.dialect.quote(table),
            sets.join(", "),
            self.dialect.quote("ulid")
        );

        (sql, args)
    }

    /// Build a DELETE for one record, addressed by ulid
    pub fn delete(&self, table: &str, id: &str) -> (String, Vec<Value>) {
        let mut args: Vec<Value> = Vec::new();
        let placeholder = self.push_arg(Value::Text(id.to_string()), &mut args);
        let sql = format!(
            "DELETE FROM {} WHERE {} = {placeholder}",
            self.dialect.quote(table),
            self.dialect.quote("ulid")
        );
        (sql, args)
    }

    // ========================================================================
    // Clause rendering
    // ========================================================================

    fn push_arg(&self, value: Value, args: &mut Vec<Value>) -> String {
        args.push(value);
        self.dialect.placeholder(args.len())
    }

    fn condition_clause(&self, cond: &Condition, args: &mut Vec<Value>) -> String {
        let col = self.dialect.quote(&cond.column);

        match (&cond.operator, &cond.value) {
            (Operator::In, ConditionValue::Many(values)) => {
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| self.push_arg(v.clone(), args))
                    .collect();
                format!("{col} IN ({})", placeholders.join(", "))
            }
            (Operator::In, ConditionValue::Single(v)) => {
                // A single value behaves like a one-element list
                let placeholder = self.push_arg(v.clone(), args);
                format!("{col} IN ({placeholder})")
            }
            (Operator::Like, value) => {
                let v = match value {
                    ConditionValue::Single(v) => v.clone(),
                    ConditionValue::Many(_) => Value::Null,
                };
                let placeholder = self.push_arg(v, args);
                format!(
                    "{col} LIKE {placeholder}{}",
                    self.dialect.like_escape_clause()
                )
            }
            (op, ConditionValue::Single(v)) => {
                let placeholder = self.push_arg(v.clone(), args);
                format!("{col} {} {placeholder}", op.sql())
            }
            (op, ConditionValue::Many(_)) => {
                // Parser never produces lists for scalar operators
                format!("{col} {} NULL", op.sql())
            }
        }
    }

    /// OR of LIKE over the collection's string columns, or `None` when the
    /// collection has nothing searchable
    fn search_clause(
        &self,
        collection: &Collection,
        term: &str,
        args: &mut Vec<Value>,
    ) -> Option<String> {
        let pattern = format!("%{}%", escape_like_pattern(term));
        let escape = self.dialect.like_escape_clause();

        let clauses: Vec<String> = collection
            .columns
            .iter()
            .filter(|c| c.column_type.is_text())
            .map(|c| {
                let placeholder = self.push_arg(Value::Text(pattern.clone()), args);
                format!("{} LIKE {placeholder}{escape}", self.dialect.quote(&c.name))
            })
            .collect();

        if clauses.is_empty() {
            None
        } else {
            Some(format!("({})", clauses.join(" OR ")))
        }
    }

    /// Keyset predicate continuing after the cursor position
    ///
    /// With a sort key the comparison is `(sortcol, ulid) > (value, id)`,
    /// rendered as a row-value comparison where the dialect supports it and as
    /// the expanded OR form elsewhere. Without one (or when the boundary value
    /// is NULL) the ulid alone anchors the position.
    fn keyset_clause(&self, cursor: &Cursor, sort: &[SortField], args: &mut Vec<Value>) -> String {
        let descending = sort.first().map(|s| s.descending).unwrap_or(false);
        let cmp = if descending { "<" } else { ">" };
        let ulid = self.dialect.quote("ulid");

        match &cursor.sort_key {
            Some((column, value)) if !value.is_null() => {
                let col = self.dialect.quote(column);
                if self.dialect.supports_row_values() {
                    let p1 = self.push_arg(value.clone(), args);
                    let p2 = self.push_arg(Value::Text(cursor.id.clone()), args);
                    format!("({col}, {ulid}) {cmp} ({p1}, {p2})")
                } else {
                    let p1 = self.push_arg(value.clone(), args);
                    let p2 = self.push_arg(value.clone(), args);
                    let p3 = self.push_arg(Value::Text(cursor.id.clone()), args);
                    format!("({col} {cmp} {p1} OR ({col} = {p2} AND {ulid} {cmp} {p3}))")
                }
            }
            _ => {
                let placeholder = self.push_arg(Value::Text(cursor.id.clone()), args);
                format!("{ulid} {cmp} {placeholder}")
            }
        }
    }

    /// ORDER BY from the sort spec, with the ulid tiebreaker appended when the
    /// spec does not already pin it
    fn order_by(&self, sort: &[SortField]) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut has_ulid = false;

        for field in sort {
            if field.column == "ulid" {
                has_ulid = true;
            }
            parts.push(format!(
                "{} {}",
                self.dialect.quote(&field.column),
                if field.descending { "DESC" } else { "ASC" }
            ));
        }

        if !has_ulid {
            let descending = sort.first().map(|s| s.descending).unwrap_or(false);
            parts.push(format!(
                "{} {}",
                self.dialect.quote("ulid"),
                if descending { "DESC" } else { "ASC" }
            ));
        }

        parts.join(", ")
    }
}
