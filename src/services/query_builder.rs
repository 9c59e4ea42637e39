//! Composes count, page and export statements from a filter specification.
//!
//! All three statements come from one [`ListingQuery`], so they share the same
//! WHERE clause and filter parameters by construction.

use crate::models::filter::{DateRange, EntitySpec, FilterOperator, FilterValues, SpecError};

/// A bind parameter with its declared SQL type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

/// Structured form of one WHERE predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals { column: &'static str, value: String },
    /// `needle` is the raw search text; the bound pattern is escaped and wrapped.
    Like { column: &'static str, needle: String },
    Since { column: &'static str, range: DateRange },
}

/// Row window of a page statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    pub offset: i64,
    pub limit: i64,
}

/// Fully rendered SQL plus everything needed to execute or inspect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
    pub conditions: Vec<Condition>,
    pub order_by: &'static [&'static str],
    pub window: Option<RowWindow>,
}

impl Statement {
    /// Reject statements whose placeholders and parameters disagree.
    pub fn verify(&self) -> Result<(), SpecError> {
        let placeholders = placeholder_count(&self.sql);
        if placeholders != self.params.len() {
            return Err(SpecError::PlaceholderMismatch {
                placeholders,
                params: self.params.len(),
            });
        }
        Ok(())
    }
}

/// Number of distinct `$n` placeholders, provided they form `1..=n`.
fn placeholder_count(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut seen = std::collections::BTreeSet::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if let Ok(n) = sql[start..end].parse::<usize>() {
                seen.insert(n);
            }
            i = end.max(i + 1);
        } else {
            i += 1;
        }
    }
    let contiguous = seen.iter().copied().eq(1..=seen.len());
    if contiguous {
        seen.len()
    } else {
        usize::MAX
    }
}

/// Escape LIKE metacharacters so user text matches literally.
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// WHERE fragments and their parameters, produced as a single unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundQuery {
    pub fragments: Vec<String>,
    pub params: Vec<SqlParam>,
    pub conditions: Vec<Condition>,
    pub order_by: String,
}

impl BoundQuery {
    pub fn where_clause(&self) -> String {
        if self.fragments.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.fragments.join(" AND "))
        }
    }
}

/// Filter-bound query for one entity and one request.
#[derive(Debug, Clone)]
pub struct ListingQuery<'s> {
    spec: &'s EntitySpec,
    bound: BoundQuery,
}

impl<'s> ListingQuery<'s> {
    /// Translate filter values into predicates. Filters pointing at columns
    /// the entity doesn't select are configuration bugs and fail fast.
    pub fn new(spec: &'s EntitySpec, values: &FilterValues) -> Result<Self, SpecError> {
        let mut fragments = Vec::new();
        let mut params = Vec::new();
        let mut conditions = Vec::new();

        for (param, value) in values.iter() {
            let Some(field) = spec.filter(param) else {
                continue;
            };
            if !spec.has_column(field.column) {
                return Err(SpecError::UnknownFilterColumn {
                    entity: spec.name,
                    param: field.param,
                    column: field.column,
                });
            }

            match field.operator {
                FilterOperator::Equals => {
                    params.push(SqlParam::Text(value.to_string()));
                    fragments.push(format!("{} = ${}", field.column, params.len()));
                    conditions.push(Condition::Equals {
                        column: field.column,
                        value: value.to_string(),
                    });
                }
                FilterOperator::Like => {
                    params.push(SqlParam::Text(format!("%{}%", escape_like(value))));
                    fragments.push(format!("{} ILIKE ${}", field.column, params.len()));
                    conditions.push(Condition::Like {
                        column: field.column,
                        needle: value.to_string(),
                    });
                }
                FilterOperator::DateRange => {
                    // Unknown buckets never reach here; extraction drops them.
                    if let Some(range) = DateRange::parse(value) {
                        fragments.push(range.predicate(field.column));
                        conditions.push(Condition::Since {
                            column: field.column,
                            range,
                        });
                    }
                }
            }
        }

        let order_by = spec
            .order_by
            .iter()
            .map(|c| format!("{c} ASC"))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            spec,
            bound: BoundQuery {
                fragments,
                params,
                conditions,
                order_by,
            },
        })
    }

    /// `SELECT COUNT(*)` over the filtered rows.
    pub fn count(&self) -> Result<Statement, SpecError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            self.spec.table,
            self.bound.where_clause()
        );
        self.finish(sql, self.bound.params.clone(), None)
    }

    /// One page of rows. Offset and limit are appended as trailing integer
    /// parameters after the text filter parameters.
    pub fn page(&self, offset: i64, limit: i64) -> Result<Statement, SpecError> {
        let mut params = self.bound.params.clone();
        params.push(SqlParam::Int(offset));
        let offset_index = params.len();
        params.push(SqlParam::Int(limit));
        let limit_index = params.len();

        let sql = format!(
            "{} OFFSET ${offset_index} ROWS FETCH NEXT ${limit_index} ROWS ONLY",
            self.select_sql()
        );
        self.finish(sql, params, Some(RowWindow { offset, limit }))
    }

    /// All filtered rows in listing order, without a row window.
    pub fn export(&self) -> Result<Statement, SpecError> {
        self.finish(self.select_sql(), self.bound.params.clone(), None)
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT {} FROM {}{} ORDER BY {}",
            self.spec.columns.join(", "),
            self.spec.table,
            self.bound.where_clause(),
            self.bound.order_by
        )
    }

    fn finish(
        &self,
        sql: String,
        params: Vec<SqlParam>,
        window: Option<RowWindow>,
    ) -> Result<Statement, SpecError> {
        let statement = Statement {
            sql,
            params,
            conditions: self.bound.conditions.clone(),
            order_by: self.spec.order_by,
            window,
        };
        statement.verify()?;
        Ok(statement)
    }
}
