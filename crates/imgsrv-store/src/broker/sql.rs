//! Criteria to SQL compilation
//!
//! Every statement is parameterised; only column and table names from the
//! entity field enums are spliced into the text. The outer table is aliased
//! `t0` and each nested subquery gets the next `sqN` alias so correlated
//! subqueries never shadow each other.

use imgsrv_core::criteria::{CompareOp, Predicate, SortDirection, Subquery};
use imgsrv_core::errors::{DomainError, Result};
use imgsrv_core::model::{Entity, EntityKey, Field, Value};
use imgsrv_core::{SelectCriteria, UpdateColumns};
use rusqlite::types::Value as SqlValue;

/// Encode a criteria value for SQLite
///
/// Booleans become 0/1 and timestamps unix milliseconds, matching the schema.
pub(crate) fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Bool(v) => SqlValue::Integer(i64::from(*v)),
        Value::Timestamp(v) => SqlValue::Integer(v.timestamp_millis()),
    }
}

/// A statement ready for `prepare` with its positional parameters
#[derive(Debug)]
pub(crate) struct CompiledSql {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Window applied after ordering
#[derive(Debug, Clone, Copy)]
pub(crate) struct Page {
    pub offset: usize,
    pub limit: usize,
}

struct Compiler {
    entity: &'static str,
    params: Vec<SqlValue>,
    next_subquery: usize,
}

impl Compiler {
    fn new(entity: &'static str) -> Self {
        Self {
            entity,
            params: Vec::new(),
            next_subquery: 1,
        }
    }

    fn bind(&mut self, value: &Value) -> &'static str {
        self.params.push(to_sql_value(value));
        "?"
    }

    /// ` WHERE ...` for the predicates, or nothing when there are none
    fn where_clause(&mut self, alias: &str, predicates: &[Predicate]) -> Result<String> {
        if predicates.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" WHERE {}", self.conjunction(alias, predicates)?))
    }

    fn conjunction(&mut self, alias: &str, predicates: &[Predicate]) -> Result<String> {
        let parts = predicates
            .iter()
            .map(|p| self.predicate(alias, p))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(" AND "))
    }

    fn predicate(&mut self, alias: &str, predicate: &Predicate) -> Result<String> {
        match predicate {
            Predicate::Compare { column, op, value } => {
                if value.is_null() {
                    return match op {
                        CompareOp::Equal => Ok(format!("{alias}.{column} IS NULL")),
                        CompareOp::NotEqual => Ok(format!("{alias}.{column} IS NOT NULL")),
                        _ => Err(DomainError::InvalidCriteria {
                            entity: self.entity,
                            reason: format!("{:?} against NULL on column {}", op, column),
                        }
                        .into()),
                    };
                }
                let placeholder = self.bind(value);
                Ok(format!("{alias}.{column} {} {placeholder}", operator(*op)))
            }
            Predicate::In { column, values } => {
                if values.is_empty() {
                    return Ok("0".to_string());
                }
                let placeholders: Vec<&str> = values.iter().map(|v| self.bind(v)).collect();
                Ok(format!("{alias}.{column} IN ({})", placeholders.join(", ")))
            }
            Predicate::IsNull { column, negated } => Ok(if *negated {
                format!("{alias}.{column} IS NOT NULL")
            } else {
                format!("{alias}.{column} IS NULL")
            }),
            Predicate::Exists(subquery) => self.exists(alias, subquery),
        }
    }

    fn exists(&mut self, outer_alias: &str, subquery: &Subquery) -> Result<String> {
        let alias = format!("sq{}", self.next_subquery);
        self.next_subquery += 1;

        let mut sql = format!(
            "EXISTS (SELECT 1 FROM {table} {alias} WHERE {alias}.{inner} = {outer_alias}.{outer}",
            table = subquery.table,
            inner = subquery.inner_column,
            outer = subquery.outer_column,
        );
        if !subquery.predicates.is_empty() {
            let entity = std::mem::replace(&mut self.entity, subquery.entity);
            let nested = self.conjunction(&alias, &subquery.predicates);
            self.entity = entity;
            sql.push_str(" AND ");
            sql.push_str(&nested?);
        }
        sql.push(')');
        Ok(sql)
    }
}

fn operator(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Equal => "=",
        CompareOp::NotEqual => "<>",
        CompareOp::LessThan => "<",
        CompareOp::LessOrEqual => "<=",
        CompareOp::GreaterThan => ">",
        CompareOp::GreaterOrEqual => ">=",
        CompareOp::Like => "LIKE",
    }
}

fn key_column<E: Entity>() -> &'static str {
    E::Field::KEY.column()
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// `SELECT` ordered by the declared sorts, then insertion order
pub(crate) fn select<E: Entity>(criteria: &SelectCriteria<E>, page: Option<Page>) -> Result<CompiledSql> {
    let mut compiler = Compiler::new(E::NAME);
    let mut sql = format!("SELECT t0.* FROM {} t0", E::TABLE);
    sql.push_str(&compiler.where_clause("t0", criteria.predicates())?);

    sql.push_str(" ORDER BY ");
    for sort in criteria.sorts() {
        let direction = match sort.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        sql.push_str(&format!("t0.{} {}, ", sort.column, direction));
    }
    sql.push_str("t0.rowid ASC");

    if let Some(page) = page {
        sql.push_str(" LIMIT ? OFFSET ?");
        compiler.params.push(SqlValue::Integer(to_i64(page.limit)));
        compiler.params.push(SqlValue::Integer(to_i64(page.offset)));
    }

    Ok(CompiledSql {
        sql,
        params: compiler.params,
    })
}

pub(crate) fn count<E: Entity>(criteria: &SelectCriteria<E>) -> Result<CompiledSql> {
    let mut compiler = Compiler::new(E::NAME);
    let mut sql = format!("SELECT COUNT(*) FROM {} t0", E::TABLE);
    sql.push_str(&compiler.where_clause("t0", criteria.predicates())?);
    Ok(CompiledSql {
        sql,
        params: compiler.params,
    })
}

pub(crate) fn load<E: Entity>(key: &EntityKey) -> CompiledSql {
    CompiledSql {
        sql: format!("SELECT * FROM {} WHERE {} = ?", E::TABLE, key_column::<E>()),
        params: vec![SqlValue::Text(key.as_str().to_string())],
    }
}

/// `INSERT` of the key plus the assigned columns; the rest take table defaults
pub(crate) fn insert<E: Entity>(key: &EntityKey, columns: &UpdateColumns<E>) -> CompiledSql {
    let mut names = vec![key_column::<E>()];
    let mut params = vec![SqlValue::Text(key.as_str().to_string())];
    for (column, value) in columns.iter() {
        names.push(column);
        params.push(to_sql_value(value));
    }
    let placeholders = vec!["?"; names.len()].join(", ");
    CompiledSql {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            names.join(", "),
            placeholders
        ),
        params,
    }
}

fn set_clause<E: Entity>(columns: &UpdateColumns<E>, params: &mut Vec<SqlValue>) -> String {
    columns
        .iter()
        .map(|(column, value)| {
            params.push(to_sql_value(value));
            format!("{} = ?", column)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn update_by_key<E: Entity>(key: &EntityKey, columns: &UpdateColumns<E>) -> CompiledSql {
    let mut params = Vec::new();
    let set = set_clause(columns, &mut params);
    params.push(SqlValue::Text(key.as_str().to_string()));
    CompiledSql {
        sql: format!("UPDATE {} SET {} WHERE {} = ?", E::TABLE, set, key_column::<E>()),
        params,
    }
}

/// Rows to touch are selected by key so the criteria keep their `t0` alias
pub(crate) fn update_where<E: Entity>(
    criteria: &SelectCriteria<E>,
    columns: &UpdateColumns<E>,
) -> Result<CompiledSql> {
    let mut params = Vec::new();
    let set = set_clause(columns, &mut params);

    let mut compiler = Compiler::new(E::NAME);
    let filter = compiler.where_clause("t0", criteria.predicates())?;
    params.append(&mut compiler.params);

    let key = key_column::<E>();
    Ok(CompiledSql {
        sql: format!(
            "UPDATE {table} SET {set} WHERE {key} IN (SELECT t0.{key} FROM {table} t0{filter})",
            table = E::TABLE,
        ),
        params,
    })
}

pub(crate) fn delete_by_key<E: Entity>(key: &EntityKey) -> CompiledSql {
    CompiledSql {
        sql: format!("DELETE FROM {} WHERE {} = ?", E::TABLE, key_column::<E>()),
        params: vec![SqlValue::Text(key.as_str().to_string())],
    }
}

pub(crate) fn delete_where<E: Entity>(criteria: &SelectCriteria<E>) -> Result<CompiledSql> {
    let mut compiler = Compiler::new(E::NAME);
    let filter = compiler.where_clause("t0", criteria.predicates())?;
    let key = key_column::<E>();
    Ok(CompiledSql {
        sql: format!(
            "DELETE FROM {table} WHERE {key} IN (SELECT t0.{key} FROM {table} t0{filter})",
            table = E::TABLE,
        ),
        params: compiler.params,
    })
}
