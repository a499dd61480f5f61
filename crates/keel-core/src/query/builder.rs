//! Fluent builders producing validated [`Query`] values.
//!
//! # Example
//!
//! ```rust
//! use keel_core::query::{Expr, Select, col};
//! use keel_core::schema::ColumnType;
//!
//! let query = Select::from("pets")
//!     .columns(&["id", "name"])
//!     .where_clause(col("owner_id").eq(Expr::param("owner", ColumnType::BigInt)))
//!     .param("owner", ColumnType::BigInt)
//!     .order_by_desc(col("id"))
//!     .build()
//!     .unwrap();
//! assert_eq!(query.params().len(), 1);
//! ```

use super::ast::{
    Assignment, DeleteStatement, Expr, InsertStatement, Join, JoinType, OrderBy,
    OrderDirection, ParamDecl, Query, SelectColumn, SelectStatement, Statement, TableRef,
    UpdateStatement,
};
use crate::error::Result;
use crate::schema::ColumnType;

/// Creates an unqualified column reference.
#[must_use]
pub fn col(name: &str) -> Expr {
    Expr::column(name)
}

/// Creates a column reference qualified by a table name or alias.
#[must_use]
pub fn qualified(table: &str, name: &str) -> Expr {
    Expr::qualified_column(table, name)
}

fn and_with(existing: Option<Expr>, expr: Expr) -> Expr {
    match existing {
        Some(existing) => existing.and(expr),
        None => expr,
    }
}

/// SELECT builder.
#[derive(Debug, Clone)]
#[must_use]
pub struct Select {
    statement: SelectStatement,
    params: Vec<ParamDecl>,
}

impl Select {
    /// Starts `SELECT * FROM table`.
    pub fn from(table: &str) -> Self {
        Self {
            statement: SelectStatement::from(table),
            params: Vec::new(),
        }
    }

    /// Aliases the source table.
    pub fn alias(mut self, alias: &str) -> Self {
        self.statement.from.alias = Some(alias.to_string());
        self
    }

    /// Adds DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.statement.distinct = true;
        self
    }

    /// Selects an expression.
    pub fn column(mut self, expr: Expr) -> Self {
        self.statement.columns.push(SelectColumn { expr, alias: None });
        self
    }

    /// Selects an expression under an alias.
    pub fn column_as(mut self, expr: Expr, alias: &str) -> Self {
        self.statement.columns.push(SelectColumn {
            expr,
            alias: Some(alias.to_string()),
        });
        self
    }

    /// Selects plain columns by name.
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.statement
            .columns
            .extend(cols.iter().map(|c| SelectColumn {
                expr: col(c),
                alias: None,
            }));
        self
    }

    fn push_join(mut self, join_type: JoinType, table: &str, alias: Option<&str>, on: Expr) -> Self {
        self.statement.joins.push(Join {
            join_type,
            table: TableRef {
                name: table.to_string(),
                alias: alias.map(str::to_string),
            },
            on,
        });
        self
    }

    /// Adds an INNER JOIN.
    pub fn join(self, table: &str, alias: Option<&str>, on: Expr) -> Self {
        self.push_join(JoinType::Inner, table, alias, on)
    }

    /// Adds a LEFT JOIN.
    pub fn left_join(self, table: &str, alias: Option<&str>, on: Expr) -> Self {
        self.push_join(JoinType::Left, table, alias, on)
    }

    /// Adds a WHERE predicate, AND-ed with any existing one.
    pub fn where_clause(mut self, expr: Expr) -> Self {
        self.statement.where_clause = Some(and_with(self.statement.where_clause.take(), expr));
        self
    }

    /// Adds a GROUP BY expression.
    pub fn group_by(mut self, expr: Expr) -> Self {
        self.statement.group_by.push(expr);
        self
    }

    /// Adds a HAVING predicate, AND-ed with any existing one.
    pub fn having(mut self, expr: Expr) -> Self {
        self.statement.having = Some(and_with(self.statement.having.take(), expr));
        self
    }

    /// Adds an ascending ORDER BY entry.
    pub fn order_by(mut self, expr: Expr) -> Self {
        self.statement.order_by.push(OrderBy {
            expr,
            direction: OrderDirection::Asc,
        });
        self
    }

    /// Adds a descending ORDER BY entry.
    pub fn order_by_desc(mut self, expr: Expr) -> Self {
        self.statement.order_by.push(OrderBy {
            expr,
            direction: OrderDirection::Desc,
        });
        self
    }

    /// Sets LIMIT.
    pub fn limit(mut self, expr: Expr) -> Self {
        self.statement.limit = Some(expr);
        self
    }

    /// Sets OFFSET.
    pub fn offset(mut self, expr: Expr) -> Self {
        self.statement.offset = Some(expr);
        self
    }

    /// Declares a bind parameter.
    pub fn param(mut self, name: &str, ty: ColumnType) -> Self {
        self.params.push(ParamDecl::new(name, ty));
        self
    }

    /// Validates and freezes the query.
    pub fn build(self) -> Result<Query> {
        Query::new(Statement::Select(self.statement), self.params)
    }
}

/// INSERT builder.
#[derive(Debug, Clone)]
#[must_use]
pub struct Insert {
    statement: InsertStatement,
    params: Vec<ParamDecl>,
}

impl Insert {
    /// Starts `INSERT INTO table`.
    pub fn into_table(table: &str) -> Self {
        Self {
            statement: InsertStatement {
                table: table.to_string(),
                columns: Vec::new(),
                values: Vec::new(),
            },
            params: Vec::new(),
        }
    }

    /// Sets one column's value.
    pub fn value(mut self, column: &str, value: Expr) -> Self {
        self.statement.columns.push(column.to_string());
        self.statement.values.push(value);
        self
    }

    /// Sets a column to a same-named parameter and declares it.
    pub fn bind(self, column: &str, ty: ColumnType) -> Self {
        self.value(column, Expr::param(column, ty)).param(column, ty)
    }

    /// Declares a bind parameter.
    pub fn param(mut self, name: &str, ty: ColumnType) -> Self {
        self.params.push(ParamDecl::new(name, ty));
        self
    }

    /// Validates and freezes the query.
    pub fn build(self) -> Result<Query> {
        Query::new(Statement::Insert(self.statement), self.params)
    }
}

/// UPDATE builder.
#[derive(Debug, Clone)]
#[must_use]
pub struct Update {
    statement: UpdateStatement,
    params: Vec<ParamDecl>,
}

impl Update {
    /// Starts `UPDATE table`.
    pub fn table(table: &str) -> Self {
        Self {
            statement: UpdateStatement {
                table: table.to_string(),
                assignments: Vec::new(),
                where_clause: None,
            },
            params: Vec::new(),
        }
    }

    /// Adds a SET clause.
    pub fn set(mut self, column: &str, value: Expr) -> Self {
        self.statement.assignments.push(Assignment {
            column: column.to_string(),
            value,
        });
        self
    }

    /// Adds a WHERE predicate, AND-ed with any existing one.
    pub fn where_clause(mut self, expr: Expr) -> Self {
        self.statement.where_clause = Some(and_with(self.statement.where_clause.take(), expr));
        self
    }

    /// Declares a bind parameter.
    pub fn param(mut self, name: &str, ty: ColumnType) -> Self {
        self.params.push(ParamDecl::new(name, ty));
        self
    }

    /// Validates and freezes the query.
    pub fn build(self) -> Result<Query> {
        Query::new(Statement::Update(self.statement), self.params)
    }
}

/// DELETE builder.
#[derive(Debug, Clone)]
#[must_use]
pub struct Delete {
    statement: DeleteStatement,
    params: Vec<ParamDecl>,
}

impl Delete {
    /// Starts `DELETE FROM table`.
    pub fn from(table: &str) -> Self {
        Self {
            statement: DeleteStatement {
                table: table.to_string(),
                where_clause: None,
            },
            params: Vec::new(),
        }
    }

    /// Adds a WHERE predicate, AND-ed with any existing one.
    pub fn where_clause(mut self, expr: Expr) -> Self {
        self.statement.where_clause = Some(and_with(self.statement.where_clause.take(), expr));
        self
    }

    /// Declares a bind parameter.
    pub fn param(mut self, name: &str, ty: ColumnType) -> Self {
        self.params.push(ParamDecl::new(name, ty));
        self
    }

    /// Validates and freezes the query.
    pub fn build(self) -> Result<Query> {
        Query::new(Statement::Delete(self.statement), self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_where_clauses_are_anded() {
        let query = Select::from("pets")
            .where_clause(col("a").eq(Expr::integer(1)))
            .where_clause(col("b").is_null())
            .build()
            .unwrap();
        let Statement::Select(select) = query.statement() else {
            panic!("expected SELECT");
        };
        assert_eq!(
            select.where_clause,
            Some(col("a").eq(Expr::integer(1)).and(col("b").is_null()))
        );
    }

    #[test]
    fn test_insert_bind_declares_param() {
        let query = Insert::into_table("pets")
            .bind("name", ColumnType::Text)
            .value("age", Expr::integer(3))
            .build()
            .unwrap();
        assert_eq!(query.params(), [ParamDecl::new("name", ColumnType::Text)]);
    }

    #[test]
    fn test_undeclared_param_rejected() {
        let result = Delete::from("pets")
            .where_clause(col("id").eq(Expr::param("id", ColumnType::BigInt)))
            .build();
        assert!(matches!(result, Err(Error::UndeclaredParam(_))));
    }

    #[test]
    fn test_update_requires_set() {
        assert!(matches!(
            Update::table("pets").build(),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_having_requires_group_by() {
        let result = Select::from("pets")
            .having(Expr::count_all().gt(Expr::integer(1)))
            .build();
        assert!(matches!(result, Err(Error::InvalidQuery(_))));
    }
}
