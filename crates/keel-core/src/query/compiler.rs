//! Single-pass compilation of a [`Query`] into dialect SQL.

use super::ast::{
    AggregateFunction, BinaryOp, DeleteStatement, Expr, InsertStatement, Literal, ParamDecl,
    Query, SelectStatement, Statement, TableRef, UpdateStatement,
};
use crate::dialect::{Dialect, DialectKind, PlaceholderStyle};
use crate::error::{Error, Result};

/// SQL text plus what the caller needs to bind parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// SQL text.
    pub sql: String,
    /// Declared parameters, in declaration order.
    pub params: Vec<ParamDecl>,
    /// Parameter names in the order the driver expects values.
    ///
    /// Declaration order for numbered and named placeholders; one entry per
    /// occurrence for sequential `?` placeholders.
    pub bind_order: Vec<String>,
}

impl Query {
    /// Compiles with the dialect's default placeholder style.
    pub fn compile(&self, dialect: DialectKind) -> Result<CompiledQuery> {
        compile(self, dialect)
    }
}

/// Compiles `query` for `dialect` with its default placeholder style.
pub fn compile(query: &Query, dialect: DialectKind) -> Result<CompiledQuery> {
    let dialect = dialect.dialect();
    compile_with(query, dialect, dialect.placeholder_style())
}

/// Compiles `query` with an explicit placeholder style.
pub fn compile_with(
    query: &Query,
    dialect: &(impl Dialect + ?Sized),
    style: PlaceholderStyle,
) -> Result<CompiledQuery> {
    let mut compiler = Compiler {
        dialect,
        style,
        params: query.params(),
        occurrences: Vec::new(),
    };
    let sql = compiler.statement(query.statement())?;
    let bind_order = match style {
        PlaceholderStyle::Sequential => compiler.occurrences,
        _ => query.params().iter().map(|p| p.name.clone()).collect(),
    };
    Ok(CompiledQuery {
        sql,
        params: query.params().to_vec(),
        bind_order,
    })
}

struct Compiler<'a, D: Dialect + ?Sized> {
    dialect: &'a D,
    style: PlaceholderStyle,
    params: &'a [ParamDecl],
    occurrences: Vec<String>,
}

impl<D: Dialect + ?Sized> Compiler<'_, D> {
    fn statement(&mut self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Select(select) => self.select(select),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
        }
    }

    fn table_ref(&self, table: &TableRef) -> String {
        let name = self.dialect.quote_identifier(&table.name);
        match &table.alias {
            Some(alias) => format!("{name} AS {}", self.dialect.quote_identifier(alias)),
            None => name,
        }
    }

    fn list(&mut self, exprs: &[Expr]) -> Result<String> {
        let mut parts = Vec::with_capacity(exprs.len());
        for expr in exprs {
            parts.push(self.expr(expr)?);
        }
        Ok(parts.join(", "))
    }

    fn select(&mut self, select: &SelectStatement) -> Result<String> {
        let mut sql = String::from("SELECT ");
        if select.distinct {
            sql.push_str("DISTINCT ");
        }

        if select.columns.is_empty() {
            sql.push('*');
        } else {
            let mut items = Vec::with_capacity(select.columns.len());
            for column in &select.columns {
                let expr = self.expr(&column.expr)?;
                items.push(match &column.alias {
                    Some(alias) => format!("{expr} AS {}", self.dialect.quote_identifier(alias)),
                    None => expr,
                });
            }
            sql.push_str(&items.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table_ref(&select.from));

        for join in &select.joins {
            let on = self.expr(&join.on)?;
            sql.push_str(&format!(
                " {} {} ON {on}",
                join.join_type.as_str(),
                self.table_ref(&join.table)
            ));
        }

        if let Some(predicate) = &select.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.expr(predicate)?);
        }

        if !select.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.list(&select.group_by)?);
        }

        if let Some(predicate) = &select.having {
            sql.push_str(" HAVING ");
            sql.push_str(&self.expr(predicate)?);
        }

        if !select.order_by.is_empty() {
            let mut entries = Vec::with_capacity(select.order_by.len());
            for entry in &select.order_by {
                entries.push(format!("{} {}", self.expr(&entry.expr)?, entry.direction.as_str()));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&entries.join(", "));
        }

        match (&select.limit, &select.offset) {
            (Some(limit), _) => {
                sql.push_str(" LIMIT ");
                sql.push_str(&self.expr(limit)?);
            }
            (None, Some(_)) => {
                // Some dialects only accept OFFSET after a LIMIT
                if let Some(unbounded) = self.dialect.unbounded_limit() {
                    sql.push_str(" LIMIT ");
                    sql.push_str(unbounded);
                }
            }
            (None, None) => {}
        }

        if let Some(offset) = &select.offset {
            sql.push_str(" OFFSET ");
            sql.push_str(&self.expr(offset)?);
        }

        Ok(sql)
    }

    fn insert(&mut self, insert: &InsertStatement) -> Result<String> {
        let columns: Vec<String> = insert
            .columns
            .iter()
            .map(|c| self.dialect.quote_identifier(c))
            .collect();
        let values = self.list(&insert.values)?;
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({values})",
            self.dialect.quote_identifier(&insert.table),
            columns.join(", ")
        ))
    }

    fn update(&mut self, update: &UpdateStatement) -> Result<String> {
        let mut assignments = Vec::with_capacity(update.assignments.len());
        for assignment in &update.assignments {
            assignments.push(format!(
                "{} = {}",
                self.dialect.quote_identifier(&assignment.column),
                self.expr(&assignment.value)?
            ));
        }
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.dialect.quote_identifier(&update.table),
            assignments.join(", ")
        );
        if let Some(predicate) = &update.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.expr(predicate)?);
        }
        Ok(sql)
    }

    fn delete(&mut self, delete: &DeleteStatement) -> Result<String> {
        let mut sql = format!("DELETE FROM {}", self.dialect.quote_identifier(&delete.table));
        if let Some(predicate) = &delete.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.expr(predicate)?);
        }
        Ok(sql)
    }

    fn literal(&self, literal: &Literal) -> Result<String> {
        match literal {
            Literal::Null => Ok(String::from("NULL")),
            Literal::Bool(b) => Ok(self.dialect.bool_literal(*b).to_string()),
            Literal::Integer(i) => Ok(i.to_string()),
            Literal::Float(f) if f.is_finite() => Ok(format!("{f:?}")),
            Literal::Float(f) => Err(Error::InvalidQuery(format!(
                "float literal {f} has no SQL representation"
            ))),
            Literal::String(s) => Ok(self.dialect.string_literal(s)),
        }
    }

    fn placeholder(&mut self, name: &str) -> Result<String> {
        let position = self
            .params
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| Error::UndeclaredParam(name.to_string()))?;
        if self.style == PlaceholderStyle::Sequential {
            self.occurrences.push(name.to_string());
        }
        Ok(self.style.render(position + 1, name))
    }

    fn expr(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Column { table: Some(table), name } => {
                Ok(self.dialect.quote_qualified(table, name))
            }
            Expr::Column { table: None, name } => Ok(self.dialect.quote_identifier(name)),
            Expr::Literal { value } => self.literal(value),
            Expr::Param { name, .. } => self.placeholder(name),
            Expr::Binary { op, left, right } => {
                let left = self.operand(left, *op, false)?;
                let right = self.operand(right, *op, true)?;
                if *op == BinaryOp::Concat {
                    Ok(self.dialect.concat(&left, &right))
                } else {
                    Ok(format!("{left} {} {right}", op.as_str()))
                }
            }
            Expr::Aggregate {
                function,
                arg,
                distinct,
            } => match arg {
                Some(arg) => {
                    let arg = self.expr(arg)?;
                    let distinct = if *distinct { "DISTINCT " } else { "" };
                    Ok(format!("{}({distinct}{arg})", function.as_str()))
                }
                None if *function == AggregateFunction::Count && !*distinct => {
                    Ok(String::from("COUNT(*)"))
                }
                None => Err(Error::InvalidQuery(format!(
                    "{} requires an argument",
                    function.as_str()
                ))),
            },
            Expr::IsNull { expr, negated } => {
                let inner = self.wrapped(expr)?;
                Ok(if *negated {
                    format!("{inner} IS NOT NULL")
                } else {
                    format!("{inner} IS NULL")
                })
            }
            Expr::Not { expr } => Ok(format!("NOT {}", self.wrapped(expr)?)),
        }
    }

    /// Renders an operand of a unary form, parenthesizing compound expressions.
    fn wrapped(&mut self, expr: &Expr) -> Result<String> {
        let sql = self.expr(expr)?;
        Ok(match expr {
            Expr::Binary { .. } | Expr::Not { .. } | Expr::IsNull { .. } => format!("({sql})"),
            _ => sql,
        })
    }

    /// Renders an operand of `parent`, parenthesizing when precedence requires it.
    fn operand(&mut self, expr: &Expr, parent: BinaryOp, right: bool) -> Result<String> {
        let sql = self.expr(expr)?;
        let logical = matches!(parent, BinaryOp::And | BinaryOp::Or);
        let wrap = match expr {
            Expr::Binary { op, .. } => {
                (op.is_comparison() && parent.is_comparison())
                    || op.precedence() < parent.precedence()
                    || (right && op.precedence() == parent.precedence() && (*op != parent || !logical))
                    || ((*op == BinaryOp::Concat) != (parent == BinaryOp::Concat))
            }
            Expr::Not { .. } | Expr::IsNull { .. } => !logical,
            _ => false,
        };
        Ok(if wrap { format!("({sql})") } else { sql })
    }
}
