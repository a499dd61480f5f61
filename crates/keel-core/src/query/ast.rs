//! Portable query AST.
//!
//! Queries are plain data: they serialize to JSON, are stored, and are
//! compiled later for a concrete dialect. A [`Query`] is validated once when it
//! is constructed and is immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::ColumnType;

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    /// NULL literal.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// String literal.
    String(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,

    // String
    Like,
    Concat,
}

impl BinaryOp {
    /// SQL spelling of the operator.
    ///
    /// [`Concat`](Self::Concat) is rendered by the dialect and only reports the
    /// standard spelling here.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Like => "LIKE",
            Self::Concat => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 3,
            Self::Like => 4,
            Self::Add | Self::Sub | Self::Concat => 8,
            Self::Mul | Self::Div => 9,
        }
    }

    /// Comparison or LIKE. A comparison nested in another is always
    /// parenthesized.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq | Self::Like
        )
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    /// COUNT.
    Count,
    /// SUM.
    Sum,
    /// AVG.
    Avg,
    /// MIN.
    Min,
    /// MAX.
    Max,
}

impl AggregateFunction {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Column reference, optionally qualified by a table name or alias.
    Column {
        /// Table qualifier.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table: Option<String>,
        /// Column name.
        name: String,
    },
    /// Literal value.
    Literal {
        /// The value.
        value: Literal,
    },
    /// Named bind parameter with its logical type.
    Param {
        /// Parameter name.
        name: String,
        /// Logical type.
        ty: ColumnType,
    },
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Aggregate call. A missing argument means `*`.
    Aggregate {
        /// Function.
        function: AggregateFunction,
        /// Argument.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arg: Option<Box<Expr>>,
        /// Whether DISTINCT applies to the argument.
        #[serde(default)]
        distinct: bool,
    },
    /// IS NULL / IS NOT NULL.
    IsNull {
        /// Tested expression.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        #[serde(default)]
        negated: bool,
    },
    /// Logical NOT.
    Not {
        /// Negated expression.
        expr: Box<Expr>,
    },
}

impl Expr {
    /// `name`, unqualified.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            table: None,
            name: name.into(),
        }
    }

    /// `table.name`.
    #[must_use]
    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// Integer literal.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Literal {
            value: Literal::Integer(value),
        }
    }

    /// Float literal. Non-finite values fail at compile time.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::Literal {
            value: Literal::Float(value),
        }
    }

    /// String literal, quoted by the dialect.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal {
            value: Literal::String(value.into()),
        }
    }

    /// Boolean literal (`1`/`0` on SQLite).
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Literal {
            value: Literal::Bool(value),
        }
    }

    /// `NULL`.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal {
            value: Literal::Null,
        }
    }

    /// Typed parameter. Must also be declared on the query.
    #[must_use]
    pub fn param(name: impl Into<String>, ty: ColumnType) -> Self {
        Self::Param {
            name: name.into(),
            ty,
        }
    }

    /// `self op right`.
    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    /// `self = right`.
    #[must_use]
    pub fn eq(self, right: Self) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    /// `self <> right`.
    #[must_use]
    pub fn not_eq(self, right: Self) -> Self {
        self.binary(BinaryOp::NotEq, right)
    }

    /// `self < right`.
    #[must_use]
    pub fn lt(self, right: Self) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    /// `self <= right`.
    #[must_use]
    pub fn lt_eq(self, right: Self) -> Self {
        self.binary(BinaryOp::LtEq, right)
    }

    /// `self > right`.
    #[must_use]
    pub fn gt(self, right: Self) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    /// `self >= right`.
    #[must_use]
    pub fn gt_eq(self, right: Self) -> Self {
        self.binary(BinaryOp::GtEq, right)
    }

    /// `self AND right`.
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        self.binary(BinaryOp::And, right)
    }

    /// `self OR right`.
    #[must_use]
    pub fn or(self, right: Self) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    /// `self LIKE pattern`.
    #[must_use]
    pub fn like(self, pattern: Self) -> Self {
        self.binary(BinaryOp::Like, pattern)
    }

    /// String concatenation, `||` or `CONCAT(..)` per dialect.
    #[must_use]
    pub fn concat(self, right: Self) -> Self {
        self.binary(BinaryOp::Concat, right)
    }

    /// `self IS NULL`.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// `self IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// Creates a NOT expression.
    #[must_use]
    pub fn not(self) -> Self {
        Self::Not {
            expr: Box::new(self),
        }
    }

    /// Creates `COUNT(*)`.
    #[must_use]
    pub const fn count_all() -> Self {
        Self::Aggregate {
            function: AggregateFunction::Count,
            arg: None,
            distinct: false,
        }
    }

    /// Applies an aggregate function to this expression.
    #[must_use]
    pub fn aggregate(self, function: AggregateFunction) -> Self {
        Self::Aggregate {
            function,
            arg: Some(Box::new(self)),
            distinct: false,
        }
    }

    /// Applies an aggregate function to the distinct values of this expression.
    #[must_use]
    pub fn aggregate_distinct(self, function: AggregateFunction) -> Self {
        Self::Aggregate {
            function,
            arg: Some(Box::new(self)),
            distinct: true,
        }
    }

    /// Calls `visit` for every parameter occurrence, left to right.
    pub fn visit_params<'a>(&'a self, visit: &mut impl FnMut(&'a str, ColumnType)) {
        match self {
            Self::Column { .. } | Self::Literal { .. } => {}
            Self::Param { name, ty } => visit(name, *ty),
            Self::Binary { left, right, .. } => {
                left.visit_params(visit);
                right.visit_params(visit);
            }
            Self::Aggregate { arg, .. } => {
                if let Some(arg) = arg {
                    arg.visit_params(visit);
                }
            }
            Self::IsNull { expr, .. } | Self::Not { expr } => expr.visit_params(visit),
        }
    }
}

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ORDER BY clause entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    /// The expression to order by.
    pub expr: Expr,
    /// The direction.
    #[serde(default)]
    pub direction: OrderDirection,
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A table in FROM or JOIN, with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    /// Table name.
    pub name: String,
    /// Alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl TableRef {
    /// Creates an unaliased table reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    /// Join type.
    pub join_type: JoinType,
    /// Joined table.
    pub table: TableRef,
    /// Join condition.
    pub on: Expr,
}

/// A select-list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectColumn {
    /// Selected expression.
    pub expr: Expr,
    /// Output alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    /// Whether DISTINCT is specified.
    #[serde(default)]
    pub distinct: bool,
    /// Select list. Empty means `*`.
    #[serde(default)]
    pub columns: Vec<SelectColumn>,
    /// Source table.
    pub from: TableRef,
    /// JOIN clauses, in order.
    #[serde(default)]
    pub joins: Vec<Join>,
    /// WHERE predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions.
    #[serde(default)]
    pub group_by: Vec<Expr>,
    /// HAVING predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<Expr>,
    /// ORDER BY entries.
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    /// LIMIT expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Expr>,
    /// OFFSET expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Expr>,
}

impl SelectStatement {
    /// Creates `SELECT * FROM table`.
    #[must_use]
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            distinct: false,
            columns: Vec::new(),
            from: TableRef::new(table),
            joins: Vec::new(),
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

/// An INSERT statement with one row of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    /// Target table.
    pub table: String,
    /// Target columns.
    pub columns: Vec<String>,
    /// One value per column.
    pub values: Vec<Expr>,
}

/// A `column = value` assignment in UPDATE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Column name.
    pub column: String,
    /// New value.
    pub value: Expr,
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    /// Target table.
    pub table: String,
    /// SET clauses, in order.
    pub assignments: Vec<Assignment>,
    /// WHERE predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Expr>,
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    /// Target table.
    pub table: String,
    /// WHERE predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Expr>,
}

/// A SQL statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// SELECT.
    Select(SelectStatement),
    /// INSERT.
    Insert(InsertStatement),
    /// UPDATE.
    Update(UpdateStatement),
    /// DELETE.
    Delete(DeleteStatement),
}

impl Statement {
    /// Returns the statement kind as an uppercase keyword.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
        }
    }

    /// Every expression in rendering order.
    fn expressions(&self) -> Vec<&Expr> {
        match self {
            Self::Select(select) => {
                let mut exprs: Vec<&Expr> = select.columns.iter().map(|c| &c.expr).collect();
                exprs.extend(select.joins.iter().map(|j| &j.on));
                exprs.extend(&select.where_clause);
                exprs.extend(&select.group_by);
                exprs.extend(&select.having);
                exprs.extend(select.order_by.iter().map(|o| &o.expr));
                exprs.extend(&select.limit);
                exprs.extend(&select.offset);
                exprs
            }
            Self::Insert(insert) => insert.values.iter().collect(),
            Self::Update(update) => {
                let mut exprs: Vec<&Expr> = update.assignments.iter().map(|a| &a.value).collect();
                exprs.extend(&update.where_clause);
                exprs
            }
            Self::Delete(delete) => delete.where_clause.iter().collect(),
        }
    }

    fn check_shape(&self) -> Result<()> {
        match self {
            Self::Select(select) if select.from.name.is_empty() => {
                Err(Error::InvalidQuery("SELECT has no source table".into()))
            }
            Self::Select(select) if select.having.is_some() && select.group_by.is_empty() => {
                Err(Error::InvalidQuery("HAVING requires GROUP BY".into()))
            }
            Self::Insert(insert) if insert.columns.is_empty() => {
                Err(Error::InvalidQuery("INSERT has no columns".into()))
            }
            Self::Insert(insert) if insert.columns.len() != insert.values.len() => {
                Err(Error::InvalidQuery(format!(
                    "INSERT into '{}' has {} columns but {} values",
                    insert.table,
                    insert.columns.len(),
                    insert.values.len()
                )))
            }
            Self::Update(update) if update.assignments.is_empty() => {
                Err(Error::InvalidQuery("UPDATE has no SET clauses".into()))
            }
            _ => Ok(()),
        }
    }
}

/// A declared bind parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,
    /// Logical type.
    pub ty: ColumnType,
}

impl ParamDecl {
    /// Creates a declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A validated statement plus its declared parameters.
///
/// Every parameter used in the statement is declared exactly once with the
/// same type, and every declared parameter is used. Declaration order is the
/// bind order for positional placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QueryDocument")]
pub struct Query {
    statement: Statement,
    params: Vec<ParamDecl>,
}

#[derive(Deserialize)]
struct QueryDocument {
    statement: Statement,
    #[serde(default)]
    params: Vec<ParamDecl>,
}

impl TryFrom<QueryDocument> for Query {
    type Error = Error;

    fn try_from(document: QueryDocument) -> Result<Self> {
        Self::new(document.statement, document.params)
    }
}

impl Query {
    /// Validates `statement` against `params`.
    pub fn new(statement: Statement, params: Vec<ParamDecl>) -> Result<Self> {
        statement.check_shape()?;

        for (i, param) in params.iter().enumerate() {
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(Error::DuplicateParam(param.name.clone()));
            }
        }

        let mut used = vec![false; params.len()];
        let mut failure = None;
        for expr in statement.expressions() {
            expr.visit_params(&mut |name, ty| {
                if failure.is_some() {
                    return;
                }
                match params.iter().position(|p| p.name == name) {
                    None => failure = Some(Error::UndeclaredParam(name.to_string())),
                    Some(i) if params[i].ty != ty => {
                        failure = Some(Error::ParamTypeMismatch {
                            name: name.to_string(),
                            declared: params[i].ty,
                            used: ty,
                        });
                    }
                    Some(i) => used[i] = true,
                }
            });
        }
        if let Some(error) = failure {
            return Err(error);
        }
        if let Some(i) = used.iter().position(|u| !u) {
            return Err(Error::UnusedParam(params[i].name.clone()));
        }

        Ok(Self { statement, params })
    }

    /// Returns the statement.
    #[must_use]
    pub const fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Returns the declared parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
