//! Relation SELECT generation.
//!
//! Each relation renders as one SELECT keyed by the owner's public id. The
//! owner is aliased `o`, the related table `r` and a junction table `j`, so
//! self-referencing relations need no special casing.

use super::{Relation, RelationKind, RelationVia, scan};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::query::ParamDecl;
use crate::schema::{ColumnType, SchemaSnapshot, Table};

/// Name of the parameter every relation query is keyed by.
pub const OWNER_KEY_PARAM: &str = "public_id";

const OWNER: &str = "o";
const RELATED: &str = "r";
const JUNCTION: &str = "j";

/// A rendered relation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationQuery {
    /// The relation rendered.
    pub relation: Relation,
    /// SQL text.
    pub sql: String,
    /// Declared parameters (the owner's public id).
    pub params: Vec<ParamDecl>,
}

/// Renders `relation` as a SELECT for `dialect`.
///
/// The query returns the owner's columns plus one column named after the
/// relation holding the related rows as a JSON array (has-many,
/// many-to-many) or a JSON object or NULL (belongs-to). An owner with no
/// related rows gets `[]`. Binary columns are left out of the JSON payload.
pub fn relation_query(
    snapshot: &SchemaSnapshot,
    relation: &Relation,
    dialect: &(impl Dialect + ?Sized),
) -> Result<RelationQuery> {
    let invalid = |reason: String| Error::InvalidRelation {
        relation: relation.to_string(),
        reason,
    };
    let has_column = |table: &Table, column: &str| {
        if table.column(column).is_some() {
            Ok(())
        } else {
            Err(invalid(format!("table '{}' has no column '{column}'", table.name)))
        }
    };
    let key_column = |table: &Table| -> Result<String> {
        let name = table.primary_key().map_or("id", |c| c.name.as_str());
        has_column(table, name)?;
        Ok(name.to_string())
    };

    let owner = snapshot.require_table(&relation.from_table)?;
    let related = snapshot.require_table(&relation.to_table)?;
    let public_id = owner
        .column(OWNER_KEY_PARAM)
        .ok_or_else(|| invalid(format!("table '{}' has no {OWNER_KEY_PARAM} column", owner.name)))?;

    let owner_key = dialect.quote_qualified(OWNER, &key_column(owner)?);
    let related_key = dialect.quote_qualified(RELATED, &key_column(related)?);
    let related_table = format!(
        "{} AS {}",
        dialect.quote_identifier(&related.name),
        dialect.quote_identifier(RELATED)
    );

    let fields: Vec<(String, String)> = related
        .columns
        .iter()
        .filter(|c| c.ty != ColumnType::Binary)
        .map(|c| (c.name.clone(), dialect.quote_qualified(RELATED, &c.name)))
        .collect();
    let object = dialect.json_object(&fields);

    let (joins, payload) = match (&relation.kind, &relation.via) {
        (RelationKind::HasMany, RelationVia::Column { column }) => {
            has_column(related, column)?;
            (
                format!(
                    "LEFT JOIN {related_table} ON {} = {owner_key}",
                    dialect.quote_qualified(RELATED, column)
                ),
                dialect.json_array_agg(&object, &related_key),
            )
        }
        (RelationKind::BelongsTo, RelationVia::Column { column }) => {
            has_column(owner, column)?;
            (
                format!(
                    "LEFT JOIN {related_table} ON {related_key} = {}",
                    dialect.quote_qualified(OWNER, column)
                ),
                dialect.json_object_or_null(&object, &related_key),
            )
        }
        (
            RelationKind::ManyToMany,
            RelationVia::Junction {
                table,
                from_column,
                to_column,
            },
        ) => {
            let junction = snapshot.require_table(table)?;
            has_column(junction, from_column)?;
            has_column(junction, to_column)?;
            (
                // Junction rows pointing at missing related rows are dropped
                // by the inner join before the owner is outer-joined.
                format!(
                    "LEFT JOIN ({} AS {} INNER JOIN {related_table} ON {related_key} = {}) ON {} = {owner_key}",
                    dialect.quote_identifier(table),
                    dialect.quote_identifier(JUNCTION),
                    dialect.quote_qualified(JUNCTION, to_column),
                    dialect.quote_qualified(JUNCTION, from_column)
                ),
                dialect.json_array_agg(&object, &related_key),
            )
        }
        _ => return Err(invalid("relation kind does not match its link".to_string())),
    };

    let owner_columns: Vec<String> = owner
        .columns
        .iter()
        .map(|c| dialect.quote_qualified(OWNER, &c.name))
        .collect();
    let owner_columns = owner_columns.join(", ");

    let mut sql = format!(
        "SELECT {owner_columns}, {payload} AS {} FROM {} AS {} {joins} WHERE {} = {}",
        dialect.quote_identifier(relation.name()),
        dialect.quote_identifier(&owner.name),
        dialect.quote_identifier(OWNER),
        dialect.quote_qualified(OWNER, OWNER_KEY_PARAM),
        dialect.placeholder_style().render(1, OWNER_KEY_PARAM)
    );
    if relation.kind.is_collection() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&owner_columns);
    }

    Ok(RelationQuery {
        relation: relation.clone(),
        sql,
        params: vec![ParamDecl::new(OWNER_KEY_PARAM, public_id.ty)],
    })
}

/// Scans `snapshot` and renders every relation whose owner has a public id.
///
/// Relations owned by tables without one (junction tables, tables built
/// with the empty constructor) are skipped.
pub fn relation_queries(
    snapshot: &SchemaSnapshot,
    dialect: &(impl Dialect + ?Sized),
) -> Result<Vec<RelationQuery>> {
    scan(snapshot)?
        .iter()
        .filter(|r| {
            snapshot
                .table(&r.from_table)
                .is_some_and(|t| t.column(OWNER_KEY_PARAM).is_some())
        })
        .map(|r| relation_query(snapshot, r, dialect))
        .collect()
}
