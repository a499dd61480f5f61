//! Relation inference.

use tracing::debug;

use super::{Relation, RelationKind, RelationVia};
use crate::error::{Error, Result};
use crate::schema::{Column, SchemaSnapshot, Table};

/// Infers every relation in `snapshot`.
///
/// Output order is deterministic: tables by name, then reference columns in
/// declaration order. Two references from one table to the same target yield
/// two relations told apart only by column name.
pub fn scan(snapshot: &SchemaSnapshot) -> Result<Vec<Relation>> {
    let mut relations = Vec::new();
    for table in snapshot.iter() {
        if table.junction {
            scan_junction(snapshot, table, &mut relations)?;
        } else {
            for column in table.reference_columns() {
                let target = target_of(snapshot, column)?;
                relations.push(Relation {
                    kind: RelationKind::HasMany,
                    from_table: target.to_string(),
                    to_table: table.name.clone(),
                    via: RelationVia::Column {
                        column: column.name.clone(),
                    },
                });
                relations.push(Relation {
                    kind: RelationKind::BelongsTo,
                    from_table: table.name.clone(),
                    to_table: target.to_string(),
                    via: RelationVia::Column {
                        column: column.name.clone(),
                    },
                });
            }
        }
    }
    debug!(tables = snapshot.len(), relations = relations.len(), "Scanned relations");
    Ok(relations)
}

fn scan_junction(
    snapshot: &SchemaSnapshot,
    table: &Table,
    relations: &mut Vec<Relation>,
) -> Result<()> {
    let references: Vec<&Column> = table.reference_columns().collect();
    let [left, right] = references.as_slice() else {
        return Err(Error::InvalidJunction {
            table: table.name.clone(),
            found: references.len(),
        });
    };

    for (from, to) in [(left, right), (right, left)] {
        relations.push(Relation {
            kind: RelationKind::ManyToMany,
            from_table: target_of(snapshot, from)?.to_string(),
            to_table: target_of(snapshot, to)?.to_string(),
            via: RelationVia::Junction {
                table: table.name.clone(),
                from_column: from.name.clone(),
                to_column: to.name.clone(),
            },
        });
    }
    Ok(())
}

fn target_of<'a>(snapshot: &SchemaSnapshot, column: &'a Column) -> Result<&'a str> {
    let target = column.references.as_deref().unwrap_or_default();
    if snapshot.contains(target) {
        Ok(target)
    } else {
        Err(Error::UnknownTable(target.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{DeclareColumns, TableBuilder};
    use crate::schema::ColumnType;

    fn insert(snapshot: &mut SchemaSnapshot, table: Table) {
        snapshot.tables.insert(table.name.clone(), table);
    }

    fn shelter() -> SchemaSnapshot {
        let mut snapshot = SchemaSnapshot::new();
        insert(&mut snapshot, TableBuilder::new("categories").build().unwrap());
        insert(&mut snapshot, TableBuilder::new("tags").build().unwrap());

        let mut pets = TableBuilder::new("pets");
        pets.bigint("category_id").references("categories").handle();
        insert(&mut snapshot, pets.build().unwrap());

        let mut pet_tags = TableBuilder::junction("pet_tags");
        pet_tags.bigint("pet_id").references("pets").handle();
        pet_tags.bigint("tag_id").references("tags").handle();
        insert(&mut snapshot, pet_tags.build().unwrap());
        snapshot
    }

    #[test]
    fn test_has_many_and_belongs_to_pair() {
        let relations = scan(&shelter()).unwrap();
        let described: Vec<String> = relations.iter().map(ToString::to_string).collect();
        assert_eq!(
            described,
            [
                "pets many_to_many tags through pet_tags",
                "tags many_to_many pets through pet_tags",
                "categories has_many pets via category_id",
                "pets belongs_to categories via category_id",
            ]
        );
    }

    #[test]
    fn test_scan_is_deterministic() {
        let snapshot = shelter();
        assert_eq!(scan(&snapshot).unwrap(), scan(&snapshot).unwrap());
    }

    #[test]
    fn test_two_references_to_same_target() {
        let mut snapshot = SchemaSnapshot::new();
        insert(&mut snapshot, TableBuilder::new("accounts").build().unwrap());
        let mut transfers = TableBuilder::new("transfers");
        transfers.bigint("from_account_id").references("accounts").handle();
        transfers.bigint("to_account_id").references("accounts").handle();
        insert(&mut snapshot, transfers.build().unwrap());

        let relations = scan(&snapshot).unwrap();
        assert_eq!(relations.len(), 4);
        let names: Vec<&str> = relations.iter().map(Relation::name).collect();
        assert_eq!(names, ["transfers", "from_account", "transfers", "to_account"]);
    }

    #[test]
    fn test_broken_junction_rejected() {
        let mut snapshot = shelter();
        let mut table = snapshot.tables.remove("pet_tags").unwrap();
        table.columns.retain(|c| c.name != "tag_id");
        insert(&mut snapshot, table);
        assert!(matches!(
            scan(&snapshot),
            Err(Error::InvalidJunction { found: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let mut snapshot = SchemaSnapshot::new();
        let mut table = Table::new("pets");
        let mut column = Column::new("owner_id", ColumnType::BigInt);
        column.references = Some("owners".into());
        table.columns.push(column);
        insert(&mut snapshot, table);
        assert!(matches!(scan(&snapshot), Err(Error::UnknownTable(t)) if t == "owners"));
    }
}
