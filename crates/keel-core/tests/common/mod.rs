#![allow(dead_code)]

use keel_core::migrations::{DeclareColumns, Ledger, MigrationUnit, Plan, SchemaHistory};
use keel_core::Result;

pub struct CreateCategories;

impl MigrationUnit for CreateCategories {
    const NAME: &'static str = "20240101000000_create_categories";

    fn up(plan: &mut Plan) -> Result<()> {
        plan.create_table("categories", |t| {
            t.varchar("name", 100).unique()?.handle();
            Ok(())
        })
    }
}

pub struct CreatePets;

impl MigrationUnit for CreatePets {
    const NAME: &'static str = "20240102000000_create_pets";

    fn up(plan: &mut Plan) -> Result<()> {
        plan.table("categories")?;
        plan.create_table("pets", |t| {
            let name = t.varchar("name", 100).handle();
            let category = t
                .bigint("category_id")
                .nullable()
                .references("categories")
                .handle();
            t.add_index(&[&category, &name])?;
            Ok(())
        })
    }
}

pub struct CreateTags;

impl MigrationUnit for CreateTags {
    const NAME: &'static str = "20240103000000_create_tags";

    fn up(plan: &mut Plan) -> Result<()> {
        plan.create_table("tags", |t| {
            t.varchar("label", 50).unique()?.handle();
            Ok(())
        })?;
        plan.create_junction_table("pet_tags", |t| {
            t.bigint("pet_id").references("pets").handle();
            t.bigint("tag_id").references("tags").handle();
            Ok(())
        })
    }
}

pub struct RenamePetName;

impl MigrationUnit for RenamePetName {
    const NAME: &'static str = "20240104000000_rename_pet_name";

    fn up(plan: &mut Plan) -> Result<()> {
        plan.alter_table("pets", |t| {
            let name = t.column("name")?;
            t.rename_column(&name, "full_name")?;
            t.text("bio").nullable().handle();
            Ok(())
        })
    }
}

/// Categories, pets and tags, registered out of order on purpose.
pub fn shelter_ledger() -> Ledger {
    let mut ledger = Ledger::new();
    ledger
        .register::<RenamePetName>()
        .register::<CreateTags>()
        .register::<CreateCategories>()
        .register::<CreatePets>();
    ledger
}

pub fn shelter() -> SchemaHistory {
    shelter_ledger()
        .build()
        .unwrap_or_else(|e| panic!("Failed to build ledger: {e}"))
}
