#![allow(dead_code)]

use keel_core::dialect::DialectKind;
use keel_core::migrations::{DeclareColumns, Ledger, Plan, SchemaHistory};
use keel_migrate::executor::MigrationExecutor;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

fn create_categories(plan: &mut Plan) -> keel_core::Result<()> {
    plan.create_table("categories", |t| {
        t.varchar("name", 100).unique()?.handle();
        Ok(())
    })
}

fn create_pets(plan: &mut Plan) -> keel_core::Result<()> {
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

fn create_tags(plan: &mut Plan) -> keel_core::Result<()> {
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

fn add_pet_bio(plan: &mut Plan) -> keel_core::Result<()> {
    plan.alter_table("pets", |t| {
        let name = t.column("name")?;
        t.rename_column(&name, "full_name")?;
        t.text("bio").nullable().handle();
        Ok(())
    })
}

/// The first `count` shelter migrations.
pub fn shelter_ledger(count: usize) -> Ledger {
    let steps: [(&'static str, fn(&mut Plan) -> keel_core::Result<()>); 4] = [
        ("20240101000000_create_categories", create_categories),
        ("20240102000000_create_pets", create_pets),
        ("20240103000000_create_tags", create_tags),
        ("20240104000000_add_pet_bio", add_pet_bio),
    ];
    let mut ledger = Ledger::new();
    for (name, up) in steps.into_iter().take(count) {
        ledger.register_fn(name, up);
    }
    ledger
}

pub fn shelter(count: usize) -> SchemaHistory {
    shelter_ledger(count)
        .build()
        .unwrap_or_else(|e| panic!("Failed to build ledger: {e}"))
}

pub async fn sqlite_pool() -> AnyPool {
    sqlx::any::install_default_drivers();
    AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

pub async fn sqlite_executor() -> (AnyPool, MigrationExecutor) {
    let pool = sqlite_pool().await;
    let executor = MigrationExecutor::new(pool.clone(), DialectKind::Sqlite).unwrap();
    (pool, executor)
}
