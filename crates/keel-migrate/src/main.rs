//! keel-migrate CLI
//!
//! Command-line tool for building schema artifacts and migrating databases.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use keel_core::dialect::DialectKind;
use keel_core::migrations::SchemaHistory;
use keel_core::relations::relation_queries;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use keel_migrate::prelude::*;

/// Portable schema migrations for PostgreSQL, MySQL and SQLite.
#[derive(Parser)]
#[command(name = "keel-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Development database URL.
    #[arg(short, long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Test database URL, migrated after the development database.
    #[arg(long, env = "TEST_DATABASE_URL")]
    test_database_url: Option<String>,

    /// SQL dialect (inferred from the database URL when omitted).
    #[arg(long)]
    dialect: Option<DialectKind>,

    /// Migrations directory.
    #[arg(short, long, default_value = "migrations")]
    migrations_dir: PathBuf,

    /// Schema artifact path.
    #[arg(short, long, default_value = "schema.json")]
    artifact: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the migrations directory and write the schema artifact.
    Build,

    /// Show SQL for migrations without executing.
    Sql {
        /// Only this migration.
        #[arg(short, long)]
        migration: Option<String>,
    },

    /// Apply pending migrations to every configured database.
    Migrate {
        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Show migration status of the development database.
    Status,

    /// List inferred relations and their SQL.
    Relations,
}

impl Cli {
    /// Reads the artifact, or replays the migrations directory if there is none.
    fn schema(&self) -> anyhow::Result<SchemaHistory> {
        load_schema(&self.migrations_dir, &self.artifact)
            .with_context(|| format!("loading {}", self.artifact.display()))
    }

    fn dialect(&self) -> anyhow::Result<DialectKind> {
        match (self.dialect, self.database_url.as_deref()) {
            (Some(dialect), _) => Ok(dialect),
            (None, Some(url)) => Ok(DialectKind::from_url(url)?),
            (None, None) => anyhow::bail!("pass --dialect or set DATABASE_URL"),
        }
    }

    fn config(&self) -> anyhow::Result<MigrateConfig> {
        Ok(MigrateConfig::from_urls(
            self.database_url.as_deref(),
            self.test_database_url.as_deref(),
            self.dialect,
        )?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::Build => {
            let schema = load_ledger(&cli.migrations_dir)?.build()?;
            write_artifact(&cli.artifact, &schema)?;
        }

        Commands::Sql { migration } => {
            let dialect = cli.dialect()?;
            let ddl = cli.schema()?.ddl(dialect.dialect())?;
            let mut shown = 0;
            for entry in &ddl {
                if migration.as_ref().is_some_and(|m| *m != entry.name.to_string()) {
                    continue;
                }
                shown += 1;
                println!("-- {}", entry.name);
                for sql in &entry.statements {
                    println!("{sql};");
                }
                println!();
            }
            if let (Some(name), 0) = (migration, shown) {
                anyhow::bail!("migration '{name}' is not in the ledger");
            }
        }

        Commands::Migrate { dry_run } => {
            let schema = cli.schema()?;
            if *dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }
            for target in &cli.config()?.targets {
                let executor = MigrationExecutor::connect(target)
                    .await?
                    .with_dry_run(*dry_run);
                let report = executor.apply(&schema).await?;
                info!(
                    database = %target.name,
                    applied = report.applied.len(),
                    skipped = report.skipped.len(),
                    orphans = report.orphans.len(),
                    "Migration run finished"
                );
            }
        }

        Commands::Status => {
            let schema = cli.schema()?;
            let config = cli.config()?;
            let target = config
                .primary()
                .context("no database configured")?;
            let executor = MigrationExecutor::connect(target).await?;

            println!("\nMigrations ({}):", target.name);
            println!("{:-<60}", "");
            for status in executor.status(&schema).await? {
                match status.applied_at {
                    Some(at) => println!(
                        " [X] {} ({})",
                        status.name,
                        at.format("%Y-%m-%d %H:%M:%S")
                    ),
                    None => println!(" [ ] {}", status.name),
                }
            }
            for orphan in executor.orphans(&schema).await? {
                warn!(migration = %orphan, "Applied migration is missing from the ledger");
            }
            println!();
        }

        Commands::Relations => {
            let dialect = cli.dialect()?;
            let schema = cli.schema()?;
            for query in relation_queries(&schema.snapshot, dialect.dialect())? {
                println!("-- {}", query.relation);
                println!("{};\n", query.sql);
            }
        }
    }

    Ok(())
}
