//! Integration tests for the query AST: serialization and per-dialect compilation.

use keel_core::dialect::DialectKind;
use keel_core::query::{Expr, Query, Select, Update, compile, col, qualified};
use keel_core::schema::ColumnType;
use rstest::rstest;

fn pets_page() -> Query {
    Select::from("pets")
        .alias("p")
        .columns(&["id", "name"])
        .join(
            "categories",
            Some("c"),
            qualified("c", "id").eq(qualified("p", "category_id")),
        )
        .where_clause(qualified("c", "name").eq(Expr::param("category", ColumnType::Text)))
        .where_clause(qualified("p", "deleted_at").is_null())
        .order_by(qualified("p", "name"))
        .limit(Expr::param("limit", ColumnType::BigInt))
        .offset(Expr::param("offset", ColumnType::BigInt))
        .param("category", ColumnType::Text)
        .param("limit", ColumnType::BigInt)
        .param("offset", ColumnType::BigInt)
        .build()
        .unwrap()
}

#[rstest]
#[case::postgres(
    DialectKind::Postgres,
    "SELECT \"id\", \"name\" FROM \"pets\" AS \"p\" \
     INNER JOIN \"categories\" AS \"c\" ON \"c\".\"id\" = \"p\".\"category_id\" \
     WHERE \"c\".\"name\" = $1 AND \"p\".\"deleted_at\" IS NULL \
     ORDER BY \"p\".\"name\" ASC LIMIT $2 OFFSET $3"
)]
#[case::mysql(
    DialectKind::MySql,
    "SELECT `id`, `name` FROM `pets` AS `p` \
     INNER JOIN `categories` AS `c` ON `c`.`id` = `p`.`category_id` \
     WHERE `c`.`name` = ? AND `p`.`deleted_at` IS NULL \
     ORDER BY `p`.`name` ASC LIMIT ? OFFSET ?"
)]
#[case::sqlite(
    DialectKind::Sqlite,
    "SELECT \"id\", \"name\" FROM \"pets\" AS \"p\" \
     INNER JOIN \"categories\" AS \"c\" ON \"c\".\"id\" = \"p\".\"category_id\" \
     WHERE \"c\".\"name\" = ?1 AND \"p\".\"deleted_at\" IS NULL \
     ORDER BY \"p\".\"name\" ASC LIMIT ?2 OFFSET ?3"
)]
fn test_compiles_per_dialect(#[case] dialect: DialectKind, #[case] expected: &str) {
    let compiled = compile(&pets_page(), dialect).unwrap();
    assert_eq!(compiled.sql, expected);
    assert_eq!(compiled.bind_order, ["category", "limit", "offset"]);
}

#[test]
fn test_serialized_query_compiles_identically() {
    let query = pets_page();
    let json = query.to_json().unwrap();
    let loaded = Query::from_json(&json).unwrap();
    assert_eq!(loaded, query);
    for kind in DialectKind::ALL {
        assert_eq!(compile(&loaded, kind).unwrap(), compile(&query, kind).unwrap());
    }
}

#[test]
fn test_hand_written_document() {
    let json = r#"{
        "statement": {
            "kind": "delete",
            "table": "pets",
            "where_clause": {
                "kind": "binary",
                "op": "eq",
                "left": { "kind": "column", "name": "public_id" },
                "right": { "kind": "param", "name": "public_id", "ty": { "type": "varchar", "length": 36 } }
            }
        },
        "params": [{ "name": "public_id", "ty": { "type": "varchar", "length": 36 } }]
    }"#;
    let query = Query::from_json(json).unwrap();
    assert_eq!(
        compile(&query, DialectKind::MySql).unwrap().sql,
        "DELETE FROM `pets` WHERE `public_id` = ?"
    );
}

#[test]
fn test_update_declared_order_kept_for_positional() {
    let query = Update::table("pets")
        .set("name", Expr::param("name", ColumnType::Text))
        .where_clause(col("public_id").eq(Expr::param("public_id", ColumnType::Varchar { length: 36 })))
        .param("public_id", ColumnType::Varchar { length: 36 })
        .param("name", ColumnType::Text)
        .build()
        .unwrap();

    let sqlite = compile(&query, DialectKind::Sqlite).unwrap();
    assert_eq!(
        sqlite.sql,
        "UPDATE \"pets\" SET \"name\" = ?2 WHERE \"public_id\" = ?1"
    );
    assert_eq!(sqlite.bind_order, ["public_id", "name"]);

    let mysql = compile(&query, DialectKind::MySql).unwrap();
    assert_eq!(mysql.bind_order, ["name", "public_id"]);
}
