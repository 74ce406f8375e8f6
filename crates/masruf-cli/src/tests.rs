//! CLI command tests
//!
//! These run the command functions against in-memory databases and check
//! both the Ok result and the store effects.

use masruf_core::db::Database;

use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.seed_default_categories(1).unwrap();
    db
}

// ========== Ingest / Resolve ==========

#[test]
fn test_cmd_ingest_prompt_and_resolve_by_name() {
    let db = setup_test_db();

    let result = commands::cmd_ingest(
        &db,
        1,
        "تم خصم مبلغ 12.500 دينار لدى مطعم الضيعة",
        None,
        false,
    );
    assert!(result.is_ok());

    let pending = db.list_open_pending(1).unwrap();
    assert_eq!(pending.len(), 1);

    let result = commands::cmd_resolve(&db, 1, pending[0].id, "Dining");
    assert!(result.is_ok());
    assert!(db.list_open_pending(1).unwrap().is_empty());
    assert_eq!(db.list_ledger_entries(1, 10).unwrap().len(), 1);
}

#[test]
fn test_cmd_ingest_rejects_greeting() {
    let db = setup_test_db();

    commands::cmd_ingest(&db, 1, "تهنئكم الاسرة بعيد مبارك", None, false).unwrap();
    assert!(db.list_open_pending(1).unwrap().is_empty());
    assert!(db.list_ledger_entries(1, 10).unwrap().is_empty());
}

#[test]
fn test_cmd_ingest_json_output() {
    let db = setup_test_db();
    let result = commands::cmd_ingest(
        &db,
        1,
        "Debit card purchase from CARREFOUR amount JOD 45.30",
        None,
        true,
    );
    assert!(result.is_ok());
}

#[test]
fn test_cmd_resolve_unknown_category_fails() {
    let db = setup_test_db();

    commands::cmd_ingest(&db, 1, "تم خصم مبلغ 12.500 دينار لدى مطعم الضيعة", None, false)
        .unwrap();
    let pending = db.list_open_pending(1).unwrap();

    let result = commands::cmd_resolve(&db, 1, pending[0].id, "NoSuchCategory");
    assert!(result.is_err());
}

#[test]
fn test_cmd_parse_dry_run() {
    // Parse never needs a database
    assert!(commands::cmd_parse("تم خصم مبلغ 10 دينار", None, false).is_ok());
    assert!(commands::cmd_parse("تم خصم مبلغ 10 دينار", None, true).is_ok());
    assert!(commands::cmd_parse("not a bank message", None, false).is_ok());
    assert!(commands::cmd_parse("تم خصم مبلغ 10 دينار", Some("garbage"), false).is_err());
}

// ========== Categories ==========

#[test]
fn test_cmd_categories_add_and_keywords() {
    let db = setup_test_db();

    commands::cmd_categories_add(&db, 1, "Pets", "expense", Some("vet|بيطري")).unwrap();
    let cat = db.get_category_by_name(1, "Pets").unwrap().unwrap();
    assert_eq!(cat.keyword_list(), vec!["vet", "بيطري"]);

    commands::cmd_categories_keywords(&db, 1, "Pets", "vet").unwrap();
    let cat = db.get_category_by_name(1, "Pets").unwrap().unwrap();
    assert_eq!(cat.keyword_list(), vec!["vet"]);

    // Bad kind string is rejected
    assert!(commands::cmd_categories_add(&db, 1, "Bad", "sideways", None).is_err());
}

#[test]
fn test_cmd_listing_commands_run_on_empty_db() {
    let db = setup_test_db();
    assert!(commands::cmd_categories_list(&db, 1).is_ok());
    assert!(commands::cmd_patterns_merchants(&db, 1).is_ok());
    assert!(commands::cmd_patterns_cliq(&db, 1).is_ok());
    assert!(commands::cmd_patterns_amounts(&db, 1).is_ok());
    assert!(commands::cmd_patterns_history(&db, 1, 20).is_ok());
    assert!(commands::cmd_ledger(&db, 1, 20).is_ok());
    assert!(commands::cmd_pending(&db, 1).is_ok());
    assert!(commands::cmd_status(&db, 1).is_ok());
}

// ========== Utilities ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a longer string here", 10), "a longe...");
    // Multi-byte text truncates on character boundaries
    assert_eq!(truncate("حوالة كليك واردة من احمد", 10), "حوالة ك...");
}

#[test]
fn test_cli_argument_definitions() {
    use clap::CommandFactory;
    crate::cli::Cli::command().debug_assert();
}
