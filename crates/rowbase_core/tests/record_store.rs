use rowbase_core::db::{open_db_in_memory, seed_users};
use rowbase_core::{Ident, Payload, RecordStore, Row, StoreError, UserColumn, Users};
use rusqlite::Connection;
use std::sync::Mutex;

fn ident(name: &str) -> Ident {
    Ident::new(name).unwrap()
}

fn seeded() -> Connection {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(seed_users(&conn).unwrap(), 3);
    conn
}

fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter().map(|row| row.get_i64("id").unwrap()).collect()
}

fn user_payload(name: &str, email: &str) -> Payload<Ident> {
    Payload::new()
        .set(ident("name"), name.to_string())
        .set(ident("email"), email.to_string())
}

#[test]
fn seeded_scenario_walkthrough() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();

    assert_eq!(ids(&store.get_all().unwrap()), [3, 2, 1]);

    let jane = store
        .find_one_by(ident("email"), "jane@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(jane.get_i64("id"), Some(2));

    let updated = store
        .update(2, &user_payload("Jane X", "jane@example.com"))
        .unwrap()
        .unwrap();
    assert_eq!(updated.get_i64("id"), Some(2));
    assert_eq!(updated.get_str("name"), Some("Jane X"));
    assert_eq!(updated.get_str("email"), Some("jane@example.com"));

    assert!(store.delete(1).unwrap());
    assert!(store.get_by_id(1).unwrap().is_none());
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn create_then_get_by_id_returns_written_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = RecordStore::untyped(&conn, "users").unwrap();

    let created = store
        .create(&user_payload("Grace Hopper", "grace@example.com"))
        .unwrap()
        .unwrap();
    let id = created.get_i64("id").unwrap();

    let loaded = store.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.get_str("name"), Some("Grace Hopper"));
    assert_eq!(loaded.get_str("email"), Some("grace@example.com"));
    assert!(loaded.get_str("created_at").is_some());
}

#[test]
fn rows_keep_table_column_order() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();

    let row = store.get_by_id(1).unwrap().unwrap();
    assert_eq!(
        row.column_names().collect::<Vec<_>>(),
        ["id", "name", "email", "created_at"]
    );
}

#[test]
fn delete_twice_reports_only_first_removal() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();

    assert!(store.delete(3).unwrap());
    assert!(!store.delete(3).unwrap());
    assert!(!store.delete(404).unwrap());
}

#[test]
fn count_tracks_creates_and_deletes() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();
    let before = store.count().unwrap();

    for index in 0..4 {
        let email = format!("user{index}@example.com");
        store.create(&user_payload("User", &email)).unwrap();
    }
    assert!(store.delete(1).unwrap());
    assert!(store.delete(2).unwrap());
    assert!(!store.delete(2).unwrap());

    assert_eq!(store.count().unwrap(), before + 4 - 2);
}

#[test]
fn get_all_orders_by_id_descending_regardless_of_insert_order() {
    let conn = open_db_in_memory().unwrap();
    for (id, email) in [(5, "e@x.io"), (2, "b@x.io"), (9, "i@x.io"), (7, "g@x.io")] {
        conn.execute(
            "INSERT INTO users (id, name, email) VALUES (?1, 'n', ?2);",
            rusqlite::params![id, email],
        )
        .unwrap();
    }
    let store = RecordStore::untyped(&conn, "users").unwrap();

    assert_eq!(ids(&store.get_all().unwrap()), [9, 7, 5, 2]);
}

#[test]
fn update_only_touches_given_columns() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();
    let before = store.get_by_id(3).unwrap().unwrap();

    let after = store
        .update(3, &Payload::new().set(ident("name"), "X".to_string()))
        .unwrap()
        .unwrap();

    assert_eq!(after.get_str("name"), Some("X"));
    assert_eq!(after.get("email"), before.get("email"));
    assert_eq!(after.get("created_at"), before.get("created_at"));
}

#[test]
fn update_with_empty_payload_fails_fast() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();
    let before = store.get_by_id(1).unwrap();

    let err = store.update(1, &Payload::new()).unwrap_err();
    assert!(matches!(err, StoreError::EmptyPayload));
    assert_eq!(store.get_by_id(1).unwrap(), before);
}

#[test]
fn update_missing_row_returns_none() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();

    let result = store.update(99, &user_payload("Ghost", "ghost@example.com"));
    assert!(result.unwrap().is_none());
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn find_by_returns_all_matches_or_empty() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();
    store
        .create(&user_payload("John Doe", "john2@example.com"))
        .unwrap();

    let johns = store.find_by(ident("name"), "John Doe").unwrap();
    assert_eq!(johns.len(), 2);
    assert!(store.find_by(ident("name"), "Nobody").unwrap().is_empty());
    assert!(store
        .find_one_by(ident("email"), "nobody@example.com")
        .unwrap()
        .is_none());
}

#[test]
fn exists_follows_get_by_id() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();

    assert!(store.exists(2).unwrap());
    assert!(!store.exists(20).unwrap());
    assert!(store.exists("2").unwrap());
}

#[test]
fn constraint_violation_propagates_as_storage_error() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();

    let err = store
        .create(&user_payload("Dup", "john@example.com"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Db(_)));
    assert!(err.is_constraint_violation());
    assert!(err.is_unique_violation());

    let missing_name = store
        .create(&Payload::new().set(ident("email"), "nameless@example.com".to_string()))
        .unwrap_err();
    assert!(missing_name.is_constraint_violation());
    assert!(!missing_name.is_unique_violation());
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn unknown_column_surfaces_as_storage_error() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();

    let err = store.find_by(ident("nickname"), "x").unwrap_err();
    assert!(matches!(err, StoreError::Db(_)));
    assert!(!err.is_constraint_violation());

    let err = store
        .create(&Payload::new().set(ident("nickname"), "x".to_string()))
        .unwrap_err();
    assert!(matches!(err, StoreError::Db(_)));
}

#[test]
fn create_with_empty_payload_inserts_defaults() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            body TEXT NOT NULL DEFAULT 'untitled'
        );",
    )
    .unwrap();
    let store = RecordStore::untyped(&conn, "notes").unwrap();

    let row = store.create(&Payload::new()).unwrap().unwrap();
    assert_eq!(row.get_i64("id"), Some(1));
    assert_eq!(row.get_str("body"), Some("untitled"));
}

#[test]
fn raw_queries_bind_values_positionally() {
    let conn = seeded();
    let store = RecordStore::untyped(&conn, "users").unwrap();

    let rows = store
        .query(
            "SELECT id, name FROM users WHERE id >= ?1 ORDER BY id ASC",
            [2],
        )
        .unwrap();
    assert_eq!(ids(&rows), [2, 3]);
    assert_eq!(rows[0].len(), 2);

    let alice = store
        .query_one(
            "SELECT name FROM users WHERE email = ?1",
            ["alice@example.com"],
        )
        .unwrap()
        .unwrap();
    assert_eq!(alice.get_str("name"), Some("Alice Johnson"));

    let none = store
        .query_one("SELECT * FROM users WHERE id = ?1", [42])
        .unwrap();
    assert!(none.is_none());

    let injected = store
        .query("SELECT * FROM users WHERE name = ?1", ["x' OR '1'='1"])
        .unwrap();
    assert!(injected.is_empty());
}

#[test]
fn construction_checks_table_invariant() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tags (name TEXT PRIMARY KEY);
         CREATE TABLE pairs (id INTEGER, other INTEGER, PRIMARY KEY (id, other));
         CREATE TABLE codes (id TEXT PRIMARY KEY, label TEXT);
         CREATE TABLE legacy (id INT PRIMARY KEY, label TEXT);
         CREATE TABLE compact (id INTEGER PRIMARY KEY, label TEXT) WITHOUT ROWID;
         CREATE TABLE notes (id integer primary key, label TEXT);",
    )
    .unwrap();

    assert!(matches!(
        RecordStore::untyped(&conn, "missing"),
        Err(StoreError::MissingRequiredTable(table)) if table == "missing"
    ));
    assert!(matches!(
        RecordStore::untyped(&conn, "tags"),
        Err(StoreError::MissingRequiredColumn { column: "id", .. })
    ));
    assert!(matches!(
        RecordStore::untyped(&conn, "pairs"),
        Err(StoreError::MissingRequiredColumn { column: "id", .. })
    ));
    for table in ["codes", "legacy", "compact"] {
        assert!(
            matches!(
                RecordStore::untyped(&conn, table),
                Err(StoreError::MissingRequiredColumn { column: "id", .. })
            ),
            "{table} has no rowid-backed id"
        );
    }
    let notes = RecordStore::untyped(&conn, "notes").unwrap();
    let row = notes
        .create(&Payload::new().set(ident("label"), "first".to_string()))
        .unwrap()
        .unwrap();
    assert_eq!(row.get_i64("id"), Some(1));
    assert!(matches!(
        RecordStore::untyped(&conn, "users; DROP TABLE users"),
        Err(StoreError::InvalidIdentifier(_))
    ));
}

#[test]
fn typed_store_decodes_users() {
    let conn = seeded();
    let store = RecordStore::<Users>::open_table(&conn).unwrap();
    assert_eq!(store.table(), "users");

    let created = store
        .create(
            &Payload::new()
                .set(UserColumn::Email, "ada@example.com".to_string())
                .set(UserColumn::Name, "Ada".to_string()),
        )
        .unwrap()
        .unwrap();
    assert_eq!(created.id, 4);
    assert_eq!(created.name, "Ada");
    assert!(created.created_at.is_some());

    let jane = store
        .find_one_by(UserColumn::Email, "jane@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(jane.id, 2);
    assert_eq!(jane.name, "Jane Smith");

    let names: Vec<String> = store
        .get_all()
        .unwrap()
        .into_iter()
        .map(|user| user.name)
        .collect();
    assert_eq!(names, ["Ada", "Alice Johnson", "Jane Smith", "John Doe"]);
}

#[test]
fn typed_raw_query_requires_full_user_columns() {
    let conn = seeded();
    let store = RecordStore::<Users>::open_table(&conn).unwrap();

    let err = store
        .query("SELECT id, name FROM users", [])
        .unwrap_err();
    assert!(matches!(err, StoreError::Db(_)));
}

#[test]
fn undecodable_user_value_is_invalid_data() {
    let conn = seeded();
    conn.execute(
        "INSERT INTO users (name, email) VALUES (x'00ff', 'blob@example.com')",
        [],
    )
    .unwrap();
    let store = RecordStore::<Users>::open_table(&conn).unwrap();

    let err = store.get_by_id(4).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(ref detail) if detail.contains("name")));
    assert!(matches!(
        store.get_all().unwrap_err(),
        StoreError::InvalidData(_)
    ));
    assert_eq!(store.get_by_id(1).unwrap().unwrap().name, "John Doe");
}

#[test]
fn stores_share_a_mutex_guarded_connection_across_threads() {
    let conn = Mutex::new(open_db_in_memory().unwrap());

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let conn = &conn;
            scope.spawn(move || {
                for index in 0..5 {
                    let guard = conn.lock().unwrap();
                    let store = RecordStore::untyped(&guard, "users").unwrap();
                    let email = format!("w{worker}-{index}@example.com");
                    let row = store.create(&user_payload("Worker", &email)).unwrap();
                    assert_eq!(row.unwrap().get_str("email"), Some(email.as_str()));
                }
            });
        }
    });

    let guard = conn.lock().unwrap();
    let store = RecordStore::untyped(&guard, "users").unwrap();
    assert_eq!(store.count().unwrap(), 20);
}
