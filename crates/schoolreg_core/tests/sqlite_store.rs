use schoolreg_core::db::{open_db, open_db_in_memory};
use schoolreg_core::{
    City, EntityKind, RegistryConfig, RepoError, SchoolRegistry, SqliteStore, Store, Teacher,
};

fn store() -> SqliteStore {
    SqliteStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

#[test]
fn save_assigns_increasing_ids() {
    let mut store = store();

    let first = store.save(City::new("Athens")).unwrap();
    let second = store.save(City::new("Patra")).unwrap();

    assert!(first.id > 0);
    assert!(second.id > first.id);
    assert_eq!(store.find_by_id::<City>(first.id).unwrap(), Some(first));
}

#[test]
fn unique_column_conflict_is_translated() {
    let mut store = store();
    store.save(City::new("Athens")).unwrap();

    let err = store.save(City::new("Athens")).unwrap_err();

    assert!(matches!(
        err,
        RepoError::UniqueViolation { kind: EntityKind::City, ref key } if key == "Athens"
    ));
}

#[test]
fn non_unique_constraint_failure_stays_a_db_error() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_city_insert BEFORE INSERT ON cities
         BEGIN
            SELECT RAISE(ABORT, 'cities are read-only');
         END;",
    )
    .unwrap();
    let mut store = SqliteStore::try_new(conn).unwrap();

    let err = store.save(City::new("Athens")).unwrap_err();

    assert!(matches!(err, RepoError::Db(_)), "unexpected error: {err}");
}

#[test]
fn update_of_missing_row_is_not_found() {
    let mut store = store();

    let err = store.save(City::with_id(42, "Ghost")).unwrap_err();

    assert!(matches!(err, RepoError::NotFound { id: 42, .. }));
}

#[test]
fn prefix_lookup_orders_by_key() {
    let mut store = store();
    store.save(Teacher::new("000001", "A", "Papas")).unwrap();
    store.save(Teacher::new("000002", "B", "Papadakis")).unwrap();
    store.save(Teacher::new("000003", "C", "Ioannou")).unwrap();

    let found = store.find_by_prefix::<Teacher>("Papa").unwrap();

    let lastnames: Vec<_> = found.iter().map(|teacher| teacher.lastname.as_str()).collect();
    assert_eq!(lastnames, vec!["Papadakis", "Papas"]);
}

#[test]
fn rollback_discards_writes() {
    let mut store = store();

    store.begin().unwrap();
    store.save(City::new("Athens")).unwrap();
    store.rollback().unwrap();

    assert!(store.find_all::<City>().unwrap().is_empty());
    assert!(matches!(store.commit().unwrap_err(), RepoError::Transaction(_)));
}

#[test]
fn records_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");

    let registry = SchoolRegistry::open(&RegistryConfig::file(&path)).unwrap();
    let athens = registry.cities().create("Athens").unwrap();
    drop(registry);

    let mut reopened = SqliteStore::try_new(open_db(&path).unwrap()).unwrap();
    assert_eq!(
        reopened.find_by_unique_field::<City>("Athens").unwrap(),
        Some(athens.clone())
    );
    reopened.delete_by_id::<City>(athens.id).unwrap();
    assert!(reopened.find_all::<City>().unwrap().is_empty());
}
