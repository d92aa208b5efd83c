use schoolreg_core::db::open_db_in_memory;
use schoolreg_core::{
    EntityKind, Gender, SchoolRegistry, ServiceError, SqliteStore, StudentDraft, UserOwner,
};

fn registry() -> SchoolRegistry<SqliteStore> {
    SchoolRegistry::new(SqliteStore::try_new(open_db_in_memory().unwrap()).unwrap())
}

fn student_with_user(username: &str) -> StudentDraft {
    StudentDraft {
        firstname: "Eleni".to_string(),
        lastname: "Kostas".to_string(),
        gender: Gender::Female,
        birthdate: None,
        city: None,
        username: Some(username.to_string()),
    }
}

#[test]
fn register_lowercases_username() {
    let registry = registry();

    let user = registry.users().register("Alice", "h1").unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(registry.users().find_by_username("alice").unwrap(), user);
    assert!(registry.users().find_by_username("Alice").is_err());
}

#[test]
fn register_rejects_case_insensitive_duplicate() {
    let registry = registry();
    registry.users().register("alice", "h1").unwrap();

    let err = registry.users().register("ALICE", "h2").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Duplicate { kind: EntityKind::User, ref key } if key == "alice"
    ));
    assert_eq!(registry.users().list_all().unwrap().len(), 1);
}

#[test]
fn change_password_keeps_username() {
    let registry = registry();
    let user = registry.users().register("bob", "old-hash").unwrap();

    let changed = registry.users().change_password(user.id, "new-hash").unwrap();

    assert_eq!(changed.username, "bob");
    assert_eq!(changed.password_hash, "new-hash");
    assert_eq!(registry.users().get_by_id(user.id).unwrap().password_hash, "new-hash");
}

#[test]
fn change_password_of_unknown_user_fails() {
    let registry = registry();

    let err = registry.users().change_password(9, "x").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::User,
            ..
        }
    ));
}

#[test]
fn find_by_prefix_lists_matches_or_fails_when_empty() {
    let registry = registry();
    registry.users().register("anna", "h").unwrap();
    registry.users().register("andreas", "h").unwrap();
    registry.users().register("bill", "h").unwrap();

    let found = registry.users().find_by_prefix("an").unwrap();
    let mut names: Vec<_> = found.into_iter().map(|user| user.username).collect();
    names.sort();
    assert_eq!(names, vec!["andreas", "anna"]);

    assert!(matches!(
        registry.users().find_by_prefix("zz").unwrap_err(),
        ServiceError::EmptyCollection {
            kind: EntityKind::User
        }
    ));
}

#[test]
fn remove_unowned_user() {
    let registry = registry();
    let user = registry.users().register("carol", "h").unwrap();

    let removed = registry.users().remove(user.id).unwrap();

    assert_eq!(removed, user);
    assert!(registry.users().get_by_id(user.id).is_err());
}

#[test]
fn owned_user_cannot_be_removed() {
    let registry = registry();
    registry.users().register("eleni", "h").unwrap();
    let student = registry.students().insert(student_with_user("eleni")).unwrap();
    let user_id = student.user().unwrap();

    let err = registry.users().remove(user_id).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::StillOwned {
            kind: EntityKind::User,
            owner: UserOwner::Student(id),
            ..
        } if id == student.id
    ));
    assert!(registry.users().get_by_id(user_id).is_ok());
}

#[test]
fn user_cannot_be_claimed_twice() {
    let registry = registry();
    registry.users().register("eleni", "h").unwrap();
    registry.students().insert(student_with_user("eleni")).unwrap();

    let err = registry
        .students()
        .insert(student_with_user("eleni"))
        .unwrap_err();

    assert!(matches!(err, ServiceError::UserAlreadyOwned { .. }));
    assert_eq!(registry.students().list_all().unwrap().len(), 1);
}

#[test]
fn username_and_password_length_are_validated() {
    let registry = registry();

    assert!(matches!(
        registry.users().register("ab", "h").unwrap_err(),
        ServiceError::Validation(_)
    ));
    assert!(matches!(
        registry.users().register("abc", "").unwrap_err(),
        ServiceError::Validation(_)
    ));
}

#[test]
fn password_hash_is_not_printed_by_debug() {
    let registry = registry();
    let user = registry.users().register("dora", "secret-hash").unwrap();

    assert!(!format!("{user:?}").contains("secret-hash"));
}
