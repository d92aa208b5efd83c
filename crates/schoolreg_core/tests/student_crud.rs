use schoolreg_core::db::open_db_in_memory;
use schoolreg_core::model::date::parse_date;
use schoolreg_core::{
    EntityKind, Gender, Lookup, SchoolRegistry, ServiceError, SqliteStore, StudentDraft,
};

fn registry() -> SchoolRegistry<SqliteStore> {
    SchoolRegistry::new(SqliteStore::try_new(open_db_in_memory().unwrap()).unwrap())
}

fn draft(lastname: &str, city: Option<&str>, username: Option<&str>) -> StudentDraft {
    StudentDraft {
        firstname: "Giorgos".to_string(),
        lastname: lastname.to_string(),
        gender: Gender::Male,
        birthdate: Some(parse_date("14-02-2004").unwrap()),
        city: city.map(str::to_string),
        username: username.map(str::to_string),
    }
}

#[test]
fn inserted_student_is_returned_by_get() {
    let registry = registry();
    registry.cities().create("Athens").unwrap();
    registry.users().register("giorgos", "h").unwrap();

    let inserted = registry
        .students()
        .insert(draft("Nikolaou", Some("Athens"), Some("giorgos")))
        .unwrap();

    assert!(inserted.id > 0);
    assert_eq!(inserted.lastname, "Nikolaou");
    assert_eq!(inserted.gender, Gender::Male);
    assert_eq!(registry.students().get_by_id(inserted.id).unwrap(), inserted);

    let user = registry.users().find_by_username("giorgos").unwrap();
    assert_eq!(inserted.user(), Some(user.id));
    assert_eq!(user.student(), Some(inserted.id));
}

#[test]
fn moving_student_between_cities_updates_both_back_references() {
    let registry = registry();
    let athens = registry.cities().create("Athens").unwrap();
    let thessaloniki = registry.cities().create("Thessaloniki").unwrap();
    let student = registry
        .students()
        .insert(draft("Nikolaou", Some("Athens"), None))
        .unwrap();
    assert_eq!(
        registry.cities().get_by_id(athens.id).unwrap().students(),
        &[student.id]
    );

    let moved = registry
        .students()
        .update(student.id, draft("Nikolaou", Some("Thessaloniki"), None))
        .unwrap();

    assert_eq!(moved.city(), Some(thessaloniki.id));
    assert!(registry
        .cities()
        .get_by_id(athens.id)
        .unwrap()
        .students()
        .is_empty());
    assert_eq!(
        registry.cities().get_by_id(thessaloniki.id).unwrap().students(),
        &[student.id]
    );
    assert!(registry.audit().unwrap().is_empty());
}

#[test]
fn insert_with_unknown_city_names_the_missing_reference() {
    let registry = registry();

    let err = registry
        .students()
        .insert(draft("Nikolaou", Some("Atlantis"), None))
        .unwrap_err();

    match err {
        ServiceError::NotFound {
            kind: EntityKind::City,
            lookup: Lookup::Key(key),
        } => assert_eq!(key, "Atlantis"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        registry.students().list_all().unwrap_err(),
        ServiceError::EmptyCollection {
            kind: EntityKind::Student
        }
    ));
}

#[test]
fn insert_with_unknown_username_fails() {
    let registry = registry();

    let err = registry
        .students()
        .insert(draft("Nikolaou", None, Some("ghost")))
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::User,
            lookup: Lookup::Key(_)
        }
    ));
}

#[test]
fn update_replaces_scalar_fields_and_clears_city() {
    let registry = registry();
    registry.cities().create("Athens").unwrap();
    let student = registry
        .students()
        .insert(draft("Nikolaou", Some("Athens"), None))
        .unwrap();

    let mut replacement = draft("Ioannou", None, None);
    replacement.gender = Gender::Female;
    replacement.birthdate = None;
    let updated = registry.students().update(student.id, replacement).unwrap();

    assert_eq!(updated.lastname, "Ioannou");
    assert_eq!(updated.gender, Gender::Female);
    assert_eq!(updated.birthdate, None);
    assert_eq!(updated.city(), None);
    assert!(registry.audit().unwrap().is_empty());
}

#[test]
fn update_switching_user_releases_previous_user() {
    let registry = registry();
    let first = registry.users().register("first", "h").unwrap();
    let second = registry.users().register("second", "h").unwrap();
    let student = registry
        .students()
        .insert(draft("Nikolaou", None, Some("first")))
        .unwrap();

    let updated = registry
        .students()
        .update(student.id, draft("Nikolaou", None, Some("second")))
        .unwrap();

    assert_eq!(updated.user(), Some(second.id));
    assert_eq!(registry.users().get_by_id(first.id).unwrap().owner(), None);
    assert_eq!(
        registry.users().get_by_id(second.id).unwrap().student(),
        Some(student.id)
    );
    assert!(registry.audit().unwrap().is_empty());
}

#[test]
fn update_keeping_own_user_is_allowed() {
    let registry = registry();
    registry.users().register("keeper", "h").unwrap();
    let student = registry
        .students()
        .insert(draft("Nikolaou", None, Some("keeper")))
        .unwrap();

    let updated = registry
        .students()
        .update(student.id, draft("Renamed", None, Some("keeper")))
        .unwrap();

    assert_eq!(updated.user(), student.user());
}

#[test]
fn update_of_unknown_student_fails() {
    let registry = registry();

    let err = registry
        .students()
        .update(77, draft("Nikolaou", None, None))
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::Student,
            lookup: Lookup::Id(77)
        }
    ));
}

#[test]
fn delete_cascades_to_user_and_detaches_city() {
    let registry = registry();
    let athens = registry.cities().create("Athens").unwrap();
    let user = registry.users().register("leaving", "h").unwrap();
    let student = registry
        .students()
        .insert(draft("Nikolaou", Some("Athens"), Some("leaving")))
        .unwrap();

    let deleted = registry.students().delete(student.id).unwrap();

    assert_eq!(deleted.id, student.id);
    assert_eq!(deleted.city(), Some(athens.id));
    assert!(registry.students().get_by_id(student.id).is_err());
    assert!(registry.users().get_by_id(user.id).is_err());
    assert!(registry
        .cities()
        .get_by_id(athens.id)
        .unwrap()
        .students()
        .is_empty());
    assert!(registry.audit().unwrap().is_empty());
}

#[test]
fn lastname_prefix_lookup() {
    let registry = registry();
    registry.students().insert(draft("Papadakis", None, None)).unwrap();
    registry.students().insert(draft("Papas", None, None)).unwrap();
    registry.students().insert(draft("Ioannou", None, None)).unwrap();

    let found = registry.students().find_by_lastname_prefix("Papa").unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|student| student.lastname.starts_with("Papa")));

    assert!(matches!(
        registry.students().find_by_lastname_prefix("Zed").unwrap_err(),
        ServiceError::EmptyCollection { .. }
    ));
}

#[test]
fn failed_update_leaves_student_untouched() {
    let registry = registry();
    registry.cities().create("Athens").unwrap();
    let student = registry
        .students()
        .insert(draft("Nikolaou", Some("Athens"), None))
        .unwrap();

    let mut invalid = draft("", None, None);
    invalid.firstname = "Changed".to_string();
    let err = registry.students().update(student.id, invalid).unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(registry.students().get_by_id(student.id).unwrap(), student);
    assert_eq!(
        registry.cities().get_by_name("Athens").unwrap().students(),
        &[student.id]
    );
}
