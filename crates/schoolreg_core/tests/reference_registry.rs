use schoolreg_core::db::open_db_in_memory;
use schoolreg_core::{
    EntityKind, Gender, Lookup, SchoolRegistry, ServiceError, SqliteStore, Store, StudentDraft,
    TeacherDraft, ValidationError,
};

fn sqlite_registry() -> SchoolRegistry<SqliteStore> {
    SchoolRegistry::new(SqliteStore::try_new(open_db_in_memory().unwrap()).unwrap())
}

fn student_in(city: &str) -> StudentDraft {
    StudentDraft {
        firstname: "Maria".to_string(),
        lastname: "Papadopoulou".to_string(),
        gender: Gender::Female,
        birthdate: None,
        city: Some(city.to_string()),
        username: None,
    }
}

fn check_duplicate_city_is_rejected<S: Store>(registry: SchoolRegistry<S>) {
    let athens = registry.cities().create("Athens").unwrap();
    assert!(athens.id > 0);

    let err = registry.cities().create("Athens").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Duplicate { kind: EntityKind::City, ref key } if key == "Athens"
    ));

    let all = registry.cities().list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], athens);
}

#[test]
fn duplicate_city_is_rejected_in_sqlite() {
    check_duplicate_city_is_rejected(sqlite_registry());
}

#[test]
fn duplicate_city_is_rejected_in_memory() {
    check_duplicate_city_is_rejected(SchoolRegistry::in_memory());
}

#[test]
fn city_names_are_case_sensitive() {
    let registry = sqlite_registry();
    registry.cities().create("Patra").unwrap();

    assert!(registry.cities().create("patra").is_ok());
    assert_eq!(registry.cities().list_all().unwrap().len(), 2);
}

#[test]
fn created_city_is_found_by_id_and_name() {
    let registry = sqlite_registry();
    let larissa = registry.cities().create("Larissa").unwrap();

    assert_eq!(registry.cities().get_by_id(larissa.id).unwrap(), larissa);
    assert_eq!(registry.cities().get_by_name("Larissa").unwrap(), larissa);

    let err = registry.cities().get_by_name("Volos").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::City,
            lookup: Lookup::Key(_)
        }
    ));
}

#[test]
fn city_name_length_is_validated() {
    let registry = sqlite_registry();

    let err = registry.cities().create("Xa").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::Length { field: "name", .. })
    ));
    assert!(matches!(
        registry.cities().list_all().unwrap_err(),
        ServiceError::EmptyCollection {
            kind: EntityKind::City
        }
    ));
}

#[test]
fn rename_keeps_holders_pointing_at_the_city() {
    let registry = sqlite_registry();
    let city = registry.cities().create("Salonica").unwrap();
    let student = registry.students().insert(student_in("Salonica")).unwrap();

    let renamed = registry.cities().rename(city.id, "Thessaloniki").unwrap();

    assert_eq!(renamed.name, "Thessaloniki");
    assert_eq!(renamed.students(), &[student.id]);
    assert_eq!(
        registry.students().get_by_id(student.id).unwrap().city(),
        Some(city.id)
    );
    assert!(registry.cities().get_by_name("Salonica").is_err());
}

#[test]
fn rename_to_a_taken_name_fails() {
    let registry = sqlite_registry();
    registry.cities().create("Athens").unwrap();
    let patra = registry.cities().create("Patra").unwrap();

    let err = registry.cities().rename(patra.id, "Athens").unwrap_err();
    assert!(matches!(err, ServiceError::Duplicate { .. }));

    // Renaming to its own current name is allowed.
    assert!(registry.cities().rename(patra.id, "Patra").is_ok());
}

#[test]
fn rename_of_unknown_city_fails() {
    let registry = sqlite_registry();

    let err = registry.cities().rename(404, "Nowhere").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::City,
            lookup: Lookup::Id(404)
        }
    ));
}

#[test]
fn city_delete_clears_student_references() {
    let registry = sqlite_registry();
    let athens = registry.cities().create("Athens").unwrap();
    let student = registry.students().insert(student_in("Athens")).unwrap();

    let deleted = registry.cities().delete(athens.id).unwrap();

    assert_eq!(deleted.students(), &[student.id]);
    let reloaded = registry.students().get_by_id(student.id).unwrap();
    assert_eq!(reloaded.city(), None);
    assert!(registry.cities().get_by_id(athens.id).is_err());
    assert!(registry.audit().unwrap().is_empty());
}

#[test]
fn speciality_delete_clears_teacher_references() {
    let registry = SchoolRegistry::in_memory();
    let physics = registry.specialities().create("Physics").unwrap();
    let teacher = registry
        .teachers()
        .insert(TeacherDraft {
            ssn: "654321".to_string(),
            firstname: "Nikos".to_string(),
            lastname: "Georgiou".to_string(),
            speciality: Some("Physics".to_string()),
            username: None,
        })
        .unwrap();
    assert_eq!(
        registry.specialities().get_by_id(physics.id).unwrap().teachers(),
        &[teacher.id]
    );

    registry.specialities().delete(physics.id).unwrap();

    assert_eq!(registry.teachers().get_by_id(teacher.id).unwrap().speciality(), None);
    assert!(registry.audit().unwrap().is_empty());
}

#[test]
fn speciality_duplicate_and_empty_listing() {
    let registry = SchoolRegistry::in_memory();
    assert!(matches!(
        registry.specialities().list_all().unwrap_err(),
        ServiceError::EmptyCollection {
            kind: EntityKind::Speciality
        }
    ));

    registry.specialities().create("Maths").unwrap();
    let err = registry.specialities().create("Maths").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Duplicate {
            kind: EntityKind::Speciality,
            ..
        }
    ));
}
