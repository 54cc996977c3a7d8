//! Record lifecycle against real directories.

use flexdb_core::{
    Collection, CollectionOptions, CoreError, Pool, RecordExt, RecordId, Uniqid,
};
use flexdb_testkit::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

fn sample_person(pool: &Pool) -> Person {
    let mut person = pool.collection::<Person>().create();
    person.name = "Juan Green".to_string();
    person.birth_year = 2002;
    person.contact.mail = "thomas15@yahoo.com".to_string();
    person
}

#[test]
fn commit_then_load_round_trips() {
    with_temp_pool(|pool| {
        let person = sample_person(pool);
        assert!(person.commit().unwrap());

        let loaded = pool
            .collection::<Person>()
            .load(person.id())
            .unwrap()
            .unwrap();
        assert_eq!(loaded, person);
        assert_eq!(loaded.id(), RecordId::new(10_001));
        assert_eq!(loaded.uniqid(), person.id().identity());
    });
}

#[test]
fn load_of_missing_record_is_none() {
    with_temp_pool(|pool| {
        let persons = pool.collection::<Person>();
        assert!(persons.load(RecordId::new(42)).unwrap().is_none());
    });
}

#[test]
fn ids_increase_and_deleted_ids_are_not_reissued() {
    with_temp_pool(|pool| {
        let logs = pool.collection::<Log>();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let log = logs.create();
            assert!(log.commit().unwrap());
            ids.push(log.id());
        }
        assert_eq!(ids, vec![RecordId::new(1), RecordId::new(2), RecordId::new(3)]);

        assert!(logs.delete(RecordId::new(3)).unwrap());
        let log = logs.create();
        assert_eq!(log.id(), RecordId::new(4));
    });
}

#[test]
fn records_created_before_commit_get_distinct_ids() {
    with_temp_pool(|pool| {
        let logs = pool.collection::<Log>();
        let first = logs.create();
        let second = logs.create();
        assert_ne!(first.id(), second.id());

        // Committing out of order keeps both
        assert!(second.commit().unwrap());
        assert!(first.commit().unwrap());
        assert_eq!(logs.count(), 2);
        // Every insert advances the counter, whatever the id
        assert_eq!(logs.handle().next_id(), RecordId::new(4));
    });
}

#[test]
fn full_collection_refuses_commits() {
    with_temp_pool(|pool| {
        let handle = pool.open_handle("tiny", CollectionOptions::new().max_size(2), "Log");
        let logs = Collection::<Log>::new(handle);

        for _ in 0..2 {
            assert!(logs.create().commit().unwrap());
        }
        let extra = logs.create();
        assert!(!extra.commit().unwrap());
        assert_eq!(logs.count(), 2);
        assert!(!logs.exists(extra.id()));

        // Room again after a delete
        assert!(logs.delete(RecordId::new(1)).unwrap());
        assert!(extra.commit().unwrap());
        assert_eq!(logs.count(), 2);
    });
}

#[test]
fn delete_reports_whether_a_file_existed() {
    with_temp_pool(|pool| {
        let person = sample_person(pool);
        person.commit().unwrap();
        let persons = pool.collection::<Person>();
        let path = persons.handle().path_to_object(person.id());
        assert!(path.is_file());
        assert_eq!(persons.count(), 1);

        assert!(person.delete().unwrap());
        assert!(!path.exists());
        assert_eq!(persons.count(), 0);

        assert!(!person.delete().unwrap());
        assert_eq!(persons.count(), 0);
    });
}

#[test]
fn delete_middle_then_insert() {
    let (test_pool, ids) = scenarios::deleted_middle();
    let logs = test_pool.collection::<Log>();

    let all = logs.load_all().unwrap();
    let remaining: Vec<RecordId> = all.keys().copied().collect();
    assert_eq!(remaining, vec![ids[0], ids[2]]);

    let log = logs.create();
    assert!(log.commit().unwrap());
    assert_eq!(log.id(), RecordId::new(4));
}

#[test]
fn nested_collection_names() {
    with_temp_dir_pool(|pool, root| {
        let logs = pool.collection::<Log>();
        let mut log = logs.create();
        log.kind = "rotate".to_string();
        log.date = "2024-01-01".to_string();
        assert!(log.commit().unwrap());

        let name = LogMessage::collection_for(20_240_101);
        let messages = pool.collection_at::<LogMessage>(&name);
        let mut message = messages.create();
        message.date = 20_240_101;
        message.message = "rotated".to_string();
        assert!(message.commit().unwrap());

        let dir = root.join("logs").join("20240101");
        assert_eq!(messages.handle().path(), dir.as_path());
        assert!(dir.join("20240101.journal").is_file());
        assert!(dir.join("1.object").is_file());
        assert!(root.join("logs").join("logs.journal").is_file());

        // The parent collection does not pick up the child directory
        assert_eq!(logs.load_all().unwrap().len(), 1);
        assert_eq!(messages.load_all().unwrap().len(), 1);
        assert!(root.join("logs").join("logs.select").is_file());
        assert!(dir.join("20240101.select").is_file());
    });
}

#[test]
fn json_rendering() {
    with_temp_pool(|pool| {
        let person = sample_person(pool);
        let parsed: Value = serde_json::from_str(&person.to_json().unwrap()).unwrap();
        assert_eq!(parsed["name"], json!("Juan Green"));
        assert_eq!(parsed["contact"]["mail"], json!("thomas15@yahoo.com"));
        assert_eq!(parsed["id"], json!(10_001));

        let pretty = person.to_json_pretty().unwrap();
        assert!(pretty.starts_with("{\n    \""));
    });
}

#[test]
fn load_merges_and_ignores_unknown_keys() {
    with_temp_pool(|pool| {
        let mut person = sample_person(pool);
        person
            .load(&json!({"contact": {"mail": "new@example.com"}, "shoe_size": 44}))
            .unwrap();
        assert_eq!(person.name, "Juan Green");
        assert_eq!(person.contact.mail, "new@example.com");
        assert!(person.handle().is_ok());
        assert_eq!(person.id(), RecordId::new(10_001));
    });
}

#[test]
fn load_with_wrong_shape_leaves_record_alone() {
    with_temp_pool(|pool| {
        let mut person = sample_person(pool);
        let before = person.clone();
        assert!(person.load(&json!({"birth_year": "soon"})).is_err());
        assert_eq!(person, before);
    });
}

#[test]
fn clone_with_reserves_a_new_id() {
    with_temp_pool(|pool| {
        let person = sample_person(pool);

        let copy = person.clone_with(Some(&json!({"name": "Juan Copy"}))).unwrap();
        assert_eq!(copy.name, "Juan Copy");
        assert_eq!(copy.birth_year, 0);
        assert_eq!(copy.id(), RecordId::new(10_002));
        assert!(copy.commit().unwrap());

        let pinned = person.clone_with(Some(&json!({"id": 10_050}))).unwrap();
        assert_eq!(pinned.id(), RecordId::new(10_050));
    });
}

#[test]
fn unbound_records_cannot_persist() {
    let person = Person::default();
    assert!(matches!(person.commit(), Err(CoreError::RecordUnbound { .. })));
    assert!(matches!(person.select(), Err(CoreError::RecordUnbound { .. })));

    // The pool is gone once the scope ends
    let orphan = {
        let test_pool = TestPool::new();
        let persons = test_pool.collection::<Person>();
        persons.create()
    };
    assert!(matches!(orphan.commit(), Err(CoreError::RecordUnbound { .. })));
}

#[test]
fn pool_registry_lookup() {
    with_temp_pool(|pool| {
        let persons = pool.collection::<Person>();
        let found = pool.handle(persons.uniqid()).unwrap();
        assert!(Arc::ptr_eq(&found, persons.handle()));
        assert_eq!(found.classname(), "Person");

        let unknown = Uniqid::for_path(std::path::Path::new("/nowhere"));
        assert!(matches!(
            pool.handle(unknown),
            Err(CoreError::CollectionNotRegistered { .. })
        ));
    });
}

#[test]
fn missing_directory_is_not_created_when_disabled() {
    let test_pool = TestPool::with_config(|config| config.create_if_missing(false));
    let logs = test_pool.collection::<Log>();
    let log = logs.create();
    assert!(!log.commit().unwrap());
    assert!(!logs.handle().dir().exists());
    assert_eq!(logs.count(), 0);
}

#[test]
fn snapshot_file_is_optional() {
    let test_pool = TestPool::with_config(|config| config.persist_snapshot(false));
    let logs = test_pool.collection::<Log>();
    logs.create().commit().unwrap();
    assert_eq!(logs.load_all().unwrap().len(), 1);
    assert!(!logs.handle().dir().snapshot_path().exists());
    assert!(!logs.handle().has_commits());
}

#[test]
fn profile_of_login() {
    with_temp_pool(|pool| {
        let mut login = pool.collection::<Login>().create();
        login.username = "username_0".to_string();
        login.email = "username_0@example.com".to_string();
        assert!(login.commit().unwrap());
        assert_eq!(login.id(), RecordId::new(10_001));

        let mut profile = pool.collection::<Profile>().create();
        profile.link_login(login.id());
        profile.name = "Mary Alvarez".to_string();
        profile.photo.remote_path = "https://example.com/1.jpg".to_string();
        profile.location.country = "France".to_string();
        assert!(profile.commit().unwrap());

        let found = Profile::for_login(pool, login.id()).unwrap().unwrap();
        assert_eq!(found, profile);
        assert_eq!(found.prop("photo.login_id"), json!(10_001));
        assert_eq!(found.prop("location.country"), json!("France"));

        assert!(Profile::for_login(pool, RecordId::new(9)).unwrap().is_none());
    });
}
