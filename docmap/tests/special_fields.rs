//! Mapping of converter-backed field types and flattened parent types.

use chrono::{DateTime, Utc};
use docmap::bson::Bson;
use docmap::memory::MemoryBackend;
use docmap::prelude::*;
use futures::executor::block_on;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default, Mappable)]
struct Msg {
    id: Option<String>,
    state: String,
    #[mapped(custom)]
    token: Option<Uuid>,
    #[mapped(custom)]
    posted_at: Option<DateTime<Utc>>,
}

#[test]
fn uuid_and_datetime_fields_round_trip() {
    block_on(async {
        let store = MappedStore::new(MemoryBackend::new());

        let msg = Msg {
            id: None,
            state: "CREATED".to_string(),
            token: Some(Uuid::new_v4()),
            posted_at: DateTime::from_timestamp(1_700_000_000, 0),
        };
        let id = store.insert(&msg).await.unwrap();

        let msg = Msg {
            id: Some(id.clone()),
            ..msg
        };
        assert_eq!(store.find_by_id::<Msg>(&id).await.unwrap(), msg);

        // Clearing the converter-backed fields stores nulls, not stale values.
        let msg = Msg {
            id: Some(id.clone()),
            state: "SENT".to_string(),
            token: None,
            posted_at: None,
        };
        store.update(&msg).await.unwrap();
        assert_eq!(store.find_by_id::<Msg>(&id).await.unwrap(), msg);
    });
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Endpoint(String);

#[derive(Debug, Clone, PartialEq, Default, Mappable)]
struct Service {
    id: Option<String>,
    name: String,
    #[mapped(custom)]
    endpoint: Option<Endpoint>,
}

#[test]
fn registered_converter_pairs_round_trip() {
    block_on(async {
        let store = MappedStore::<MemoryBackend>::builder()
            .converter::<Endpoint>(
                "endpoint",
                |endpoint| Ok(Bson::String(endpoint.0.clone())),
                |raw| match raw {
                    Bson::String(text) => Ok(Endpoint(text)),
                    other => Err(MappingError::Decode(format!(
                        "expected endpoint string, found {other}"
                    ))),
                },
            )
            .build(MemoryBackend::new());

        let service = Service {
            id: None,
            name: "search".to_string(),
            endpoint: Some(Endpoint("urn:sample:srv".to_string())),
        };
        let id = store.insert(&service).await.unwrap();

        let service = Service {
            id: Some(id.clone()),
            ..service
        };
        assert_eq!(store.find_by_id::<Service>(&id).await.unwrap(), service);
    });
}

#[derive(Debug, Clone, PartialEq, Default, Mappable)]
struct Tagged {
    id: Option<String>,
    #[mapped(custom)]
    marker: Option<std::time::Duration>,
}

#[test]
fn custom_fields_without_a_converter_fail_at_layout_build() {
    block_on(async {
        let store = MappedStore::new(MemoryBackend::new());
        assert!(matches!(
            store.insert(&Tagged::default()).await,
            Err(MappingError::MissingConverter { field: "marker", .. })
        ));
    });
}

#[derive(Debug, Clone, PartialEq, Default, Mappable)]
struct Person {
    id: Option<String>,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Mappable)]
struct Employee {
    #[mapped(parent)]
    person: Person,
    role: String,
}

#[test]
fn parent_fields_are_stored_alongside_own_fields() {
    let store = MappedStore::new(MemoryBackend::new());
    let layout = store.layout::<Employee>().unwrap();

    assert_eq!(layout.collection(), "Employee");
    let names: Vec<_> = layout
        .fields()
        .iter()
        .map(|field| field.storage_name())
        .collect();
    assert_eq!(names, vec!["_id", "name", "role"]);
}

#[test]
fn inherited_identity_drives_updates() {
    block_on(async {
        let store = MappedStore::new(MemoryBackend::new());

        let employee = Employee {
            person: Person {
                id: None,
                name: "ann".to_string(),
            },
            role: "librarian".to_string(),
        };
        let id = store.insert(&employee).await.unwrap();

        let found = store.find_by_id::<Employee>(&id).await.unwrap();
        assert_eq!(found.person.id, Some(id.clone()));
        assert_eq!(found.person.name, "ann");
        assert_eq!(found.role, "librarian");

        let promoted = Employee {
            role: "manager".to_string(),
            ..found
        };
        store.update(&promoted).await.unwrap();
        assert_eq!(store.find_by_id::<Employee>(&id).await.unwrap(), promoted);
    });
}

#[test]
fn parent_and_subtype_use_separate_collections() {
    block_on(async {
        let store = MappedStore::new(MemoryBackend::new());

        store
            .insert(&Person {
                id: None,
                name: "solo".to_string(),
            })
            .await
            .unwrap();
        store
            .insert(&Employee {
                person: Person {
                    id: None,
                    name: "ann".to_string(),
                },
                role: "librarian".to_string(),
            })
            .await
            .unwrap();

        let people = store
            .find::<Person>(docmap::bson::Document::new())
            .await
            .unwrap();
        let employees = store
            .find::<Employee>(docmap::bson::Document::new())
            .await
            .unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(employees.len(), 1);
    });
}
