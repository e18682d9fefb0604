//! End-to-end CRUD behavior of the mapped store over the in-memory backend.

use docmap::bson::doc;
use docmap::bson::oid::ObjectId;
use docmap::bson::Document;
use docmap::memory::MemoryBackend;
use docmap::prelude::*;
use futures::executor::block_on;

#[derive(Debug, Clone, PartialEq, Default, Mappable)]
struct Profile {
    id: Option<String>,
    name: String,
    age: Option<i32>,
}

impl Profile {
    fn new(name: &str, age: i32) -> Self {
        Profile {
            id: None,
            name: name.to_string(),
            age: Some(age),
        }
    }

    fn with_id(id: &str, origin: &Profile) -> Self {
        Profile {
            id: Some(id.to_string()),
            ..origin.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Mappable)]
struct Book {
    name: String,
    pages: i64,
}

impl Book {
    fn new(name: &str, pages: i64) -> Self {
        Book {
            name: name.to_string(),
            pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Mappable)]
struct Shelf {
    id: Option<String>,
    books: Vec<Book>,
    tags: Vec<String>,
    librarian: Option<Profile>,
}

/// A type with no identity field; updates must be rejected.
#[derive(Debug, Clone, PartialEq, Default, Mappable)]
struct Counter {
    label: String,
    value: i64,
}

fn new_store() -> MappedStore<MemoryBackend> {
    MappedStore::new(MemoryBackend::new())
}

#[test]
fn inserts_updates_and_finds_by_id() {
    block_on(async {
        let store = new_store();

        let profile = Profile::new("bob", 36);
        let id = store.insert(&profile).await.unwrap();

        let profile = Profile::with_id(&id, &profile);
        assert_eq!(store.find_by_id::<Profile>(&id).await.unwrap(), profile);

        let profile = Profile::with_id(&id, &Profile::new("dave", 47));
        store.update(&profile).await.unwrap();
        assert_eq!(store.find_by_id::<Profile>(&id).await.unwrap(), profile);
    });
}

#[test]
fn derived_layout_follows_declaration_order() {
    let store = new_store();
    let layout = store.layout::<Profile>().unwrap();
    assert_eq!(layout.collection(), "Profile");
    let names: Vec<_> = layout
        .fields()
        .iter()
        .map(|field| field.storage_name())
        .collect();
    assert_eq!(names, vec!["_id", "name", "age"]);
}

#[test]
fn update_with_an_unknown_identity_reports_nothing_updated() {
    block_on(async {
        let store = new_store();
        store.insert(&Profile::new("bob", 36)).await.unwrap();

        let stranger = Profile::with_id(&ObjectId::new().to_hex(), &Profile::new("dave", 47));
        assert!(matches!(
            store.update(&stranger).await,
            Err(MappingError::NothingUpdated(_))
        ));
    });
}

#[test]
fn update_requires_an_identity_value() {
    block_on(async {
        let store = new_store();
        assert!(matches!(
            store.update(&Profile::new("bob", 36)).await,
            Err(MappingError::MissingIdentityValue)
        ));
    });
}

#[test]
fn update_rejects_types_without_an_identity_field() {
    block_on(async {
        let store = new_store();
        let counter = Counter {
            label: "visits".to_string(),
            value: 3,
        };
        store.insert(&counter).await.unwrap();

        assert!(matches!(
            store.update(&counter).await,
            Err(MappingError::NoIdentity("Counter"))
        ));
    });
}

#[test]
fn removing_by_identity_makes_the_record_unfindable() {
    block_on(async {
        let store = new_store();
        let id = store.insert(&Profile::new("bob", 36)).await.unwrap();

        assert_eq!(store.remove_by_id::<Profile>(&id).await.unwrap(), 1);
        assert!(matches!(
            store.find_by_id::<Profile>(&id).await,
            Err(MappingError::NotFound(_))
        ));
        assert!(store.find::<Profile>(Document::new()).await.unwrap().is_empty());
    });
}

#[test]
fn removing_by_a_non_matching_predicate_leaves_the_record() {
    block_on(async {
        let store = new_store();
        let profile = Profile::new("bob", 36);
        let id = store.insert(&profile).await.unwrap();

        assert_eq!(
            store.remove::<Profile>(doc! { "name": "bob2" }).await.unwrap(),
            0
        );
        assert_eq!(
            store.remove_field::<Profile>("age", 37).await.unwrap(),
            0
        );
        assert_eq!(
            store.find_by_id::<Profile>(&id).await.unwrap(),
            Profile::with_id(&id, &profile)
        );
    });
}

#[test]
fn removes_by_field_and_by_compound_predicate() {
    block_on(async {
        let store = new_store();
        store.insert(&Profile::new("bob", 36)).await.unwrap();

        assert_eq!(store.remove_field::<Profile>("name", "bob").await.unwrap(), 1);
        assert!(store.find::<Profile>(Document::new()).await.unwrap().is_empty());

        store.insert(&Profile::new("bob", 36)).await.unwrap();
        assert_eq!(
            store
                .remove::<Profile>(doc! { "name": "bob", "age": 36 })
                .await
                .unwrap(),
            1
        );
        assert!(store.find::<Profile>(Document::new()).await.unwrap().is_empty());
    });
}

#[test]
fn shelf_round_trips_nested_structures() {
    block_on(async {
        let store = new_store();

        let shelf = Shelf {
            id: None,
            books: vec![Book::new("Algebra", 496)],
            tags: vec!["math".to_string()],
            librarian: Some(Profile::new("ann", 19)),
        };
        let id = store.insert(&shelf).await.unwrap();

        let shelf = Shelf {
            id: Some(id.clone()),
            ..shelf
        };
        assert_eq!(store.find_by_id::<Shelf>(&id).await.unwrap(), shelf);

        // Grow the lists and swap the embedded profile.
        let shelf = Shelf {
            id: Some(id.clone()),
            books: vec![Book::new("Algebra", 496), Book::new("Geo", 85)],
            tags: vec!["math".to_string(), "geometry".to_string()],
            librarian: Some(Profile::new("jane", 23)),
        };
        store.update(&shelf).await.unwrap();
        assert_eq!(store.find_by_id::<Shelf>(&id).await.unwrap(), shelf);

        // Empty lists reread as empty lists, never as null.
        let shelf = Shelf {
            id: Some(id.clone()),
            books: Vec::new(),
            tags: Vec::new(),
            librarian: None,
        };
        store.update(&shelf).await.unwrap();
        assert_eq!(store.find_by_id::<Shelf>(&id).await.unwrap(), shelf);
    });
}

#[test]
fn documents_omit_identities_at_every_level() {
    let store = new_store();
    let layout = store.layout::<Shelf>().unwrap();

    let document = layout
        .to_document(&Shelf {
            id: Some(ObjectId::new().to_hex()),
            books: vec![Book::new("Algebra", 496)],
            tags: vec!["math".to_string()],
            librarian: Some(Profile::with_id(&ObjectId::new().to_hex(), &Profile::new("ann", 19))),
        })
        .unwrap();

    assert!(document.get("_id").is_none());
    // The embedded profile's own identity is not stored either.
    let librarian = document.get_document("librarian").unwrap();
    assert!(librarian.get("_id").is_none());
    assert_eq!(librarian.get_str("name").unwrap(), "ann");
}

#[test]
fn find_one_distinguishes_not_found_from_ambiguous() {
    block_on(async {
        let store = new_store();

        assert!(matches!(
            store.find_one::<Profile>(doc! { "name": "bob" }).await,
            Err(MappingError::NotFound(_))
        ));

        store.insert(&Profile::new("bob", 36)).await.unwrap();
        store.insert(&Profile::new("bob", 47)).await.unwrap();

        assert!(matches!(
            store.find_one::<Profile>(doc! { "name": "bob" }).await,
            Err(MappingError::Ambiguous { matches: 2, .. })
        ));

        let elder = store
            .find_one_field::<Profile>("age", 47)
            .await
            .unwrap();
        assert_eq!(elder.name, "bob");
        assert_eq!(elder.age, Some(47));
    });
}

#[test]
fn queries_match_fields_and_honor_sort_orders() {
    block_on(async {
        let store = new_store();
        store.insert(&Profile::new("bob", 36)).await.unwrap();
        store.insert(&Profile::new("ann", 19)).await.unwrap();
        store.insert(&Profile::new("jane", 47)).await.unwrap();

        let everyone = store.find::<Profile>(Document::new()).await.unwrap();
        assert_eq!(everyone.len(), 3);

        let bobs = store.find_field::<Profile>("name", "bob").await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].age, Some(36));

        let by_age = store
            .find_sorted::<Profile>(Document::new(), doc! { "age": -1 })
            .await
            .unwrap();
        assert_eq!(
            by_age.iter().map(|profile| profile.age).collect::<Vec<_>>(),
            vec![Some(47), Some(36), Some(19)]
        );
    });
}

#[test]
fn collections_are_isolated_per_type() {
    block_on(async {
        let store = new_store();
        store.insert(&Profile::new("bob", 36)).await.unwrap();
        store
            .insert(&Counter {
                label: "visits".to_string(),
                value: 3,
            })
            .await
            .unwrap();

        assert_eq!(store.find::<Profile>(Document::new()).await.unwrap().len(), 1);
        assert_eq!(store.find::<Counter>(Document::new()).await.unwrap().len(), 1);

        store.remove::<Counter>(Document::new()).await.unwrap();
        assert_eq!(store.find::<Profile>(Document::new()).await.unwrap().len(), 1);
    });
}
