//! Integration tests for the SQLite domain repository.

mod common;

use common::*;
use sitegate_core::Domain;
use sitegate_metadata::MetadataError;

#[tokio::test]
async fn test_select_all_enabled_domains_orders_by_position_then_name() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    let mut zeta = Domain::new("zeta.example.com", "Zeta");
    zeta.position = 1;
    let mut alpha = Domain::new("alpha.example.com", "Alpha");
    alpha.position = 1;
    let mut first = Domain::new("first.example.com", "First");
    first.position = 0;
    let mut disabled = Domain::new("off.example.com", "Off");
    disabled.is_enabled = false;

    for domain in [&zeta, &alpha, &first, &disabled] {
        store.create_domain(&row(domain)).await.expect("Create failed");
    }

    let rows = store
        .select_all_enabled_domains()
        .await
        .expect("Select failed");
    assert_eq!(ids(&rows), vec![first.id, alpha.id, zeta.id]);
}

#[tokio::test]
async fn test_select_all_enabled_domains_empty_store() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let rows = metadata
        .store()
        .select_all_enabled_domains()
        .await
        .expect("Select failed");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_retrieve_by_domain_matches_enabled_host_only() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    let site = Domain::new("a.example.com", "A");
    let mut disabled = Domain::new("b.example.com", "B");
    disabled.is_enabled = false;
    store.create_domain(&row(&site)).await.unwrap();
    store.create_domain(&row(&disabled)).await.unwrap();

    let found = store
        .retrieve_by_domain("a.example.com")
        .await
        .expect("Lookup failed")
        .expect("Domain not found");
    assert_eq!(found.domain_id, site.id.as_str());

    assert!(store.retrieve_by_domain("b.example.com").await.unwrap().is_none());
    assert!(store.retrieve_by_domain("c.example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_retrieve_by_domain_duplicate_host_is_constraint_error() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    store
        .create_domain(&row(&Domain::new("dup.example.com", "One")))
        .await
        .unwrap();
    store
        .create_domain(&row(&Domain::new("dup.example.com", "Two")))
        .await
        .unwrap();

    let err = store.retrieve_by_domain("dup.example.com").await.unwrap_err();
    assert!(matches!(err, MetadataError::Constraint(_)));
}

#[tokio::test]
async fn test_retrieve_by_master_returns_first_enabled_master() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    assert!(store.retrieve_by_master().await.unwrap().is_none());

    let mut disabled_master = master_domain("old.example.com", "Old");
    disabled_master.is_enabled = false;
    disabled_master.position = 0;
    let master = master_domain("www.example.com", "Main");
    store.create_domain(&row(&disabled_master)).await.unwrap();
    store.create_domain(&row(&master)).await.unwrap();

    let found = store.retrieve_by_master().await.unwrap().expect("No master");
    assert_eq!(found.domain_id, master.id.as_str());
}

#[tokio::test]
async fn test_create_domain_rejects_duplicates() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    let domain = Domain::new("a.example.com", "Shop");
    store.create_domain(&row(&domain)).await.unwrap();

    let err = store.create_domain(&row(&domain)).await.unwrap_err();
    assert!(matches!(err, MetadataError::AlreadyExists(_)));

    // Same name gives the same keyname.
    let clash = Domain::new("b.example.com", "Shop");
    let err = store.create_domain(&row(&clash)).await.unwrap_err();
    match err {
        MetadataError::AlreadyExists(msg) => assert!(msg.contains("shop")),
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
}

#[tokio::test]
async fn test_domain_roundtrip_through_store() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    let master = master_domain("www.example.com", "Main");
    let fr = translation_domain(&master, "fr.example.com", "fr");
    store.create_domain(&row(&master)).await.unwrap();
    store.create_domain(&row(&fr)).await.unwrap();

    let loaded = store
        .get_domain(fr.id.as_str())
        .await
        .unwrap()
        .expect("Domain not found")
        .into_domain()
        .expect("Invalid row");
    assert_eq!(loaded.master_id, Some(master.id.clone()));
    assert!(loaded.is_translate);
    assert_eq!(loaded.language.as_deref(), Some("fr"));
    assert_eq!(loaded.keyname(), fr.keyname());

    let by_keyname = store
        .get_domain_by_keyname("main")
        .await
        .unwrap()
        .expect("Keyname not found");
    assert_eq!(by_keyname.domain_id, master.id.as_str());
}

#[tokio::test]
async fn test_update_domain() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    let mut domain = Domain::new("a.example.com", "A");
    store.create_domain(&row(&domain)).await.unwrap();

    domain.redirect_url = Some("https://b.example.com".to_string());
    domain.position = 7;
    store.update_domain(&row(&domain)).await.expect("Update failed");

    let loaded = store.get_domain(domain.id.as_str()).await.unwrap().unwrap();
    assert_eq!(loaded.redirect_url.as_deref(), Some("https://b.example.com"));
    assert_eq!(loaded.position, 7);

    let missing = Domain::new("missing.example.com", "Missing");
    let err = store.update_domain(&row(&missing)).await.unwrap_err();
    assert!(matches!(err, MetadataError::NotFound(_)));
}

#[tokio::test]
async fn test_update_domain_rejects_keyname_of_other_domain() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    let first = Domain::new("a.example.com", "First");
    let mut second = Domain::new("b.example.com", "Second");
    store.create_domain(&row(&first)).await.unwrap();
    store.create_domain(&row(&second)).await.unwrap();

    second.set_keyname(Some("first"));
    let err = store.update_domain(&row(&second)).await.unwrap_err();
    assert!(matches!(err, MetadataError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_delete_domain_detaches_virtual_children() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    let master = master_domain("www.example.com", "Main");
    let staging = env_domain(&master, "staging.example.com", "staging");
    store.create_domain(&row(&master)).await.unwrap();
    store.create_domain(&row(&staging)).await.unwrap();

    store
        .delete_domain(master.id.as_str())
        .await
        .expect("Delete failed");

    assert!(store.get_domain(master.id.as_str()).await.unwrap().is_none());
    let orphan = store
        .get_domain(staging.id.as_str())
        .await
        .unwrap()
        .expect("Child was deleted");
    assert!(orphan.master_id.is_none());

    let err = store.delete_domain(master.id.as_str()).await.unwrap_err();
    assert!(matches!(err, MetadataError::NotFound(_)));
}

#[tokio::test]
async fn test_list_domains_includes_disabled() {
    let metadata = TestMetadata::new().await.expect("Failed to create metadata");
    let store = metadata.store();

    let mut disabled = Domain::new("off.example.com", "Off");
    disabled.is_enabled = false;
    store.create_domain(&row(&disabled)).await.unwrap();

    assert_eq!(store.list_domains().await.unwrap().len(), 1);
    assert!(store.select_all_enabled_domains().await.unwrap().is_empty());
}
