//! Requests served by the local fallback store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use shoebox_admin::config::ShoeboxConfig;
use shoebox_admin::fallback::{KeyValueStore, LocalStorage};
use shoebox_admin::images::{ImageUpload, SESSION_PREFIX};
use shoebox_admin::remote::RemoteClient;
use shoebox_admin::services::DataLayer;
use shoebox_admin::DataError;
use shoebox_core::{NewProduct, ProductId, ProductPatch, Size, StockPatch, UserId, UserPatch};
use shoebox_integration_tests::{FakeRemote, unreachable_config};

fn trainer() -> NewProduct {
    NewProduct {
        title: "Trainer".to_string(),
        price: Decimal::from(75),
        sku: "SH-100".to_string(),
        ..NewProduct::default()
    }
}

#[tokio::test]
async fn test_unconfigured_remote_serves_seed() {
    let dir = tempfile::tempdir().unwrap();
    let layer = DataLayer::from_config(&ShoeboxConfig::local_only(dir.path())).unwrap();

    assert_eq!(layer.users().list().await.unwrap().len(), 5);
    assert_eq!(layer.products().list().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_outage_falls_back_to_seed() {
    let fake = FakeRemote::start().await;
    fake.seed_row("products", serde_json::json!({ "id": "remote-only" }));
    fake.fail_with(Some(StatusCode::SERVICE_UNAVAILABLE));

    let products = fake.layer().products().list().await.unwrap();
    let skus: Vec<&str> = products.iter().map(|p| p.sku.as_str()).collect();
    assert_eq!(skus, ["SH-001", "SH-002", "SH-003"]);
}

#[tokio::test]
async fn test_unreachable_remote_falls_back() {
    let client = RemoteClient::new(&unreachable_config()).unwrap();
    let layer = DataLayer::new(Some(client), LocalStorage::memory());

    let created = layer.products().create(trainer()).await.unwrap();
    assert_eq!(created.id.as_str().len(), 9);
    assert_eq!(layer.products().list().await.unwrap()[0], created);
}

#[tokio::test]
async fn test_wrong_api_key_falls_back() {
    let fake = FakeRemote::start().await;
    let mut config = fake.config();
    config.api_key = secrecy::SecretString::from("wrong-key");
    let layer = DataLayer::new(Some(RemoteClient::new(&config).unwrap()), LocalStorage::memory());

    assert_eq!(layer.users().list().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_slow_remote_hits_deadline_and_falls_back() {
    let fake = FakeRemote::start().await;
    fake.delay(Some(Duration::from_secs(5)));
    let config = fake.config().with_timeout(Duration::from_millis(200));
    let layer = DataLayer::new(Some(RemoteClient::new(&config).unwrap()), LocalStorage::memory());

    let started = std::time::Instant::now();
    assert_eq!(layer.users().list().await.unwrap().len(), 5);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_rejected_create_is_served_locally() {
    let fake = FakeRemote::start().await;
    fake.fail_with(Some(StatusCode::BAD_REQUEST));
    let storage = LocalStorage::memory();
    let layer = fake.layer_with(storage.clone());

    let created = layer.products().create(trainer()).await.unwrap();
    assert!(fake.rows("products").is_empty());

    let stored = storage.get("mock_products").await.unwrap().unwrap();
    assert!(stored.contains(created.id.as_str()));
}

#[tokio::test]
async fn test_fallback_writes_persist_across_layers() {
    let dir = tempfile::tempdir().unwrap();
    let config = ShoeboxConfig::local_only(dir.path());

    let first = DataLayer::from_config(&config).unwrap();
    first
        .users()
        .update(&UserId::new("4"), &UserPatch::points(75))
        .await
        .unwrap();
    first.products().delete(&ProductId::new("1")).await.unwrap();

    let second = DataLayer::from_config(&config).unwrap();
    let charlie = second.users().get(&UserId::new("4")).await.unwrap().unwrap();
    assert_eq!(charlie.points, 75);
    assert_eq!(second.products().list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_local_blob_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("mock_users.json"), "[{\"id\": ").unwrap();
    let layer = DataLayer::from_config(&ShoeboxConfig::local_only(dir.path())).unwrap();

    assert!(matches!(
        layer.users().list().await,
        Err(DataError::Fallback(_))
    ));
    // Products live under their own key and are unaffected.
    assert_eq!(layer.products().list().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_remote_down_mid_session() {
    let fake = FakeRemote::start().await;
    let layer = fake.layer();

    let remote = layer.products().create(trainer()).await.unwrap();
    assert_eq!(remote.id.as_str(), "r1");

    fake.fail_with(Some(StatusCode::BAD_GATEWAY));
    let patch = ProductPatch {
        title: Some("Trainer II".to_string()),
        ..ProductPatch::default()
    };
    // Not in the local store: the fallback update is a no-op.
    layer.products().update(&remote.id, &patch).await.unwrap();
    assert_eq!(fake.rows("products")[0]["product_title"], "Trainer");

    // The stores are disjoint; the local one only knows its seed.
    assert_eq!(layer.products().list().await.unwrap().len(), 3);

    fake.fail_with(None);
    let listed = layer.products().list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Trainer");
}

#[tokio::test]
async fn test_image_upload_without_bucket_is_session_only() {
    let fake = FakeRemote::start().await;
    fake.fail_with(Some(StatusCode::SERVICE_UNAVAILABLE));
    let layer = fake.layer();

    let reference = layer
        .upload_image(ImageUpload::new("hero.jpg", vec![0xff, 0xd8]))
        .await
        .unwrap();
    assert!(reference.starts_with(SESSION_PREFIX));
    assert!(layer.images().session().resolve(&reference).await.is_some());

    // A new data layer is a new session.
    let other = fake.layer();
    assert!(other.images().session().resolve(&reference).await.is_none());
}

#[tokio::test]
async fn test_award_fails_when_remote_write_fails_for_remote_only_user() {
    let fake = FakeRemote::start().await;
    fake.seed_row(
        "custom_users",
        serde_json::json!({
            "id": "r9",
            "name": "Remote Rita",
            "points": 120,
            "created_at": "2024-01-15T10:00:00Z"
        }),
    );
    fake.fail_writes(Some(StatusCode::INTERNAL_SERVER_ERROR));
    let layer = fake.layer();

    let err = layer
        .users()
        .award_points(&UserId::new("r9"), 100)
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::NotFound { kind: "user", .. }));

    // The remote row was read but never written.
    assert_eq!(fake.rows("custom_users")[0]["points"], 120);
    let rita = layer.users().get(&UserId::new("r9")).await.unwrap().unwrap();
    assert_eq!(rita.points, 120);
}

#[tokio::test]
async fn test_award_fallback_uses_local_balance() {
    let fake = FakeRemote::start().await;
    fake.seed_row(
        "custom_users",
        serde_json::json!({
            "id": "1",
            "name": "Remote Alice",
            "points": 5000,
            "created_at": "2024-01-15T10:00:00Z"
        }),
    );
    fake.fail_writes(Some(StatusCode::SERVICE_UNAVAILABLE));
    let storage = LocalStorage::memory();
    let layer = fake.layer_with(storage.clone());

    let awarded = layer
        .users()
        .award_points(&UserId::new("1"), 100)
        .await
        .unwrap();
    // Served by the local store: the seed's 120, not the remote 5000.
    assert_eq!(awarded.name, "Alice Johnson");
    assert_eq!(awarded.points, 220);

    let local = DataLayer::new(None, storage);
    let alice = local.users().get(&UserId::new("1")).await.unwrap().unwrap();
    assert_eq!(alice, awarded);
    assert_eq!(fake.rows("custom_users")[0]["points"], 5000);
}

#[tokio::test]
async fn test_update_reports_missing_record_after_fallback() {
    let fake = FakeRemote::start().await;
    fake.seed_row(
        "products",
        serde_json::json!({
            "id": "r4",
            "product_title": "Court",
            "price": 90,
            "sku": "SH-4",
            "created_at": "2024-01-15T10:00:00Z"
        }),
    );
    fake.fail_writes(Some(StatusCode::BAD_GATEWAY));
    let layer = fake.layer();

    let patch = ProductPatch {
        stock: StockPatch::default().with(Size::Ten, 3),
        ..ProductPatch::default()
    };
    let written = layer
        .products()
        .update(&ProductId::new("r4"), &patch)
        .await
        .unwrap();
    assert!(written.is_none());
    assert!(fake.rows("products")[0].get("size_10").is_none());
}
