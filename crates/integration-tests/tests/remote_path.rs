//! Requests served by the remote store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use shoebox_admin::images::ImageUpload;
use shoebox_admin::remote::RemoteOutcome;
use shoebox_core::{
    NewProduct, NewUser, Product, ProductId, ProductPatch, Size, SizeRun, StockPatch, User,
    UserId, UserPatch,
};
use shoebox_integration_tests::FakeRemote;

fn alice_row() -> serde_json::Value {
    json!({
        "id": 1,
        "name": "Alice Johnson",
        "gmail": "alice@gmail.com",
        "phone_number": "555-0101",
        "phone2": null,
        "pin": "1234",
        "city": "New York",
        "country": "USA",
        "points": 120,
        "role": "user",
        "created_at": "2024-01-15T10:00:00+00:00"
    })
}

#[tokio::test]
async fn test_list_maps_external_columns() {
    let fake = FakeRemote::start().await;
    fake.seed_row("custom_users", alice_row());
    // Older rows use the legacy column names.
    fake.seed_row(
        "custom_users",
        json!({
            "id": "legacy",
            "name": "Bob Smith",
            "email": "bob@example.com",
            "phone": "555-0102",
            "created_at": "2023-02-20T14:30:00Z"
        }),
    );

    let users = fake.layer().users().list().await.unwrap();
    assert_eq!(users.len(), 2);

    let alice = &users[0];
    assert_eq!(alice.id.as_str(), "1");
    assert_eq!(alice.email, "alice@gmail.com");
    assert_eq!(alice.phone1, "555-0101");
    assert_eq!(alice.phone2, "");

    let bob = &users[1];
    assert_eq!(bob.email, "bob@example.com");
    assert_eq!(bob.phone1, "555-0102");
    assert_eq!(bob.points, 0);
}

#[tokio::test]
async fn test_list_is_newest_first_and_skips_malformed_rows() {
    let fake = FakeRemote::start().await;
    for (id, created_at) in [("a", "2024-01-01T00:00:00Z"), ("c", "2024-03-01T00:00:00Z")] {
        fake.seed_row(
            "products",
            json!({ "id": id, "product_title": id, "price": 1, "sku": id, "created_at": created_at }),
        );
    }
    // No price: cannot become a product.
    fake.seed_row(
        "products",
        json!({ "id": "b", "product_title": "broken", "created_at": "2024-02-01T00:00:00Z" }),
    );

    let ids: Vec<String> = fake
        .layer()
        .products()
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id.into_inner())
        .collect();
    assert_eq!(ids, ["c", "a"]);

    let request = &fake.requests()[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.query["select"], "*");
    assert_eq!(request.query["order"], "created_at.desc");
}

#[tokio::test]
async fn test_create_writes_canonical_columns() {
    let fake = FakeRemote::start().await;
    let layer = fake.layer();

    let created = layer
        .products()
        .create(NewProduct {
            title: "Trainer".to_string(),
            price: Decimal::from(75),
            sku: "SH-100".to_string(),
            stock: SizeRun::default().with(Size::Six, 10),
            ..NewProduct::default()
        })
        .await
        .unwrap();

    assert_eq!(created.id.as_str(), "r1");
    assert_eq!(created.title, "Trainer");
    assert_eq!(created.total_stock(), 10);

    let body = fake.requests()[0].body.clone().unwrap();
    assert_eq!(body["product_title"], "Trainer");
    assert!(body.get("title").is_none());
    assert!(body.get("id").is_none());
    assert!(body.get("created_at").is_none());

    // Served remotely: nothing was written locally.
    assert_eq!(fake.rows("products").len(), 1);
}

#[tokio::test]
async fn test_user_create_uses_gmail_and_phone_number() {
    let fake = FakeRemote::start().await;
    let user = fake
        .layer()
        .users()
        .create(NewUser {
            name: "Eve Adams".to_string(),
            email: "eve@example.com".to_string(),
            phone1: "555-0300".to_string(),
            ..NewUser::default()
        })
        .await
        .unwrap();

    let row = &fake.rows("custom_users")[0];
    assert_eq!(row["gmail"], "eve@example.com");
    assert_eq!(row["phone_number"], "555-0300");
    assert_eq!(user.email, "eve@example.com");
    assert_eq!(user.phone1, "555-0300");
}

#[tokio::test]
async fn test_points_update_remote() {
    let fake = FakeRemote::start().await;
    fake.seed_row("custom_users", alice_row());
    let users = fake.layer().users().clone();

    let before = users.get(&UserId::new("1")).await.unwrap().unwrap();
    let written = users
        .update(&UserId::new("1"), &UserPatch::points(220))
        .await
        .unwrap();
    let after = users.get(&UserId::new("1")).await.unwrap().unwrap();

    assert_eq!(after, User { points: 220, ..before });
    assert_eq!(written, Some(after));
    let patch = fake
        .requests()
        .into_iter()
        .find(|r| r.method == "PATCH")
        .unwrap();
    assert_eq!(patch.query["id"], "eq.1");
    assert_eq!(patch.body.unwrap(), json!({ "points": 220 }));
}

#[tokio::test]
async fn test_password_is_forwarded_to_remote_only() {
    let fake = FakeRemote::start().await;
    fake.seed_row("custom_users", alice_row());
    let layer = fake.layer();

    let patch = UserPatch {
        password: Some(SecretString::from("n3w-passw0rd")),
        ..UserPatch::default()
    };
    layer.users().update(&UserId::new("1"), &patch).await.unwrap();

    assert_eq!(fake.rows("custom_users")[0]["password"], "n3w-passw0rd");
}

#[tokio::test]
async fn test_unknown_ids_are_silent_noops() {
    let fake = FakeRemote::start().await;
    fake.seed_row("custom_users", alice_row());
    let users = fake.layer().users().clone();

    let written = users
        .update(&UserId::new("404"), &UserPatch::points(1))
        .await
        .unwrap();
    assert!(written.is_none());
    users.delete(&UserId::new("404")).await.unwrap();

    assert_eq!(users.list().await.unwrap().len(), 1);
    assert_eq!(fake.rows("custom_users")[0]["points"], 120);
}

#[tokio::test]
async fn test_delete_removes_row() {
    let fake = FakeRemote::start().await;
    fake.seed_row("custom_users", alice_row());
    let users = fake.layer().users().clone();

    users.delete(&UserId::new("1")).await.unwrap();
    assert!(users.list().await.unwrap().is_empty());
    assert!(fake.rows("custom_users").is_empty());
}

#[tokio::test]
async fn test_image_upload_returns_public_url() {
    let fake = FakeRemote::start().await;
    let layer = fake.layer();

    let url = layer
        .upload_image(ImageUpload::new("Trainer.PNG", vec![0x89, b'P', b'N', b'G']))
        .await
        .unwrap();

    let prefix = format!("{}/storage/v1/object/public/products/products/", fake.base_url);
    let name = url.strip_prefix(&prefix).unwrap();
    assert!(name.ends_with(".png"));

    let (content_type, bytes) = fake.object(&format!("products/products/{name}")).unwrap();
    assert_eq!(content_type, "image/png");
    assert_eq!(bytes, [0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_adapter_reports_outcomes() {
    let fake = FakeRemote::start().await;
    let client = fake.client();

    assert_eq!(client.list::<Product>().await, RemoteOutcome::Success(Vec::new()));

    fake.fail_with(Some(StatusCode::UNPROCESSABLE_ENTITY));
    assert!(matches!(
        client.delete::<Product>(&ProductId::new("1")).await,
        RemoteOutcome::Invalid(_)
    ));

    fake.fail_with(Some(StatusCode::SERVICE_UNAVAILABLE));
    assert!(matches!(
        client.list::<User>().await,
        RemoteOutcome::Unavailable(_)
    ));
}

#[tokio::test]
async fn test_size_update_sends_only_that_column() {
    let fake = FakeRemote::start().await;
    fake.seed_row(
        "products",
        json!({
            "id": "r4",
            "product_title": "Court",
            "price": 90,
            "sku": "SH-4",
            "size_6": 2,
            "size_10": 1,
            "created_at": "2024-01-15T10:00:00Z"
        }),
    );
    let products = fake.layer().products().clone();

    let patch = ProductPatch {
        stock: StockPatch::default().with(Size::Ten, 3),
        ..ProductPatch::default()
    };
    let written = products
        .update(&ProductId::new("r4"), &patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(written.stock.get(Size::Six), 2);
    assert_eq!(written.stock.get(Size::Ten), 3);

    let request = fake
        .requests()
        .into_iter()
        .find(|r| r.method == "PATCH")
        .unwrap();
    assert_eq!(request.body.unwrap(), json!({ "size_10": 3 }));
}

#[tokio::test]
async fn test_award_reads_and_writes_remote() {
    let fake = FakeRemote::start().await;
    fake.seed_row("custom_users", alice_row());

    let awarded = fake
        .layer()
        .users()
        .award_points(&UserId::new("1"), 100)
        .await
        .unwrap();
    assert_eq!(awarded.points, 220);
    assert_eq!(awarded.email, "alice@gmail.com");
    assert_eq!(fake.rows("custom_users")[0]["points"], 220);

    let err = fake
        .layer()
        .users()
        .award_points(&UserId::new("404"), 100)
        .await
        .unwrap_err();
    assert!(matches!(err, shoebox_admin::DataError::NotFound { .. }));
}
