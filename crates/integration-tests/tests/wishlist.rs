//! Wishlist operations.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use cartwheel_integration_tests::{TestServer, json_body};

async fn setup() -> (TestServer, String, i64) {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let id = server
        .create_product(
            &admin,
            &json!({ "name": "Kettle", "price": 30.0, "quantity": 2, "inventory_status": "INSTOCK" }),
        )
        .await;
    let shopper = server.login_as("ann", "ann@shop.test").await;
    (server, shopper, id)
}

async fn add(server: &TestServer, token: &str, body: &Value) -> (StatusCode, Value) {
    let resp = server
        .post("/wishlist/items")
        .bearer_auth(token)
        .json(body)
        .send()
        .await
        .unwrap();
    (resp.status(), json_body(resp).await)
}

#[tokio::test]
async fn test_add_is_idempotent() {
    let (server, shopper, id) = setup().await;

    let (status, first) = add(&server, &shopper, &json!({ "product_id": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["total_items"], json!(1));
    assert_eq!(first["items"][0]["product_id"], json!(id));
    assert_eq!(first["items"][0]["product_name"], json!("Kettle"));
    assert_eq!(first["items"][0]["product_price"].as_f64(), Some(30.0));
    assert!(first["items"][0]["added_at"].is_i64());
    assert!(first["created_at"].is_i64());

    let (status, second) = add(&server, &shopper, &json!({ "product_id": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["items"].as_array().unwrap().len(), 1);
    assert_eq!(second["items"][0]["added_at"], first["items"][0]["added_at"]);
}

#[tokio::test]
async fn test_add_requires_a_known_product() {
    let (server, shopper, _) = setup().await;

    let (status, body) = add(&server, &shopper, &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        json!(server.config.messages.wishlist_product_id_null)
    );

    let (status, body) = add(&server, &shopper, &json!({ "product_id": 999_999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Product not found with id: 999999"));
}

#[tokio::test]
async fn test_remove_and_clear() {
    let (server, shopper, id) = setup().await;

    let resp = server
        .delete(&format!("/wishlist/items/{id}"))
        .bearer_auth(&shopper)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(
        body["message"],
        json!(format!("Wishlist item not found with productId: {id}"))
    );

    add(&server, &shopper, &json!({ "product_id": id })).await;
    let resp = server
        .delete(&format!("/wishlist/items/{id}"))
        .bearer_auth(&shopper)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["total_items"], json!(0));

    add(&server, &shopper, &json!({ "product_id": id })).await;
    let resp = server
        .delete("/wishlist")
        .bearer_auth(&shopper)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server
        .get("/wishlist")
        .bearer_auth(&shopper)
        .send()
        .await
        .unwrap();
    let wishlist = json_body(resp).await;
    assert!(wishlist["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_wishlist_requires_bearer() {
    let (server, _, _) = setup().await;

    let resp = server.get("/wishlist").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(resp).await;
    assert_eq!(body["path"], json!("/wishlist"));
}
