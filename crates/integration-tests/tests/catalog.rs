//! Catalog reads, admin-gated writes and product codes.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use cartwheel_integration_tests::{TestServer, json_body};

fn lamp() -> Value {
    json!({
        "name": "Desk lamp",
        "description": "Adjustable arm",
        "category": "Lighting",
        "price": 19.99,
        "quantity": 4,
        "inventory_status": "INSTOCK",
        "rating": 4
    })
}

#[tokio::test]
async fn test_admin_gate_on_create() {
    let server = TestServer::spawn().await;
    let shopper = server.login_as("ann", "ann@shop.test").await;
    let admin = server.admin_token().await;

    let resp = server
        .post("/products")
        .bearer_auth(&shopper)
        .json(&lamp())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = json_body(resp).await;
    assert_eq!(body["message"], json!(server.config.admin.message));
    assert_eq!(body["path"], json!("/products"));

    let resp = server
        .post("/products")
        .bearer_auth(&admin)
        .json(&lamp())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["status"], json!(true));
    assert_eq!(body["message"], json!("Product created successfully"));
    let code = body["data"]["code"].as_str().unwrap();
    assert!(code.starts_with(&server.config.catalog.code_prefix));
    assert_eq!(
        code.len(),
        server.config.catalog.code_prefix.len() + server.config.catalog.code_length
    );
}

#[tokio::test]
async fn test_gated_writes_without_admin_do_not_mutate() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let id = server.create_product(&admin, &lamp()).await;

    let resp = server
        .patch(&format!("/products/{id}"))
        .json(&json!({ "quantity": 99 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = server
        .delete(&format!("/products/{id}"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let product = json_body(server.get(&format!("/products/{id}")).send().await.unwrap()).await;
    assert_eq!(product["quantity"], json!(4));
}

#[tokio::test]
async fn test_reads_are_public() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let id = server.create_product(&admin, &lamp()).await;

    let resp = server.get("/products").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list = json_body(resp).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let resp = server.get(&format!("/products/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let product = json_body(resp).await;
    assert_eq!(product["id"], json!(id));
    assert_eq!(product["name"], json!("Desk lamp"));
    assert_eq!(product["price"], json!(19.99));
    assert_eq!(product["inventory_status"], json!("INSTOCK"));
    assert!(product["created_at"].is_i64());
    assert!(product["updated_at"].is_i64());
}

#[tokio::test]
async fn test_patch_merges_and_never_changes_code() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let id = server.create_product(&admin, &lamp()).await;
    let before = json_body(server.get(&format!("/products/{id}")).send().await.unwrap()).await;

    let resp = server
        .patch(&format!("/products/{id}"))
        .bearer_auth(&admin)
        .json(&json!({ "quantity": 10, "code": "PRD-HIJACKED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["message"], json!("Product updated successfully"));
    assert_eq!(body["data"]["quantity"], json!(10));
    assert_eq!(body["data"]["code"], before["code"]);
    assert_eq!(body["data"]["name"], before["name"]);
    assert_eq!(body["data"]["category"], before["category"]);
}

#[tokio::test]
async fn test_codes_are_unique() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    server.create_product(&admin, &lamp()).await;
    server.create_product(&admin, &lamp()).await;

    let list = json_body(server.get("/products").send().await.unwrap()).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_ne!(list[0]["code"], list[1]["code"]);
}

#[tokio::test]
async fn test_create_validation() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;

    let resp = server
        .post("/products")
        .bearer_auth(&admin)
        .json(&json!({ "name": "  ", "price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(
        body["message"],
        json!(server.config.messages.product_name_empty)
    );

    let resp = server
        .post("/products")
        .bearer_auth(&admin)
        .json(&json!({ "name": "Lamp", "price": -1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["message"], json!("price must not be negative"));
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let server = TestServer::spawn().await;

    let resp = server.get("/products/424242").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["message"], json!("Product not found with id: 424242"));

    let resp = server.get("/products/abc").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid parameter value")
    );
}

#[tokio::test]
async fn test_delete() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let id = server.create_product(&admin, &lamp()).await;

    let resp = server
        .delete(&format!("/products/{id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["message"], json!("Product deleted successfully"));
    assert_eq!(body["data"], Value::Null);

    let resp = server.get(&format!("/products/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_of_product_in_a_cart_is_a_conflict() {
    let server = TestServer::spawn().await;
    let admin = server.admin_token().await;
    let shopper = server.login_as("ann", "ann@shop.test").await;
    let id = server.create_product(&admin, &lamp()).await;

    let resp = server
        .post("/cart/items")
        .bearer_auth(&shopper)
        .json(&json!({ "product_id": id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server
        .delete(&format!("/products/{id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = json_body(resp).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Database constraint violation")
    );
}
