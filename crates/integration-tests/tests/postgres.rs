//! Cart and wishlist flows against a real `PostgreSQL` database.
//!
//! These run only when asked for and need `DATABASE_URL` pointing at a
//! scratch database:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/cartwheel_test \
//!     cargo test -p cartwheel-integration-tests --test postgres -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;

use cartwheel_integration_tests::{TestServer, json_body, test_config};
use cartwheel_server::db::PgStore;

async fn spawn_pg() -> Option<TestServer> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.unwrap();
    sqlx::migrate!("../server/migrations").run(&pool).await.unwrap();
    Some(TestServer::spawn_on(test_config(), Arc::new(PgStore::new(pool))).await)
}

/// Sign up a shopper whose username and email are unique to this run.
async fn fresh_shopper(server: &TestServer) -> String {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    server
        .login_as(&format!("u{tag}"), &format!("{tag}@shop.test"))
        .await
}

async fn add_to_cart(server: &TestServer, token: &str, product_id: i64, quantity: i32) -> (StatusCode, Value) {
    let resp = server
        .post("/cart/items")
        .bearer_auth(token)
        .json(&json!({ "product_id": product_id, "quantity": quantity }))
        .send()
        .await
        .unwrap();
    (resp.status(), json_body(resp).await)
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_cart_flow_on_postgres() {
    let Some(server) = spawn_pg().await else { return };
    let admin = server.admin_token().await;
    let shopper = fresh_shopper(&server).await;
    let x = server
        .create_product(
            &admin,
            &json!({ "name": "Widget", "price": 10.0, "quantity": 3, "inventory_status": "INSTOCK" }),
        )
        .await;

    let (status, cart) = add_to_cart(&server, &shopper, x, 2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["product_name"], json!("Widget"));
    assert_eq!(cart["items"][0]["product_price"].as_f64(), Some(10.0));
    assert_eq!(cart["total_price"].as_f64(), Some(20.0));
    assert!(cart["created_at"].is_i64());

    let (status, body) = add_to_cart(&server, &shopper, x, 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("not enough stock: 3 available"));

    let resp = server
        .delete(&format!("/products/{x}"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = server
        .delete("/cart")
        .bearer_auth(&shopper)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["total_items"], json!(0));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_concurrent_adds_respect_stock_on_postgres() {
    let Some(server) = spawn_pg().await else { return };
    let admin = server.admin_token().await;
    let shopper = fresh_shopper(&server).await;
    let x = server
        .create_product(
            &admin,
            &json!({ "name": "Gadget", "price": 1.0, "quantity": 3, "inventory_status": "INSTOCK" }),
        )
        .await;

    let (first, second) = tokio::join!(
        add_to_cart(&server, &shopper, x, 2),
        add_to_cart(&server, &shopper, x, 2),
    );
    let mut statuses = [first.0, second.0];
    statuses.sort_unstable();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);

    let resp = server
        .get("/cart")
        .bearer_auth(&shopper)
        .send()
        .await
        .unwrap();
    let cart = json_body(resp).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], json!(2));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_wishlist_joins_products_on_postgres() {
    let Some(server) = spawn_pg().await else { return };
    let admin = server.admin_token().await;
    let shopper = fresh_shopper(&server).await;
    let x = server
        .create_product(&admin, &json!({ "name": "Kettle", "price": 30.0, "quantity": 1, "inventory_status": "INSTOCK" }))
        .await;

    for _ in 0..2 {
        let resp = server
            .post("/wishlist/items")
            .bearer_auth(&shopper)
            .json(&json!({ "product_id": x }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let wishlist = json_body(resp).await;
        assert_eq!(wishlist["total_items"], json!(1));
        assert_eq!(wishlist["items"][0]["product_name"], json!("Kettle"));
        assert!(wishlist["items"][0]["added_at"].is_i64());
    }
}
