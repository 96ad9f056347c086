mod common;

use axum::http::StatusCode;
use common::{assert_error, body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn new_cart_is_empty() {
    let app = TestApp::new().await;
    let cart_id = app.create_cart().await;

    let resp = app.get(&format!("/carts/{cart_id}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["id"], cart_id.as_str());
    assert!(json["items"].as_array().unwrap().is_empty());
    assert_eq!(json["total_price"], "0.00");
}

#[tokio::test]
async fn adding_same_product_accumulates_quantity() {
    let app = TestApp::new().await;
    let collection_id = app.seed_collection("Mugs").await;
    let product_id = app.seed_product(collection_id, "Blue mug", "10.00").await;
    let cart_id = app.create_cart().await;

    let resp = app.add_to_cart(&cart_id, product_id, 1).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first = body_json(resp).await;

    let resp = app.add_to_cart(&cart_id, product_id, 2).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let second = body_json(resp).await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["quantity"], 3);
    assert_eq!(second["total_price"], "30.00");
    assert_eq!(app.count("SELECT COUNT(*) FROM cart_items").await, 1);
}

#[tokio::test]
async fn cart_total_uses_current_prices() {
    let app = TestApp::new().await;
    let collection_id = app.seed_collection("Mugs").await;
    let a = app.seed_product(collection_id, "Blue mug", "10.00").await;
    let b = app.seed_product(collection_id, "Red mug", "5.00").await;
    let cart_id = app.create_cart().await;

    app.add_to_cart(&cart_id, a, 2).await;
    app.add_to_cart(&cart_id, b, 1).await;

    let resp = app.get(&format!("/carts/{cart_id}"), None).await;
    let json = body_json(resp).await;
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["items"][0]["product"]["title"], "Blue mug");
    assert_eq!(json["items"][0]["product"]["price"], "10.00");
    assert_eq!(json["total_price"], "25.00");

    sqlx::query("UPDATE products SET price = '12.00' WHERE id = ?")
        .bind(a)
        .execute(&app.db)
        .await
        .unwrap();

    let resp = app.get(&format!("/carts/{cart_id}"), None).await;
    let json = body_json(resp).await;
    assert_eq!(json["total_price"], "29.00");
}

#[tokio::test]
async fn add_missing_product_is_not_found() {
    let app = TestApp::new().await;
    let cart_id = app.create_cart().await;

    let resp = app.add_to_cart(&cart_id, 999, 1).await;
    assert_error(resp, StatusCode::NOT_FOUND, "product not found").await;
    assert_eq!(app.count("SELECT COUNT(*) FROM cart_items").await, 0);
}

#[tokio::test]
async fn add_to_missing_cart_is_not_found() {
    let app = TestApp::new().await;
    let collection_id = app.seed_collection("Mugs").await;
    let product_id = app.seed_product(collection_id, "Blue mug", "10.00").await;

    let resp = app.add_to_cart("no-such-cart", product_id, 1).await;
    assert_error(resp, StatusCode::NOT_FOUND, "cart not found").await;
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let app = TestApp::new().await;
    let collection_id = app.seed_collection("Mugs").await;
    let product_id = app.seed_product(collection_id, "Blue mug", "10.00").await;
    let cart_id = app.create_cart().await;

    let resp = app.add_to_cart(&cart_id, product_id, 0).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["details"]["quantity"][0], "quantity must be 1 to 2147483647");
}

#[tokio::test]
async fn update_replaces_quantity() {
    let app = TestApp::new().await;
    let collection_id = app.seed_collection("Mugs").await;
    let product_id = app.seed_product(collection_id, "Blue mug", "10.00").await;
    let cart_id = app.create_cart().await;

    let resp = app.add_to_cart(&cart_id, product_id, 4).await;
    let item_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = app
        .patch_json(
            &format!("/carts/{cart_id}/items/{item_id}"),
            &json!({ "quantity": 1 }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["quantity"], 1);
    assert_eq!(json["total_price"], "10.00");
}

#[tokio::test]
async fn item_from_another_cart_is_not_found() {
    let app = TestApp::new().await;
    let collection_id = app.seed_collection("Mugs").await;
    let product_id = app.seed_product(collection_id, "Blue mug", "10.00").await;
    let cart_id = app.create_cart().await;
    let other_cart = app.create_cart().await;

    let resp = app.add_to_cart(&cart_id, product_id, 1).await;
    let item_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = app
        .get(&format!("/carts/{other_cart}/items/{item_id}"), None)
        .await;
    assert_error(resp, StatusCode::NOT_FOUND, "cart item not found").await;
}

#[tokio::test]
async fn remove_item() {
    let app = TestApp::new().await;
    let collection_id = app.seed_collection("Mugs").await;
    let product_id = app.seed_product(collection_id, "Blue mug", "10.00").await;
    let cart_id = app.create_cart().await;

    let resp = app.add_to_cart(&cart_id, product_id, 1).await;
    let item_id = body_json(resp).await["id"].as_i64().unwrap();

    let uri = format!("/carts/{cart_id}/items/{item_id}");
    let resp = app.delete(&uri, None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.delete(&uri, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_cart_removes_items() {
    let app = TestApp::new().await;
    let collection_id = app.seed_collection("Mugs").await;
    let product_id = app.seed_product(collection_id, "Blue mug", "10.00").await;
    let cart_id = app.create_cart().await;
    app.add_to_cart(&cart_id, product_id, 1).await;

    let resp = app.delete(&format!("/carts/{cart_id}"), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.count("SELECT COUNT(*) FROM cart_items").await, 0);

    let resp = app.get(&format!("/carts/{cart_id}"), None).await;
    assert_error(resp, StatusCode::NOT_FOUND, "cart not found").await;
}

#[tokio::test]
async fn quantity_is_capped() {
    let app = TestApp::new().await;
    let collection_id = app.seed_collection("Mugs").await;
    let product_id = app.seed_product(collection_id, "Blue mug", "10.00").await;
    let cart_id = app.create_cart().await;

    let resp = app.add_to_cart(&cart_id, product_id, i64::MAX).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.add_to_cart(&cart_id, product_id, 2_147_483_647).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let item_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = app.add_to_cart(&cart_id, product_id, 1).await;
    assert_error(
        resp,
        StatusCode::BAD_REQUEST,
        "quantity in cart cannot exceed 2147483647",
    )
    .await;

    let resp = app
        .get(&format!("/carts/{cart_id}/items/{item_id}"), None)
        .await;
    assert_eq!(body_json(resp).await["quantity"], 2_147_483_647i64);

    let resp = app
        .patch_json(
            &format!("/carts/{cart_id}/items/{item_id}"),
            &json!({ "quantity": 2_147_483_648i64 }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
