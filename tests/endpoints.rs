//! Typed endpoint coverage against a mock backend: query encoding, envelope
//! decoding, admin routes, and error-message passthrough.

use std::sync::Arc;

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use storefront::api::{ApiClient, ApiError};
use storefront::auth::{MemoryStore, Session, SessionStore, StoreKey};
use storefront::models::{NewProduct, OrderStatus, ProductQuery, ProductUpdate};

struct TestSetup {
    server: ServerGuard,
    client: ApiClient,
}

/// Client with a logged-in session already in place.
async fn setup() -> TestSetup {
    let server = Server::new_async().await;
    let store = Arc::new(MemoryStore::new());
    store.set(StoreKey::AccessToken, "tok1").unwrap();
    store.set(StoreKey::RefreshToken, "refresh1").unwrap();
    let session = Arc::new(Session::new(store));
    let client = ApiClient::new(server.url(), session).expect("client should build");
    TestSetup { server, client }
}

fn envelope(data: serde_json::Value) -> String {
    json!({
        "code": 200,
        "status": "SUCCESS",
        "message": "ok",
        "createdAt": "2025-02-01T12:00:00Z",
        "data": data
    })
    .to_string()
}

fn product_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "price": 12.5,
        "stock": 3,
        "categoryId": 7,
        "categoryName": "Kitchen"
    })
}

#[tokio::test]
async fn products_sends_all_query_parameters() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("GET", "/products")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("keyword".into(), "mug".into()),
            Matcher::UrlEncoded("categoryId".into(), "7".into()),
            Matcher::UrlEncoded("page".into(), "0".into()),
            Matcher::UrlEncoded("size".into(), "12".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({
            "content": [product_json(1, "Mug")],
            "totalElements": 1,
            "totalPages": 1,
            "size": 12,
            "number": 0
        })))
        .expect(1)
        .create_async()
        .await;

    let query = ProductQuery {
        keyword: Some("mug".to_string()),
        category_id: Some(7),
        page: Some(0),
        size: Some(12),
    };
    let page = t.client.products(&query).await.expect("products should load");
    assert_eq!(page.content.len(), 1);
    assert!(page.is_last());
    mock.assert_async().await;
}

#[tokio::test]
async fn search_overrides_keyword() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("GET", "/products/search")
        .match_query(Matcher::UrlEncoded("keyword".into(), "kettle".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({
            "content": [],
            "totalElements": 0,
            "totalPages": 0,
            "size": 10,
            "number": 0
        })))
        .expect(1)
        .create_async()
        .await;

    let page = t
        .client
        .search_products("kettle", &ProductQuery::default())
        .await
        .expect("search should succeed");
    assert!(page.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_product_maps_to_not_found() {
    let mut t = setup().await;

    t.server
        .mock("GET", "/products/99")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(json!({"code": 404, "status": "NOT_FOUND", "message": "product not found"}).to_string())
        .create_async()
        .await;

    let err = t.client.product(99).await.expect_err("lookup should fail");
    match err {
        ApiError::NotFound(message) => assert_eq!(message, "product not found"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn add_to_cart_posts_item_body() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("POST", "/carts/items")
        .match_body(Matcher::Json(json!({"productId": 1, "quantity": 2})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({
            "id": 5,
            "userId": 42,
            "items": [
                {"id": 9, "productId": 1, "productName": "Mug", "quantity": 2, "price": 12.5}
            ],
            "totalAmount": 25.0
        })))
        .expect(1)
        .create_async()
        .await;

    let cart = t.client.add_to_cart(1, 2).await.expect("add should succeed");
    assert_eq!(cart.item_count(), 2);
    assert!((cart.subtotal() - cart.total_amount).abs() < f64::EPSILON);
    mock.assert_async().await;
}

#[tokio::test]
async fn cart_item_quantity_travels_as_query_param() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("PATCH", "/carts/items/9")
        .match_query(Matcher::UrlEncoded("quantity".into(), "3".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!(null)))
        .expect(1)
        .create_async()
        .await;

    t.client
        .update_cart_item(9, 3)
        .await
        .expect("update should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn clear_cart_hits_collection_root() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("DELETE", "/carts")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!(null)))
        .expect(1)
        .create_async()
        .await;

    t.client.clear_cart().await.expect("clear should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn order_lifecycle_parses_status_transitions() {
    let mut t = setup().await;

    t.server
        .mock("POST", "/orders")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({
            "orderId": 7,
            "userId": 42,
            "status": "PENDING",
            "totalAmount": 25.0,
            "items": [{"id": 1, "productId": 3, "quantity": 2, "amount": 25.0}],
            "createdAt": "2025-02-01T12:00:00Z"
        })))
        .create_async()
        .await;

    t.server
        .mock("POST", "/orders/7/cancel")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({
            "orderId": 7,
            "userId": 42,
            "status": "CANCELLED",
            "totalAmount": 25.0,
            "items": []
        })))
        .create_async()
        .await;

    let placed = t.client.create_order().await.expect("order should place");
    assert_eq!(placed.status, OrderStatus::Pending);
    assert!(placed.status.can_cancel());

    let cancelled = t.client.cancel_order(7).await.expect("cancel should succeed");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn admin_status_update_sends_enum_name() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("PATCH", "/admin/orders/7/status")
        .match_body(Matcher::Json(json!({"status": "SHIPPED"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({
            "orderId": 7,
            "userId": 42,
            "status": "SHIPPED",
            "totalAmount": 25.0,
            "items": []
        })))
        .expect(1)
        .create_async()
        .await;

    let order = t
        .client
        .update_order_status(7, OrderStatus::Shipped)
        .await
        .expect("status update should succeed");
    assert_eq!(order.status, OrderStatus::Shipped);
    mock.assert_async().await;
}

#[tokio::test]
async fn admin_product_create_round_trips() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("POST", "/admin/products")
        .match_body(Matcher::Json(json!({
            "name": "Kettle",
            "description": "Electric kettle",
            "price": 39.9,
            "stock": 10,
            "categoryId": 7
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(product_json(2, "Kettle")))
        .expect(1)
        .create_async()
        .await;

    let product = t
        .client
        .create_product(&NewProduct {
            name: "Kettle".to_string(),
            description: "Electric kettle".to_string(),
            price: 39.9,
            stock: 10,
            image_url: None,
            category_id: 7,
        })
        .await
        .expect("create should succeed");
    assert_eq!(product.id, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn single_order_fetch_hits_id_path() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("GET", "/orders/7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({
            "orderId": 7,
            "userId": 42,
            "status": "CONFIRMED",
            "totalAmount": 25.0,
            "items": [{"id": 1, "productId": 3, "quantity": 2, "amount": 25.0}]
        })))
        .expect(1)
        .create_async()
        .await;

    let order = t.client.order(7).await.expect("order should load");
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.items.len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn remove_cart_item_deletes_by_line_id() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("DELETE", "/carts/items/9")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!(null)))
        .expect(1)
        .create_async()
        .await;

    t.client
        .remove_cart_item(9)
        .await
        .expect("remove should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn admin_product_update_sends_only_changed_fields() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("PUT", "/admin/products/2")
        .match_body(Matcher::Json(json!({"price": 34.9, "stock": 4})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(product_json(2, "Kettle")))
        .expect(1)
        .create_async()
        .await;

    let changes = ProductUpdate {
        price: Some(34.9),
        stock: Some(4),
        ..Default::default()
    };
    let product = t
        .client
        .update_product(2, &changes)
        .await
        .expect("update should succeed");
    assert_eq!(product.id, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn admin_product_delete_hits_id_path() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("DELETE", "/admin/products/2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!(null)))
        .expect(1)
        .create_async()
        .await;

    t.client
        .delete_product(2)
        .await
        .expect("delete should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn admin_orders_list_across_users() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("GET", "/admin/orders")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!([
            {"orderId": 7, "userId": 42, "status": "PENDING", "totalAmount": 25.0, "items": []},
            {"orderId": 8, "userId": 43, "status": "SHIPPED", "totalAmount": 10.0, "items": []}
        ])))
        .expect(1)
        .create_async()
        .await;

    let orders = t.client.all_orders().await.expect("orders should load");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[1].user_id, 43);
    mock.assert_async().await;
}

#[tokio::test]
async fn categories_parse_as_list() {
    let mut t = setup().await;

    t.server
        .mock("GET", "/categories")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!([
            {"id": 7, "name": "Kitchen", "createdAt": "2025-01-01T00:00:00Z"},
            {"id": 8, "name": "Garden"}
        ])))
        .create_async()
        .await;

    let categories = t.client.categories().await.expect("categories should load");
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[1].name, "Garden");
}

#[tokio::test]
async fn single_category_fetch_hits_id_path() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("GET", "/categories/7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({"id": 7, "name": "Kitchen"})))
        .expect(1)
        .create_async()
        .await;

    let category = t.client.category(7).await.expect("category should load");
    assert_eq!(category.name, "Kitchen");
    mock.assert_async().await;
}

#[tokio::test]
async fn admin_category_create_and_rename() {
    let mut t = setup().await;

    let create = t
        .server
        .mock("POST", "/admin/categories")
        .match_body(Matcher::Json(json!({"name": "Garden"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({"id": 8, "name": "Garden"})))
        .expect(1)
        .create_async()
        .await;

    let rename = t
        .server
        .mock("PUT", "/admin/categories/8")
        .match_body(Matcher::Json(json!({"name": "Outdoors"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({"id": 8, "name": "Outdoors"})))
        .expect(1)
        .create_async()
        .await;

    let created = t
        .client
        .create_category("Garden")
        .await
        .expect("create should succeed");
    assert_eq!(created.id, 8);

    let renamed = t
        .client
        .update_category(8, "Outdoors")
        .await
        .expect("rename should succeed");
    assert_eq!(renamed.name, "Outdoors");

    create.assert_async().await;
    rename.assert_async().await;
}

#[tokio::test]
async fn admin_category_delete_hits_id_path() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("DELETE", "/admin/categories/8")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!(null)))
        .expect(1)
        .create_async()
        .await;

    t.client
        .delete_category(8)
        .await
        .expect("delete should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn profile_update_accepts_empty_data() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("PUT", "/users/profile")
        .match_body(Matcher::Json(json!({"name": "Jamie", "phone": "010-1234"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!(null)))
        .expect(1)
        .create_async()
        .await;

    t.client
        .update_profile("Jamie", "010-1234")
        .await
        .expect("profile update should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn change_password_sends_camel_case_body() {
    let mut t = setup().await;

    let mock = t
        .server
        .mock("PUT", "/users/password")
        .match_body(Matcher::Json(json!({
            "oldPassword": "old1!",
            "newPassword": "new2@"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!(null)))
        .expect(1)
        .create_async()
        .await;

    t.client
        .change_password("old1!", "new2@")
        .await
        .expect("password change should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn non_envelope_body_is_a_decode_error() {
    let mut t = setup().await;

    t.server
        .mock("GET", "/orders")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let err = t.client.orders().await.expect_err("parse should fail");
    assert!(matches!(err, ApiError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn success_without_data_payload_is_a_decode_error() {
    let mut t = setup().await;

    t.server
        .mock("GET", "/carts")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"code": 200, "status": "SUCCESS"}).to_string())
        .create_async()
        .await;

    let err = t.client.cart().await.expect_err("parse should fail");
    assert!(matches!(err, ApiError::Decode(_)), "got {:?}", err);
}
