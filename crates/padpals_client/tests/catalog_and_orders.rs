use padpals_client::cart::Cart;
use padpals_client::http_client::ReqwestStorefrontClient;
use padpals_client::{PadPalsError, StorefrontClient};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ReqwestStorefrontClient {
    ReqwestStorefrontClient::new(&server.uri(), None, Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn list_products_groups_variant_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "v1-1", "group_id": "p1", "name": "Day Pads", "description": "d",
             "category": "regular", "stock": 30, "size": "Regular", "price": "45.00", "image": "x"},
            {"id": "v1-2", "group_id": "p1", "name": "Day Pads", "description": "d",
             "category": "regular", "stock": 30, "size": "Super", "price": "49.00", "image": "y"}
        ])))
        .mount(&server)
        .await;

    let products = client(&server).list_products().await.expect("products");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].variants.len(), 2);
    assert_eq!(products[0].variants[1].price, 49.0);
}

#[tokio::test]
async fn create_order_posts_cart_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "v1-1", "group_id": "p1", "name": "Day Pads", "description": "d",
             "category": "regular", "stock": 30, "size": "Regular", "price": 40, "image": "x"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_partial_json(serde_json::json!({
            "userId": "u1",
            "type": "Drop-off",
            "status": "Processing",
            "items": [{"id": "v1-1", "name": "Day Pads (Regular)", "quantity": 2}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "o1"})))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    let products = c.list_products().await.expect("products");
    let mut cart = Cart::new();
    cart.add(&products[0], &products[0].variants[0], false);
    cart.add(&products[0], &products[0].variants[0], false);
    c.create_order(&cart.to_order("u1")).await.expect("order");
}

#[tokio::test]
async fn unauthorized_order_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(401).set_body_string("login first"))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_order(&Cart::new().to_order("u1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PadPalsError::Auth(_)));
}
