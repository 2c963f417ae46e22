mod common;

use allocation::api::routes::routes;
use axum::http::StatusCode;
use axum_test::TestServer;
use common::TestContext;
use serde_json::json;

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(routes().with_state(ctx.state())).unwrap()
}

async fn add_stock(server: &TestServer, batches: &[(&str, &str, i64, Option<&str>)]) {
    for (reference, sku, qty, eta) in batches {
        server
            .post("/add_batch")
            .json(&json!({ "ref": reference, "sku": sku, "qty": qty, "eta": eta }))
            .await
            .assert_status(StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_happy_path_returns_201_and_allocated_batch() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    add_stock(
        &server,
        &[
            ("batch-2", "sku-1", 100, Some("2011-01-02")),
            ("batch-1", "sku-1", 100, Some("2011-01-01")),
            ("batch-3", "sku-other", 100, None),
        ],
    )
    .await;

    let response = server
        .post("/allocate")
        .json(&json!({ "order_id": "order-1", "sku": "sku-1", "qty": 3 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["batch_ref"], "batch-1");
}

#[tokio::test]
async fn test_unknown_sku_returns_400_and_error_message() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server
        .post("/allocate")
        .json(&json!({ "order_id": "order-1", "sku": "unknown-sku", "qty": 20 }))
        .await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "invalid_sku");
    assert_eq!(json["error"]["message"], "Invalid sku unknown-sku");
}

#[tokio::test]
async fn test_out_of_stock_returns_400_and_notifies() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    add_stock(&server, &[("batch-1", "sku-small", 5, None)]).await;

    let response = server
        .post("/allocate")
        .json(&json!({ "order_id": "order-1", "sku": "sku-small", "qty": 6 }))
        .await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "out_of_stock");
    assert_eq!(json["error"]["message"], "Out of stock for sku sku-small");
    assert_eq!(ctx.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_invalid_payload_returns_400() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server
        .post("/allocate")
        .json(&json!({ "order_id": "order-1", "sku": "sku-1", "qty": 0 }))
        .await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_change_batch_quantity_reallocates() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    add_stock(
        &server,
        &[
            ("batch-1", "TABLE", 50, None),
            ("batch-2", "TABLE", 50, Some("2099-01-01")),
        ],
    )
    .await;
    for order_id in ["o1", "o2"] {
        server
            .post("/allocate")
            .json(&json!({ "order_id": order_id, "sku": "TABLE", "qty": 20 }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    server
        .post("/change_batch_quantity")
        .json(&json!({ "ref": "batch-1", "qty": 25 }))
        .await
        .assert_status_ok();

    assert_eq!(ctx.available("TABLE", "batch-1").await, 5);
    assert_eq!(ctx.available("TABLE", "batch-2").await, 30);
}

#[tokio::test]
async fn test_change_quantity_of_unknown_batch_returns_404() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server
        .post("/change_batch_quantity")
        .json(&json!({ "ref": "ghost", "qty": 1 }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_duplicate_batch_returns_400() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    add_stock(&server, &[("batch-1", "LAMP", 10, None)]).await;

    let response = server
        .post("/add_batch")
        .json(&json!({ "ref": "batch-1", "sku": "LAMP", "qty": 10, "eta": null }))
        .await;

    response.assert_status_bad_request();
}
