mod common;

use allocation::application::HandlerOutput;
use allocation::domain::entities::{Batch, OrderLine, Product};
use allocation::domain::events::Event;
use allocation::domain::repositories::ProductRepository;
use allocation::error::AppError;
use common::TestContext;
use serde_json::json;

async fn insert_product(ctx: &TestContext, sku: &str, reference: &str, qty: i64) {
    let mut scope = ctx.unit_of_work().begin();
    scope
        .products
        .add(Product::new(sku, vec![Batch::new(reference, sku, qty, None)]))
        .unwrap();
    scope.commit().await.unwrap();
}

async fn failing_scope(ctx: &TestContext) -> Result<(), AppError> {
    let mut scope = ctx.unit_of_work().begin();
    let product = scope.products.get("MEDIUM-PLINTH").await?.unwrap();
    product.allocate(OrderLine::new("o1", "MEDIUM-PLINTH", 10))?;

    Err(AppError::internal("something went wrong", json!({})))
}

#[tokio::test]
async fn test_uncommitted_work_is_rolled_back() {
    let ctx = TestContext::new();
    insert_product(&ctx, "MEDIUM-PLINTH", "batch1", 100).await;

    {
        let mut scope = ctx.unit_of_work().begin();
        let product = scope.products.get("MEDIUM-PLINTH").await.unwrap().unwrap();
        product
            .allocate(OrderLine::new("o1", "MEDIUM-PLINTH", 10))
            .unwrap();
    }

    assert_eq!(ctx.available("MEDIUM-PLINTH", "batch1").await, 100);
}

#[tokio::test]
async fn test_rolls_back_on_error() {
    let ctx = TestContext::new();
    insert_product(&ctx, "MEDIUM-PLINTH", "batch1", 100).await;

    let result = failing_scope(&ctx).await;

    assert!(result.is_err());
    assert_eq!(ctx.available("MEDIUM-PLINTH", "batch1").await, 100);
}

#[tokio::test]
async fn test_explicit_rollback_discards_new_products() {
    let ctx = TestContext::new();

    let mut scope = ctx.unit_of_work().begin();
    scope.products.add(Product::new("RUG", vec![])).unwrap();
    scope.rollback();

    assert!(ctx.repository.find_by_sku("RUG").await.unwrap().is_none());
}

#[tokio::test]
async fn test_commit_persists_allocation_and_version() {
    let ctx = TestContext::new();
    insert_product(&ctx, "HIPSTER-WORKBENCH", "batch1", 100).await;

    let mut scope = ctx.unit_of_work().begin();
    let product = scope
        .products
        .get("HIPSTER-WORKBENCH")
        .await
        .unwrap()
        .unwrap();
    product
        .allocate(OrderLine::new("o1", "HIPSTER-WORKBENCH", 10))
        .unwrap();
    scope.commit().await.unwrap();

    let stored = ctx
        .repository
        .find_by_sku("HIPSTER-WORKBENCH")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.batch("batch1").unwrap().available_quantity(), 90);
    assert_eq!(stored.version(), 1);
}

#[tokio::test]
async fn test_concurrent_scopes_on_last_unit_conflict() {
    let ctx = TestContext::new();
    insert_product(&ctx, "LAST-UNIT", "batch1", 1).await;

    let mut first = ctx.unit_of_work().begin();
    let mut second = ctx.unit_of_work().begin();

    first
        .products
        .get("LAST-UNIT")
        .await
        .unwrap()
        .unwrap()
        .allocate(OrderLine::new("o1", "LAST-UNIT", 1))
        .unwrap();
    second
        .products
        .get("LAST-UNIT")
        .await
        .unwrap()
        .unwrap()
        .allocate(OrderLine::new("o2", "LAST-UNIT", 1))
        .unwrap();

    first.commit().await.unwrap();
    let result = second.commit().await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));

    let stored = ctx.repository.find_by_sku("LAST-UNIT").await.unwrap().unwrap();
    let orders: Vec<_> = stored
        .batch("batch1")
        .unwrap()
        .allocations()
        .map(|l| l.order_id.clone())
        .collect();
    assert_eq!(orders, ["o1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_allocate_last_unit_once() {
    let ctx = TestContext::new();
    ctx.handle_all([Event::batch_created("batch1", "LAST-UNIT", 1, None)])
        .await;

    let tasks: Vec<_> = ["o1", "o2"]
        .into_iter()
        .map(|order_id| {
            let bus = ctx.bus.clone();
            let uow = ctx.unit_of_work();
            tokio::spawn(async move {
                bus.handle(Event::allocation_required(order_id, "LAST-UNIT", 1), &uow)
                    .await
            })
        })
        .collect();

    let mut allocated = 0;
    let mut out_of_stock = 0;
    for task in tasks {
        for output in task.await.unwrap().unwrap() {
            match output {
                HandlerOutput::Allocated { .. } => allocated += 1,
                HandlerOutput::OutOfStock { .. } => out_of_stock += 1,
            }
        }
    }

    assert_eq!(allocated, 1);
    assert_eq!(out_of_stock, 1);
    assert_eq!(ctx.available("LAST-UNIT", "batch1").await, 0);
    assert_eq!(ctx.notifier.sent().len(), 1);
}
