//! Concurrency and retry tests for the fulfillment engine.
//!
//! [`GatedStore`] holds both commits at a barrier until each task has read
//! the same stock value, forcing the write conflict instead of hoping the
//! scheduler produces it; [`FlakyStore`] injects commit timeouts.

use std::sync::Arc;

use shopd_core::ItemId;
use shopd_integration_tests::{FlakyStore, GatedStore, seed_customer, seed_item};
use shopd_server::services::{FulfillmentError, FulfillmentService, OrderInput};
use shopd_server::store::{DynStore, MemoryStore, ShopStore};

async fn gated_engine(
    stock: i32,
    participants: u32,
) -> (FulfillmentService, Arc<MemoryStore>, OrderInput) {
    let inner = Arc::new(MemoryStore::new());
    let plain: DynStore = Arc::clone(&inner) as DynStore;
    let customer = seed_customer(&plain, "CUST-1").await;
    let item = seed_item(&plain, "ITEM-1", stock, 10.0).await;

    let gated: DynStore = Arc::new(GatedStore::new(Arc::clone(&inner), participants));
    let input = OrderInput {
        code: "ORD-RACE".to_owned(),
        order_date: None,
        quantity: 0, // overridden per task
        customer_id: customer.id,
        item_id: item.id,
    };
    (FulfillmentService::new(gated), inner, input)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn losing_racer_gets_insufficient_stock() {
    let (engine, inner, input) = gated_engine(5, 2).await;

    let mut first = input.clone();
    first.quantity = 5;
    let mut second = input.clone();
    second.quantity = 5;

    let a = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.create_order(&first).await })
    };
    let b = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.create_order(&second).await })
    };

    let results = [a.await.expect("join"), b.await.expect("join")];
    let oks = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(oks, 1, "exactly one of the racing orders may succeed");

    let loser = results
        .into_iter()
        .find_map(Result::err)
        .expect("one failure");
    assert!(
        matches!(loser, FulfillmentError::InsufficientStock { available: 0, .. }),
        "loser saw the winner's deduction, got {loser:?}"
    );

    let item = inner
        .get_item(ItemId::new(1))
        .await
        .expect("get")
        .expect("item");
    assert_eq!(item.stock, 0);
    assert!(!item.is_available);
    assert_eq!(inner.list_orders().await.expect("list").len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn conflicting_orders_that_both_fit_are_retried_to_success() {
    let (engine, inner, input) = gated_engine(10, 2).await;

    let mut first = input.clone();
    first.quantity = 3;
    let mut second = input.clone();
    second.quantity = 4;

    let a = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.create_order(&first).await })
    };
    let b = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.create_order(&second).await })
    };

    a.await.expect("join").expect("first order");
    b.await.expect("join").expect("second order");

    let item = inner
        .get_item(ItemId::new(1))
        .await
        .expect("get")
        .expect("item");
    assert_eq!(item.stock, 3);
    assert!(item.is_available);
    assert_eq!(inner.list_orders().await.expect("list").len(), 2);
}

#[tokio::test]
async fn timed_out_commit_is_retried_to_success() {
    let inner = Arc::new(MemoryStore::new());
    let plain: DynStore = Arc::clone(&inner) as DynStore;
    let customer = seed_customer(&plain, "CUST-1").await;
    let item = seed_item(&plain, "ITEM-1", 5, 10.0).await;

    let flaky: DynStore = Arc::new(FlakyStore::new(Arc::clone(&inner), 1));
    let engine = FulfillmentService::new(flaky);

    let order = engine
        .create_order(&OrderInput {
            code: "ORD-1".to_owned(),
            order_date: None,
            quantity: 2,
            customer_id: customer.id,
            item_id: item.id,
        })
        .await
        .expect("a single timeout is transient");
    assert_eq!(order.quantity, 2);

    let item = inner
        .get_item(item.id)
        .await
        .expect("get")
        .expect("item");
    assert_eq!(item.stock, 3);
    assert_eq!(inner.list_orders().await.expect("list").len(), 1);
}
