//! Purchase-flow tests over the in-memory fakes.
//!
//! These exercise the same code paths production runs (the handlers are
//! generic over the provider traits), with the fakes upholding the same
//! atomic contracts as Redis and Postgres.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use flashsale_core::{
    Clock, IdGenerator, LockError, LockManager, Product, ProductId, ProductRepository,
    StockError, StockStore,
};
use flashsale_service::commands::{
    CancelReservationCommand, CancelReservationHandler, ConfirmReservationCommand,
    ConfirmReservationHandler, CreateProductCommand, CreateProductHandler, LockPolicy,
    ReserveOutcome, ReserveStockCommand, ReserveStockHandler,
};
use flashsale_service::ServiceError;
use flashsale_testing::{test_clock, InMemoryLockManager, InMemoryProductRepository, InMemoryStockStore};
use std::sync::Arc;
use std::time::Duration;

/// A lock policy generous enough that every test task eventually gets the
/// lease instead of timing out.
fn patient_policy() -> LockPolicy {
    LockPolicy {
        ttl: Duration::from_secs(5),
        max_retries: 1_000,
        retry_interval: Duration::from_millis(1),
        acquire_deadline: Duration::from_secs(30),
    }
}

/// Seeds one product into both stores and returns the fixture.
async fn seeded_fixture(
    product_id: i64,
    available: i32,
) -> (
    InMemoryProductRepository,
    InMemoryStockStore,
    InMemoryLockManager,
    ProductId,
) {
    let repository = InMemoryProductRepository::new();
    let stock_store = InMemoryStockStore::new();
    let lock_manager = InMemoryLockManager::new();

    let id = ProductId::new(product_id);
    let product = Product::new(
        id,
        "Limited Sneaker",
        "Flash sale item",
        format!("SNKR-{product_id}"),
        available,
        test_clock().now(),
    )
    .unwrap();
    repository.save(&product).await.unwrap();
    stock_store.init_stock(id, available, 0).await.unwrap();

    (repository, stock_store, lock_manager, id)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_reserves_against_the_store_never_oversell() {
    // The core stress property: N concurrent reserve(1) calls with K < N
    // available sell exactly K units.
    let store = InMemoryStockStore::new();
    let product = ProductId::new(1);
    let stock = 5;
    let attempts = 100;

    store.init_stock(product, stock, 0).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..attempts {
        let store = store.clone();
        handles.push(tokio::spawn(async move { store.reserve(product, 1).await }));
    }

    let mut successes = 0;
    let mut declines = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            successes += 1;
        } else {
            declines += 1;
        }
    }

    assert_eq!(successes, stock as usize, "exactly the available units sell");
    assert_eq!(declines, attempts - stock as usize);
    assert_eq!(store.counters(product), Some((0, stock)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_purchase_attempts_through_the_handler() {
    let (repository, stock_store, lock_manager, id) = seeded_fixture(1, 5).await;
    let handler = Arc::new(ReserveStockHandler::new(
        repository.clone(),
        stock_store.clone(),
        lock_manager,
        patient_policy(),
    ));

    let mut handles = Vec::new();
    for _ in 0..20 {
        let handler = Arc::clone(&handler);
        handles.push(tokio::spawn(async move {
            handler
                .handle(ReserveStockCommand {
                    product_id: id,
                    quantity: 1,
                })
                .await
        }));
    }

    let mut reserved = 0;
    let mut declined = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            ReserveOutcome::Reserved => reserved += 1,
            ReserveOutcome::Declined => declined += 1,
        }
    }

    assert_eq!(reserved, 5, "no oversell, no lost update");
    assert_eq!(declined, 15);

    // Both stores agree on the final counters.
    assert_eq!(stock_store.counters(id), Some((0, 5)));
    let product = repository.find_by_id(id).await.unwrap();
    assert_eq!(product.stock().available(), 0);
    assert_eq!(product.stock().reserved(), 5);
}

#[tokio::test]
async fn durable_failure_compensates_the_cache_reservation() {
    let (repository, stock_store, lock_manager, id) = seeded_fixture(1, 5).await;
    let handler = ReserveStockHandler::new(
        repository.clone(),
        stock_store.clone(),
        lock_manager,
        patient_policy(),
    );

    repository.set_fail_writes(true);
    let result = handler
        .handle(ReserveStockCommand {
            product_id: id,
            quantity: 2,
        })
        .await;
    assert!(matches!(result, Err(ServiceError::Repository(_))));

    // The cache hold was given back: no stuck reservation.
    assert_eq!(stock_store.counters(id), Some((5, 0)));

    // Once the durable store recovers, the same purchase goes through.
    repository.set_fail_writes(false);
    let outcome = handler
        .handle(ReserveStockCommand {
            product_id: id,
            quantity: 2,
        })
        .await
        .unwrap();
    assert_eq!(outcome, ReserveOutcome::Reserved);
    assert_eq!(stock_store.counters(id), Some((3, 2)));
}

#[tokio::test]
async fn cold_cache_falls_back_to_the_durable_store_and_reseeds() {
    let (repository, stock_store, lock_manager, id) = seeded_fixture(1, 5).await;
    stock_store.clear(); // simulate full cache expiry

    let handler = ReserveStockHandler::new(
        repository.clone(),
        stock_store.clone(),
        lock_manager,
        patient_policy(),
    );

    let outcome = handler
        .handle(ReserveStockCommand {
            product_id: id,
            quantity: 2,
        })
        .await
        .unwrap();
    assert_eq!(outcome, ReserveOutcome::Reserved);

    // Durable took the write and the cache was re-seeded from it.
    let product = repository.find_by_id(id).await.unwrap();
    assert_eq!(product.stock().available(), 3);
    assert_eq!(product.stock().reserved(), 2);
    assert_eq!(stock_store.counters(id), Some((3, 2)));
}

#[tokio::test]
async fn insufficient_stock_is_a_declined_purchase_not_an_error() {
    let (repository, stock_store, lock_manager, id) = seeded_fixture(1, 1).await;
    let handler = ReserveStockHandler::new(
        repository,
        stock_store.clone(),
        lock_manager,
        patient_policy(),
    );

    let outcome = handler
        .handle(ReserveStockCommand {
            product_id: id,
            quantity: 5,
        })
        .await
        .unwrap();
    assert_eq!(outcome, ReserveOutcome::Declined);
    // Declining mutates nothing.
    assert_eq!(stock_store.counters(id), Some((1, 0)));
}

#[tokio::test]
async fn non_positive_quantities_are_rejected_up_front() {
    let (repository, stock_store, lock_manager, id) = seeded_fixture(1, 5).await;
    let handler =
        ReserveStockHandler::new(repository, stock_store, lock_manager, patient_policy());

    for quantity in [0, -3] {
        let result = handler
            .handle(ReserveStockCommand {
                product_id: id,
                quantity,
            })
            .await;
        assert_eq!(
            result,
            Err(ServiceError::Stock(StockError::NonPositiveQuantity))
        );
    }
}

#[tokio::test]
async fn lock_contention_surfaces_as_try_again() {
    let (repository, stock_store, lock_manager, id) = seeded_fixture(1, 5).await;

    // Someone else holds the product lease for the whole test.
    let holder = lock_manager
        .acquire(&format!("product:{id}"), Duration::from_secs(30))
        .await
        .unwrap()
        .unwrap();

    let impatient = LockPolicy {
        ttl: Duration::from_secs(5),
        max_retries: 2,
        retry_interval: Duration::from_millis(5),
        acquire_deadline: Duration::from_secs(1),
    };
    let handler = ReserveStockHandler::new(
        repository,
        stock_store.clone(),
        lock_manager.clone(),
        impatient,
    );

    let error = handler
        .handle(ReserveStockCommand {
            product_id: id,
            quantity: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        ServiceError::Lock(LockError::Unavailable { .. })
    ));
    assert!(error.is_retryable());
    // Nothing was reserved while locked out.
    assert_eq!(stock_store.counters(id), Some((5, 0)));

    lock_manager
        .release(&format!("product:{id}"), &holder)
        .await
        .unwrap();
}

#[tokio::test]
async fn an_elapsed_deadline_cancels_the_acquire_loop() {
    let (repository, stock_store, lock_manager, id) = seeded_fixture(1, 5).await;

    let _holder = lock_manager
        .acquire(&format!("product:{id}"), Duration::from_secs(30))
        .await
        .unwrap()
        .unwrap();

    let tight_deadline = LockPolicy {
        ttl: Duration::from_secs(5),
        max_retries: 1_000,
        retry_interval: Duration::from_millis(30),
        acquire_deadline: Duration::from_millis(50),
    };
    let handler =
        ReserveStockHandler::new(repository, stock_store, lock_manager, tight_deadline);

    let result = handler
        .handle(ReserveStockCommand {
            product_id: id,
            quantity: 1,
        })
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Lock(LockError::Cancelled { .. }))
    ));
}

#[tokio::test]
async fn reserve_all_then_cancel_restores_the_initial_counters() {
    // Scenario: Initial(10) → Reserve(10) → Reserve(1) declines →
    // CancelReservation(10) → available=10, reserved=0.
    let (repository, stock_store, lock_manager, id) = seeded_fixture(1, 10).await;
    let reserve = ReserveStockHandler::new(
        repository.clone(),
        stock_store.clone(),
        lock_manager,
        patient_policy(),
    );
    let cancel = CancelReservationHandler::new(repository.clone(), stock_store.clone());

    assert_eq!(
        reserve
            .handle(ReserveStockCommand {
                product_id: id,
                quantity: 10
            })
            .await
            .unwrap(),
        ReserveOutcome::Reserved
    );
    assert_eq!(
        reserve
            .handle(ReserveStockCommand {
                product_id: id,
                quantity: 1
            })
            .await
            .unwrap(),
        ReserveOutcome::Declined
    );

    cancel
        .handle(CancelReservationCommand {
            product_id: id,
            quantity: 10,
        })
        .await
        .unwrap();

    assert_eq!(stock_store.counters(id), Some((10, 0)));
    let product = repository.find_by_id(id).await.unwrap();
    assert_eq!(product.stock().available(), 10);
    assert_eq!(product.stock().reserved(), 0);
}

#[tokio::test]
async fn full_lifecycle_create_reserve_confirm() {
    let repository = InMemoryProductRepository::new();
    let stock_store = InMemoryStockStore::new();
    let lock_manager = InMemoryLockManager::new();
    let clock: Arc<dyn Clock> = Arc::new(test_clock());
    let id_generator = Arc::new(IdGenerator::new(1, clock.clone()).unwrap());

    let create = CreateProductHandler::new(
        id_generator,
        clock,
        repository.clone(),
        stock_store.clone(),
    );
    let id = create
        .handle(CreateProductCommand {
            name: "Limited Sneaker".to_string(),
            description: "Flash sale item".to_string(),
            sku: "SNKR-1".to_string(),
            quantity: 10,
        })
        .await
        .unwrap();

    // Onboarding seeded the cache.
    assert_eq!(stock_store.counters(id), Some((10, 0)));

    let reserve = ReserveStockHandler::new(
        repository.clone(),
        stock_store.clone(),
        lock_manager,
        patient_policy(),
    );
    let confirm = ConfirmReservationHandler::new(repository.clone(), stock_store.clone());

    assert_eq!(
        reserve
            .handle(ReserveStockCommand {
                product_id: id,
                quantity: 4
            })
            .await
            .unwrap(),
        ReserveOutcome::Reserved
    );
    confirm
        .handle(ConfirmReservationCommand {
            product_id: id,
            quantity: 4,
        })
        .await
        .unwrap();

    // Confirm shrinks the total: the goods left inventory.
    assert_eq!(stock_store.counters(id), Some((6, 0)));
    let product = repository.find_by_id(id).await.unwrap();
    assert_eq!(product.stock().available(), 6);
    assert_eq!(product.stock().reserved(), 0);

    // Confirming more than is reserved is rejected.
    let result = confirm
        .handle(ConfirmReservationCommand {
            product_id: id,
            quantity: 1,
        })
        .await;
    assert!(matches!(result, Err(ServiceError::StockStore(_))));
}
