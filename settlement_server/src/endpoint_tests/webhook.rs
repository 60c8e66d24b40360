use std::{collections::HashMap, sync::Arc};

use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use chrono::Utc;
use meli_tools::{MeliApiError, Payment};
use mockall::predicate::eq;
use serde_json::{json, Value};
use settlement_engine::ProcessedOrders;

use super::mocks::{MockMarketplace, MockQueue};
use crate::{
    accounts::MarketplaceAccounts,
    config::ProxyOptions,
    data_objects::JsonResponse,
    meli_routes::MeliWebhookRoute,
};

const SELLER: u64 = 323091477;

fn approved_payment(order_id: u64) -> Payment {
    Payment { id: 999, status: "approved".to_string(), order_id: Some(order_id) }
}

fn notification() -> Value {
    json!({"topic": "payments", "resource": "/payments/999", "user_id": SELLER})
}

async fn send_notification(
    queue: MockQueue,
    marketplace: MockMarketplace,
    processed: Arc<ProcessedOrders>,
    body: Value,
) -> (StatusCode, JsonResponse) {
    let _ = env_logger::try_init().ok();
    let accounts = Arc::new(MarketplaceAccounts::new(HashMap::from([(SELLER, marketplace)])));
    let app = App::new()
        .app_data(web::Data::new(queue))
        .app_data(web::Data::from(accounts))
        .app_data(web::Data::from(processed))
        .app_data(web::Data::new(ProxyOptions::default()))
        .service(web::scope("/ml-notifications").service(MeliWebhookRoute::<MockQueue, MockMarketplace>::new()));
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/ml-notifications").set_json(&body).to_request();
    let (_req, res) = test::call_service(&service, req).await.into_parts();
    let status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    let response = serde_json::from_slice::<JsonResponse>(&body).expect("response body should be a JsonResponse");
    (status, response)
}

#[actix_web::test]
async fn an_approved_payment_is_queued_once() {
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_payment().with(eq("/payments/999")).times(1).returning(|_| Ok(approved_payment(1001)));
    let mut queue = MockQueue::new();
    queue.expect_is_pending().with(eq(1001)).times(1).returning(|_| Ok(false));
    queue
        .expect_enqueue()
        .withf(|entry| {
            entry.seller_id == SELLER && entry.order_id == 1001 && (Utc::now() - entry.enqueued_at).num_seconds() < 5
        })
        .times(1)
        .returning(|_| Ok(()));
    let (status, response) = send_notification(queue, marketplace, Arc::default(), notification()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.success);
    assert_eq!(response.message, "queued");
}

#[actix_web::test]
async fn duplicate_orders_are_not_queued_again() {
    let processed = Arc::new(ProcessedOrders::new());
    processed.claim(1001);
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_payment().times(1).returning(|_| Ok(approved_payment(1001)));
    let mut queue = MockQueue::new();
    queue.expect_is_pending().times(0);
    queue.expect_enqueue().times(0);
    let (status, response) = send_notification(queue, marketplace, processed, notification()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.success);
    assert_eq!(response.message, "ignored: duplicate");
}

#[actix_web::test]
async fn a_redelivery_before_maturation_is_not_queued_again() {
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_payment().times(1).returning(|_| Ok(approved_payment(1001)));
    let mut queue = MockQueue::new();
    queue.expect_is_pending().with(eq(1001)).times(1).returning(|_| Ok(true));
    queue.expect_enqueue().times(0);
    let (_, response) = send_notification(queue, marketplace, Arc::default(), notification()).await;
    assert!(response.success);
    assert_eq!(response.message, "ignored: already queued");
}

#[actix_web::test]
async fn unmanaged_sellers_are_acknowledged_and_dropped() {
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_payment().times(0);
    let mut queue = MockQueue::new();
    queue.expect_enqueue().times(0);
    let body = json!({"topic": "payments", "resource": "/payments/999", "user_id": 555});
    let (status, response) = send_notification(queue, marketplace, Arc::default(), body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.success);
    assert_eq!(response.message, "ignored: unmanaged seller");
}

#[actix_web::test]
async fn other_topics_are_acknowledged_and_dropped() {
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_payment().times(0);
    let mut queue = MockQueue::new();
    queue.expect_enqueue().times(0);
    let body = json!({"topic": "questions", "resource": "/questions/42", "user_id": SELLER});
    let (_, response) = send_notification(queue, marketplace, Arc::default(), body).await;
    assert!(response.success);
    assert_eq!(response.message, "ignored: topic");
}

#[actix_web::test]
async fn unapproved_payments_are_not_queued() {
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_payment().times(1).returning(|_| {
        Ok(Payment { id: 999, status: "pending".to_string(), order_id: Some(1001) })
    });
    let mut queue = MockQueue::new();
    queue.expect_enqueue().times(0);
    let (_, response) = send_notification(queue, marketplace, Arc::default(), notification()).await;
    assert!(response.success);
    assert_eq!(response.message, "ignored: not approved");
}

#[actix_web::test]
async fn payment_fetch_failures_still_acknowledge() {
    let mut marketplace = MockMarketplace::new();
    marketplace
        .expect_fetch_payment()
        .times(1)
        .returning(|_| Err(MeliApiError::QueryError { status: 500, message: "boom".into() }));
    let mut queue = MockQueue::new();
    queue.expect_enqueue().times(0);
    let (status, response) = send_notification(queue, marketplace, Arc::default(), notification()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.success);
    assert_eq!(response.message, "accepted");
}

#[actix_web::test]
async fn a_missing_body_is_the_only_client_error() {
    let _ = env_logger::try_init().ok();
    let accounts = Arc::new(MarketplaceAccounts::<MockMarketplace>::new(HashMap::new()));
    let app = App::new()
        .app_data(web::Data::new(MockQueue::new()))
        .app_data(web::Data::from(accounts))
        .app_data(web::Data::from(Arc::new(ProcessedOrders::new())))
        .app_data(web::Data::new(ProxyOptions::default()))
        .service(web::scope("/ml-notifications").service(MeliWebhookRoute::<MockQueue, MockMarketplace>::new()));
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/ml-notifications").to_request();
    let status = match test::try_call_service(&service, req).await {
        Ok(res) => res.status(),
        Err(e) => e.as_response_error().status_code(),
    };
    assert!(status.is_client_error());
}
