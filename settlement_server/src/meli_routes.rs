//----------------------------------------------   Triage  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{debug, error, info, trace};
use settlement_engine::{db_types::QueueEntry, traits::QueueManagement, ProcessedOrders};

use crate::{
    accounts::MarketplaceAccounts,
    config::ProxyOptions,
    data_objects::{JsonResponse, WebhookNotification},
    helpers::get_remote_ip,
    integrations::meli::MarketplaceApi,
    route,
};

route!(meli_webhook => Post "" impl QueueManagement, MarketplaceApi);
/// The fast path: classify the notification, resolve it to an order id, and queue it. All the slow work
/// (maturation, order fetch, settlement arithmetic) happens later in the settlement worker.
///
/// Webhook responses must always be in the 200 range, otherwise the marketplace will retry-storm a handler that
/// is deliberately dropping duplicates. Internal failures are logged, never surfaced.
pub async fn meli_webhook<TQ, TM>(
    req: HttpRequest,
    body: web::Json<WebhookNotification>,
    queue: web::Data<TQ>,
    accounts: web::Data<MarketplaceAccounts<TM>>,
    processed: web::Data<ProcessedOrders>,
    proxy: web::Data<ProxyOptions>,
) -> HttpResponse
where
    TQ: QueueManagement,
    TM: MarketplaceApi,
{
    let peer = get_remote_ip(&req, proxy.use_x_forwarded_for, proxy.use_forwarded);
    trace!("🔔️ Received webhook notification from {peer:?}");
    let note = body.into_inner();
    let result = triage(note, queue.as_ref(), accounts.as_ref(), processed.as_ref()).await;
    HttpResponse::Ok().json(result)
}

async fn triage<TQ, TM>(
    note: WebhookNotification,
    queue: &TQ,
    accounts: &MarketplaceAccounts<TM>,
    processed: &ProcessedOrders,
) -> JsonResponse
where
    TQ: QueueManagement,
    TM: MarketplaceApi,
{
    let Some(seller_id) = note.user_id else {
        return JsonResponse::success("ignored: no user_id");
    };
    let Some(api) = accounts.for_seller(seller_id) else {
        debug!("🔔️ Notification for unmanaged seller {seller_id}. Dropping.");
        return JsonResponse::success("ignored: unmanaged seller");
    };
    if note.topic.as_deref() != Some("payments") {
        trace!("🔔️ Ignoring notification with topic {:?} for seller {seller_id}", note.topic);
        return JsonResponse::success("ignored: topic");
    }
    let Some(resource) = note.resource else {
        debug!("🔔️ Payment notification for seller {seller_id} carries no resource path. Dropping.");
        return JsonResponse::success("ignored: no resource");
    };
    info!("🔔️ Payment notification received for seller {seller_id}: {resource}");
    let payment = match api.fetch_payment(&resource).await {
        Ok(payment) => payment,
        Err(e) => {
            // Not worth a retry from the sender's side; if the payment matters it will be notified again.
            error!("🔔️ Could not fetch payment resource {resource} for seller {seller_id}. {e}");
            return JsonResponse::success("accepted");
        },
    };
    let order_id = match payment.order_id {
        Some(order_id) if payment.is_approved() => order_id,
        _ => {
            debug!(
                "🔔️ Payment {} has status '{}' and order {:?}. Nothing to settle yet.",
                payment.id, payment.status, payment.order_id
            );
            return JsonResponse::success("ignored: not approved");
        },
    };
    if processed.contains(order_id) {
        info!("🔔️ Order {order_id} has already been accepted for settlement. Ignoring duplicate notification.");
        return JsonResponse::success("ignored: duplicate");
    }
    match queue.is_pending(order_id).await {
        Ok(true) => {
            info!("🔔️ Order {order_id} is already waiting in the queue. Ignoring duplicate notification.");
            return JsonResponse::success("ignored: already queued");
        },
        Ok(false) => {},
        Err(e) => {
            error!("🔔️ Could not check the queue for order {order_id}. {e}");
            return JsonResponse::success("accepted");
        },
    }
    let entry = QueueEntry::new(seller_id, order_id, Utc::now());
    match queue.enqueue(entry).await {
        Ok(()) => {
            info!("🔔️ Order {order_id} for seller {seller_id} queued for settlement.");
            JsonResponse::success("queued")
        },
        Err(e) => {
            error!("🔔️ Could not enqueue order {order_id}. {e}");
            JsonResponse::success("accepted")
        },
    }
}
