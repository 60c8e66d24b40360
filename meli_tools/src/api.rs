use std::{sync::Arc, time::Duration};

use log::*;
use msr_common::Secret;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
    auth::TokenCache,
    config::MeliConfig,
    data_objects::{Order, Payment, ShipmentCosts},
    error::MeliApiError,
};

/// Every outbound call gets the same hard deadline; nothing in the pipeline may block indefinitely on the
/// marketplace.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for one managed seller account. Cheap to clone; clones share the underlying connection pool and
/// token cache.
#[derive(Clone)]
pub struct MeliApi {
    seller_id: u64,
    config: MeliConfig,
    client: Arc<Client>,
    tokens: Arc<TokenCache>,
}

impl MeliApi {
    pub fn new(seller_id: u64, refresh_token: Secret<String>, config: MeliConfig) -> Result<Self, MeliApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MeliApiError::Initialization(e.to_string()))?;
        let tokens = Arc::new(TokenCache::new(seller_id, refresh_token));
        Ok(Self { seller_id, config, client: Arc::new(client), tokens })
    }

    pub fn seller_id(&self) -> u64 {
        self.seller_id
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, MeliApiError> {
        let token = self.tokens.access_token(&self.client, &self.config).await?;
        let url = self.url(path);
        trace!("🛒️ Sending REST query: {url}");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| MeliApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("🛒️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MeliApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MeliApiError::RestResponseError(e.to_string()))?;
            Err(MeliApiError::QueryError { status, message })
        }
    }

    /// Fetch the payment resource named in a webhook notification. `resource` is the path as delivered, e.g.
    /// `/payments/12345678901`.
    pub async fn get_payment(&self, resource: &str) -> Result<Payment, MeliApiError> {
        debug!("🛒️ Fetching payment resource {resource} for seller {}", self.seller_id);
        let payment = self.rest_get::<Payment>(resource).await?;
        debug!("🛒️ Payment {} has status '{}'", payment.id, payment.status);
        Ok(payment)
    }

    pub async fn get_order(&self, order_id: u64) -> Result<Order, MeliApiError> {
        let path = format!("/orders/{order_id}");
        debug!("🛒️ Fetching order #{order_id}");
        let order = self.rest_get::<Order>(&path).await?;
        info!("🛒️ Fetched order #{order_id}");
        Ok(order)
    }

    pub async fn get_shipment_costs(&self, shipment_id: u64) -> Result<ShipmentCosts, MeliApiError> {
        let path = format!("/shipments/{shipment_id}/costs");
        debug!("🛒️ Fetching cost breakdown for shipment #{shipment_id}");
        self.rest_get::<ShipmentCosts>(&path).await
    }
}
