use chrono::{DateTime, Duration, Utc};
use log::*;
use msr_common::Secret;
use reqwest::Client;
use tokio::sync::Mutex;

use crate::{config::MeliConfig, data_objects::TokenGrant, error::MeliApiError};

/// Tokens expire this much earlier than the server-declared lifetime, so a token handed out just before the
/// deadline is still valid for the request it authorises.
const EXPIRY_MARGIN: Duration = Duration::seconds(60);

/// Holds one seller's bearer credential and refreshes it lazily. All access goes through a mutex, so when the
/// token is stale, exactly one caller performs the refresh while the others wait for the result.
pub struct TokenCache {
    seller_id: u64,
    state: Mutex<TokenState>,
}

struct TokenState {
    refresh_token: Secret<String>,
    access_token: Option<Secret<String>>,
    expires_at: DateTime<Utc>,
}

impl TokenCache {
    pub fn new(seller_id: u64, refresh_token: Secret<String>) -> Self {
        let state =
            TokenState { refresh_token, access_token: None, expires_at: DateTime::<Utc>::MIN_UTC };
        Self { seller_id, state: Mutex::new(state) }
    }

    /// Returns a valid bearer token for this seller, refreshing it first when absent or past its expiry.
    /// Refresh failures propagate; callers must not fall back to a stale token.
    pub async fn access_token(&self, client: &Client, config: &MeliConfig) -> Result<String, MeliApiError> {
        let mut state = self.state.lock().await;
        if state.access_token.is_none() || Utc::now() >= state.expires_at {
            self.refresh(&mut state, client, config).await?;
        }
        match &state.access_token {
            Some(token) => Ok(token.reveal().clone()),
            None => Err(MeliApiError::TokenRefresh("refresh completed without issuing a token".to_string())),
        }
    }

    async fn refresh(
        &self,
        state: &mut TokenState,
        client: &Client,
        config: &MeliConfig,
    ) -> Result<(), MeliApiError> {
        debug!("🔑️ Renewing access token for seller {}", self.seller_id);
        let url = format!("{}/oauth/token", config.api_url);
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", config.app_id.as_str()),
            ("client_secret", config.client_secret.reveal().as_str()),
            ("refresh_token", state.refresh_token.reveal().as_str()),
        ];
        let response = client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|e| MeliApiError::TokenRefresh(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            error!("🔑️ Token refresh for seller {} failed with status {status}. {message}", self.seller_id);
            return Err(MeliApiError::QueryError { status, message });
        }
        let grant = response.json::<TokenGrant>().await.map_err(|e| MeliApiError::JsonError(e.to_string()))?;
        state.access_token = Some(Secret::new(grant.access_token));
        state.expires_at = Utc::now() + Duration::seconds(grant.expires_in) - EXPIRY_MARGIN;
        if let Some(rotated) = grant.refresh_token {
            state.refresh_token = Secret::new(rotated);
        }
        info!("🔑️ Access token for seller {} renewed. Valid until {}", self.seller_id, state.expires_at);
        Ok(())
    }
}
