use std::collections::HashMap;

use log::*;
use meli_tools::MeliApi;

use crate::{config::ServerConfig, errors::ServerError};

/// The fleet of marketplace clients, one per managed seller. Generic over the client so the triage handler and
/// the settlement worker can run against a mock marketplace in tests.
pub struct MarketplaceAccounts<M> {
    managers: HashMap<u64, M>,
}

impl<M> MarketplaceAccounts<M> {
    pub fn new(managers: HashMap<u64, M>) -> Self {
        Self { managers }
    }

    /// `None` means the notification belongs to a seller this deployment does not manage and must be dropped.
    pub fn for_seller(&self, seller_id: u64) -> Option<&M> {
        self.managers.get(&seller_id)
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

impl MarketplaceAccounts<MeliApi> {
    pub fn try_from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let mut managers = HashMap::with_capacity(config.sellers.len());
        for seller in &config.sellers {
            let api = MeliApi::new(seller.seller_id, seller.refresh_token.clone(), config.meli.clone())
                .map_err(|e| ServerError::InitializeError(e.to_string()))?;
            managers.insert(seller.seller_id, api);
        }
        info!("🧭️ Account fleet initialized with {} seller(s) under watch", managers.len());
        Ok(Self::new(managers))
    }
}
