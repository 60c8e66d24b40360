use log::*;
use msr_common::Secret;

pub const DEFAULT_MELI_API_URL: &str = "https://api.mercadolibre.com";

#[derive(Debug, Clone, Default)]
pub struct MeliConfig {
    /// The application id issued by the MercadoLibre developer console.
    pub app_id: String,
    pub client_secret: Secret<String>,
    pub api_url: String,
}

impl MeliConfig {
    pub fn new(app_id: String, client_secret: Secret<String>) -> Self {
        Self { app_id, client_secret, api_url: DEFAULT_MELI_API_URL.to_string() }
    }

    pub fn new_from_env_or_default() -> Self {
        let app_id = std::env::var("MSR_MELI_APP_ID").unwrap_or_else(|_| {
            warn!("MSR_MELI_APP_ID not set, using (probably useless) default");
            "0000000000000000".to_string()
        });
        let client_secret = Secret::new(std::env::var("MSR_MELI_CLIENT_SECRET").unwrap_or_else(|_| {
            warn!("MSR_MELI_CLIENT_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let api_url = std::env::var("MSR_MELI_API_URL").unwrap_or_else(|_| DEFAULT_MELI_API_URL.to_string());
        Self { app_id, client_secret, api_url }
    }
}
