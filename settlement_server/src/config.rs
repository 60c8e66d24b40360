use std::{collections::HashMap, env, net::IpAddr, path::PathBuf, time::Duration as StdDuration};

use chrono::{Duration, NaiveTime};
use log::*;
use meli_tools::MeliConfig;
use msr_common::{parse_boolean_flag, Secret};
use telegram_tools::TelegramConfig;

use crate::errors::ServerError;

const DEFAULT_MSR_HOST: &str = "127.0.0.1";
const DEFAULT_MSR_PORT: u16 = 10000;
const DEFAULT_QUEUE_FILE: &str = "order_queue.json";
const DEFAULT_LEDGER_FILE: &str = "sales_ledger.json";
/// How long a freshly observed order sits in the queue before its detail is trusted to be fully populated.
const DEFAULT_MATURATION_WINDOW: Duration = Duration::minutes(5);
const DEFAULT_POLL_INTERVAL: StdDuration = StdDuration::from_secs(30);
const DEFAULT_DAILY_REPORT_AT: (u32, u32) = (23, 59);
const DEFAULT_MONTHLY_REPORT_AT: (u32, u32) = (23, 58);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Durable FIFO of pending order references.
    pub queue_file: PathBuf,
    /// Durable append-only sales ledger.
    pub ledger_file: PathBuf,
    pub maturation_window: Duration,
    pub poll_interval: StdDuration,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// If supplied, requests against the webhook endpoint will be checked against a whitelist of marketplace
    /// notification IP addresses. To explicitly disable the whitelist, set it to "false", "none", or "0".
    pub whitelist: Option<Vec<IpAddr>>,
    pub meli: MeliConfig,
    /// The seller accounts under management. At least one is required.
    pub sellers: Vec<SellerAccount>,
    pub notifications: NotificationConfig,
    pub daily_report_at: NaiveTime,
    pub monthly_report_at: NaiveTime,
}

#[derive(Clone, Debug)]
pub struct SellerAccount {
    pub seller_id: u64,
    pub nickname: String,
    pub emoji: String,
    pub refresh_token: Secret<String>,
}

/// The display identity of a seller, used when composing alerts.
#[derive(Clone, Debug)]
pub struct SellerProfile {
    pub nickname: String,
    pub emoji: String,
}

impl SellerProfile {
    pub fn unknown(seller_id: u64) -> Self {
        Self { nickname: format!("ID {seller_id}"), emoji: "🏪".to_string() }
    }
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub telegram: TelegramConfig,
    /// The operator-facing recipients for sale alerts and reports.
    pub chat_ids: Vec<String>,
    /// Diagnostic alerts go here and only here. When absent, diagnostics are only logged.
    pub debug_chat_id: Option<String>,
}

impl ServerConfig {
    /// Builds the full configuration from the environment. Any missing mandatory credential is a fatal error;
    /// the caller must terminate the process without serving.
    pub fn try_from_env() -> Result<Self, ServerError> {
        let host = env::var("MSR_HOST").ok().unwrap_or_else(|| DEFAULT_MSR_HOST.into());
        let port = env::var("MSR_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MSR_PORT. {e} Using the default, {DEFAULT_MSR_PORT}, instead."
                    );
                    DEFAULT_MSR_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MSR_PORT);
        let queue_file =
            env::var("MSR_QUEUE_FILE").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_QUEUE_FILE));
        let ledger_file =
            env::var("MSR_LEDGER_FILE").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_LEDGER_FILE));
        let app_id = require_env("MSR_MELI_APP_ID")?;
        let client_secret = Secret::new(require_env("MSR_MELI_CLIENT_SECRET")?);
        let mut meli = MeliConfig::new(app_id, client_secret);
        if let Ok(url) = env::var("MSR_MELI_API_URL") {
            meli.api_url = url;
        }
        let sellers = configure_sellers()?;
        let notifications = configure_notifications()?;
        let use_x_forwarded_for = parse_boolean_flag(env::var("MSR_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("MSR_USE_FORWARDED").ok(), false);
        let whitelist = configure_whitelist();
        let (maturation_window, poll_interval) = configure_worker_timing();
        let daily_report_at = configure_report_time("MSR_DAILY_REPORT_AT", DEFAULT_DAILY_REPORT_AT);
        let monthly_report_at = configure_report_time("MSR_MONTHLY_REPORT_AT", DEFAULT_MONTHLY_REPORT_AT);
        Ok(Self {
            host,
            port,
            queue_file,
            ledger_file,
            maturation_window,
            poll_interval,
            use_x_forwarded_for,
            use_forwarded,
            whitelist,
            meli,
            sellers,
            notifications,
            daily_report_at,
            monthly_report_at,
        })
    }

    pub fn seller_profiles(&self) -> HashMap<u64, SellerProfile> {
        self.sellers
            .iter()
            .map(|s| (s.seller_id, SellerProfile { nickname: s.nickname.clone(), emoji: s.emoji.clone() }))
            .collect()
    }
}

fn require_env(key: &str) -> Result<String, ServerError> {
    env::var(key).map_err(|e| ServerError::ConfigurationError(format!("{e} [{key}]")))
}

/// One managed seller per id in `MSR_MELI_SELLER_IDS`. Each listed seller MUST have a refresh token; nickname and
/// emoji are cosmetic and optional.
fn configure_sellers() -> Result<Vec<SellerAccount>, ServerError> {
    let ids = require_env("MSR_MELI_SELLER_IDS")?;
    let mut sellers = Vec::new();
    for id in ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let seller_id = id.parse::<u64>().map_err(|e| {
            ServerError::ConfigurationError(format!("Invalid seller id ({id}) in MSR_MELI_SELLER_IDS: {e}"))
        })?;
        let refresh_token = Secret::new(require_env(&format!("MSR_MELI_REFRESH_TOKEN_{seller_id}"))?);
        let nickname =
            env::var(format!("MSR_MELI_NICKNAME_{seller_id}")).unwrap_or_else(|_| format!("ID {seller_id}"));
        let emoji = env::var(format!("MSR_MELI_EMOJI_{seller_id}")).unwrap_or_else(|_| "🏪".to_string());
        sellers.push(SellerAccount { seller_id, nickname, emoji, refresh_token });
    }
    if sellers.is_empty() {
        return Err(ServerError::ConfigurationError(
            "MSR_MELI_SELLER_IDS does not name any seller account. At least one managed seller is required."
                .to_string(),
        ));
    }
    info!("🪛️ {} seller account(s) configured: {}", sellers.len(), seller_list(&sellers));
    Ok(sellers)
}

fn seller_list(sellers: &[SellerAccount]) -> String {
    sellers.iter().map(|s| format!("{} ({})", s.nickname, s.seller_id)).collect::<Vec<String>>().join(", ")
}

fn configure_notifications() -> Result<NotificationConfig, ServerError> {
    let bot_token = Secret::new(require_env("MSR_TELEGRAM_BOT_TOKEN")?);
    let mut telegram = TelegramConfig::new(bot_token);
    if let Ok(url) = env::var("MSR_TELEGRAM_API_URL") {
        telegram.api_url = url;
    }
    let chat_ids = require_env("MSR_TELEGRAM_CHAT_IDS")?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect::<Vec<String>>();
    if chat_ids.is_empty() {
        return Err(ServerError::ConfigurationError(
            "MSR_TELEGRAM_CHAT_IDS is empty. The relay has nowhere to send alerts.".to_string(),
        ));
    }
    let debug_chat_id = env::var("MSR_TELEGRAM_DEBUG_CHAT_ID").ok().filter(|s| !s.trim().is_empty());
    if debug_chat_id.is_none() {
        warn!(
            "🪛️ MSR_TELEGRAM_DEBUG_CHAT_ID is not set. Diagnostic alerts will only appear in the server logs."
        );
    }
    Ok(NotificationConfig { telegram, chat_ids, debug_chat_id })
}

fn configure_whitelist() -> Option<Vec<IpAddr>> {
    let whitelist = env::var("MSR_MELI_IP_WHITELIST").ok().and_then(|s| {
        if ["none", "false", "0"].contains(&s.to_lowercase().as_str()) {
            info!(
                "🪛️ The marketplace IP whitelist is disabled. If this is not what you want, set \
                 MSR_MELI_IP_WHITELIST to a comma-separated list of IP addresses to enable it."
            );
            return None;
        }
        let ip_addrs = s
            .split(',')
            .filter_map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| {
                        warn!("🪛️ Ignoring invalid IP address ({s}) in MSR_MELI_IP_WHITELIST: {e}");
                        None::<IpAddr>
                    })
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The marketplace IP whitelist was configured, but is empty. The server will run, but won't \
                 accept any incoming webhook requests."
            );
        },
        None => {
            info!("🪛️ No marketplace IP whitelist is set. All webhook sources are accepted.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Marketplace IP whitelist: {addrs}");
        },
    }
    whitelist
}

fn configure_worker_timing() -> (Duration, StdDuration) {
    let maturation_window = env::var("MSR_MATURATION_WINDOW_SECS")
        .map_err(|_| {
            info!(
                "🪛️ MSR_MATURATION_WINDOW_SECS is not set. Using the default value of {} s.",
                DEFAULT_MATURATION_WINDOW.num_seconds()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::seconds)
                .map_err(|e| warn!("🪛️ Invalid configuration value for MSR_MATURATION_WINDOW_SECS. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_MATURATION_WINDOW);
    let poll_interval = env::var("MSR_POLL_INTERVAL_SECS")
        .map_err(|_| {
            info!(
                "🪛️ MSR_POLL_INTERVAL_SECS is not set. Using the default value of {} s.",
                DEFAULT_POLL_INTERVAL.as_secs()
            )
        })
        .and_then(|s| {
            s.parse::<u64>()
                .map(StdDuration::from_secs)
                .map_err(|e| warn!("🪛️ Invalid configuration value for MSR_POLL_INTERVAL_SECS. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_POLL_INTERVAL);
    (maturation_window, poll_interval)
}

fn configure_report_time(key: &str, default: (u32, u32)) -> NaiveTime {
    let fallback = NaiveTime::from_hms_opt(default.0, default.1, 0).unwrap_or(NaiveTime::MIN);
    env::var(key)
        .ok()
        .and_then(|s| {
            NaiveTime::parse_from_str(&s, "%H:%M")
                .map_err(|e| warn!("🪛️ Invalid time ({s}) for {key}: {e}. Using the default instead."))
                .ok()
        })
        .unwrap_or(fallback)
}

//-------------------------------------------------  ProxyOptions  ----------------------------------------------------
/// The subset of the server configuration that request handlers need to resolve the caller's address. Kept small
/// and free of secrets so it can be cloned into every worker.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ProxyOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
