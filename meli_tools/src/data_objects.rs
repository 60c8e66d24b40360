use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payment resource, fetched from the path carried in a `payments` notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: u64,
    pub status: String,
    /// Only present once the payment has been attached to an order.
    #[serde(default)]
    pub order_id: Option<u64>,
}

impl Payment {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}

/// Order detail as returned by `GET /orders/{id}`. Only the fields the settlement pipeline reads are modelled;
/// the marketplace sends a great deal more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// Freshly created orders occasionally arrive without a creation stamp; such orders are skipped.
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    /// Itemized fee components. Older order payloads omit this list and only carry per-item sale fees.
    #[serde(default)]
    pub fees: Vec<FeeDetail>,
    #[serde(default)]
    pub buyer: Option<Buyer>,
    #[serde(default)]
    pub shipping: Option<Shipping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub item: Option<ItemInfo>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub sale_fee: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeDetail {
    #[serde(rename = "type")]
    pub fee_type: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buyer {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Buyer {
    /// "First Last", falling back to the nickname, falling back to "N/A".
    pub fn display_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        if !full.is_empty() {
            full.to_string()
        } else {
            self.nickname.clone().unwrap_or_else(|| "N/A".to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipping {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub logistic_type: Option<String>,
}

/// Cost breakdown for a shipment, `GET /shipments/{id}/costs`. Each sender entry says how much one party pays
/// towards the shipment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentCosts {
    #[serde(default)]
    pub senders: Vec<SenderCost>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderCost {
    pub user_id: u64,
    #[serde(default)]
    pub cost: f64,
}

/// Response of the OAuth token endpoint for the `refresh_token` grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: i64,
    /// The marketplace rotates refresh tokens; when present, the new one replaces the stored one.
    #[serde(default)]
    pub refresh_token: Option<String>,
}
