mod api;
mod auth;
mod config;
mod error;

mod data_objects;

pub use api::MeliApi;
pub use auth::TokenCache;
pub use config::{MeliConfig, DEFAULT_MELI_API_URL};
pub use data_objects::{
    Buyer,
    FeeDetail,
    ItemInfo,
    Order,
    OrderItem,
    Payment,
    SenderCost,
    Shipping,
    ShipmentCosts,
    TokenGrant,
};
pub use error::MeliApiError;
