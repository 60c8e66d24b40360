use meli_tools::{MeliApi, MeliApiError, Order, Payment, ShipmentCosts};
use msr_common::Centavos;
use settlement_engine::settlement::{FeeLine, SenderShare, SettlementInput};

/// The marketplace operations the relay consumes. `MeliApi` is the production implementation; tests substitute
/// a mock so the pipeline can be driven without network access.
#[allow(async_fn_in_trait)]
pub trait MarketplaceApi {
    /// Fetch the payment resource named in a webhook notification.
    async fn fetch_payment(&self, resource: &str) -> Result<Payment, MeliApiError>;
    /// Fetch full order detail by id.
    async fn fetch_order(&self, order_id: u64) -> Result<Order, MeliApiError>;
    /// Fetch the cost breakdown of a shipment.
    async fn fetch_shipment_costs(&self, shipment_id: u64) -> Result<ShipmentCosts, MeliApiError>;
}

impl MarketplaceApi for MeliApi {
    async fn fetch_payment(&self, resource: &str) -> Result<Payment, MeliApiError> {
        self.get_payment(resource).await
    }

    async fn fetch_order(&self, order_id: u64) -> Result<Order, MeliApiError> {
        self.get_order(order_id).await
    }

    async fn fetch_shipment_costs(&self, shipment_id: u64) -> Result<ShipmentCosts, MeliApiError> {
        self.get_shipment_costs(shipment_id).await
    }
}

/// Converts the wire payloads into the engine's settlement input, translating every floating-point Real amount
/// into integer centavos at this boundary and nowhere else.
pub fn settlement_input_from_order(order: &Order, costs: &ShipmentCosts, seller_id: u64) -> SettlementInput {
    let fees = order
        .fees
        .iter()
        .map(|f| FeeLine { label: f.fee_type.clone(), amount: Centavos::from_reais_f64(f.amount) })
        .collect();
    let item_sale_fees =
        order.order_items.iter().filter_map(|i| i.sale_fee).map(Centavos::from_reais_f64).collect();
    let shipping_senders = costs
        .senders
        .iter()
        .map(|s| SenderShare { user_id: s.user_id, cost: Centavos::from_reais_f64(s.cost) })
        .collect();
    SettlementInput {
        seller_id,
        gross: Centavos::from_reais_f64(order.total_amount),
        fees,
        item_sale_fees,
        shipping_senders,
    }
}
