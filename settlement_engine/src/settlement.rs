use msr_common::Centavos;
use serde::{Deserialize, Serialize};

/// Sales tax withheld on the gross order value, in basis points (7.15%).
pub const SALES_TAX_BASIS_POINTS: i64 = 715;

/// One labelled fee component, e.g. `"management_fee"` or `"shipping_fee"`. Amounts are absolute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    pub label: String,
    pub amount: Centavos,
}

/// Which source the marketplace fee was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeSource {
    /// Itemized fee components were present on the order payload.
    Itemized,
    /// No itemized components; the fee is the sum of each line item's sale fee.
    SaleFees,
}

/// Everything the settlement formula needs, already converted to integer centavos. Assembled by the server's
/// marketplace integration from the raw order and shipment payloads.
#[derive(Debug, Clone)]
pub struct SettlementInput {
    pub seller_id: u64,
    /// Order total.
    pub gross: Centavos,
    /// Itemized fee components as they appear on the wire; amounts may carry either sign.
    pub fees: Vec<FeeLine>,
    /// Per-line-item sale fees, the fallback fee source.
    pub item_sale_fees: Vec<Centavos>,
    /// Who pays how much of the shipment, straight from the cost breakdown.
    pub shipping_senders: Vec<SenderShare>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderShare {
    pub user_id: u64,
    pub cost: Centavos,
}

/// The derived settlement figures. Never stored as-is; the ledger keeps only gross and net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementBreakdown {
    pub gross: Centavos,
    pub marketplace_fee: Centavos,
    /// The labelled components behind `marketplace_fee`, absolute amounts. Empty when the fallback source was
    /// used.
    pub fee_lines: Vec<FeeLine>,
    pub fee_source: FeeSource,
    pub shipping_cost: Centavos,
    pub tax: Centavos,
    pub net: Centavos,
}

/// Computes the net proceeds of one order:
///
/// `net = gross − marketplace_fee − shipping_cost − tax`
///
/// where the marketplace fee prefers itemized fee components (summed as absolute values) over the per-item
/// sale-fee fallback, the shipping cost is the sum of cost entries payable by this seller, and the tax is a
/// fixed fraction of gross. All arithmetic is integer centavos, so the result is exact and reproducible.
pub fn compute_settlement(input: &SettlementInput) -> SettlementBreakdown {
    let (fee_lines, fee_source) = if input.fees.is_empty() {
        (Vec::new(), FeeSource::SaleFees)
    } else {
        let lines = input
            .fees
            .iter()
            .map(|f| FeeLine { label: f.label.clone(), amount: f.amount.abs() })
            .collect::<Vec<FeeLine>>();
        (lines, FeeSource::Itemized)
    };
    let marketplace_fee = match fee_source {
        FeeSource::Itemized => fee_lines.iter().map(|f| f.amount).sum(),
        FeeSource::SaleFees => input.item_sale_fees.iter().copied().sum(),
    };
    let shipping_cost = input
        .shipping_senders
        .iter()
        .filter(|s| s.user_id == input.seller_id)
        .map(|s| s.cost)
        .sum::<Centavos>();
    let tax = input.gross.basis_points(SALES_TAX_BASIS_POINTS);
    let net = input.gross - marketplace_fee - shipping_cost - tax;
    SettlementBreakdown { gross: input.gross, marketplace_fee, fee_lines, fee_source, shipping_cost, tax, net }
}
