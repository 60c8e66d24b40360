//! Operator-facing Telegram texts. All formatting is pure so the exact wording stays under test; the workers
//! only decide *when* to send.
use chrono::{DateTime, Utc};
use meli_tools::Order;
use settlement_engine::{
    db_types::QueueEntry,
    reports::PeriodSummary,
    settlement::SettlementBreakdown,
};

use crate::config::SellerProfile;

/// The rich sale alert, sent once per settled order.
pub fn sale_alert(profile: &SellerProfile, order: &Order, breakdown: &SettlementBreakdown) -> String {
    let sale_date =
        order.date_created.map(|d| d.format("%d/%m/%Y às %H:%M").to_string()).unwrap_or_else(|| "N/A".to_string());
    let buyer = order.buyer.as_ref().map(|b| b.display_name()).unwrap_or_else(|| "N/A".to_string());
    let first_item = order.order_items.first().and_then(|i| i.item.as_ref());
    let title = first_item.and_then(|i| i.title.as_deref()).unwrap_or("N/A");
    let mlb_id = first_item.and_then(|i| i.id.as_deref()).unwrap_or("N/A");
    let shipping_mode = match order.shipping.as_ref().and_then(|s| s.logistic_type.as_deref()) {
        Some("fulfillment") => "Mercado Envios (FULL)",
        _ => "Mercado Envios (Empresa)",
    };

    let mut message = format!(
        "💰 <b>NOVA VENDA APROVADA</b> 💰\n\n\
         🏪 <b>Vendedor:</b> {} <b>{}</b>\n\
         🗓️ <b>Data:</b> {sale_date}\n\n\
         👤 <b>Comprador:</b> {buyer}\n\
         📦 <b>Produto:</b> {title}\n\
         🆔 <b>MLB:</b> {mlb_id}\n\
         🧾 <b>ID Venda:</b> {}\n\
         🚚 <b>Envio:</b> {shipping_mode}\n\n\
         💵 <b>Valor Total:</b> {}\n\
         💸 <b>Tarifa Total ML:</b> -{}\n",
        profile.emoji, profile.nickname, order.id, breakdown.gross, breakdown.marketplace_fee
    );
    for fee in &breakdown.fee_lines {
        message += &format!("      ↳ {}: -{}\n", fee.label, fee.amount);
    }
    if breakdown.shipping_cost.is_positive() {
        message += &format!("🚛 <b>Custo de Envio:</b> -{}\n", breakdown.shipping_cost);
    }
    message += &format!(
        "📉 <b>Imposto (7,15%):</b> -{}\n✅ <b>Valor Líquido Final:</b> {}",
        breakdown.tax, breakdown.net
    );
    message
}

pub fn daily_report(now: DateTime<Utc>, summary: &PeriodSummary) -> String {
    format!(
        "📊 <b>RELATÓRIO DIÁRIO DE VENDAS</b> 📊\n\
         <em>Data: {}</em>\n\n\
         📦 <b>Unidades Vendidas:</b> {}\n\n\
         💵 <b>Faturamento Bruto:</b> {}\n\
         ✅ <b>Faturamento Líquido:</b> {}\n\n\
         📉 <b>Total de Custos (Tarifa+Imp):</b> {}\n\
         💡 <b>Percentual de Custo:</b> {:.2}%",
        now.format("%d/%m/%Y"),
        summary.units,
        summary.gross,
        summary.net,
        summary.cost(),
        summary.cost_percentage()
    )
}

pub fn monthly_report(now: DateTime<Utc>, summary: &PeriodSummary) -> String {
    format!(
        "🏆 <b>RELATÓRIO MENSAL CONSOLIDADO</b> 🏆\n\
         <em>Mês de Referência: {}</em>\n\n\
         📦 <b>Total de Unidades Vendidas:</b> {}\n\n\
         💵 <b>Faturamento Bruto Total:</b> {}\n\
         ✅ <b>Faturamento Líquido Total:</b> {}\n\n\
         📉 <b>Total de Custos (Tarifa+Imp):</b> {}\n\
         💡 <b>Percentual de Custo Total:</b> {:.2}%",
        now.format("%B de %Y"),
        summary.units,
        summary.gross,
        summary.net,
        summary.cost(),
        summary.cost_percentage()
    )
}

/// Diagnostic detail for the debug-only recipient when an entry fails to settle.
pub fn settlement_failure(entry: &QueueEntry, error: &str) -> String {
    format!(
        "🚨 <b>FALHA NO PROCESSAMENTO DE VENDA</b> 🚨\n\n\
         🧾 <b>ID Venda:</b> {}\n\
         🏪 <b>Vendedor:</b> {}\n\
         🕰 <b>Na fila desde:</b> {}\n\
         ❌ <b>Erro:</b> {error}",
        entry.order_id,
        entry.seller_id,
        entry.enqueued_at.format("%d/%m/%Y %H:%M:%S")
    )
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use msr_common::Centavos;
    use settlement_engine::{
        reports::PeriodSummary,
        settlement::{FeeLine, FeeSource, SettlementBreakdown},
    };

    use super::{daily_report, sale_alert};
    use crate::config::SellerProfile;

    fn breakdown() -> SettlementBreakdown {
        SettlementBreakdown {
            gross: Centavos::from(10_000),
            marketplace_fee: Centavos::from(1_000),
            fee_lines: Vec::new(),
            fee_source: FeeSource::SaleFees,
            shipping_cost: Centavos::from(500),
            tax: Centavos::from(715),
            net: Centavos::from(7_785),
        }
    }

    fn order() -> meli_tools::Order {
        serde_json::from_value(serde_json::json!({
            "id": 1001,
            "date_created": "2024-05-01T10:15:00Z",
            "total_amount": 100.0,
            "order_items": [{"item": {"id": "MLB1", "title": "Vara de pesca"}}],
            "buyer": {"first_name": "Ana", "last_name": "Souza"},
            "shipping": {"id": 9, "logistic_type": "fulfillment"}
        }))
        .expect("order fixture")
    }

    #[test]
    fn sale_alert_lists_all_amounts() {
        let profile = SellerProfile { nickname: "EQUIPESCAFORTE".into(), emoji: "🐟".into() };
        let text = sale_alert(&profile, &order(), &breakdown());
        assert!(text.contains("<b>EQUIPESCAFORTE</b>"));
        assert!(text.contains("👤 <b>Comprador:</b> Ana Souza"));
        assert!(text.contains("🧾 <b>ID Venda:</b> 1001"));
        assert!(text.contains("🚚 <b>Envio:</b> Mercado Envios (FULL)"));
        assert!(text.contains("💵 <b>Valor Total:</b> R$ 100.00"));
        assert!(text.contains("💸 <b>Tarifa Total ML:</b> -R$ 10.00"));
        assert!(text.contains("🚛 <b>Custo de Envio:</b> -R$ 5.00"));
        assert!(text.contains("📉 <b>Imposto (7,15%):</b> -R$ 7.15"));
        assert!(text.contains("✅ <b>Valor Líquido Final:</b> R$ 77.85"));
    }

    #[test]
    fn sale_alert_breaks_down_itemized_fees() {
        let profile = SellerProfile { nickname: "LOJA".into(), emoji: "🏪".into() };
        let mut breakdown = breakdown();
        breakdown.fee_lines = vec![
            FeeLine { label: "management_fee".into(), amount: Centavos::from(800) },
            FeeLine { label: "shipping_fee".into(), amount: Centavos::from(200) },
        ];
        breakdown.fee_source = FeeSource::Itemized;
        let text = sale_alert(&profile, &order(), &breakdown);
        assert!(text.contains("↳ management_fee: -R$ 8.00"));
        assert!(text.contains("↳ shipping_fee: -R$ 2.00"));
    }

    #[test]
    fn zero_shipping_cost_is_omitted() {
        let profile = SellerProfile { nickname: "LOJA".into(), emoji: "🏪".into() };
        let mut breakdown = breakdown();
        breakdown.shipping_cost = Centavos::from(0);
        let text = sale_alert(&profile, &order(), &breakdown);
        assert!(!text.contains("Custo de Envio"));
    }

    #[test]
    fn daily_report_figures() {
        let summary = PeriodSummary { units: 3, gross: Centavos::from(17_500), net: Centavos::from(13_785) };
        let text = daily_report(Utc::now(), &summary);
        assert!(text.contains("📦 <b>Unidades Vendidas:</b> 3"));
        assert!(text.contains("💵 <b>Faturamento Bruto:</b> R$ 175.00"));
        assert!(text.contains("📉 <b>Total de Custos (Tarifa+Imp):</b> R$ 37.15"));
        assert!(text.contains("💡 <b>Percentual de Custo:</b> 21.23%"));
    }
}
