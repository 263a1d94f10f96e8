use std::collections::{BTreeSet, HashSet};

use crate::models::order::ShopifyOrder;
use crate::models::sheet_row::{Column, Row};
use crate::services::coercion::{coerce_money, coerce_quantity, format_timestamp, Coerced};
use crate::services::traceability::extract_traceability;

/// Flattens one order into a report row.
///
/// Pure and infallible: malformed fields fall back to empty or zero and are
/// recorded in [`Row::defaulted`].
pub fn map_order(order: &ShopifyOrder) -> Row {
    let mut row = Row::new();

    row.set(Column::OrderId, order.id.clone());
    row.set(Column::OrderName, order.name.clone());
    set_timestamp(&mut row, Column::CreatedAt, order.created_at.as_deref());
    set_timestamp(&mut row, Column::UpdatedAt, order.updated_at.as_deref());
    row.set(Column::FinancialStatus, order.financial_status.clone());
    set_timestamp(&mut row, Column::PaidAt, order.processed_at.as_deref());
    row.set(Column::FulfillmentStatus, order.fulfillment_status.clone());
    set_timestamp(&mut row, Column::FulfilledAt, latest_fulfillment(order));

    set_money(&mut row, Column::Subtotal, coerce_money(&order.subtotal_price));
    set_money(
        &mut row,
        Column::Shipping,
        coerce_money(&order.total_shipping_price_set.shop_money.amount),
    );
    set_money(&mut row, Column::Total, coerce_money(&order.total_price));
    set_money(
        &mut row,
        Column::DiscountAmount,
        coerce_money(&order.total_discounts),
    );

    let shipping_method = order
        .shipping_lines
        .first()
        .and_then(|line| line.title.clone())
        .unwrap_or_default();
    row.set(Column::ShippingMethod, shipping_method);

    row.set(Column::UniqueSkus, unique_sku_count(order));

    let mut total_products = 0i64;
    for item in &order.line_items {
        let quantity = coerce_quantity(&item.quantity);
        if quantity.is_malformed() {
            row.mark_defaulted(Column::TotalProducts);
        }
        total_products = total_products.saturating_add(quantity.value());
    }
    row.set(Column::TotalProducts, total_products);

    row.set(Column::BillingCity, order.billing_address.city.clone());
    row.set(Column::BillingProvince, order.billing_address.province.clone());
    row.set(Column::ShippingCity, order.shipping_address.city.clone());

    let requires_shipping = order.line_items.iter().any(|item| item.requires_shipping);
    row.set(Column::RequiresShipping, requires_shipping);
    row.set(Column::LineItemFulfillment, line_item_fulfillment_summary(order));

    let trace = extract_traceability(&order.note_attributes);
    for (event, value) in trace.iter() {
        row.set(event.column(), value);
    }

    set_timestamp(&mut row, Column::CancelledAt, order.cancelled_at.as_deref());
    row.set(Column::Tags, order.tags.clone());

    row
}

pub fn map_orders(orders: &[ShopifyOrder]) -> Vec<Row> {
    orders.iter().map(map_order).collect()
}

/// Latest fulfillment creation time. ISO-8601 strings sort chronologically,
/// so the lexicographic maximum is the most recent.
pub fn latest_fulfillment(order: &ShopifyOrder) -> Option<&str> {
    order
        .fulfillments
        .iter()
        .filter_map(|f| f.created_at.as_deref())
        .filter(|created_at| !created_at.is_empty())
        .max()
}

pub fn unique_sku_count(order: &ShopifyOrder) -> usize {
    order
        .line_items
        .iter()
        .filter_map(|item| item.sku.as_deref())
        .filter(|sku| !sku.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

/// Distinct line-item fulfillment statuses, sorted and joined with `", "`.
pub fn line_item_fulfillment_summary(order: &ShopifyOrder) -> String {
    order
        .line_items
        .iter()
        .filter_map(|item| item.fulfillment_status.as_deref())
        .filter(|status| !status.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(", ")
}

fn set_timestamp(row: &mut Row, column: Column, raw: Option<&str>) {
    let formatted = format_timestamp(raw);
    if formatted.is_malformed() {
        row.mark_defaulted(column);
    }
    row.set(column, formatted.value());
}

fn set_money(row: &mut Row, column: Column, amount: Coerced<f64>) {
    if amount.is_malformed() {
        row.mark_defaulted(column);
    }
    row.set(column, amount.value());
}
