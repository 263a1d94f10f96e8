use serde::Deserialize;
use serde_json::Value;

use super::lenient;

/// One page of the Admin REST `orders.json` listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdersPage {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub orders: Vec<ShopifyOrder>,
}

/// An order as returned by the Admin REST API.
///
/// Only the fields the report reads are decoded. Monetary amounts and
/// quantities stay as raw JSON so coercion can tell "missing" from "malformed".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShopifyOrder {
    #[serde(deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub processed_at: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub cancelled_at: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub financial_status: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub fulfillment_status: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub tags: Option<String>,

    pub subtotal_price: Value,
    pub total_price: Value,
    pub total_discounts: Value,
    #[serde(deserialize_with = "lenient::or_default")]
    pub total_shipping_price_set: PriceSet,

    #[serde(deserialize_with = "lenient::or_default")]
    pub billing_address: Address,
    #[serde(deserialize_with = "lenient::or_default")]
    pub shipping_address: Address,

    #[serde(deserialize_with = "lenient::seq")]
    pub line_items: Vec<LineItem>,
    #[serde(deserialize_with = "lenient::seq")]
    pub shipping_lines: Vec<ShippingLine>,
    #[serde(deserialize_with = "lenient::seq")]
    pub fulfillments: Vec<Fulfillment>,
    #[serde(deserialize_with = "lenient::seq")]
    pub note_attributes: Vec<NoteAttribute>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriceSet {
    #[serde(deserialize_with = "lenient::or_default")]
    pub shop_money: MoneyBag,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MoneyBag {
    pub amount: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(deserialize_with = "lenient::text")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub province: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LineItem {
    #[serde(deserialize_with = "lenient::text")]
    pub sku: Option<String>,
    pub quantity: Value,
    #[serde(deserialize_with = "lenient::text")]
    pub fulfillment_status: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub requires_shipping: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShippingLine {
    #[serde(deserialize_with = "lenient::text")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fulfillment {
    #[serde(deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
}

/// Free-form `name`/`value` pair attached to an order; used for
/// traceability events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NoteAttribute {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub value: Option<String>,
}

#[cfg(test)]
impl NoteAttribute {
    pub(crate) fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_typical_order() {
        let order: ShopifyOrder = serde_json::from_value(json!({
            "id": 5123456789u64,
            "name": "#1001",
            "subtotal_price": "100.00",
            "total_shipping_price_set": {"shop_money": {"amount": "5.50", "currency_code": "CLP"}},
            "line_items": [{"sku": "A", "quantity": 2, "requires_shipping": true}],
            "note_attributes": [{"name": "Embalado", "value": "2024-01-05T10:00:00Z"}]
        }))
        .unwrap();

        assert_eq!(order.id.as_deref(), Some("5123456789"));
        assert_eq!(order.name.as_deref(), Some("#1001"));
        assert_eq!(order.total_shipping_price_set.shop_money.amount, json!("5.50"));
        assert_eq!(order.line_items.len(), 1);
        assert!(order.line_items[0].requires_shipping);
        assert_eq!(order.note_attributes[0].name.as_deref(), Some("Embalado"));
    }

    #[test]
    fn tolerates_nulls_and_wrong_shapes() {
        let order: ShopifyOrder = serde_json::from_value(json!({
            "id": null,
            "billing_address": null,
            "shipping_address": "n/a",
            "total_shipping_price_set": [],
            "line_items": null,
            "shipping_lines": [{"title": "Retiro en tienda"}, "garbage"],
            "fulfillments": {"created_at": "2024-01-01"},
            "tags": ["not", "a", "string"]
        }))
        .unwrap();

        assert!(order.id.is_none());
        assert!(order.billing_address.city.is_none());
        assert!(order.shipping_address.city.is_none());
        assert_eq!(order.total_shipping_price_set.shop_money.amount, Value::Null);
        assert!(order.line_items.is_empty());
        assert_eq!(order.shipping_lines.len(), 1);
        assert!(order.fulfillments.is_empty());
        assert!(order.tags.is_none());
    }

    #[test]
    fn page_without_orders_key_is_empty() {
        let page: OrdersPage = serde_json::from_str("{}").unwrap();
        assert!(page.orders.is_empty());
    }
}
