//! Property-based tests for the order flattening rules.
//!
//! These tests use proptest to check the coercion and normalization
//! invariants across inputs no real shop would send.

use order_sheet_sync::models::sheet_row::{CellValue, Column, Row, MONEY_COLUMNS};
use order_sheet_sync::models::ShopifyOrder;
use order_sheet_sync::services::coercion::{coerce_money, coerce_quantity};
use order_sheet_sync::services::normalizer::{normalize_money_columns, round_cents};
use order_sheet_sync::services::row_mapper::map_order;
use order_sheet_sync::services::traceability::parse_trace_timestamp;
use proptest::prelude::*;
use serde_json::{json, Value};

fn price_strategy() -> impl Strategy<Value = (u64, u8)> {
    (0u64..1_000_000, 0u8..100)
}

fn cell_strategy() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        Just(CellValue::Empty),
        (-1.0e9f64..1.0e9).prop_map(CellValue::Float),
        Just(CellValue::Float(f64::NAN)),
        Just(CellValue::Float(f64::INFINITY)),
        any::<i32>().prop_map(|i| CellValue::Integer(i64::from(i))),
        any::<bool>().prop_map(CellValue::Bool),
        ".{0,12}".prop_map(CellValue::Text),
    ]
}

// Property: money coercion never fails and never yields a non-finite value
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn letters_only_amounts_are_zero(s in "[a-zA-Z ]{1,12}") {
        prop_assert_eq!(coerce_money(&Value::String(s)).value(), 0.0);
    }

    #[test]
    fn comma_and_dot_separators_agree((units, cents) in price_strategy()) {
        let dot = coerce_money(&json!(format!("{}.{:02}", units, cents))).value();
        let comma = coerce_money(&json!(format!("{},{:02}", units, cents))).value();
        prop_assert_eq!(dot, comma);
    }

    #[test]
    fn quantities_never_panic(s in ".{0,16}") {
        let _ = coerce_quantity(&Value::String(s));
    }
}

// Property: normalization is total and idempotent
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn rounding_is_idempotent(x in -1.0e9f64..1.0e9) {
        let once = round_cents(x);
        prop_assert_eq!(round_cents(once), once);
        prop_assert!((once - x).abs() <= 0.005 + 1e-6);
    }

    #[test]
    fn normalized_money_cells_are_finite_floats(cells in proptest::collection::vec(cell_strategy(), 4)) {
        let mut row = Row::new();
        for (column, cell) in MONEY_COLUMNS.iter().zip(cells) {
            row.set(*column, cell);
        }
        let mut rows = vec![row];
        normalize_money_columns(&mut rows, &MONEY_COLUMNS);
        let first = rows.clone();
        normalize_money_columns(&mut rows, &MONEY_COLUMNS);

        prop_assert_eq!(&rows, &first);
        for column in MONEY_COLUMNS {
            let is_finite_float = matches!(rows[0].get(column), CellValue::Float(f) if f.is_finite());
            prop_assert!(is_finite_float);
        }
    }
}

// Property: any order shape maps to exactly one full-width row
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn arbitrary_orders_map_to_full_rows(
        total in prop_oneof![Just(Value::Null), ".{0,8}".prop_map(Value::String), any::<i32>().prop_map(|i| json!(i))],
        created in ".{0,25}",
        quantity in prop_oneof![Just(Value::Null), ".{0,4}".prop_map(Value::String), any::<i16>().prop_map(|i| json!(i))],
    ) {
        let payload = json!({
            "total_price": total,
            "created_at": created,
            "line_items": [{ "sku": "X", "quantity": quantity }]
        });
        let order: ShopifyOrder = serde_json::from_value(payload).unwrap();
        let row = map_order(&order);
        prop_assert_eq!(row.display_values().len(), 27);
        prop_assert_eq!(row.get(Column::UniqueSkus), &CellValue::Integer(1));
    }

    #[test]
    fn unparseable_trace_values_pass_through(raw in "[a-z]{1,10}") {
        prop_assert_eq!(parse_trace_timestamp(&raw), raw);
    }
}
