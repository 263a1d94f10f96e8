use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::sheet_row::{CellValue, Column, Row};

/// Forces `columns` to two-decimal floats across every row.
///
/// Runs after mapping so the sheet always receives numeric money cells,
/// whatever the mapper produced. Text is parsed strictly (no comma
/// separator); anything unparseable or non-finite becomes `0.0`.
pub fn normalize_money_columns(rows: &mut [Row], columns: &[Column]) {
    for row in rows.iter_mut() {
        for &column in columns {
            let amount = numeric_value(row.get(column));
            row.set(column, round_cents(amount));
        }
    }
}

fn numeric_value(cell: &CellValue) -> f64 {
    let value = match cell {
        CellValue::Float(f) => *f,
        CellValue::Integer(i) => *i as f64,
        CellValue::Bool(b) => f64::from(u8::from(*b)),
        CellValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        CellValue::Empty => 0.0,
    };
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Rounds to two decimals, half to even.
pub fn round_cents(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0)
}
