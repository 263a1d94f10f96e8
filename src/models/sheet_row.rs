use strum::{EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

/// Report columns, in sheet order. The header text is the strum serialization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, IntoStaticStr, strum::Display,
)]
pub enum Column {
    #[strum(serialize = "Order_ID")]
    OrderId,
    #[strum(serialize = "KC")]
    OrderName,
    #[strum(serialize = "Created_at")]
    CreatedAt,
    #[strum(serialize = "Updated_at")]
    UpdatedAt,
    #[strum(serialize = "Financial_Status")]
    FinancialStatus,
    #[strum(serialize = "Paid at")]
    PaidAt,
    #[strum(serialize = "Fulfillment Status")]
    FulfillmentStatus,
    #[strum(serialize = "Fulfilled at")]
    FulfilledAt,
    #[strum(serialize = "Subtotal")]
    Subtotal,
    #[strum(serialize = "Shipping")]
    Shipping,
    #[strum(serialize = "Total")]
    Total,
    #[strum(serialize = "Discount_Amount")]
    DiscountAmount,
    #[strum(serialize = "Metodo_envio")]
    ShippingMethod,
    #[strum(serialize = "SKUs")]
    UniqueSkus,
    #[strum(serialize = "Total_Productos")]
    TotalProducts,
    #[strum(serialize = "Billing City")]
    BillingCity,
    #[strum(serialize = "Billing Province")]
    BillingProvince,
    #[strum(serialize = "Shipping City")]
    ShippingCity,
    #[strum(serialize = "Lineitem requires shipping")]
    RequiresShipping,
    #[strum(serialize = "Lineitem fulfillment status")]
    LineItemFulfillment,
    #[strum(serialize = "Embalado")]
    Packed,
    #[strum(serialize = "Transferido_a_tienda")]
    TransferredToStore,
    #[strum(serialize = "Listo_para_retiro")]
    ReadyForPickup,
    #[strum(serialize = "Retirado")]
    PickedUp,
    #[strum(serialize = "Entregado_a_transportista")]
    HandedToCarrier,
    #[strum(serialize = "Cancelled at")]
    CancelledAt,
    #[strum(serialize = "Tags")]
    Tags,
}

/// Columns holding monetary amounts.
pub const MONEY_COLUMNS: [Column; 4] = [
    Column::Subtotal,
    Column::Shipping,
    Column::Total,
    Column::DiscountAmount,
];

impl Column {
    pub fn header(self) -> &'static str {
        self.into()
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Header row in sheet order.
    pub fn headers() -> Vec<String> {
        Column::iter().map(|c| c.header().to_string()).collect()
    }
}

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Display string written to the sheet.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => format_float(*f),
            CellValue::Bool(true) => "True".to_string(),
            CellValue::Bool(false) => "False".to_string(),
        }
    }
}

// Whole floats keep one fractional digit so money columns read as decimals.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(CellValue::Text).unwrap_or(CellValue::Empty)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        CellValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// One report row. Every column is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<CellValue>,
    defaulted: Vec<Column>,
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

impl Row {
    pub fn new() -> Self {
        Self {
            cells: vec![CellValue::Empty; Column::COUNT],
            defaulted: Vec::new(),
        }
    }

    pub fn get(&self, column: Column) -> &CellValue {
        &self.cells[column.index()]
    }

    pub fn set(&mut self, column: Column, value: impl Into<CellValue>) {
        self.cells[column.index()] = value.into();
    }

    /// Records that `column` holds a default because its input was malformed.
    pub fn mark_defaulted(&mut self, column: Column) {
        if !self.defaulted.contains(&column) {
            self.defaulted.push(column);
        }
    }

    /// Columns whose value was defaulted from malformed input.
    pub fn defaulted(&self) -> &[Column] {
        &self.defaulted
    }

    pub fn display_values(&self) -> Vec<String> {
        self.cells.iter().map(CellValue::display).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_follow_sheet_order() {
        let headers = Column::headers();
        assert_eq!(headers.len(), 27);
        assert_eq!(headers.first().map(String::as_str), Some("Order_ID"));
        assert_eq!(headers[7], "Fulfilled at");
        assert_eq!(headers.last().map(String::as_str), Some("Tags"));
    }

    #[test]
    fn new_row_has_every_column_empty() {
        let row = Row::new();
        assert!(Column::iter().all(|c| *row.get(c) == CellValue::Empty));
        assert!(row.display_values().iter().all(String::is_empty));
    }

    #[test]
    fn display_strings() {
        assert_eq!(CellValue::Float(20.0).display(), "20.0");
        assert_eq!(CellValue::Float(19.99).display(), "19.99");
        assert_eq!(CellValue::Float(0.0).display(), "0.0");
        assert_eq!(CellValue::Integer(3).display(), "3");
        assert_eq!(CellValue::Bool(true).display(), "True");
        assert_eq!(CellValue::from(None).display(), "");
    }

    #[test]
    fn mark_defaulted_is_deduplicated() {
        let mut row = Row::new();
        row.mark_defaulted(Column::Total);
        row.mark_defaulted(Column::Total);
        assert_eq!(row.defaulted(), &[Column::Total]);
    }
}
